use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes prepared requests; lets the import path run against any transport.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
