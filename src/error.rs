//! Typed failures surfaced by the valuation pipeline.
//!
//! Every variant maps to an [`ErrorKind`] so callers can branch on the
//! failure class without matching on message text.

use serde::Serialize;
use thiserror::Error;

/// Machine-checkable failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    InsufficientData,
    SchemaMismatch,
    Parse,
    Store,
    Training,
    Config,
}

#[derive(Debug, Error)]
pub enum ValuationError {
    /// No usable listings remain for the requested manufacturer/model pair.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// The observation carries a category the training set collapsed away.
    #[error("cannot project {field} '{value}': training data only contained '{trained}'")]
    SchemaMismatch {
        field: &'static str,
        value: String,
        trained: String,
    },

    #[error("cannot parse {field} from '{value}'")]
    Parse { field: &'static str, value: String },

    #[error("listing store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("listing store CSV failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("model training failed: {0}")]
    Training(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ValuationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValuationError::InsufficientData(_) => ErrorKind::InsufficientData,
            ValuationError::SchemaMismatch { .. } => ErrorKind::SchemaMismatch,
            ValuationError::Parse { .. } => ErrorKind::Parse,
            ValuationError::Io(_) | ValuationError::Csv(_) => ErrorKind::Store,
            ValuationError::Training(_) => ErrorKind::Training,
            ValuationError::Config(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn parse(field: &'static str, value: impl Into<String>) -> Self {
        ValuationError::Parse {
            field,
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ValuationError>;
