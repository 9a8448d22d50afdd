//! CLI entry point for the car valuation tool.
//!
//! Provides subcommands for importing listing exports into the local store
//! and for estimating the price of a single car from those listings.

use anyhow::{Result, bail};
use car_valuation::{
    config::PipelineConfig,
    fetch::{BasicClient, fetch_bytes},
    import::parse_listings,
    listing::Observation,
    output::{ValuationRecord, append_record, print_json, print_pretty},
    service::{PredictionService, Query},
    store::{CsvListingStore, ListingStore},
};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "car_valuation")]
#[command(about = "Estimate used-car prices from comparable listings", long_about = None)]
struct Cli {
    /// CSV file holding stored listings
    #[arg(long, global = true, env = "CAR_VALUATION_STORE", default_value = "data/listings.csv")]
    store: String,

    /// JSON file with pipeline settings
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a listing export from a file or URL into the store
    Import {
        /// Path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// Field delimiter of the export
        #[arg(short, long, default_value_t = '\t')]
        delimiter: char,
    },
    /// Estimate the price of a car
    Predict {
        #[arg(long)]
        manufacturer: String,

        #[arg(long)]
        model: String,

        /// Odometer reading
        #[arg(long)]
        mileage: i64,

        #[arg(long)]
        horsepower: i64,

        /// Date of first registration, e.g. 2016-03-01
        #[arg(long)]
        first_registration_date: String,

        #[arg(long)]
        fuel: String,

        #[arg(long)]
        gearbox: String,

        #[arg(long)]
        owner_count: i64,

        /// Fraction of listings held out for validation (overrides config)
        #[arg(long)]
        held_out: Option<f64>,

        /// CSV file to append the valuation to
        #[arg(short, long)]
        output: Option<String>,

        /// Print the valuation as JSON on stdout
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/car_valuation.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("car_valuation.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    match cli.command {
        Commands::Import { source, delimiter } => {
            if !delimiter.is_ascii() {
                bail!("delimiter must be a single ASCII character, got {delimiter:?}");
            }

            let bytes = fetcher(&source).await?;
            let listings = parse_listings(&bytes, delimiter as u8)?;
            info!(rows = listings.len(), "Export parsed");

            let mut store = CsvListingStore::new(&cli.store);
            let summary = store.insert(&listings)?;
            info!(
                inserted = summary.inserted,
                duplicates = summary.duplicates,
                rejected = summary.rejected,
                "Import complete"
            );
        }
        Commands::Predict {
            manufacturer,
            model,
            mileage,
            horsepower,
            first_registration_date,
            fuel,
            gearbox,
            owner_count,
            held_out,
            output,
            json,
        } => {
            let query = Query::new(manufacturer, model);
            let observation = Observation {
                mileage,
                horsepower,
                first_registration_date,
                fuel,
                gearbox,
                owner_count,
            };

            let service = PredictionService::new(CsvListingStore::new(&cli.store), config)?;
            let valuation = service.predict(&query, &observation, held_out)?;

            print_pretty(&valuation);
            if json {
                print_json(&valuation)?;
            }
            if let Some(path) = output {
                append_record(&path, &ValuationRecord::new(&query, &observation, &valuation))?;
            }
        }
    }

    Ok(())
}

/// Loads an export from a local file path or fetches it over HTTP.
#[tracing::instrument(fields(source = %source))]
async fn fetcher(source: &str) -> Result<Vec<u8>> {
    let bytes = if source.starts_with("http://") || source.starts_with("https://") {
        let client = BasicClient::new()?;
        fetch_bytes(&client, source).await?
    } else {
        std::fs::read(source)?
    };
    Ok(bytes)
}
