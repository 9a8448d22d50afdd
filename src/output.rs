//! Output formatting and persistence for valuations.
//!
//! Supports a human-readable summary, JSON serialization, and CSV append.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::listing::Observation;
use crate::service::{Query, Valuation};
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// One line of valuation history: what was asked, and what came back.
#[derive(Debug, Clone, Serialize)]
pub struct ValuationRecord {
    pub timestamp: DateTime<Utc>,
    pub manufacturer: String,
    pub model: String,
    pub mileage: i64,
    pub horsepower: i64,
    pub first_registration_date: String,
    pub fuel: String,
    pub gearbox: String,
    pub owner_count: i64,
    pub predicted_price: f64,
    pub error_margin: f64,
    pub sample_size: usize,
    pub winning_strategy_label: String,
    pub mape: f64,
}

impl ValuationRecord {
    pub fn new(query: &Query, observation: &Observation, valuation: &Valuation) -> Self {
        Self {
            timestamp: Utc::now(),
            manufacturer: query.manufacturer.clone(),
            model: query.model.clone(),
            mileage: observation.mileage,
            horsepower: observation.horsepower,
            first_registration_date: observation.first_registration_date.clone(),
            fuel: observation.fuel.clone(),
            gearbox: observation.gearbox.clone(),
            owner_count: observation.owner_count,
            predicted_price: valuation.predicted_price,
            error_margin: valuation.error_margin,
            sample_size: valuation.sample_size,
            winning_strategy_label: valuation.winning_strategy_label.clone(),
            mape: valuation.mape,
        }
    }
}

/// Logs the valuation as structured fields, with the full struct at debug.
pub fn print_pretty(valuation: &Valuation) {
    info!(
        price = valuation.predicted_price,
        margin = valuation.error_margin,
        samples = valuation.sample_size,
        strategy = %valuation.winning_strategy_label,
        "Estimated price {} ± {}",
        valuation.predicted_price,
        valuation.error_margin
    );
    debug!("{:#?}", valuation);
}

/// Writes the valuation to stdout as pretty-printed JSON.
pub fn print_json(valuation: &Valuation) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(valuation)?);
    Ok(())
}

/// Appends a [`ValuationRecord`] as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &str, record: &ValuationRecord) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV record");

    if let Some(dir) = Path::new(path).parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    writer.serialize(record)?;
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn valuation() -> Valuation {
        Valuation {
            predicted_price: 134_000.0,
            error_margin: 9_400.0,
            sample_size: 50,
            winning_strategy_label: "random forest".into(),
            mae: 8_000.0,
            mape: 0.07,
        }
    }

    fn record() -> ValuationRecord {
        let query = Query::new("Volvo", "XC60");
        let observation = Observation {
            mileage: 11_000,
            horsepower: 80,
            first_registration_date: "2011-01-01".into(),
            fuel: "petrol".into(),
            gearbox: "manual".into(),
            owner_count: 2,
        };
        ValuationRecord::new(&query, &observation, &valuation())
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&valuation());
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&valuation()).unwrap();
    }

    #[test]
    fn test_append_record_creates_file() {
        let path = temp_path("car_valuation_test_history_create.csv");
        let _ = fs::remove_file(&path);

        append_record(&path, &record()).unwrap();

        assert!(Path::new(&path).exists());
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("Volvo,XC60,11000,80,2011-01-01,petrol,manual,2,134000.0,9400.0,50"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_record_writes_header_once() {
        let path = temp_path("car_valuation_test_history_header.csv");
        let _ = fs::remove_file(&path);

        append_record(&path, &record()).unwrap();
        append_record(&path, &record()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.contains("timestamp")).count();
        assert_eq!(header_count, 1);
        // 1 header + 2 data rows
        assert_eq!(content.lines().count(), 3);

        fs::remove_file(&path).unwrap();
    }
}
