//! Listing records as stored, as parsed, and the observation being valued.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValuationError};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d", "%d.%m.%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// A listing row exactly as the store holds it.
///
/// Every field is optional text: scraped rows are frequently incomplete and
/// parsing is deferred to the feature transformer, which drops what it can't
/// use. Legacy backups name a few columns differently, hence the aliases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawListing {
    pub id: Option<String>,
    pub url: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub price: Option<String>,
    pub mileage: Option<String>,
    #[serde(alias = "hp")]
    pub horsepower: Option<String>,
    pub gearbox: Option<String>,
    #[serde(alias = "traffic_date")]
    pub first_registration_date: Option<String>,
    #[serde(alias = "owners")]
    pub owner_count: Option<String>,
    pub fuel: Option<String>,
}

/// A fully parsed listing; every field the model needs is present.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub price: f64,
    pub mileage: f64,
    pub horsepower: f64,
    pub gearbox: String,
    pub first_registration_date: NaiveDate,
    pub owner_count: f64,
    pub fuel: String,
}

impl RawListing {
    /// Parses the feature and target columns. Identity columns are ignored.
    pub fn to_listing(&self) -> Result<Listing> {
        Ok(Listing {
            price: parse_quantity("price", required("price", &self.price)?)?,
            mileage: parse_quantity("mileage", required("mileage", &self.mileage)?)?,
            horsepower: parse_quantity("horsepower", required("horsepower", &self.horsepower)?)?,
            gearbox: parse_category("gearbox", required("gearbox", &self.gearbox)?)?,
            first_registration_date: parse_registration_date(required(
                "first_registration_date",
                &self.first_registration_date,
            )?)?,
            owner_count: parse_quantity("owner_count", required("owner_count", &self.owner_count)?)?,
            fuel: parse_category("fuel", required("fuel", &self.fuel)?)?,
        })
    }

    /// Case-insensitive match on manufacturer and model.
    pub fn matches(&self, manufacturer: &str, model: &str) -> bool {
        same_name(self.manufacturer.as_deref(), manufacturer) && same_name(self.model.as_deref(), model)
    }
}

/// The car being valued. Integer fields mirror what a request form submits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub mileage: i64,
    pub horsepower: i64,
    pub first_registration_date: String,
    pub fuel: String,
    pub gearbox: String,
    pub owner_count: i64,
}

/// Observation with every field validated.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParsedObservation {
    pub mileage: f64,
    pub horsepower: f64,
    pub first_registration_date: NaiveDate,
    pub owner_count: f64,
    pub gearbox: String,
    pub fuel: String,
}

impl Observation {
    /// Unlike listings, a bad observation is never skipped: there is nothing
    /// else to predict.
    pub(crate) fn parse(&self) -> Result<ParsedObservation> {
        Ok(ParsedObservation {
            mileage: non_negative("mileage", self.mileage)?,
            horsepower: non_negative("horsepower", self.horsepower)?,
            first_registration_date: parse_registration_date(&self.first_registration_date)?,
            owner_count: non_negative("owner_count", self.owner_count)?,
            gearbox: parse_category("gearbox", &self.gearbox)?,
            fuel: parse_category("fuel", &self.fuel)?,
        })
    }
}

/// Lowercased, trimmed form used for categorical levels and name matching.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn same_name(stored: Option<&str>, wanted: &str) -> bool {
    stored.is_some_and(|s| normalize(s) == normalize(wanted))
}

fn required<'a>(field: &'static str, value: &'a Option<String>) -> Result<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValuationError::parse(field, "")),
    }
}

/// Accepts integers, floats written by older exports ("12500.0") and
/// thousands separated by spaces ("12 500").
fn parse_quantity(field: &'static str, value: &str) -> Result<f64> {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    match compact.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(ValuationError::parse(field, value)),
    }
}

fn parse_category(field: &'static str, value: &str) -> Result<String> {
    let level = normalize(value);
    if level.is_empty() {
        return Err(ValuationError::parse(field, value));
    }
    Ok(level)
}

fn non_negative(field: &'static str, value: i64) -> Result<f64> {
    if value < 0 {
        return Err(ValuationError::parse(field, value.to_string()));
    }
    Ok(value as f64)
}

/// Parses a first-registration date. Timestamps are truncated to their date.
pub fn parse_registration_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Ok(date);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(datetime.date());
        }
    }

    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.date_naive())
        .map_err(|_| ValuationError::parse("first_registration_date", value))
}
