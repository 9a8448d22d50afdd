//! Listings → (X, y).

use chrono::NaiveDate;
use ndarray::{Array1, Array2};
use tracing::debug;

use super::schema::{CategoricalEncoding, TrainingSchema};
use super::{FeatureRow, car_age};
use crate::error::{Result, ValuationError};
use crate::listing::{Listing, RawListing};

/// Encoded training data for one manufacturer/model pair.
///
/// `x` is unscaled; its columns follow `schema` exactly.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    pub x: Array2<f64>,
    pub y: Array1<f64>,
    pub schema: TrainingSchema,
    /// Listings discarded because a required field was missing or malformed.
    pub dropped: usize,
}

impl FeatureSet {
    pub fn sample_size(&self) -> usize {
        self.y.len()
    }
}

impl Listing {
    pub(crate) fn feature_row(&self, now: NaiveDate) -> FeatureRow {
        FeatureRow {
            mileage: self.mileage,
            horsepower: self.horsepower,
            car_age: car_age(self.first_registration_date, now),
            owner_count: self.owner_count,
            gearbox: self.gearbox.clone(),
            fuel: self.fuel.clone(),
        }
    }
}

/// Builds the feature matrix and price vector from scoped listings.
///
/// Rows that fail to parse are dropped. `now` fixes the instant `car_age`
/// is measured against; pass the same value to [`super::project`].
#[tracing::instrument(skip(records), fields(records = records.len()))]
pub fn transform(records: &[RawListing], now: NaiveDate) -> Result<FeatureSet> {
    if records.is_empty() {
        return Err(ValuationError::InsufficientData(
            "no listings match the requested manufacturer and model".to_string(),
        ));
    }

    let mut listings = Vec::with_capacity(records.len());
    for raw in records {
        match raw.to_listing() {
            Ok(listing) => listings.push(listing),
            Err(e) => debug!(id = ?raw.id, error = %e, "Dropping unusable listing"),
        }
    }

    let dropped = records.len() - listings.len();
    if listings.is_empty() {
        return Err(ValuationError::InsufficientData(format!(
            "all {} matching listings are missing required fields",
            records.len()
        )));
    }

    let rows: Vec<FeatureRow> = listings.iter().map(|l| l.feature_row(now)).collect();

    let schema = TrainingSchema::new(
        CategoricalEncoding::fit(rows.iter().map(|r| r.gearbox.as_str())),
        CategoricalEncoding::fit(rows.iter().map(|r| r.fuel.as_str())),
    );

    let mut x = Array2::zeros((rows.len(), schema.width()));
    for (i, row) in rows.iter().enumerate() {
        x.row_mut(i).assign(&schema.reindex(&row.expand()));
    }
    let y: Array1<f64> = listings.iter().map(|l| l.price).collect();

    debug!(
        usable = rows.len(),
        dropped,
        columns = ?schema.columns(),
        "Feature matrix built"
    );

    Ok(FeatureSet {
        x,
        y,
        schema,
        dropped,
    })
}
