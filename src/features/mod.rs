//! Feature construction for the valuation models.
//!
//! Listings for one manufacturer/model pair are turned into a numeric matrix
//! whose column layout depends on which gearbox and fuel levels the pair has.
//! That layout is captured as a [`TrainingSchema`] and reused, together with
//! the fitted [`MinMaxScaler`], to project the car being valued into exactly
//! the same space.

pub mod project;
pub mod scaler;
pub mod schema;
pub mod transform;

pub use project::project;
pub use scaler::MinMaxScaler;
pub use schema::{Categorical, CategoricalEncoding, TrainingSchema};
pub use transform::{FeatureSet, transform};

use chrono::NaiveDate;

/// Numeric columns, always the leading columns of the matrix. These are the
/// only columns the scaler touches.
pub const NUMERIC_COLUMNS: [&str; 4] = ["mileage", "horsepower", "car_age", "owner_count"];

const DAYS_PER_YEAR: f64 = 365.25;

/// Age in years at `now`, counted in whole days. The divisor only sets the
/// unit: min-max scaling cancels it, so 365 and 365.25 give identical models.
pub fn car_age(first_registration: NaiveDate, now: NaiveDate) -> f64 {
    (now - first_registration).num_days() as f64 / DAYS_PER_YEAR
}

/// Feature values of one car before encoding.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FeatureRow {
    pub mileage: f64,
    pub horsepower: f64,
    pub car_age: f64,
    pub owner_count: f64,
    pub gearbox: String,
    pub fuel: String,
}

impl FeatureRow {
    /// The row's own dummy expansion: numeric columns plus one indicator per
    /// categorical. Alignment with the training layout happens in
    /// [`TrainingSchema::reindex`].
    pub fn expand(&self) -> Vec<(String, f64)> {
        let numeric = [self.mileage, self.horsepower, self.car_age, self.owner_count];

        let mut expanded: Vec<(String, f64)> = NUMERIC_COLUMNS
            .iter()
            .zip(numeric)
            .map(|(name, value)| (name.to_string(), value))
            .collect();

        for field in Categorical::ALL {
            expanded.push((field.column(field.value(self)), 1.0));
        }

        expanded
    }
}
