//! Projects the car being valued into a query's training space.

use chrono::NaiveDate;
use ndarray::Array1;
use tracing::debug;

use super::schema::{Categorical, CategoricalEncoding, TrainingSchema};
use super::{FeatureRow, MinMaxScaler, car_age};
use crate::error::{Result, ValuationError};
use crate::listing::Observation;

/// Builds one scaled feature row laid out exactly like the training matrix.
///
/// The observation's own dummy expansion only ever holds one column per
/// categorical; reindexing against `schema` fills every other dummy with
/// zero. A level never seen in training, or the reference level, therefore
/// ends up as all zeros.
///
/// A categorical the schema dropped (one level in training) is dropped here
/// too, provided the observation carries that same level.
#[tracing::instrument(skip(schema, scaler), fields(columns = schema.width()))]
pub fn project(
    observation: &Observation,
    schema: &TrainingSchema,
    scaler: &MinMaxScaler,
    now: NaiveDate,
) -> Result<Array1<f64>> {
    let parsed = observation.parse()?;

    let features = FeatureRow {
        mileage: parsed.mileage,
        horsepower: parsed.horsepower,
        car_age: car_age(parsed.first_registration_date, now),
        owner_count: parsed.owner_count,
        gearbox: parsed.gearbox,
        fuel: parsed.fuel,
    };

    for field in Categorical::ALL {
        let value = field.value(&features);
        match schema.encoding(field) {
            CategoricalEncoding::Dropped { level } if level != value => {
                return Err(ValuationError::SchemaMismatch {
                    field: field.name(),
                    value: value.to_string(),
                    trained: level.clone(),
                });
            }
            CategoricalEncoding::OneHot { reference, levels }
                if reference != value && !levels.iter().any(|l| l == value) =>
            {
                debug!(field = field.name(), value, "Level unseen in training, encoding as zeros");
            }
            _ => {}
        }
    }

    let mut row = schema.reindex(&features.expand());
    scaler.transform_row(&mut row);

    Ok(row)
}
