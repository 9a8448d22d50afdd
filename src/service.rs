//! Request orchestration.
//!
//! Every call trains from scratch: it loads the scoped listings, builds the
//! feature space, fits the scaler, trains both strategies, predicts and
//! throws it all away. Nothing is cached between requests.

use chrono::{NaiveDate, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{PipelineConfig, validate_held_out};
use crate::error::Result;
use crate::features::{FeatureSet, MinMaxScaler, NUMERIC_COLUMNS, project, transform};
use crate::listing::Observation;
use crate::models::{PolynomialRegression, RandomForest, select, train_test_split};
use crate::store::ListingStore;

const POLYNOMIAL_DEGREE: usize = 2;
const PRICE_STEP: f64 = 1000.0;
const MARGIN_STEP: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub manufacturer: String,
    pub model: String,
}

impl Query {
    pub fn new(manufacturer: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            manufacturer: manufacturer.into(),
            model: model.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Valuation {
    /// Nearest 1000.
    pub predicted_price: f64,
    /// Predicted price × validation MAPE, nearest 100.
    pub error_margin: f64,
    /// Usable listings the models were trained and validated on.
    pub sample_size: usize,
    pub winning_strategy_label: String,
    pub mae: f64,
    pub mape: f64,
}

pub struct PredictionService<S> {
    store: S,
    config: PipelineConfig,
}

impl<S: ListingStore> PredictionService<S> {
    pub fn new(store: S, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    /// Values `observation` against current listings, measuring car ages
    /// from today.
    pub fn predict(
        &self,
        query: &Query,
        observation: &Observation,
        held_out: Option<f64>,
    ) -> Result<Valuation> {
        self.predict_at(query, observation, held_out, Utc::now().date_naive())
    }

    /// Same as [`Self::predict`] with an explicit evaluation date. The date
    /// is shared by training and projection so both see the same ages.
    #[tracing::instrument(
        skip(self, query, observation),
        fields(manufacturer = %query.manufacturer, model = %query.model)
    )]
    pub fn predict_at(
        &self,
        query: &Query,
        observation: &Observation,
        held_out: Option<f64>,
        now: NaiveDate,
    ) -> Result<Valuation> {
        let held_out = held_out.unwrap_or(self.config.held_out);
        validate_held_out(held_out)?;

        let records = self.store.load_scoped(&query.manufacturer, &query.model)?;
        let FeatureSet {
            mut x,
            y,
            schema,
            dropped,
        } = transform(&records, now)?;
        let sample_size = y.len();

        info!(sample_size, dropped, columns = schema.width(), "Training data prepared");

        let scaler = MinMaxScaler::fit(&x, NUMERIC_COLUMNS.len())?;
        scaler.transform(&mut x);

        // Project before training: a mismatched observation fails without
        // paying for two model fits.
        let row = project(observation, &schema, &scaler, now)?;

        let mut rng = self.rng();
        let split = train_test_split(&x, &y, held_out, &mut rng)?;

        let forest = RandomForest::new(&self.config.forest);
        let polynomial = PolynomialRegression::new(POLYNOMIAL_DEGREE, self.config.ridge);
        let selected = select(&[&forest, &polynomial], &split, &mut rng)?;

        let raw_price = selected.predict(&row)?;
        let evaluation = selected.evaluation();

        let valuation = Valuation {
            predicted_price: round_to(raw_price, PRICE_STEP),
            error_margin: round_to((raw_price * evaluation.mape).abs(), MARGIN_STEP),
            sample_size,
            winning_strategy_label: evaluation.label.to_string(),
            mae: evaluation.mae,
            mape: evaluation.mape,
        };

        info!(
            predicted_price = valuation.predicted_price,
            error_margin = valuation.error_margin,
            strategy = %valuation.winning_strategy_label,
            "Valuation complete"
        );

        Ok(valuation)
    }

    fn rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Rounds to the nearest multiple of `step`, halves away from zero.
pub fn round_to(value: f64, step: f64) -> f64 {
    (value / step).round() * step
}
