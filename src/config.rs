//! Pipeline tuning knobs.
//!
//! Stored as a JSON object on disk; any key left out takes its default:
//! ```json
//! {
//!   "held_out": 0.2,
//!   "seed": 7,
//!   "forest": { "n_estimators": 300, "max_depth": 12 }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValuationError};

/// Random-forest hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Fraction of rows held out for validation.
    pub held_out: f64,
    /// Fixes the split and bootstrap draws when set.
    pub seed: Option<u64>,
    pub forest: ForestConfig,
    /// Ceiling on `forest.n_estimators`; training cost grows linearly with it.
    pub max_estimators: usize,
    /// Diagonal regularizer for the least-squares solve.
    pub ridge: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            held_out: 0.15,
            seed: None,
            forest: ForestConfig::default(),
            max_estimators: 1000,
            ridge: 1e-8,
        }
    }
}

impl PipelineConfig {
    /// Loads and validates the config from a JSON file at `path`.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_held_out(self.held_out)?;

        if self.forest.n_estimators == 0 {
            return Err(ValuationError::Config(
                "forest.n_estimators must be at least 1".to_string(),
            ));
        }
        if self.forest.n_estimators > self.max_estimators {
            return Err(ValuationError::Config(format!(
                "forest.n_estimators ({}) exceeds max_estimators ({})",
                self.forest.n_estimators, self.max_estimators
            )));
        }
        if self.forest.min_samples_split < 2 {
            return Err(ValuationError::Config(
                "forest.min_samples_split must be at least 2".to_string(),
            ));
        }
        if self.forest.min_samples_leaf == 0 {
            return Err(ValuationError::Config(
                "forest.min_samples_leaf must be at least 1".to_string(),
            ));
        }
        if self.forest.max_depth == Some(0) {
            return Err(ValuationError::Config(
                "forest.max_depth must be at least 1".to_string(),
            ));
        }
        // Centring zeroes the polynomial bias column; only the ridge keeps
        // its pivot positive.
        if !(self.ridge.is_finite() && self.ridge > 0.0) {
            return Err(ValuationError::Config(format!(
                "ridge must be a positive number, got {}",
                self.ridge
            )));
        }

        Ok(())
    }
}

pub fn validate_held_out(held_out: f64) -> Result<()> {
    if held_out > 0.0 && held_out < 1.0 {
        Ok(())
    } else {
        Err(ValuationError::Config(format!(
            "held-out fraction must be in (0, 1), got {held_out}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert_eq!(config.held_out, 0.15);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "seed": 7, "forest": { "n_estimators": 25 } }"#).unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.forest.n_estimators, 25);
        assert_eq!(config.forest.min_samples_split, 2);
        assert_eq!(config.held_out, 0.15);
    }

    #[test]
    fn test_estimator_ceiling_enforced() {
        let mut config = PipelineConfig::default();
        config.forest.n_estimators = 5000;
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_held_out_bounds() {
        assert!(validate_held_out(0.15).is_ok());
        assert!(validate_held_out(0.0).is_err());
        assert!(validate_held_out(1.0).is_err());
        assert!(validate_held_out(f64::NAN).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let path = format!("{}/car_valuation_test_config.json", std::env::temp_dir().display());
        std::fs::write(
            &path,
            r#"{ "held_out": 0.25, "max_estimators": 50, "forest": { "n_estimators": 25 } }"#,
        )
        .unwrap();

        let loaded = PipelineConfig::load(&path);
        std::fs::remove_file(&path).unwrap();

        let config = loaded.unwrap();
        assert_eq!(config.held_out, 0.25);
        assert_eq!(config.max_estimators, 50);
        assert_eq!(config.forest.n_estimators, 25);
    }

    #[test]
    fn test_load_rejects_forest_above_ceiling() {
        let path = format!(
            "{}/car_valuation_test_config_ceiling.json",
            std::env::temp_dir().display()
        );
        // Default n_estimators (100) is above this ceiling.
        std::fs::write(&path, r#"{ "max_estimators": 50 }"#).unwrap();

        let loaded = PipelineConfig::load(&path);
        std::fs::remove_file(&path).unwrap();

        let err = loaded.unwrap_err();
        assert!(err.to_string().contains("exceeds max_estimators"));
    }

    #[test]
    fn test_zero_ridge_rejected() {
        let mut config = PipelineConfig::default();
        config.ridge = 0.0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);

        config.ridge = -1e-8;
        assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::Config);
    }
}
