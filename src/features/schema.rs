//! The ordered column layout a model was trained on.

use std::collections::BTreeSet;

use ndarray::Array1;
use serde::Serialize;

use super::{FeatureRow, NUMERIC_COLUMNS};

/// The two categorical listing fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Categorical {
    Gearbox,
    Fuel,
}

impl Categorical {
    pub const ALL: [Categorical; 2] = [Categorical::Gearbox, Categorical::Fuel];

    pub fn name(self) -> &'static str {
        match self {
            Categorical::Gearbox => "gearbox",
            Categorical::Fuel => "fuel",
        }
    }

    pub fn column(self, level: &str) -> String {
        format!("{}_{}", self.name(), level)
    }

    pub(crate) fn value(self, row: &FeatureRow) -> &str {
        match self {
            Categorical::Gearbox => &row.gearbox,
            Categorical::Fuel => &row.fuel,
        }
    }
}

/// How one categorical field was turned into columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CategoricalEncoding {
    /// Only one level was observed; the field contributes no columns.
    Dropped { level: String },
    /// One column per level except `reference`, the alphabetically first one.
    OneHot {
        reference: String,
        levels: Vec<String>,
    },
}

impl CategoricalEncoding {
    /// Builds the encoding from the levels observed in the scoped set.
    ///
    /// Levels are ordered alphabetically, so the reference level only changes
    /// when a new alphabetically-earlier level appears in the data.
    pub fn fit<'a>(observed: impl IntoIterator<Item = &'a str>) -> Self {
        let mut levels: Vec<String> = observed
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();

        if levels.len() <= 1 {
            return CategoricalEncoding::Dropped {
                level: levels.pop().unwrap_or_default(),
            };
        }

        let reference = levels.remove(0);
        CategoricalEncoding::OneHot { reference, levels }
    }
}

/// Column names in training order, plus the categorical encodings that
/// produced them.
///
/// Numeric columns always come first, then gearbox dummies, then fuel dummies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingSchema {
    columns: Vec<String>,
    gearbox: CategoricalEncoding,
    fuel: CategoricalEncoding,
}

impl TrainingSchema {
    pub fn new(gearbox: CategoricalEncoding, fuel: CategoricalEncoding) -> Self {
        let mut columns: Vec<String> = NUMERIC_COLUMNS.iter().map(|c| c.to_string()).collect();

        for (field, encoding) in [(Categorical::Gearbox, &gearbox), (Categorical::Fuel, &fuel)] {
            if let CategoricalEncoding::OneHot { levels, .. } = encoding {
                columns.extend(levels.iter().map(|level| field.column(level)));
            }
        }

        Self {
            columns,
            gearbox,
            fuel,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn encoding(&self, field: Categorical) -> &CategoricalEncoding {
        match field {
            Categorical::Gearbox => &self.gearbox,
            Categorical::Fuel => &self.fuel,
        }
    }

    /// Lays a row's own expansion out in schema order. Columns the row did
    /// not produce are zero; columns the schema does not know are ignored.
    pub fn reindex(&self, expanded: &[(String, f64)]) -> Array1<f64> {
        let mut row = Array1::zeros(self.width());
        for (column, value) in expanded {
            if let Some(i) = self.position(column) {
                row[i] = *value;
            }
        }
        row
    }
}
