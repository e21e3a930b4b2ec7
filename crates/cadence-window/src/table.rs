//! Validated, ordered, labeled time-series table.

use crate::error::WindowError;
use crate::sampler::Window;

/// Ordered rows of numeric features with one label per row.
///
/// Row order is time order and is never changed. `features[i]` and
/// `labels[i]` describe the same row. An empty table is valid; it simply
/// yields no windows.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledTable {
    feature_names: Vec<String>,
    features: Vec<Vec<f64>>,
    labels: Vec<usize>,
}

impl LabeledTable {
    /// Build a table, validating shape and values.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`WindowError::LabelCountMismatch`] | `features.len() != labels.len()` |
    /// | [`WindowError::RaggedRow`] | a row's length differs from the first row's |
    /// | [`WindowError::FeatureNameMismatch`] | name count differs from feature count |
    /// | [`WindowError::NonFiniteValue`] | any value is NaN or infinite |
    pub fn new(
        feature_names: Vec<String>,
        features: Vec<Vec<f64>>,
        labels: Vec<usize>,
    ) -> Result<Self, WindowError> {
        if features.len() != labels.len() {
            return Err(WindowError::LabelCountMismatch {
                rows: features.len(),
                labels: labels.len(),
            });
        }
        validate_rows(&features)?;
        if let Some(first) = features.first()
            && first.len() != feature_names.len()
        {
            return Err(WindowError::FeatureNameMismatch {
                names: feature_names.len(),
                features: first.len(),
            });
        }
        Ok(Self {
            feature_names,
            features,
            labels,
        })
    }

    /// Feature column names.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Row-major feature matrix.
    #[must_use]
    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    /// Per-row labels.
    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.features.len()
    }

    /// Number of feature columns.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Return true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Borrow the feature rows and labels covered by `window`.
    ///
    /// # Panics
    ///
    /// Panics if the window extends past the last row.
    #[must_use]
    pub fn window_rows(&self, window: &Window) -> (&[Vec<f64>], &[usize]) {
        (&self.features[window.range()], &self.labels[window.range()])
    }
}

/// Check that every row has the first row's length and only finite values.
pub(crate) fn validate_rows(rows: &[Vec<f64>]) -> Result<(), WindowError> {
    let Some(first) = rows.first() else {
        return Ok(());
    };
    let expected = first.len();
    for (row_index, row) in rows.iter().enumerate() {
        if row.len() != expected {
            return Err(WindowError::RaggedRow {
                row_index,
                expected,
                got: row.len(),
            });
        }
        if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
            return Err(WindowError::NonFiniteValue {
                row_index,
                feature_index,
            });
        }
    }
    Ok(())
}
