//! Per-feature z-score standardization.

use serde::{Deserialize, Serialize};

use crate::capability::Scaler;
use crate::error::CapabilityError;

/// Standardizes each feature to zero mean and unit variance.
///
/// Uses the population standard deviation. A constant feature (zero spread)
/// gets a scale of 1.0, so it is centred but not divided.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Per-feature means learned at fit time.
    #[must_use]
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Per-feature divisors learned at fit time.
    #[must_use]
    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    /// Number of features the scaler was fitted on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.means.len()
    }
}

impl Scaler for StandardScaler {
    fn fit(features: &[Vec<f64>]) -> Result<Self, CapabilityError> {
        let Some(first) = features.first() else {
            return Err(CapabilityError::EmptyDataset);
        };
        let n_features = first.len();
        let n = features.len() as f64;

        let mut means = vec![0.0; n_features];
        for row in features {
            if row.len() != n_features {
                return Err(CapabilityError::FeatureMismatch {
                    expected: n_features,
                    got: row.len(),
                });
            }
            for (m, &v) in means.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut means {
            *m /= n;
        }

        let mut scales = vec![0.0; n_features];
        for row in features {
            for ((s, &v), &m) in scales.iter_mut().zip(row).zip(&means) {
                *s += (v - m) * (v - m);
            }
        }
        for s in &mut scales {
            let std = (*s / n).sqrt();
            *s = if std > 0.0 { std } else { 1.0 };
        }

        Ok(Self { means, scales })
    }

    fn transform(&self, sample: &[f64]) -> Result<Vec<f64>, CapabilityError> {
        if sample.len() != self.means.len() {
            return Err(CapabilityError::FeatureMismatch {
                expected: self.means.len(),
                got: sample.len(),
            });
        }
        Ok(sample
            .iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(&v, (&m, &s))| (v - m) / s)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standardizes_columns() {
        let rows = vec![vec![1.0, 10.0], vec![2.0, 10.0], vec![3.0, 10.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();
        assert!((scaler.means()[0] - 2.0).abs() < 1e-12);
        assert!((scaler.scales()[0] - (2.0f64 / 3.0).sqrt()).abs() < 1e-12);

        let out = scaler.transform_batch(&rows).unwrap();
        let col0: Vec<f64> = out.iter().map(|r| r[0]).collect();
        let mean: f64 = col0.iter().sum::<f64>() / 3.0;
        let var: f64 = col0.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 3.0;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_column_is_centred_only() {
        let rows = vec![vec![5.0], vec![5.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();
        assert_eq!(scaler.scales(), &[1.0]);
        assert_eq!(scaler.transform(&[7.0]).unwrap(), vec![2.0]);
    }

    #[test]
    fn empty_fit_rejected() {
        assert_eq!(
            StandardScaler::fit(&[]).unwrap_err(),
            CapabilityError::EmptyDataset
        );
    }

    #[test]
    fn wrong_width_rejected() {
        let scaler = StandardScaler::fit(&[vec![1.0, 2.0]]).unwrap();
        assert_eq!(
            scaler.transform(&[1.0]).unwrap_err(),
            CapabilityError::FeatureMismatch { expected: 2, got: 1 }
        );
    }
}
