//! Single-row and trailing-window prediction over a trained state.

use cadence_window::{WidthSet, Window, mean_features};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::capability::{Classifier, Scaler};
use crate::error::ModelError;
use crate::metrics::ValidationReport;
use crate::state::TrainedState;

/// Prediction for one anchor row of fresh data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowPrediction {
    /// The anchor row the trailing window ends at.
    pub row_index: usize,
    /// Predicted class.
    pub label: usize,
    /// Class probabilities, indexed by class.
    pub probabilities: Vec<f64>,
}

/// The trailing window of `widths` ending at `row_index` among `n_rows` rows.
///
/// Its width is always the narrowest width, never a random draw. A row
/// without enough history reports [`ModelError::InsufficientHistory`] even
/// when it is also past the end.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ModelError::InsufficientHistory`] | `row_index < min_width - 1` |
/// | [`ModelError::RowOutOfRange`] | `row_index >= n_rows` |
pub fn trailing_window(
    widths: &WidthSet,
    n_rows: usize,
    row_index: usize,
) -> Result<Window, ModelError> {
    let window = widths
        .trailing_window(row_index)
        .ok_or(ModelError::InsufficientHistory {
            row_index,
            min_width: widths.min(),
        })?;
    if row_index >= n_rows {
        return Err(ModelError::RowOutOfRange { row_index, n_rows });
    }
    Ok(window)
}

/// Predicts labels from a [`TrainedState`].
///
/// Every prediction scales its input with the retained scaler before
/// handing it to the classifier. The engine only reads its state, so batch
/// methods score rows on several rayon workers at once.
#[derive(Debug, Clone)]
pub struct InferenceEngine<C, S> {
    state: TrainedState<C, S>,
}

impl<C: Classifier, S: Scaler> InferenceEngine<C, S> {
    /// Wrap a trained state.
    #[must_use]
    pub fn new(state: TrainedState<C, S>) -> Self {
        Self { state }
    }

    /// The state predictions run on.
    #[must_use]
    pub fn state(&self) -> &TrainedState<C, S> {
        &self.state
    }

    /// Swap in a new state, returning the old one.
    pub fn replace_state(&mut self, state: TrainedState<C, S>) -> TrainedState<C, S> {
        std::mem::replace(&mut self.state, state)
    }

    /// Consume the engine, returning its state.
    #[must_use]
    pub fn into_state(self) -> TrainedState<C, S> {
        self.state
    }

    fn scale(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        self.state
            .scaler()
            .transform(features)
            .map_err(ModelError::capability("scaler transform"))
    }

    /// Predict the label of one aggregated feature vector.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Capability`] if scaling or prediction fails.
    pub fn predict_feature_row(&self, features: &[f64]) -> Result<usize, ModelError> {
        let scaled = self.scale(features)?;
        self.state
            .classifier()
            .predict(&scaled)
            .map_err(ModelError::capability("classifier predict"))
    }

    /// Class probabilities for one aggregated feature vector.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Capability`] if scaling or prediction fails.
    pub fn predict_proba_feature_row(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        let scaled = self.scale(features)?;
        self.state
            .classifier()
            .predict_proba(&scaled)
            .map_err(ModelError::capability("classifier predict_proba"))
    }

    /// The trailing window over the trained widths; see [`trailing_window`].
    ///
    /// # Errors
    ///
    /// As [`trailing_window`].
    pub fn trailing_window(&self, n_rows: usize, row_index: usize) -> Result<Window, ModelError> {
        trailing_window(self.state.widths(), n_rows, row_index)
    }

    /// Mean feature vector of the trailing window ending at `row_index`.
    ///
    /// # Errors
    ///
    /// As [`InferenceEngine::trailing_window`], plus [`ModelError::Window`]
    /// if the window's rows are ragged.
    pub fn trailing_features(
        &self,
        rows: &[Vec<f64>],
        row_index: usize,
    ) -> Result<Vec<f64>, ModelError> {
        let window = self.trailing_window(rows.len(), row_index)?;
        Ok(mean_features(&rows[window.range()])?)
    }

    /// Predict the label at `row_index` of fresh, unlabeled rows.
    ///
    /// # Errors
    ///
    /// As [`InferenceEngine::trailing_features`] and
    /// [`InferenceEngine::predict_feature_row`].
    pub fn predict_at_row(&self, rows: &[Vec<f64>], row_index: usize) -> Result<usize, ModelError> {
        let features = self.trailing_features(rows, row_index)?;
        self.predict_feature_row(&features)
    }

    /// Class probabilities at `row_index` of fresh, unlabeled rows.
    ///
    /// # Errors
    ///
    /// As [`InferenceEngine::predict_at_row`].
    pub fn predict_proba_at_row(
        &self,
        rows: &[Vec<f64>],
        row_index: usize,
    ) -> Result<Vec<f64>, ModelError> {
        let features = self.trailing_features(rows, row_index)?;
        self.predict_proba_feature_row(&features)
    }

    /// Predict every row that has a full trailing window, in row order.
    ///
    /// Rows before `min_width - 1` are skipped. Returns an empty vector when
    /// no row qualifies.
    ///
    /// # Errors
    ///
    /// Returns an error from one failing row. Rows are scored in parallel, so
    /// when several rows fail it need not be the lowest-indexed one.
    #[instrument(skip_all, fields(n_rows = rows.len()))]
    pub fn predict_trailing(&self, rows: &[Vec<f64>]) -> Result<Vec<RowPrediction>, ModelError> {
        let first = self.state.widths().min() - 1;
        let predictions = (first..rows.len().max(first))
            .into_par_iter()
            .map(|row_index| {
                let features = self.trailing_features(rows, row_index)?;
                Ok(RowPrediction {
                    row_index,
                    label: self.predict_feature_row(&features)?,
                    probabilities: self.predict_proba_feature_row(&features)?,
                })
            })
            .collect::<Result<Vec<_>, ModelError>>()?;
        debug!(n_predictions = predictions.len(), "trailing predictions done");
        Ok(predictions)
    }

    /// Score aggregated feature vectors against known labels.
    ///
    /// Each vector goes through [`InferenceEngine::predict_feature_row`] on
    /// its own; the positive-class probability feeds ROC-AUC.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ModelError::EmptyEvaluation`] | zero samples |
    /// | [`ModelError::EvaluationLengthMismatch`] | `features` and `labels` differ in length |
    /// | [`ModelError::Capability`] | scaling or prediction failed |
    #[instrument(skip_all, fields(n_samples = features.len()))]
    pub fn evaluate(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        positive_class: usize,
    ) -> Result<ValidationReport, ModelError> {
        if features.len() != labels.len() {
            return Err(ModelError::EvaluationLengthMismatch {
                labels: labels.len(),
                predictions: features.len(),
            });
        }
        let scored = features
            .par_iter()
            .map(|row| {
                let label = self.predict_feature_row(row)?;
                let proba = self.predict_proba_feature_row(row)?;
                Ok((label, proba.get(positive_class).copied().unwrap_or(0.0)))
            })
            .collect::<Result<Vec<_>, ModelError>>()?;
        let (predicted, scores): (Vec<usize>, Vec<f64>) = scored.into_iter().unzip();
        ValidationReport::from_predictions(labels, &predicted, &scores, positive_class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CapabilityError;

    /// Passes values through unchanged.
    #[derive(Debug, Clone, PartialEq)]
    struct Identity(usize);

    impl Scaler for Identity {
        fn fit(features: &[Vec<f64>]) -> Result<Self, CapabilityError> {
            features
                .first()
                .map(|r| Self(r.len()))
                .ok_or(CapabilityError::EmptyDataset)
        }

        fn transform(&self, sample: &[f64]) -> Result<Vec<f64>, CapabilityError> {
            if sample.len() != self.0 {
                return Err(CapabilityError::FeatureMismatch { expected: self.0, got: sample.len() });
            }
            Ok(sample.to_vec())
        }
    }

    /// Class 1 when the first feature exceeds the threshold.
    #[derive(Debug, Clone, PartialEq)]
    struct Threshold(f64);

    impl Classifier for Threshold {
        type Params = f64;

        fn fit(params: &f64, _: &[Vec<f64>], _: &[usize]) -> Result<Self, CapabilityError> {
            Ok(Self(*params))
        }

        fn predict(&self, sample: &[f64]) -> Result<usize, CapabilityError> {
            Ok(usize::from(sample[0] > self.0))
        }

        fn predict_proba(&self, sample: &[f64]) -> Result<Vec<f64>, CapabilityError> {
            let p = 1.0 / (1.0 + (self.0 - sample[0]).exp());
            Ok(vec![1.0 - p, p])
        }
    }

    fn engine(widths: &[usize]) -> InferenceEngine<Threshold, Identity> {
        InferenceEngine::new(TrainedState::new(
            Threshold(0.0),
            Identity(1),
            WidthSet::new(widths.iter().copied()).unwrap(),
        ))
    }

    fn rows(values: &[f64]) -> Vec<Vec<f64>> {
        values.iter().map(|&v| vec![v]).collect()
    }

    #[test]
    fn feature_row_prediction() {
        let e = engine(&[3]);
        assert_eq!(e.predict_feature_row(&[2.0]).unwrap(), 1);
        assert_eq!(e.predict_feature_row(&[-2.0]).unwrap(), 0);
        let p = e.predict_proba_feature_row(&[0.0]).unwrap();
        assert!((p[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn scaler_mismatch_is_capability_error() {
        let err = engine(&[3]).predict_feature_row(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Capability { stage: "scaler transform", source: CapabilityError::FeatureMismatch { .. } }
        ));
    }

    #[test]
    fn history_boundary_at_min_width() {
        let e = engine(&[3, 5]);
        let data = rows(&[-1.0, -1.0, 5.0, 5.0]);
        for row_index in 0..2 {
            assert!(matches!(
                e.predict_at_row(&data, row_index).unwrap_err(),
                ModelError::InsufficientHistory { min_width: 3, .. }
            ));
        }
        // rows 0..=2 -> mean 1.0 -> class 1
        assert_eq!(e.predict_at_row(&data, 2).unwrap(), 1);
        assert_eq!(e.trailing_window(4, 2).unwrap(), Window { start: 0, width: 3 });
    }

    #[test]
    fn trailing_window_uses_narrowest_width() {
        let e = engine(&[1, 3]);
        assert_eq!(e.trailing_window(10, 2).unwrap(), Window { start: 2, width: 1 });
        let data = rows(&[9.0, 9.0, -4.0]);
        assert_eq!(e.trailing_features(&data, 2).unwrap(), vec![-4.0]);
        assert_eq!(e.predict_at_row(&data, 2).unwrap(), 0);
    }

    #[test]
    fn free_trailing_window_checks_history_first() {
        let widths = WidthSet::new([3, 5]).unwrap();
        assert!(matches!(
            trailing_window(&widths, 0, 1).unwrap_err(),
            ModelError::InsufficientHistory { row_index: 1, min_width: 3 }
        ));
        assert!(matches!(
            trailing_window(&widths, 2, 2).unwrap_err(),
            ModelError::RowOutOfRange { row_index: 2, n_rows: 2 }
        ));
        assert_eq!(trailing_window(&widths, 3, 2).unwrap(), Window { start: 0, width: 3 });
        assert_eq!(
            trailing_window(&widths, 3, 2).unwrap(),
            engine(&[3, 5]).trailing_window(3, 2).unwrap()
        );
    }

    #[test]
    fn row_past_end_is_out_of_range() {
        let err = engine(&[1]).predict_at_row(&rows(&[1.0]), 1).unwrap_err();
        assert!(matches!(err, ModelError::RowOutOfRange { row_index: 1, n_rows: 1 }));
    }

    #[test]
    fn proba_at_row_matches_feature_row() {
        let e = engine(&[3]);
        let data = rows(&[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(
            e.predict_proba_at_row(&data, 3).unwrap(),
            e.predict_proba_feature_row(&[2.0]).unwrap()
        );
    }

    #[test]
    fn trailing_predictions_skip_short_history() {
        let e = engine(&[3]);
        let data = rows(&[-3.0, -3.0, -3.0, 9.0, 9.0]);
        let preds = e.predict_trailing(&data).unwrap();
        let idx: Vec<usize> = preds.iter().map(|p| p.row_index).collect();
        assert_eq!(idx, vec![2, 3, 4]);
        // means: -3, 1, 5
        let labels: Vec<usize> = preds.iter().map(|p| p.label).collect();
        assert_eq!(labels, vec![0, 1, 1]);
        assert!(e.predict_trailing(&rows(&[1.0, 1.0])).unwrap().is_empty());
    }

    #[test]
    fn evaluate_builds_report() {
        let e = engine(&[1]);
        let report = e
            .evaluate(&rows(&[-2.0, -1.0, 1.0, 2.0]), &[0, 1, 1, 1], 1)
            .unwrap();
        assert_eq!(report.n_samples, 4);
        assert!((report.accuracy - 0.75).abs() < 1e-12);
        assert_eq!(report.roc_auc, Some(1.0));
    }

    #[test]
    fn evaluate_rejects_mismatch() {
        let err = engine(&[1]).evaluate(&rows(&[1.0]), &[0, 1], 1).unwrap_err();
        assert!(matches!(err, ModelError::EvaluationLengthMismatch { .. }));
    }

    #[test]
    fn replace_state_returns_previous() {
        let mut e = engine(&[1]);
        let old = e.replace_state(TrainedState::new(
            Threshold(10.0),
            Identity(1),
            WidthSet::new([5]).unwrap(),
        ));
        assert_eq!(old.widths().as_slice(), &[1]);
        assert_eq!(e.state().widths().min(), 5);
    }
}
