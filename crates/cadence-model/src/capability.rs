//! Capability contracts for the external collaborators: classifier, scaler
//! and hyperparameter search.

use std::fmt::Debug;

use tracing::debug;

use crate::error::{CapabilityError, SearchError};
use crate::grid::ParamGrid;

/// A trainable classifier over fixed-length feature vectors.
///
/// Instances are created only by [`Classifier::fit`] from a fixed
/// [`Classifier::Params`] value, so every fitted model is reproducible from
/// its parameters and training data. The trait carries no passthrough or
/// keyword-style arguments; anything a classifier needs belongs in `Params`.
pub trait Classifier: Sized + Send + Sync {
    /// Hyperparameters that fully determine how the classifier is fitted.
    type Params: Clone + Debug + Send + Sync;

    /// Fit a classifier on row-major `features` and parallel `labels`.
    ///
    /// # Errors
    ///
    /// Returns a [`CapabilityError`] if the data or parameters are rejected.
    fn fit(
        params: &Self::Params,
        features: &[Vec<f64>],
        labels: &[usize],
    ) -> Result<Self, CapabilityError>;

    /// Predict the class of one sample.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::FeatureMismatch`] if `sample` has the wrong
    /// length, or any other capability-specific failure.
    fn predict(&self, sample: &[f64]) -> Result<usize, CapabilityError>;

    /// Class probabilities for one sample, indexed by class.
    ///
    /// # Errors
    ///
    /// As [`Classifier::predict`].
    fn predict_proba(&self, sample: &[f64]) -> Result<Vec<f64>, CapabilityError>;

    /// Predict every sample in order.
    ///
    /// # Errors
    ///
    /// Returns the first per-sample error.
    fn predict_batch(&self, samples: &[Vec<f64>]) -> Result<Vec<usize>, CapabilityError> {
        samples.iter().map(|s| self.predict(s)).collect()
    }

    /// Class probabilities for every sample in order.
    ///
    /// # Errors
    ///
    /// Returns the first per-sample error.
    fn predict_proba_batch(
        &self,
        samples: &[Vec<f64>],
    ) -> Result<Vec<Vec<f64>>, CapabilityError> {
        samples.iter().map(|s| self.predict_proba(s)).collect()
    }
}

/// A per-feature numeric transform fitted on training data.
pub trait Scaler: Sized + Send + Sync {
    /// Learn the transform from row-major `features`.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::EmptyDataset`] for zero rows, or a
    /// capability-specific failure.
    fn fit(features: &[Vec<f64>]) -> Result<Self, CapabilityError>;

    /// Transform one sample.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::FeatureMismatch`] if `sample` has the wrong
    /// length.
    fn transform(&self, sample: &[f64]) -> Result<Vec<f64>, CapabilityError>;

    /// Transform every sample in order.
    ///
    /// # Errors
    ///
    /// Returns the first per-sample error.
    fn transform_batch(&self, samples: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, CapabilityError> {
        samples.iter().map(|s| self.transform(s)).collect()
    }
}

/// Progress of one candidate within a search.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateEvent<'a> {
    /// The candidate is about to be fitted.
    Started {
        /// Zero-based grid position.
        candidate: usize,
        /// Total candidates in the grid.
        total: usize,
    },
    /// The candidate was fitted and scored.
    Scored {
        /// Zero-based grid position.
        candidate: usize,
        /// Mean cross-validated score.
        score: f64,
    },
    /// The candidate could not be fitted or scored.
    Failed {
        /// Zero-based grid position.
        candidate: usize,
        /// Failure reason as reported by the classifier.
        reason: &'a str,
    },
}

/// Receives per-candidate progress from a [`HyperparameterSearch`].
///
/// Searches may evaluate candidates in parallel, so implementations must be
/// `Sync`.
pub trait SearchProgress: Sync {
    /// Called once per event, possibly from several threads.
    fn on_event(&self, event: CandidateEvent<'_>);
}

/// Reports search progress as `debug!` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl SearchProgress for TracingProgress {
    fn on_event(&self, event: CandidateEvent<'_>) {
        match event {
            CandidateEvent::Started { candidate, total } => {
                debug!(candidate, total, "candidate started");
            }
            CandidateEvent::Scored { candidate, score } => {
                debug!(candidate, score, "candidate scored");
            }
            CandidateEvent::Failed { candidate, reason } => {
                debug!(candidate, reason, "candidate failed");
            }
        }
    }
}

/// The winning candidate of a search.
#[derive(Debug, Clone)]
pub struct SearchOutcome<C: Classifier> {
    /// Classifier refitted on the whole training partition with `params`.
    pub classifier: C,
    /// The winning parameters.
    pub params: C::Params,
    /// The winning mean cross-validated score.
    pub score: f64,
    /// Zero-based grid position of the winner.
    pub candidate: usize,
}

/// Exhaustive k-fold hyperparameter search over a [`ParamGrid`].
pub trait HyperparameterSearch<C: Classifier> {
    /// Evaluate every candidate with `n_folds`-fold cross-validation and
    /// return the best one, refitted on all of `features`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SearchError::InvalidFoldCount`] | `n_folds` cannot be honored |
    /// | [`SearchError::AllCandidatesFailed`] | no candidate could be fitted |
    fn evaluate_all_candidates(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        grid: &ParamGrid<C::Params>,
        n_folds: usize,
        progress: &dyn SearchProgress,
    ) -> Result<SearchOutcome<C>, SearchError>;
}
