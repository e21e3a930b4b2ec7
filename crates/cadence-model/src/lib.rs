//! Training pipeline, sliding-window inference and persisted state for
//! classifiers over randomized time-series windows.
//!
//! The classifier, the scaler and the hyperparameter search are capabilities
//! expressed as traits ([`Classifier`], [`Scaler`], [`HyperparameterSearch`]);
//! this crate composes them with the windowing in `cadence-window`. A
//! [`StandardScaler`] is provided. No classifier or search engine is.

mod capability;
mod config;
mod error;
mod grid;
mod inference;
mod metrics;
mod pipeline;
mod scaler;
mod split;
mod state;
mod store;

pub use capability::{
    CandidateEvent, Classifier, HyperparameterSearch, Scaler, SearchOutcome, SearchProgress,
    TracingProgress,
};
pub use config::PipelineConfig;
pub use error::{CandidateFailure, CapabilityError, ModelError, SearchError};
pub use grid::{ForestGrid, ForestParams, ParamGrid};
pub use inference::{InferenceEngine, RowPrediction, trailing_window};
pub use metrics::{ClassMetrics, ConfusionMatrix, ValidationReport, roc_auc};
pub use pipeline::{FitReport, TrainingPipeline};
pub use scaler::StandardScaler;
pub use split::{TrainValidationSplit, k_fold_assignments, train_validation_split};
pub use state::TrainedState;
