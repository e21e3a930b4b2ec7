//! Error types for training, inference, search and persisted state.

use std::fmt;
use std::path::PathBuf;

use cadence_window::WindowError;

/// Why one hyperparameter candidate could not be fitted or scored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFailure {
    /// Zero-based position of the candidate in the grid.
    pub candidate: usize,
    /// Debug rendering of the candidate's parameters.
    pub params: String,
    /// The failure reason reported by the classifier, verbatim.
    pub reason: String,
}

impl fmt::Display for CandidateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "candidate {} ({}): {}", self.candidate, self.params, self.reason)
    }
}

fn list_failures(failures: &[CandidateFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors reported by classifier and scaler capabilities.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CapabilityError {
    /// Returned when fitting is attempted on zero samples.
    #[error("cannot fit on an empty dataset")]
    EmptyDataset,

    /// Returned when an input's feature count differs from the fitted one.
    #[error("input has {got} features, expected {expected}")]
    FeatureMismatch {
        /// Feature count seen at fit time.
        expected: usize,
        /// Feature count of the offending input.
        got: usize,
    },

    /// Returned when the capability rejects its parameters.
    #[error("invalid parameters: {reason}")]
    InvalidParams {
        /// Human-readable rejection reason.
        reason: String,
    },

    /// Any other capability-specific failure.
    #[error("{reason}")]
    Failed {
        /// Human-readable failure reason.
        reason: String,
    },
}

/// Errors reported by a hyperparameter search capability.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SearchError {
    /// Returned when the parameter grid has no candidates.
    #[error("parameter grid is empty")]
    EmptyGrid,

    /// Returned when the fold count cannot be honored for the sample count.
    #[error("cannot run {n_folds}-fold search over {n_samples} samples")]
    InvalidFoldCount {
        /// Requested number of folds.
        n_folds: usize,
        /// Number of training samples.
        n_samples: usize,
    },

    /// Returned when every candidate failed to fit or score.
    #[error("all {} candidates failed: {}", .failures.len(), list_failures(.failures))]
    AllCandidatesFailed {
        /// One entry per candidate, in grid order.
        failures: Vec<CandidateFailure>,
    },
}

/// Errors from the training pipeline, inference engine and state store.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Returned when a width set, table or window fails validation.
    #[error(transparent)]
    Window(#[from] WindowError),

    /// Returned when the width set produces zero windows from the table.
    #[error("width set {widths} produced no windows from {n_rows} rows (narrowest width is {min_width})")]
    NoWindows {
        /// Rows in the supplied table.
        n_rows: usize,
        /// The configured widths.
        widths: String,
        /// The narrowest configured width.
        min_width: usize,
    },

    /// Returned when a pipeline setting is out of range.
    #[error("invalid pipeline configuration: {reason}")]
    InvalidConfig {
        /// Which setting and why.
        reason: String,
    },

    /// Returned when the windows cannot be split into non-empty train and validation sets.
    #[error("{n_windows} windows cannot be split into {n_train} training and {n_validation} validation windows")]
    TooFewWindows {
        /// Windows produced from the table.
        n_windows: usize,
        /// Windows that would go to training.
        n_train: usize,
        /// Windows that would go to validation.
        n_validation: usize,
    },

    /// Returned when every hyperparameter candidate failed.
    #[error("all {} hyperparameter candidates failed to fit: {}", .failures.len(), list_failures(.failures))]
    SearchExhausted {
        /// Per-candidate failure reasons, in grid order.
        failures: Vec<CandidateFailure>,
    },

    /// Returned when the search capability fails for any other reason.
    #[error("hyperparameter search failed")]
    Search(#[source] SearchError),

    /// Returned when a classifier or scaler capability fails.
    #[error("{stage} failed")]
    Capability {
        /// The pipeline stage that invoked the capability.
        stage: &'static str,
        /// The capability's error.
        source: CapabilityError,
    },

    /// Returned when a prediction is requested before enough rows exist.
    #[error("row {row_index} has too little history: the trailing window needs {min_width} rows ending at it")]
    InsufficientHistory {
        /// The requested anchor row.
        row_index: usize,
        /// The narrowest configured width.
        min_width: usize,
    },

    /// Returned when the anchor row is past the end of the supplied rows.
    #[error("row {row_index} is out of range for {n_rows} rows")]
    RowOutOfRange {
        /// The requested anchor row.
        row_index: usize,
        /// Number of rows supplied.
        n_rows: usize,
    },

    /// Returned when metrics are requested for zero samples.
    #[error("cannot score an empty evaluation set")]
    EmptyEvaluation,

    /// Returned when labels and predictions differ in length.
    #[error("{labels} labels but {predictions} predictions")]
    EvaluationLengthMismatch {
        /// Number of true labels.
        labels: usize,
        /// Number of predictions or scores.
        predictions: usize,
    },

    /// Returned when no trained state exists yet.
    #[error("no trained state: call fit or install a loaded state first")]
    NotTrained,

    /// Returned when the state bundle cannot be encoded.
    #[error("failed to serialize trained state")]
    SerializeState {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when writing the state bundle fails.
    #[error("failed to write trained state to {path}")]
    WriteState {
        /// Destination path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading the state bundle fails.
    #[error("failed to read trained state from {path}")]
    ReadState {
        /// Source path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a state bundle is malformed.
    #[error("corrupt trained state in {origin}: field `{field}`: {reason}")]
    CorruptState {
        /// Path of the bundle, or `<memory>` for in-memory decoding.
        origin: String,
        /// The bundle field that failed (`bundle` when undecodable).
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// Returned when a state bundle has an unsupported format version.
    #[error("incompatible trained state version in {origin}: expected {expected}, found {found}")]
    IncompatibleStateVersion {
        /// Path of the bundle, or `<memory>`.
        origin: String,
        /// The version this build reads.
        expected: u32,
        /// The version found in the bundle.
        found: u32,
    },
}

impl ModelError {
    pub(crate) fn capability(stage: &'static str) -> impl FnOnce(CapabilityError) -> Self {
        move |source| Self::Capability { stage, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(candidate: usize, reason: &str) -> CandidateFailure {
        CandidateFailure {
            candidate,
            params: format!("P{candidate}"),
            reason: reason.to_string(),
        }
    }

    #[test]
    fn search_exhausted_lists_every_reason() {
        let err = ModelError::SearchExhausted {
            failures: vec![
                failure(0, "unexpected argument `verbose`"),
                failure(1, "unexpected argument `verbose`"),
            ],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("all 2 hyperparameter candidates failed to fit"));
        assert!(msg.contains("candidate 0 (P0): unexpected argument `verbose`"));
        assert!(msg.contains("candidate 1 (P1)"));
    }

    #[test]
    fn window_errors_keep_their_own_message() {
        let err = ModelError::from(WindowError::RaggedRow {
            row_index: 2,
            expected: 3,
            got: 1,
        });
        assert_eq!(err.to_string(), "row 2 has 1 features, expected 3");
    }

    #[test]
    fn insufficient_history_names_row() {
        let err = ModelError::InsufficientHistory {
            row_index: 1,
            min_width: 3,
        };
        assert!(err.to_string().contains("row 1"));
        assert!(err.to_string().contains("3 rows"));
    }

    #[test]
    fn corrupt_state_names_field() {
        let err = ModelError::CorruptState {
            origin: "/tmp/x.bin".into(),
            field: "widths",
            reason: "window widths must be positive odd integers, got 4".into(),
        };
        assert!(err.to_string().contains("field `widths`"));
    }

    #[test]
    fn capability_helper_tags_stage() {
        let err = ModelError::capability("scaler fit")(CapabilityError::EmptyDataset);
        assert!(matches!(err, ModelError::Capability { stage: "scaler fit", .. }));
        assert_eq!(err.to_string(), "scaler fit failed");
    }
}
