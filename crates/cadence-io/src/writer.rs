//! JSON artifact writer for windowing, validation and prediction outputs.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use cadence_model::{RowPrediction, ValidationReport};
use cadence_window::{WidthSet, WindowedDataset};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::ExperimentName;

/// Writes pipeline artifacts to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_windows.json`,
/// `{experiment}_validation.json` and `{experiment}_predictions.json`; the
/// trained state bundle belongs at [`ReportWriter::state_path`].
pub struct ReportWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ReportWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Where the trained state bundle for this experiment is saved.
    #[must_use]
    pub fn state_path(&self) -> PathBuf {
        self.file_path("state.bin")
    }

    fn file_path(&self, suffix: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{suffix}", self.experiment.as_str()))
    }

    fn write_json<T: Serialize>(&self, suffix: &str, artifact: &T) -> Result<PathBuf, IoError> {
        let path = self.file_path(suffix);
        let json = serde_json::to_string_pretty(artifact).map_err(|e| IoError::Serialize {
            path: path.clone(),
            source: e,
        })?;
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;
        Ok(path)
    }

    /// Write the windows of `dataset` to `{experiment}_windows.json`.
    ///
    /// Returns the written path.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::Serialize`] | JSON encoding failed |
    /// | [`IoError::WriteFile`] | file write failed |
    #[instrument(skip_all)]
    pub fn write_windows(
        &self,
        widths: &WidthSet,
        seed: u64,
        n_rows: usize,
        dataset: &WindowedDataset,
    ) -> Result<PathBuf, IoError> {
        let windows = dataset
            .windows()
            .iter()
            .zip(dataset.features())
            .zip(dataset.labels())
            .map(|((w, features), &label)| WindowEntry {
                start: w.start,
                width: w.width,
                label,
                features,
            })
            .collect();

        let artifact = WindowsArtifact {
            experiment: self.experiment.as_str(),
            widths: widths.as_slice(),
            seed,
            summary: WindowSummary::new(n_rows, dataset),
            windows,
        };
        let path = self.write_json("windows.json", &artifact)?;
        info!(path = %path.display(), n_windows = dataset.len(), "windows written");
        Ok(path)
    }

    /// Write validation scores and the winning parameters to
    /// `{experiment}_validation.json`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::Serialize`] | JSON encoding failed |
    /// | [`IoError::WriteFile`] | file write failed |
    #[instrument(skip_all)]
    pub fn write_validation<P: Serialize>(
        &self,
        best_params: &P,
        best_score: f64,
        report: &ValidationReport,
    ) -> Result<PathBuf, IoError> {
        let artifact = ValidationArtifact {
            experiment: self.experiment.as_str(),
            best_params,
            best_score,
            validation: report,
        };
        let path = self.write_json("validation.json", &artifact)?;
        info!(path = %path.display(), accuracy = report.accuracy, "validation written");
        Ok(path)
    }

    /// Write trailing-window predictions to `{experiment}_predictions.json`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::Serialize`] | JSON encoding failed |
    /// | [`IoError::WriteFile`] | file write failed |
    #[instrument(skip_all)]
    pub fn write_predictions(&self, predictions: &[RowPrediction]) -> Result<PathBuf, IoError> {
        let artifact = PredictionsArtifact {
            experiment: self.experiment.as_str(),
            n_predictions: predictions.len(),
            predictions,
        };
        let path = self.write_json("predictions.json", &artifact)?;
        info!(path = %path.display(), n_predictions = predictions.len(), "predictions written");
        Ok(path)
    }
}

// ---------------------------------------------------------------------------
// Serialization structs
// ---------------------------------------------------------------------------

/// Counts describing how a table was windowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowSummary {
    /// Rows in the source table.
    pub n_rows: usize,
    /// Windows produced.
    pub n_windows: usize,
    /// Rows covered by the windows.
    pub rows_consumed: usize,
    /// Trailing rows left out of every window.
    pub rows_dropped: usize,
    /// Window count per aggregated label.
    pub label_counts: BTreeMap<usize, usize>,
}

impl WindowSummary {
    /// Summarize `dataset`, built from a table of `n_rows` rows.
    #[must_use]
    pub fn new(n_rows: usize, dataset: &WindowedDataset) -> Self {
        let rows_consumed = dataset.rows_consumed();
        Self {
            n_rows,
            n_windows: dataset.len(),
            rows_consumed,
            rows_dropped: n_rows.saturating_sub(rows_consumed),
            label_counts: dataset.label_counts(),
        }
    }
}

#[derive(Serialize)]
struct WindowEntry<'a> {
    start: usize,
    width: usize,
    label: usize,
    features: &'a [f64],
}

#[derive(Serialize)]
struct WindowsArtifact<'a> {
    experiment: &'a str,
    widths: &'a [usize],
    seed: u64,
    summary: WindowSummary,
    windows: Vec<WindowEntry<'a>>,
}

#[derive(Serialize)]
struct ValidationArtifact<'a, P> {
    experiment: &'a str,
    best_params: &'a P,
    best_score: f64,
    validation: &'a ValidationReport,
}

#[derive(Serialize)]
struct PredictionsArtifact<'a> {
    experiment: &'a str,
    n_predictions: usize,
    predictions: &'a [RowPrediction],
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn writer(dir: &Path, name: &str) -> ReportWriter {
        ReportWriter::new(dir, ExperimentName::new(name.to_string()).unwrap()).unwrap()
    }

    #[test]
    fn creates_nested_output_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        writer(&nested, "exp");
        assert!(nested.is_dir());
    }

    #[test]
    fn state_path_is_named_after_experiment() {
        let dir = TempDir::new().unwrap();
        let w = writer(dir.path(), "run_7");
        assert_eq!(w.state_path(), dir.path().join("run_7_state.bin"));
    }

    #[test]
    fn predictions_file_round_trips() {
        let dir = TempDir::new().unwrap();
        let w = writer(dir.path(), "live");
        let preds = vec![RowPrediction {
            row_index: 4,
            label: 1,
            probabilities: vec![0.25, 0.75],
        }];
        let path = w.write_predictions(&preds).unwrap();
        assert_eq!(path, dir.path().join("live_predictions.json"));

        let v: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(v["experiment"], "live");
        assert_eq!(v["n_predictions"], 1);
        assert_eq!(v["predictions"][0]["row_index"], 4);
        assert_eq!(v["predictions"][0]["probabilities"][1], 0.75);
    }
}
