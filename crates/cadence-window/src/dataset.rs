//! Building a windowed training dataset from a whole table.

use std::collections::BTreeMap;

use tracing::{info, instrument};

use crate::aggregate::aggregate;
use crate::error::WindowError;
use crate::sampler::{Window, WindowSampler};
use crate::stream::SampleStream;
use crate::table::LabeledTable;

/// One aggregated example per window, in window order.
///
/// `windows[i]`, `features[i]` and `labels[i]` describe the same window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowedDataset {
    windows: Vec<Window>,
    features: Vec<Vec<f64>>,
    labels: Vec<usize>,
}

impl WindowedDataset {
    /// The windows the table was partitioned into.
    #[must_use]
    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    /// One mean feature vector per window.
    #[must_use]
    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    /// One majority label per window.
    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Number of windows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Return true if no window could be formed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Number of source rows covered by the windows.
    #[must_use]
    pub fn rows_consumed(&self) -> usize {
        self.windows.last().map_or(0, Window::end)
    }

    /// Window count per aggregated label, ascending by label.
    #[must_use]
    pub fn label_counts(&self) -> BTreeMap<usize, usize> {
        let mut counts = BTreeMap::new();
        for &label in &self.labels {
            *counts.entry(label).or_default() += 1;
        }
        counts
    }

    /// Consume the dataset, returning `(features, labels)`.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Vec<f64>>, Vec<usize>) {
        (self.features, self.labels)
    }
}

/// Drives a [`WindowSampler`] and window aggregation over a [`LabeledTable`].
#[derive(Debug, Clone)]
pub struct DatasetBuilder {
    sampler: WindowSampler,
}

impl DatasetBuilder {
    /// Create a builder around `sampler`.
    #[must_use]
    pub fn new(sampler: WindowSampler) -> Self {
        Self { sampler }
    }

    /// The sampler used to partition tables.
    #[must_use]
    pub fn sampler(&self) -> &WindowSampler {
        &self.sampler
    }

    /// Partition `table` and aggregate each window.
    ///
    /// `seed` has the same meaning as in
    /// [`WindowSampler::partition`]. The result is empty, not an error, when
    /// the table is shorter than the narrowest width.
    ///
    /// # Errors
    ///
    /// Aggregation errors cannot occur for a validated [`LabeledTable`]; any
    /// [`WindowError`] is propagated unchanged.
    #[instrument(skip_all, fields(n_rows = table.n_rows(), seed = ?seed))]
    pub fn build(
        &self,
        table: &LabeledTable,
        stream: &mut SampleStream,
        seed: Option<u64>,
    ) -> Result<WindowedDataset, WindowError> {
        let windows = self.sampler.partition(table.n_rows(), stream, seed);

        let mut features = Vec::with_capacity(windows.len());
        let mut labels = Vec::with_capacity(windows.len());
        for window in &windows {
            let (rows, row_labels) = table.window_rows(window);
            let agg = aggregate(rows, row_labels)?;
            features.push(agg.features);
            labels.push(agg.label);
        }

        let dataset = WindowedDataset {
            windows,
            features,
            labels,
        };
        info!(
            n_windows = dataset.len(),
            rows_consumed = dataset.rows_consumed(),
            "windowed dataset built"
        );
        Ok(dataset)
    }
}
