//! Reduction of a window to one feature vector and one label.

use std::collections::BTreeMap;

use crate::error::WindowError;

/// A window collapsed to a single training example.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedWindow {
    /// Column-wise mean of the window's feature rows.
    pub features: Vec<f64>,
    /// Majority label of the window.
    pub label: usize,
}

/// Column-wise arithmetic mean of `rows`.
///
/// A single-row window yields that row's features unchanged.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`WindowError::EmptyWindow`] | `rows` is empty |
/// | [`WindowError::RaggedRow`] | rows differ in length |
pub fn mean_features(rows: &[Vec<f64>]) -> Result<Vec<f64>, WindowError> {
    let first = rows.first().ok_or(WindowError::EmptyWindow)?;
    let n_features = first.len();

    let mut sums = vec![0.0f64; n_features];
    for (row_index, row) in rows.iter().enumerate() {
        if row.len() != n_features {
            return Err(WindowError::RaggedRow {
                row_index,
                expected: n_features,
                got: row.len(),
            });
        }
        for (sum, &v) in sums.iter_mut().zip(row) {
            *sum += v;
        }
    }

    let n = rows.len() as f64;
    sums.iter_mut().for_each(|v| *v /= n);
    Ok(sums)
}

/// Most frequent label in `labels`; on a tie the smallest label wins.
///
/// Returns `None` for an empty slice.
#[must_use]
pub fn majority_label(labels: &[usize]) -> Option<usize> {
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for &label in labels {
        *counts.entry(label).or_default() += 1;
    }

    // Ascending iteration plus a strict comparison keeps the smallest label on ties.
    let mut best: Option<(usize, usize)> = None;
    for (label, count) in counts {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label)
}

/// Reduce a window's feature rows and labels to one [`AggregatedWindow`].
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`WindowError::LabelCountMismatch`] | `rows.len() != labels.len()` |
/// | [`WindowError::EmptyWindow`] | `rows` is empty |
/// | [`WindowError::RaggedRow`] | rows differ in length |
pub fn aggregate(rows: &[Vec<f64>], labels: &[usize]) -> Result<AggregatedWindow, WindowError> {
    if rows.len() != labels.len() {
        return Err(WindowError::LabelCountMismatch {
            rows: rows.len(),
            labels: labels.len(),
        });
    }
    let features = mean_features(rows)?;
    let label = majority_label(labels).ok_or(WindowError::EmptyWindow)?;
    Ok(AggregatedWindow { features, label })
}
