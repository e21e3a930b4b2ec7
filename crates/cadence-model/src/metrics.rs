//! Validation metrics: confusion matrix, per-class scores and ROC-AUC.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// A confusion matrix for multi-class classification.
///
/// Classes are the distinct labels seen on either side, ascending. Entry
/// `matrix[i][j]` counts samples whose true label is `classes[i]` and whose
/// predicted label is `classes[j]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    classes: Vec<usize>,
    matrix: Vec<Vec<usize>>,
}

/// Per-class precision, recall, and F1 score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    /// The class label.
    pub class: usize,
    /// Precision: TP / (TP + FP). 0.0 if no predictions for this class.
    pub precision: f64,
    /// Recall: TP / (TP + FN). 0.0 if no true samples for this class.
    pub recall: f64,
    /// F1: 2 * precision * recall / (precision + recall). 0.0 if both are zero.
    pub f1: f64,
    /// Number of true samples in this class.
    pub support: usize,
}

fn check_lengths(labels: usize, predictions: usize) -> Result<(), ModelError> {
    if labels == 0 {
        return Err(ModelError::EmptyEvaluation);
    }
    if labels != predictions {
        return Err(ModelError::EvaluationLengthMismatch {
            labels,
            predictions,
        });
    }
    Ok(())
}

impl ConfusionMatrix {
    /// Build a confusion matrix from true and predicted labels.
    ///
    /// Only labels that occur in `true_labels` or `predicted` get a row and
    /// a column, so sparse or large class ids cost nothing extra.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ModelError::EmptyEvaluation`] | zero labels provided |
    /// | [`ModelError::EvaluationLengthMismatch`] | slices differ in length |
    pub fn from_labels(true_labels: &[usize], predicted: &[usize]) -> Result<Self, ModelError> {
        check_lengths(true_labels.len(), predicted.len())?;
        let index: BTreeMap<usize, usize> = true_labels
            .iter()
            .chain(predicted)
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .enumerate()
            .map(|(i, class)| (class, i))
            .collect();
        let n_classes = index.len();
        let mut matrix = vec![vec![0usize; n_classes]; n_classes];
        for (t, p) in true_labels.iter().zip(predicted) {
            matrix[index[t]][index[p]] += 1;
        }
        Ok(Self {
            classes: index.into_keys().collect(),
            matrix,
        })
    }

    /// Overall accuracy: proportion of correct predictions.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let correct: usize = (0..self.n_classes()).map(|i| self.matrix[i][i]).sum();
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64
        }
    }

    /// Per-class precision, recall, F1, and support.
    #[must_use]
    pub fn class_metrics(&self) -> Vec<ClassMetrics> {
        (0..self.n_classes())
            .map(|c| {
                let tp = self.matrix[c][c];
                let predicted: usize = self.matrix.iter().map(|row| row[c]).sum();
                let support: usize = self.matrix[c].iter().sum();
                let precision = if predicted == 0 {
                    0.0
                } else {
                    tp as f64 / predicted as f64
                };
                let recall = if support == 0 {
                    0.0
                } else {
                    tp as f64 / support as f64
                };
                let f1 = if precision + recall == 0.0 {
                    0.0
                } else {
                    2.0 * precision * recall / (precision + recall)
                };
                ClassMetrics {
                    class: self.classes[c],
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect()
    }

    /// Total number of counted samples.
    #[must_use]
    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }

    /// Return the underlying matrix rows.
    #[must_use]
    pub fn as_rows(&self) -> &[Vec<usize>] {
        &self.matrix
    }

    /// The labels behind each row and column, ascending.
    #[must_use]
    pub fn classes(&self) -> &[usize] {
        &self.classes
    }

    /// Return the number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>8}", "")?;
        for class in &self.classes {
            write!(f, " pred_{class:>3}")?;
        }
        writeln!(f)?;
        for (class, row) in self.classes.iter().zip(&self.matrix) {
            write!(f, "true_{class:>3}")?;
            for val in row {
                write!(f, " {val:>7}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Area under the ROC curve for `positive_class` scores.
///
/// Computed as the normalized Mann-Whitney rank statistic, with tied scores
/// given their average rank. Returns `None` when `labels` and `scores`
/// differ in length or when only one class is present.
#[must_use]
pub fn roc_auc(labels: &[usize], scores: &[f64], positive_class: usize) -> Option<f64> {
    if labels.len() != scores.len() {
        return None;
    }
    let n_pos = labels.iter().filter(|&&l| l == positive_class).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut ranks = vec![0.0; scores.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // 1-based ranks i+1..=j+1 share their mean.
        let rank = (i + j + 2) as f64 / 2.0;
        for &k in &order[i..=j] {
            ranks[k] = rank;
        }
        i = j + 1;
    }

    let pos_rank_sum: f64 = labels
        .iter()
        .zip(&ranks)
        .filter(|&(&l, _)| l == positive_class)
        .map(|(_, &r)| r)
        .sum();
    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    Some((pos_rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}

/// Scores of a trained model on the held-out validation windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Number of scored samples.
    pub n_samples: usize,
    /// Proportion of correct predictions.
    pub accuracy: f64,
    /// Rows are true classes, columns predicted classes.
    pub confusion_matrix: ConfusionMatrix,
    /// Precision, recall, F1 and support per class.
    pub class_metrics: Vec<ClassMetrics>,
    /// Class whose probability drives `roc_auc`.
    pub positive_class: usize,
    /// ROC-AUC, or `None` when only one class is present.
    pub roc_auc: Option<f64>,
}

impl ValidationReport {
    /// Assemble a report from true labels, predicted labels and the
    /// predicted probability of `positive_class` for each sample.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ModelError::EmptyEvaluation`] | zero labels provided |
    /// | [`ModelError::EvaluationLengthMismatch`] | slices differ in length |
    pub fn from_predictions(
        labels: &[usize],
        predicted: &[usize],
        positive_scores: &[f64],
        positive_class: usize,
    ) -> Result<Self, ModelError> {
        check_lengths(labels.len(), positive_scores.len())?;
        let confusion_matrix = ConfusionMatrix::from_labels(labels, predicted)?;
        Ok(Self {
            n_samples: labels.len(),
            accuracy: confusion_matrix.accuracy(),
            class_metrics: confusion_matrix.class_metrics(),
            confusion_matrix,
            positive_class,
            roc_auc: roc_auc(labels, positive_scores, positive_class),
        })
    }
}
