//! Test-double capabilities and synthetic data shared by integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use cadence_model::{
    CandidateEvent, CandidateFailure, CapabilityError, Classifier, ForestGrid, ForestParams,
    HyperparameterSearch, ParamGrid, SearchError, SearchOutcome, SearchProgress,
    k_fold_assignments,
};
use cadence_window::LabeledTable;

// ---------------------------------------------------------------------------
// Synthetic data
// ---------------------------------------------------------------------------

/// Alternating regimes of `block` rows, label 0 then 1, two features.
///
/// Feature values are `label * 3.0` plus uniform noise in [0, 0.5).
pub fn regime_table(n_rows: usize, block: usize, seed: u64) -> LabeledTable {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let labels: Vec<usize> = (0..n_rows).map(|i| (i / block) % 2).collect();
    let features = labels
        .iter()
        .map(|&l| {
            (0..2)
                .map(|_| l as f64 * 3.0 + rng.r#gen::<f64>() * 0.5)
                .collect()
        })
        .collect();
    LabeledTable::new(vec!["x".into(), "y".into()], features, labels).unwrap()
}

/// A two-candidate grid.
pub fn small_grid() -> ParamGrid<ForestParams> {
    ForestGrid::default()
        .with_n_trees(vec![10])
        .with_max_depth(vec![None, Some(3)])
        .with_min_samples_split(vec![2])
        .with_min_samples_leaf(vec![1])
        .with_bootstrap(vec![true])
        .expand()
        .unwrap()
}

// ---------------------------------------------------------------------------
// Classifiers
// ---------------------------------------------------------------------------

/// Nearest-class-centroid classifier.
///
/// Rejects `max_depth == Some(0)` so tests can mix good and bad candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    centroids: Vec<Option<Vec<f64>>>,
}

impl Classifier for Centroid {
    type Params = ForestParams;

    fn fit(
        params: &ForestParams,
        features: &[Vec<f64>],
        labels: &[usize],
    ) -> Result<Self, CapabilityError> {
        if params.max_depth == Some(0) {
            return Err(CapabilityError::InvalidParams {
                reason: "max_depth must be positive".into(),
            });
        }
        let Some(first) = features.first() else {
            return Err(CapabilityError::EmptyDataset);
        };
        let n_classes = labels.iter().max().map_or(0, |&m| m + 1);
        let mut sums = vec![vec![0.0; first.len()]; n_classes];
        let mut counts = vec![0usize; n_classes];
        for (row, &label) in features.iter().zip(labels) {
            counts[label] += 1;
            for (s, v) in sums[label].iter_mut().zip(row) {
                *s += v;
            }
        }
        let centroids = sums
            .into_iter()
            .zip(counts)
            .map(|(sum, n)| (n > 0).then(|| sum.iter().map(|s| s / n as f64).collect()))
            .collect();
        Ok(Self { centroids })
    }

    fn predict(&self, sample: &[f64]) -> Result<usize, CapabilityError> {
        let proba = self.predict_proba(sample)?;
        let mut best = 0;
        for (c, &p) in proba.iter().enumerate() {
            if p > proba[best] {
                best = c;
            }
        }
        Ok(best)
    }

    fn predict_proba(&self, sample: &[f64]) -> Result<Vec<f64>, CapabilityError> {
        let dists: Vec<Option<f64>> = self
            .centroids
            .iter()
            .map(|c| {
                c.as_ref()
                    .map(|c| c.iter().zip(sample).map(|(a, b)| (a - b).powi(2)).sum::<f64>().sqrt())
            })
            .collect();
        let d_min = dists
            .iter()
            .flatten()
            .copied()
            .fold(f64::INFINITY, f64::min);
        let weights: Vec<f64> = dists
            .iter()
            .map(|d| d.map_or(0.0, |d| (-(d - d_min)).exp()))
            .collect();
        let total: f64 = weights.iter().sum();
        Ok(weights.iter().map(|w| w / total).collect())
    }
}

/// Fails every fit the way a classifier rejecting an unknown argument would.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejecting;

impl Classifier for Rejecting {
    type Params = ForestParams;

    fn fit(_: &ForestParams, _: &[Vec<f64>], _: &[usize]) -> Result<Self, CapabilityError> {
        Err(CapabilityError::InvalidParams {
            reason: "unexpected argument `verbose`".into(),
        })
    }

    fn predict(&self, _: &[f64]) -> Result<usize, CapabilityError> {
        Err(CapabilityError::Failed { reason: "never fitted".into() })
    }

    fn predict_proba(&self, _: &[f64]) -> Result<Vec<f64>, CapabilityError> {
        Err(CapabilityError::Failed { reason: "never fitted".into() })
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Exhaustive k-fold search scoring mean fold accuracy.
///
/// Candidates are evaluated in parallel; ties go to the earliest candidate.
#[derive(Debug, Clone, Copy)]
pub struct ExhaustiveSearch {
    pub seed: u64,
}

fn cross_validate<C: Classifier>(
    params: &C::Params,
    features: &[Vec<f64>],
    labels: &[usize],
    folds: &[usize],
    n_folds: usize,
) -> Result<f64, CapabilityError> {
    let mut total = 0.0;
    for fold in 0..n_folds {
        let mut train_x = Vec::new();
        let mut train_y = Vec::new();
        let mut test = Vec::new();
        for (i, &f) in folds.iter().enumerate() {
            if f == fold {
                test.push(i);
            } else {
                train_x.push(features[i].clone());
                train_y.push(labels[i]);
            }
        }
        let model = C::fit(params, &train_x, &train_y)?;
        let mut correct = 0;
        for &i in &test {
            if model.predict(&features[i])? == labels[i] {
                correct += 1;
            }
        }
        total += correct as f64 / test.len() as f64;
    }
    Ok(total / n_folds as f64)
}

impl<C: Classifier> HyperparameterSearch<C> for ExhaustiveSearch {
    fn evaluate_all_candidates(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        grid: &ParamGrid<C::Params>,
        n_folds: usize,
        progress: &dyn SearchProgress,
    ) -> Result<SearchOutcome<C>, SearchError> {
        let folds = k_fold_assignments(features.len(), n_folds, self.seed).map_err(|_| {
            SearchError::InvalidFoldCount {
                n_folds,
                n_samples: features.len(),
            }
        })?;

        let total = grid.len();
        let results: Vec<Result<f64, String>> = grid
            .as_slice()
            .par_iter()
            .enumerate()
            .map(|(candidate, params)| {
                progress.on_event(CandidateEvent::Started { candidate, total });
                match cross_validate::<C>(params, features, labels, &folds, n_folds) {
                    Ok(score) => {
                        progress.on_event(CandidateEvent::Scored { candidate, score });
                        Ok(score)
                    }
                    Err(e) => {
                        let reason = e.to_string();
                        progress.on_event(CandidateEvent::Failed {
                            candidate,
                            reason: &reason,
                        });
                        Err(reason)
                    }
                }
            })
            .collect();

        let mut best: Option<(usize, f64)> = None;
        let mut failures = Vec::new();
        for (candidate, result) in results.into_iter().enumerate() {
            match result {
                Ok(score) => {
                    if best.is_none_or(|(_, b)| score > b) {
                        best = Some((candidate, score));
                    }
                }
                Err(reason) => failures.push(CandidateFailure {
                    candidate,
                    params: format!("{:?}", grid.as_slice()[candidate]),
                    reason,
                }),
            }
        }

        let Some((candidate, score)) = best else {
            return Err(SearchError::AllCandidatesFailed { failures });
        };
        let params = grid.as_slice()[candidate].clone();
        let classifier = C::fit(&params, features, labels).map_err(|e| {
            SearchError::AllCandidatesFailed {
                failures: vec![CandidateFailure {
                    candidate,
                    params: format!("{params:?}"),
                    reason: e.to_string(),
                }],
            }
        })?;
        Ok(SearchOutcome {
            classifier,
            params,
            score,
            candidate,
        })
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Counts events by kind.
#[derive(Debug, Default)]
pub struct CountingProgress {
    pub started: AtomicUsize,
    pub scored: AtomicUsize,
    pub failed: AtomicUsize,
}

impl SearchProgress for CountingProgress {
    fn on_event(&self, event: CandidateEvent<'_>) {
        let counter = match event {
            CandidateEvent::Started { .. } => &self.started,
            CandidateEvent::Scored { .. } => &self.scored,
            CandidateEvent::Failed { .. } => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

impl SearchProgress for &'static CountingProgress {
    fn on_event(&self, event: CandidateEvent<'_>) {
        (**self).on_event(event);
    }
}
