//! Hyperparameter grids.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// A non-empty, ordered list of candidate parameter values.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamGrid<P> {
    candidates: Vec<P>,
}

impl<P> ParamGrid<P> {
    /// Wrap an explicit candidate list.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::EmptyGrid`] if `candidates` is empty.
    pub fn new(candidates: Vec<P>) -> Result<Self, SearchError> {
        if candidates.is_empty() {
            return Err(SearchError::EmptyGrid);
        }
        Ok(Self { candidates })
    }

    /// Number of candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Candidate at grid position `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&P> {
        self.candidates.get(index)
    }

    /// All candidates in grid order.
    #[must_use]
    pub fn as_slice(&self) -> &[P] {
        &self.candidates
    }

    /// Iterate candidates in grid order.
    pub fn iter(&self) -> std::slice::Iter<'_, P> {
        self.candidates.iter()
    }
}

impl<'a, P> IntoIterator for &'a ParamGrid<P> {
    type Item = &'a P;
    type IntoIter = std::slice::Iter<'a, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}

/// One forest-style hyperparameter combination.
///
/// The workspace ships no forest; this is the parameter vocabulary handed to
/// whichever [`Classifier`](crate::Classifier) uses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForestParams {
    /// Number of trees.
    pub n_trees: usize,
    /// Maximum tree depth; `None` means unlimited.
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node.
    pub min_samples_split: usize,
    /// Minimum samples required in a leaf.
    pub min_samples_leaf: usize,
    /// Whether trees are fitted on bootstrap samples.
    pub bootstrap: bool,
}

impl fmt::Display for ForestParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let depth = self
            .max_depth
            .map_or_else(|| "none".to_string(), |d| d.to_string());
        write!(
            f,
            "n_trees={} max_depth={} min_samples_split={} min_samples_leaf={} bootstrap={}",
            self.n_trees, depth, self.min_samples_split, self.min_samples_leaf, self.bootstrap
        )
    }
}

/// The enumerated forest search space.
///
/// # Defaults
///
/// | Axis                 | Values              |
/// |----------------------|---------------------|
/// | `n_trees`            | 100, 200, 300       |
/// | `max_depth`          | None, 10, 20        |
/// | `min_samples_split`  | 2, 5, 10            |
/// | `min_samples_leaf`   | 1, 2, 4             |
/// | `bootstrap`          | true, false         |
///
/// [`ForestGrid::expand`] enumerates the cartesian product with `n_trees`
/// outermost and `bootstrap` innermost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForestGrid {
    n_trees: Vec<usize>,
    max_depth: Vec<Option<usize>>,
    min_samples_split: Vec<usize>,
    min_samples_leaf: Vec<usize>,
    bootstrap: Vec<bool>,
}

impl Default for ForestGrid {
    fn default() -> Self {
        Self {
            n_trees: vec![100, 200, 300],
            max_depth: vec![None, Some(10), Some(20)],
            min_samples_split: vec![2, 5, 10],
            min_samples_leaf: vec![1, 2, 4],
            bootstrap: vec![true, false],
        }
    }
}

impl ForestGrid {
    /// Override the `n_trees` axis.
    #[must_use]
    pub fn with_n_trees(mut self, values: Vec<usize>) -> Self {
        self.n_trees = values;
        self
    }

    /// Override the `max_depth` axis.
    #[must_use]
    pub fn with_max_depth(mut self, values: Vec<Option<usize>>) -> Self {
        self.max_depth = values;
        self
    }

    /// Override the `min_samples_split` axis.
    #[must_use]
    pub fn with_min_samples_split(mut self, values: Vec<usize>) -> Self {
        self.min_samples_split = values;
        self
    }

    /// Override the `min_samples_leaf` axis.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, values: Vec<usize>) -> Self {
        self.min_samples_leaf = values;
        self
    }

    /// Override the `bootstrap` axis.
    #[must_use]
    pub fn with_bootstrap(mut self, values: Vec<bool>) -> Self {
        self.bootstrap = values;
        self
    }

    /// Number of combinations the grid expands to.
    #[must_use]
    pub fn n_combinations(&self) -> usize {
        self.n_trees.len()
            * self.max_depth.len()
            * self.min_samples_split.len()
            * self.min_samples_leaf.len()
            * self.bootstrap.len()
    }

    /// Enumerate every combination.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::EmptyGrid`] if any axis is empty.
    pub fn expand(&self) -> Result<ParamGrid<ForestParams>, SearchError> {
        let mut out = Vec::with_capacity(self.n_combinations());
        for &n_trees in &self.n_trees {
            for &max_depth in &self.max_depth {
                for &min_samples_split in &self.min_samples_split {
                    for &min_samples_leaf in &self.min_samples_leaf {
                        for &bootstrap in &self.bootstrap {
                            out.push(ForestParams {
                                n_trees,
                                max_depth,
                                min_samples_split,
                                min_samples_leaf,
                                bootstrap,
                            });
                        }
                    }
                }
            }
        }
        ParamGrid::new(out)
    }
}
