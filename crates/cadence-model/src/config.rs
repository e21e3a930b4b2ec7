//! Configuration builder for the training pipeline.

use cadence_window::WidthSet;

use crate::error::ModelError;

/// Configuration for [`TrainingPipeline`](crate::TrainingPipeline).
///
/// Construct via [`PipelineConfig::new`], then chain `with_*` methods.
/// Range checks on the chained values run when the pipeline is created.
///
/// # Defaults
///
/// | Parameter             | Default |
/// |-----------------------|---------|
/// | `seed`                | 42      |
/// | `validation_fraction` | 0.2     |
/// | `split_seed`          | 42      |
/// | `n_folds`             | 10      |
/// | `positive_class`      | 1       |
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub(crate) widths: WidthSet,
    pub(crate) seed: u64,
    pub(crate) validation_fraction: f64,
    pub(crate) split_seed: u64,
    pub(crate) n_folds: usize,
    pub(crate) positive_class: usize,
}

impl PipelineConfig {
    /// Create a config for the given window widths.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ModelError::Window`] | `widths` is empty or holds an even value |
    pub fn new(widths: impl IntoIterator<Item = usize>) -> Result<Self, ModelError> {
        Ok(Self::from_width_set(WidthSet::new(widths)?))
    }

    /// Create a config around an already validated width set.
    #[must_use]
    pub fn from_width_set(widths: WidthSet) -> Self {
        Self {
            widths,
            seed: 42,
            validation_fraction: 0.2,
            split_seed: 42,
            n_folds: 10,
            positive_class: 1,
        }
    }

    // --- Setters ---

    /// Set the seed the window stream is re-seeded with before partitioning.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the share of windows held out for validation.
    #[must_use]
    pub fn with_validation_fraction(mut self, fraction: f64) -> Self {
        self.validation_fraction = fraction;
        self
    }

    /// Set the seed of the train/validation shuffle.
    #[must_use]
    pub fn with_split_seed(mut self, seed: u64) -> Self {
        self.split_seed = seed;
        self
    }

    /// Set the number of cross-validation folds passed to the search.
    #[must_use]
    pub fn with_n_folds(mut self, n_folds: usize) -> Self {
        self.n_folds = n_folds;
        self
    }

    /// Set the class whose probability is used for ROC-AUC.
    #[must_use]
    pub fn with_positive_class(mut self, positive_class: usize) -> Self {
        self.positive_class = positive_class;
        self
    }

    // --- Getters ---

    /// The configured window widths.
    #[must_use]
    pub fn widths(&self) -> &WidthSet {
        &self.widths
    }

    /// The window stream seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The held-out share.
    #[must_use]
    pub fn validation_fraction(&self) -> f64 {
        self.validation_fraction
    }

    /// The split seed.
    #[must_use]
    pub fn split_seed(&self) -> u64 {
        self.split_seed
    }

    /// The fold count.
    #[must_use]
    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    /// The positive class.
    #[must_use]
    pub fn positive_class(&self) -> usize {
        self.positive_class
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidConfig`] if the validation fraction is
    /// not strictly between 0 and 1, or fewer than 2 folds are requested.
    pub fn validate(&self) -> Result<(), ModelError> {
        if !(self.validation_fraction > 0.0 && self.validation_fraction < 1.0) {
            return Err(ModelError::InvalidConfig {
                reason: format!(
                    "validation fraction must be in (0, 1), got {}",
                    self.validation_fraction
                ),
            });
        }
        if self.n_folds < 2 {
            return Err(ModelError::InvalidConfig {
                reason: format!("at least 2 folds are required, got {}", self.n_folds),
            });
        }
        Ok(())
    }
}
