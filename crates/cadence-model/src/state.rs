//! The trained triple that inference runs on.

use cadence_window::WidthSet;

/// A fitted classifier, its fitted scaler and the widths it was trained with.
///
/// Created by [`TrainingPipeline::fit`](crate::TrainingPipeline::fit) or
/// [`TrainedState::load`]; read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedState<C, S> {
    classifier: C,
    scaler: S,
    widths: WidthSet,
}

impl<C, S> TrainedState<C, S> {
    /// Bundle the three parts.
    #[must_use]
    pub fn new(classifier: C, scaler: S, widths: WidthSet) -> Self {
        Self {
            classifier,
            scaler,
            widths,
        }
    }

    /// The fitted classifier.
    #[must_use]
    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// The fitted scaler.
    #[must_use]
    pub fn scaler(&self) -> &S {
        &self.scaler
    }

    /// The widths used in training; `min()` sizes the trailing window.
    #[must_use]
    pub fn widths(&self) -> &WidthSet {
        &self.widths
    }

    /// Consume the state, returning `(classifier, scaler, widths)`.
    #[must_use]
    pub fn into_parts(self) -> (C, S, WidthSet) {
        (self.classifier, self.scaler, self.widths)
    }
}
