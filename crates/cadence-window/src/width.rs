//! The set of admissible window widths.

use std::fmt;

use crate::error::WindowError;
use crate::sampler::Window;

/// A non-empty set of positive odd window widths.
///
/// Widths are stored sorted ascending with duplicates removed. The ascending
/// order is also the order widths are drawn from by
/// [`WindowSampler`](crate::WindowSampler), so two sets built from the same
/// widths in a different order partition identically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WidthSet(Vec<usize>);

impl WidthSet {
    /// Build a width set, validating every width up front.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`WindowError::EmptyWidthSet`] | `widths` yields nothing |
    /// | [`WindowError::EvenWidth`] | any width is even (0 included) |
    pub fn new(widths: impl IntoIterator<Item = usize>) -> Result<Self, WindowError> {
        let mut widths: Vec<usize> = widths.into_iter().collect();
        if widths.is_empty() {
            return Err(WindowError::EmptyWidthSet);
        }
        if let Some(&width) = widths.iter().find(|&&w| w % 2 == 0) {
            return Err(WindowError::EvenWidth { width });
        }
        widths.sort_unstable();
        widths.dedup();
        Ok(Self(widths))
    }

    /// Narrowest width. Live inference always uses this width.
    #[must_use]
    pub fn min(&self) -> usize {
        self.0[0]
    }

    /// Widest width.
    #[must_use]
    pub fn max(&self) -> usize {
        self.0[self.0.len() - 1]
    }

    /// Number of distinct widths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; a validated width set is never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Return true if `width` is admissible.
    #[must_use]
    pub fn contains(&self, width: usize) -> bool {
        self.0.binary_search(&width).is_ok()
    }

    /// The widths, ascending.
    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// The trailing window of width [`min`](Self::min) that ends at `row_index`.
    ///
    /// Returns `None` when fewer than `min() - 1` rows precede `row_index`.
    #[must_use]
    pub fn trailing_window(&self, row_index: usize) -> Option<Window> {
        let width = self.min();
        let start = row_index.checked_add(1)?.checked_sub(width)?;
        Some(Window { start, width })
    }
}

impl TryFrom<Vec<usize>> for WidthSet {
    type Error = WindowError;

    fn try_from(widths: Vec<usize>) -> Result<Self, Self::Error> {
        Self::new(widths)
    }
}

impl From<WidthSet> for Vec<usize> {
    fn from(widths: WidthSet) -> Self {
        widths.0
    }
}

impl fmt::Display for WidthSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, w) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{w}")?;
        }
        f.write_str("}")
    }
}
