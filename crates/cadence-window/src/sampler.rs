//! Randomized partitioning of ordered rows into non-overlapping windows.

use std::fmt;
use std::ops::Range;

use tracing::{debug, instrument};

use crate::stream::SampleStream;
use crate::width::WidthSet;

/// A contiguous run of rows `[start, start + width)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window {
    /// Index of the first row in the window.
    pub start: usize,
    /// Number of rows in the window.
    pub width: usize,
}

impl Window {
    /// One past the last row of the window.
    #[must_use]
    pub fn end(&self) -> usize {
        self.start + self.width
    }

    /// Row index range covered by the window.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end())
    }
}

/// Partitions a row-indexed table into consecutive windows of randomly drawn width.
///
/// Each step draws one width uniformly from the [`WidthSet`]. A width that
/// would run past the last row ends the pass; the remaining tail is dropped,
/// never emitted as a short window.
#[derive(Debug, Clone)]
pub struct WindowSampler {
    widths: WidthSet,
}

impl WindowSampler {
    /// Create a sampler over an already-validated width set.
    #[must_use]
    pub fn new(widths: WidthSet) -> Self {
        Self { widths }
    }

    /// The admissible widths.
    #[must_use]
    pub fn widths(&self) -> &WidthSet {
        &self.widths
    }

    /// Partition `row_count` rows into windows.
    ///
    /// When `seed` is `Some`, `stream` is re-seeded before the first draw and
    /// the result is reproducible. When `None`, draws continue from the
    /// stream's current position.
    ///
    /// Returns an empty vector when `row_count < widths.min()`.
    #[instrument(skip(self, stream), fields(widths = %self.widths))]
    pub fn partition(
        &self,
        row_count: usize,
        stream: &mut SampleStream,
        seed: Option<u64>,
    ) -> Vec<Window> {
        if let Some(seed) = seed {
            stream.reseed(seed);
        }

        let widths = self.widths.as_slice();
        let min_width = self.widths.min();
        let mut windows = Vec::new();
        if row_count < min_width {
            debug!(row_count, min_width, "too few rows for any window");
            return windows;
        }

        let mut cursor = 0;
        while cursor <= row_count - min_width {
            let width = widths[stream.draw_index(widths.len())];
            if cursor.checked_add(width).is_none_or(|end| end > row_count) {
                debug!(cursor, width, "drawn width overruns the table");
                break;
            }
            windows.push(Window { start: cursor, width });
            cursor += width;
        }

        debug!(
            n_windows = windows.len(),
            rows_dropped = row_count - cursor,
            "partition complete"
        );
        windows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sampler(widths: &[usize]) -> WindowSampler {
        WindowSampler::new(WidthSet::new(widths.iter().copied()).unwrap())
    }

    fn assert_contiguous(windows: &[Window], widths: &WidthSet, row_count: usize) {
        let mut cursor = 0;
        for w in windows {
            assert_eq!(w.start, cursor, "gap or overlap at {w}");
            assert!(widths.contains(w.width), "width {} not admissible", w.width);
            cursor = w.end();
        }
        assert!(cursor <= row_count);
    }

    #[test]
    fn seeded_fixture() {
        let s = sampler(&[1, 3, 5]);
        let mut stream = SampleStream::new(0);
        let windows = s.partition(10, &mut stream, Some(7));
        assert_eq!(
            windows,
            vec![Window { start: 0, width: 3 }, Window { start: 3, width: 5 }]
        );
    }

    #[test]
    fn unseeded_call_continues_stream() {
        let s = sampler(&[1, 3, 5]);
        let mut stream = SampleStream::new(0);
        let _ = s.partition(10, &mut stream, Some(7));
        let continued = s.partition(10, &mut stream, None);
        let expected: Vec<Window> = [(0, 1), (1, 3), (4, 1), (5, 3), (8, 1)]
            .into_iter()
            .map(|(start, width)| Window { start, width })
            .collect();
        assert_eq!(continued, expected);
    }

    #[test]
    fn same_seed_same_windows() {
        let s = sampler(&[3, 5, 7]);
        let mut a = SampleStream::new(1);
        let mut b = SampleStream::new(2);
        assert_eq!(
            s.partition(500, &mut a, Some(42)),
            s.partition(500, &mut b, Some(42))
        );
    }

    #[test]
    fn windows_are_contiguous_and_admissible() {
        let widths = WidthSet::new([1, 3, 5, 9]).unwrap();
        let s = WindowSampler::new(widths.clone());
        let mut stream = SampleStream::new(5);
        for row_count in [0, 1, 2, 8, 9, 10, 57, 1000] {
            let windows = s.partition(row_count, &mut stream, None);
            assert_contiguous(&windows, &widths, row_count);
        }
    }

    #[test]
    fn unconsumed_tail_shorter_than_max_width() {
        let widths = WidthSet::new([3, 5, 7]).unwrap();
        let s = WindowSampler::new(widths.clone());
        let mut stream = SampleStream::new(9);
        for seed in 0..50 {
            let windows = s.partition(100, &mut stream, Some(seed));
            let consumed = windows.last().map_or(0, Window::end);
            assert!(100 - consumed < widths.max(), "seed {seed} left {} rows", 100 - consumed);
        }
    }

    #[test]
    fn too_few_rows_is_empty() {
        let s = sampler(&[5]);
        let mut stream = SampleStream::new(0);
        assert!(s.partition(4, &mut stream, Some(1)).is_empty());
        assert!(s.partition(0, &mut stream, None).is_empty());
    }

    #[test]
    fn single_width_tiles_exactly() {
        let s = sampler(&[3]);
        let mut stream = SampleStream::new(0);
        let windows = s.partition(10, &mut stream, Some(0));
        let starts: Vec<usize> = windows.iter().map(|w| w.start).collect();
        assert_eq!(starts, vec![0, 3, 6]);
        assert!(windows.iter().all(|w| w.width == 3));
    }

    #[test]
    fn width_one_consumes_every_row() {
        let s = sampler(&[1]);
        let mut stream = SampleStream::new(0);
        let windows = s.partition(6, &mut stream, None);
        assert_eq!(windows.len(), 6);
    }

    #[test]
    fn huge_width_stops_without_overflow() {
        let widths = WidthSet::new([1, usize::MAX]).unwrap();
        let s = WindowSampler::new(widths.clone());
        let mut stream = SampleStream::new(0);
        for seed in 0..64 {
            let windows = s.partition(10, &mut stream, Some(seed));
            assert!(windows.iter().all(|w| w.width == 1), "seed {seed}");
            assert_contiguous(&windows, &widths, 10);
        }
    }

    #[test]
    fn window_accessors() {
        let w = Window { start: 4, width: 3 };
        assert_eq!(w.end(), 7);
        assert_eq!(w.range(), 4..7);
        assert_eq!(w.to_string(), "[4, 7)");
    }
}
