//! Randomized odd-width windowing of ordered time-series tables.
//!
//! Pure math library, zero I/O. Partitions a table into consecutive,
//! non-overlapping windows whose widths are drawn from a seeded stream,
//! collapses each window to a mean feature vector and a majority label, and
//! locates the trailing window used for live single-row inference.

mod aggregate;
mod dataset;
mod error;
mod sampler;
mod stream;
mod table;
mod width;

pub use aggregate::{AggregatedWindow, aggregate, majority_label, mean_features};
pub use dataset::{DatasetBuilder, WindowedDataset};
pub use error::WindowError;
pub use sampler::{Window, WindowSampler};
pub use stream::SampleStream;
pub use table::LabeledTable;
pub use width::WidthSet;
