//! File I/O, validation, and serialization for the cadence pipeline.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::{ExperimentName, FeatureFrame};
pub use error::IoError;
pub use reader::TableReader;
pub use writer::{ReportWriter, WindowSummary};
