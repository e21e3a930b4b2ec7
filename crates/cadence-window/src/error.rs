//! Error types for windowing, aggregation and table validation.

/// Errors from width-set construction, table validation and window aggregation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    /// Returned when a width set is constructed from zero widths.
    #[error("width set must contain at least one width")]
    EmptyWidthSet,

    /// Returned when a width set contains an even width (zero included).
    #[error("window widths must be positive odd integers, got {width}")]
    EvenWidth {
        /// The offending width.
        width: usize,
    },

    /// Returned when aggregation is asked to reduce a window with no rows.
    #[error("cannot aggregate an empty window")]
    EmptyWindow,

    /// Returned when a row has a different number of features than the first row.
    #[error("row {row_index} has {got} features, expected {expected}")]
    RaggedRow {
        /// Zero-based index of the offending row.
        row_index: usize,
        /// Feature count of the first row.
        expected: usize,
        /// Feature count of the offending row.
        got: usize,
    },

    /// Returned when a feature value is NaN or infinite.
    #[error("non-finite value at row {row_index}, feature {feature_index}")]
    NonFiniteValue {
        /// Zero-based row index.
        row_index: usize,
        /// Zero-based feature column index.
        feature_index: usize,
    },

    /// Returned when the label column length differs from the row count.
    #[error("{rows} feature rows but {labels} labels")]
    LabelCountMismatch {
        /// Number of feature rows.
        rows: usize,
        /// Number of labels.
        labels: usize,
    },

    /// Returned when the number of feature names differs from the feature count.
    #[error("{names} feature names for {features} feature columns")]
    FeatureNameMismatch {
        /// Number of feature names supplied.
        names: usize,
        /// Number of feature columns in the rows.
        features: usize,
    },
}
