//! CSV table reader with full input validation.

use std::path::{Path, PathBuf};

use cadence_window::LabeledTable;
use csv::StringRecord;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::FeatureFrame;

/// Largest accepted class label.
const MAX_LABEL: usize = u16::MAX as usize;

/// Reads an ordered time-series table from a CSV file.
///
/// Expected CSV format:
/// - Header row required; row order is time order
/// - Labeled mode ([`TableReader::read`]): `f0,f1,...,fn,label`; every
///   column but the last is a numeric feature, the last is the label
/// - Unlabeled mode ([`TableReader::read_features`]): every column is a
///   numeric feature
/// - Labels are integers in `0..=65535`, written either `1` or `1.0`
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::TooFewColumns`] | Header lacks a feature (or label) column |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::NonFiniteValue`] | Feature cell is NaN, Inf, or unparseable float |
/// | [`IoError::InvalidLabel`] | Label cell is not an integer in `0..=65535` |
pub struct TableReader {
    path: PathBuf,
}

impl TableReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read a labeled table; the last column holds the labels.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<LabeledTable, IoError> {
        let (mut header, records) = self.read_records(2)?;
        let label_col = header.len() - 1;
        header.truncate(label_col);

        let mut features = Vec::with_capacity(records.len());
        let mut labels = Vec::with_capacity(records.len());
        for (row_index, record) in records.iter().enumerate() {
            features.push(self.parse_features(&header, record, row_index)?);
            labels.push(self.parse_label(record.get(label_col).unwrap_or(""), row_index)?);
        }

        let table =
            LabeledTable::new(header, features, labels).map_err(|source| IoError::Table {
                path: self.path.clone(),
                source,
            })?;
        info!(
            n_rows = table.n_rows(),
            n_features = table.n_features(),
            "table loaded"
        );
        Ok(table)
    }

    /// Read unlabeled rows; every column is a feature.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read_features(&self) -> Result<FeatureFrame, IoError> {
        let (header, records) = self.read_records(1)?;
        let rows = records
            .iter()
            .enumerate()
            .map(|(row_index, record)| self.parse_features(&header, record, row_index))
            .collect::<Result<Vec<_>, _>>()?;
        info!(n_rows = rows.len(), n_features = header.len(), "feature rows loaded");
        Ok(FeatureFrame::new(header, rows))
    }

    /// Open the file and collect the header and all records, checking shape.
    fn read_records(&self, min_cols: usize) -> Result<(Vec<String>, Vec<StringRecord>), IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) so ragged rows reach our InconsistentRowLength check
        // instead of failing as a CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header: Vec<String> = rdr
            .headers()
            .map_err(|e| self.csv_error(e))?
            .iter()
            .map(str::to_string)
            .collect();
        if header.len() < min_cols {
            return Err(IoError::TooFewColumns {
                path: self.path.clone(),
                got: header.len(),
                min: min_cols,
            });
        }
        debug!(expected_cols = header.len(), "read CSV header");

        let mut records = Vec::new();
        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;
            if record.len() != header.len() {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: header.len(),
                    got: record.len(),
                });
            }
            records.push(record);
        }

        if records.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }
        Ok((header, records))
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }

    /// Parse the first `names.len()` cells of `record` as finite floats.
    fn parse_features(
        &self,
        names: &[String],
        record: &StringRecord,
        row_index: usize,
    ) -> Result<Vec<f64>, IoError> {
        names
            .iter()
            .zip(record.iter())
            .map(|(column, raw)| match raw.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(v),
                _ => Err(IoError::NonFiniteValue {
                    path: self.path.clone(),
                    row_index,
                    column: column.clone(),
                    raw: raw.to_string(),
                }),
            })
            .collect()
    }

    fn parse_label(&self, raw: &str, row_index: usize) -> Result<usize, IoError> {
        let label = match raw.parse::<usize>() {
            Ok(label) => Some(label),
            Err(_) => raw
                .parse::<f64>()
                .ok()
                .filter(|v| (0.0..=MAX_LABEL as f64).contains(v) && v.fract() == 0.0)
                .map(|v| v as usize),
        };
        label
            .filter(|&label| label <= MAX_LABEL)
            .ok_or_else(|| IoError::InvalidLabel {
                path: self.path.clone(),
                row_index,
                raw: raw.to_string(),
            })
    }
}
