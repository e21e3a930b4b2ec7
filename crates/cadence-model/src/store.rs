//! Trained-state persistence via bincode.

use std::io::Write;
use std::path::Path;

use cadence_window::WidthSet;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

use crate::error::ModelError;
use crate::state::TrainedState;

/// Current binary format version.
const FORMAT_VERSION: u32 = 1;

/// Origin label used for bundles decoded from memory.
const MEMORY_ORIGIN: &str = "<memory>";

/// Borrowing envelope used when encoding.
#[derive(Serialize)]
struct EnvelopeRef<'a, C, S> {
    format_version: u32,
    classifier: Option<&'a C>,
    scaler: Option<&'a S>,
    widths: Option<&'a [usize]>,
}

/// Owning envelope used when decoding.
///
/// Every field is optional on the wire so that a missing part is reported by
/// name instead of as an opaque decode failure.
#[derive(serde::Deserialize)]
struct Envelope<C, S> {
    // Checked by the leading `u32` decode in `decode`.
    #[allow(dead_code)]
    format_version: u32,
    classifier: Option<C>,
    scaler: Option<S>,
    widths: Option<Vec<usize>>,
}

impl<C, S> TrainedState<C, S>
where
    C: Serialize + DeserializeOwned,
    S: Serialize + DeserializeOwned,
{
    /// Encode the state as one versioned bundle.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::SerializeState`] if bincode encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ModelError> {
        let envelope = EnvelopeRef {
            format_version: FORMAT_VERSION,
            classifier: Some(self.classifier()),
            scaler: Some(self.scaler()),
            widths: Some(self.widths().as_slice()),
        };
        bincode::serialize(&envelope).map_err(|source| ModelError::SerializeState { source })
    }

    /// Decode a bundle produced by [`TrainedState::to_bytes`].
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ModelError::IncompatibleStateVersion`] | format version mismatch |
    /// | [`ModelError::CorruptState`] | undecodable bundle, missing field, or invalid widths |
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ModelError> {
        decode(bytes, MEMORY_ORIGIN)
    }

    /// Save the state to `path`.
    ///
    /// The bundle is written to a temporary file in the destination
    /// directory and renamed over `path`, so readers see either the previous
    /// bundle or the complete new one.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ModelError::SerializeState`] | bincode encoding failed |
    /// | [`ModelError::WriteState`] | temp file creation, write, or rename failed |
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;

        let write_err = |source: std::io::Error| ModelError::WriteState {
            path: path.to_path_buf(),
            source,
        };
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(&bytes).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;

        info!(
            size_bytes = bytes.len(),
            widths = %self.widths(),
            "trained state saved"
        );
        Ok(())
    }

    /// Load a state saved with [`TrainedState::save`].
    ///
    /// The whole file is read before decoding.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ModelError::ReadState`] | file read failed |
    /// | [`ModelError::IncompatibleStateVersion`] | format version mismatch |
    /// | [`ModelError::CorruptState`] | undecodable bundle, missing field, or invalid widths |
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ModelError::ReadState {
            path: path.to_path_buf(),
            source,
        })?;
        let state = decode(&bytes, &path.display().to_string())?;
        debug!(size_bytes = bytes.len(), widths = %state.widths(), "trained state loaded");
        Ok(state)
    }
}

fn decode<C, S>(bytes: &[u8], origin: &str) -> Result<TrainedState<C, S>, ModelError>
where
    C: DeserializeOwned,
    S: DeserializeOwned,
{
    let corrupt = |field: &'static str, reason: String| ModelError::CorruptState {
        origin: origin.to_string(),
        field,
        reason,
    };

    // The version leads the envelope; check it before decoding the rest so a
    // layout change reports as a version mismatch.
    let found: u32 =
        bincode::deserialize(bytes).map_err(|e| corrupt("format_version", e.to_string()))?;
    if found != FORMAT_VERSION {
        return Err(ModelError::IncompatibleStateVersion {
            origin: origin.to_string(),
            expected: FORMAT_VERSION,
            found,
        });
    }

    let envelope: Envelope<C, S> =
        bincode::deserialize(bytes).map_err(|e| corrupt("bundle", e.to_string()))?;
    let classifier = envelope
        .classifier
        .ok_or_else(|| corrupt("classifier", "missing".into()))?;
    let scaler = envelope
        .scaler
        .ok_or_else(|| corrupt("scaler", "missing".into()))?;
    let widths = envelope
        .widths
        .ok_or_else(|| corrupt("widths", "missing".into()))?;
    let widths = WidthSet::new(widths).map_err(|e| corrupt("widths", e.to_string()))?;

    Ok(TrainedState::new(classifier, scaler, widths))
}
