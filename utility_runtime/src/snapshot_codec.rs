//! Snapshot Codec — deterministic RegistryState encoder/decoder.
//!
//! Pure codec layer over strings. No side-effects, no timestamps.
//!
//! - `encode_snapshot`:  RegistryState → JSON string
//! - `decode_snapshot`:  JSON string → RegistryState (strict, no defaults)
//! - `restore_snapshot`: decode + invariant validation

use thiserror::Error;

use utility_registry::domain::RegistryState;
use utility_registry::error::RegistryError;
use utility_registry::invariants::{validate_invariants, InvariantViolation};

/// All possible snapshot failures.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Malformed JSON, missing fields or unknown fields.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),

    #[error("snapshot hash mismatch: recorded {recorded}, computed {computed}")]
    HashMismatch { recorded: String, computed: String },

    /// The state decodes and hashes cleanly but its own event history
    /// rebuilds something else.
    #[error("snapshot state at sequence {sequence} does not match its replayed history (replayed hash {replayed})")]
    HistoryMismatch { sequence: u64, replayed: String },

    #[error("snapshot kernel version {got} does not match kernel {expected}")]
    KernelVersionMismatch { expected: u32, got: u32 },

    /// The embedded event history does not rebuild the snapshot's state.
    #[error("snapshot history does not replay: {0}")]
    Replay(#[from] RegistryError),
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Encode a RegistryState to a JSON string.
///
/// BTreeMap keeps units sorted by token id, so identical states
/// encode identically.
pub fn encode_snapshot(state: &RegistryState) -> Result<String, SnapshotError> {
    serde_json::to_string(state).map_err(|e| SnapshotError::Serialization(e.to_string()))
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Decode a JSON string into a RegistryState.
///
/// Strict: `deny_unknown_fields` rejects unexpected fields and missing
/// fields fail. No invariant validation — use `restore_snapshot`.
pub fn decode_snapshot(json: &str) -> Result<RegistryState, SnapshotError> {
    serde_json::from_str::<RegistryState>(json)
        .map_err(|e| SnapshotError::Deserialization(e.to_string()))
}

/// Decode and validate invariants. The entry point for untrusted input.
pub fn restore_snapshot(json: &str) -> Result<RegistryState, SnapshotError> {
    let state = decode_snapshot(json)?;
    validate_invariants(&state)?;
    Ok(state)
}
