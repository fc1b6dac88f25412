//! Snapshot layer — deterministic, self-verifying registry snapshots.
//!
//! Snapshots are plain values. No timestamps in snapshot content.
//! A snapshot carries the encoded state (history included) and the
//! canonical hash of that state; restoring replays the history and
//! checks both agree.

use serde::{Deserialize, Serialize};

use utility_registry::engine::Registry;
use utility_registry::hashing::canonical_hash;
use utility_registry::KERNEL_VERSION;

use crate::snapshot_codec::{encode_snapshot, restore_snapshot, SnapshotError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Sequence of the last event included.
    pub sequence: u64,
    /// `snapshot_codec` encoding of the state.
    pub state_json: String,
    /// Canonical hash of the state.
    pub hash: String,
    /// Kernel version at snapshot time.
    pub kernel_version: u32,
}

/// Capture the registry as it stands.
pub fn take_snapshot(registry: &Registry) -> Result<Snapshot, SnapshotError> {
    Ok(Snapshot {
        sequence: registry.last_sequence(),
        state_json: encode_snapshot(registry.state())?,
        hash: canonical_hash(registry.state()),
        kernel_version: KERNEL_VERSION,
    })
}

/// Check the recorded hash against the encoded state.
pub fn verify_snapshot_hash(snap: &Snapshot) -> Result<(), SnapshotError> {
    let state = restore_snapshot(&snap.state_json)?;
    let computed = canonical_hash(&state);
    if computed != snap.hash {
        return Err(SnapshotError::HashMismatch {
            recorded: snap.hash.clone(),
            computed,
        });
    }
    Ok(())
}

/// Rebuild a live registry from a snapshot.
///
/// The embedded history is replayed through the kernel, so a snapshot
/// whose units or catalog were edited by hand is rejected even if its
/// hash was recomputed to match.
pub fn restore_registry(snap: &Snapshot) -> Result<Registry, SnapshotError> {
    if snap.kernel_version != KERNEL_VERSION {
        return Err(SnapshotError::KernelVersionMismatch {
            expected: KERNEL_VERSION,
            got: snap.kernel_version,
        });
    }
    verify_snapshot_hash(snap)?;

    let state = restore_snapshot(&snap.state_json)?;
    let registry = Registry::replay(&state.event_history)?;
    if registry.state() != &state {
        return Err(SnapshotError::HistoryMismatch {
            sequence: snap.sequence,
            replayed: canonical_hash(registry.state()),
        });
    }
    Ok(registry)
}
