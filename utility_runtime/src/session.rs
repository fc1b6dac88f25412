//! Session manager — isolated registries with snapshot-after-apply semantics.
//!
//! Each session owns one registry and its in-memory snapshots.
//! Concurrency: `SharedSession` serializes callers behind a Mutex, so
//! every operation runs to completion before the next one starts.
//!
//! Apply-before-snapshot order:
//!   1. registry call       — may be rejected, nothing changes
//!   2. snapshot if interval reached (only if step 1 succeeded)

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info, warn};

use utility_registry::domain::{AccountId, RegistryState, TokenId, UtilityDefinition, UtilityId};
use utility_registry::engine::Registry;
use utility_registry::error::Result as RegistryResult;
use utility_registry::hashing::canonical_hash;

use crate::replay;
use crate::snapshot::{self, Snapshot};
use crate::snapshot_codec::SnapshotError;

/// An isolated registry session with its own snapshots.
#[derive(Debug)]
pub struct Session {
    session_id: String,
    registry: Registry,
    snapshot_interval: u64,
    snapshots: BTreeMap<u64, Snapshot>,
}

impl Session {
    /// Wrap a deployed registry. `snapshot_interval == 0` disables
    /// automatic snapshots.
    pub fn new(session_id: &str, registry: Registry, snapshot_interval: u64) -> Self {
        Self {
            session_id: session_id.to_string(),
            registry,
            snapshot_interval,
            snapshots: BTreeMap::new(),
        }
    }

    /// Resume from a snapshot. The snapshot is verified and its history
    /// replayed before the session accepts calls.
    pub fn resume(
        session_id: &str,
        snap: &Snapshot,
        snapshot_interval: u64,
    ) -> Result<Self, SnapshotError> {
        let registry = snapshot::restore_registry(snap)?;
        info!(session_id, sequence = snap.sequence, "session resumed from snapshot");
        let mut session = Self::new(session_id, registry, snapshot_interval);
        session.snapshots.insert(snap.sequence, snap.clone());
        Ok(session)
    }

    pub fn add_utility(&mut self, caller: &AccountId, definition: UtilityDefinition) -> RegistryResult<()> {
        self.registry.add_utility(caller, definition)?;
        self.after_apply();
        Ok(())
    }

    pub fn mint_selected(&mut self, caller: &AccountId, utility_ids: &[UtilityId]) -> RegistryResult<TokenId> {
        let token_id = self.registry.mint_selected(caller, utility_ids)?;
        self.after_apply();
        Ok(token_id)
    }

    pub fn mint_all(&mut self, caller: &AccountId) -> RegistryResult<TokenId> {
        let token_id = self.registry.mint_all(caller)?;
        self.after_apply();
        Ok(token_id)
    }

    pub fn transfer_utilities(
        &mut self,
        caller: &AccountId,
        token_id: TokenId,
        to: &AccountId,
    ) -> RegistryResult<TokenId> {
        let new_token = self.registry.transfer_utilities(caller, token_id, to)?;
        self.after_apply();
        Ok(new_token)
    }

    fn after_apply(&mut self) {
        let sequence = self.registry.last_sequence();
        if self.snapshot_interval == 0 || sequence % self.snapshot_interval != 0 {
            return;
        }
        match snapshot::take_snapshot(&self.registry) {
            Ok(snap) => {
                debug!(session_id = %self.session_id, sequence, "snapshot taken");
                self.snapshots.insert(sequence, snap);
            }
            // The call itself already committed; a failed snapshot only
            // means resuming will replay from an earlier one.
            Err(error) => warn!(session_id = %self.session_id, sequence, %error, "snapshot failed"),
        }
    }

    /// Take a snapshot now, regardless of the interval.
    pub fn snapshot_now(&mut self) -> Result<&Snapshot, SnapshotError> {
        let snap = snapshot::take_snapshot(&self.registry)?;
        let stored: &Snapshot = self.snapshots.entry(snap.sequence).or_insert(snap);
        Ok(stored)
    }

    pub fn latest_snapshot(&self) -> Option<&Snapshot> {
        self.snapshots.values().next_back()
    }

    pub fn snapshot_at(&self, sequence: u64) -> Option<&Snapshot> {
        self.snapshots.get(&sequence)
    }

    /// Full replay of the session history; returns the replayed hash
    /// and whether it matches the live one.
    pub fn replay_full(&self) -> RegistryResult<(String, bool)> {
        let (_, hash) = replay::rebuild_state(self.registry.history())?;
        let matches = hash == self.current_hash();
        Ok((hash, matches))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn state(&self) -> &RegistryState {
        self.registry.state()
    }

    pub fn current_hash(&self) -> String {
        canonical_hash(self.registry.state())
    }

    pub fn current_sequence(&self) -> u64 {
        self.registry.last_sequence()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// Thread-safe session handle using Mutex.
#[derive(Debug)]
pub struct SharedSession {
    inner: Mutex<Session>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Mutex::new(session),
        }
    }

    /// Lock the session. Every call made through the guard is serialized
    /// against other holders.
    ///
    /// A poisoned lock is recovered: transitions commit atomically, so a
    /// panic in another holder cannot leave the registry half-written.
    pub fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_utility(&self, caller: &AccountId, definition: UtilityDefinition) -> RegistryResult<()> {
        self.lock().add_utility(caller, definition)
    }

    pub fn mint_selected(&self, caller: &AccountId, utility_ids: &[UtilityId]) -> RegistryResult<TokenId> {
        self.lock().mint_selected(caller, utility_ids)
    }

    pub fn mint_all(&self, caller: &AccountId) -> RegistryResult<TokenId> {
        self.lock().mint_all(caller)
    }

    pub fn transfer_utilities(
        &self,
        caller: &AccountId,
        token_id: TokenId,
        to: &AccountId,
    ) -> RegistryResult<TokenId> {
        self.lock().transfer_utilities(caller, token_id, to)
    }

    pub fn get_utilities_of(&self, token_id: TokenId) -> RegistryResult<Vec<UtilityId>> {
        self.lock()
            .registry()
            .get_utilities_of(token_id)
            .map(<[UtilityId]>::to_vec)
    }

    pub fn list_utility_ids(&self) -> Vec<UtilityId> {
        self.lock().registry().list_utility_ids()
    }

    pub fn current_hash(&self) -> String {
        self.lock().current_hash()
    }

    pub fn current_sequence(&self) -> u64 {
        self.lock().current_sequence()
    }
}
