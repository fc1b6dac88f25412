//! Replay orchestrator — rebuild a registry from its event log.
//!
//! Delegates all domain logic to the kernel.
//! No shortcuts, no cached state logic.

use utility_registry::domain::RegistryState;
use utility_registry::engine::Registry;
use utility_registry::error::Result;
use utility_registry::events::EventEnvelope;
use utility_registry::hashing::canonical_hash;

/// Rebuild the registry state from a sequence of events.
///
/// 1. Deploy from the first event
/// 2. Pass each remaining event sequentially to the kernel
/// 3. Return (final_state, canonical_hash)
pub fn rebuild_state(events: &[EventEnvelope]) -> Result<(RegistryState, String)> {
    let registry = Registry::replay(events)?;
    let hash = canonical_hash(registry.state());
    Ok((registry.state().clone(), hash))
}

/// Rebuild state and return only the canonical hash.
pub fn rebuild_hash(events: &[EventEnvelope]) -> Result<String> {
    rebuild_state(events).map(|(_, hash)| hash)
}
