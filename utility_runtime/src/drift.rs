//! Drift detection — determinism verification and state comparison.

use utility_registry::domain::{BundleState, RegistryState, TokenId, UtilityId};
use utility_registry::events::EventEnvelope;

use crate::replay;

/// Failures reported by [`verify_determinism`].
#[derive(Debug, thiserror::Error)]
pub enum DriftError {
    #[error(transparent)]
    Replay(#[from] utility_registry::RegistryError),

    #[error("determinism failure: run 1 = {first}, run 2 = {second}")]
    Nondeterministic { first: String, second: String },
}

/// Replay the same events twice and require identical hashes.
pub fn verify_determinism(events: &[EventEnvelope]) -> Result<String, DriftError> {
    let first = replay::rebuild_hash(events)?;
    let second = replay::rebuild_hash(events)?;
    if first != second {
        return Err(DriftError::Nondeterministic { first, second });
    }
    Ok(first)
}

/// Structured comparison of two registry states, `a` taken before `b`.
pub fn compare_states(state_a: &RegistryState, state_b: &RegistryState) -> DriftReport {
    let added_utilities: Vec<UtilityId> = state_b
        .catalog
        .iter()
        .map(|u| u.id)
        .filter(|id| !state_a.contains_utility(*id))
        .collect();

    let minted_units: Vec<TokenId> = state_b
        .units
        .keys()
        .filter(|t| !state_a.units.contains_key(*t))
        .copied()
        .collect();

    // Units populated in `a` that are spent in `b`.
    let spent_units: Vec<TokenId> = state_a
        .units
        .values()
        .filter(|u| u.bundle_state() == BundleState::Populated)
        .filter(|u| {
            state_b
                .unit(u.token_id)
                .is_some_and(|later| later.bundle_state() == BundleState::Spent)
        })
        .map(|u| u.token_id)
        .collect();

    let populated = |s: &RegistryState| {
        s.units
            .values()
            .filter(|u| u.bundle_state() == BundleState::Populated)
            .count() as i64
    };

    DriftReport {
        catalog_len_a: state_a.catalog.len() as i64,
        catalog_len_b: state_b.catalog.len() as i64,
        catalog_len_delta: state_b.catalog.len() as i64 - state_a.catalog.len() as i64,
        unit_count_a: state_a.units.len() as i64,
        unit_count_b: state_b.units.len() as i64,
        unit_count_delta: state_b.units.len() as i64 - state_a.units.len() as i64,
        populated_a: populated(state_a),
        populated_b: populated(state_b),
        populated_delta: populated(state_b) - populated(state_a),
        added_utilities,
        minted_units,
        spent_units,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftReport {
    pub catalog_len_a: i64,
    pub catalog_len_b: i64,
    pub catalog_len_delta: i64,
    pub unit_count_a: i64,
    pub unit_count_b: i64,
    pub unit_count_delta: i64,
    pub populated_a: i64,
    pub populated_b: i64,
    pub populated_delta: i64,
    pub added_utilities: Vec<UtilityId>,
    pub minted_units: Vec<TokenId>,
    pub spent_units: Vec<TokenId>,
}
