/// Utility Registry — Invariant Checks
///
/// `validate_invariants` is the full pass, run at genesis and by snapshot
/// restore before a decoded state is trusted. `validate_outcome` re-checks
/// only what a single transition touched, so its cost does not grow with
/// the number of units.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::domain::{Outcome, RegistryState, TokenId};

/// A named invariant that a state failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invariant violation: [INVARIANT:{invariant}] {detail}")]
pub struct InvariantViolation {
    pub invariant: &'static str,
    pub detail: String,
}

impl InvariantViolation {
    fn new(invariant: &'static str, detail: String) -> Self {
        Self { invariant, detail }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run all invariant checks. Returns the first failure.
pub fn validate_invariants(state: &RegistryState) -> Result<(), InvariantViolation> {
    check_catalog_ids_positive(state)?;
    check_catalog_ids_unique(state)?;
    check_token_ids_dense(state)?;
    check_bundle_refs(state)?;
    Ok(())
}

/// Check the parts of `state` that `outcome` wrote.
pub fn validate_outcome(state: &RegistryState, outcome: &Outcome) -> Result<(), InvariantViolation> {
    match outcome {
        Outcome::Deployed { .. } => validate_invariants(state),
        Outcome::UtilityAdded { id } => {
            if id.0 == 0 {
                return Err(InvariantViolation::new(
                    "catalog_ids_positive",
                    "added utility has id 0".to_string(),
                ));
            }
            if state.catalog.iter().filter(|u| u.id == *id).count() != 1 {
                return Err(InvariantViolation::new(
                    "catalog_ids_unique",
                    format!("utility id {} appears more than once", id),
                ));
            }
            Ok(())
        }
        Outcome::Minted { token_id } => check_newest_unit(state, *token_id),
        Outcome::Transferred { source, token_id } => {
            check_newest_unit(state, *token_id)?;
            match state.unit(*source) {
                Some(unit) if unit.bundle.is_empty() => Ok(()),
                _ => Err(InvariantViolation::new(
                    "transfer_spends_source",
                    format!("token {} still holds entitlements after transfer", source),
                )),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Individual checks (private)
// ---------------------------------------------------------------------------

fn check_catalog_ids_positive(state: &RegistryState) -> Result<(), InvariantViolation> {
    match state.catalog.iter().position(|u| u.id.0 == 0) {
        Some(pos) => Err(InvariantViolation::new(
            "catalog_ids_positive",
            format!("catalog entry at position {} has id 0", pos),
        )),
        None => Ok(()),
    }
}

fn check_catalog_ids_unique(state: &RegistryState) -> Result<(), InvariantViolation> {
    let mut seen = BTreeSet::new();
    for def in &state.catalog {
        if !seen.insert(def.id) {
            return Err(InvariantViolation::new(
                "catalog_ids_unique",
                format!("utility id {} appears more than once", def.id),
            ));
        }
    }
    Ok(())
}

/// Units are never destroyed, so keys must be exactly 1..next_token_id.
fn check_token_ids_dense(state: &RegistryState) -> Result<(), InvariantViolation> {
    let expected_len = state.next_token_id.0.checked_sub(1).ok_or_else(|| {
        InvariantViolation::new("token_ids_dense", "next_token_id is 0".to_string())
    })?;

    if state.units.len() as u64 != expected_len {
        return Err(InvariantViolation::new(
            "token_ids_dense",
            format!(
                "{} units stored but next_token_id is {}",
                state.units.len(),
                state.next_token_id
            ),
        ));
    }

    for (expected, (key, unit)) in (1u64..).zip(&state.units) {
        if *key != TokenId(expected) || unit.token_id != *key {
            return Err(InvariantViolation::new(
                "token_ids_dense",
                format!(
                    "expected token {} but found key {} holding unit {}",
                    expected, key, unit.token_id
                ),
            ));
        }
    }
    Ok(())
}

/// The freshly minted unit sits at `next_token_id - 1` under its own key
/// and references only catalog entries.
fn check_newest_unit(state: &RegistryState, token_id: TokenId) -> Result<(), InvariantViolation> {
    if token_id.checked_next() != Some(state.next_token_id) {
        return Err(InvariantViolation::new(
            "token_ids_dense",
            format!(
                "minted token {} but next_token_id is {}",
                token_id, state.next_token_id
            ),
        ));
    }
    let unit = state.unit(token_id).filter(|u| u.token_id == token_id).ok_or_else(|| {
        InvariantViolation::new(
            "token_ids_dense",
            format!("token {} is not stored under its own key", token_id),
        )
    })?;
    if let Some(missing) = unit.bundle.iter().find(|id| !state.contains_utility(**id)) {
        return Err(InvariantViolation::new(
            "bundle_refs",
            format!(
                "token {} references utility {} which is not in the catalog",
                token_id, missing
            ),
        ));
    }
    Ok(())
}

fn check_bundle_refs(state: &RegistryState) -> Result<(), InvariantViolation> {
    let known: BTreeSet<_> = state.catalog.iter().map(|u| u.id).collect();
    for unit in state.units.values() {
        if let Some(missing) = unit.bundle.iter().find(|id| !known.contains(id)) {
            return Err(InvariantViolation::new(
                "bundle_refs",
                format!(
                    "token {} references utility {} which is not in the catalog",
                    unit.token_id, missing
                ),
            ));
        }
    }
    Ok(())
}
