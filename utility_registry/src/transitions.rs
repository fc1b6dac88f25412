/// Utility Registry — Centralized Transition Logic
///
/// ALL state-mutation logic lives here.
/// Every handler runs all of its checks before its first write, so a
/// rejected event leaves the state untouched without copying it.

use std::collections::BTreeSet;

use tracing::debug;

use crate::domain::{
    AccountId, Outcome, RegistryState, TokenId, Unit, UtilityDefinition, UtilityId,
};
use crate::error::{RegistryError, Result};
use crate::events::{EventEnvelope, RegistryEvent};
use crate::state::create_initial_state;

// ---------------------------------------------------------------------------
// Public dispatchers
// ---------------------------------------------------------------------------

/// Build the initial state from a `deploy` event.
/// The caller of the deploy event becomes the admin.
pub fn apply_genesis(event: &EventEnvelope) -> Result<(RegistryState, Outcome)> {
    let RegistryEvent::Deploy {
        name,
        symbol,
        utilities,
    } = &event.event
    else {
        return Err(RegistryError::DeployNotFirst {
            got: event.event.event_type(),
        });
    };

    let mut state = create_initial_state(name, symbol, event.caller.clone());
    for definition in utilities {
        insert_utility(&mut state, definition)?;
    }

    state.event_history.push(event.clone());
    let outcome = Outcome::Deployed {
        catalog_len: state.catalog.len(),
    };
    Ok((state, outcome))
}

/// Apply *event* to *state* in place and return the outcome.
/// On `Err` nothing has been written, history included.
pub fn apply_event(state: &mut RegistryState, event: &EventEnvelope) -> Result<Outcome> {
    let caller = &event.caller;

    let outcome = match &event.event {
        RegistryEvent::Deploy { .. } => return Err(RegistryError::AlreadyDeployed),
        RegistryEvent::AddUtility { definition } => apply_add_utility(state, caller, definition)?,
        RegistryEvent::MintSelected { utility_ids } => {
            apply_mint_selected(state, caller, utility_ids)?
        }
        RegistryEvent::MintAll => apply_mint_all(state, caller)?,
        RegistryEvent::TransferUtilities { token_id, to } => {
            apply_transfer_utilities(state, caller, *token_id, to)?
        }
    };

    state.event_history.push(event.clone());
    Ok(outcome)
}

// ---------------------------------------------------------------------------
// Individual transition handlers (private)
// ---------------------------------------------------------------------------

fn apply_add_utility(
    state: &mut RegistryState,
    caller: &AccountId,
    definition: &UtilityDefinition,
) -> Result<Outcome> {
    if *caller != state.admin {
        return Err(RegistryError::NotAdmin);
    }
    insert_utility(state, definition)?;
    Ok(Outcome::UtilityAdded { id: definition.id })
}

fn apply_mint_selected(
    state: &mut RegistryState,
    caller: &AccountId,
    utility_ids: &[UtilityId],
) -> Result<Outcome> {
    let known: BTreeSet<UtilityId> = state.catalog.iter().map(|u| u.id).collect();
    let mut missing: Vec<UtilityId> = Vec::new();
    for id in utility_ids {
        if !known.contains(id) && !missing.contains(id) {
            missing.push(*id);
        }
    }
    if !missing.is_empty() {
        return Err(RegistryError::InvalidUtilityIds { missing });
    }

    let token_id = mint_unit(state, caller, utility_ids.to_vec())?;
    Ok(Outcome::Minted { token_id })
}

/// The bundle is a copy of the catalog as it stands now; later additions
/// never reach an already-minted unit.
fn apply_mint_all(state: &mut RegistryState, caller: &AccountId) -> Result<Outcome> {
    let bundle = state.utility_ids();
    let token_id = mint_unit(state, caller, bundle)?;
    Ok(Outcome::Minted { token_id })
}

/// The source unit keeps its id and owner; only its bundle is spent.
/// The `transferable` flag on catalog entries is not consulted.
fn apply_transfer_utilities(
    state: &mut RegistryState,
    caller: &AccountId,
    token_id: TokenId,
    to: &AccountId,
) -> Result<Outcome> {
    let source = state
        .units
        .get(&token_id)
        .ok_or(RegistryError::UnknownToken { token_id })?;

    if source.owner != *caller {
        return Err(RegistryError::NotTokenOwner { token_id });
    }
    if to.is_null() {
        return Err(RegistryError::ZeroReceiver);
    }
    if source.bundle.is_empty() {
        return Err(RegistryError::NothingToTransfer { token_id });
    }

    let bundle = source.bundle.clone();
    let new_token = mint_unit(state, to, bundle)?;

    if let Some(source) = state.units.get_mut(&token_id) {
        source.bundle.clear();
    }

    Ok(Outcome::Transferred {
        source: token_id,
        token_id: new_token,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn insert_utility(state: &mut RegistryState, definition: &UtilityDefinition) -> Result<()> {
    if definition.id.0 == 0 {
        return Err(RegistryError::ZeroUtilityId);
    }
    if state.contains_utility(definition.id) {
        return Err(RegistryError::DuplicateUtilityId { id: definition.id });
    }
    debug!(utility_id = %definition.id, label = %definition.label, "catalog entry added");
    state.catalog.push(definition.clone());
    Ok(())
}

/// Allocate the next token id and store a unit under it.
/// The counter only moves once the unit is stored.
fn mint_unit(
    state: &mut RegistryState,
    owner: &AccountId,
    bundle: Vec<UtilityId>,
) -> Result<TokenId> {
    let token_id = state.next_token_id;
    let next = token_id
        .checked_next()
        .ok_or(RegistryError::TokenIdOverflow)?;

    state.units.insert(
        token_id,
        Unit {
            token_id,
            owner: owner.clone(),
            bundle,
        },
    );
    state.next_token_id = next;
    Ok(token_id)
}
