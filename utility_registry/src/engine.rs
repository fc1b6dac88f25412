/// Utility Registry — Engine
///
/// Top-level orchestrator. Wraps each call into a sequenced event,
/// delegates mutation to transitions and validates via invariants.
///
/// Strict sequence enforcement, deploy-first validation.

use tracing::{debug, info, warn};

use crate::domain::{
    AccountId, BundleState, Outcome, RegistryState, TokenId, Unit, UtilityDefinition, UtilityId,
};
use crate::error::{RegistryError, Result};
use crate::events::{EventEnvelope, RegistryEvent, SCHEMA_VERSION};
use crate::invariants::{validate_invariants, validate_outcome};
use crate::transitions::{apply_event as transition_apply, apply_genesis};

/// Stateful registry wrapping the pure functional transition layer.
#[derive(Debug, Clone)]
pub struct Registry {
    state: RegistryState,
    last_sequence: u64,
}

impl Registry {
    /// Deploy a registry. `admin` is the deploying account and is fixed
    /// for the registry's lifetime.
    pub fn deploy(
        admin: AccountId,
        name: &str,
        symbol: &str,
        initial_utilities: Vec<UtilityDefinition>,
    ) -> Result<Self> {
        let event = EventEnvelope::new(
            1,
            admin,
            RegistryEvent::Deploy {
                name: name.to_string(),
                symbol: symbol.to_string(),
                utilities: initial_utilities,
            },
        );
        Self::genesis(&event)
    }

    /// Event-sourced reconstruction: the first event must be `deploy`,
    /// the rest are applied in order.
    pub fn replay(events: &[EventEnvelope]) -> Result<Self> {
        let (first, rest) = events.split_first().ok_or(RegistryError::EmptyEventLog)?;
        let mut registry = Self::genesis(first)?;
        for event in rest {
            registry.apply_event(event)?;
        }
        Ok(registry)
    }

    fn genesis(event: &EventEnvelope) -> Result<Self> {
        check_envelope(event, 1)?;
        let (state, outcome) = apply_genesis(event)?;
        validate_invariants(&state)?;
        info!(
            admin = %state.admin,
            name = %state.name,
            symbol = %state.symbol,
            ?outcome,
            "registry deployed"
        );
        Ok(Self {
            state,
            last_sequence: event.sequence,
        })
    }

    /// Apply a single event:
    ///   1. Validate schema version (must be 1)
    ///   2. Validate sequence (strictly increasing, no gaps)
    ///   3. Delegate to transitions::apply_event, in place
    ///   4. Re-check the invariants the outcome touched
    ///   5. Commit the sequence and return the outcome
    ///
    /// A rejected event leaves the registry exactly as it was. An invariant
    /// failure in step 4 means a transition is broken; it is reported but
    /// not rolled back.
    pub fn apply_event(&mut self, event: &EventEnvelope) -> Result<Outcome> {
        debug!(
            sequence = event.sequence,
            caller = %event.caller,
            event_type = event.event.event_type(),
            "applying event"
        );

        let result = check_envelope(event, self.last_sequence + 1)
            .and_then(|()| transition_apply(&mut self.state, event))
            .and_then(|outcome| {
                validate_outcome(&self.state, &outcome)?;
                Ok(outcome)
            });

        match result {
            Ok(outcome) => {
                self.last_sequence = event.sequence;
                info!(sequence = event.sequence, caller = %event.caller, ?outcome, "event applied");
                Ok(outcome)
            }
            Err(error) => {
                warn!(
                    sequence = event.sequence,
                    caller = %event.caller,
                    event_type = event.event.event_type(),
                    %error,
                    "event rejected"
                );
                Err(error)
            }
        }
    }

    fn submit(&mut self, caller: &AccountId, event: RegistryEvent) -> Result<Outcome> {
        let envelope = EventEnvelope::new(self.last_sequence + 1, caller.clone(), event);
        self.apply_event(&envelope)
    }

    fn submit_mint(&mut self, caller: &AccountId, event: RegistryEvent) -> Result<TokenId> {
        let outcome = self.submit(caller, event)?;
        outcome.minted_token().ok_or_else(|| {
            crate::invariants::InvariantViolation {
                invariant: "mint_outcome",
                detail: format!("{:?} created no unit", outcome),
            }
            .into()
        })
    }

    // ── Catalog management ──────────────────────────────────────────

    /// Append a catalog entry. Admin only; ids are never reused.
    pub fn add_utility(&mut self, caller: &AccountId, definition: UtilityDefinition) -> Result<()> {
        self.submit(caller, RegistryEvent::AddUtility { definition })
            .map(|_| ())
    }

    /// All catalog ids, seed first, in the order they were added.
    pub fn list_utility_ids(&self) -> Vec<UtilityId> {
        self.state.utility_ids()
    }

    pub fn utility(&self, id: UtilityId) -> Option<&UtilityDefinition> {
        self.state.utility(id)
    }

    // ── Minting ─────────────────────────────────────────────────────

    /// Mint a unit for `caller` bound to exactly `utility_ids`.
    /// Fails without side effects if any id is unknown.
    pub fn mint_selected(&mut self, caller: &AccountId, utility_ids: &[UtilityId]) -> Result<TokenId> {
        self.submit_mint(
            caller,
            RegistryEvent::MintSelected {
                utility_ids: utility_ids.to_vec(),
            },
        )
    }

    /// Mint a unit for `caller` bound to the whole catalog as it is now.
    pub fn mint_all(&mut self, caller: &AccountId) -> Result<TokenId> {
        self.submit_mint(caller, RegistryEvent::MintAll)
    }

    // ── Transfer ────────────────────────────────────────────────────

    /// Move the bundle of `token_id` onto a fresh unit for `to`.
    /// Returns the new token id; the source unit is left spent.
    pub fn transfer_utilities(
        &mut self,
        caller: &AccountId,
        token_id: TokenId,
        to: &AccountId,
    ) -> Result<TokenId> {
        self.submit_mint(
            caller,
            RegistryEvent::TransferUtilities {
                token_id,
                to: to.clone(),
            },
        )
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Bundle of a unit in stored order. Any caller may ask.
    pub fn get_utilities_of(&self, token_id: TokenId) -> Result<&[UtilityId]> {
        self.unit(token_id).map(|u| u.bundle.as_slice())
    }

    pub fn owner_of(&self, token_id: TokenId) -> Result<&AccountId> {
        self.unit(token_id).map(|u| &u.owner)
    }

    pub fn bundle_state(&self, token_id: TokenId) -> Result<BundleState> {
        self.unit(token_id).map(Unit::bundle_state)
    }

    /// Number of units held by `account`, spent ones included.
    pub fn balance_of(&self, account: &AccountId) -> usize {
        self.state
            .units
            .values()
            .filter(|u| u.owner == *account)
            .count()
    }

    /// Token ids held by `account`, ascending.
    pub fn tokens_of(&self, account: &AccountId) -> Vec<TokenId> {
        self.state
            .units
            .values()
            .filter(|u| u.owner == *account)
            .map(|u| u.token_id)
            .collect()
    }

    pub fn total_minted(&self) -> usize {
        self.state.units.len()
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn symbol(&self) -> &str {
        &self.state.symbol
    }

    pub fn admin(&self) -> &AccountId {
        &self.state.admin
    }

    pub fn state(&self) -> &RegistryState {
        &self.state
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Events applied so far, deploy first. Feeding them to
    /// [`Registry::replay`] rebuilds this registry.
    pub fn history(&self) -> &[EventEnvelope] {
        &self.state.event_history
    }

    fn unit(&self, token_id: TokenId) -> Result<&Unit> {
        self.state
            .unit(token_id)
            .ok_or(RegistryError::UnknownToken { token_id })
    }
}

fn check_envelope(event: &EventEnvelope, expected_sequence: u64) -> Result<()> {
    if event.schema_version != SCHEMA_VERSION {
        return Err(RegistryError::SchemaVersionMismatch {
            expected: SCHEMA_VERSION,
            got: event.schema_version,
        });
    }
    if event.sequence != expected_sequence {
        return Err(RegistryError::SequenceViolation {
            expected: expected_sequence,
            got: event.sequence,
        });
    }
    Ok(())
}
