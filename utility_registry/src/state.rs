/// Utility Registry — State Construction

use std::collections::BTreeMap;

use crate::domain::{AccountId, RegistryState, TokenId};

/// Create a fresh registry state with an empty catalog and no units.
/// The catalog is seeded by the deploy transition, not here.
pub fn create_initial_state(name: &str, symbol: &str, admin: AccountId) -> RegistryState {
    RegistryState {
        name: name.to_string(),
        symbol: symbol.to_string(),
        admin,
        catalog: Vec::new(),
        units: BTreeMap::new(),
        next_token_id: TokenId::FIRST,
        event_history: Vec::new(),
    }
}
