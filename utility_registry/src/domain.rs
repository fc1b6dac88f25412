/// Utility Registry — Core Domain Types
///
/// Pure data. No transition logic lives here.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::events::EventEnvelope;

// ── Identifiers ────────────────────────────────────────────────────

/// Opaque, host-authenticated caller identity.
///
/// The registry never interprets the content beyond equality and the
/// distinguished null value (see [`AccountId::is_null`]).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The null account. Transfers to it are rejected.
    pub fn null() -> Self {
        Self(String::new())
    }

    /// Null is the empty identifier or the zero address:
    /// only `0` digits, optionally prefixed with `0x`.
    pub fn is_null(&self) -> bool {
        let digits = self.0.strip_prefix("0x").unwrap_or(&self.0);
        digits.bytes().all(|b| b == b'0')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("<null>")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Catalog entry identifier. Zero is rejected at insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UtilityId(pub u64);

impl fmt::Display for UtilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unit identifier. Allocated sequentially from 1, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(pub u64);

impl TokenId {
    pub const FIRST: TokenId = TokenId(1);

    /// The id after this one, or `None` once the counter is exhausted.
    pub fn checked_next(self) -> Option<TokenId> {
        self.0.checked_add(1).map(TokenId)
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Core Domain Types ──────────────────────────────────────────────

/// A catalog entry: one named entitlement that can be bound to units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UtilityDefinition {
    pub id: UtilityId,
    pub label: String,
    /// Informational only; carries no authority.
    pub issuer: AccountId,
    /// Recorded per entry but not enforced by transfers. A transfer policy
    /// that honours it would hook into `transitions::apply_transfer_utilities`.
    pub transferable: bool,
}

impl UtilityDefinition {
    pub fn new(id: u64, label: &str, issuer: &str, transferable: bool) -> Self {
        Self {
            id: UtilityId(id),
            label: label.to_string(),
            issuer: AccountId::new(issuer),
            transferable,
        }
    }
}

/// A non-fungible unit and the entitlements bound to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Unit {
    pub token_id: TokenId,
    pub owner: AccountId,
    pub bundle: Vec<UtilityId>, // insertion order, duplicates kept
}

/// Observable lifecycle of a unit's bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleState {
    /// Carries at least one entitlement and can be transferred.
    Populated,
    /// Empty. Terminal: nothing ever repopulates a unit.
    Spent,
}

impl Unit {
    pub fn bundle_state(&self) -> BundleState {
        if self.bundle.is_empty() {
            BundleState::Spent
        } else {
            BundleState::Populated
        }
    }
}

/// Structured outcome of a successful transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Deployed { catalog_len: usize },
    UtilityAdded { id: UtilityId },
    Minted { token_id: TokenId },
    Transferred { source: TokenId, token_id: TokenId },
}

impl Outcome {
    /// The unit created by this transition, if any.
    pub fn minted_token(&self) -> Option<TokenId> {
        match self {
            Outcome::Minted { token_id } | Outcome::Transferred { token_id, .. } => {
                Some(*token_id)
            }
            Outcome::Deployed { .. } | Outcome::UtilityAdded { .. } => None,
        }
    }
}

/// Complete registry state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryState {
    pub name: String,
    pub symbol: String,
    pub admin: AccountId,
    pub catalog: Vec<UtilityDefinition>,   // append-only, insertion order
    pub units: BTreeMap<TokenId, Unit>,
    pub next_token_id: TokenId,
    pub event_history: Vec<EventEnvelope>,
}

impl RegistryState {
    pub fn utility_ids(&self) -> Vec<UtilityId> {
        self.catalog.iter().map(|u| u.id).collect()
    }

    pub fn utility(&self, id: UtilityId) -> Option<&UtilityDefinition> {
        self.catalog.iter().find(|u| u.id == id)
    }

    pub fn contains_utility(&self, id: UtilityId) -> bool {
        self.utility(id).is_some()
    }

    pub fn unit(&self, token_id: TokenId) -> Option<&Unit> {
        self.units.get(&token_id)
    }
}
