/// Utility Registry — Event Definitions
///
/// Events are pure data. They carry the caller and intent only,
/// and contain ZERO transition logic.
///
/// Schema version is locked at 1. Events with schema_version != 1
/// are rejected by the engine.

use serde::{Deserialize, Serialize};

use crate::domain::{AccountId, TokenId, UtilityDefinition, UtilityId};

/// Schema version for v1 kernel events. Hardcoded, never changes.
pub const SCHEMA_VERSION: u32 = 1;

/// A state-changing registry call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistryEvent {
    Deploy {
        name: String,
        symbol: String,
        utilities: Vec<UtilityDefinition>,
    },
    AddUtility {
        definition: UtilityDefinition,
    },
    MintSelected {
        utility_ids: Vec<UtilityId>,
    },
    MintAll,
    TransferUtilities {
        token_id: TokenId,
        to: AccountId,
    },
}

impl RegistryEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            RegistryEvent::Deploy { .. } => "deploy",
            RegistryEvent::AddUtility { .. } => "add_utility",
            RegistryEvent::MintSelected { .. } => "mint_selected",
            RegistryEvent::MintAll => "mint_all",
            RegistryEvent::TransferUtilities { .. } => "transfer_utilities",
        }
    }
}

/// Event envelope: who called, in which order, with what.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventEnvelope {
    pub sequence: u64,
    pub caller: AccountId,
    pub schema_version: u32,
    pub event: RegistryEvent,
}

impl EventEnvelope {
    pub fn new(sequence: u64, caller: AccountId, event: RegistryEvent) -> Self {
        Self {
            sequence,
            caller,
            schema_version: SCHEMA_VERSION,
            event,
        }
    }
}
