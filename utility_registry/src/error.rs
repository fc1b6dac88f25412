/// Utility Registry — Error Taxonomy
///
/// Every failure aborts the triggering call before anything is committed.

use thiserror::Error;

use crate::domain::{TokenId, UtilityId};
use crate::invariants::InvariantViolation;

pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("caller is not the owner of the contract")]
    NotAdmin,

    #[error("utility with same ID already exists: {id}")]
    DuplicateUtilityId { id: UtilityId },

    #[error("utility ID must be positive")]
    ZeroUtilityId,

    #[error("invalid IDs passed: {}", join_ids(.missing))]
    InvalidUtilityIds { missing: Vec<UtilityId> },

    #[error("token {token_id} does not exist")]
    UnknownToken { token_id: TokenId },

    #[error("caller is not the owner of the token {token_id}")]
    NotTokenOwner { token_id: TokenId },

    #[error("receiver address cannot be zero address")]
    ZeroReceiver,

    #[error("caller doesn't have any utilities to transfer in token {token_id}")]
    NothingToTransfer { token_id: TokenId },

    #[error("token id counter exhausted")]
    TokenIdOverflow,

    #[error("schema version mismatch: expected {expected}, got {got}")]
    SchemaVersionMismatch { expected: u32, got: u32 },

    #[error("sequence violation: expected {expected}, got {got}")]
    SequenceViolation { expected: u64, got: u64 },

    #[error("first event must be deploy, got {got:?}")]
    DeployNotFirst { got: &'static str },

    #[error("registry is already deployed")]
    AlreadyDeployed,

    #[error("event log is empty")]
    EmptyEventLog,

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

fn join_ids(ids: &[UtilityId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
