#![forbid(unsafe_code)]

//! Utility Registry — Kernel
//!
//! A registry of non-fungible units, each bound to an ordered bundle of
//! catalog-defined utilities. All state changes go through sequenced
//! events; see [`engine::Registry`] for the operation set.

/// Kernel v1. Behavioral changes require a new kernel version.
pub const KERNEL_VERSION: u32 = 1;

pub mod domain;
pub mod error;
pub mod events;
pub mod state;
pub mod transitions;
pub mod invariants;
pub mod hashing;
pub mod engine;

pub use domain::{AccountId, BundleState, TokenId, UtilityDefinition, UtilityId};
pub use engine::Registry;
pub use error::RegistryError;
