#![forbid(unsafe_code)]

//! Utility Registry — Runtime
//!
//! Wraps the kernel with replay, in-memory snapshots, session
//! management, drift detection and deploy manifests.
//!
//! No domain logic lives here — all transitions and invariants
//! are delegated to the kernel.

pub mod manifest;
pub mod replay;
pub mod snapshot;
pub mod snapshot_codec;
pub mod session;
pub mod drift;
