/// Utility Registry — Canonical Hashing
///
/// Deterministic canonical serialization + SHA-256 hashing.
/// Produces byte-identical output across platforms.
///
/// Rules:
///   - Catalog in insertion order (order is observable state)
///   - Units sorted by token id
///   - Bundles in stored order
///   - UTF-8 JSON, no whitespace, no float
///   - Event history excluded

use sha2::{Digest, Sha256};
use serde_json::{Map, Value};

use crate::domain::{AccountId, RegistryState, UtilityId};
use crate::KERNEL_VERSION;

/// Canonical serialization of RegistryState to UTF-8 JSON bytes.
/// Includes kernel_version as the first field for identity binding.
pub fn canonical_serialize(state: &RegistryState) -> Vec<u8> {
    // Display of a Value cannot fail: it only contains strings, ints and bools.
    build_canonical_value(state).to_string().into_bytes()
}

/// SHA-256 of canonical serialization. Lowercase hex string.
pub fn canonical_hash(state: &RegistryState) -> String {
    let digest = Sha256::digest(canonical_serialize(state));
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Field order: kernel_version, name, symbol, admin, catalog, units,
///              next_token_id
fn build_canonical_value(state: &RegistryState) -> Value {
    let catalog: Vec<Value> = state
        .catalog
        .iter()
        .map(|u| {
            let mut m = Map::new();
            m.insert("id".to_string(), Value::Number(u.id.0.into()));
            m.insert("label".to_string(), Value::String(u.label.clone()));
            m.insert("issuer".to_string(), account(&u.issuer));
            m.insert("transferable".to_string(), Value::Bool(u.transferable));
            Value::Object(m)
        })
        .collect();

    // BTreeMap is already sorted by token id
    let units: Vec<Value> = state
        .units
        .values()
        .map(|unit| {
            let mut m = Map::new();
            m.insert("token_id".to_string(), Value::Number(unit.token_id.0.into()));
            m.insert("owner".to_string(), account(&unit.owner));
            m.insert("bundle".to_string(), ids(&unit.bundle));
            Value::Object(m)
        })
        .collect();

    // kernel_version MUST be first — it is part of the kernel identity.
    let mut root = Map::new();
    root.insert(
        "kernel_version".to_string(),
        Value::Number(KERNEL_VERSION.into()),
    );
    root.insert("name".to_string(), Value::String(state.name.clone()));
    root.insert("symbol".to_string(), Value::String(state.symbol.clone()));
    root.insert("admin".to_string(), account(&state.admin));
    root.insert("catalog".to_string(), Value::Array(catalog));
    root.insert("units".to_string(), Value::Array(units));
    root.insert(
        "next_token_id".to_string(),
        Value::Number(state.next_token_id.0.into()),
    );

    Value::Object(root)
}

fn account(id: &AccountId) -> Value {
    Value::String(id.as_str().to_string())
}

fn ids(bundle: &[UtilityId]) -> Value {
    Value::Array(bundle.iter().map(|id| Value::Number(id.0.into())).collect())
}
