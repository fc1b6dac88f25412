//! Behavioural tests for the registry operation set.

use utility_registry::engine::Registry;
use utility_registry::events::{EventEnvelope, RegistryEvent};
use utility_registry::{AccountId, BundleState, RegistryError, TokenId, UtilityDefinition, UtilityId};

const ISSUER_A: &str = "0x1234567890abcdef1234567890abcdef12345678";
const ISSUER_B: &str = "0xf11d8A2BF17D04C50CfB6ba505e1e88c4BD4b673";
const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

fn account(name: &str) -> AccountId {
    AccountId::new(name)
}

fn ids(raw: &[u64]) -> Vec<UtilityId> {
    raw.iter().copied().map(UtilityId).collect()
}

fn seed() -> Vec<UtilityDefinition> {
    vec![
        UtilityDefinition::new(1, "Utility A", ISSUER_A, true),
        UtilityDefinition::new(2, "Utility B", ISSUER_B, false),
    ]
}

fn deploy() -> Registry {
    Registry::deploy(account("admin"), "Multiutility", "MTU", seed()).expect("deploy")
}

// ─────────────────────────────────────────────────────────────
// Deployment
// ─────────────────────────────────────────────────────────────

#[test]
fn deploy_records_metadata_and_seed() {
    let registry = deploy();
    assert_eq!(registry.name(), "Multiutility");
    assert_eq!(registry.symbol(), "MTU");
    assert_eq!(registry.admin(), &account("admin"));
    assert_eq!(registry.list_utility_ids(), ids(&[1, 2]));
    assert_eq!(registry.total_minted(), 0);
    assert_eq!(registry.utility(UtilityId(2)).unwrap().label, "Utility B");
    assert!(!registry.utility(UtilityId(2)).unwrap().transferable);
}

#[test]
fn deploy_with_empty_seed_is_allowed() {
    let mut registry = Registry::deploy(account("admin"), "Empty", "E", vec![]).unwrap();
    assert!(registry.list_utility_ids().is_empty());

    let token = registry.mint_all(&account("alice")).unwrap();
    assert_eq!(token, TokenId(1));
    assert!(registry.get_utilities_of(token).unwrap().is_empty());
    assert_eq!(registry.bundle_state(token).unwrap(), BundleState::Spent);
}

#[test]
fn deploy_rejects_duplicate_and_zero_seed_ids() {
    let mut utilities = seed();
    utilities.push(UtilityDefinition::new(2, "Dup", ISSUER_A, true));
    assert_eq!(
        Registry::deploy(account("admin"), "M", "M", utilities).unwrap_err(),
        RegistryError::DuplicateUtilityId { id: UtilityId(2) }
    );

    let zero = vec![UtilityDefinition::new(0, "Zero", ISSUER_A, true)];
    assert_eq!(
        Registry::deploy(account("admin"), "M", "M", zero).unwrap_err(),
        RegistryError::ZeroUtilityId
    );
}

// ─────────────────────────────────────────────────────────────
// Catalog management
// ─────────────────────────────────────────────────────────────

#[test]
fn admin_adds_utility_and_duplicates_are_rejected() {
    let mut registry = deploy();
    let admin = account("admin");

    registry
        .add_utility(&admin, UtilityDefinition::new(3, "Utility C", ISSUER_A, false))
        .unwrap();
    assert_eq!(registry.list_utility_ids(), ids(&[1, 2, 3]));

    let err = registry
        .add_utility(&admin, UtilityDefinition::new(3, "Utility C again", ISSUER_A, true))
        .unwrap_err();
    assert_eq!(err, RegistryError::DuplicateUtilityId { id: UtilityId(3) });
    assert_eq!(registry.list_utility_ids(), ids(&[1, 2, 3]));
}

#[test]
fn non_admin_cannot_add_utility() {
    let mut registry = deploy();
    let err = registry
        .add_utility(&account("user1"), UtilityDefinition::new(3, "Utility C", ISSUER_A, false))
        .unwrap_err();
    assert_eq!(err, RegistryError::NotAdmin);

    // Admin check comes before the duplicate check.
    let err = registry
        .add_utility(&account("user1"), UtilityDefinition::new(1, "Utility A", ISSUER_A, false))
        .unwrap_err();
    assert_eq!(err, RegistryError::NotAdmin);
    assert_eq!(registry.list_utility_ids(), ids(&[1, 2]));
}

#[test]
fn list_preserves_seed_then_addition_order() {
    let mut registry = deploy();
    let admin = account("admin");
    for id in [9, 4, 7] {
        registry
            .add_utility(&admin, UtilityDefinition::new(id, "X", ISSUER_A, false))
            .unwrap();
    }
    assert_eq!(registry.list_utility_ids(), ids(&[1, 2, 9, 4, 7]));
}

// ─────────────────────────────────────────────────────────────
// Minting
// ─────────────────────────────────────────────────────────────

#[test]
fn mint_selected_binds_requested_utilities() {
    let mut registry = deploy();
    let user = account("user1");
    let token = registry.mint_selected(&user, &ids(&[1, 2])).unwrap();
    assert_eq!(token, TokenId(1));
    assert_eq!(registry.get_utilities_of(token).unwrap(), ids(&[1, 2]).as_slice());
    assert_eq!(registry.owner_of(token).unwrap(), &user);
    assert_eq!(registry.bundle_state(token).unwrap(), BundleState::Populated);
}

#[test]
fn failed_mint_does_not_consume_token_id() {
    let mut registry = deploy();
    let user = account("user1");

    let err = registry.mint_selected(&user, &ids(&[1, 3])).unwrap_err();
    assert_eq!(err, RegistryError::InvalidUtilityIds { missing: ids(&[3]) });
    assert_eq!(registry.total_minted(), 0);
    assert_eq!(err.to_string(), "invalid IDs passed: 3");

    assert_eq!(registry.mint_selected(&user, &ids(&[2])).unwrap(), TokenId(1));
}

#[test]
fn mint_all_snapshots_current_catalog() {
    let mut registry = deploy();
    let user = account("user1");

    let first = registry.mint_all(&user).unwrap();
    assert_eq!(registry.get_utilities_of(first).unwrap(), ids(&[1, 2]).as_slice());

    registry
        .add_utility(&account("admin"), UtilityDefinition::new(3, "Utility C", ISSUER_A, false))
        .unwrap();
    let second = registry.mint_all(&user).unwrap();

    assert_eq!(registry.get_utilities_of(first).unwrap(), ids(&[1, 2]).as_slice());
    assert_eq!(registry.get_utilities_of(second).unwrap(), ids(&[1, 2, 3]).as_slice());
    assert_eq!(registry.balance_of(&user), 2);
}

#[test]
fn unknown_token_query_fails() {
    let registry = deploy();
    assert_eq!(
        registry.get_utilities_of(TokenId(1)).unwrap_err(),
        RegistryError::UnknownToken { token_id: TokenId(1) }
    );
    assert!(registry.owner_of(TokenId(0)).is_err());
}

// ─────────────────────────────────────────────────────────────
// Transfer
// ─────────────────────────────────────────────────────────────

#[test]
fn transfer_moves_bundle_to_new_unit() {
    let mut registry = deploy();
    let (u, v) = (account("U"), account("V"));

    let source = registry.mint_selected(&u, &ids(&[1, 2])).unwrap();
    assert_eq!(source, TokenId(1));

    let received = registry.transfer_utilities(&u, source, &v).unwrap();
    assert_eq!(received, TokenId(2));
    assert_eq!(registry.owner_of(received).unwrap(), &v);
    assert_eq!(registry.get_utilities_of(received).unwrap(), ids(&[1, 2]).as_slice());

    assert!(registry.get_utilities_of(source).unwrap().is_empty());
    assert_eq!(registry.owner_of(source).unwrap(), &u);
    assert_eq!(registry.bundle_state(source).unwrap(), BundleState::Spent);

    assert_eq!(
        registry.transfer_utilities(&u, source, &v).unwrap_err(),
        RegistryError::NothingToTransfer { token_id: source }
    );
    // A spent unit sent to the null account fails on the receiver first.
    assert_eq!(
        registry
            .transfer_utilities(&u, source, &account(ZERO_ADDRESS))
            .unwrap_err(),
        RegistryError::ZeroReceiver
    );
    assert_eq!(registry.last_sequence(), 3);
}

#[test]
fn receiver_can_pass_bundle_on() {
    let mut registry = deploy();
    let (a, b, c) = (account("a"), account("b"), account("c"));

    let t1 = registry.mint_all(&a).unwrap();
    let t2 = registry.transfer_utilities(&a, t1, &b).unwrap();
    let t3 = registry.transfer_utilities(&b, t2, &c).unwrap();

    assert_eq!(t3, TokenId(3));
    assert_eq!(registry.get_utilities_of(t3).unwrap(), ids(&[1, 2]).as_slice());
    assert_eq!(registry.tokens_of(&b), vec![t2]);
    assert_eq!(registry.bundle_state(t2).unwrap(), BundleState::Spent);
}

#[test]
fn non_owner_cannot_transfer() {
    let mut registry = deploy();
    let (user1, user2, user3) = (account("user1"), account("user2"), account("user3"));
    let token = registry.mint_selected(&user1, &ids(&[1, 2])).unwrap();
    let before = registry.state().clone();

    let err = registry.transfer_utilities(&user3, token, &user2).unwrap_err();
    assert_eq!(err, RegistryError::NotTokenOwner { token_id: token });
    assert_eq!(registry.state(), &before);
}

#[test]
fn transfer_to_zero_account_is_rejected() {
    let mut registry = deploy();
    let user = account("user1");
    let token = registry.mint_selected(&user, &ids(&[1, 2])).unwrap();

    for receiver in [AccountId::null(), account(ZERO_ADDRESS)] {
        assert_eq!(
            registry.transfer_utilities(&user, token, &receiver).unwrap_err(),
            RegistryError::ZeroReceiver
        );
    }
    assert_eq!(registry.get_utilities_of(token).unwrap(), ids(&[1, 2]).as_slice());
}

#[test]
fn transfer_of_unknown_token_fails() {
    let mut registry = deploy();
    assert_eq!(
        registry
            .transfer_utilities(&account("user1"), TokenId(7), &account("user2"))
            .unwrap_err(),
        RegistryError::UnknownToken { token_id: TokenId(7) }
    );
}

// ─────────────────────────────────────────────────────────────
// Event sequencing
// ─────────────────────────────────────────────────────────────

#[test]
fn rejected_calls_do_not_consume_sequence() {
    let mut registry = deploy();
    assert_eq!(registry.last_sequence(), 1);

    let _ = registry.mint_selected(&account("u"), &ids(&[42]));
    let _ = registry.add_utility(&account("u"), UtilityDefinition::new(5, "E", ISSUER_A, true));
    assert_eq!(registry.last_sequence(), 1);
    assert_eq!(registry.history().len(), 1);

    registry.mint_all(&account("u")).unwrap();
    assert_eq!(registry.last_sequence(), 2);
}

#[test]
fn out_of_order_event_is_rejected() {
    let mut registry = deploy();
    let evt = EventEnvelope::new(5, account("u"), RegistryEvent::MintAll);
    assert_eq!(
        registry.apply_event(&evt).unwrap_err(),
        RegistryError::SequenceViolation { expected: 2, got: 5 }
    );
}

#[test]
fn wrong_schema_version_is_rejected() {
    let mut registry = deploy();
    let mut evt = EventEnvelope::new(2, account("u"), RegistryEvent::MintAll);
    evt.schema_version = 99;
    assert_eq!(
        registry.apply_event(&evt).unwrap_err(),
        RegistryError::SchemaVersionMismatch { expected: 1, got: 99 }
    );
}

#[test]
fn replay_rebuilds_identical_registry() {
    let mut registry = deploy();
    let u = account("u");
    let t = registry.mint_all(&u).unwrap();
    registry.transfer_utilities(&u, t, &account("v")).unwrap();

    let rebuilt = Registry::replay(registry.history()).unwrap();
    assert_eq!(rebuilt.state(), registry.state());
    assert_eq!(rebuilt.last_sequence(), registry.last_sequence());
}

#[test]
fn replay_requires_deploy_first() {
    assert_eq!(Registry::replay(&[]).unwrap_err(), RegistryError::EmptyEventLog);

    let evt = EventEnvelope::new(1, account("u"), RegistryEvent::MintAll);
    assert_eq!(
        Registry::replay(&[evt]).unwrap_err(),
        RegistryError::DeployNotFirst { got: "mint_all" }
    );
}

#[test]
fn long_mint_run_keeps_numbering_and_rejections_atomic() {
    let mut registry = deploy();
    let u = account("U");

    for n in 1..=10_000u64 {
        assert_eq!(registry.mint_all(&u).unwrap(), TokenId(n));
    }
    assert_eq!(registry.total_minted(), 10_000);
    assert_eq!(registry.last_sequence(), 10_001);
    assert_eq!(registry.history().len(), 10_001);

    let before = registry.state().clone();
    assert!(registry.mint_selected(&u, &ids(&[9])).is_err());
    assert!(registry
        .transfer_utilities(&account("mallory"), TokenId(10_000), &u)
        .is_err());
    assert_eq!(registry.state(), &before);
    assert_eq!(registry.last_sequence(), 10_001);

    let moved = registry.transfer_utilities(&u, TokenId(10_000), &account("V")).unwrap();
    assert_eq!(moved, TokenId(10_001));
    assert_eq!(registry.last_sequence(), 10_002);
}
