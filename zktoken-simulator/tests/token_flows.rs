//! End-to-end token flows through the simulator.

use zktoken_common::{compute_address, SecretKey, Uint222};
use zktoken_ledger::{LedgerError, OperationKind};
use zktoken_simulator::{
    run_scenario, KeyStore, PrivateState, ScenarioConfig, TokenConfig, TokenSimulator,
};

fn key(byte: u8) -> SecretKey {
    SecretKey::from_bytes([byte; 32])
}

fn amount(v: u64) -> Uint222 {
    Uint222::from(v)
}

fn token(supply: u64) -> TokenConfig {
    TokenConfig {
        name: "Test Token".into(),
        symbol: "TST".into(),
        decimals: 6,
        initial_supply: amount(supply),
    }
}

fn users() -> KeyStore {
    KeyStore::from_users([("alice", key(0xa1)), ("bob", key(0xb0)), ("carol", key(0xc0))])
        .unwrap()
}

#[test]
fn deploy_and_transfer() {
    let mut sim = TokenSimulator::deploy_as_caller(&token(1000), users());
    let alice = sim.address_of("alice").unwrap();
    let bob = sim.address_of("bob").unwrap();

    assert_eq!(sim.name(), "Test Token");
    assert_eq!(sim.symbol(), "TST");
    assert_eq!(sim.decimals(), 6);
    assert_eq!(sim.balance_of(&alice), amount(1000));
    assert_eq!(sim.balance_of(&bob), amount(0));
    assert_eq!(sim.allowance(&alice, &bob), amount(0));

    sim.transfer(&bob, &amount(300)).unwrap();

    assert_eq!(sim.balance_of(&alice), amount(700));
    assert_eq!(sim.balance_of(&bob), amount(300));
    assert_eq!(sim.total_supply(), amount(1000));
    sim.check_invariants().unwrap();
}

#[test]
fn insufficient_balance_leaves_ledger_untouched() {
    let mut sim = TokenSimulator::deploy_as_caller(&token(1000), users());
    let bob = sim.address_of("bob").unwrap();
    let before = sim.commitment();

    let err = sim.transfer(&bob, &amount(1001)).unwrap_err();

    assert_eq!(
        err,
        LedgerError::InsufficientBalance {
            have: amount(1000),
            need: amount(1001)
        }
    );
    assert_eq!(sim.commitment(), before);
}

#[test]
fn self_transfer_is_balance_neutral() {
    let mut sim = TokenSimulator::deploy_as_caller(&token(500), users());
    let alice = sim.address_of("alice").unwrap();

    sim.transfer(&alice, &amount(200)).unwrap();

    assert_eq!(sim.balance_of(&alice), amount(500));
    sim.check_invariants().unwrap();
}

#[test]
fn approval_overwrites_rather_than_accumulates() {
    let mut sim = TokenSimulator::deploy_as_caller(&token(1000), users());
    let alice = sim.address_of("alice").unwrap();
    let bob = sim.address_of("bob").unwrap();

    sim.approve(&bob, &amount(100));
    sim.approve(&bob, &amount(40));

    assert_eq!(sim.allowance(&alice, &bob), amount(40));
    assert_eq!(sim.balance_of(&alice), amount(1000));
}

#[test]
fn delegated_transfer_spends_allowance() {
    let mut sim = TokenSimulator::deploy_as_caller(&token(1000), users());
    let alice = sim.address_of("alice").unwrap();
    let bob = sim.address_of("bob").unwrap();
    let carol = sim.address_of("carol").unwrap();

    sim.approve(&bob, &amount(400));
    sim.switch_user("bob").unwrap();
    sim.transfer_from(&alice, &carol, &amount(250)).unwrap();

    assert_eq!(sim.allowance(&alice, &bob), amount(150));
    assert_eq!(sim.balance_of(&alice), amount(750));
    assert_eq!(sim.balance_of(&carol), amount(250));
    assert_eq!(sim.balance_of(&bob), amount(0));

    let before = sim.commitment();
    let err = sim.transfer_from(&alice, &carol, &amount(151)).unwrap_err();
    assert_eq!(err.code(), "INSUFFICIENT_ALLOWANCE");
    assert_eq!(sim.commitment(), before);
}

#[test]
fn transfer_from_without_approval() {
    let mut sim = TokenSimulator::deploy_as_caller(&token(1000), users());
    let alice = sim.address_of("alice").unwrap();
    let carol = sim.address_of("carol").unwrap();

    sim.switch_user("carol").unwrap();
    let err = sim.transfer_from(&alice, &carol, &amount(1)).unwrap_err();
    assert_eq!(err, LedgerError::NoAllowanceSet);

    // A zero approval creates an entry; the next failure is about the amount.
    sim.switch_user("alice").unwrap();
    sim.approve(&carol, &amount(0));
    sim.switch_user("carol").unwrap();
    let err = sim.transfer_from(&alice, &carol, &amount(1)).unwrap_err();
    assert_eq!(err.code(), "INSUFFICIENT_ALLOWANCE");
}

#[test]
fn allowance_does_not_override_owner_balance() {
    let mut sim = TokenSimulator::deploy_as_caller(&token(100), users());
    let alice = sim.address_of("alice").unwrap();
    let bob = sim.address_of("bob").unwrap();

    sim.approve(&bob, &amount(500));
    sim.switch_user("bob").unwrap();
    let err = sim.transfer_from(&alice, &bob, &amount(101)).unwrap_err();

    assert_eq!(err.code(), "INSUFFICIENT_BALANCE");
    assert_eq!(sim.allowance(&alice, &bob), amount(500));
}

#[test]
fn history_records_every_call() {
    let mut sim = TokenSimulator::deploy_as_caller(&token(10), PrivateState::new(key(1)));
    let other = key(2).address();

    sim.transfer(&other, &amount(3)).unwrap();
    let _ = sim.transfer(&other, &amount(30));
    sim.approve(&other, &amount(1));

    let kinds: Vec<_> = sim.history().iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![OperationKind::Transfer, OperationKind::Transfer, OperationKind::Approve]
    );
    let codes: Vec<_> = sim.history().iter().map(|r| r.outcome.code()).collect();
    assert_eq!(codes, vec!["ok", "INSUFFICIENT_BALANCE", "ok"]);
}

#[test]
fn addresses_are_deterministic_and_key_bound() {
    assert_eq!(compute_address(&key(7)), compute_address(&key(7)));
    assert_ne!(compute_address(&key(7)), compute_address(&key(8)));

    let sim = TokenSimulator::deploy_as_caller(&token(1), PrivateState::new(key(7)));
    assert_eq!(sim.caller_address(), compute_address(&key(7)));
}

#[test]
fn scenario_file_runs_end_to_end() {
    let json = format!(
        r#"{{
            "token": {{ "name": "File Token", "symbol": "FTK", "initial_supply": "1000" }},
            "mint": "alice",
            "users": {{ "alice": "{alice}", "bob": "{bob}" }},
            "steps": [
                {{ "op": "transfer", "caller": "alice", "to": "bob", "amount": "300", "expect": "ok" }},
                {{ "op": "approve", "caller": "bob", "spender": "alice", "amount": "50" }},
                {{ "op": "transfer_from", "caller": "alice", "from": "bob", "to": "alice",
                   "amount": "60", "expect": "INSUFFICIENT_ALLOWANCE" }}
            ]
        }}"#,
        alice = key(0xa1).to_hex(),
        bob = key(0xb0).to_hex(),
    );

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scenario.json");
    std::fs::write(&path, json).unwrap();

    let scenario = ScenarioConfig::from_path(&path).unwrap();
    assert_eq!(scenario.token.decimals, 18);

    let report = run_scenario(&scenario).unwrap();
    assert!(report.passed());
    assert_eq!(report.token.symbol, "FTK");
    assert_eq!(report.balances["alice"], amount(700));
    assert_eq!(report.balances["bob"], amount(300));
}
