//! Wallet balance and transaction history integration tests.

mod common;

use common::TestHarness;

// ============================================================================
// Balance
// ============================================================================

#[tokio::test]
async fn balance_registers_wallet_on_first_touch() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/wallet/balance")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["balance"], 0);
    assert_eq!(body["currency"], "DGT");
}

#[tokio::test]
async fn balance_reflects_seeded_funds() {
    let harness = TestHarness::new();
    harness.fund(harness.test_user_id, 2_500_000);

    let response = harness
        .server
        .get("/v1/wallet/balance")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["balance"], 2_500_000);
    assert_eq!(body["balance_formatted"], "2.500000 DGT");
}

#[tokio::test]
async fn balance_without_auth_fails() {
    let harness = TestHarness::new();

    let response = harness.server.get("/v1/wallet/balance").await;

    response.assert_status_unauthorized();
}

// ============================================================================
// Transactions
// ============================================================================

#[tokio::test]
async fn transactions_list_newest_first_with_kind_filter() {
    let harness = TestHarness::new();
    harness.relax_limits();
    harness.fund(harness.test_user_id, 1_000);

    let (recipient, _) = TestHarness::other_user_auth_header();
    harness.ledger.register_account(recipient).unwrap();
    // Distinct ULID timestamps so newest-first ordering is deterministic.
    std::thread::sleep(std::time::Duration::from_millis(2));
    harness
        .ledger
        .transfer(
            harness.test_user_id,
            dgt_core::Role::User,
            recipient,
            100,
            dgt_core::Currency::Dgt,
            None,
            false,
        )
        .unwrap();

    let response = harness
        .server
        .get("/v1/wallet/transactions")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let transactions = body["transactions"].as_array().unwrap();
    // Tip first (newest), then the seed reward.
    assert_eq!(transactions.len(), 2);
    assert_eq!(transactions[0]["kind"], "tip");
    assert_eq!(transactions[1]["kind"], "reward");
    assert_eq!(body["has_more"], false);

    // Kind filter narrows to the tip.
    let response = harness
        .server
        .get("/v1/wallet/transactions?kind=tip")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let transactions = body["transactions"].as_array().unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0]["kind"], "tip");
    assert_eq!(transactions[0]["amount"], 100);
    assert_eq!(transactions[0]["status"], "confirmed");
}

#[tokio::test]
async fn transactions_paginate() {
    let harness = TestHarness::new();
    harness.fund(harness.test_user_id, 100);
    for _ in 0..4 {
        harness
            .ledger
            .reward(harness.test_user_id, 10, "drip")
            .unwrap();
    }

    let response = harness
        .server
        .get("/v1/wallet/transactions?limit=3")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["transactions"].as_array().unwrap().len(), 3);
    assert_eq!(body["has_more"], true);

    let response = harness
        .server
        .get("/v1/wallet/transactions?limit=3&offset=3")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["transactions"].as_array().unwrap().len(), 2);
    assert_eq!(body["has_more"], false);
}
