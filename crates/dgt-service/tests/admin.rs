//! Admin endpoint integration tests.

mod common;

use common::TestHarness;
use dgt_core::UserId;
use serde_json::json;

#[tokio::test]
async fn admin_routes_reject_regular_users() {
    let harness = TestHarness::new();

    let reward = json!({
        "user_id": harness.test_user_id,
        "amount": 100,
        "reason": "nope"
    });
    let adjust = json!({
        "user_id": harness.test_user_id,
        "delta": 100,
        "reason": "nope"
    });
    for (path, body) in [
        ("/v1/admin/reward", &reward),
        ("/v1/admin/adjust", &adjust),
    ] {
        let response = harness
            .server
            .post(path)
            .add_header("authorization", harness.user_auth_header())
            .json(body)
            .await;
        response.assert_status_forbidden();
    }

    let response = harness
        .server
        .post("/v1/admin/sweep")
        .add_header("authorization", harness.user_auth_header())
        .await;
    response.assert_status_forbidden();

    let response = harness
        .server
        .get("/v1/admin/settings")
        .add_header("authorization", harness.user_auth_header())
        .await;
    response.assert_status_forbidden();
}

#[tokio::test]
async fn reward_credits_the_user() {
    let harness = TestHarness::new();
    let (_, admin_auth) = TestHarness::admin_auth_header();

    harness
        .ledger
        .register_account(harness.test_user_id)
        .unwrap();

    let response = harness
        .server
        .post("/v1/admin/reward")
        .add_header("authorization", admin_auth)
        .json(&json!({
            "user_id": harness.test_user_id,
            "amount": 5_000_000,
            "reason": "contest winner"
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["delta"], 5_000_000);
    assert_eq!(body["balance"], 5_000_000);
    assert_eq!(
        harness.ledger.get_balance(harness.test_user_id).unwrap(),
        5_000_000
    );
}

#[tokio::test]
async fn adjust_moves_in_both_directions() {
    let harness = TestHarness::new();
    let (_, admin_auth) = TestHarness::admin_auth_header();
    harness.fund(harness.test_user_id, 1_000);

    let response = harness
        .server
        .post("/v1/admin/adjust")
        .add_header("authorization", admin_auth.clone())
        .json(&json!({
            "user_id": harness.test_user_id,
            "delta": -400,
            "reason": "duplicate airdrop"
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["delta"], -400);
    assert_eq!(body["balance"], 600);

    let response = harness
        .server
        .post("/v1/admin/adjust")
        .add_header("authorization", admin_auth)
        .json(&json!({
            "user_id": harness.test_user_id,
            "delta": 150,
            "reason": "goodwill"
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["balance"], 750);
}

#[tokio::test]
async fn settings_round_trip_and_take_effect() {
    let harness = TestHarness::new();
    let (_, admin_auth) = TestHarness::admin_auth_header();

    let response = harness
        .server
        .get("/v1/admin/settings")
        .add_header("authorization", admin_auth.clone())
        .await;
    response.assert_status_ok();
    let mut settings: serde_json::Value = response.json();
    assert_eq!(settings["tip"]["min_amount"], 1_000_000);

    settings["tip"]["min_amount"] = json!(5);
    settings["cooldown"]["tip_seconds"] = json!(0);

    harness
        .server
        .put("/v1/admin/settings")
        .add_header("authorization", admin_auth)
        .json(&settings)
        .await
        .assert_status_ok();

    // A tip at the new minimum now passes validation.
    harness.fund(harness.test_user_id, 100);
    let recipient = UserId::generate();
    harness.ledger.register_account(recipient).unwrap();

    let response = harness
        .server
        .post("/v1/tip")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({
            "recipient": recipient,
            "amount": 5
        }))
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn reward_of_unknown_user_registers_first() {
    let harness = TestHarness::new();
    let (_, admin_auth) = TestHarness::admin_auth_header();

    let user = UserId::generate();
    let response = harness
        .server
        .post("/v1/admin/reward")
        .add_header("authorization", admin_auth)
        .json(&json!({
            "user_id": user,
            "amount": 100,
            "reason": "first post"
        }))
        .await;

    response.assert_status_ok();
    assert_eq!(harness.ledger.get_balance(user).unwrap(), 100);
}
