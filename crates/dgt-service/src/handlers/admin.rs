//! Admin handlers: rewards, balance adjustments, settings, and the
//! manual vault sweep.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use dgt_core::{LedgerSettings, UserId};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Reward request.
#[derive(Debug, Deserialize)]
pub struct RewardRequest {
    /// The user to credit.
    pub user_id: UserId,
    /// Amount in minor units.
    pub amount: i64,
    /// What the reward is for.
    pub reason: String,
}

/// Adjustment request.
#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    /// The user to adjust.
    pub user_id: UserId,
    /// Signed delta in minor units. Positive credits, negative debits.
    pub delta: i64,
    /// Why the balance is being adjusted.
    pub reason: String,
}

/// Response for reward and adjustment operations.
#[derive(Debug, Serialize)]
pub struct AdjustResponse {
    /// The confirmed ledger transaction.
    pub transaction_id: String,
    /// Signed amount applied, from the user's perspective.
    pub delta: i64,
    /// The user's balance after the movement.
    pub balance: i64,
}

/// Credit a user from the system account.
pub async fn reward_user(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(request): Json<RewardRequest>,
) -> Result<Json<AdjustResponse>, ApiError> {
    auth.require_admin()?;

    state.ledger.register_account(request.user_id)?;
    let outcome = state
        .ledger
        .reward(request.user_id, request.amount, &request.reason)?;

    Ok(Json(AdjustResponse {
        transaction_id: outcome.transaction_id.to_string(),
        delta: outcome.delta,
        balance: outcome.balance,
    }))
}

/// Apply a signed adjustment to a user's balance.
pub async fn adjust_balance(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(request): Json<AdjustRequest>,
) -> Result<Json<AdjustResponse>, ApiError> {
    auth.require_admin()?;

    let outcome = state.ledger.admin_adjust(
        auth.role,
        request.user_id,
        request.delta,
        &request.reason,
    )?;

    Ok(Json(AdjustResponse {
        transaction_id: outcome.transaction_id.to_string(),
        delta: outcome.delta,
        balance: outcome.balance,
    }))
}

/// Get the current engine settings.
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<LedgerSettings>, ApiError> {
    auth.require_admin()?;
    Ok(Json(state.ledger.settings()?))
}

/// Replace the engine settings. Takes effect on the next operation.
pub async fn put_settings(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(settings): Json<LedgerSettings>,
) -> Result<Json<LedgerSettings>, ApiError> {
    auth.require_admin()?;
    state.ledger.update_settings(&settings)?;
    Ok(Json(settings))
}

/// Sweep response.
#[derive(Debug, Serialize)]
pub struct SweepResponse {
    /// Locks released this pass.
    pub released: Vec<String>,
    /// Locks that failed to release.
    pub failed: Vec<String>,
    /// Whether another pass may find more expired locks.
    pub saturated: bool,
}

/// Run one vault expiry sweep pass immediately.
pub async fn sweep_vaults(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<SweepResponse>, ApiError> {
    auth.require_admin()?;

    let report = state.ledger.sweep_expired_vaults()?;

    Ok(Json(SweepResponse {
        saturated: report.saturated(),
        released: report.released.iter().map(ToString::to_string).collect(),
        failed: report.failed.iter().map(ToString::to_string).collect(),
    }))
}
