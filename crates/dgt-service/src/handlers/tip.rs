//! Tip handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use dgt_core::{Currency, UserId};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Tip request.
#[derive(Debug, Deserialize)]
pub struct TipRequest {
    /// The receiving user.
    pub recipient: UserId,
    /// Amount in minor units.
    pub amount: i64,
    /// Currency code (default: DGT).
    #[serde(default)]
    pub currency: Option<Currency>,
    /// Optional free-form reason, shown in the recipient's history.
    #[serde(default)]
    pub reason: Option<String>,
    /// Whether this is a dust tip exempt from amount bounds
    /// (privileged roles only).
    #[serde(default)]
    pub dust: bool,
}

/// Tip response.
#[derive(Debug, Serialize)]
pub struct TipResponse {
    /// The confirmed ledger transaction.
    pub transaction_id: String,
    /// Amount transferred, in minor units.
    pub amount: i64,
    /// The receiving user.
    pub recipient: String,
    /// Sender's balance after the tip.
    pub sender_balance: i64,
}

/// Send a tip from the authenticated user.
pub async fn send_tip(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(request): Json<TipRequest>,
) -> Result<Json<TipResponse>, ApiError> {
    state.ledger.register_account(auth.user_id)?;
    state.ledger.touch_activity(auth.user_id)?;

    let outcome = state.ledger.transfer(
        auth.user_id,
        auth.role,
        request.recipient,
        request.amount,
        request.currency.unwrap_or(Currency::Dgt),
        request.reason,
        request.dust,
    )?;

    Ok(Json(TipResponse {
        transaction_id: outcome.transaction_id.to_string(),
        amount: outcome.amount,
        recipient: outcome.recipient.to_string(),
        sender_balance: outcome.sender_balance,
    }))
}
