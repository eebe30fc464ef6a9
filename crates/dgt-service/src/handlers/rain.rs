//! Rain handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use dgt_core::Currency;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Rain request.
#[derive(Debug, Deserialize)]
pub struct RainRequest {
    /// Total amount to distribute, in minor units.
    pub amount: i64,
    /// How many recipients to credit.
    pub recipient_count: u32,
    /// Currency code (default: DGT).
    #[serde(default)]
    pub currency: Option<Currency>,
    /// Where the rain was triggered from (default: "shoutbox").
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_source() -> String {
    "shoutbox".into()
}

/// Rain response.
#[derive(Debug, Serialize)]
pub struct RainResponse {
    /// The audit event for this rain.
    pub rain_event_id: String,
    /// The confirmed parent ledger transaction.
    pub transaction_id: String,
    /// How many recipients were credited.
    pub recipient_count: u32,
    /// Amount each recipient received, in minor units.
    pub per_user_amount: i64,
    /// Indivisible remainder that stayed with the sender.
    pub remainder: i64,
    /// The credited users.
    pub recipients: Vec<String>,
    /// Sender's balance after the rain.
    pub sender_balance: i64,
}

/// Rain an amount over recently active users.
pub async fn make_rain(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(request): Json<RainRequest>,
) -> Result<Json<RainResponse>, ApiError> {
    state.ledger.register_account(auth.user_id)?;
    state.ledger.touch_activity(auth.user_id)?;

    let outcome = state.ledger.rain(
        auth.user_id,
        auth.role,
        request.amount,
        request.currency.unwrap_or(Currency::Dgt),
        request.recipient_count,
        &request.source,
    )?;

    Ok(Json(RainResponse {
        rain_event_id: outcome.event_id.to_string(),
        transaction_id: outcome.transaction_id.to_string(),
        recipient_count: outcome.recipient_count,
        per_user_amount: outcome.per_user_amount,
        remainder: outcome.remainder,
        recipients: outcome.recipients.iter().map(ToString::to_string).collect(),
        sender_balance: outcome.sender_balance,
    }))
}
