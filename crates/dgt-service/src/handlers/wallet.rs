//! Wallet balance and transaction history handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use dgt_core::{Transaction, TransactionKind, DGT_SYMBOL};
use dgt_engine::HistoryFilter;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Balance response.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Balance in minor units (6 implied decimals).
    pub balance: i64,
    /// Balance formatted with the currency symbol.
    pub balance_formatted: String,
    /// The ledger currency.
    pub currency: String,
}

/// Get the authenticated user's balance, registering the wallet on first
/// touch.
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<BalanceResponse>, ApiError> {
    let account = state.ledger.register_account(auth.user_id)?;
    state.ledger.touch_activity(auth.user_id)?;

    // Amounts here are well within f64 precision.
    #[allow(clippy::cast_precision_loss)]
    let formatted = format!("{:.6} {DGT_SYMBOL}", account.balance as f64 / 1_000_000.0);

    Ok(Json(BalanceResponse {
        balance: account.balance,
        balance_formatted: formatted,
        currency: DGT_SYMBOL.to_string(),
    }))
}

/// Transaction list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    /// Only return transactions of this kind.
    pub kind: Option<TransactionKind>,
    /// Maximum number of transactions to return (default: 50).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// Transaction response.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: String,
    /// Transaction kind.
    pub kind: TransactionKind,
    /// Sending user, if any.
    pub from_user: Option<String>,
    /// Receiving user, if any.
    pub to_user: Option<String>,
    /// Amount in minor units.
    pub amount: i64,
    /// Currency code.
    pub currency: String,
    /// Lifecycle status.
    pub status: String,
    /// Structured context.
    pub metadata: serde_json::Value,
    /// When the transaction was opened.
    pub created_at: String,
    /// When the transaction was confirmed, if it was.
    pub confirmed_at: Option<String>,
}

impl From<&Transaction> for TransactionResponse {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.id.to_string(),
            kind: tx.kind,
            from_user: tx.from_user.map(|u| u.to_string()),
            to_user: tx.to_user.map(|u| u.to_string()),
            amount: tx.amount,
            currency: tx.currency.to_string(),
            status: format!("{:?}", tx.status).to_lowercase(),
            metadata: tx.metadata.clone(),
            created_at: tx.created_at.to_rfc3339(),
            confirmed_at: tx.confirmed_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// List transactions response.
#[derive(Debug, Serialize)]
pub struct ListTransactionsResponse {
    /// Transactions, newest first.
    pub transactions: Vec<TransactionResponse>,
    /// Whether there are more transactions.
    pub has_more: bool,
}

/// List the authenticated user's transaction history.
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<ListTransactionsResponse>, ApiError> {
    state.ledger.register_account(auth.user_id)?;

    // Fetch one more than requested to determine has_more.
    let limit = query.limit.clamp(1, 100);
    let filter = HistoryFilter {
        kind: query.kind,
        limit: limit + 1,
        offset: query.offset,
    };
    let transactions = state.ledger.get_history(auth.user_id, &filter)?;

    let has_more = transactions.len() > limit;
    let transactions: Vec<_> = transactions
        .iter()
        .take(limit)
        .map(TransactionResponse::from)
        .collect();

    Ok(Json(ListTransactionsResponse {
        transactions,
        has_more,
    }))
}
