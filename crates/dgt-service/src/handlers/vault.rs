//! Vault lock handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use dgt_core::{Currency, VaultLock, VaultLockId};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Vault lock request.
#[derive(Debug, Deserialize)]
pub struct LockRequest {
    /// Amount to lock, in minor units.
    pub amount: i64,
    /// Lock duration in whole days (1..=365).
    pub duration_days: u32,
    /// Currency code (default: DGT).
    #[serde(default)]
    pub currency: Option<Currency>,
    /// Optional owner notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Vault lock response row.
#[derive(Debug, Serialize)]
pub struct LockResponse {
    /// Lock ID.
    pub id: String,
    /// Amount currently held, in minor units.
    pub amount: i64,
    /// Amount originally locked, in minor units.
    pub initial_amount: i64,
    /// Lifecycle state.
    pub status: String,
    /// When the funds were locked.
    pub locked_at: String,
    /// When the funds become releasable.
    pub unlock_time: String,
    /// When the funds were released, if they were.
    pub unlocked_at: Option<String>,
    /// Seconds until the lock may be released. Zero once expired.
    pub remaining_seconds: u64,
    /// Owner notes.
    pub notes: Option<String>,
}

impl From<&VaultLock> for LockResponse {
    fn from(lock: &VaultLock) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: lock.id.to_string(),
            amount: lock.amount,
            initial_amount: lock.initial_amount,
            status: format!("{:?}", lock.status).to_lowercase(),
            locked_at: lock.locked_at.to_rfc3339(),
            unlock_time: lock.unlock_time.to_rfc3339(),
            unlocked_at: lock.unlocked_at.map(|t| t.to_rfc3339()),
            remaining_seconds: lock.remaining_seconds(now),
            notes: lock.notes.clone(),
        }
    }
}

/// Lock funds in the authenticated user's vault.
pub async fn lock_funds(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(request): Json<LockRequest>,
) -> Result<Json<LockResponse>, ApiError> {
    state.ledger.register_account(auth.user_id)?;
    state.ledger.touch_activity(auth.user_id)?;

    let lock = state.ledger.lock_vault(
        auth.user_id,
        request.amount,
        request.currency.unwrap_or(Currency::Dgt),
        request.duration_days,
        request.notes,
    )?;

    Ok(Json(LockResponse::from(&lock)))
}

/// Release a vault lock back to its owner.
pub async fn unlock_funds(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(lock_id): Path<String>,
) -> Result<Json<LockResponse>, ApiError> {
    let lock_id = lock_id
        .parse::<VaultLockId>()
        .map_err(|_| ApiError::BadRequest("invalid vault lock id".into()))?;

    let lock = state.ledger.unlock_vault(auth.user_id, auth.role, lock_id)?;

    Ok(Json(LockResponse::from(&lock)))
}

/// List locks response.
#[derive(Debug, Serialize)]
pub struct ListLocksResponse {
    /// The user's locks, newest first.
    pub locks: Vec<LockResponse>,
}

/// List the authenticated user's vault locks.
pub async fn list_locks(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<ListLocksResponse>, ApiError> {
    let locks = state.ledger.store().list_vault_locks_by_user(&auth.user_id)?;

    Ok(Json(ListLocksResponse {
        locks: locks.iter().map(LockResponse::from).collect(),
    }))
}
