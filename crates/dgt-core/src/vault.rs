//! Time-locked vault types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{TransactionId, UserId, VaultLockId};

/// Minimum lock duration in days.
pub const MIN_LOCK_DURATION_DAYS: u32 = 1;

/// Maximum lock duration in days.
pub const MAX_LOCK_DURATION_DAYS: u32 = 365;

/// Lifecycle state of a vault lock. A lock transitions
/// `Locked` → `Unlocked` exactly once, never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VaultStatus {
    /// Funds are held; excluded from the spendable balance.
    Locked,

    /// Funds have been returned to the owner. Terminal.
    Unlocked,
}

/// A time-locked hold on a user's funds.
///
/// Locking is modeled as a transfer into this row's sub-ledger: the owner
/// is debited on lock and credited on unlock, each through its own ledger
/// transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultLock {
    /// Unique lock ID (ULID, time-ordered).
    pub id: VaultLockId,

    /// The owning user.
    pub user_id: UserId,

    /// Optional on-chain wallet address associated with the lock.
    pub wallet_address: Option<String>,

    /// Amount currently held, in minor units.
    pub amount: i64,

    /// Amount originally locked, in minor units.
    pub initial_amount: i64,

    /// When the funds were locked.
    pub locked_at: DateTime<Utc>,

    /// When the funds become releasable. Always after `locked_at`.
    pub unlock_time: DateTime<Utc>,

    /// When the funds were actually released, if they were.
    pub unlocked_at: Option<DateTime<Utc>>,

    /// Lifecycle state.
    pub status: VaultStatus,

    /// The ledger transaction that debited the owner.
    pub lock_transaction_id: TransactionId,

    /// The ledger transaction that credited the owner back, once unlocked.
    pub unlock_transaction_id: Option<TransactionId>,

    /// Free-form owner notes.
    pub notes: Option<String>,

    /// Structured context, including `currency`.
    pub metadata: serde_json::Value,
}

impl VaultLock {
    /// Whether the lock has reached its release time.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.unlock_time
    }

    /// Seconds remaining until the lock may be released. Zero once
    /// expired.
    #[must_use]
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> u64 {
        let remaining = (self.unlock_time - now).num_seconds();
        u64::try_from(remaining).unwrap_or(0)
    }
}
