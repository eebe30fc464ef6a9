//! Engines for the DGT ledger: tips, rain distributions, time-locked
//! vaults, cooldowns, and system-account boundary operations.
//!
//! The [`Ledger`] facade is the single entry point the surrounding
//! application uses. Every operation follows the same shape:
//!
//! 1. validate inputs against freshly-cached settings,
//! 2. check cooldowns (fail fast, nothing written),
//! 3. open one pending ledger transaction,
//! 4. apply the balance mutation atomically through the store,
//! 5. confirm (inside the store batch) or mark the transaction failed,
//! 6. record cooldown usage on success.
//!
//! Balances are only ever written by the store's compound operations, so
//! conservation is enforced in one place.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cooldown;
pub mod rain;
pub mod settings;
pub mod system;
pub mod transfer;
pub mod vault;

pub use cooldown::CooldownRegistry;
pub use rain::RainOutcome;
pub use settings::{SettingsCache, DEFAULT_SETTINGS_TTL};
pub use system::SystemOutcome;
pub use transfer::TransferOutcome;
pub use vault::{SweepReport, SWEEP_BATCH_SIZE};

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use dgt_core::{
    LedgerError, LedgerSettings, Result, Transaction, TransactionId, TransactionKind,
    TransactionStatus, UserId,
};
use dgt_store::{Store, StoreError};

/// Upper bound on rows scanned when filtering a user's history by kind.
const HISTORY_SCAN_CAP: usize = 10_000;

/// Filters for transaction history queries.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    /// Only return transactions of this kind.
    pub kind: Option<TransactionKind>,

    /// Maximum rows to return. Zero means the default page size (50).
    pub limit: usize,

    /// Rows to skip, for pagination.
    pub offset: usize,
}

/// The ledger facade: all engine operations behind one handle.
pub struct Ledger {
    store: Arc<dyn Store>,
    settings: SettingsCache,
    cooldowns: CooldownRegistry,
}

impl Ledger {
    /// Create a ledger over a store, with the default settings cache TTL.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_settings_ttl(store, DEFAULT_SETTINGS_TTL)
    }

    /// Create a ledger with an explicit settings cache TTL.
    #[must_use]
    pub fn with_settings_ttl(store: Arc<dyn Store>, ttl: Duration) -> Self {
        Self {
            settings: SettingsCache::new(Arc::clone(&store), ttl),
            cooldowns: CooldownRegistry::new(Arc::clone(&store)),
            store,
        }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Load the current engine settings (through the short-TTL cache).
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` on storage errors.
    pub fn settings(&self) -> Result<LedgerSettings> {
        self.settings.load()
    }

    /// Persist new engine settings and invalidate the cache so the next
    /// operation sees them immediately.
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` on storage errors.
    pub fn update_settings(&self, settings: &LedgerSettings) -> Result<()> {
        self.store.put_settings(settings)?;
        self.settings.invalidate();
        tracing::info!("ledger settings updated");
        Ok(())
    }

    /// Ensure a ledger account exists for the user.
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` on storage errors.
    pub fn register_account(&self, user_id: UserId) -> Result<dgt_core::Account> {
        Ok(self.store.ensure_account(&user_id)?)
    }

    /// Record user activity for rain eligibility, creating the account if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` on storage errors.
    pub fn touch_activity(&self, user_id: UserId) -> Result<()> {
        Ok(self.store.touch_activity(&user_id, chrono::Utc::now())?)
    }

    /// Get a user's spendable balance in minor units.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the user has no ledger account.
    pub fn get_balance(&self, user_id: UserId) -> Result<i64> {
        self.store
            .get_account(&user_id)?
            .map(|account| account.balance)
            .ok_or(LedgerError::AccountNotFound { user_id })
    }

    /// List a user's transactions, newest first, optionally filtered by
    /// kind.
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` on storage errors.
    pub fn get_history(&self, user_id: UserId, filter: &HistoryFilter) -> Result<Vec<Transaction>> {
        let limit = if filter.limit == 0 { 50 } else { filter.limit };

        if let Some(kind) = filter.kind {
            let scanned = self
                .store
                .list_transactions_by_user(&user_id, HISTORY_SCAN_CAP, 0)?;
            Ok(scanned
                .into_iter()
                .filter(|tx| tx.kind == kind)
                .skip(filter.offset)
                .take(limit)
                .collect())
        } else {
            Ok(self
                .store
                .list_transactions_by_user(&user_id, limit, filter.offset)?)
        }
    }

    /// Mark an opened transaction failed, capture the error in its
    /// metadata, and map the store error for the caller.
    ///
    /// Called whenever a compound apply fails after the pending row was
    /// written; nothing is left pending past the operation.
    pub(crate) fn fail_open_transaction(
        &self,
        transaction_id: TransactionId,
        err: StoreError,
    ) -> LedgerError {
        let patch = json!({ "error": err.to_string() });
        if let Err(finalize_err) =
            self.store
                .finalize_transaction(&transaction_id, TransactionStatus::Failed, patch)
        {
            tracing::error!(
                transaction_id = %transaction_id,
                error = %finalize_err,
                "failed to mark transaction as failed"
            );
        }

        match LedgerError::from(err) {
            LedgerError::OperationFailed { message, .. } => LedgerError::OperationFailed {
                transaction_id: Some(transaction_id),
                message,
            },
            other => other,
        }
    }
}
