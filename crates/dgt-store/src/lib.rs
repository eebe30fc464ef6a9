//! `RocksDB` storage layer for the DGT ledger.
//!
//! This crate provides persistent storage for accounts, ledger
//! transactions, rain events, vault locks, cooldowns, and settings, using
//! `RocksDB` with column families for indexing.
//!
//! # Architecture
//!
//! The store is the only writer of balances. Engines never mutate a
//! balance directly: they open a pending ledger transaction, then call one
//! of the compound `apply_*` operations, which perform the balance check
//! and mutation, confirm the transaction, and commit everything as a
//! single `WriteBatch`. All balance read-modify-write sections are
//! serialized behind an internal write lock, which makes operations on the
//! same account linearizable: two concurrent debits can never both pass
//! the balance check.
//!
//! A crash between opening a pending transaction and committing its batch
//! leaves a pending row with no balance change, which is the expected
//! recoverable artifact.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use chrono::{DateTime, Utc};

use dgt_core::{
    Account, CommandType, CooldownRecord, LedgerSettings, RainEvent, RainEventId, RainRecipient,
    Transaction, TransactionId, TransactionStatus, UserId, VaultLock, VaultLockId,
};

/// Balances on both sides after a two-sided transfer.
#[derive(Debug, Clone, Copy)]
pub struct TransferBalances {
    /// Debited account's new balance.
    pub from_balance: i64,
    /// Credited account's new balance.
    pub to_balance: i64,
}

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different
/// implementations behind the engines.
pub trait Store: Send + Sync {
    // =========================================================================
    // Account Operations
    // =========================================================================

    /// Insert or update an account record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_account(&self, account: &Account) -> Result<()>;

    /// Get an account by user ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_account(&self, user_id: &UserId) -> Result<Option<Account>>;

    /// Get an account, creating a zero-balance one if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn ensure_account(&self, user_id: &UserId) -> Result<Account>;

    /// Record user activity, creating the account if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn touch_activity(&self, user_id: &UserId, at: DateTime<Utc>) -> Result<()>;

    /// List accounts ordered by most recent activity, excluding the given
    /// user and the system account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_accounts_by_activity(&self, exclude: &UserId, limit: usize) -> Result<Vec<Account>>;

    // =========================================================================
    // Transaction Ledger
    // =========================================================================

    /// Insert a ledger transaction and index it for both parties.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_transaction(&self, transaction: &Transaction) -> Result<()>;

    /// Get a transaction by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<Transaction>>;

    /// Move a pending transaction to a terminal status, merging the
    /// metadata patch. Sets `confirmed_at` when confirming.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the transaction doesn't exist.
    /// - `StoreError::TransactionClosed` if it is already terminal.
    fn finalize_transaction(
        &self,
        transaction_id: &TransactionId,
        status: TransactionStatus,
        metadata_patch: serde_json::Value,
    ) -> Result<Transaction>;

    /// List transactions touching a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Transaction>>;

    // =========================================================================
    // Compound Atomic Operations
    // =========================================================================

    /// Apply a two-sided transfer for an open pending transaction:
    /// balance check, debit, credit, and confirmation commit as one batch.
    ///
    /// The system account may be debited without a balance check; it is
    /// the mint/burn sink.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if either account or the transaction is missing.
    /// - `StoreError::InsufficientFunds` if the debit would go negative.
    /// - `StoreError::TransactionClosed` if the transaction is already terminal.
    fn apply_transfer(
        &self,
        transaction_id: &TransactionId,
        from: &UserId,
        to: &UserId,
        amount: i64,
    ) -> Result<TransferBalances>;

    /// Apply a rain fan-out for an open pending transaction: one sender
    /// debit, every recipient credit, the event row, and the recipient
    /// rows commit as one batch. A failure anywhere rolls back everything.
    ///
    /// Returns the sender's new balance.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if any involved account or the transaction is missing.
    /// - `StoreError::InsufficientFunds` if the sender can't cover the total.
    /// - `StoreError::TransactionClosed` if the transaction is already terminal.
    fn apply_rain(&self, event: &RainEvent, recipients: &[RainRecipient]) -> Result<i64>;

    /// Apply a vault lock for an open pending transaction: owner debit,
    /// lock row insert, and confirmation commit as one batch.
    ///
    /// Returns the owner's new balance.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account or transaction is missing.
    /// - `StoreError::InsufficientFunds` if the owner can't cover the lock.
    /// - `StoreError::TransactionClosed` if the transaction is already terminal.
    fn apply_vault_lock(&self, lock: &VaultLock) -> Result<i64>;

    /// Apply a vault unlock for an open pending transaction: owner
    /// credit, lock state flip, and confirmation commit as one batch. The
    /// locked→unlocked check happens inside the lock so a concurrent sweep
    /// and manual unlock can't both credit.
    ///
    /// Returns the updated lock.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the lock, owner, or transaction is missing.
    /// - `StoreError::AlreadyUnlocked` if the lock was already released.
    /// - `StoreError::TransactionClosed` if the transaction is already terminal.
    fn apply_vault_unlock(
        &self,
        transaction_id: &TransactionId,
        lock_id: &VaultLockId,
        unlocked_at: DateTime<Utc>,
    ) -> Result<VaultLock>;

    // =========================================================================
    // Rain Audit Queries
    // =========================================================================

    /// Get a rain event by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_rain_event(&self, event_id: &RainEventId) -> Result<Option<RainEvent>>;

    /// List the recipient rows of a rain event.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_rain_recipients(&self, event_id: &RainEventId) -> Result<Vec<RainRecipient>>;

    // =========================================================================
    // Vault Queries
    // =========================================================================

    /// Get a vault lock by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_vault_lock(&self, lock_id: &VaultLockId) -> Result<Option<VaultLock>>;

    /// Write a vault lock row as-is, maintaining the owner index. Does
    /// not touch balances; balance-moving paths go through
    /// [`Store::apply_vault_lock`] and [`Store::apply_vault_unlock`].
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_vault_lock(&self, lock: &VaultLock) -> Result<()>;

    /// List all vault locks for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_vault_locks_by_user(&self, user_id: &UserId) -> Result<Vec<VaultLock>>;

    /// List locks still `Locked` whose `unlock_time` has passed, oldest
    /// first, bounded by `limit`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_expired_locks(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<VaultLock>>;

    // =========================================================================
    // Cooldown Registry
    // =========================================================================

    /// Get the cooldown record for a (user, command) pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_cooldown(
        &self,
        user_id: &UserId,
        command: CommandType,
    ) -> Result<Option<CooldownRecord>>;

    /// Upsert the cooldown record for a (user, command) pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn upsert_cooldown(&self, record: &CooldownRecord) -> Result<()>;

    // =========================================================================
    // Settings
    // =========================================================================

    /// Load the engine settings, falling back to defaults when unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_settings(&self) -> Result<LedgerSettings>;

    /// Persist the engine settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_settings(&self, settings: &LedgerSettings) -> Result<()>;
}
