//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store`
//! trait. Compound operations serialize behind a write mutex and commit as
//! a single `WriteBatch`, which is what makes per-account balance checks
//! linearizable.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use dgt_core::{
    Account, CommandType, CooldownRecord, LedgerSettings, RainEvent, RainEventId, RainRecipient,
    Transaction, TransactionId, TransactionStatus, UserId, VaultLock, VaultLockId, VaultStatus,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::{Store, TransferBalances};

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    /// Serializes all balance read-modify-write sections.
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// The designated system account is created on first open.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let store = Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        };

        if store.get_account(&UserId::SYSTEM)?.is_none() {
            store.put_account(&Account::new(UserId::SYSTEM))?;
            tracing::info!("created system ledger account");
        }

        Ok(store)
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn lock_writes(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| StoreError::Database("write lock poisoned".into()))
    }

    fn write_batch(&self, batch: WriteBatch) -> Result<()> {
        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn load_account(&self, user_id: &UserId) -> Result<Account> {
        self.get_account(user_id)?.ok_or(StoreError::NotFound {
            entity: "account",
            id: user_id.to_string(),
        })
    }

    /// Load a transaction that must still be pending.
    fn load_pending_transaction(&self, transaction_id: &TransactionId) -> Result<Transaction> {
        let tx = self
            .get_transaction(transaction_id)?
            .ok_or(StoreError::NotFound {
                entity: "transaction",
                id: transaction_id.to_string(),
            })?;

        if tx.status.is_terminal() {
            return Err(StoreError::TransactionClosed {
                id: transaction_id.to_string(),
            });
        }

        Ok(tx)
    }

    fn debit_in_place(account: &mut Account, amount: i64) -> Result<()> {
        if !account.has_sufficient_funds(amount) {
            return Err(StoreError::InsufficientFunds {
                balance: account.balance,
                required: amount,
            });
        }
        account.balance -= amount;
        account.updated_at = Utc::now();
        Ok(())
    }

    fn credit_in_place(account: &mut Account, amount: i64) {
        account.balance += amount;
        account.updated_at = Utc::now();
    }

    fn confirm_in_place(tx: &mut Transaction) {
        tx.status = TransactionStatus::Confirmed;
        tx.confirmed_at = Some(Utc::now());
        tx.merge_metadata(serde_json::json!({ "confirmed": true }));
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Account Operations
    // =========================================================================

    fn put_account(&self, account: &Account) -> Result<()> {
        let cf = self.cf(cf::ACCOUNTS)?;
        let key = keys::account_key(&account.user_id);
        let value = Self::serialize(account)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_account(&self, user_id: &UserId) -> Result<Option<Account>> {
        let cf = self.cf(cf::ACCOUNTS)?;
        let key = keys::account_key(user_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn ensure_account(&self, user_id: &UserId) -> Result<Account> {
        let _guard = self.lock_writes()?;

        if let Some(account) = self.get_account(user_id)? {
            return Ok(account);
        }

        let account = Account::new(*user_id);
        self.put_account(&account)?;
        Ok(account)
    }

    fn touch_activity(&self, user_id: &UserId, at: DateTime<Utc>) -> Result<()> {
        let _guard = self.lock_writes()?;

        let mut account = match self.get_account(user_id)? {
            Some(account) => account,
            None => Account::new(*user_id),
        };
        account.last_active_at = at;
        account.updated_at = Utc::now();

        self.put_account(&account)
    }

    fn list_accounts_by_activity(&self, exclude: &UserId, limit: usize) -> Result<Vec<Account>> {
        // Full scan of the accounts CF. Acceptable at current account
        // counts; a `last_active_at`-keyed index CF is the upgrade path
        // if this ever shows up in rain latency.
        let cf = self.cf(cf::ACCOUNTS)?;

        let mut accounts: Vec<Account> = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            let account: Account = Self::deserialize(&value)?;
            if account.user_id.is_system() || account.user_id == *exclude {
                continue;
            }
            accounts.push(account);
        }

        accounts.sort_by(|a, b| b.last_active_at.cmp(&a.last_active_at));
        accounts.truncate(limit);
        Ok(accounts)
    }

    // =========================================================================
    // Transaction Ledger
    // =========================================================================

    fn put_transaction(&self, transaction: &Transaction) -> Result<()> {
        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let cf_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;

        let value = Self::serialize(transaction)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_tx, keys::transaction_key(&transaction.id), &value);

        // Index entry for each side (empty value, index only).
        for party in [transaction.from_user, transaction.to_user]
            .into_iter()
            .flatten()
        {
            batch.put_cf(
                &cf_by_user,
                keys::user_transaction_key(&party, &transaction.id),
                [],
            );
        }

        self.write_batch(batch)
    }

    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<Transaction>> {
        let cf = self.cf(cf::TRANSACTIONS)?;
        let key = keys::transaction_key(transaction_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn finalize_transaction(
        &self,
        transaction_id: &TransactionId,
        status: TransactionStatus,
        metadata_patch: serde_json::Value,
    ) -> Result<Transaction> {
        let _guard = self.lock_writes()?;

        let mut tx = self.load_pending_transaction(transaction_id)?;
        tx.status = status;
        if status == TransactionStatus::Confirmed {
            tx.confirmed_at = Some(Utc::now());
        }
        tx.merge_metadata(metadata_patch);

        let cf = self.cf(cf::TRANSACTIONS)?;
        self.db
            .put_cf(&cf, keys::transaction_key(transaction_id), Self::serialize(&tx)?)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(tx)
    }

    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Transaction>> {
        let cf_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;
        let prefix = keys::user_transactions_prefix(user_id);

        let iter = self.db.iterator_cf(
            &cf_by_user,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        // ULID keys are time-ordered, so the prefix range is already
        // chronological; collect then reverse for newest-first.
        let mut all_keys: Vec<Vec<u8>> = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            all_keys.push(key.to_vec());
        }
        all_keys.reverse();

        let mut transactions = Vec::new();
        for key in all_keys.into_iter().skip(offset) {
            if transactions.len() >= limit {
                break;
            }
            let tx_id = keys::extract_transaction_id_from_user_key(&key);
            if let Some(tx) = self.get_transaction(&tx_id)? {
                transactions.push(tx);
            }
        }

        Ok(transactions)
    }

    // =========================================================================
    // Compound Atomic Operations
    // =========================================================================

    fn apply_transfer(
        &self,
        transaction_id: &TransactionId,
        from: &UserId,
        to: &UserId,
        amount: i64,
    ) -> Result<TransferBalances> {
        let _guard = self.lock_writes()?;

        let mut tx = self.load_pending_transaction(transaction_id)?;
        let mut from_account = self.load_account(from)?;
        let mut to_account = self.load_account(to)?;

        Self::debit_in_place(&mut from_account, amount)?;
        Self::credit_in_place(&mut to_account, amount);
        Self::confirm_in_place(&mut tx);

        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        let cf_tx = self.cf(cf::TRANSACTIONS)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_accounts,
            keys::account_key(from),
            Self::serialize(&from_account)?,
        );
        batch.put_cf(
            &cf_accounts,
            keys::account_key(to),
            Self::serialize(&to_account)?,
        );
        batch.put_cf(
            &cf_tx,
            keys::transaction_key(transaction_id),
            Self::serialize(&tx)?,
        );
        self.write_batch(batch)?;

        Ok(TransferBalances {
            from_balance: from_account.balance,
            to_balance: to_account.balance,
        })
    }

    fn apply_rain(&self, event: &RainEvent, recipients: &[RainRecipient]) -> Result<i64> {
        let _guard = self.lock_writes()?;

        let mut tx = self.load_pending_transaction(&event.transaction_id)?;
        let mut sender = self.load_account(&event.user_id)?;

        // Debit exactly what the recipients receive; the remainder never
        // leaves the sender.
        let total: i64 = recipients.iter().map(|r| r.amount).sum();
        Self::debit_in_place(&mut sender, total)?;
        Self::confirm_in_place(&mut tx);

        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let cf_events = self.cf(cf::RAIN_EVENTS)?;
        let cf_recipients = self.cf(cf::RAIN_RECIPIENTS)?;

        let mut batch = WriteBatch::default();
        for recipient in recipients {
            let mut account = self.load_account(&recipient.user_id)?;
            Self::credit_in_place(&mut account, recipient.amount);
            batch.put_cf(
                &cf_accounts,
                keys::account_key(&recipient.user_id),
                Self::serialize(&account)?,
            );
            batch.put_cf(
                &cf_recipients,
                keys::rain_recipient_key(&event.id, &recipient.user_id),
                Self::serialize(recipient)?,
            );
        }
        batch.put_cf(
            &cf_accounts,
            keys::account_key(&event.user_id),
            Self::serialize(&sender)?,
        );
        batch.put_cf(
            &cf_events,
            keys::rain_event_key(&event.id),
            Self::serialize(event)?,
        );
        batch.put_cf(
            &cf_tx,
            keys::transaction_key(&event.transaction_id),
            Self::serialize(&tx)?,
        );
        self.write_batch(batch)?;

        Ok(sender.balance)
    }

    fn apply_vault_lock(&self, lock: &VaultLock) -> Result<i64> {
        let _guard = self.lock_writes()?;

        let mut tx = self.load_pending_transaction(&lock.lock_transaction_id)?;
        let mut owner = self.load_account(&lock.user_id)?;

        Self::debit_in_place(&mut owner, lock.amount)?;
        Self::confirm_in_place(&mut tx);

        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let cf_locks = self.cf(cf::VAULT_LOCKS)?;
        let cf_locks_by_user = self.cf(cf::VAULT_LOCKS_BY_USER)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_accounts,
            keys::account_key(&lock.user_id),
            Self::serialize(&owner)?,
        );
        batch.put_cf(&cf_locks, keys::vault_lock_key(&lock.id), Self::serialize(lock)?);
        batch.put_cf(
            &cf_locks_by_user,
            keys::user_vault_lock_key(&lock.user_id, &lock.id),
            [],
        );
        batch.put_cf(
            &cf_tx,
            keys::transaction_key(&lock.lock_transaction_id),
            Self::serialize(&tx)?,
        );
        self.write_batch(batch)?;

        Ok(owner.balance)
    }

    fn apply_vault_unlock(
        &self,
        transaction_id: &TransactionId,
        lock_id: &VaultLockId,
        unlocked_at: DateTime<Utc>,
    ) -> Result<VaultLock> {
        let _guard = self.lock_writes()?;

        let mut tx = self.load_pending_transaction(transaction_id)?;
        let mut lock = self.get_vault_lock(lock_id)?.ok_or(StoreError::NotFound {
            entity: "vault lock",
            id: lock_id.to_string(),
        })?;

        // Checked under the write lock so a concurrent sweep and a manual
        // unlock cannot both credit the owner.
        if lock.status == VaultStatus::Unlocked {
            return Err(StoreError::AlreadyUnlocked {
                id: lock_id.to_string(),
            });
        }

        let mut owner = self.load_account(&lock.user_id)?;
        Self::credit_in_place(&mut owner, lock.amount);

        lock.status = VaultStatus::Unlocked;
        lock.unlocked_at = Some(unlocked_at);
        lock.unlock_transaction_id = Some(*transaction_id);
        Self::confirm_in_place(&mut tx);

        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let cf_locks = self.cf(cf::VAULT_LOCKS)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_accounts,
            keys::account_key(&lock.user_id),
            Self::serialize(&owner)?,
        );
        batch.put_cf(&cf_locks, keys::vault_lock_key(lock_id), Self::serialize(&lock)?);
        batch.put_cf(
            &cf_tx,
            keys::transaction_key(transaction_id),
            Self::serialize(&tx)?,
        );
        self.write_batch(batch)?;

        Ok(lock)
    }

    // =========================================================================
    // Rain Audit Queries
    // =========================================================================

    fn get_rain_event(&self, event_id: &RainEventId) -> Result<Option<RainEvent>> {
        let cf = self.cf(cf::RAIN_EVENTS)?;
        let key = keys::rain_event_key(event_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_rain_recipients(&self, event_id: &RainEventId) -> Result<Vec<RainRecipient>> {
        let cf = self.cf(cf::RAIN_RECIPIENTS)?;
        let prefix = keys::rain_recipients_prefix(event_id);

        let iter = self.db.iterator_cf(
            &cf,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        let mut recipients = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            recipients.push(Self::deserialize(&value)?);
        }

        Ok(recipients)
    }

    // =========================================================================
    // Vault Queries
    // =========================================================================

    fn get_vault_lock(&self, lock_id: &VaultLockId) -> Result<Option<VaultLock>> {
        let cf = self.cf(cf::VAULT_LOCKS)?;
        let key = keys::vault_lock_key(lock_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn put_vault_lock(&self, lock: &VaultLock) -> Result<()> {
        let cf_locks = self.cf(cf::VAULT_LOCKS)?;
        let cf_by_user = self.cf(cf::VAULT_LOCKS_BY_USER)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_locks, keys::vault_lock_key(&lock.id), Self::serialize(lock)?);
        batch.put_cf(
            &cf_by_user,
            keys::user_vault_lock_key(&lock.user_id, &lock.id),
            [],
        );
        self.write_batch(batch)
    }

    fn list_vault_locks_by_user(&self, user_id: &UserId) -> Result<Vec<VaultLock>> {
        let cf_by_user = self.cf(cf::VAULT_LOCKS_BY_USER)?;
        let prefix = keys::user_vault_locks_prefix(user_id);

        let iter = self.db.iterator_cf(
            &cf_by_user,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        let mut locks = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            let lock_id = keys::extract_vault_lock_id_from_user_key(&key);
            if let Some(lock) = self.get_vault_lock(&lock_id)? {
                locks.push(lock);
            }
        }

        locks.reverse(); // newest first
        Ok(locks)
    }

    fn list_expired_locks(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<VaultLock>> {
        let cf = self.cf(cf::VAULT_LOCKS)?;

        let mut expired = Vec::new();
        // ULID keys scan oldest-first, so the longest-overdue locks come
        // back first.
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            if expired.len() >= limit {
                break;
            }
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            let lock: VaultLock = Self::deserialize(&value)?;
            if lock.status == VaultStatus::Locked && lock.is_expired(now) {
                expired.push(lock);
            }
        }

        Ok(expired)
    }

    // =========================================================================
    // Cooldown Registry
    // =========================================================================

    fn get_cooldown(
        &self,
        user_id: &UserId,
        command: CommandType,
    ) -> Result<Option<CooldownRecord>> {
        let cf = self.cf(cf::COOLDOWNS)?;
        let key = keys::cooldown_key(user_id, command);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn upsert_cooldown(&self, record: &CooldownRecord) -> Result<()> {
        let cf = self.cf(cf::COOLDOWNS)?;
        let key = keys::cooldown_key(&record.user_id, record.command_type);

        self.db
            .put_cf(&cf, key, Self::serialize(record)?)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    // =========================================================================
    // Settings
    // =========================================================================

    fn get_settings(&self) -> Result<LedgerSettings> {
        let cf = self.cf(cf::SETTINGS)?;

        self.db
            .get_cf(&cf, keys::SETTINGS_KEY)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map_or_else(
                || Ok(LedgerSettings::default()),
                |data| Self::deserialize(&data),
            )
    }

    fn put_settings(&self, settings: &LedgerSettings) -> Result<()> {
        let cf = self.cf(cf::SETTINGS)?;

        self.db
            .put_cf(&cf, keys::SETTINGS_KEY, Self::serialize(settings)?)
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}
