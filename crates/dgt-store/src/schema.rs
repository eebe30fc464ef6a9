//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary account records, keyed by `user_id`.
    pub const ACCOUNTS: &str = "accounts";

    /// Ledger transactions, keyed by `transaction_id` (ULID).
    pub const TRANSACTIONS: &str = "transactions";

    /// Index: transactions by user, keyed by `user_id || transaction_id`.
    /// Value is empty (index only). Both sides of a transfer are indexed.
    pub const TRANSACTIONS_BY_USER: &str = "transactions_by_user";

    /// Rain events, keyed by `rain_event_id` (ULID).
    pub const RAIN_EVENTS: &str = "rain_events";

    /// Rain recipient rows, keyed by `rain_event_id || user_id`.
    pub const RAIN_RECIPIENTS: &str = "rain_recipients";

    /// Vault locks, keyed by `vault_lock_id` (ULID).
    pub const VAULT_LOCKS: &str = "vault_locks";

    /// Index: vault locks by user, keyed by `user_id || vault_lock_id`.
    /// Value is empty (index only).
    pub const VAULT_LOCKS_BY_USER: &str = "vault_locks_by_user";

    /// Cooldown records, keyed by `user_id || command_tag`. Upserted.
    pub const COOLDOWNS: &str = "cooldowns";

    /// Engine settings, single row under a fixed key.
    pub const SETTINGS: &str = "settings";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::ACCOUNTS,
        cf::TRANSACTIONS,
        cf::TRANSACTIONS_BY_USER,
        cf::RAIN_EVENTS,
        cf::RAIN_RECIPIENTS,
        cf::VAULT_LOCKS,
        cf::VAULT_LOCKS_BY_USER,
        cf::COOLDOWNS,
        cf::SETTINGS,
    ]
}
