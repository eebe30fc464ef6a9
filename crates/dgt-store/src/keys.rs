//! Key encoding utilities for `RocksDB`.
//!
//! All keys are fixed-width binary: UUIDs and ULIDs are 16 bytes each, so
//! composite index keys are simple concatenations and prefix scans need no
//! delimiters. ULIDs are time-ordered, so per-user indexes sort
//! chronologically for free.

use dgt_core::{CommandType, RainEventId, TransactionId, UserId, VaultLockId};

/// Fixed key for the single settings row.
pub const SETTINGS_KEY: &[u8] = b"ledger";

/// Create an account key from a user ID.
#[must_use]
pub fn account_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create a transaction key from a transaction ID.
#[must_use]
pub fn transaction_key(transaction_id: &TransactionId) -> Vec<u8> {
    transaction_id.to_bytes().to_vec()
}

/// Create a user-transaction index key: `user_id (16) || transaction_id (16)`.
#[must_use]
pub fn user_transaction_key(user_id: &UserId, transaction_id: &TransactionId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&transaction_id.to_bytes());
    key
}

/// Create a prefix for iterating all transactions for a user.
#[must_use]
pub fn user_transactions_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Extract the transaction ID from a user-transaction index key.
///
/// # Panics
///
/// Panics if the key is not at least 32 bytes.
#[must_use]
pub fn extract_transaction_id_from_user_key(key: &[u8]) -> TransactionId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    TransactionId::from_bytes(bytes).expect("valid ULID bytes")
}

/// Create a rain event key from an event ID.
#[must_use]
pub fn rain_event_key(event_id: &RainEventId) -> Vec<u8> {
    event_id.to_bytes().to_vec()
}

/// Create a rain recipient key: `rain_event_id (16) || user_id (16)`.
#[must_use]
pub fn rain_recipient_key(event_id: &RainEventId, user_id: &UserId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(&event_id.to_bytes());
    key.extend_from_slice(user_id.as_bytes());
    key
}

/// Create a prefix for iterating all recipients of a rain event.
#[must_use]
pub fn rain_recipients_prefix(event_id: &RainEventId) -> Vec<u8> {
    event_id.to_bytes().to_vec()
}

/// Create a vault lock key from a lock ID.
#[must_use]
pub fn vault_lock_key(lock_id: &VaultLockId) -> Vec<u8> {
    lock_id.to_bytes().to_vec()
}

/// Create a user-vault-lock index key: `user_id (16) || vault_lock_id (16)`.
#[must_use]
pub fn user_vault_lock_key(user_id: &UserId, lock_id: &VaultLockId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&lock_id.to_bytes());
    key
}

/// Create a prefix for iterating all vault locks for a user.
#[must_use]
pub fn user_vault_locks_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Extract the vault lock ID from a user-vault-lock index key.
///
/// # Panics
///
/// Panics if the key is not at least 32 bytes.
#[must_use]
pub fn extract_vault_lock_id_from_user_key(key: &[u8]) -> VaultLockId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    VaultLockId::from_bytes(bytes).expect("valid ULID bytes")
}

/// Create a cooldown key: `user_id (16) || command_tag (1)`.
///
/// One key per (user, command) pair keeps storage bounded.
#[must_use]
pub fn cooldown_key(user_id: &UserId, command: CommandType) -> Vec<u8> {
    let mut key = Vec::with_capacity(17);
    key.extend_from_slice(user_id.as_bytes());
    key.push(command.key_tag());
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_transaction_key_format() {
        let user_id = UserId::generate();
        let tx_id = TransactionId::generate();
        let key = user_transaction_key(&user_id, &tx_id);

        assert_eq!(key.len(), 32);
        assert_eq!(&key[..16], user_id.as_bytes());
        assert_eq!(&key[16..], tx_id.to_bytes());
    }

    #[test]
    fn extract_transaction_id_roundtrip() {
        let user_id = UserId::generate();
        let tx_id = TransactionId::generate();
        let key = user_transaction_key(&user_id, &tx_id);

        assert_eq!(extract_transaction_id_from_user_key(&key), tx_id);
    }

    #[test]
    fn extract_vault_lock_id_roundtrip() {
        let user_id = UserId::generate();
        let lock_id = VaultLockId::generate();
        let key = user_vault_lock_key(&user_id, &lock_id);

        assert_eq!(extract_vault_lock_id_from_user_key(&key), lock_id);
    }

    #[test]
    fn cooldown_keys_differ_per_command() {
        let user_id = UserId::generate();
        let tip = cooldown_key(&user_id, CommandType::Tip);
        let rain = cooldown_key(&user_id, CommandType::Rain);

        assert_eq!(tip.len(), 17);
        assert_ne!(tip, rain);
        assert_eq!(&tip[..16], &rain[..16]);
    }
}
