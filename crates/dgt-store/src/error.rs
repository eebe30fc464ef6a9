//! Error types for ledger storage.

use dgt_core::LedgerError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of record ("account", "transaction", "vault lock").
        entity: &'static str,
        /// The missing key, for the log line.
        id: String,
    },

    /// Insufficient funds for a debit.
    #[error("insufficient funds: balance={balance}, required={required}")]
    InsufficientFunds {
        /// Current balance in minor units.
        balance: i64,
        /// Required amount in minor units.
        required: i64,
    },

    /// Attempted to finalize a transaction already in a terminal state.
    #[error("transaction already closed: {id}")]
    TransactionClosed {
        /// The closed transaction.
        id: String,
    },

    /// Attempted to release a vault lock that was already unlocked.
    #[error("vault lock already unlocked: {id}")]
    AlreadyUnlocked {
        /// The unlocked lock.
        id: String,
    },
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InsufficientFunds { balance, required } => {
                Self::InsufficientFunds { balance, required }
            }
            StoreError::NotFound {
                entity: "account",
                id,
            } => id.parse().map_or_else(
                |_| Self::OperationFailed {
                    transaction_id: None,
                    message: format!("account not found: {id}"),
                },
                |user_id| Self::AccountNotFound { user_id },
            ),
            StoreError::NotFound {
                entity: "vault lock",
                ..
            } => Self::VaultNotFound,
            StoreError::AlreadyUnlocked { .. } => Self::AlreadyUnlocked,
            other => Self::OperationFailed {
                transaction_id: None,
                message: other.to_string(),
            },
        }
    }
}
