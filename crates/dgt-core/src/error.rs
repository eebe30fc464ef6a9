//! Error taxonomy for ledger operations.

use crate::ids::IdError;
use crate::{Currency, TransactionId, UserId};

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that ledger operations can return to callers.
///
/// Every variant maps to a stable code in the HTTP layer; rate-limit and
/// time-lock variants carry the remaining wait so clients can surface a
/// retry countdown.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The debited account cannot cover the amount.
    #[error("insufficient funds: balance={balance}, required={required}")]
    InsufficientFunds {
        /// Current balance in minor units.
        balance: i64,
        /// Required amount in minor units.
        required: i64,
    },

    /// No ledger account exists for the user.
    #[error("account not found: {user_id}")]
    AccountNotFound {
        /// The user without an account.
        user_id: UserId,
    },

    /// The amount is not acceptable: non-positive, below the configured
    /// minimum, or above the configured maximum.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// The command is administratively disabled.
    #[error("{command} is currently disabled")]
    ServiceDisabled {
        /// The disabled command.
        command: String,
    },

    /// The caller is still inside the cooldown window.
    #[error("cooldown active: retry in {remaining_seconds}s")]
    CooldownActive {
        /// Seconds until the command may run again.
        remaining_seconds: u64,
    },

    /// The currency is not transferable inside the ledger.
    #[error("unsupported currency: {0}")]
    UnsupportedCurrency(Currency),

    /// The caller lacks the role required for the operation.
    #[error("permission denied")]
    PermissionDenied,

    /// A rain found nobody to credit.
    #[error("no eligible rain recipients")]
    NoEligibleRecipients,

    /// The vault lock was already released.
    #[error("vault lock already unlocked")]
    AlreadyUnlocked,

    /// The vault lock has not reached its release time.
    #[error("vault still locked: {remaining_seconds}s remaining")]
    StillLocked {
        /// Seconds until the lock may be released.
        remaining_seconds: u64,
    },

    /// No vault lock exists with the given ID.
    #[error("vault lock not found")]
    VaultNotFound,

    /// An identifier failed to parse.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),

    /// Unexpected storage failure. If a ledger transaction had been
    /// opened it was marked failed; its ID is carried for traceability.
    #[error("operation failed: {message}")]
    OperationFailed {
        /// The failed (closed) ledger transaction, if one was opened.
        transaction_id: Option<TransactionId>,
        /// Underlying error description.
        message: String,
    },
}

impl LedgerError {
    /// Stable machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::AccountNotFound { .. } => "account_not_found",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::ServiceDisabled { .. } => "service_disabled",
            Self::CooldownActive { .. } => "cooldown_active",
            Self::UnsupportedCurrency(_) => "unsupported_currency",
            Self::PermissionDenied => "permission_denied",
            Self::NoEligibleRecipients => "no_eligible_recipients",
            Self::AlreadyUnlocked => "already_unlocked",
            Self::StillLocked { .. } => "still_locked",
            Self::VaultNotFound => "vault_not_found",
            Self::InvalidId(_) => "invalid_id",
            Self::OperationFailed { .. } => "operation_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(
            LedgerError::InsufficientFunds {
                balance: 1,
                required: 2
            }
            .code(),
            "insufficient_funds"
        );
        assert_eq!(
            LedgerError::CooldownActive {
                remaining_seconds: 5
            }
            .code(),
            "cooldown_active"
        );
        assert_eq!(LedgerError::VaultNotFound.code(), "vault_not_found");
    }

    #[test]
    fn cooldown_message_carries_remaining() {
        let err = LedgerError::CooldownActive {
            remaining_seconds: 42,
        };
        assert!(err.to_string().contains("42"));
    }
}
