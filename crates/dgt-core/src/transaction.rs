//! Ledger transaction types.
//!
//! Every balance-affecting operation opens exactly one transaction row
//! (status `Pending`) before mutating balances and closes it (`Confirmed`
//! or `Failed`) before returning. Status transitions are forward-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{TransactionId, UserId};

/// The platform's internal currency symbol.
pub const DGT_SYMBOL: &str = "DGT";

/// A currency at the ledger boundary.
///
/// Only [`Currency::Dgt`] is transferable inside the ledger; external-rail
/// symbols appear on deposit/withdrawal rows and are otherwise rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Currency {
    /// The internal DGT token.
    Dgt,

    /// An external payment-rail symbol (e.g. "BTC"), opaque to the engine.
    External(String),
}

impl Currency {
    /// Whether this is the internal, transferable currency.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Dgt)
    }

    /// The currency symbol as a string.
    #[must_use]
    pub fn symbol(&self) -> &str {
        match self {
            Self::Dgt => DGT_SYMBOL,
            Self::External(symbol) => symbol,
        }
    }
}

impl From<String> for Currency {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case(DGT_SYMBOL) {
            Self::Dgt
        } else {
            Self::External(value)
        }
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.symbol().to_string()
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Kind of ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Point-to-point transfer between two users.
    Tip,

    /// One sender's amount split across randomly chosen recipients.
    Rain,

    /// Funds moved into a time-locked vault.
    VaultLock,

    /// Funds released from a time-locked vault.
    VaultUnlock,

    /// System-issued reward (system account → user).
    Reward,

    /// Administrative balance adjustment (through the system account).
    AdminAdjust,

    /// External rail settlement into the ledger.
    Deposit,

    /// External rail settlement out of the ledger.
    Withdrawal,
}

/// Lifecycle state of a transaction. Forward-only: `Pending` may move to
/// `Confirmed` or `Failed`; both are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Opened, balances not yet (durably) mutated.
    Pending,

    /// Balance effects applied.
    Confirmed,

    /// Operation aborted; no balance effects.
    Failed,
}

impl TransactionStatus {
    /// Whether this state admits no further transitions.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed)
    }
}

/// A ledger transaction row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction ID (ULID for time-ordering).
    pub id: TransactionId,

    /// Kind of operation.
    pub kind: TransactionKind,

    /// Debited account, if any.
    pub from_user: Option<UserId>,

    /// Credited account, if any.
    pub to_user: Option<UserId>,

    /// Amount moved, in minor units. Always positive.
    pub amount: i64,

    /// Currency of the amount.
    pub currency: Currency,

    /// Lifecycle state.
    pub status: TransactionStatus,

    /// Structured context: reason, parent transaction id, recipient
    /// counts, captured errors.
    pub metadata: serde_json::Value,

    /// When the transaction was opened.
    pub created_at: DateTime<Utc>,

    /// When the transaction was confirmed, if it was.
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Open a new pending transaction.
    #[must_use]
    pub fn open(
        kind: TransactionKind,
        from_user: Option<UserId>,
        to_user: Option<UserId>,
        amount: i64,
        currency: Currency,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            kind,
            from_user,
            to_user,
            amount,
            currency,
            status: TransactionStatus::Pending,
            metadata,
            created_at: Utc::now(),
            confirmed_at: None,
        }
    }

    /// Merge a metadata patch into this transaction's metadata.
    ///
    /// Object keys from `patch` are merged over existing keys; a
    /// non-object patch replaces the metadata wholesale.
    pub fn merge_metadata(&mut self, patch: serde_json::Value) {
        match (&mut self.metadata, patch) {
            (serde_json::Value::Object(existing), serde_json::Value::Object(patch)) => {
                existing.extend(patch);
            }
            (_, serde_json::Value::Null) => {}
            (metadata, patch) => *metadata = patch,
        }
    }
}
