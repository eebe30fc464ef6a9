//! Rain distribution types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Currency, RainEventId, TransactionId, UserId};

/// Audit record for a single rain command.
///
/// One event per command; the per-recipient credits live in
/// [`RainRecipient`] rows tied back here, plus metadata linkage on the
/// parent transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RainEvent {
    /// Unique event ID (ULID, time-ordered).
    pub id: RainEventId,

    /// The sender who funded the rain.
    pub user_id: UserId,

    /// Total amount debited from the sender, in minor units.
    pub amount: i64,

    /// Currency of the distribution.
    pub currency: Currency,

    /// Number of recipients credited.
    pub recipient_count: u32,

    /// The parent ledger transaction.
    pub transaction_id: TransactionId,

    /// Where the command originated (e.g. "shoutbox").
    pub source: String,

    /// When the rain happened.
    pub created_at: DateTime<Utc>,

    /// Structured context, including `per_user_amount`.
    pub metadata: serde_json::Value,
}

/// A single recipient credit within a rain event.
///
/// Persisted as a typed row rather than metadata-only linkage so the
/// fan-out is queryable with referential integrity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RainRecipient {
    /// The rain event this credit belongs to.
    pub rain_event_id: RainEventId,

    /// The credited user.
    pub user_id: UserId,

    /// Amount credited, in minor units.
    pub amount: i64,

    /// The parent ledger transaction.
    pub transaction_id: TransactionId,
}
