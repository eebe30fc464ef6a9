//! Rain distributor: one sender's amount split across randomly chosen
//! active recipients.

use chrono::{Duration, Utc};
use rand::seq::SliceRandom;
use serde_json::json;

use dgt_core::{
    CommandType, Currency, LedgerError, RainEvent, RainEventId, RainRecipient, Result, Role,
    Transaction, TransactionId, TransactionKind, UserId,
};

use crate::Ledger;

/// How many candidate accounts to pull from the store before shuffling.
/// Generous enough that the backfill ordering still has depth to draw on.
const CANDIDATE_POOL_CAP: usize = 256;

/// Result of a successful rain.
#[derive(Debug, Clone)]
pub struct RainOutcome {
    /// The audit event for this rain.
    pub event_id: RainEventId,

    /// The confirmed parent ledger transaction.
    pub transaction_id: TransactionId,

    /// How many recipients were credited.
    pub recipient_count: u32,

    /// Amount each recipient received, in minor units.
    pub per_user_amount: i64,

    /// Indivisible remainder that stayed with the sender.
    pub remainder: i64,

    /// The credited users.
    pub recipients: Vec<UserId>,

    /// Sender's balance after the rain.
    pub sender_balance: i64,
}

impl Ledger {
    /// Rain `amount` over up to `recipient_count` recently active users.
    ///
    /// Recipients active within the configured window are preferred;
    /// the pool is backfilled with the most-recently-active users when
    /// the window alone can't satisfy the request. The sender is always
    /// excluded. The split is integer division; the remainder never
    /// leaves the sender.
    ///
    /// # Errors
    ///
    /// See the failure taxonomy on [`LedgerError`]: `UnsupportedCurrency`,
    /// `ServiceDisabled`, `CooldownActive`, `InvalidAmount`,
    /// `PermissionDenied`, `AccountNotFound`, `NoEligibleRecipients`,
    /// `InsufficientFunds`, or `OperationFailed`.
    pub fn rain(
        &self,
        sender: UserId,
        role: Role,
        amount: i64,
        currency: Currency,
        recipient_count: u32,
        source: &str,
    ) -> Result<RainOutcome> {
        if !currency.is_internal() {
            return Err(LedgerError::UnsupportedCurrency(currency));
        }

        let settings = self.settings()?;
        if !settings.rain.enabled {
            return Err(LedgerError::ServiceDisabled {
                command: "rain".into(),
            });
        }

        self.cooldowns
            .check(sender, CommandType::Rain, role, &settings.cooldown)?;

        if recipient_count == 0 || recipient_count > settings.rain.max_recipients {
            return Err(LedgerError::InvalidAmount(format!(
                "recipient count must be between 1 and {}",
                settings.rain.max_recipients
            )));
        }

        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(
                "amount must be positive".into(),
            ));
        }
        if amount < settings.rain.min_amount {
            return Err(LedgerError::InvalidAmount(format!(
                "amount below minimum of {}",
                settings.rain.min_amount
            )));
        }

        // The system account never rains; it is the mint/burn sink.
        if sender.is_system() {
            return Err(LedgerError::PermissionDenied);
        }
        let sender_account = self
            .store()
            .get_account(&sender)?
            .ok_or(LedgerError::AccountNotFound { user_id: sender })?;
        if sender_account.balance < amount {
            return Err(LedgerError::InsufficientFunds {
                balance: sender_account.balance,
                required: amount,
            });
        }

        let recipients = self.select_recipients(
            sender,
            recipient_count as usize,
            settings.rain.active_window_seconds,
        )?;
        if recipients.is_empty() {
            return Err(LedgerError::NoEligibleRecipients);
        }

        #[allow(clippy::cast_possible_truncation)]
        let count = recipients.len() as u32;
        let per_user = amount / i64::from(count);
        if per_user == 0 {
            return Err(LedgerError::InvalidAmount(format!(
                "amount too small to split across {count} recipients"
            )));
        }
        let distributed = per_user * i64::from(count);
        let remainder = amount - distributed;

        let tx = Transaction::open(
            TransactionKind::Rain,
            Some(sender),
            None,
            distributed,
            Currency::Dgt,
            json!({
                "source": source,
                "requested_amount": amount,
                "recipient_count": count,
                "per_user_amount": per_user,
                "remainder": remainder,
            }),
        );
        self.store().put_transaction(&tx)?;

        let event = RainEvent {
            id: RainEventId::generate(),
            user_id: sender,
            amount: distributed,
            currency: Currency::Dgt,
            recipient_count: count,
            transaction_id: tx.id,
            source: source.to_string(),
            created_at: Utc::now(),
            metadata: json!({ "per_user_amount": per_user }),
        };
        let recipient_rows: Vec<RainRecipient> = recipients
            .iter()
            .map(|user_id| RainRecipient {
                rain_event_id: event.id,
                user_id: *user_id,
                amount: per_user,
                transaction_id: tx.id,
            })
            .collect();

        let sender_balance = match self.store().apply_rain(&event, &recipient_rows) {
            Ok(balance) => balance,
            Err(err) => return Err(self.fail_open_transaction(tx.id, err)),
        };

        // The rain is already committed; a failed cooldown write must
        // not surface as a failed rain.
        if let Err(err) = self.cooldowns.record_usage(sender, CommandType::Rain) {
            tracing::warn!(
                transaction_id = %tx.id,
                sender = %sender,
                error = %err,
                "failed to record rain cooldown usage"
            );
        }

        tracing::info!(
            transaction_id = %tx.id,
            rain_event_id = %event.id,
            sender = %sender,
            recipient_count = count,
            per_user_amount = per_user,
            remainder,
            source,
            "rain distributed"
        );

        Ok(RainOutcome {
            event_id: event.id,
            transaction_id: tx.id,
            recipient_count: count,
            per_user_amount: per_user,
            remainder,
            recipients,
            sender_balance,
        })
    }

    /// Pick up to `count` recipients: everyone active inside the window,
    /// backfilled by most-recently-active, Fisher-Yates shuffled.
    fn select_recipients(
        &self,
        sender: UserId,
        count: usize,
        active_window_seconds: u64,
    ) -> Result<Vec<UserId>> {
        let candidates = self
            .store()
            .list_accounts_by_activity(&sender, CANDIDATE_POOL_CAP)?;

        let cutoff =
            Utc::now() - Duration::seconds(i64::try_from(active_window_seconds).unwrap_or(300));

        let mut pool: Vec<UserId> = Vec::new();
        let mut backfill: Vec<UserId> = Vec::new();
        for account in candidates {
            if account.last_active_at >= cutoff {
                pool.push(account.user_id);
            } else {
                backfill.push(account.user_id);
            }
        }

        // Candidates arrive most-recent-first, so backfill draws the
        // freshest of the stale users.
        if pool.len() < count {
            let needed = count - pool.len();
            pool.extend(backfill.into_iter().take(needed));
        }

        pool.shuffle(&mut rand::thread_rng());
        pool.truncate(count);
        Ok(pool)
    }
}
