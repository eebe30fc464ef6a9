//! Point-to-point transfer engine (tips).

use serde_json::json;

use dgt_core::{
    CommandType, Currency, LedgerError, Result, Role, Transaction, TransactionId, TransactionKind,
    UserId,
};

use crate::Ledger;

/// Result of a successful transfer.
#[derive(Debug, Clone, Copy)]
pub struct TransferOutcome {
    /// The confirmed ledger transaction.
    pub transaction_id: TransactionId,

    /// Amount moved, in minor units.
    pub amount: i64,

    /// The credited user.
    pub recipient: UserId,

    /// Sender's balance after the transfer.
    pub sender_balance: i64,
}

impl Ledger {
    /// Transfer `amount` from `sender` to `recipient`.
    ///
    /// Privileged callers may send below-minimum "dust" tips, which skip
    /// the bounds and cooldown checks; a dust tip by a regular user fails
    /// `PermissionDenied`.
    ///
    /// # Errors
    ///
    /// See the failure taxonomy on [`LedgerError`]: `UnsupportedCurrency`,
    /// `ServiceDisabled`, `InvalidAmount`, `AccountNotFound`,
    /// `PermissionDenied`, `CooldownActive`, `InsufficientFunds`, or
    /// `OperationFailed`.
    #[allow(clippy::too_many_arguments)]
    pub fn transfer(
        &self,
        sender: UserId,
        role: Role,
        recipient: UserId,
        amount: i64,
        currency: Currency,
        reason: Option<String>,
        dust: bool,
    ) -> Result<TransferOutcome> {
        if !currency.is_internal() {
            return Err(LedgerError::UnsupportedCurrency(currency));
        }

        let settings = self.settings()?;
        if !settings.tip.enabled {
            return Err(LedgerError::ServiceDisabled {
                command: "tip".into(),
            });
        }

        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(
                "amount must be positive".into(),
            ));
        }
        if sender == recipient {
            return Err(LedgerError::InvalidAmount("cannot tip yourself".into()));
        }

        // Resolve both parties before anything is written. The system
        // account moves funds only through mint/burn flows, never as a
        // tip party.
        for party in [sender, recipient] {
            if party.is_system() {
                return Err(LedgerError::PermissionDenied);
            }
            if self.store().get_account(&party)?.is_none() {
                return Err(LedgerError::AccountNotFound { user_id: party });
            }
        }

        let dust_bypass = dust && settings.tip.allow_dust_bypass && role.is_privileged();
        if dust && !dust_bypass {
            return Err(LedgerError::PermissionDenied);
        }

        if !dust_bypass {
            if amount < settings.tip.min_amount {
                return Err(LedgerError::InvalidAmount(format!(
                    "amount below minimum of {}",
                    settings.tip.min_amount
                )));
            }
            if settings.tip.max_amount > 0 && amount > settings.tip.max_amount {
                return Err(LedgerError::InvalidAmount(format!(
                    "amount above maximum of {}",
                    settings.tip.max_amount
                )));
            }
            self.cooldowns
                .check(sender, CommandType::Tip, role, &settings.cooldown)?;
        }

        let tx = Transaction::open(
            TransactionKind::Tip,
            Some(sender),
            Some(recipient),
            amount,
            Currency::Dgt,
            json!({ "reason": reason, "dust": dust }),
        );
        self.store().put_transaction(&tx)?;

        let balances = match self
            .store()
            .apply_transfer(&tx.id, &sender, &recipient, amount)
        {
            Ok(balances) => balances,
            Err(err) => return Err(self.fail_open_transaction(tx.id, err)),
        };

        // The transfer is already committed; a failed cooldown write must
        // not surface as a failed transfer.
        if !dust_bypass {
            if let Err(err) = self.cooldowns.record_usage(sender, CommandType::Tip) {
                tracing::warn!(
                    transaction_id = %tx.id,
                    sender = %sender,
                    error = %err,
                    "failed to record tip cooldown usage"
                );
            }
        }

        tracing::info!(
            transaction_id = %tx.id,
            sender = %sender,
            recipient = %recipient,
            amount,
            "tip transferred"
        );

        Ok(TransferOutcome {
            transaction_id: tx.id,
            amount,
            recipient,
            sender_balance: balances.from_balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{funded_user, test_ledger};
    use dgt_core::TransactionStatus;

    #[test]
    fn transfer_moves_funds_and_logs() {
        let (ledger, _dir) = test_ledger();
        let alice = funded_user(&ledger, 5_000_000);
        let bob = funded_user(&ledger, 0);

        let outcome = ledger
            .transfer(
                alice,
                Role::User,
                bob,
                2_000_000,
                Currency::Dgt,
                Some("nice post".into()),
                false,
            )
            .unwrap();

        assert_eq!(outcome.amount, 2_000_000);
        assert_eq!(outcome.sender_balance, 3_000_000);
        assert_eq!(ledger.get_balance(bob).unwrap(), 2_000_000);

        let tx = ledger
            .store()
            .get_transaction(&outcome.transaction_id)
            .unwrap()
            .unwrap();
        assert_eq!(tx.status, TransactionStatus::Confirmed);
        assert_eq!(tx.metadata["reason"], "nice post");
    }

    #[test]
    fn insufficient_funds_fails_the_transaction() {
        let (ledger, _dir) = test_ledger();
        let alice = funded_user(&ledger, 1_000_000);
        let bob = funded_user(&ledger, 0);

        let result = ledger.transfer(
            alice,
            Role::User,
            bob,
            2_000_000,
            Currency::Dgt,
            None,
            false,
        );
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientFunds {
                balance: 1_000_000,
                required: 2_000_000
            })
        ));

        // Balances unchanged, transaction closed as failed.
        assert_eq!(ledger.get_balance(alice).unwrap(), 1_000_000);
        assert_eq!(ledger.get_balance(bob).unwrap(), 0);

        let history = ledger
            .get_history(alice, &crate::HistoryFilter::default())
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, TransactionStatus::Failed);
        assert!(history[0].metadata["error"].is_string());
    }

    #[test]
    fn min_amount_boundary() {
        let (ledger, _dir) = test_ledger();
        let alice = funded_user(&ledger, 10_000_000);
        let bob = funded_user(&ledger, 0);

        let mut settings = ledger.settings().unwrap();
        settings.tip.min_amount = 1_000_000;
        settings.cooldown.tip_seconds = 0;
        ledger.update_settings(&settings).unwrap();

        // One unit below the minimum fails.
        let below = ledger.transfer(
            alice,
            Role::User,
            bob,
            999_999,
            Currency::Dgt,
            None,
            false,
        );
        assert!(matches!(below, Err(LedgerError::InvalidAmount(_))));

        // Exactly the minimum succeeds.
        ledger
            .transfer(
                alice,
                Role::User,
                bob,
                1_000_000,
                Currency::Dgt,
                None,
                false,
            )
            .unwrap();
    }

    #[test]
    fn cooldown_blocks_second_tip() {
        let (ledger, _dir) = test_ledger();
        let alice = funded_user(&ledger, 10_000_000);
        let bob = funded_user(&ledger, 0);

        let mut settings = ledger.settings().unwrap();
        settings.cooldown.tip_seconds = 60;
        ledger.update_settings(&settings).unwrap();

        ledger
            .transfer(
                alice,
                Role::User,
                bob,
                1_000_000,
                Currency::Dgt,
                None,
                false,
            )
            .unwrap();

        let second = ledger.transfer(
            alice,
            Role::User,
            bob,
            1_000_000,
            Currency::Dgt,
            None,
            false,
        );
        assert!(matches!(
            second,
            Err(LedgerError::CooldownActive { remaining_seconds }) if remaining_seconds > 0
        ));

        // First transfer applied exactly once.
        assert_eq!(ledger.get_balance(bob).unwrap(), 1_000_000);
    }

    #[test]
    fn dust_tip_requires_privilege() {
        let (ledger, _dir) = test_ledger();
        let alice = funded_user(&ledger, 10_000_000);
        let mod_user = funded_user(&ledger, 10_000_000);
        let bob = funded_user(&ledger, 0);

        let denied = ledger.transfer(alice, Role::User, bob, 10, Currency::Dgt, None, true);
        assert!(matches!(denied, Err(LedgerError::PermissionDenied)));

        let outcome = ledger
            .transfer(mod_user, Role::Moderator, bob, 10, Currency::Dgt, None, true)
            .unwrap();
        assert_eq!(outcome.amount, 10);
        assert_eq!(ledger.get_balance(bob).unwrap(), 10);
    }

    #[test]
    fn external_currency_is_rejected() {
        let (ledger, _dir) = test_ledger();
        let alice = funded_user(&ledger, 10_000_000);
        let bob = funded_user(&ledger, 0);

        let result = ledger.transfer(
            alice,
            Role::User,
            bob,
            1_000_000,
            Currency::External("BTC".into()),
            None,
            false,
        );
        assert!(matches!(result, Err(LedgerError::UnsupportedCurrency(_))));
    }

    #[test]
    fn disabled_service_is_rejected() {
        let (ledger, _dir) = test_ledger();
        let alice = funded_user(&ledger, 10_000_000);
        let bob = funded_user(&ledger, 0);

        let mut settings = ledger.settings().unwrap();
        settings.tip.enabled = false;
        ledger.update_settings(&settings).unwrap();

        let result = ledger.transfer(
            alice,
            Role::User,
            bob,
            1_000_000,
            Currency::Dgt,
            None,
            false,
        );
        assert!(matches!(result, Err(LedgerError::ServiceDisabled { .. })));
    }

    #[test]
    fn cooldown_write_failure_does_not_fail_a_committed_transfer() {
        let (ledger, _dir) = crate::testutil::cooldown_write_failure_ledger();
        let alice = funded_user(&ledger, 5_000_000);
        let bob = funded_user(&ledger, 0);

        // The cooldown upsert fails after the batch committed; the
        // caller still sees a confirmed transfer.
        let outcome = ledger
            .transfer(
                alice,
                Role::User,
                bob,
                2_000_000,
                Currency::Dgt,
                None,
                false,
            )
            .unwrap();

        assert_eq!(outcome.sender_balance, 3_000_000);
        assert_eq!(ledger.get_balance(bob).unwrap(), 2_000_000);

        let tx = ledger
            .store()
            .get_transaction(&outcome.transaction_id)
            .unwrap()
            .unwrap();
        assert_eq!(tx.status, TransactionStatus::Confirmed);
    }

    #[test]
    fn system_account_is_not_a_tip_party() {
        let (ledger, _dir) = test_ledger();
        let alice = funded_user(&ledger, 10_000_000);

        // Tipping the system account would silently burn the amount.
        let to_system = ledger.transfer(
            alice,
            Role::User,
            UserId::SYSTEM,
            1_000_000,
            Currency::Dgt,
            None,
            false,
        );
        assert!(matches!(to_system, Err(LedgerError::PermissionDenied)));

        // Sending from it would mint unbacked supply.
        let from_system = ledger.transfer(
            UserId::SYSTEM,
            Role::Admin,
            alice,
            1_000_000,
            Currency::Dgt,
            None,
            false,
        );
        assert!(matches!(from_system, Err(LedgerError::PermissionDenied)));

        assert_eq!(ledger.get_balance(UserId::SYSTEM).unwrap(), 0);
        assert_eq!(ledger.get_balance(alice).unwrap(), 10_000_000);
    }

    #[test]
    fn unknown_recipient_is_rejected_before_any_write() {
        let (ledger, _dir) = test_ledger();
        let alice = funded_user(&ledger, 10_000_000);
        let ghost = UserId::generate();

        let result = ledger.transfer(
            alice,
            Role::User,
            ghost,
            1_000_000,
            Currency::Dgt,
            None,
            false,
        );
        assert!(matches!(
            result,
            Err(LedgerError::AccountNotFound { user_id }) if user_id == ghost
        ));
        assert!(ledger
            .get_history(alice, &crate::HistoryFilter::default())
            .unwrap()
            .is_empty());
    }
}
