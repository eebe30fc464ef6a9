//! System-account operations: rewards, admin adjustments, deposits and
//! withdrawals.
//!
//! All issuance flows through [`UserId::SYSTEM`], so every balance change
//! is a transfer and the sum over all accounts (system included) stays
//! zero.

use serde_json::json;

use dgt_core::{
    Currency, LedgerError, Result, Role, Transaction, TransactionId, TransactionKind, UserId,
};

use crate::Ledger;

/// Result of a system-account movement.
#[derive(Debug, Clone)]
pub struct SystemOutcome {
    /// The confirmed ledger transaction.
    pub transaction_id: TransactionId,

    /// Signed amount from the user's perspective. Positive for credits.
    pub delta: i64,

    /// The user's balance after the movement.
    pub balance: i64,
}

impl Ledger {
    /// Credit a user from the system account for a platform activity.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` for non-positive amounts, `AccountNotFound`, or
    /// `OperationFailed`.
    pub fn reward(&self, user: UserId, amount: i64, reason: &str) -> Result<SystemOutcome> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(
                "amount must be positive".into(),
            ));
        }
        self.system_credit(user, amount, TransactionKind::Reward, json!({ "reason": reason }))
    }

    /// Apply a signed admin adjustment to a user's balance.
    ///
    /// Positive deltas mint from the system account; negative deltas burn
    /// into it and still respect the user's floor of zero.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` unless the caller is an admin, `InvalidAmount`
    /// for a zero delta, `AccountNotFound`, `InsufficientFunds` when a
    /// debit exceeds the balance, or `OperationFailed`.
    pub fn admin_adjust(
        &self,
        caller_role: Role,
        user: UserId,
        delta: i64,
        reason: &str,
    ) -> Result<SystemOutcome> {
        if caller_role != Role::Admin {
            return Err(LedgerError::PermissionDenied);
        }
        if delta == 0 {
            return Err(LedgerError::InvalidAmount("delta must be non-zero".into()));
        }

        let metadata = json!({ "reason": reason, "delta": delta });
        if delta > 0 {
            self.system_credit(user, delta, TransactionKind::AdminAdjust, metadata)
        } else {
            self.system_debit(user, -delta, TransactionKind::AdminAdjust, metadata)
        }
    }

    /// Record an external deposit, minting the amount to the user.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` for non-positive amounts, `AccountNotFound`, or
    /// `OperationFailed`.
    pub fn deposit(&self, user: UserId, amount: i64, reference: &str) -> Result<SystemOutcome> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(
                "amount must be positive".into(),
            ));
        }
        self.system_credit(
            user,
            amount,
            TransactionKind::Deposit,
            json!({ "reference": reference }),
        )
    }

    /// Record an external withdrawal, burning the amount from the user.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` for non-positive amounts, `AccountNotFound`,
    /// `InsufficientFunds`, or `OperationFailed`.
    pub fn withdraw(&self, user: UserId, amount: i64, reference: &str) -> Result<SystemOutcome> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(
                "amount must be positive".into(),
            ));
        }
        self.system_debit(
            user,
            amount,
            TransactionKind::Withdrawal,
            json!({ "reference": reference }),
        )
    }

    fn system_credit(
        &self,
        user: UserId,
        amount: i64,
        kind: TransactionKind,
        metadata: serde_json::Value,
    ) -> Result<SystemOutcome> {
        self.require_account(user)?;

        let tx = Transaction::open(
            kind,
            Some(UserId::SYSTEM),
            Some(user),
            amount,
            Currency::Dgt,
            metadata,
        );
        self.store().put_transaction(&tx)?;

        let balances =
            match self
                .store()
                .apply_transfer(&tx.id, &UserId::SYSTEM, &user, amount)
            {
                Ok(balances) => balances,
                Err(err) => return Err(self.fail_open_transaction(tx.id, err)),
            };

        tracing::info!(
            transaction_id = %tx.id,
            user = %user,
            amount,
            kind = ?kind,
            "system credit applied"
        );

        Ok(SystemOutcome {
            transaction_id: tx.id,
            delta: amount,
            balance: balances.to_balance,
        })
    }

    fn system_debit(
        &self,
        user: UserId,
        amount: i64,
        kind: TransactionKind,
        metadata: serde_json::Value,
    ) -> Result<SystemOutcome> {
        self.require_account(user)?;

        let tx = Transaction::open(
            kind,
            Some(user),
            Some(UserId::SYSTEM),
            amount,
            Currency::Dgt,
            metadata,
        );
        self.store().put_transaction(&tx)?;

        let balances =
            match self
                .store()
                .apply_transfer(&tx.id, &user, &UserId::SYSTEM, amount)
            {
                Ok(balances) => balances,
                Err(err) => return Err(self.fail_open_transaction(tx.id, err)),
            };

        tracing::info!(
            transaction_id = %tx.id,
            user = %user,
            amount,
            kind = ?kind,
            "system debit applied"
        );

        Ok(SystemOutcome {
            transaction_id: tx.id,
            delta: -amount,
            balance: balances.from_balance,
        })
    }

    fn require_account(&self, user: UserId) -> Result<()> {
        // The system account is the counterparty of every flow here,
        // never the user-side party. A self-transfer on the system key
        // would mint supply.
        if user.is_system() {
            return Err(LedgerError::PermissionDenied);
        }
        self.store()
            .get_account(&user)?
            .map(|_| ())
            .ok_or(LedgerError::AccountNotFound { user_id: user })
    }
}
