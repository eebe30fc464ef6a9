//! Vault manager: time-locked holds on user funds, with an expiry sweep.

use chrono::{Duration, Utc};
use serde_json::json;

use dgt_core::{
    Currency, LedgerError, Result, Role, Transaction, TransactionKind, UserId, VaultLock,
    VaultLockId, VaultStatus, MAX_LOCK_DURATION_DAYS, MIN_LOCK_DURATION_DAYS,
};

use crate::Ledger;

/// How many expired locks a single sweep pass releases.
pub const SWEEP_BATCH_SIZE: usize = 50;

/// Result of one sweep pass over expired locks.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    /// Locks released this pass.
    pub released: Vec<VaultLockId>,

    /// Locks that failed to release and will be retried next pass.
    pub failed: Vec<VaultLockId>,
}

impl SweepReport {
    /// Whether a batch was full, meaning more expired locks may remain.
    #[must_use]
    pub fn saturated(&self) -> bool {
        self.released.len() + self.failed.len() >= SWEEP_BATCH_SIZE
    }
}

impl Ledger {
    /// Lock `amount` of a user's funds for `duration_days`.
    ///
    /// Debits the owner immediately; the funds return through
    /// [`Ledger::unlock_vault`] or the expiry sweep.
    ///
    /// # Errors
    ///
    /// `UnsupportedCurrency`, `InvalidAmount` (non-positive amount or
    /// duration outside 1..=365 days), `PermissionDenied`,
    /// `AccountNotFound`, `InsufficientFunds`, or `OperationFailed`.
    pub fn lock_vault(
        &self,
        owner: UserId,
        amount: i64,
        currency: Currency,
        duration_days: u32,
        notes: Option<String>,
    ) -> Result<VaultLock> {
        if !currency.is_internal() {
            return Err(LedgerError::UnsupportedCurrency(currency));
        }
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(
                "amount must be positive".into(),
            ));
        }
        if !(MIN_LOCK_DURATION_DAYS..=MAX_LOCK_DURATION_DAYS).contains(&duration_days) {
            return Err(LedgerError::InvalidAmount(format!(
                "lock duration must be between {MIN_LOCK_DURATION_DAYS} and \
                 {MAX_LOCK_DURATION_DAYS} days"
            )));
        }

        // The system account never owns a vault lock.
        if owner.is_system() {
            return Err(LedgerError::PermissionDenied);
        }

        // Fail fast before opening a ledger row.
        let account = self
            .store()
            .get_account(&owner)?
            .ok_or(LedgerError::AccountNotFound { user_id: owner })?;
        if account.balance < amount {
            return Err(LedgerError::InsufficientFunds {
                balance: account.balance,
                required: amount,
            });
        }

        let now = Utc::now();
        let unlock_time = now + Duration::days(i64::from(duration_days));

        let tx = Transaction::open(
            TransactionKind::VaultLock,
            Some(owner),
            None,
            amount,
            Currency::Dgt,
            json!({ "duration_days": duration_days }),
        );
        self.store().put_transaction(&tx)?;

        let lock = VaultLock {
            id: VaultLockId::generate(),
            user_id: owner,
            wallet_address: None,
            amount,
            initial_amount: amount,
            locked_at: now,
            unlock_time,
            unlocked_at: None,
            status: VaultStatus::Locked,
            lock_transaction_id: tx.id,
            unlock_transaction_id: None,
            notes,
            metadata: json!({ "currency": Currency::Dgt }),
        };

        if let Err(err) = self.store().apply_vault_lock(&lock) {
            return Err(self.fail_open_transaction(tx.id, err));
        }

        tracing::info!(
            vault_lock_id = %lock.id,
            transaction_id = %tx.id,
            owner = %owner,
            amount,
            duration_days,
            "vault funds locked"
        );

        Ok(lock)
    }

    /// Release a vault lock back to its owner.
    ///
    /// Callers may only release their own locks unless privileged.
    /// Before the unlock time only an admin may force release.
    ///
    /// # Errors
    ///
    /// `VaultNotFound`, `PermissionDenied`, `StillLocked`,
    /// `AlreadyUnlocked`, or `OperationFailed`.
    pub fn unlock_vault(
        &self,
        caller: UserId,
        role: Role,
        lock_id: VaultLockId,
    ) -> Result<VaultLock> {
        let lock = self
            .store()
            .get_vault_lock(&lock_id)?
            .ok_or(LedgerError::VaultNotFound)?;

        if lock.user_id != caller && !role.is_privileged() {
            return Err(LedgerError::PermissionDenied);
        }
        if lock.status == VaultStatus::Unlocked {
            return Err(LedgerError::AlreadyUnlocked);
        }

        let now = Utc::now();
        if !lock.is_expired(now) && role != Role::Admin {
            return Err(LedgerError::StillLocked {
                remaining_seconds: lock.remaining_seconds(now),
            });
        }

        self.release_lock(&lock, now)
    }

    /// Release all expired locks, up to [`SWEEP_BATCH_SIZE`] per call.
    ///
    /// A lock that fails to release is logged and skipped; it stays
    /// expired and gets retried on the next pass.
    ///
    /// # Errors
    ///
    /// Only when the expired-lock scan itself fails. Per-lock release
    /// failures are reported in the [`SweepReport`] instead.
    pub fn sweep_expired_vaults(&self) -> Result<SweepReport> {
        let now = Utc::now();
        let expired = self.store().list_expired_locks(now, SWEEP_BATCH_SIZE)?;

        let mut report = SweepReport::default();
        for lock in expired {
            match self.release_lock(&lock, now) {
                Ok(_) => report.released.push(lock.id),
                Err(err) => {
                    tracing::warn!(
                        vault_lock_id = %lock.id,
                        owner = %lock.user_id,
                        error = %err,
                        "vault sweep failed to release lock"
                    );
                    report.failed.push(lock.id);
                }
            }
        }

        if !report.released.is_empty() {
            tracing::info!(
                released = report.released.len(),
                failed = report.failed.len(),
                "vault sweep pass complete"
            );
        }

        Ok(report)
    }

    /// Open the unlock transaction and credit the owner back.
    fn release_lock(
        &self,
        lock: &VaultLock,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<VaultLock> {
        let tx = Transaction::open(
            TransactionKind::VaultUnlock,
            None,
            Some(lock.user_id),
            lock.amount,
            Currency::Dgt,
            json!({ "vault_lock_id": lock.id.to_string() }),
        );
        self.store().put_transaction(&tx)?;

        let released = match self.store().apply_vault_unlock(&tx.id, &lock.id, now) {
            Ok(released) => released,
            Err(err) => return Err(self.fail_open_transaction(tx.id, err)),
        };

        tracing::info!(
            vault_lock_id = %lock.id,
            transaction_id = %tx.id,
            owner = %lock.user_id,
            amount = lock.amount,
            "vault funds released"
        );

        Ok(released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{funded_user, test_ledger};
    use dgt_core::TransactionStatus;

    #[test]
    fn lock_debits_and_unlock_restores() {
        let (ledger, _dir) = test_ledger();
        let owner = funded_user(&ledger, 500);

        let lock = ledger
            .lock_vault(owner, 300, Currency::Dgt, 30, Some("hodl".into()))
            .unwrap();
        assert_eq!(lock.status, VaultStatus::Locked);
        assert_eq!(ledger.get_balance(owner).unwrap(), 200);

        // Admin may force-release early.
        let released = ledger.unlock_vault(owner, Role::Admin, lock.id).unwrap();
        assert_eq!(released.status, VaultStatus::Unlocked);
        assert!(released.unlocked_at.is_some());
        assert_eq!(ledger.get_balance(owner).unwrap(), 500);

        let unlock_tx_id = released.unlock_transaction_id.unwrap();
        let tx = ledger
            .store()
            .get_transaction(&unlock_tx_id)
            .unwrap()
            .unwrap();
        assert_eq!(tx.status, TransactionStatus::Confirmed);
        assert_eq!(tx.kind, TransactionKind::VaultUnlock);
    }

    #[test]
    fn early_unlock_blocked_for_non_admins() {
        let (ledger, _dir) = test_ledger();
        let owner = funded_user(&ledger, 500);

        let lock = ledger
            .lock_vault(owner, 100, Currency::Dgt, 7, None)
            .unwrap();

        let result = ledger.unlock_vault(owner, Role::User, lock.id);
        assert!(matches!(
            result,
            Err(LedgerError::StillLocked { remaining_seconds }) if remaining_seconds > 0
        ));
        assert_eq!(ledger.get_balance(owner).unwrap(), 400);
    }

    #[test]
    fn only_owner_or_privileged_may_unlock() {
        let (ledger, _dir) = test_ledger();
        let owner = funded_user(&ledger, 500);
        let stranger = funded_user(&ledger, 0);

        let lock = ledger
            .lock_vault(owner, 100, Currency::Dgt, 7, None)
            .unwrap();

        let result = ledger.unlock_vault(stranger, Role::User, lock.id);
        assert!(matches!(result, Err(LedgerError::PermissionDenied)));
    }

    #[test]
    fn double_unlock_is_rejected() {
        let (ledger, _dir) = test_ledger();
        let owner = funded_user(&ledger, 500);

        let lock = ledger
            .lock_vault(owner, 100, Currency::Dgt, 7, None)
            .unwrap();
        ledger.unlock_vault(owner, Role::Admin, lock.id).unwrap();

        let again = ledger.unlock_vault(owner, Role::Admin, lock.id);
        assert!(matches!(again, Err(LedgerError::AlreadyUnlocked)));
        assert_eq!(ledger.get_balance(owner).unwrap(), 500);
    }

    #[test]
    fn duration_bounds_are_enforced() {
        let (ledger, _dir) = test_ledger();
        let owner = funded_user(&ledger, 500);

        assert!(matches!(
            ledger.lock_vault(owner, 100, Currency::Dgt, 0, None),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            ledger.lock_vault(owner, 100, Currency::Dgt, 366, None),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert_eq!(ledger.get_balance(owner).unwrap(), 500);
    }

    #[test]
    fn system_account_cannot_lock_funds() {
        let (ledger, _dir) = test_ledger();

        let result = ledger.lock_vault(UserId::SYSTEM, 100, Currency::Dgt, 7, None);
        assert!(matches!(result, Err(LedgerError::PermissionDenied)));
        assert_eq!(ledger.get_balance(UserId::SYSTEM).unwrap(), 0);
    }

    #[test]
    fn insufficient_funds_leaves_no_ledger_row() {
        let (ledger, _dir) = test_ledger();
        let owner = funded_user(&ledger, 50);

        let result = ledger.lock_vault(owner, 100, Currency::Dgt, 7, None);
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientFunds {
                balance: 50,
                required: 100
            })
        ));
        assert!(ledger
            .get_history(owner, &crate::HistoryFilter::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn sweep_releases_expired_locks_only() {
        let (ledger, _dir) = test_ledger();
        let owner = funded_user(&ledger, 500);

        let expired = ledger
            .lock_vault(owner, 100, Currency::Dgt, 1, None)
            .unwrap();
        let live = ledger
            .lock_vault(owner, 100, Currency::Dgt, 30, None)
            .unwrap();

        // Backdate the first lock past its unlock time.
        let mut backdated = expired.clone();
        backdated.unlock_time = Utc::now() - Duration::seconds(10);
        ledger.store().put_vault_lock(&backdated).unwrap();

        let report = ledger.sweep_expired_vaults().unwrap();
        assert_eq!(report.released, vec![expired.id]);
        assert!(report.failed.is_empty());
        assert!(!report.saturated());

        assert_eq!(ledger.get_balance(owner).unwrap(), 400);
        let still_locked = ledger.store().get_vault_lock(&live.id).unwrap().unwrap();
        assert_eq!(still_locked.status, VaultStatus::Locked);
    }
}
