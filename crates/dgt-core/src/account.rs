//! Account and role types for the DGT ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::settings::CooldownSettings;
use crate::UserId;

/// A ledger account holding a DGT balance.
///
/// Balances are integer minor units (6 implied decimal places). The store
/// is the only writer of `balance`; engines mutate it exclusively through
/// ledger-logged atomic operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// The owning user.
    pub user_id: UserId,

    /// Current spendable balance in minor units. Never negative, except
    /// for the system account, whose balance is the negative of net
    /// issuance.
    pub balance: i64,

    /// Last time the user was seen active. Drives rain eligibility.
    pub last_active_at: DateTime<Utc>,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with zero balance.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            balance: 0,
            last_active_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether the account can cover a debit of `amount`.
    ///
    /// The system account always can: it is the mint/burn sink.
    #[must_use]
    pub fn has_sufficient_funds(&self, amount: i64) -> bool {
        self.user_id.is_system() || self.balance >= amount
    }
}

/// Caller role, provided by the auth layer.
///
/// A closed enum rather than a role string so capability checks are
/// exhaustive at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular platform user.
    User,

    /// Forum moderator.
    Moderator,

    /// Platform administrator.
    Admin,
}

impl Role {
    /// Whether this role may bypass command cooldowns under the given
    /// settings.
    #[must_use]
    pub fn can_bypass_cooldown(self, settings: &CooldownSettings) -> bool {
        match self {
            Self::Admin => settings.admin_bypass,
            Self::Moderator => settings.moderator_bypass,
            Self::User => false,
        }
    }

    /// Whether this role may issue privileged operations (dust tips,
    /// unlocking another user's vault, admin endpoints).
    #[must_use]
    pub const fn is_privileged(self) -> bool {
        matches!(self, Self::Admin | Self::Moderator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_has_zero_balance() {
        let account = Account::new(UserId::generate());
        assert_eq!(account.balance, 0);
        assert!(account.has_sufficient_funds(0));
        assert!(!account.has_sufficient_funds(1));
    }

    #[test]
    fn system_account_always_has_funds() {
        let account = Account::new(UserId::SYSTEM);
        assert!(account.has_sufficient_funds(1_000_000_000));
    }

    #[test]
    fn role_bypass_follows_settings() {
        let mut settings = CooldownSettings::default();
        settings.admin_bypass = true;
        settings.moderator_bypass = false;

        assert!(Role::Admin.can_bypass_cooldown(&settings));
        assert!(!Role::Moderator.can_bypass_cooldown(&settings));
        assert!(!Role::User.can_bypass_cooldown(&settings));
    }

    #[test]
    fn privileged_roles() {
        assert!(Role::Admin.is_privileged());
        assert!(Role::Moderator.is_privileged());
        assert!(!Role::User.is_privileged());
    }
}
