//! Cooldown types for rate-limited commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// A rate-limited command type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    /// Point-to-point tip.
    Tip,

    /// Rain distribution.
    Rain,
}

impl CommandType {
    /// Stable single-byte tag used in storage keys.
    #[must_use]
    pub const fn key_tag(self) -> u8 {
        match self {
            Self::Tip => 0,
            Self::Rain => 1,
        }
    }
}

impl std::fmt::Display for CommandType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tip => f.write_str("tip"),
            Self::Rain => f.write_str("rain"),
        }
    }
}

/// Last-executed record for a (user, command) pair.
///
/// At most one row per pair; upserted on each successful command so
/// storage stays bounded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CooldownRecord {
    /// The throttled user.
    pub user_id: UserId,

    /// The throttled command.
    pub command_type: CommandType,

    /// When the user last ran the command successfully.
    pub last_executed_at: DateTime<Utc>,
}

impl CooldownRecord {
    /// Create a record stamped with the current time.
    #[must_use]
    pub fn now(user_id: UserId, command_type: CommandType) -> Self {
        Self {
            user_id,
            command_type,
            last_executed_at: Utc::now(),
        }
    }

    /// Seconds remaining before the command may run again, given the
    /// configured cooldown duration. Zero once elapsed.
    #[must_use]
    pub fn remaining_seconds(&self, cooldown_seconds: u64, now: DateTime<Utc>) -> u64 {
        let elapsed = (now - self.last_executed_at).num_seconds().max(0);
        cooldown_seconds.saturating_sub(u64::try_from(elapsed).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn remaining_counts_down() {
        let mut record = CooldownRecord::now(UserId::generate(), CommandType::Tip);
        record.last_executed_at = Utc::now() - Duration::seconds(40);

        let remaining = record.remaining_seconds(60, Utc::now());
        assert!(remaining > 15 && remaining <= 20);
    }

    #[test]
    fn remaining_is_zero_after_window() {
        let mut record = CooldownRecord::now(UserId::generate(), CommandType::Rain);
        record.last_executed_at = Utc::now() - Duration::seconds(120);
        assert_eq!(record.remaining_seconds(60, Utc::now()), 0);
    }

    #[test]
    fn command_key_tags_are_distinct() {
        assert_ne!(CommandType::Tip.key_tag(), CommandType::Rain.key_tag());
    }
}
