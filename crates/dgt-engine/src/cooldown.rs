//! Cooldown registry for rate-limited commands.

use std::sync::Arc;

use chrono::Utc;

use dgt_core::{CommandType, CooldownRecord, CooldownSettings, LedgerError, Result, Role, UserId};
use dgt_store::Store;

/// Per-user, per-command rate limiter backed by upserted store rows.
///
/// Checked before any balance is touched (fail fast); usage is recorded
/// only after a successful mutation, so a failed attempt never penalizes
/// the caller.
pub struct CooldownRegistry {
    store: Arc<dyn Store>,
}

impl CooldownRegistry {
    /// Create a registry over a store.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Check whether the user may run the command now.
    ///
    /// Passes when the configured duration is zero or the role bypasses
    /// cooldowns under the given settings.
    ///
    /// # Errors
    ///
    /// Returns `CooldownActive` with the remaining wait, or
    /// `OperationFailed` on storage errors.
    pub fn check(
        &self,
        user_id: UserId,
        command: CommandType,
        role: Role,
        settings: &CooldownSettings,
    ) -> Result<()> {
        let duration = settings.duration_seconds(command);
        if duration == 0 || role.can_bypass_cooldown(settings) {
            return Ok(());
        }

        let Some(record) = self.store.get_cooldown(&user_id, command)? else {
            return Ok(());
        };

        let remaining = record.remaining_seconds(duration, Utc::now());
        if remaining > 0 {
            tracing::debug!(
                user_id = %user_id,
                command = %command,
                remaining_seconds = remaining,
                "cooldown active"
            );
            return Err(LedgerError::CooldownActive {
                remaining_seconds: remaining,
            });
        }

        Ok(())
    }

    /// Record that the user just ran the command successfully.
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` on storage errors.
    pub fn record_usage(&self, user_id: UserId, command: CommandType) -> Result<()> {
        Ok(self
            .store
            .upsert_cooldown(&CooldownRecord::now(user_id, command))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dgt_store::RocksStore;
    use tempfile::TempDir;

    fn registry() -> (CooldownRegistry, TempDir) {
        let dir = TempDir::new().unwrap();
        let store: Arc<dyn Store> = Arc::new(RocksStore::open(dir.path()).unwrap());
        (CooldownRegistry::new(store), dir)
    }

    fn settings(tip_seconds: u64) -> CooldownSettings {
        CooldownSettings {
            tip_seconds,
            rain_seconds: 300,
            admin_bypass: true,
            moderator_bypass: false,
        }
    }

    #[test]
    fn first_use_passes_then_blocks() {
        let (registry, _dir) = registry();
        let user = UserId::generate();
        let settings = settings(60);

        registry
            .check(user, CommandType::Tip, Role::User, &settings)
            .unwrap();
        registry.record_usage(user, CommandType::Tip).unwrap();

        let result = registry.check(user, CommandType::Tip, Role::User, &settings);
        assert!(matches!(
            result,
            Err(LedgerError::CooldownActive { remaining_seconds }) if remaining_seconds > 0
        ));
    }

    #[test]
    fn zero_duration_always_passes() {
        let (registry, _dir) = registry();
        let user = UserId::generate();
        let settings = settings(0);

        registry.record_usage(user, CommandType::Tip).unwrap();
        registry
            .check(user, CommandType::Tip, Role::User, &settings)
            .unwrap();
    }

    #[test]
    fn bypass_follows_role_flags() {
        let (registry, _dir) = registry();
        let user = UserId::generate();
        let settings = settings(60);

        registry.record_usage(user, CommandType::Tip).unwrap();

        // Admin bypass is on, moderator bypass is off.
        registry
            .check(user, CommandType::Tip, Role::Admin, &settings)
            .unwrap();
        assert!(registry
            .check(user, CommandType::Tip, Role::Moderator, &settings)
            .is_err());
    }

    #[test]
    fn commands_are_throttled_independently() {
        let (registry, _dir) = registry();
        let user = UserId::generate();
        let settings = settings(60);

        registry.record_usage(user, CommandType::Tip).unwrap();
        registry
            .check(user, CommandType::Rain, Role::User, &settings)
            .unwrap();
    }
}
