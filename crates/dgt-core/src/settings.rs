//! Admin-mutable engine settings.
//!
//! Settings are read-mostly and loaded through a short-TTL cache in the
//! engine crate, with explicit invalidation on admin writes.

use serde::{Deserialize, Serialize};

/// Default minimum tip amount in minor units (0.000001 DGT granularity;
/// this is 1 DGT).
pub const DEFAULT_TIP_MIN_AMOUNT: i64 = 1_000_000;

/// Default minimum rain amount in minor units (10 DGT).
pub const DEFAULT_RAIN_MIN_AMOUNT: i64 = 10_000_000;

/// Default maximum recipients per rain.
pub const DEFAULT_RAIN_MAX_RECIPIENTS: u32 = 25;

/// Default activity window for rain eligibility, in seconds.
pub const DEFAULT_RAIN_ACTIVE_WINDOW_SECONDS: u64 = 300;

/// Default tip cooldown in seconds.
pub const DEFAULT_TIP_COOLDOWN_SECONDS: u64 = 30;

/// Default rain cooldown in seconds.
pub const DEFAULT_RAIN_COOLDOWN_SECONDS: u64 = 300;

/// Settings for the tip (transfer) engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TipSettings {
    /// Whether tipping is enabled at all.
    pub enabled: bool,

    /// Minimum tip amount in minor units.
    pub min_amount: i64,

    /// Maximum tip amount in minor units. Zero means unbounded.
    pub max_amount: i64,

    /// Whether privileged roles may send below-minimum "dust" tips.
    pub allow_dust_bypass: bool,
}

impl Default for TipSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            min_amount: DEFAULT_TIP_MIN_AMOUNT,
            max_amount: 0,
            allow_dust_bypass: true,
        }
    }
}

/// Settings for the rain distributor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RainSettings {
    /// Whether rain is enabled at all.
    pub enabled: bool,

    /// Minimum total rain amount in minor units.
    pub min_amount: i64,

    /// Maximum number of recipients per rain.
    pub max_recipients: u32,

    /// Users active within this window are preferred recipients.
    pub active_window_seconds: u64,
}

impl Default for RainSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            min_amount: DEFAULT_RAIN_MIN_AMOUNT,
            max_recipients: DEFAULT_RAIN_MAX_RECIPIENTS,
            active_window_seconds: DEFAULT_RAIN_ACTIVE_WINDOW_SECONDS,
        }
    }
}

/// Cooldown durations and role bypass flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CooldownSettings {
    /// Tip cooldown in seconds. Zero disables the cooldown.
    pub tip_seconds: u64,

    /// Rain cooldown in seconds. Zero disables the cooldown.
    pub rain_seconds: u64,

    /// Whether admins bypass cooldowns.
    pub admin_bypass: bool,

    /// Whether moderators bypass cooldowns.
    pub moderator_bypass: bool,
}

impl CooldownSettings {
    /// The configured cooldown duration for a command.
    #[must_use]
    pub const fn duration_seconds(&self, command: crate::CommandType) -> u64 {
        match command {
            crate::CommandType::Tip => self.tip_seconds,
            crate::CommandType::Rain => self.rain_seconds,
        }
    }
}

impl Default for CooldownSettings {
    fn default() -> Self {
        Self {
            tip_seconds: DEFAULT_TIP_COOLDOWN_SECONDS,
            rain_seconds: DEFAULT_RAIN_COOLDOWN_SECONDS,
            admin_bypass: true,
            moderator_bypass: true,
        }
    }
}

/// All engine settings, persisted as one row and mutated only through the
/// admin interface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerSettings {
    /// Tip engine settings.
    pub tip: TipSettings,

    /// Rain distributor settings.
    pub rain: RainSettings,

    /// Cooldown registry settings.
    pub cooldown: CooldownSettings,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CommandType;

    #[test]
    fn defaults_are_sane() {
        let settings = LedgerSettings::default();
        assert!(settings.tip.enabled);
        assert!(settings.rain.enabled);
        assert_eq!(settings.tip.max_amount, 0); // unbounded
        assert!(settings.rain.max_recipients >= 1);
    }

    #[test]
    fn cooldown_duration_per_command() {
        let settings = CooldownSettings::default();
        assert_eq!(
            settings.duration_seconds(CommandType::Tip),
            DEFAULT_TIP_COOLDOWN_SECONDS
        );
        assert_eq!(
            settings.duration_seconds(CommandType::Rain),
            DEFAULT_RAIN_COOLDOWN_SECONDS
        );
    }
}
