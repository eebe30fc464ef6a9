//! Core types for the DGT ledger and distribution engine.
//!
//! This crate provides the foundational types used throughout the ledger:
//!
//! - **Identifiers**: `UserId`, `TransactionId`, `RainEventId`, `VaultLockId`
//! - **Accounts**: `Account`, `Role`
//! - **Ledger**: `Transaction`, `TransactionKind`, `TransactionStatus`, `Currency`
//! - **Rain**: `RainEvent`, `RainRecipient`
//! - **Vault**: `VaultLock`, `VaultStatus`
//! - **Cooldowns**: `CommandType`, `CooldownRecord`
//! - **Settings**: `LedgerSettings` and its sections
//!
//! # DGT Unit
//!
//! Balances and amounts are integer minor units with six implied decimal
//! places: `1 DGT = 1_000_000` minor units. Stored as `i64` to avoid
//! floating point precision issues.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod cooldown;
pub mod error;
pub mod ids;
pub mod rain;
pub mod settings;
pub mod transaction;
pub mod vault;

pub use account::{Account, Role};
pub use cooldown::{CommandType, CooldownRecord};
pub use error::{LedgerError, Result};
pub use ids::{IdError, RainEventId, TransactionId, UserId, VaultLockId};
pub use rain::{RainEvent, RainRecipient};
pub use settings::{CooldownSettings, LedgerSettings, RainSettings, TipSettings};
pub use transaction::{Currency, Transaction, TransactionKind, TransactionStatus, DGT_SYMBOL};
pub use vault::{VaultLock, VaultStatus, MAX_LOCK_DURATION_DAYS, MIN_LOCK_DURATION_DAYS};
