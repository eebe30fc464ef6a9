//! API handlers.

pub mod admin;
pub mod health;
pub mod rain;
pub mod tip;
pub mod vault;
pub mod wallet;
