//! DGT Ledger HTTP API Service.
//!
//! This crate provides the HTTP API for the DGT ledger, including:
//!
//! - Wallet balance and transaction history
//! - Tips, rains, and vault locks
//! - Admin rewards, adjustments, and settings
//!
//! # Authentication
//!
//! Requests carry a platform JWT (HS256) with the user UUID in `sub` and
//! the platform role in `role`. When no JWT secret is configured, only
//! `test-token:<uuid>:<role>` bearer tokens are accepted.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers share one async signature

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod sweep;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
