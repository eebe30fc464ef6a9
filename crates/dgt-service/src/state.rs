//! Application state.

use std::sync::Arc;

use dgt_engine::Ledger;

use crate::config::ServiceConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The ledger engine over the storage backend.
    pub ledger: Arc<Ledger>,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(ledger: Arc<Ledger>, config: ServiceConfig) -> Self {
        if config.jwt_secret.is_none() {
            tracing::warn!("JWT_SECRET not set - only test tokens will be accepted");
        }

        Self { ledger, config }
    }
}
