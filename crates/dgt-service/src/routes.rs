//! Router configuration.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{admin, health, rain, tip, vault, wallet};
use crate::state::AppState;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Wallet (JWT auth)
/// - `GET /v1/wallet/balance` - Get current balance
/// - `GET /v1/wallet/transactions` - List transaction history
///
/// ## Commands (JWT auth)
/// - `POST /v1/tip` - Send a tip
/// - `POST /v1/rain` - Rain over active users
/// - `POST /v1/vault/lock` - Lock funds
/// - `POST /v1/vault/unlock/:id` - Release a lock
/// - `GET /v1/vault/locks` - List own locks
///
/// ## Admin (JWT auth, admin role)
/// - `POST /v1/admin/reward` - Credit a user from the system account
/// - `POST /v1/admin/adjust` - Apply a signed balance adjustment
/// - `GET /v1/admin/settings` / `PUT /v1/admin/settings`
/// - `POST /v1/admin/sweep` - Run a vault sweep pass now
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.cors_origins);
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let state = Arc::new(state);

    Router::new()
        // Health (public)
        .route("/health", get(health::health))
        // Wallet
        .route("/v1/wallet/balance", get(wallet::get_balance))
        .route("/v1/wallet/transactions", get(wallet::list_transactions))
        // Commands
        .route("/v1/tip", post(tip::send_tip))
        .route("/v1/rain", post(rain::make_rain))
        .route("/v1/vault/lock", post(vault::lock_funds))
        .route("/v1/vault/unlock/:id", post(vault::unlock_funds))
        .route("/v1/vault/locks", get(vault::list_locks))
        // Admin
        .route("/v1/admin/reward", post(admin::reward_user))
        .route("/v1/admin/adjust", post(admin::adjust_balance))
        .route(
            "/v1/admin/settings",
            get(admin::get_settings).put(admin::put_settings),
        )
        .route("/v1/admin/sweep", post(admin::sweep_vaults))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
