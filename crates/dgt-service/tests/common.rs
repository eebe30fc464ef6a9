//! Common test utilities for dgt-service integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum_test::TestServer;
use tempfile::TempDir;

use dgt_core::UserId;
use dgt_engine::Ledger;
use dgt_service::{create_router, AppState, ServiceConfig};
use dgt_store::{RocksStore, Store};

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The ledger, for seeding balances and asserting state directly.
    pub ledger: Arc<Ledger>,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// A test user ID for authenticated requests.
    pub test_user_id: UserId,
}

impl TestHarness {
    /// Create a new test harness with a fresh database.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store: Arc<dyn Store> =
            Arc::new(RocksStore::open(temp_dir.path()).expect("Failed to open store"));
        // Zero TTL so settings changes made mid-test are seen immediately.
        let ledger = Arc::new(Ledger::with_settings_ttl(store, Duration::ZERO));

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            jwt_secret: None,
            ..ServiceConfig::default()
        };

        let state = AppState::new(Arc::clone(&ledger), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");
        let test_user_id = UserId::generate();

        Self {
            server,
            ledger,
            _temp_dir: temp_dir,
            test_user_id,
        }
    }

    /// Get the authorization header for the default test user.
    pub fn user_auth_header(&self) -> String {
        format!("Bearer test-token:{}:user", self.test_user_id)
    }

    /// Get an admin authorization header.
    pub fn admin_auth_header() -> (UserId, String) {
        let admin = UserId::generate();
        (admin, format!("Bearer test-token:{admin}:admin"))
    }

    /// Get a different user's auth header (for testing isolation).
    pub fn other_user_auth_header() -> (UserId, String) {
        let other = UserId::generate();
        (other, format!("Bearer test-token:{other}:user"))
    }

    /// Seed a user's account with a balance, bypassing the HTTP layer.
    pub fn fund(&self, user_id: UserId, balance: i64) {
        self.ledger.register_account(user_id).unwrap();
        self.ledger.reward(user_id, balance, "test-seed").unwrap();
    }

    /// Register a user and mark them active for rain eligibility.
    pub fn activate(&self, user_id: UserId) {
        self.ledger.touch_activity(user_id).unwrap();
    }

    /// Relax ledger settings so small test amounts pass validation.
    pub fn relax_limits(&self) {
        let mut settings = self.ledger.settings().unwrap();
        settings.tip.min_amount = 1;
        settings.rain.min_amount = 1;
        settings.cooldown.tip_seconds = 0;
        settings.cooldown.rain_seconds = 0;
        self.ledger.update_settings(&settings).unwrap();
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
