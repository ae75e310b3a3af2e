//! Test utilities for integration testing.

use crate::config::Config;
use crate::storage::LocalBlobStore;
use crate::{build_router, AppState};
use axum_test::TestServer;
use sqlx::PgPool;
use std::sync::Arc;
use tempfile::TempDir;

/// Header carrying the test caller identity, matching the test config
pub const AUTH_HEADER: &str = "x-sticker-user";

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        public_url: "http://localhost:3410".to_string(),
        ..Default::default()
    }
}

/// Build a test server around the given pool, with blob storage in a fresh
/// temp directory. The `TempDir` guard must be kept alive for the duration
/// of the test.
pub async fn create_test_app(pool: PgPool) -> (TestServer, TempDir) {
    let storage_dir = tempfile::tempdir().expect("Failed to create temp storage dir");

    let state = AppState {
        db: pool,
        config: create_test_config(),
        storage: Arc::new(LocalBlobStore::new(storage_dir.path().to_path_buf())),
    };

    let server = TestServer::new(build_router(state)).expect("Failed to create test server");
    (server, storage_dir)
}
