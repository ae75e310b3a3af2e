//! # stickerd: Sticker Storage Service
//!
//! `stickerd` is a JSON-over-HTTP backend that lets users organize small
//! image assets ("stickers") into named, per-user categories and retrieve
//! them for use elsewhere. It owns the sticker storage and ownership model:
//! category and sticker persistence, per-user access control, blob placement
//! under per-category folders, upload validation (size and sniffed MIME
//! type), and safe retrieval and deletion.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for
//! the HTTP layer, PostgreSQL (via SQLx) for metadata, and a filesystem blob
//! store for uploaded bytes.
//!
//! The **API layer** ([`api`]) exposes the sticker endpoints under
//! `/api/v1/sticker/*`. Handlers orchestrate everything with real
//! invariants: ownership checks (masked as `404` on read paths so other
//! users' categories cannot be probed), upload validation, and the
//! blob-write-before-metadata ordering that guarantees no metadata row ever
//! points at a blob that was never written.
//!
//! The **authentication layer** ([`auth`]) trusts a reverse proxy to inject
//! the caller's opaque identifier into a configurable request header. There
//! is no session or credential handling in this service.
//!
//! The **database layer** ([`db`]) uses the repository pattern: one
//! repository per table, parameterized queries behind it, and a classified
//! [`db::errors::DbError`] so constraint violations surface as the right
//! HTTP status (the `(user, name)` unique index backs up the category
//! create pre-check, mapping the documented race to `409`).
//!
//! The **blob store** ([`storage`]) is a small trait over hierarchical byte
//! storage with idempotent folder creation; uploads land at
//! `stickers/{category_id}/{unique_suffix}-{filename}` so concurrent uploads
//! of the same name never collide.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use stickerd::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = stickerd::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     stickerd::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod sniff;
pub mod storage;
pub mod telemetry;
mod types;

#[cfg(test)]
pub mod test_utils;

use crate::api::handlers::stickers::UPLOAD_BODY_LIMIT;
use crate::openapi::ApiDoc;
use crate::storage::BlobStore;
use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{delete, get, post},
    Router,
};
pub use config::Config;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{CategoryId, StickerId, UserId};

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub storage: Arc<dyn BlobStore>,
}

/// Get the stickerd database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Build the application router with all endpoints and middleware.
pub fn build_router(state: AppState) -> Router {
    // File upload route with its own body limit (other routes use the default)
    let upload_routes = Router::new()
        .route("/sticker", post(api::handlers::stickers::upload_sticker))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT));

    let api_routes = Router::new()
        .route(
            "/sticker/categories",
            get(api::handlers::categories::get_categories).post(api::handlers::categories::create_category),
        )
        .route(
            "/sticker/categories/{category_id}/stickers",
            get(api::handlers::stickers::get_stickers),
        )
        .route("/sticker/{sticker_id}", delete(api::handlers::stickers::delete_sticker))
        .route("/sticker/{sticker_id}/image", get(api::handlers::stickers::download_sticker))
        .merge(upload_routes)
        .with_state(state);

    Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api/v1", api_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Main application struct that owns all resources and lifecycle.
///
/// 1. **Create**: [`Application::new`] connects to the database, runs
///    migrations, and prepares the blob store root
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles
///    requests until the shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool = PgPool::connect(&config.database.url).await?;
        migrator().run(&pool).await?;

        let storage = storage::create_blob_store(&config.storage.root).await?;

        let state = AppState {
            db: pool.clone(),
            config: config.clone(),
            storage,
        };
        let router = build_router(state);

        Ok(Self { router, config, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("Sticker service listening on http://{bind_addr}");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}
