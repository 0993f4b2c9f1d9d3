//! # imgdrop
//!
//! A small authenticated image-upload service.
//!
//! Clients `POST` a multipart form to `/api/v1/uploads` carrying a shared secret
//! (`apiKey`), the image payload (`file`) and an optional target subdirectory
//! (`dir`). The payload is validated by its magic bytes (JPEG, PNG and WebP
//! are accepted), stored on the local filesystem under a server-generated
//! collision-free name, and the absolute public URL of the stored file is
//! returned as JSON. Stored files are served back at `/uploads/*`.
//!
//! ## Architecture
//!
//! - **[`api`]**: HTTP handlers and wire types
//! - **[`storage`]**: Directory sanitization and filesystem writes
//! - **[`media`]**: Magic-byte content sniffing
//! - **[`auth`]**: Shared-secret verification
//! - **[`config`]**: YAML + environment configuration via figment
//! - **[`errors`]**: Error taxonomy mapped onto HTTP responses
//!
//! ## Usage
//!
//! ```rust,no_run
//! use imgdrop::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config {
//!         api_key: Some("a-strong-secret".to_string()),
//!         ..Config::default()
//!     };
//!
//!     let app = Application::new(config).await?;
//!
//!     // Run with graceful shutdown on Ctrl+C
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.ok();
//!     })
//!     .await
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod media;
pub mod openapi;
pub mod storage;
pub mod telemetry;

pub use config::Config;
pub use errors::{Error, Result};

use crate::openapi::ApiDoc;
use crate::storage::LocalStore;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Multipart framing allowance on top of the configured file size limit.
///
/// The request body carries boundaries and the other form fields alongside the
/// file, so the transport limit sits above `max_file_size`. Oversized files
/// under this ceiling are rejected by the handler with the contract's message.
const FORM_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Application state shared across all request handlers.
///
/// Cloned per request; both fields are cheap reference-counted handles.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from file/environment
    pub config: Arc<Config>,
    /// Filesystem store rooted at `uploads.root`
    pub store: Arc<LocalStore>,
}

/// Build the router with all routes and middleware.
///
/// Returns the fully configured router ready to be served.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state
        .config
        .uploads
        .max_file_size
        .saturating_add(FORM_OVERHEAD_BYTES) as usize;

    let serve_uploads = ServeDir::new(state.store.root().to_path_buf());
    let public_path = state.config.uploads.public_path.clone();

    Router::new()
        .route(
            "/api/v1/uploads",
            post(api::handlers::uploads::upload).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/healthz", get(|| async { "OK" }))
        .with_state(state)
        .nest_service(&public_path, serve_uploads)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// The main application with the HTTP server and storage.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] validates configuration and opens the storage root
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: When the shutdown signal resolves, in-flight requests drain before exit
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        config.validate()?;

        let state = Self::build_state(config.clone()).await?;
        let router = build_router(state);

        Ok(Self { router, config })
    }

    /// Open the storage root and assemble the shared request state.
    pub async fn build_state(config: Config) -> anyhow::Result<AppState> {
        let store = LocalStore::new(config.uploads.root.clone()).await?;
        Ok(AppState {
            config: Arc::new(config),
            store: Arc::new(store),
        })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "imgdrop listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}
