//! # HTTP Front Door
//!
//! JSON API in front of the print pipeline.
//!
//! ## Usage
//!
//! ```bash
//! labelstation serve --listen 0.0.0.0:5000 --config config.json
//! ```
//!
//! | Route | Auth | |
//! |-------|------|--|
//! | `GET /health` | no | liveness |
//! | `GET /api/printers` | key | configured printers |
//! | `GET /api/printers/:id` | key | one printer (id or name) |
//! | `POST /api/print` | key | print text, image or document |
//! | `GET /api/discover` | key | discovered printers (always empty) |
//! | `GET /api/stats` | key | print counters |
//!
//! API routes expect an `X-API-Key` header matching a key in the
//! configuration store.

mod handlers;
mod middleware;
mod state;

pub use handlers::print::{PrintRequest, PrintResponse};
pub use middleware::API_KEY_HEADER;
pub use state::{AppState, ServerConfig};

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::ServerError;

/// Default request body limit (base64 documents get large).
pub const DEFAULT_MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Build the application router.
pub fn router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    let api = Router::new()
        .route("/printers", get(handlers::printers::list))
        .route("/printers/:id", get(handlers::printers::get))
        .route("/print", post(handlers::print::print))
        .route("/discover", get(handlers::discover))
        .route("/stats", get(handlers::stats))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_api_key));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .fallback(handlers::not_found)
        .layer(from_fn_with_state(state.clone(), middleware::track_requests))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use labelstation::server::{serve, ServerConfig, DEFAULT_MAX_BODY_BYTES};
///
/// # async fn example() -> Result<(), labelstation::error::ServerError> {
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:5000".to_string(),
///     config_path: "config.json".into(),
///     dispatch_timeout: Some(std::time::Duration::from_secs(30)),
///     max_body_bytes: DEFAULT_MAX_BODY_BYTES,
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), ServerError> {
    let state = Arc::new(AppState::from_config(&config)?);

    info!(
        listen = %config.listen_addr,
        config = %config.config_path.display(),
        printers = state.store.printers().len(),
        documents = state.service.rasterizer().is_some(),
        dispatch_timeout_s = config.dispatch_timeout.map(|t| t.as_secs()).unwrap_or(0),
        "labelstation starting"
    );
    if state.store.uses_placeholder_key() {
        tracing::warn!("configuration still contains the placeholder API key");
    }

    let app = router(state, config.max_body_bytes);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: config.listen_addr.clone(),
            source,
        })?;

    axum::serve(listener, app).await.map_err(ServerError::Serve)?;

    Ok(())
}
