//! Spotlight Server - HTTP surface of the sidecar
//!
//! Receives telemetry bodies from instrumented applications, keeps them in
//! the envelope buffer, and serves them back live and on demand.
//!
//! # Endpoints
//!
//! - `POST /stream` - Ingest a body (`Content-Type`, optional `Content-Encoding`)
//! - `POST /api/{project_id}/envelope/` - Ingest for SDKs configured with a DSN
//! - `GET /stream` - Server-Sent Events live tail, resumable via `Last-Event-ID`
//! - `GET /envelope/{id}` - Raw bytes of one buffered body
//! - `GET /envelopes` - JSON listing with `time_window`, `filename`,
//!   `envelope_id`, `all`, `limit`, `offset`
//! - `DELETE /clear` - Drop everything buffered
//! - `GET /health` - Liveness probe
//!
//! Every route sits behind the origin guard: a request carrying an `Origin`
//! the validator rejects gets a 403.
//!
//! # Example
//!
//! ```ignore
//! use spotlight_server::{AppState, SidecarServer};
//!
//! let state = AppState::from_config(&config);
//! let server = SidecarServer::new(config.server.clone(), state);
//! server.run(cancel_token).await?;
//! ```

mod config;
mod error;
mod guard;
mod handlers;
mod state;
mod stream;


use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{delete, get, post};
use spotlight_config::ServerConfig;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

pub use config::validator_config;
pub use error::{ApiError, ErrorResponse, ServerError};
pub use state::AppState;

use guard::{cors_layer, origin_guard};
use handlers::{
    clear, envelope_by_id, health_check, ingest, ingest_for_project, list_envelopes,
};
use stream::event_stream;

/// The sidecar HTTP server
#[derive(Debug)]
pub struct SidecarServer {
    config: ServerConfig,
    state: AppState,
}

impl SidecarServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Shared state handed to handlers
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Bind the configured address and serve until cancelled
    pub async fn run(self, cancel: CancellationToken) -> Result<(), ServerError> {
        let bind_addr = self.config.bind_address();

        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|e| ServerError::Bind {
                address: bind_addr.to_string(),
                source: e,
            })?;

        self.serve(listener, cancel).await
    }

    /// Serve on an already bound listener until cancelled
    ///
    /// On cancellation open event streams are ended so in-flight requests
    /// can drain.
    pub async fn serve(
        self,
        listener: TcpListener,
        cancel: CancellationToken,
    ) -> Result<(), ServerError> {
        let address = listener
            .local_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".into());

        tracing::info!(
            address = %address,
            capacity = self.state.buffer.capacity(),
            "sidecar listening"
        );

        let shutdown = self.state.shutdown.clone();
        let app = build_router(self.state, self.config.max_body_size);

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel.cancelled().await;
                shutdown.cancel();
            })
            .await
            .map_err(ServerError::Http);

        tracing::info!(address = %address, "sidecar stopped");

        result
    }
}

/// Build the axum router
///
/// Layers from outermost: request tracing, origin guard, CORS, body limit.
pub fn build_router(state: AppState, max_body_size: usize) -> Router {
    let validator = state.validator.clone();

    Router::new()
        .route("/stream", post(ingest).get(event_stream))
        .route("/api/{project_id}/envelope/", post(ingest_for_project))
        .route("/envelope/{id}", get(envelope_by_id))
        .route("/envelopes", get(list_envelopes))
        .route("/clear", delete(clear))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(cors_layer())
        .layer(middleware::from_fn_with_state(validator, origin_guard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
