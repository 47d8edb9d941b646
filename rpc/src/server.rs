//! Axum-based HTTP server.

use std::future::Future;
use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use gatewatch_access::{AuditHistory, PresenceResolver, VerificationEngine};
use tower_http::cors::CorsLayer;

use crate::error::RpcError;
use crate::handlers;
use crate::metrics::ScanMetrics;

/// Everything a handler needs, shared behind an `Arc`.
pub struct AppState {
    pub engine: Arc<VerificationEngine>,
    pub presence: PresenceResolver,
    pub history: AuditHistory,
    pub metrics: Arc<ScanMetrics>,
}

#[derive(Clone, Copy, Debug)]
pub struct ServerOptions {
    pub enable_cors: bool,
    pub enable_metrics: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            enable_cors: true,
            enable_metrics: false,
        }
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>, options: ServerOptions) -> Router {
    let mut app = Router::new()
        .route("/api/verify/scan", post(handlers::scan))
        .route(
            "/api/locations",
            post(handlers::create_location).get(handlers::list_locations),
        )
        .route("/api/locations/assign", post(handlers::assign_operator))
        .route("/api/locations/breaches", get(handlers::breach_logs))
        .route("/api/locations/:id/security", delete(handlers::unassign_operator))
        .route("/api/locations/:id/logs", get(handlers::location_logs))
        .route("/api/persons/:id/presence", get(handlers::person_presence))
        .route("/api/persons/:id/logs", get(handlers::person_logs));

    if options.enable_metrics {
        app = app.route("/metrics", get(handlers::metrics));
    }

    let app = app.with_state(state);
    if options.enable_cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

pub struct RpcServer {
    pub bind_address: String,
    pub port: u16,
    pub state: Arc<AppState>,
    pub options: ServerOptions,
}

impl RpcServer {
    pub fn new(bind_address: impl Into<String>, port: u16, state: Arc<AppState>) -> Self {
        Self {
            bind_address: bind_address.into(),
            port,
            state,
            options: ServerOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ServerOptions) -> Self {
        self.options = options;
        self
    }

    /// Serve until `shutdown` resolves, then finish in-flight requests.
    pub async fn start<F>(&self, shutdown: F) -> Result<(), RpcError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(self.state.clone(), self.options);
        let addr = format!("{}:{}", self.bind_address, self.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| RpcError::Server(format!("bind {addr}: {e}")))?;
        tracing::info!(
            %addr,
            cors = self.options.enable_cors,
            metrics = self.options.enable_metrics,
            "HTTP server listening"
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))?;
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
