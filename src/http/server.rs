//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, body limit, request ID)
//! - Bind server to listener
//! - Stop accepting on shutdown and drain in-flight requests
//!
//! The body limit and the request deadline are enforced inside the handlers
//! (`DefaultBodyLimit` surfaces as a `JsonRejection`, the deadline as a
//! `Failed` outcome) so every waitlist response keeps the `ActionResult` shape.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::WaitlistConfig;
use crate::http::request::{make_span, propagate_request_id_layer, set_request_id_layer};
use crate::http::waitlist::{health, join_waitlist, list_roles};
use crate::storage::WaitlistStore;
use crate::waitlist::WaitlistService;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<WaitlistService>,
}

/// HTTP server for the waitlist.
pub struct HttpServer {
    router: Router,
    config: WaitlistConfig,
    service: Arc<WaitlistService>,
}

impl HttpServer {
    /// Create a new HTTP server over the given store.
    pub fn new(config: WaitlistConfig, store: Arc<dyn WaitlistStore>) -> Self {
        let deadline = Duration::from_secs(config.timeouts.request_secs);
        let service = Arc::new(
            WaitlistService::new(store, config.rate_limit.clone()).with_deadline(deadline),
        );
        let state = AppState {
            service: service.clone(),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            service,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &WaitlistConfig, state: AppState) -> Router {
        Router::new()
            .route("/api/waitlist", post(join_waitlist))
            .route("/api/roles", get(list_roles))
            .route("/health", get(health))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Shared handle on the submission service (e.g. for policy reloads).
    pub fn service(&self) -> Arc<WaitlistService> {
        self.service.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &WaitlistConfig {
        &self.config
    }
}
