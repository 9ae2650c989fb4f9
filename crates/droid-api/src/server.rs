//! HTTP API Server
//!
//! Starts and manages the axum-based HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{middleware, Router};
use droid_core::Orchestrator;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::middleware::auth::auth_middleware;
use crate::routes::{api_routes, public_routes};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Mutex<Orchestrator>>,
    /// Bearer token required on `/api/*` when set
    pub api_key: Option<String>,
}

impl AppState {
    pub fn new(orchestrator: Arc<Mutex<Orchestrator>>, api_key: Option<String>) -> Self {
        Self {
            orchestrator,
            api_key,
        }
    }
}

/// Build the application router
pub fn app(state: AppState) -> Router {
    let protected = api_routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        auth_middleware,
    ));

    Router::new()
        .merge(public_routes())
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the API until `shutdown` resolves
pub async fn start_server(
    port: u16,
    state: AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, auth = state.api_key.is_some(), "HTTP API listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
