//! Route definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{
    create_agent, create_crew, create_task, health, list_agents, list_crews, list_tasks,
    list_tools, memory, run_crew,
};
use crate::server::AppState;

/// Routes reachable without authentication
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// Routes behind the API key when one is configured
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tools", get(list_tools))
        .route("/api/agents", get(list_agents).post(create_agent))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/crews", get(list_crews).post(create_crew))
        .route("/api/crews/{name}/run", post(run_crew))
        .route("/api/memory", get(memory))
}
