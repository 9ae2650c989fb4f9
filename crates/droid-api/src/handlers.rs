//! HTTP API handlers
//!
//! Definitions are created through the orchestrator, so the same
//! validation applies as for configuration-defined entities.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use droid_core::{
    AgentSpec, CrewInputs, CrewRunResult, CrewSpec, Memory, MemoryFilter, TaskSpec,
    ToolDefinition,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::server::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

/// JSON body whose rejection is turned into an [`ApiError`](crate::ApiError)
type Payload<T> = std::result::Result<Json<T>, JsonRejection>;

/// Crew run request payload
#[derive(Debug, Default, Deserialize)]
pub struct RunRequest {
    #[serde(default)]
    pub inputs: CrewInputs,
}

/// Memory query parameters
#[derive(Debug, Default, Deserialize)]
pub struct MemoryQuery {
    pub category: Option<String>,
    pub key: Option<String>,
    pub text: Option<String>,
    pub limit: Option<usize>,
}

impl From<MemoryQuery> for MemoryFilter {
    fn from(query: MemoryQuery) -> Self {
        MemoryFilter {
            category: query.category,
            key: query.key,
            text: query.text,
            limit: Some(query.limit.unwrap_or(50)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

// ============================================================================
// Handler functions
// ============================================================================

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn list_tools(State(state): State<AppState>) -> Json<Vec<ToolDefinition>> {
    let orchestrator = state.orchestrator.lock().await;
    Json(orchestrator.tools().definitions())
}

pub async fn list_agents(State(state): State<AppState>) -> Json<Vec<AgentSpec>> {
    let orchestrator = state.orchestrator.lock().await;
    let agents = orchestrator
        .list_agents()
        .iter()
        .filter_map(|name| orchestrator.get_agent(name).cloned())
        .collect();
    Json(agents)
}

pub async fn create_agent(
    State(state): State<AppState>,
    payload: Payload<AgentSpec>,
) -> Result<(StatusCode, Json<AgentSpec>)> {
    let Json(agent) = payload?;
    debug!(agent = %agent.name, "Create agent request");
    state
        .orchestrator
        .lock()
        .await
        .create_agent(agent.clone())?;
    Ok((StatusCode::CREATED, Json(agent)))
}

pub async fn list_tasks(State(state): State<AppState>) -> Json<Vec<TaskSpec>> {
    let orchestrator = state.orchestrator.lock().await;
    let tasks = orchestrator
        .list_tasks()
        .iter()
        .filter_map(|name| orchestrator.get_task(name).cloned())
        .collect();
    Json(tasks)
}

pub async fn create_task(
    State(state): State<AppState>,
    payload: Payload<TaskSpec>,
) -> Result<(StatusCode, Json<TaskSpec>)> {
    let Json(task) = payload?;
    debug!(task = %task.name, "Create task request");
    state.orchestrator.lock().await.create_task(task.clone())?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn list_crews(State(state): State<AppState>) -> Json<Vec<CrewSpec>> {
    let orchestrator = state.orchestrator.lock().await;
    let crews = orchestrator
        .list_crews()
        .iter()
        .filter_map(|name| orchestrator.get_crew(name).cloned())
        .collect();
    Json(crews)
}

pub async fn create_crew(
    State(state): State<AppState>,
    payload: Payload<CrewSpec>,
) -> Result<(StatusCode, Json<CrewSpec>)> {
    let Json(crew) = payload?;
    debug!(crew = %crew.name, "Create crew request");
    state.orchestrator.lock().await.create_crew(crew.clone())?;
    Ok((StatusCode::CREATED, Json(crew)))
}

/// Run a crew; a failed run is still reported with 200 and `success: false`
pub async fn run_crew(
    State(state): State<AppState>,
    Path(name): Path<String>,
    payload: Payload<RunRequest>,
) -> Result<Json<CrewRunResult>> {
    let Json(request) = payload?;
    info!(crew = %name, inputs = request.inputs.len(), "Run crew request");
    let orchestrator = state.orchestrator.lock().await;
    let result = orchestrator.run_crew(&name, &request.inputs).await?;
    Ok(Json(result))
}

/// Recent memory records, newest first; empty when no store is attached
pub async fn memory(
    State(state): State<AppState>,
    query: std::result::Result<Query<MemoryQuery>, QueryRejection>,
) -> Result<Json<Vec<Memory>>> {
    let Query(query) = query?;
    let orchestrator = state.orchestrator.lock().await;
    let Some(store) = orchestrator.memory() else {
        return Ok(Json(Vec::new()));
    };

    let records = store.query(&MemoryFilter::from(query))?;
    Ok(Json(records))
}
