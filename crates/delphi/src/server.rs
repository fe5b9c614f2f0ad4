//! HTTP API
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `GET /` | Liveness check |
//! | `POST /research` | Schedule a research task, answer `202` immediately |
//! | `GET /research/:task_id` | Read a task's status and results |

use crate::error::Result;
use crate::models::{ResearchRequest, TaskResponse};
use crate::tasks::TaskRecord;
use crate::workflow::ResearchWorkflow;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

/// Shared handler state
#[derive(Clone)]
pub struct ApiState {
    pub workflow: ResearchWorkflow,
}

impl ApiState {
    pub fn new(workflow: ResearchWorkflow) -> Self {
        Self { workflow }
    }
}

async fn root() -> Json<Value> {
    Json(json!({ "status": "Delphi is online." }))
}

async fn start_research(
    State(state): State<ApiState>,
    Json(request): Json<ResearchRequest>,
) -> (StatusCode, Json<TaskResponse>) {
    info!(ticker = %request.ticker, "Received research request");

    let response = state.workflow.submit(request.into()).await;
    (StatusCode::ACCEPTED, Json(response))
}

async fn get_research(
    State(state): State<ApiState>,
    Path(task_id): Path<String>,
) -> std::result::Result<Json<TaskRecord>, (StatusCode, Json<Value>)> {
    let not_found = || {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": format!("Task {task_id} not found") })),
        )
    };

    let id = Uuid::parse_str(&task_id).map_err(|_| not_found())?;
    let record = state.workflow.tasks().get(id).await.ok_or_else(not_found)?;

    Ok(Json(record))
}

/// Build the API router
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/research", post(start_research))
        .route("/research/:task_id", get(get_research))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind `addr` and serve the API until the process exits
pub async fn serve(state: ApiState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Delphi API listening");

    axum::serve(listener, router(state)).await?;
    Ok(())
}
