//! HTTP Handlers
//!
//! Axum endpoints for the trading decision API. Each endpoint wraps one
//! application service and translates its errors into the JSON error shape
//! clients expect: `{"error": ...}` with an HTTP status, plus a `details`
//! field when an execution was rejected.

pub mod analyze;
pub mod execute;
pub mod monitor;

use crate::application::services::analysis_service::{AnalysisError, AnalysisService};
use crate::application::services::execution_service::{ExecutionError, ExecutionService};
use crate::application::services::monitor_service::MonitorService;
use crate::persistence::{DatabaseError, DbPool};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, warn};

/// Shared state handed to every handler
pub struct AppState {
    pub pool: DbPool,
    pub analysis: AnalysisService,
    pub execution: ExecutionService,
    pub monitor: MonitorService,
}

/// Build the API router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/analyze-trading-signal", post(analyze::analyze_trading_signal))
        .route("/execute-trade", post(execute::execute_trade))
        .route("/monitor-positions", post(monitor::monitor_positions))
        .with_state(state)
}

/// Body shared by the decision endpoints
#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    #[serde(default)]
    pub decision_id: Option<String>,
}

/// Reject requests without a usable decision id before touching the store
pub(crate) fn require_decision_id(request: &DecisionRequest) -> Result<&str, ApiError> {
    match request.decision_id.as_deref() {
        Some(id) if !id.trim().is_empty() => Ok(id),
        _ => Err(ApiError::BadRequest("decision_id is required".to_string())),
    }
}

/// API-level errors with their HTTP mapping
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    /// Execution was refused; the reason travels in a `details` field
    ExecutionFailed(String),
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            ApiError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": msg }))).into_response()
            }
            ApiError::ExecutionFailed(reason) => {
                let body = Json(json!({
                    "error": "Trade execution failed",
                    "details": { "success": false, "error": reason },
                }));
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            ApiError::InternalServerError(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": msg }))).into_response()
            }
        }
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::DecisionNotFound(_) => {
                ApiError::NotFound("Decision not found".to_string())
            }
            AnalysisError::ConfigNotFound(_) => {
                ApiError::NotFound("Trading config not found".to_string())
            }
            other => ApiError::InternalServerError(other.to_string()),
        }
    }
}

impl From<ExecutionError> for ApiError {
    fn from(err: ExecutionError) -> Self {
        match err {
            ExecutionError::DecisionNotFound(_) => {
                ApiError::NotFound("Decision not found".to_string())
            }
            ExecutionError::ConfigNotFound(_) => {
                ApiError::NotFound("Trading config not found".to_string())
            }
            ExecutionError::Rejected(e) => ApiError::ExecutionFailed(e.to_string()),
            ExecutionError::Database(e) => ApiError::InternalServerError(e.to_string()),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        ApiError::InternalServerError(err.to_string())
    }
}

/// Health check endpoint
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> Json<HashMap<String, serde_json::Value>> {
    let database = match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => json!("connected"),
        Err(e) => {
            warn!("Health check database ping failed: {}", e);
            json!("error")
        }
    };

    let mut response = HashMap::new();
    response.insert("status".to_string(), json!("running"));
    response.insert("database".to_string(), database);
    response.insert("ai_model".to_string(), json!(state.analysis.model_name()));
    Json(response)
}
