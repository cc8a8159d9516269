//! POST /execute-trade

use crate::application::handlers::{require_decision_id, ApiError, AppState, DecisionRequest};
use crate::application::services::execution_service::ExecutionReport;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

/// Response for an executed trade
#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    pub success: bool,
    pub trade_id: String,
    pub trade_result: ExecutionReport,
}

/// Execute an approved trading decision on the exchange
pub async fn execute_trade(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    let decision_id = require_decision_id(&request)?;
    let outcome = state.execution.execute(decision_id).await?;

    Ok(Json(ExecuteResponse {
        success: true,
        trade_id: outcome.trade.id,
        trade_result: outcome.report,
    }))
}
