//! POST /analyze-trading-signal

use crate::application::handlers::{require_decision_id, ApiError, AppState, DecisionRequest};
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

/// Response for a completed analysis
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub decision_id: String,
    pub analysis: serde_json::Value,
}

/// Analyze a stored trading decision with market, wellness and AI context
pub async fn analyze_trading_signal(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let decision_id = require_decision_id(&request)?;
    let outcome = state.analysis.analyze(decision_id).await?;

    Ok(Json(AnalyzeResponse {
        success: true,
        decision_id: outcome.decision_id,
        analysis: outcome.analysis,
    }))
}
