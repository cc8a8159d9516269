//! Learning recorder - derives the AI learning record written whenever a
//! position is closed.
//!
//! The derivation is pure: it classifies the outcome, scores how much the
//! trade should influence future analysis, and packages the numbers the
//! model will want to see again. Persistence happens in the caller.

use crate::domain::entities::learning::LearningType;
use serde_json::json;

/// Closed-trade facts needed to derive a learning record.
#[derive(Debug, Clone)]
pub struct ClosedTrade<'a> {
    pub user_id: &'a str,
    pub decision_id: Option<&'a str>,
    pub trade_id: &'a str,
    pub asset_symbol: &'a str,
    pub trade_type: &'a str,
    pub entry_price: f64,
    pub exit_price: f64,
    pub pnl_percentage: f64,
    /// Decision type of the originating decision, if the trade has one
    pub decision_type: Option<&'a str>,
    /// Stored analysis JSON of the originating decision, if any
    pub ai_analysis: Option<&'a str>,
}

/// Learning record ready to persist.
#[derive(Debug, Clone)]
pub struct LearningDraft {
    pub user_id: String,
    pub learning_type: LearningType,
    pub content: serde_json::Value,
    pub importance_score: f64,
    pub related_decisions: Vec<String>,
    pub related_trades: Vec<String>,
}

/// Importance of a closed trade on a 0-100 scale.
///
/// Ten points per percent of P&L magnitude, saturating at 100: a +3% exit
/// scores 30, anything at or beyond +/-10% scores the maximum.
pub fn importance_score(pnl_percentage: f64) -> f64 {
    (pnl_percentage.abs() * 10.0).min(100.0)
}

/// Derive the learning record for a closed trade.
pub fn derive(closed: &ClosedTrade<'_>) -> LearningDraft {
    // the stored analysis is JSON text; embed it as structure, not a string
    let ai_analysis = match closed.ai_analysis {
        Some(raw) => serde_json::from_str(raw).unwrap_or_else(|_| json!(raw)),
        None => serde_json::Value::Null,
    };

    LearningDraft {
        user_id: closed.user_id.to_string(),
        learning_type: LearningType::classify(closed.pnl_percentage),
        content: json!({
            "asset_symbol": closed.asset_symbol,
            "trade_type": closed.trade_type,
            "entry_price": closed.entry_price,
            "exit_price": closed.exit_price,
            "pnl_percentage": closed.pnl_percentage,
            "decision_type": closed.decision_type,
            "ai_analysis": ai_analysis,
        }),
        importance_score: importance_score(closed.pnl_percentage),
        related_decisions: closed
            .decision_id
            .map(|id| vec![id.to_string()])
            .unwrap_or_default(),
        related_trades: vec![closed.trade_id.to_string()],
    }
}
