//! Database Models
//!
//! Persistent data structures for decisions, trades, position results,
//! wellness entries, AI learnings, and notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Trading decision record in database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DecisionRecord {
    pub id: String,
    pub user_id: String,
    pub asset_symbol: String,
    pub asset_type: String, // "crypto", "stock", "cedear"
    pub decision_type: String, // "BUY", "SELL", "HOLD"
    pub ai_analysis: Option<String>, // JSON string
    pub suggested_amount: f64,
    pub suggested_price: Option<f64>,
    pub stop_loss_price: Option<f64>,
    pub take_profit_price: Option<f64>,
    pub status: String, // "pending", "approved", "rejected", "executed"
    pub decided_at: Option<DateTime<Utc>>,
    pub user_feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-user trading configuration record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TradingConfigRecord {
    pub id: String,
    pub user_id: String,
    pub binance_api_key: Option<String>,
    pub binance_api_secret: Option<String>,
    pub risk_profile: String, // "conservative", "moderate", "aggressive"
    pub max_trade_amount: f64,
    pub stop_loss_percentage: f64,
    pub take_profit_percentage: f64,
    pub auto_execute: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Trade record in database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TradeRecord {
    pub id: String,
    pub user_id: String,
    pub decision_id: Option<String>,
    pub exchange: String,
    pub asset_symbol: String,
    pub trade_type: String, // "BUY" or "SELL"
    pub quantity: f64,
    pub price: f64,
    pub total_amount: f64,
    pub fees: f64,
    pub status: String, // "pending", "executed", "cancelled", "closed"
    pub exchange_order_id: Option<String>,
    pub executed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Position result record in database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TradeResultRecord {
    pub id: String,
    pub trade_id: String,
    pub user_id: String,
    pub entry_price: f64,
    pub exit_price: Option<f64>,
    pub pnl_amount: Option<f64>,
    pub pnl_percentage: Option<f64>,
    pub status: String, // "open", "closed_profit", "closed_loss", "closed_breakeven"
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// Wellness tracking record in database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WellnessRecord {
    pub id: String,
    pub user_id: String,
    pub fasting_hours: f64,
    pub weight: Option<f64>,
    pub mood: i64,
    pub energy: i64,
    pub sleep: i64,
    pub wellness_score: f64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// AI learning record in database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LearningRecord {
    pub id: String,
    pub user_id: String,
    pub learning_type: String, // "success_pattern", "failure_pattern", ...
    pub content: String,       // JSON string
    pub importance_score: f64,
    pub related_decisions: String, // JSON array of decision ids
    pub related_trades: String,    // JSON array of trade ids
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Notification record in database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NotificationRecord {
    pub id: String,
    pub user_id: String,
    pub r#type: String, // "trade_executed", "trade_closed", ...
    pub title: String,
    pub message: String,
    pub data: Option<String>, // JSON string
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Create decision input
#[derive(Debug, Clone)]
pub struct CreateDecision {
    pub id: String,
    pub user_id: String,
    pub asset_symbol: String,
    pub asset_type: String,
    pub decision_type: String,
    pub suggested_amount: f64,
    pub suggested_price: Option<f64>,
    pub stop_loss_price: Option<f64>,
    pub take_profit_price: Option<f64>,
}

/// Create trading config input
#[derive(Debug, Clone)]
pub struct CreateTradingConfig {
    pub id: String,
    pub user_id: String,
    pub binance_api_key: Option<String>,
    pub binance_api_secret: Option<String>,
    pub risk_profile: String,
    pub max_trade_amount: f64,
}

/// Create trade input
#[derive(Debug, Clone)]
pub struct CreateTrade {
    pub id: String,
    pub user_id: String,
    pub decision_id: Option<String>,
    pub exchange: String,
    pub asset_symbol: String,
    pub trade_type: String,
    pub quantity: f64,
    pub price: f64,
    pub total_amount: f64,
    pub fees: f64,
    pub exchange_order_id: Option<String>,
}

/// Create trade result input (position opens as "open")
#[derive(Debug, Clone)]
pub struct CreateTradeResult {
    pub id: String,
    pub trade_id: String,
    pub user_id: String,
    pub entry_price: f64,
}

/// Close position input
///
/// Applied with a conditional update: the row is only written if it is still
/// open, so two concurrent monitor passes cannot both close a position.
#[derive(Debug, Clone)]
pub struct ClosePosition {
    pub exit_price: f64,
    pub pnl_amount: f64,
    pub pnl_percentage: f64,
    pub status: String, // "closed_profit", "closed_loss", "closed_breakeven"
}

/// Create wellness entry input
#[derive(Debug, Clone)]
pub struct CreateWellness {
    pub id: String,
    pub user_id: String,
    pub fasting_hours: f64,
    pub mood: i64,
    pub energy: i64,
    pub sleep: i64,
    pub wellness_score: f64,
}

/// Create AI learning input
#[derive(Debug, Clone)]
pub struct CreateLearning {
    pub id: String,
    pub user_id: String,
    pub learning_type: String,
    pub content: serde_json::Value,
    pub importance_score: f64,
    pub related_decisions: Vec<String>,
    pub related_trades: Vec<String>,
}

/// Create notification input
#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub id: String,
    pub user_id: String,
    pub r#type: String,
    pub title: String,
    pub message: String,
    pub data: Option<serde_json::Value>,
}
