//! Trade Execution Service
//!
//! Turns an approved trading decision into a live exchange order and records
//! the outcome: the executed trade, the open position tracking it, and the
//! decision's transition to executed.
//!
//! Every gate between the stored decision and the exchange is checked here:
//! decision state, decision direction, asset routing, and the presence of the
//! user's API credentials. A failed gate rejects the execution without
//! touching the exchange; once an order fills, persistence errors no longer
//! undo it and are surfaced as database errors instead.

use crate::domain::entities::decision::{AssetType, DecisionStatus, DecisionType};
use crate::domain::errors::{ErrorSeverity, TradeExecutionError};
use crate::domain::repositories::exchange_client::{
    ApiCredentials, ExchangeError, ExchangeProvider,
};
use crate::persistence::models::{CreateTrade, CreateTradeResult, TradeRecord};
use crate::persistence::repository::{
    DecisionRepository, TradeRepository, TradeResultRepository, TradingConfigRepository,
};
use crate::persistence::{DatabaseError, DbPool};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Exchange all executions are routed to
const EXCHANGE: &str = "binance";

/// Errors surfaced by trade execution
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Decision not found: {0}")]
    DecisionNotFound(String),

    #[error("Trading config not found for user: {0}")]
    ConfigNotFound(String),

    /// The execution was refused before or by the exchange
    #[error(transparent)]
    Rejected(#[from] TradeExecutionError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Exchange-side outcome of an execution, echoed back to the caller
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub success: bool,
    pub exchange: String,
    pub order_id: String,
    pub price: f64,
    pub total_amount: f64,
    pub fees: f64,
}

/// Result of executing one decision
#[derive(Debug)]
pub struct ExecutionOutcome {
    pub trade: TradeRecord,
    pub report: ExecutionReport,
}

/// Service that executes approved decisions against the exchange
pub struct ExecutionService {
    decisions: DecisionRepository,
    configs: TradingConfigRepository,
    trades: TradeRepository,
    results: TradeResultRepository,
    exchanges: Arc<dyn ExchangeProvider>,
}

impl ExecutionService {
    pub fn new(pool: DbPool, exchanges: Arc<dyn ExchangeProvider>) -> Self {
        Self {
            decisions: DecisionRepository::new(pool.clone()),
            configs: TradingConfigRepository::new(pool.clone()),
            trades: TradeRepository::new(pool.clone()),
            results: TradeResultRepository::new(pool),
            exchanges,
        }
    }

    /// Execute a decision: place the order, persist the trade and open its
    /// position, then move the decision to executed.
    pub async fn execute(&self, decision_id: &str) -> Result<ExecutionOutcome, ExecutionError> {
        let decision = self
            .decisions
            .get(decision_id)
            .await?
            .ok_or_else(|| ExecutionError::DecisionNotFound(decision_id.to_string()))?;

        let config = self
            .configs
            .get_for_user(&decision.user_id)
            .await?
            .ok_or_else(|| ExecutionError::ConfigNotFound(decision.user_id.clone()))?;

        // decision must still be executable
        let executable = DecisionStatus::parse(&decision.status)
            .map(|s| s.can_execute())
            .unwrap_or(false);
        if !executable {
            return Err(self.reject(TradeExecutionError::DecisionNotExecutable {
                status: decision.status.clone(),
            }));
        }

        // decision direction maps to an order side; HOLD has none
        let decision_type = DecisionType::parse(&decision.decision_type).ok_or_else(|| {
            self.reject(TradeExecutionError::UnknownDecisionType {
                value: decision.decision_type.clone(),
            })
        })?;
        let side = decision_type
            .to_side()
            .ok_or_else(|| self.reject(TradeExecutionError::HoldDecision))?;

        // only crypto assets have an execution route
        let is_crypto = AssetType::parse(&decision.asset_type)
            .map(|t| t.is_crypto())
            .unwrap_or(false);
        if !is_crypto {
            return Err(self.reject(TradeExecutionError::UnsupportedAsset {
                asset_type: decision.asset_type.clone(),
            }));
        }

        let credentials = match (&config.binance_api_key, &config.binance_api_secret) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => {
                ApiCredentials::new(key, secret)
            }
            _ => {
                return Err(self.reject(TradeExecutionError::MissingCredentials {
                    exchange: EXCHANGE.to_string(),
                }))
            }
        };

        let client = self
            .exchanges
            .authenticated(EXCHANGE, credentials)
            .map_err(|e| self.reject(map_exchange_error(e)))?;

        // limit order when the decision carries a price, market order otherwise
        let quantity = decision.suggested_amount;
        let fill = match decision.suggested_price {
            Some(price) => {
                client
                    .place_limit_order(&decision.asset_symbol, side, quantity, price)
                    .await
            }
            None => {
                client
                    .place_market_order(&decision.asset_symbol, side, quantity)
                    .await
            }
        }
        .map_err(|e| self.reject(map_exchange_error(e)))?;

        info!(
            "Order {} filled on {}: {} {} {} at {}",
            fill.order_id, EXCHANGE, side, quantity, decision.asset_symbol, fill.price
        );

        let trade = self
            .trades
            .create(CreateTrade {
                id: Uuid::new_v4().to_string(),
                user_id: decision.user_id.clone(),
                decision_id: Some(decision.id.clone()),
                exchange: EXCHANGE.to_string(),
                asset_symbol: decision.asset_symbol.clone(),
                trade_type: side.as_str().to_string(),
                quantity,
                price: fill.price,
                total_amount: fill.total_amount,
                fees: fill.fees,
                exchange_order_id: Some(fill.order_id.clone()),
            })
            .await?;

        self.results
            .create(CreateTradeResult {
                id: Uuid::new_v4().to_string(),
                trade_id: trade.id.clone(),
                user_id: decision.user_id.clone(),
                entry_price: fill.price,
            })
            .await?;

        // conditional transition: losing this race means another request
        // already executed the decision, the trade above still stands
        if !self.decisions.mark_executed(&decision.id).await? {
            warn!(
                "Decision {} left executable state during execution",
                decision.id
            );
        }

        info!("Executed trade {} for decision {}", trade.id, decision.id);

        let report = ExecutionReport {
            success: true,
            exchange: EXCHANGE.to_string(),
            order_id: fill.order_id,
            price: fill.price,
            total_amount: fill.total_amount,
            fees: fill.fees,
        };
        Ok(ExecutionOutcome { trade, report })
    }

    /// Log a rejection at its severity and wrap it
    fn reject(&self, err: TradeExecutionError) -> ExecutionError {
        match err.severity() {
            ErrorSeverity::Minor => info!("Trade rejected [{}]: {}", err.error_code(), err),
            ErrorSeverity::Moderate => warn!("Trade rejected [{}]: {}", err.error_code(), err),
            ErrorSeverity::Critical => error!("Trade rejected [{}]: {}", err.error_code(), err),
        }
        ExecutionError::Rejected(err)
    }
}

/// Map transport-level exchange errors onto execution rejections
fn map_exchange_error(err: ExchangeError) -> TradeExecutionError {
    match err {
        ExchangeError::MissingCredentials => TradeExecutionError::MissingCredentials {
            exchange: EXCHANGE.to_string(),
        },
        ExchangeError::UnsupportedExchange(exchange) => {
            TradeExecutionError::UnsupportedExchange { exchange }
        }
        ExchangeError::InvalidOrder(reason) => TradeExecutionError::InvalidOrder { reason },
        other => TradeExecutionError::OrderRejected {
            reason: other.to_string(),
        },
    }
}
