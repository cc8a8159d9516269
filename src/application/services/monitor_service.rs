//! Position Monitor Service
//!
//! Periodically walks every open position, reprices it against the live
//! market, and closes the ones that crossed an exit threshold. Closing a
//! position fans out into the full exit bookkeeping: the position row gets
//! its exit data, the trade leaves the executed state, a learning record
//! captures the outcome, and the user is notified.
//!
//! A pass is resilient by design. Positions whose price source is down are
//! skipped and picked up on the next pass; positions with corrupt data are
//! reported as failures without stopping the walk; and the close itself is a
//! conditional update, so overlapping passes agree on a single winner and the
//! exit bookkeeping runs exactly once per position.

use crate::domain::entities::learning::NotificationType;
use crate::domain::entities::trade_result::ResultStatus;
use crate::domain::errors::ValidationError;
use crate::domain::repositories::exchange_client::ExchangeProvider;
use crate::domain::services::exit_policy::{ExitPolicy, ExitSignal};
use crate::domain::services::learning_recorder::{self, ClosedTrade};
use crate::domain::value_objects::pnl::Pnl;
use crate::persistence::models::{
    ClosePosition, CreateLearning, CreateNotification, TradeRecord, TradeResultRecord,
};
use crate::persistence::repository::{
    DecisionRepository, LearningRepository, NotificationRepository, TradeRepository,
    TradeResultRepository,
};
use crate::persistence::{DatabaseError, DbPool};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Counters for one monitoring pass
#[derive(Debug, Clone, Serialize)]
pub struct MonitorSummary {
    /// Trades in executed state at the start of the pass
    pub monitored_trades: usize,
    /// Positions closed by this pass
    pub closed_positions: usize,
    /// Positions left open because price data was unavailable or another
    /// pass closed them first
    pub skipped: usize,
    /// Per-position failures that did not stop the pass
    pub failures: Vec<String>,
}

/// What happened to one position during a pass
enum PositionOutcome {
    Held,
    Closed,
    Skipped,
}

/// Failure checking a single position; never aborts the pass
#[derive(Debug, Error)]
enum MonitorFailure {
    #[error("invalid position data: {0}")]
    Data(#[from] ValidationError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Service that reprices open positions and applies the exit policy
pub struct MonitorService {
    decisions: DecisionRepository,
    trades: TradeRepository,
    results: TradeResultRepository,
    learnings: LearningRepository,
    notifications: NotificationRepository,
    exchanges: Arc<dyn ExchangeProvider>,
    policy: ExitPolicy,
}

impl MonitorService {
    pub fn new(pool: DbPool, exchanges: Arc<dyn ExchangeProvider>, policy: ExitPolicy) -> Self {
        Self {
            decisions: DecisionRepository::new(pool.clone()),
            trades: TradeRepository::new(pool.clone()),
            results: TradeResultRepository::new(pool.clone()),
            learnings: LearningRepository::new(pool.clone()),
            notifications: NotificationRepository::new(pool),
            exchanges,
            policy,
        }
    }

    /// Run one monitoring pass over all executed trades.
    ///
    /// Only the initial trade listing can fail the pass; everything after
    /// that is isolated per position.
    pub async fn run_pass(&self) -> Result<MonitorSummary, DatabaseError> {
        let open_trades = self.trades.get_executed().await?;
        let mut summary = MonitorSummary {
            monitored_trades: open_trades.len(),
            closed_positions: 0,
            skipped: 0,
            failures: Vec::new(),
        };

        for trade in &open_trades {
            let positions = match self.results.get_open_for_trade(&trade.id).await {
                Ok(positions) => positions,
                Err(e) => {
                    warn!("Failed to load positions for trade {}: {}", trade.id, e);
                    summary.failures.push(format!("trade {}: {}", trade.id, e));
                    continue;
                }
            };

            for position in positions {
                match self.check_position(trade, &position).await {
                    Ok(PositionOutcome::Closed) => summary.closed_positions += 1,
                    Ok(PositionOutcome::Skipped) => summary.skipped += 1,
                    Ok(PositionOutcome::Held) => {}
                    Err(e) => {
                        warn!("Check failed for position {}: {}", position.id, e);
                        summary.failures.push(format!("position {}: {}", position.id, e));
                    }
                }
            }
        }

        info!(
            "Monitor pass: {} trades, {} closed, {} skipped, {} failures",
            summary.monitored_trades,
            summary.closed_positions,
            summary.skipped,
            summary.failures.len()
        );
        Ok(summary)
    }

    /// Reprice one position and close it if an exit threshold was crossed
    async fn check_position(
        &self,
        trade: &TradeRecord,
        position: &TradeResultRecord,
    ) -> Result<PositionOutcome, MonitorFailure> {
        let Some(client) = self.exchanges.market_data(&trade.exchange) else {
            debug!(
                "No market data client for {}, skipping trade {}",
                trade.exchange, trade.id
            );
            return Ok(PositionOutcome::Skipped);
        };

        // a missing price is transient, the next pass retries
        let ticker = match client.fetch_ticker(&trade.asset_symbol).await {
            Ok(ticker) => ticker,
            Err(e) => {
                debug!(
                    "Price unavailable for {} on {}: {}",
                    trade.asset_symbol, trade.exchange, e
                );
                return Ok(PositionOutcome::Skipped);
            }
        };

        let pnl = Pnl::from_prices(position.entry_price, ticker.last_price, trade.quantity)?;

        let signal = self.policy.evaluate(pnl.percentage());
        if !signal.is_exit() {
            return Ok(PositionOutcome::Held);
        }

        self.close_position(trade, position, ticker.last_price, pnl, signal)
            .await
    }

    /// Close a position and run the exit bookkeeping.
    ///
    /// The conditional close decides the winner under concurrency; only the
    /// winner closes the trade, records the learning and notifies the user.
    async fn close_position(
        &self,
        trade: &TradeRecord,
        position: &TradeResultRecord,
        exit_price: f64,
        pnl: Pnl,
        signal: ExitSignal,
    ) -> Result<PositionOutcome, MonitorFailure> {
        let status = ResultStatus::classify(pnl.percentage());
        let closed = self
            .results
            .close(
                &position.id,
                ClosePosition {
                    exit_price,
                    pnl_amount: pnl.amount(),
                    pnl_percentage: pnl.percentage(),
                    status: status.as_str().to_string(),
                },
            )
            .await?;
        if !closed {
            debug!("Position {} already closed by another pass", position.id);
            return Ok(PositionOutcome::Skipped);
        }

        if !self.trades.close(&trade.id).await? {
            warn!("Trade {} left executed state before close", trade.id);
        }

        let reason = signal.reason().unwrap_or("exit");
        info!(
            "Closed position {} on {} ({}): {}",
            position.id, trade.asset_symbol, reason, pnl
        );

        // learning and notification must not undo the close
        let decision = match trade.decision_id.as_deref() {
            Some(id) => self.decisions.get(id).await.unwrap_or_else(|e| {
                warn!("Failed to load decision {} for learning: {}", id, e);
                None
            }),
            None => None,
        };
        let draft = learning_recorder::derive(&ClosedTrade {
            user_id: &trade.user_id,
            decision_id: trade.decision_id.as_deref(),
            trade_id: &trade.id,
            asset_symbol: &trade.asset_symbol,
            trade_type: &trade.trade_type,
            entry_price: position.entry_price,
            exit_price,
            pnl_percentage: pnl.percentage(),
            decision_type: decision.as_ref().map(|d| d.decision_type.as_str()),
            ai_analysis: decision.as_ref().and_then(|d| d.ai_analysis.as_deref()),
        });
        if let Err(e) = self
            .learnings
            .create(CreateLearning {
                id: Uuid::new_v4().to_string(),
                user_id: draft.user_id,
                learning_type: draft.learning_type.as_str().to_string(),
                content: draft.content,
                importance_score: draft.importance_score,
                related_decisions: draft.related_decisions,
                related_trades: draft.related_trades,
            })
            .await
        {
            warn!("Failed to record learning for position {}: {}", position.id, e);
        }

        if let Err(e) = self
            .notifications
            .create(CreateNotification {
                id: Uuid::new_v4().to_string(),
                user_id: trade.user_id.clone(),
                r#type: NotificationType::TradeClosed.as_str().to_string(),
                title: "Position closed".to_string(),
                message: format!(
                    "{} closed at {:.8} ({}): {:+.2}%",
                    trade.asset_symbol,
                    exit_price,
                    reason,
                    pnl.percentage()
                ),
                data: Some(json!({
                    "trade_id": trade.id,
                    "trade_result_id": position.id,
                    "exit_price": exit_price,
                    "pnl_amount": pnl.amount(),
                    "pnl_percentage": pnl.percentage(),
                    "reason": reason,
                })),
            })
            .await
        {
            warn!("Failed to notify close of position {}: {}", position.id, e);
        }

        Ok(PositionOutcome::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::trade::TradeSide;
    use crate::domain::repositories::exchange_client::{
        ApiCredentials, ExchangeClient, ExchangeError, ExchangeResult, OrderFill, Ticker,
    };
    use crate::persistence::init_database;
    use crate::persistence::models::{CreateDecision, CreateTrade, CreateTradeResult};
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Market data stub serving fixed prices per symbol
    struct StaticPrices {
        prices: HashMap<String, f64>,
    }

    impl StaticPrices {
        fn with(prices: &[(&str, f64)]) -> Arc<Self> {
            Arc::new(Self {
                prices: prices
                    .iter()
                    .map(|(s, p)| (s.to_string(), *p))
                    .collect(),
            })
        }
    }

    #[async_trait]
    impl ExchangeClient for StaticPrices {
        fn name(&self) -> &str {
            "binance"
        }

        async fn fetch_ticker(&self, symbol: &str) -> ExchangeResult<Ticker> {
            let price = self
                .prices
                .get(symbol)
                .copied()
                .ok_or_else(|| ExchangeError::NetworkError(format!("no price for {}", symbol)))?;
            Ok(Ticker {
                last_price: price,
                percent_change: 0.0,
                quote_volume: 0.0,
                high: price,
                low: price,
            })
        }

        async fn place_market_order(
            &self,
            _symbol: &str,
            _side: TradeSide,
            _quantity: f64,
        ) -> ExchangeResult<OrderFill> {
            Err(ExchangeError::MissingCredentials)
        }

        async fn place_limit_order(
            &self,
            _symbol: &str,
            _side: TradeSide,
            _quantity: f64,
            _price: f64,
        ) -> ExchangeResult<OrderFill> {
            Err(ExchangeError::MissingCredentials)
        }
    }

    struct StubProvider {
        client: Arc<StaticPrices>,
    }

    impl ExchangeProvider for StubProvider {
        fn market_data(&self, exchange: &str) -> Option<Arc<dyn ExchangeClient>> {
            (exchange == "binance").then(|| self.client.clone() as Arc<dyn ExchangeClient>)
        }

        fn authenticated(
            &self,
            exchange: &str,
            _credentials: ApiCredentials,
        ) -> ExchangeResult<Arc<dyn ExchangeClient>> {
            Err(ExchangeError::UnsupportedExchange(exchange.to_string()))
        }
    }

    fn monitor(pool: DbPool, prices: Arc<StaticPrices>) -> MonitorService {
        MonitorService::new(
            pool,
            Arc::new(StubProvider { client: prices }),
            ExitPolicy::default(),
        )
    }

    async fn seed_position(
        pool: &DbPool,
        trade_id: &str,
        symbol: &str,
        entry_price: f64,
        quantity: f64,
    ) {
        seed_position_on(pool, trade_id, "binance", symbol, entry_price, quantity).await;
    }

    async fn seed_position_on(
        pool: &DbPool,
        trade_id: &str,
        exchange: &str,
        symbol: &str,
        entry_price: f64,
        quantity: f64,
    ) {
        TradeRepository::new(pool.clone())
            .create(CreateTrade {
                id: trade_id.to_string(),
                user_id: "user-1".to_string(),
                decision_id: None,
                exchange: exchange.to_string(),
                asset_symbol: symbol.to_string(),
                trade_type: "BUY".to_string(),
                quantity,
                price: entry_price,
                total_amount: entry_price * quantity,
                fees: 0.0,
                exchange_order_id: None,
            })
            .await
            .unwrap();
        TradeResultRepository::new(pool.clone())
            .create(CreateTradeResult {
                id: format!("{}-pos", trade_id),
                trade_id: trade_id.to_string(),
                user_id: "user-1".to_string(),
                entry_price,
            })
            .await
            .unwrap();
    }

    async fn seed_decision_with_analysis(pool: &DbPool, id: &str, symbol: &str) {
        let repo = DecisionRepository::new(pool.clone());
        repo.create(CreateDecision {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            asset_symbol: symbol.to_string(),
            asset_type: "crypto".to_string(),
            decision_type: "BUY".to_string(),
            suggested_amount: 500.0,
            suggested_price: None,
            stop_loss_price: None,
            take_profit_price: None,
        })
        .await
        .unwrap();
        repo.record_analysis(id, &json!({"analysis": "momentum is strong"}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_take_profit_closes_position() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        seed_position(&pool, "trade-1", "BTCUSDT", 50000.0, 0.01).await;
        // +12% crosses the +10% take profit
        let service = monitor(pool.clone(), StaticPrices::with(&[("BTCUSDT", 56000.0)]));

        let summary = service.run_pass().await.unwrap();
        assert_eq!(summary.monitored_trades, 1);
        assert_eq!(summary.closed_positions, 1);
        assert!(summary.failures.is_empty());

        let position = TradeResultRepository::new(pool.clone())
            .get("trade-1-pos")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(position.status, "closed_profit");
        assert_eq!(position.exit_price, Some(56000.0));
        assert_eq!(position.pnl_percentage, Some(12.0));
        assert_eq!(position.pnl_amount, Some(60.0));
        assert!(position.closed_at.is_some());

        let trade = TradeRepository::new(pool.clone())
            .get("trade-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(trade.status, "closed");

        // exit bookkeeping: learning and notification for the user
        let learnings = LearningRepository::new(pool.clone())
            .get_recent_for_user("user-1", 10)
            .await
            .unwrap();
        assert_eq!(learnings.len(), 1);
        assert_eq!(learnings[0].learning_type, "success_pattern");
        assert_eq!(learnings[0].importance_score, 100.0); // 12% * 10 capped

        // no originating decision, so the decision context stays null
        let content: serde_json::Value = serde_json::from_str(&learnings[0].content).unwrap();
        assert!(content["decision_type"].is_null());
        assert!(content["ai_analysis"].is_null());

        let notifications = NotificationRepository::new(pool)
            .get_for_user("user-1", 10)
            .await
            .unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].r#type, "trade_closed");
    }

    #[tokio::test]
    async fn test_learning_content_carries_decision_context() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        seed_decision_with_analysis(&pool, "dec-1", "BTCUSDT").await;
        TradeRepository::new(pool.clone())
            .create(CreateTrade {
                id: "trade-1".to_string(),
                user_id: "user-1".to_string(),
                decision_id: Some("dec-1".to_string()),
                exchange: "binance".to_string(),
                asset_symbol: "BTCUSDT".to_string(),
                trade_type: "BUY".to_string(),
                quantity: 0.01,
                price: 50000.0,
                total_amount: 500.0,
                fees: 0.0,
                exchange_order_id: None,
            })
            .await
            .unwrap();
        TradeResultRepository::new(pool.clone())
            .create(CreateTradeResult {
                id: "trade-1-pos".to_string(),
                trade_id: "trade-1".to_string(),
                user_id: "user-1".to_string(),
                entry_price: 50000.0,
            })
            .await
            .unwrap();

        let service = monitor(pool.clone(), StaticPrices::with(&[("BTCUSDT", 56000.0)]));
        let summary = service.run_pass().await.unwrap();
        assert_eq!(summary.closed_positions, 1);

        // the learning carries the decision's type and stored analysis
        let learnings = LearningRepository::new(pool)
            .get_recent_for_user("user-1", 10)
            .await
            .unwrap();
        let content: serde_json::Value = serde_json::from_str(&learnings[0].content).unwrap();
        assert_eq!(content["decision_type"], "BUY");
        assert_eq!(content["ai_analysis"]["analysis"], "momentum is strong");
        assert_eq!(content["entry_price"], 50000.0);
    }

    #[tokio::test]
    async fn test_stop_loss_closes_position() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        seed_position(&pool, "trade-1", "BTCUSDT", 50000.0, 0.01).await;
        // -6% crosses the -5% stop loss
        let service = monitor(pool.clone(), StaticPrices::with(&[("BTCUSDT", 47000.0)]));

        let summary = service.run_pass().await.unwrap();
        assert_eq!(summary.closed_positions, 1);

        let position = TradeResultRepository::new(pool.clone())
            .get("trade-1-pos")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(position.status, "closed_loss");
        assert_eq!(position.pnl_percentage, Some(-6.0));

        let learnings = LearningRepository::new(pool)
            .get_recent_for_user("user-1", 10)
            .await
            .unwrap();
        assert_eq!(learnings[0].learning_type, "failure_pattern");
        assert_eq!(learnings[0].importance_score, 60.0);
    }

    #[tokio::test]
    async fn test_position_in_band_stays_open() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        seed_position(&pool, "trade-1", "BTCUSDT", 50000.0, 0.01).await;
        // +3% is inside the (-5%, +10%) band
        let service = monitor(pool.clone(), StaticPrices::with(&[("BTCUSDT", 51500.0)]));

        let summary = service.run_pass().await.unwrap();
        assert_eq!(summary.monitored_trades, 1);
        assert_eq!(summary.closed_positions, 0);

        let position = TradeResultRepository::new(pool)
            .get("trade-1-pos")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(position.status, "open");
        assert_eq!(position.exit_price, None);
    }

    #[tokio::test]
    async fn test_stop_loss_boundary_is_inclusive() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        seed_position(&pool, "trade-1", "BTCUSDT", 50000.0, 0.01).await;
        // exactly -5%
        let service = monitor(pool.clone(), StaticPrices::with(&[("BTCUSDT", 47500.0)]));

        let summary = service.run_pass().await.unwrap();
        assert_eq!(summary.closed_positions, 1);

        let position = TradeResultRepository::new(pool)
            .get("trade-1-pos")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(position.status, "closed_loss");
    }

    #[tokio::test]
    async fn test_missing_price_skips_position() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        seed_position(&pool, "trade-1", "DOGEUSDT", 0.1, 1000.0).await;
        // price source has no DOGEUSDT quote
        let service = monitor(pool.clone(), StaticPrices::with(&[("BTCUSDT", 56000.0)]));

        let summary = service.run_pass().await.unwrap();
        assert_eq!(summary.monitored_trades, 1);
        assert_eq!(summary.closed_positions, 0);
        assert_eq!(summary.skipped, 1);
        assert!(summary.failures.is_empty());

        let position = TradeResultRepository::new(pool)
            .get("trade-1-pos")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(position.status, "open");
    }

    #[tokio::test]
    async fn test_unknown_exchange_skips_position() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        seed_position_on(&pool, "trade-1", "kraken", "BTCUSDT", 50000.0, 0.01).await;
        let service = monitor(pool.clone(), StaticPrices::with(&[("BTCUSDT", 56000.0)]));

        let summary = service.run_pass().await.unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.closed_positions, 0);
    }

    #[tokio::test]
    async fn test_corrupt_entry_price_is_isolated() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        seed_position(&pool, "trade-bad", "ETHUSDT", 0.0, 1.0).await;
        seed_position(&pool, "trade-good", "BTCUSDT", 50000.0, 0.01).await;
        let service = monitor(
            pool.clone(),
            StaticPrices::with(&[("ETHUSDT", 3000.0), ("BTCUSDT", 56000.0)]),
        );

        let summary = service.run_pass().await.unwrap();
        // the zero entry price fails its position, the other one still closes
        assert_eq!(summary.monitored_trades, 2);
        assert_eq!(summary.closed_positions, 1);
        assert_eq!(summary.failures.len(), 1);
        assert!(summary.failures[0].contains("trade-bad-pos"));

        let good = TradeResultRepository::new(pool)
            .get("trade-good-pos")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(good.status, "closed_profit");
    }

    #[tokio::test]
    async fn test_second_pass_sees_no_closed_trades() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        seed_position(&pool, "trade-1", "BTCUSDT", 50000.0, 0.01).await;
        let service = monitor(pool.clone(), StaticPrices::with(&[("BTCUSDT", 56000.0)]));

        let first = service.run_pass().await.unwrap();
        assert_eq!(first.closed_positions, 1);

        // the trade left the executed state, so the next pass ignores it
        let second = service.run_pass().await.unwrap();
        assert_eq!(second.monitored_trades, 0);
        assert_eq!(second.closed_positions, 0);

        // exactly one learning despite two passes
        let learnings = LearningRepository::new(pool)
            .get_recent_for_user("user-1", 10)
            .await
            .unwrap();
        assert_eq!(learnings.len(), 1);
    }

    #[tokio::test]
    async fn test_custom_thresholds() {
        let pool = init_database("sqlite::memory:").await.unwrap();
        seed_position(&pool, "trade-1", "BTCUSDT", 50000.0, 0.01).await;
        // +3% would hold under defaults but closes with a +2% take profit
        let policy = ExitPolicy::new(-10.0, 2.0).unwrap();
        let service = MonitorService::new(
            pool.clone(),
            Arc::new(StubProvider {
                client: StaticPrices::with(&[("BTCUSDT", 51500.0)]),
            }),
            policy,
        );

        let summary = service.run_pass().await.unwrap();
        assert_eq!(summary.closed_positions, 1);
    }
}
