//! POST /monitor-positions

use crate::application::handlers::{ApiError, AppState};
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

/// Response for a completed monitoring pass
#[derive(Debug, Serialize)]
pub struct MonitorResponse {
    pub success: bool,
    pub monitored_trades: usize,
}

/// Run one monitoring pass over all open positions
pub async fn monitor_positions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MonitorResponse>, ApiError> {
    let summary = state.monitor.run_pass().await?;

    Ok(Json(MonitorResponse {
        success: true,
        monitored_trades: summary.monitored_trades,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{state, StubExchange};
    use crate::persistence::models::{CreateTrade, CreateTradeResult};
    use crate::persistence::repository::{TradeRepository, TradeResultRepository};
    use crate::persistence::DbPool;

    async fn seed_open_position(pool: &DbPool, entry_price: f64) {
        TradeRepository::new(pool.clone())
            .create(CreateTrade {
                id: "trade-1".to_string(),
                user_id: "user-1".to_string(),
                decision_id: None,
                exchange: "binance".to_string(),
                asset_symbol: "BTCUSDT".to_string(),
                trade_type: "BUY".to_string(),
                quantity: 0.01,
                price: entry_price,
                total_amount: entry_price * 0.01,
                fees: 0.0,
                exchange_order_id: None,
            })
            .await
            .unwrap();
        TradeResultRepository::new(pool.clone())
            .create(CreateTradeResult {
                id: "pos-1".to_string(),
                trade_id: "trade-1".to_string(),
                user_id: "user-1".to_string(),
                entry_price,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_monitor_with_no_positions() {
        let (state, _pool) = state(
            StubExchange {
                price: Some(50000.0),
                fill: None,
            },
            None,
        )
        .await;

        let response = monitor_positions(State(state)).await.unwrap().0;
        assert!(response.success);
        assert_eq!(response.monitored_trades, 0);
    }

    #[tokio::test]
    async fn test_monitor_closes_position_past_take_profit() {
        // entry 50000, quote 56000: +12% crosses the +10% threshold
        let (state, pool) = state(
            StubExchange {
                price: Some(56000.0),
                fill: None,
            },
            None,
        )
        .await;
        seed_open_position(&pool, 50000.0).await;

        let response = monitor_positions(State(state)).await.unwrap().0;
        assert!(response.success);
        assert_eq!(response.monitored_trades, 1);

        let position = TradeResultRepository::new(pool)
            .get("pos-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(position.status, "closed_profit");
    }

    #[tokio::test]
    async fn test_monitor_survives_price_outage() {
        let (state, pool) = state(
            StubExchange {
                price: None, // quotes unavailable
                fill: None,
            },
            None,
        )
        .await;
        seed_open_position(&pool, 50000.0).await;

        let response = monitor_positions(State(state)).await.unwrap().0;
        assert!(response.success);
        assert_eq!(response.monitored_trades, 1);

        let position = TradeResultRepository::new(pool)
            .get("pos-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(position.status, "open");
    }
}
