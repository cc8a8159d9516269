//! Database Repository
//!
//! Data access layer for decisions, trades, position results, wellness
//! entries, AI learnings, and notifications.
//!
//! Status transitions that must happen at most once (closing a position,
//! executing a decision, closing a trade) are written as conditional updates
//! filtered on the expected current status. Callers receive `false` when the
//! row had already left that status, which makes concurrent monitor passes
//! and repeated execution requests safe without table locks.

use super::models::*;
use super::{DatabaseError, DbPool};
use chrono::Utc;
use tracing::{debug, error};

/// Trading decision repository
pub struct DecisionRepository {
    pool: DbPool,
}

impl DecisionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new decision in "pending" state
    pub async fn create(&self, decision: CreateDecision) -> Result<DecisionRecord, DatabaseError> {
        let now = Utc::now();
        let record = sqlx::query_as::<_, DecisionRecord>(
            r#"
            INSERT INTO trading_decisions (
                id, user_id, asset_symbol, asset_type, decision_type,
                suggested_amount, suggested_price, stop_loss_price, take_profit_price,
                status, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 'pending', ?10, ?10)
            RETURNING *
            "#,
        )
        .bind(&decision.id)
        .bind(&decision.user_id)
        .bind(&decision.asset_symbol)
        .bind(&decision.asset_type)
        .bind(&decision.decision_type)
        .bind(decision.suggested_amount)
        .bind(decision.suggested_price)
        .bind(decision.stop_loss_price)
        .bind(decision.take_profit_price)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create decision: {}", e);
            DatabaseError::QueryError(format!("Failed to create decision: {}", e))
        })?;

        debug!("Created decision: {} for {}", record.id, record.asset_symbol);
        Ok(record)
    }

    /// Get decision by ID
    pub async fn get(&self, id: &str) -> Result<Option<DecisionRecord>, DatabaseError> {
        let record =
            sqlx::query_as::<_, DecisionRecord>("SELECT * FROM trading_decisions WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    error!("Failed to get decision {}: {}", id, e);
                    DatabaseError::QueryError(format!("Failed to get decision: {}", e))
                })?;

        Ok(record)
    }

    /// Store the AI analysis payload on a decision
    pub async fn record_analysis(
        &self,
        id: &str,
        analysis: &serde_json::Value,
    ) -> Result<(), DatabaseError> {
        let analysis_json = serde_json::to_string(analysis)
            .map_err(|e| DatabaseError::QueryError(format!("Failed to serialize analysis: {}", e)))?;

        let now = Utc::now();
        let rows_affected = sqlx::query(
            "UPDATE trading_decisions SET ai_analysis = ?1, updated_at = ?2 WHERE id = ?3",
        )
        .bind(&analysis_json)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to record analysis for decision {}: {}", id, e);
            DatabaseError::QueryError(format!("Failed to record analysis: {}", e))
        })?
        .rows_affected();

        if rows_affected == 0 {
            return Err(DatabaseError::QueryError(format!(
                "Decision not found: {}",
                id
            )));
        }

        debug!("Recorded analysis for decision: {}", id);
        Ok(())
    }

    /// Move a decision to "executed", only from "pending" or "approved".
    ///
    /// Returns `false` if the decision had already left an executable state,
    /// e.g. when a concurrent request executed it first.
    pub async fn mark_executed(&self, id: &str) -> Result<bool, DatabaseError> {
        let now = Utc::now();
        let rows_affected = sqlx::query(
            r#"
            UPDATE trading_decisions
            SET status = 'executed', decided_at = ?1, updated_at = ?1
            WHERE id = ?2 AND status IN ('pending', 'approved')
            "#,
        )
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to mark decision {} executed: {}", id, e);
            DatabaseError::QueryError(format!("Failed to mark decision executed: {}", e))
        })?
        .rows_affected();

        if rows_affected > 0 {
            debug!("Marked decision executed: {}", id);
        }
        Ok(rows_affected > 0)
    }
}

/// Trading config repository
pub struct TradingConfigRepository {
    pool: DbPool,
}

impl TradingConfigRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a config row for a user
    pub async fn create(
        &self,
        config: CreateTradingConfig,
    ) -> Result<TradingConfigRecord, DatabaseError> {
        let now = Utc::now();
        let record = sqlx::query_as::<_, TradingConfigRecord>(
            r#"
            INSERT INTO trading_config (
                id, user_id, binance_api_key, binance_api_secret,
                risk_profile, max_trade_amount, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            RETURNING *
            "#,
        )
        .bind(&config.id)
        .bind(&config.user_id)
        .bind(&config.binance_api_key)
        .bind(&config.binance_api_secret)
        .bind(&config.risk_profile)
        .bind(config.max_trade_amount)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create trading config: {}", e);
            DatabaseError::QueryError(format!("Failed to create trading config: {}", e))
        })?;

        debug!("Created trading config for user: {}", record.user_id);
        Ok(record)
    }

    /// Get the config row for a user
    pub async fn get_for_user(
        &self,
        user_id: &str,
    ) -> Result<Option<TradingConfigRecord>, DatabaseError> {
        let record = sqlx::query_as::<_, TradingConfigRecord>(
            "SELECT * FROM trading_config WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to get trading config for {}: {}", user_id, e);
            DatabaseError::QueryError(format!("Failed to get trading config: {}", e))
        })?;

        Ok(record)
    }
}

/// Trade repository
pub struct TradeRepository {
    pool: DbPool,
}

impl TradeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Record an executed trade
    pub async fn create(&self, trade: CreateTrade) -> Result<TradeRecord, DatabaseError> {
        let now = Utc::now();
        let record = sqlx::query_as::<_, TradeRecord>(
            r#"
            INSERT INTO trades (
                id, user_id, decision_id, exchange, asset_symbol, trade_type,
                quantity, price, total_amount, fees, status, exchange_order_id,
                executed_at, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 'executed', ?11, ?12, ?12, ?12)
            RETURNING *
            "#,
        )
        .bind(&trade.id)
        .bind(&trade.user_id)
        .bind(&trade.decision_id)
        .bind(&trade.exchange)
        .bind(&trade.asset_symbol)
        .bind(&trade.trade_type)
        .bind(trade.quantity)
        .bind(trade.price)
        .bind(trade.total_amount)
        .bind(trade.fees)
        .bind(&trade.exchange_order_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create trade: {}", e);
            DatabaseError::QueryError(format!("Failed to create trade: {}", e))
        })?;

        debug!("Created trade: {} for {}", record.id, record.asset_symbol);
        Ok(record)
    }

    /// Get trade by ID
    pub async fn get(&self, id: &str) -> Result<Option<TradeRecord>, DatabaseError> {
        let record = sqlx::query_as::<_, TradeRecord>("SELECT * FROM trades WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to get trade {}: {}", id, e);
                DatabaseError::QueryError(format!("Failed to get trade: {}", e))
            })?;

        Ok(record)
    }

    /// Get all trades currently in "executed" state
    pub async fn get_executed(&self) -> Result<Vec<TradeRecord>, DatabaseError> {
        let records = sqlx::query_as::<_, TradeRecord>(
            "SELECT * FROM trades WHERE status = 'executed' ORDER BY executed_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to get executed trades: {}", e);
            DatabaseError::QueryError(format!("Failed to get executed trades: {}", e))
        })?;

        Ok(records)
    }

    /// Move a trade to "closed", only from "executed".
    ///
    /// Returns `false` if the trade was not in "executed" state anymore.
    pub async fn close(&self, id: &str) -> Result<bool, DatabaseError> {
        let now = Utc::now();
        let rows_affected = sqlx::query(
            r#"
            UPDATE trades
            SET status = 'closed', updated_at = ?1
            WHERE id = ?2 AND status = 'executed'
            "#,
        )
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to close trade {}: {}", id, e);
            DatabaseError::QueryError(format!("Failed to close trade: {}", e))
        })?
        .rows_affected();

        if rows_affected > 0 {
            debug!("Closed trade: {}", id);
        }
        Ok(rows_affected > 0)
    }
}

/// Position result repository
pub struct TradeResultRepository {
    pool: DbPool,
}

impl TradeResultRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Open a position for an executed trade
    pub async fn create(
        &self,
        result: CreateTradeResult,
    ) -> Result<TradeResultRecord, DatabaseError> {
        let now = Utc::now();
        let record = sqlx::query_as::<_, TradeResultRecord>(
            r#"
            INSERT INTO trade_results (id, trade_id, user_id, entry_price, status, opened_at)
            VALUES (?1, ?2, ?3, ?4, 'open', ?5)
            RETURNING *
            "#,
        )
        .bind(&result.id)
        .bind(&result.trade_id)
        .bind(&result.user_id)
        .bind(result.entry_price)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create trade result: {}", e);
            DatabaseError::QueryError(format!("Failed to create trade result: {}", e))
        })?;

        debug!("Opened position: {} for trade {}", record.id, record.trade_id);
        Ok(record)
    }

    /// Get position by ID
    pub async fn get(&self, id: &str) -> Result<Option<TradeResultRecord>, DatabaseError> {
        let record =
            sqlx::query_as::<_, TradeResultRecord>("SELECT * FROM trade_results WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    error!("Failed to get trade result {}: {}", id, e);
                    DatabaseError::QueryError(format!("Failed to get trade result: {}", e))
                })?;

        Ok(record)
    }

    /// Get open positions belonging to a trade
    pub async fn get_open_for_trade(
        &self,
        trade_id: &str,
    ) -> Result<Vec<TradeResultRecord>, DatabaseError> {
        let records = sqlx::query_as::<_, TradeResultRecord>(
            "SELECT * FROM trade_results WHERE trade_id = ?1 AND status = 'open'",
        )
        .bind(trade_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to get open positions for trade {}: {}", trade_id, e);
            DatabaseError::QueryError(format!("Failed to get open positions: {}", e))
        })?;

        Ok(records)
    }

    /// Close a position, only if it is still open.
    ///
    /// The update is conditional on `status = 'open'`, so when several close
    /// attempts race, exactly one wins. Returns `false` for the losers; the
    /// position keeps the exit data written by the winner.
    pub async fn close(&self, id: &str, close: ClosePosition) -> Result<bool, DatabaseError> {
        let now = Utc::now();
        let rows_affected = sqlx::query(
            r#"
            UPDATE trade_results
            SET status = ?1, exit_price = ?2, pnl_amount = ?3, pnl_percentage = ?4, closed_at = ?5
            WHERE id = ?6 AND status = 'open'
            "#,
        )
        .bind(&close.status)
        .bind(close.exit_price)
        .bind(close.pnl_amount)
        .bind(close.pnl_percentage)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to close position {}: {}", id, e);
            DatabaseError::QueryError(format!("Failed to close position: {}", e))
        })?
        .rows_affected();

        if rows_affected > 0 {
            debug!("Closed position: {} as {}", id, close.status);
        }
        Ok(rows_affected > 0)
    }
}

/// Wellness tracking repository
pub struct WellnessRepository {
    pool: DbPool,
}

impl WellnessRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a wellness entry
    pub async fn create(&self, entry: CreateWellness) -> Result<WellnessRecord, DatabaseError> {
        let now = Utc::now();
        let record = sqlx::query_as::<_, WellnessRecord>(
            r#"
            INSERT INTO wellness_tracking (
                id, user_id, fasting_hours, mood, energy, sleep,
                wellness_score, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            RETURNING *
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.user_id)
        .bind(entry.fasting_hours)
        .bind(entry.mood)
        .bind(entry.energy)
        .bind(entry.sleep)
        .bind(entry.wellness_score)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create wellness entry: {}", e);
            DatabaseError::QueryError(format!("Failed to create wellness entry: {}", e))
        })?;

        debug!("Created wellness entry for user: {}", record.user_id);
        Ok(record)
    }

    /// Get the most recent wellness entry for a user
    pub async fn latest_for_user(
        &self,
        user_id: &str,
    ) -> Result<Option<WellnessRecord>, DatabaseError> {
        let record = sqlx::query_as::<_, WellnessRecord>(
            "SELECT * FROM wellness_tracking WHERE user_id = ?1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to get wellness entry for {}: {}", user_id, e);
            DatabaseError::QueryError(format!("Failed to get wellness entry: {}", e))
        })?;

        Ok(record)
    }
}

/// AI learning repository
pub struct LearningRepository {
    pool: DbPool,
}

impl LearningRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Append a learning record
    pub async fn create(&self, learning: CreateLearning) -> Result<LearningRecord, DatabaseError> {
        let content_json = serde_json::to_string(&learning.content)
            .map_err(|e| DatabaseError::QueryError(format!("Failed to serialize content: {}", e)))?;
        let decisions_json = serde_json::to_string(&learning.related_decisions)
            .map_err(|e| DatabaseError::QueryError(format!("Failed to serialize ids: {}", e)))?;
        let trades_json = serde_json::to_string(&learning.related_trades)
            .map_err(|e| DatabaseError::QueryError(format!("Failed to serialize ids: {}", e)))?;

        let now = Utc::now();
        let record = sqlx::query_as::<_, LearningRecord>(
            r#"
            INSERT INTO ai_learnings (
                id, user_id, learning_type, content, importance_score,
                related_decisions, related_trades, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            RETURNING *
            "#,
        )
        .bind(&learning.id)
        .bind(&learning.user_id)
        .bind(&learning.learning_type)
        .bind(&content_json)
        .bind(learning.importance_score)
        .bind(&decisions_json)
        .bind(&trades_json)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create learning: {}", e);
            DatabaseError::QueryError(format!("Failed to create learning: {}", e))
        })?;

        debug!(
            "Created learning: {} ({}) for user {}",
            record.id, record.learning_type, record.user_id
        );
        Ok(record)
    }

    /// Get recent learnings for a user
    pub async fn get_recent_for_user(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<LearningRecord>, DatabaseError> {
        let records = sqlx::query_as::<_, LearningRecord>(
            "SELECT * FROM ai_learnings WHERE user_id = ?1 ORDER BY created_at DESC LIMIT ?2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to get learnings for {}: {}", user_id, e);
            DatabaseError::QueryError(format!("Failed to get learnings: {}", e))
        })?;

        Ok(records)
    }
}

/// Notification repository
pub struct NotificationRepository {
    pool: DbPool,
}

impl NotificationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a notification
    pub async fn create(
        &self,
        notification: CreateNotification,
    ) -> Result<NotificationRecord, DatabaseError> {
        let data_json = match &notification.data {
            Some(data) => Some(serde_json::to_string(data).map_err(|e| {
                DatabaseError::QueryError(format!("Failed to serialize data: {}", e))
            })?),
            None => None,
        };

        let now = Utc::now();
        let record = sqlx::query_as::<_, NotificationRecord>(
            r#"
            INSERT INTO notifications (id, user_id, type, title, message, data, read, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)
            RETURNING *
            "#,
        )
        .bind(&notification.id)
        .bind(&notification.user_id)
        .bind(&notification.r#type)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&data_json)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create notification: {}", e);
            DatabaseError::QueryError(format!("Failed to create notification: {}", e))
        })?;

        debug!(
            "Created notification: {} ({}) for user {}",
            record.id, record.r#type, record.user_id
        );
        Ok(record)
    }

    /// Get recent notifications for a user
    pub async fn get_for_user(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<NotificationRecord>, DatabaseError> {
        let records = sqlx::query_as::<_, NotificationRecord>(
            "SELECT * FROM notifications WHERE user_id = ?1 ORDER BY created_at DESC LIMIT ?2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to get notifications for {}: {}", user_id, e);
            DatabaseError::QueryError(format!("Failed to get notifications: {}", e))
        })?;

        Ok(records)
    }
}
