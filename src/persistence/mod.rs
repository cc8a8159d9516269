//! Persistence Layer
//!
//! This module provides database persistence for trading decisions, trades,
//! position results, wellness tracking, AI learnings, and notifications.
//! Uses SQLite for local storage with async operations via sqlx.
//!
//! # Features
//! - Decision and trade lifecycle tracking across restarts
//! - Conditional (compare-and-swap) status transitions for safe concurrent closes
//! - Append-only AI learning history
//! - Automatic schema migrations
//!
//! # Database Schema
//!
//! ## trading_decisions
//! - id: UUID
//! - user_id: Owner
//! - asset_symbol / asset_type: Instrument, e.g. "BTCUSDT" / "crypto"
//! - decision_type: "BUY", "SELL", or "HOLD"
//! - ai_analysis: JSON payload written by the analysis flow
//! - suggested_amount / suggested_price: Order sizing hints
//! - status: "pending", "approved", "rejected", "executed"
//!
//! ## trades
//! - id: UUID
//! - decision_id: Originating decision, if any
//! - exchange / asset_symbol / trade_type: Routing and direction
//! - price / quantity / total_amount / fees: Fill details
//! - status: "pending", "executed", "cancelled", "closed"
//!
//! ## trade_results
//! - id: UUID
//! - trade_id: Trade this position belongs to
//! - entry_price / exit_price / pnl_amount / pnl_percentage
//! - status: "open", "closed_profit", "closed_loss", "closed_breakeven"
//!
//! ## wellness_tracking
//! - Daily wellness entries; the analysis flow reads the latest per user
//!
//! ## ai_learnings
//! - Append-only pattern records derived from closed trades
//!
//! ## notifications
//! - User-facing events (trade executed, trade closed, ...)

pub mod models;
pub mod repository;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Database connection pool
pub type DbPool = SqlitePool;

/// Database initialization error
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Query error: {0}")]
    QueryError(String),
}

/// Initialize the database connection pool
///
/// # Arguments
/// - `database_url`: Path to SQLite database file (e.g., "sqlite://data/sentinela.db")
///
/// # Returns
/// Database connection pool ready for use
///
/// # Errors
/// Returns error if database connection fails or migrations fail
pub async fn init_database(database_url: &str) -> Result<DbPool, DatabaseError> {
    info!("Initializing database: {}", database_url);

    // Ensure data directory exists
    if let Some(db_path) = database_url.strip_prefix("sqlite://") {
        if let Some(parent) = Path::new(db_path).parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::ConnectionError(sqlx::Error::Configuration(Box::new(e)))
            })?;
        }
    }

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .log_statements(tracing::log::LevelFilter::Debug);

    // Single connection: with several pooled SQLite connections a row returned
    // by an INSERT is not guaranteed to be visible to the next query yet.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    info!("✓ Database initialized successfully");

    Ok(pool)
}

/// Run database migrations
async fn run_migrations(pool: &DbPool) -> Result<(), DatabaseError> {
    info!("Running database migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS trading_decisions (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            asset_symbol TEXT NOT NULL,
            asset_type TEXT NOT NULL CHECK(asset_type IN ('crypto', 'stock', 'cedear')),
            decision_type TEXT NOT NULL CHECK(decision_type IN ('BUY', 'SELL', 'HOLD')),
            ai_analysis TEXT,
            suggested_amount REAL NOT NULL,
            suggested_price REAL,
            stop_loss_price REAL,
            take_profit_price REAL,
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK(status IN ('pending', 'approved', 'rejected', 'executed')),
            decided_at DATETIME,
            user_feedback TEXT,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| {
        DatabaseError::MigrationError(format!("Failed to create trading_decisions table: {}", e))
    })?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS trading_config (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL UNIQUE,
            binance_api_key TEXT,
            binance_api_secret TEXT,
            risk_profile TEXT NOT NULL DEFAULT 'moderate'
                CHECK(risk_profile IN ('conservative', 'moderate', 'aggressive')),
            max_trade_amount REAL NOT NULL DEFAULT 0.0,
            stop_loss_percentage REAL NOT NULL DEFAULT 5.0,
            take_profit_percentage REAL NOT NULL DEFAULT 10.0,
            auto_execute BOOLEAN NOT NULL DEFAULT 0,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| {
        DatabaseError::MigrationError(format!("Failed to create trading_config table: {}", e))
    })?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS trades (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            decision_id TEXT,
            exchange TEXT NOT NULL,
            asset_symbol TEXT NOT NULL,
            trade_type TEXT NOT NULL CHECK(trade_type IN ('BUY', 'SELL')),
            quantity REAL NOT NULL,
            price REAL NOT NULL,
            total_amount REAL NOT NULL,
            fees REAL NOT NULL DEFAULT 0.0,
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK(status IN ('pending', 'executed', 'cancelled', 'closed')),
            exchange_order_id TEXT,
            executed_at DATETIME,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (decision_id) REFERENCES trading_decisions(id)
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::MigrationError(format!("Failed to create trades table: {}", e)))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS trade_results (
            id TEXT PRIMARY KEY,
            trade_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            entry_price REAL NOT NULL,
            exit_price REAL,
            pnl_amount REAL,
            pnl_percentage REAL,
            status TEXT NOT NULL DEFAULT 'open'
                CHECK(status IN ('open', 'closed_profit', 'closed_loss', 'closed_breakeven')),
            opened_at DATETIME NOT NULL,
            closed_at DATETIME,
            FOREIGN KEY (trade_id) REFERENCES trades(id)
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| {
        DatabaseError::MigrationError(format!("Failed to create trade_results table: {}", e))
    })?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS wellness_tracking (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            fasting_hours REAL NOT NULL DEFAULT 0.0,
            weight REAL,
            mood INTEGER NOT NULL,
            energy INTEGER NOT NULL,
            sleep INTEGER NOT NULL,
            wellness_score REAL NOT NULL,
            notes TEXT,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| {
        DatabaseError::MigrationError(format!("Failed to create wellness_tracking table: {}", e))
    })?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ai_learnings (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            learning_type TEXT NOT NULL
                CHECK(learning_type IN ('success_pattern', 'failure_pattern', 'market_insight', 'user_preference')),
            content TEXT NOT NULL,
            importance_score REAL NOT NULL DEFAULT 0.0,
            related_decisions TEXT NOT NULL DEFAULT '[]',
            related_trades TEXT NOT NULL DEFAULT '[]',
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| {
        DatabaseError::MigrationError(format!("Failed to create ai_learnings table: {}", e))
    })?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS notifications (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            type TEXT NOT NULL
                CHECK(type IN ('trade_executed', 'trade_closed', 'ai_suggestion', 'wellness_reminder', 'price_alert')),
            title TEXT NOT NULL,
            message TEXT NOT NULL,
            data TEXT,
            read BOOLEAN NOT NULL DEFAULT 0,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| {
        DatabaseError::MigrationError(format!("Failed to create notifications table: {}", e))
    })?;

    // Create indexes for better query performance
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_decisions_user ON trading_decisions(user_id, status)",
    )
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::MigrationError(format!("Failed to create index: {}", e)))?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_trades_status ON trades(status)")
        .execute(pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(format!("Failed to create index: {}", e)))?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_trades_decision ON trades(decision_id)")
        .execute(pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(format!("Failed to create index: {}", e)))?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_results_trade_status ON trade_results(trade_id, status)",
    )
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::MigrationError(format!("Failed to create index: {}", e)))?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_wellness_user_created ON wellness_tracking(user_id, created_at)",
    )
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::MigrationError(format!("Failed to create index: {}", e)))?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_learnings_user ON ai_learnings(user_id)")
        .execute(pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(format!("Failed to create index: {}", e)))?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications(user_id, read)")
        .execute(pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(format!("Failed to create index: {}", e)))?;

    info!("✓ Database migrations completed successfully");

    Ok(())
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database URL (e.g., "sqlite://data/sentinela.db")
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Enable query logging
    pub log_queries: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/sentinela.db".to_string(),
            max_connections: 1,
            log_queries: cfg!(debug_assertions),
        }
    }
}

impl DatabaseConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        let url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://data/sentinela.db".to_string());

        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);

        let log_queries = std::env::var("DATABASE_LOG_QUERIES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(cfg!(debug_assertions));

        Self {
            url,
            max_connections,
            log_queries,
        }
    }
}
