//! Exchange Client Trait
//!
//! Common interface over exchange REST APIs, covering the two capabilities
//! this service needs: spot market data and order placement. Services depend
//! on this trait rather than a concrete exchange implementation.
//!
//! ## Benefits
//! - Decouples analysis and execution logic from exchange-specific code
//! - Enables easy mocking for testing
//! - Simplifies adding new exchange support

use crate::domain::entities::trade::TradeSide;
use async_trait::async_trait;
use std::sync::Arc;
use zeroize::Zeroizing;

/// Common result type for exchange operations
pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// API key pair for an exchange account, wiped from memory on drop
pub struct ApiCredentials {
    pub api_key: Zeroizing<String>,
    pub api_secret: Zeroizing<String>,
}

impl ApiCredentials {
    pub fn new(api_key: &str, api_secret: &str) -> Self {
        Self {
            api_key: Zeroizing::new(api_key.to_string()),
            api_secret: Zeroizing::new(api_secret.to_string()),
        }
    }
}

/// Errors that can occur during exchange operations
#[derive(Debug, Clone)]
pub enum ExchangeError {
    /// Request could not be sent or timed out
    NetworkError(String),
    /// Exchange answered with a non-success status
    ApiError { status: u16, body: String },
    /// Response body could not be parsed
    MessageParseError(String),
    /// Operation requires API credentials the client does not hold
    MissingCredentials,
    /// Order parameters were rejected before sending
    InvalidOrder(String),
    /// No client implementation for the requested exchange
    UnsupportedExchange(String),
}

impl std::fmt::Display for ExchangeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExchangeError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            ExchangeError::ApiError { status, body } => {
                write!(f, "Exchange API error ({}): {}", status, body)
            }
            ExchangeError::MessageParseError(msg) => {
                write!(f, "Failed to parse exchange response: {}", msg)
            }
            ExchangeError::MissingCredentials => {
                write!(f, "Exchange credentials not configured")
            }
            ExchangeError::InvalidOrder(msg) => write!(f, "Invalid order: {}", msg),
            ExchangeError::UnsupportedExchange(name) => {
                write!(f, "Unsupported exchange: {}", name)
            }
        }
    }
}

impl std::error::Error for ExchangeError {}

/// 24h ticker snapshot for a symbol
#[derive(Debug, Clone, Copy)]
pub struct Ticker {
    /// Last traded price
    pub last_price: f64,
    /// 24h price change in percent
    pub percent_change: f64,
    /// 24h traded volume in quote currency
    pub quote_volume: f64,
    /// 24h high
    pub high: f64,
    /// 24h low
    pub low: f64,
}

/// Result of a filled (or accepted) order
#[derive(Debug, Clone)]
pub struct OrderFill {
    /// Exchange-assigned order id
    pub order_id: String,
    /// Fill price for market orders, requested price for resting limit orders
    pub price: f64,
    /// Total order value in quote currency
    pub total_amount: f64,
    /// Fees charged at placement, zero if not yet known
    pub fees: f64,
}

/// Exchange client trait providing common interface for all exchanges
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Get the name of this exchange
    fn name(&self) -> &str;

    /// Fetch the 24h ticker for a symbol
    ///
    /// # Arguments
    /// * `symbol` - Instrument symbol, e.g. "BTCUSDT" or "BTC/USDT"
    async fn fetch_ticker(&self, symbol: &str) -> ExchangeResult<Ticker>;

    /// Place a market order
    ///
    /// # Arguments
    /// * `symbol` - Instrument symbol
    /// * `side` - Buy or sell
    /// * `quantity` - Order quantity in base currency
    ///
    /// # Returns
    /// The fill as reported by the exchange
    async fn place_market_order(
        &self,
        symbol: &str,
        side: TradeSide,
        quantity: f64,
    ) -> ExchangeResult<OrderFill>;

    /// Place a limit order
    ///
    /// # Arguments
    /// * `symbol` - Instrument symbol
    /// * `side` - Buy or sell
    /// * `quantity` - Order quantity in base currency
    /// * `price` - Limit price
    async fn place_limit_order(
        &self,
        symbol: &str,
        side: TradeSide,
        quantity: f64,
        price: f64,
    ) -> ExchangeResult<OrderFill>;
}

/// Hands out exchange clients by name so callers never construct them directly
pub trait ExchangeProvider: Send + Sync {
    /// Shared unauthenticated client for market data, if the exchange is known
    fn market_data(&self, exchange: &str) -> Option<Arc<dyn ExchangeClient>>;

    /// Client bound to a user's API credentials
    fn authenticated(
        &self,
        exchange: &str,
        credentials: ApiCredentials,
    ) -> ExchangeResult<Arc<dyn ExchangeClient>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_error_display() {
        let error = ExchangeError::NetworkError("connection refused".to_string());
        assert_eq!(error.to_string(), "Network error: connection refused");

        let error = ExchangeError::ApiError {
            status: 418,
            body: "banned".to_string(),
        };
        assert_eq!(error.to_string(), "Exchange API error (418): banned");

        assert_eq!(
            ExchangeError::MissingCredentials.to_string(),
            "Exchange credentials not configured"
        );
    }

    #[test]
    fn test_order_fill_fields() {
        let fill = OrderFill {
            order_id: "12345".to_string(),
            price: 50000.0,
            total_amount: 500.0,
            fees: 0.5,
        };
        assert_eq!(fill.order_id, "12345");
        assert_eq!(fill.total_amount, 500.0);
    }
}
