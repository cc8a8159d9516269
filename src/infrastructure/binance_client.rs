//! Binance REST client
//!
//! Spot market data and order placement against the Binance REST API.
//! A client built with [`BinanceClient::public`] can only fetch tickers;
//! order placement requires per-user API credentials and signs requests
//! with HMAC-SHA256 over the query string, hex-encoded, as Binance expects.

use crate::domain::entities::trade::TradeSide;
use crate::domain::repositories::exchange_client::{
    ApiCredentials, ExchangeClient, ExchangeError, ExchangeResult, OrderFill, Ticker,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Binance API endpoint
const BINANCE_API_BASE: &str = "https://api.binance.com";

/// 24h ticker response (all numeric fields arrive as strings)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker24hrResponse {
    last_price: String,
    price_change_percent: String,
    quote_volume: String,
    high_price: String,
    low_price: String,
}

/// Single fill inside an order response
#[derive(Debug, Deserialize)]
struct BinanceFill {
    price: String,
    qty: String,
    commission: String,
}

/// Order placement response (FULL response type)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BinanceOrderResponse {
    order_id: u64,
    price: String,
    cummulative_quote_qty: String,
    #[serde(default)]
    fills: Vec<BinanceFill>,
}

/// Binance REST client
pub struct BinanceClient {
    client: Client,
    api_base: String,
    credentials: Option<ApiCredentials>,
}

impl BinanceClient {
    /// Create an unauthenticated client for market data
    pub fn public(timeout: Duration) -> ExchangeResult<Self> {
        Self::build(None, timeout)
    }

    /// Create an authenticated client able to place orders
    pub fn with_credentials(
        credentials: ApiCredentials,
        timeout: Duration,
    ) -> ExchangeResult<Self> {
        Self::build(Some(credentials), timeout)
    }

    fn build(credentials: Option<ApiCredentials>, timeout: Duration) -> ExchangeResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExchangeError::NetworkError(format!("Failed to build client: {}", e)))?;

        Ok(Self {
            client,
            api_base: BINANCE_API_BASE.to_string(),
            credentials,
        })
    }

    /// Normalize a symbol to Binance format: "BTC/USDT" -> "BTCUSDT"
    pub fn normalize_symbol(symbol: &str) -> String {
        symbol
            .chars()
            .filter(|c| *c != '/' && *c != '-')
            .collect::<String>()
            .to_uppercase()
    }

    /// Sign a query string with HMAC-SHA256, hex-encoded
    fn sign(&self, query: &str) -> ExchangeResult<String> {
        use hmac::{Hmac, Mac};
        use sha2::Sha256;

        type HmacSha256 = Hmac<Sha256>;

        let credentials = self
            .credentials
            .as_ref()
            .ok_or(ExchangeError::MissingCredentials)?;

        let mut mac = HmacSha256::new_from_slice(credentials.api_secret.as_bytes())
            .map_err(|e| ExchangeError::NetworkError(format!("HMAC error: {}", e)))?;
        mac.update(query.as_bytes());

        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    fn timestamp_ms() -> ExchangeResult<u64> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .map_err(|e| ExchangeError::NetworkError(format!("Time error: {}", e)))
    }

    /// Place an order via the signed endpoint
    async fn place_order(
        &self,
        symbol: &str,
        side: TradeSide,
        quantity: f64,
        limit_price: Option<f64>,
    ) -> ExchangeResult<OrderFill> {
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(ExchangeError::InvalidOrder(format!(
                "Quantity must be positive: {}",
                quantity
            )));
        }
        if let Some(price) = limit_price {
            if !price.is_finite() || price <= 0.0 {
                return Err(ExchangeError::InvalidOrder(format!(
                    "Limit price must be positive: {}",
                    price
                )));
            }
        }

        let credentials = self
            .credentials
            .as_ref()
            .ok_or(ExchangeError::MissingCredentials)?;

        let symbol = Self::normalize_symbol(symbol);
        let mut query = format!(
            "symbol={}&side={}&quantity={}",
            symbol,
            side.as_str(),
            quantity
        );
        match limit_price {
            Some(price) => {
                query.push_str(&format!("&type=LIMIT&timeInForce=GTC&price={}", price));
            }
            None => query.push_str("&type=MARKET"),
        }
        query.push_str(&format!("&timestamp={}", Self::timestamp_ms()?));

        let signature = self.sign(&query)?;
        let url = format!(
            "{}/api/v3/order?{}&signature={}",
            self.api_base, query, signature
        );

        let response = self
            .client
            .post(&url)
            .header("X-MBX-APIKEY", credentials.api_key.as_str())
            .send()
            .await
            .map_err(|e| ExchangeError::NetworkError(format!("Order request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ExchangeError::ApiError { status, body });
        }

        let order: BinanceOrderResponse = response
            .json()
            .await
            .map_err(|e| ExchangeError::MessageParseError(format!("Order response: {}", e)))?;

        let fill = Self::to_order_fill(order, quantity, limit_price)?;
        info!(
            "Placed {} {} {} on binance: order {} at {}",
            side, quantity, symbol, fill.order_id, fill.price
        );
        Ok(fill)
    }

    /// Map a Binance order response to an [`OrderFill`].
    ///
    /// Market orders report their fills immediately; the fill price is the
    /// quantity-weighted average. Resting limit orders have no fills yet, so
    /// the requested price stands in and fees are zero until execution.
    fn to_order_fill(
        order: BinanceOrderResponse,
        quantity: f64,
        limit_price: Option<f64>,
    ) -> ExchangeResult<OrderFill> {
        let parse = |value: &str, field: &str| -> ExchangeResult<f64> {
            value.parse::<f64>().map_err(|e| {
                ExchangeError::MessageParseError(format!("{} '{}': {}", field, value, e))
            })
        };

        let mut fees = 0.0;
        let mut filled_qty = 0.0;
        let mut filled_value = 0.0;
        for fill in &order.fills {
            let price = parse(&fill.price, "fill price")?;
            let qty = parse(&fill.qty, "fill qty")?;
            fees += parse(&fill.commission, "fill commission")?;
            filled_qty += qty;
            filled_value += price * qty;
        }

        let price = if filled_qty > 0.0 {
            filled_value / filled_qty
        } else if let Some(limit) = limit_price {
            limit
        } else {
            parse(&order.price, "order price")?
        };

        let total_amount = {
            let quote_qty = parse(&order.cummulative_quote_qty, "quote quantity")?;
            if quote_qty > 0.0 {
                quote_qty
            } else {
                price * quantity
            }
        };

        Ok(OrderFill {
            order_id: order.order_id.to_string(),
            price,
            total_amount,
            fees,
        })
    }
}

#[async_trait]
impl ExchangeClient for BinanceClient {
    fn name(&self) -> &str {
        "binance"
    }

    async fn fetch_ticker(&self, symbol: &str) -> ExchangeResult<Ticker> {
        let symbol = Self::normalize_symbol(symbol);
        let url = format!("{}/api/v3/ticker/24hr?symbol={}", self.api_base, symbol);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ExchangeError::NetworkError(format!("Ticker request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ExchangeError::ApiError { status, body });
        }

        let ticker: Ticker24hrResponse = response
            .json()
            .await
            .map_err(|e| ExchangeError::MessageParseError(format!("Ticker response: {}", e)))?;

        let parse = |value: &str, field: &str| -> ExchangeResult<f64> {
            value.parse::<f64>().map_err(|e| {
                ExchangeError::MessageParseError(format!("{} '{}': {}", field, value, e))
            })
        };

        let ticker = Ticker {
            last_price: parse(&ticker.last_price, "lastPrice")?,
            percent_change: parse(&ticker.price_change_percent, "priceChangePercent")?,
            quote_volume: parse(&ticker.quote_volume, "quoteVolume")?,
            high: parse(&ticker.high_price, "highPrice")?,
            low: parse(&ticker.low_price, "lowPrice")?,
        };

        debug!("Fetched ticker for {}: last {}", symbol, ticker.last_price);
        Ok(ticker)
    }

    async fn place_market_order(
        &self,
        symbol: &str,
        side: TradeSide,
        quantity: f64,
    ) -> ExchangeResult<OrderFill> {
        self.place_order(symbol, side, quantity, None).await
    }

    async fn place_limit_order(
        &self,
        symbol: &str,
        side: TradeSide,
        quantity: f64,
        price: f64,
    ) -> ExchangeResult<OrderFill> {
        self.place_order(symbol, side, quantity, Some(price)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(BinanceClient::normalize_symbol("BTC/USDT"), "BTCUSDT");
        assert_eq!(BinanceClient::normalize_symbol("btc-usdt"), "BTCUSDT");
        assert_eq!(BinanceClient::normalize_symbol("ETHUSDT"), "ETHUSDT");
    }

    #[test]
    fn test_public_client_cannot_sign() {
        let client = BinanceClient::public(Duration::from_secs(5)).unwrap();
        let err = client.sign("symbol=BTCUSDT").unwrap_err();
        assert!(matches!(err, ExchangeError::MissingCredentials));
    }

    #[test]
    fn test_signature_is_hex_hmac() {
        let client = BinanceClient::with_credentials(
            ApiCredentials::new("key", "secret"),
            Duration::from_secs(5),
        )
        .unwrap();

        let signature = client.sign("symbol=BTCUSDT&side=BUY").unwrap();
        // HMAC-SHA256 is 32 bytes, 64 hex chars, and deterministic
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(signature, client.sign("symbol=BTCUSDT&side=BUY").unwrap());
    }

    #[test]
    fn test_market_fill_uses_weighted_average() {
        let order = BinanceOrderResponse {
            order_id: 42,
            price: "0.0".to_string(),
            cummulative_quote_qty: "1500.0".to_string(),
            fills: vec![
                BinanceFill {
                    price: "100.0".to_string(),
                    qty: "10.0".to_string(),
                    commission: "0.5".to_string(),
                },
                BinanceFill {
                    price: "110.0".to_string(),
                    qty: "5.0".to_string(),
                    commission: "0.25".to_string(),
                },
            ],
        };

        let fill = BinanceClient::to_order_fill(order, 15.0, None).unwrap();
        assert_eq!(fill.order_id, "42");
        assert!((fill.price - 103.333333).abs() < 1e-5);
        assert_eq!(fill.total_amount, 1500.0);
        assert_eq!(fill.fees, 0.75);
    }

    #[test]
    fn test_resting_limit_order_keeps_requested_price() {
        let order = BinanceOrderResponse {
            order_id: 7,
            price: "95.0".to_string(),
            cummulative_quote_qty: "0.0".to_string(),
            fills: vec![],
        };

        let fill = BinanceClient::to_order_fill(order, 2.0, Some(95.0)).unwrap();
        assert_eq!(fill.price, 95.0);
        assert_eq!(fill.total_amount, 190.0);
        assert_eq!(fill.fees, 0.0);
    }

    #[tokio::test]
    async fn test_rejects_non_positive_quantity() {
        let client = BinanceClient::with_credentials(
            ApiCredentials::new("key", "secret"),
            Duration::from_secs(5),
        )
        .unwrap();

        let err = client
            .place_market_order("BTCUSDT", TradeSide::Buy, 0.0)
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidOrder(_)));

        let err = client
            .place_limit_order("BTCUSDT", TradeSide::Sell, 1.0, -5.0)
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidOrder(_)));
    }
}
