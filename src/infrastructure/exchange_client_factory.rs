//! Exchange Client Factory
//!
//! Builds exchange client instances. Unauthenticated market-data clients are
//! created once at startup and shared; authenticated clients are built per
//! request from the credentials stored in the user's trading config, so one
//! process can trade on behalf of many users.

use crate::domain::repositories::exchange_client::{
    ApiCredentials, ExchangeClient, ExchangeError, ExchangeProvider, ExchangeResult,
};
use crate::infrastructure::binance_client::BinanceClient;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Factory for creating exchange clients
pub struct ExchangeClientFactory {
    timeout: Duration,
    market_data: HashMap<String, Arc<dyn ExchangeClient>>,
}

impl ExchangeClientFactory {
    /// Create the factory and the shared market-data clients
    pub fn new(timeout: Duration) -> Self {
        let mut market_data: HashMap<String, Arc<dyn ExchangeClient>> = HashMap::new();

        match BinanceClient::public(timeout) {
            Ok(client) => {
                info!("✓ Binance market data client created");
                market_data.insert("binance".to_string(), Arc::new(client));
            }
            Err(e) => {
                error!("✗ Failed to create Binance market data client: {}", e);
            }
        }

        Self {
            timeout,
            market_data,
        }
    }
}

impl ExchangeProvider for ExchangeClientFactory {
    fn market_data(&self, exchange: &str) -> Option<Arc<dyn ExchangeClient>> {
        self.market_data.get(exchange).cloned()
    }

    fn authenticated(
        &self,
        exchange: &str,
        credentials: ApiCredentials,
    ) -> ExchangeResult<Arc<dyn ExchangeClient>> {
        match exchange {
            "binance" => {
                let client = BinanceClient::with_credentials(credentials, self.timeout)?;
                Ok(Arc::new(client))
            }
            other => Err(ExchangeError::UnsupportedExchange(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_data_client_for_binance() {
        let factory = ExchangeClientFactory::new(Duration::from_secs(5));
        let client = factory.market_data("binance").unwrap();
        assert_eq!(client.name(), "binance");
    }

    #[test]
    fn test_no_market_data_client_for_unknown_exchange() {
        let factory = ExchangeClientFactory::new(Duration::from_secs(5));
        assert!(factory.market_data("yahoo").is_none());
        assert!(factory.market_data("iol").is_none());
    }

    #[test]
    fn test_authenticated_client_for_binance() {
        let factory = ExchangeClientFactory::new(Duration::from_secs(5));
        let client = factory
            .authenticated("binance", ApiCredentials::new("key", "secret"))
            .unwrap();
        assert_eq!(client.name(), "binance");
    }

    #[test]
    fn test_authenticated_client_unsupported_exchange() {
        let factory = ExchangeClientFactory::new(Duration::from_secs(5));
        let err = factory
            .authenticated("iol", ApiCredentials::new("key", "secret"))
            .err();
        assert!(matches!(err, Some(ExchangeError::UnsupportedExchange(_))));
    }
}
