pub mod binance_client;
pub mod exchange_client_factory;
pub mod gemini_client;
