pub mod exchange_client;
pub mod recommendation_model;
