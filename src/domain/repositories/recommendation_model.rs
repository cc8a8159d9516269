//! Recommendation Model Trait
//!
//! Interface over the generative model that turns a decision context into an
//! analysis text. The analysis flow treats this dependency as optional:
//! callers hold an `Option<Arc<dyn RecommendationModel>>` and fall back to a
//! placeholder payload when no model is configured or generation fails.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the generative model backend
#[derive(Debug, Error, Clone)]
pub enum ModelError {
    #[error("Model request failed: {0}")]
    RequestFailed(String),

    #[error("Model API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    #[error("Model returned no candidates")]
    EmptyResponse,
}

/// Generative model producing trading analysis text
#[async_trait]
pub trait RecommendationModel: Send + Sync {
    /// Identifier of the underlying model, for logging
    fn model_name(&self) -> &str;

    /// Generate an analysis for the given prompt
    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}
