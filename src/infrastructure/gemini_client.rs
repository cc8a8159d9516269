//! Gemini REST client
//!
//! Calls the Google Generative Language API to turn an analysis prompt into
//! text. Holds the API key in zeroized memory and applies the shared HTTP
//! timeout so a slow model cannot stall request handlers.

use crate::domain::repositories::recommendation_model::{ModelError, RecommendationModel};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use zeroize::Zeroizing;

/// Generative Language API endpoint
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

/// Gemini client for analysis generation
pub struct GeminiClient {
    client: Client,
    api_base: String,
    api_key: Zeroizing<String>,
    model: String,
}

impl GeminiClient {
    /// Create a new client for the given model, e.g. "gemini-2.0-flash"
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> Result<Self, ModelError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ModelError::RequestFailed(format!("Failed to build client: {}", e)))?;

        Ok(Self {
            client,
            api_base: GEMINI_API_BASE.to_string(),
            api_key: Zeroizing::new(api_key.to_string()),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl RecommendationModel for GeminiClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.api_base,
            self.model,
            self.api_key.as_str()
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ModelError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::ApiError { status, body });
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ModelError::RequestFailed(format!("Malformed response: {}", e)))?;

        // Long answers can arrive split over several parts
        let text = body
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<String>()
            })
            .filter(|text| !text.is_empty())
            .ok_or(ModelError::EmptyResponse)?;

        debug!("Generated {} chars of analysis with {}", text.len(), self.model);
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: "analyze BTCUSDT".to_string(),
                }],
            }],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "analyze BTCUSDT");
    }

    #[test]
    fn test_response_parses_candidates() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"Buy with caution."}],"role":"model"},"finishReason":"STOP"}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.candidates[0].content.parts[0].text, "Buy with caution.");
    }

    #[test]
    fn test_multi_part_response_concatenates_text() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"Hold for now. "},{"text":"Volume is thin."}]}}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let text: String = parsed.candidates[0]
            .content
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect();
        assert_eq!(text, "Hold for now. Volume is thin.");
    }

    #[test]
    fn test_empty_response_has_no_candidates() {
        let parsed: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.candidates.is_empty());
    }

    #[test]
    fn test_model_name() {
        let client = GeminiClient::new("key", "gemini-2.0-flash", Duration::from_secs(5)).unwrap();
        assert_eq!(client.model_name(), "gemini-2.0-flash");
    }
}
