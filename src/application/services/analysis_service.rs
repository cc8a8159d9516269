//! Signal Analysis Service
//!
//! Orchestrates the analysis of a stored trading decision: loads the decision
//! and the user's trading config, pulls a live market snapshot for crypto
//! assets, folds in the user's latest wellness entry, asks the generative
//! model for an assessment, and records the result on the decision row.
//!
//! The model is optional. When no model is configured, or a request to it
//! fails, the analysis degrades to a placeholder payload instead of failing
//! the request; market and wellness context are still recorded.

use crate::domain::entities::decision::AssetType;
use crate::domain::repositories::exchange_client::{ExchangeClient, Ticker};
use crate::domain::repositories::recommendation_model::RecommendationModel;
use crate::persistence::models::{DecisionRecord, TradingConfigRecord, WellnessRecord};
use crate::persistence::repository::{
    DecisionRepository, TradingConfigRepository, WellnessRepository,
};
use crate::persistence::{DatabaseError, DbPool};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Placeholder analysis text when no model is configured or the call fails
const DEGRADED_ANALYSIS: &str = "AI analysis not available";

/// Errors surfaced by signal analysis
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Decision not found: {0}")]
    DecisionNotFound(String),

    #[error("Trading config not found for user: {0}")]
    ConfigNotFound(String),

    #[error("Market data unavailable for {symbol}: {reason}")]
    MarketData { symbol: String, reason: String },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Market context captured at analysis time
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MarketSnapshot {
    pub price: f64,
    pub change: f64,
    pub volume: f64,
    pub high: f64,
    pub low: f64,
}

impl MarketSnapshot {
    fn from_ticker(ticker: &Ticker) -> Self {
        Self {
            price: ticker.last_price,
            change: ticker.percent_change,
            volume: ticker.quote_volume,
            high: ticker.high,
            low: ticker.low,
        }
    }

    /// All-zero snapshot for assets without a market data source
    fn unavailable() -> Self {
        Self {
            price: 0.0,
            change: 0.0,
            volume: 0.0,
            high: 0.0,
            low: 0.0,
        }
    }
}

/// Result of analyzing one decision
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub decision_id: String,
    pub analysis: serde_json::Value,
}

/// Service that analyzes trading decisions with market, wellness and AI context
pub struct AnalysisService {
    decisions: DecisionRepository,
    configs: TradingConfigRepository,
    wellness: WellnessRepository,
    market_data: Arc<dyn ExchangeClient>,
    model: Option<Arc<dyn RecommendationModel>>,
}

impl AnalysisService {
    pub fn new(
        pool: DbPool,
        market_data: Arc<dyn ExchangeClient>,
        model: Option<Arc<dyn RecommendationModel>>,
    ) -> Self {
        Self {
            decisions: DecisionRepository::new(pool.clone()),
            configs: TradingConfigRepository::new(pool.clone()),
            wellness: WellnessRepository::new(pool),
            market_data,
            model,
        }
    }

    /// Name of the configured model, if any
    pub fn model_name(&self) -> Option<&str> {
        self.model.as_deref().map(|m| m.model_name())
    }

    /// Analyze a stored decision and persist the analysis on its row.
    ///
    /// Market data errors for crypto assets fail the analysis; a failing or
    /// absent model does not.
    pub async fn analyze(&self, decision_id: &str) -> Result<AnalysisOutcome, AnalysisError> {
        let decision = self
            .decisions
            .get(decision_id)
            .await?
            .ok_or_else(|| AnalysisError::DecisionNotFound(decision_id.to_string()))?;

        let config = self
            .configs
            .get_for_user(&decision.user_id)
            .await?
            .ok_or_else(|| AnalysisError::ConfigNotFound(decision.user_id.clone()))?;

        let market = self.fetch_market_snapshot(&decision).await?;
        let wellness = self.wellness.latest_for_user(&decision.user_id).await?;

        let analysis = match &self.model {
            Some(model) => {
                let prompt = build_prompt(&decision, &config, &market, wellness.as_ref());
                match model.generate(&prompt).await {
                    Ok(text) => analysis_payload(text, &market, wellness.as_ref()),
                    Err(e) => {
                        warn!(
                            "Model request failed for decision {}, degrading: {}",
                            decision_id, e
                        );
                        degraded_payload(&market, wellness.as_ref())
                    }
                }
            }
            None => {
                debug!("No model configured, recording degraded analysis");
                degraded_payload(&market, wellness.as_ref())
            }
        };

        self.decisions.record_analysis(decision_id, &analysis).await?;
        info!(
            "Recorded analysis for decision {} ({} {})",
            decision_id, decision.decision_type, decision.asset_symbol
        );

        Ok(AnalysisOutcome {
            decision_id: decision_id.to_string(),
            analysis,
        })
    }

    /// Live snapshot for crypto assets; zeroed placeholder otherwise
    async fn fetch_market_snapshot(
        &self,
        decision: &DecisionRecord,
    ) -> Result<MarketSnapshot, AnalysisError> {
        let is_crypto = AssetType::parse(&decision.asset_type)
            .map(|t| t.is_crypto())
            .unwrap_or(false);
        if !is_crypto {
            debug!(
                "No market data source for asset type {}, using empty snapshot",
                decision.asset_type
            );
            return Ok(MarketSnapshot::unavailable());
        }

        let ticker = self
            .market_data
            .fetch_ticker(&decision.asset_symbol)
            .await
            .map_err(|e| AnalysisError::MarketData {
                symbol: decision.asset_symbol.clone(),
                reason: e.to_string(),
            })?;

        Ok(MarketSnapshot::from_ticker(&ticker))
    }
}

/// Prompt combining the decision, market context, risk profile and wellness
fn build_prompt(
    decision: &DecisionRecord,
    config: &TradingConfigRecord,
    market: &MarketSnapshot,
    wellness: Option<&WellnessRecord>,
) -> String {
    let wellness_line = match wellness {
        Some(w) => format!(
            "Wellness state: score {:.0}/100, mood {}/10, energy {}/10, sleep {}h, fasting {:.1}h",
            w.wellness_score, w.mood, w.energy, w.sleep, w.fasting_hours
        ),
        None => "Wellness state: no recent data".to_string(),
    };

    format!(
        "You are a trading advisor. Analyze this trading decision and give a clear \
         recommendation with the main risks.\n\
         \n\
         Decision: {} {} ({})\n\
         Suggested amount: {}\n\
         Suggested price: {}\n\
         Market: price {:.8}, 24h change {:.2}%, 24h volume {:.2}, high {:.8}, low {:.8}\n\
         Risk profile: {} (max trade amount {})\n\
         {}\n\
         \n\
         Consider whether the user's current state supports making this trade now.",
        decision.decision_type,
        decision.asset_symbol,
        decision.asset_type,
        decision.suggested_amount,
        decision
            .suggested_price
            .map(|p| p.to_string())
            .unwrap_or_else(|| "market".to_string()),
        market.price,
        market.change,
        market.volume,
        market.high,
        market.low,
        config.risk_profile,
        config.max_trade_amount,
        wellness_line,
    )
}

fn analysis_payload(
    text: String,
    market: &MarketSnapshot,
    wellness: Option<&WellnessRecord>,
) -> serde_json::Value {
    json!({
        "analysis": text,
        "generated_at": Utc::now().to_rfc3339(),
        "market_data": market,
        "wellness_state": wellness_state(wellness),
    })
}

fn degraded_payload(market: &MarketSnapshot, wellness: Option<&WellnessRecord>) -> serde_json::Value {
    analysis_payload(DEGRADED_ANALYSIS.to_string(), market, wellness)
}

fn wellness_state(wellness: Option<&WellnessRecord>) -> serde_json::Value {
    match wellness {
        Some(w) => json!({
            "wellness_score": w.wellness_score,
            "mood": w.mood,
            "energy": w.energy,
            "sleep": w.sleep,
            "fasting_hours": w.fasting_hours,
        }),
        None => serde_json::Value::Null,
    }
}
