use crate::domain::services::exit_policy::ExitPolicy;
use std::net::SocketAddr;
use std::time::Duration;

/// Service configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub bind_addr: SocketAddr,
    /// Timeout applied to every outbound HTTP call (exchange and model)
    pub http_timeout_secs: u64,
    /// Whether the background monitor loop runs
    pub monitor_enabled: bool,
    /// Seconds between background monitoring passes
    pub monitor_interval_secs: u64,
    /// Close positions at or below this PnL percentage
    pub stop_loss_threshold_pct: f64,
    /// Close positions at or above this PnL percentage
    pub take_profit_threshold_pct: f64,
    /// API key for the generative model; analysis degrades without it
    pub google_api_key: Option<String>,
    /// Model identifier for analysis requests
    pub gemini_model: String,
}

impl Default for AppConfig {
    fn default() -> AppConfig {
        AppConfig {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            http_timeout_secs: 10,
            monitor_enabled: true,
            monitor_interval_secs: 300,
            stop_loss_threshold_pct: ExitPolicy::DEFAULT_STOP_LOSS_PCT,
            take_profit_threshold_pct: ExitPolicy::DEFAULT_TAKE_PROFIT_PCT,
            google_api_key: None,
            gemini_model: "gemini-2.0-flash".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppConfig {
        let mut config = AppConfig::default();

        if let Ok(addr) = std::env::var("BIND_ADDR") {
            match addr.parse::<SocketAddr>() {
                Ok(value) => config.bind_addr = value,
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse BIND_ADDR '{}': {}, using default: {}",
                        addr,
                        e,
                        config.bind_addr
                    );
                }
            }
        }

        if let Ok(timeout) = std::env::var("HTTP_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(value) if (1..=120).contains(&value) => {
                    config.http_timeout_secs = value;
                }
                _ => {
                    tracing::warn!(
                        "Invalid HTTP_TIMEOUT_SECS value: {} (must be 1-120), using default: {}",
                        timeout,
                        config.http_timeout_secs
                    );
                }
            }
        }

        if let Ok(enabled) = std::env::var("MONITOR_ENABLED") {
            config.monitor_enabled = enabled.to_lowercase() == "true" || enabled == "1";
        }

        if let Ok(interval) = std::env::var("MONITOR_INTERVAL_SECS") {
            match interval.parse::<u64>() {
                Ok(value) if value >= 5 => {
                    config.monitor_interval_secs = value;
                }
                _ => {
                    tracing::warn!(
                        "Invalid MONITOR_INTERVAL_SECS value: {} (minimum 5), using default: {}",
                        interval,
                        config.monitor_interval_secs
                    );
                }
            }
        }

        if let Ok(stop_loss) = std::env::var("STOP_LOSS_THRESHOLD_PCT") {
            match stop_loss.parse::<f64>() {
                Ok(value) if value < 0.0 && value.is_finite() => {
                    config.stop_loss_threshold_pct = value;
                }
                _ => {
                    tracing::warn!(
                        "Invalid STOP_LOSS_THRESHOLD_PCT value: {} (must be negative), using default: {}",
                        stop_loss,
                        config.stop_loss_threshold_pct
                    );
                }
            }
        }

        if let Ok(take_profit) = std::env::var("TAKE_PROFIT_THRESHOLD_PCT") {
            match take_profit.parse::<f64>() {
                Ok(value) if value > 0.0 && value.is_finite() => {
                    config.take_profit_threshold_pct = value;
                }
                _ => {
                    tracing::warn!(
                        "Invalid TAKE_PROFIT_THRESHOLD_PCT value: {} (must be positive), using default: {}",
                        take_profit,
                        config.take_profit_threshold_pct
                    );
                }
            }
        }

        if let Ok(key) = std::env::var("GOOGLE_API_KEY") {
            if !key.trim().is_empty() {
                config.google_api_key = Some(key);
            }
        }

        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            if !model.trim().is_empty() {
                config.gemini_model = model;
            }
        }

        config
    }

    /// Timeout for outbound HTTP calls
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Interval between background monitoring passes
    pub fn monitor_interval(&self) -> Duration {
        Duration::from_secs(self.monitor_interval_secs)
    }

    /// Exit policy built from the configured thresholds
    pub fn exit_policy(&self) -> ExitPolicy {
        ExitPolicy::new(self.stop_loss_threshold_pct, self.take_profit_threshold_pct)
            .unwrap_or_else(|e| {
                tracing::warn!("Invalid exit thresholds ({}), using defaults", e);
                ExitPolicy::default()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.http_timeout_secs, 10);
        assert!(config.monitor_enabled);
        assert_eq!(config.monitor_interval_secs, 300);
        assert_eq!(config.stop_loss_threshold_pct, -5.0);
        assert_eq!(config.take_profit_threshold_pct, 10.0);
        assert!(config.google_api_key.is_none());
        assert_eq!(config.gemini_model, "gemini-2.0-flash");
    }

    #[test]
    fn test_exit_policy_from_config() {
        let config = AppConfig {
            stop_loss_threshold_pct: -3.0,
            take_profit_threshold_pct: 6.0,
            ..AppConfig::default()
        };
        let policy = config.exit_policy();
        assert_eq!(policy.stop_loss_pct(), -3.0);
        assert_eq!(policy.take_profit_pct(), 6.0);
    }

    #[test]
    fn test_exit_policy_falls_back_on_bad_thresholds() {
        // a positive stop loss can only come from a hand-edited struct, the
        // env parser refuses it; the policy still refuses to go live with it
        let config = AppConfig {
            stop_loss_threshold_pct: 5.0,
            ..AppConfig::default()
        };
        let policy = config.exit_policy();
        assert_eq!(policy.stop_loss_pct(), -5.0);
        assert_eq!(policy.take_profit_pct(), 10.0);
    }

    #[test]
    fn test_timeout_helpers() {
        let config = AppConfig::default();
        assert_eq!(config.http_timeout(), Duration::from_secs(10));
        assert_eq!(config.monitor_interval(), Duration::from_secs(300));
    }
}
