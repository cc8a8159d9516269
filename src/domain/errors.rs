use thiserror::Error;

/// Validation failures for derived numeric values.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Value must be finite")]
    MustBeFinite,

    #[error("Entry price must be positive, got {entry_price}")]
    NonPositiveEntryPrice { entry_price: f64 },
}

impl From<ValidationError> for String {
    fn from(error: ValidationError) -> Self {
        error.to_string()
    }
}

/// Structured reasons an execution request is refused.
///
/// Every variant is reported to the caller as a failed execution rather than
/// an internal error: the request was understood, the trade was not placed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TradeExecutionError {
    /// Decision is not in a state that allows order placement
    #[error("Decision is {status} and cannot be executed")]
    DecisionNotExecutable { status: String },

    /// HOLD decisions never map to an order side
    #[error("HOLD decisions have nothing to execute")]
    HoldDecision,

    /// Stored decision_type is outside the known vocabulary
    #[error("Unknown decision type: {value}")]
    UnknownDecisionType { value: String },

    /// Only crypto assets have an execution route
    #[error("No execution route for asset type: {asset_type}")]
    UnsupportedAsset { asset_type: String },

    /// User config has no API credentials for the exchange
    #[error("No {exchange} API credentials configured for user")]
    MissingCredentials { exchange: String },

    /// Exchange named on the trade is not supported
    #[error("Unsupported exchange: {exchange}")]
    UnsupportedExchange { exchange: String },

    /// Order parameters failed validation before reaching the exchange
    #[error("Invalid order: {reason}")]
    InvalidOrder { reason: String },

    /// Exchange refused the order or the request failed
    #[error("Order rejected: {reason}")]
    OrderRejected { reason: String },
}

impl TradeExecutionError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TradeExecutionError::DecisionNotExecutable { .. } => ErrorSeverity::Minor,
            TradeExecutionError::HoldDecision => ErrorSeverity::Minor,
            TradeExecutionError::UnsupportedAsset { .. } => ErrorSeverity::Minor,
            TradeExecutionError::UnknownDecisionType { .. } => ErrorSeverity::Moderate,
            TradeExecutionError::MissingCredentials { .. } => ErrorSeverity::Moderate,
            TradeExecutionError::UnsupportedExchange { .. } => ErrorSeverity::Moderate,
            TradeExecutionError::InvalidOrder { .. } => ErrorSeverity::Moderate,
            TradeExecutionError::OrderRejected { .. } => ErrorSeverity::Critical,
        }
    }

    /// Whether retrying the same request might succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TradeExecutionError::OrderRejected { .. })
    }

    /// Short error code for logging and monitoring.
    pub fn error_code(&self) -> &'static str {
        match self {
            TradeExecutionError::DecisionNotExecutable { .. } => "ERR_DECISION_NOT_EXECUTABLE",
            TradeExecutionError::HoldDecision => "ERR_HOLD_DECISION",
            TradeExecutionError::UnknownDecisionType { .. } => "ERR_UNKNOWN_DECISION_TYPE",
            TradeExecutionError::UnsupportedAsset { .. } => "ERR_UNSUPPORTED_ASSET",
            TradeExecutionError::MissingCredentials { .. } => "ERR_MISSING_CREDENTIALS",
            TradeExecutionError::UnsupportedExchange { .. } => "ERR_UNSUPPORTED_EXCHANGE",
            TradeExecutionError::InvalidOrder { .. } => "ERR_INVALID_ORDER",
            TradeExecutionError::OrderRejected { .. } => "ERR_ORDER_REJECTED",
        }
    }
}

impl From<TradeExecutionError> for String {
    fn from(error: TradeExecutionError) -> Self {
        error.to_string()
    }
}

/// Severity levels for execution errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Expected to occur in normal operation
    Minor,
    /// Indicates a configuration or data problem
    Moderate,
    /// Requires attention
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Minor => write!(f, "Minor"),
            ErrorSeverity::Moderate => write!(f, "Moderate"),
            ErrorSeverity::Critical => write!(f, "Critical"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        assert_eq!(
            ValidationError::MustBeFinite.to_string(),
            "Value must be finite"
        );
        let err = ValidationError::NonPositiveEntryPrice { entry_price: 0.0 };
        assert_eq!(err.to_string(), "Entry price must be positive, got 0");
    }

    #[test]
    fn test_execution_error_display() {
        let error = TradeExecutionError::DecisionNotExecutable {
            status: "executed".to_string(),
        };
        assert_eq!(error.to_string(), "Decision is executed and cannot be executed");

        let error = TradeExecutionError::MissingCredentials {
            exchange: "binance".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "No binance API credentials configured for user"
        );
    }

    #[test]
    fn test_only_order_rejection_is_recoverable() {
        assert!(TradeExecutionError::OrderRejected {
            reason: "timeout".to_string()
        }
        .is_recoverable());
        assert!(!TradeExecutionError::HoldDecision.is_recoverable());
        assert!(!TradeExecutionError::DecisionNotExecutable {
            status: "rejected".to_string()
        }
        .is_recoverable());
        assert!(!TradeExecutionError::MissingCredentials {
            exchange: "binance".to_string()
        }
        .is_recoverable());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(ErrorSeverity::Minor < ErrorSeverity::Moderate);
        assert!(ErrorSeverity::Moderate < ErrorSeverity::Critical);
        assert_eq!(
            TradeExecutionError::OrderRejected {
                reason: "x".to_string()
            }
            .severity(),
            ErrorSeverity::Critical
        );
        assert_eq!(TradeExecutionError::HoldDecision.severity(), ErrorSeverity::Minor);
    }

    #[test]
    fn test_error_codes_unique() {
        let errors = vec![
            TradeExecutionError::DecisionNotExecutable {
                status: "x".to_string(),
            },
            TradeExecutionError::HoldDecision,
            TradeExecutionError::UnknownDecisionType {
                value: "x".to_string(),
            },
            TradeExecutionError::UnsupportedAsset {
                asset_type: "x".to_string(),
            },
            TradeExecutionError::MissingCredentials {
                exchange: "x".to_string(),
            },
            TradeExecutionError::UnsupportedExchange {
                exchange: "x".to_string(),
            },
            TradeExecutionError::InvalidOrder {
                reason: "x".to_string(),
            },
            TradeExecutionError::OrderRejected {
                reason: "x".to_string(),
            },
        ];

        let mut codes = vec![];
        for error in errors {
            let code = error.error_code();
            assert!(!codes.contains(&code), "Duplicate error code: {}", code);
            codes.push(code);
        }
    }
}
