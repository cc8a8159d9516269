//! AI learning record vocabulary.

/// Category of a stored learning record.
///
/// Closed trades produce `SuccessPattern` or `FailurePattern`; the other two
/// categories are reserved for records written outside the trade lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearningType {
    SuccessPattern,
    FailurePattern,
    MarketInsight,
    UserPreference,
}

impl LearningType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success_pattern" => Some(LearningType::SuccessPattern),
            "failure_pattern" => Some(LearningType::FailurePattern),
            "market_insight" => Some(LearningType::MarketInsight),
            "user_preference" => Some(LearningType::UserPreference),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LearningType::SuccessPattern => "success_pattern",
            LearningType::FailurePattern => "failure_pattern",
            LearningType::MarketInsight => "market_insight",
            LearningType::UserPreference => "user_preference",
        }
    }

    /// Pattern category for a closed trade. Strictly positive P&L is a
    /// success; zero and negative are both failures.
    pub fn classify(pnl_percentage: f64) -> Self {
        if pnl_percentage > 0.0 {
            LearningType::SuccessPattern
        } else {
            LearningType::FailurePattern
        }
    }
}

impl std::fmt::Display for LearningType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Notification categories surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    TradeExecuted,
    TradeClosed,
    AiSuggestion,
    WellnessReminder,
    PriceAlert,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::TradeExecuted => "trade_executed",
            NotificationType::TradeClosed => "trade_closed",
            NotificationType::AiSuggestion => "ai_suggestion",
            NotificationType::WellnessReminder => "wellness_reminder",
            NotificationType::PriceAlert => "price_alert",
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_breakeven_is_failure() {
        assert_eq!(LearningType::classify(4.2), LearningType::SuccessPattern);
        assert_eq!(LearningType::classify(0.0), LearningType::FailurePattern);
        assert_eq!(LearningType::classify(-3.0), LearningType::FailurePattern);
    }

    #[test]
    fn test_parse_roundtrip() {
        for s in [
            "success_pattern",
            "failure_pattern",
            "market_insight",
            "user_preference",
        ] {
            assert_eq!(LearningType::parse(s).unwrap().as_str(), s);
        }
        assert!(LearningType::parse("pattern").is_none());
    }
}
