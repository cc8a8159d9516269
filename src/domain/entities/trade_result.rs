//! Position outcome state machine.
//!
//! A trade result starts `open` and is closed exactly once into one of three
//! terminal states. The terminal state is chosen by the sign of the realized
//! P&L, independently of which exit rule fired.

/// Lifecycle of a position record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultStatus {
    Open,
    ClosedProfit,
    ClosedLoss,
    ClosedBreakeven,
}

impl ResultStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(ResultStatus::Open),
            "closed_profit" => Some(ResultStatus::ClosedProfit),
            "closed_loss" => Some(ResultStatus::ClosedLoss),
            "closed_breakeven" => Some(ResultStatus::ClosedBreakeven),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResultStatus::Open => "open",
            ResultStatus::ClosedProfit => "closed_profit",
            ResultStatus::ClosedLoss => "closed_loss",
            ResultStatus::ClosedBreakeven => "closed_breakeven",
        }
    }

    /// Terminal state for a position closed at the given P&L percentage.
    /// Classification is by sign only: a stop-loss exit that ends up exactly
    /// flat is still a breakeven.
    pub fn classify(pnl_percentage: f64) -> Self {
        if pnl_percentage > 0.0 {
            ResultStatus::ClosedProfit
        } else if pnl_percentage < 0.0 {
            ResultStatus::ClosedLoss
        } else {
            ResultStatus::ClosedBreakeven
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, ResultStatus::Open)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_open()
    }

    pub fn can_transition_to(&self, next: ResultStatus) -> bool {
        self.is_open() && next.is_terminal()
    }
}

impl std::fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
