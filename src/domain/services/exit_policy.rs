//! Exit policy - decides when an open position must be liquidated based on
//! its P&L percentage relative to entry.

/// Outcome of evaluating a position against the exit thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitSignal {
    /// Position stays open
    HoldOpen,
    /// Loss reached the stop-loss threshold
    StopLoss,
    /// Gain reached the take-profit threshold
    TakeProfit,
}

impl ExitSignal {
    pub fn is_exit(&self) -> bool {
        !matches!(self, ExitSignal::HoldOpen)
    }

    /// Close reason label for notifications and logs.
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            ExitSignal::HoldOpen => None,
            ExitSignal::StopLoss => Some("stop_loss"),
            ExitSignal::TakeProfit => Some("take_profit"),
        }
    }
}

/// Threshold-based exit rules.
///
/// Thresholds are P&L percentages: stop-loss is negative, take-profit is
/// positive. Both boundaries are inclusive, so a position sitting exactly on
/// a threshold is closed.
#[derive(Debug, Clone, Copy)]
pub struct ExitPolicy {
    stop_loss_pct: f64,
    take_profit_pct: f64,
}

impl ExitPolicy {
    pub const DEFAULT_STOP_LOSS_PCT: f64 = -5.0;
    pub const DEFAULT_TAKE_PROFIT_PCT: f64 = 10.0;

    /// Create a policy with validated thresholds.
    ///
    /// # Errors
    /// Returns an error if the stop-loss threshold is not negative or the
    /// take-profit threshold is not positive.
    pub fn new(stop_loss_pct: f64, take_profit_pct: f64) -> Result<Self, String> {
        if !stop_loss_pct.is_finite() || !take_profit_pct.is_finite() {
            return Err("Exit thresholds must be finite".to_string());
        }
        if stop_loss_pct >= 0.0 {
            return Err("Stop-loss threshold must be negative".to_string());
        }
        if take_profit_pct <= 0.0 {
            return Err("Take-profit threshold must be positive".to_string());
        }
        Ok(ExitPolicy {
            stop_loss_pct,
            take_profit_pct,
        })
    }

    pub fn stop_loss_pct(&self) -> f64 {
        self.stop_loss_pct
    }

    pub fn take_profit_pct(&self) -> f64 {
        self.take_profit_pct
    }

    /// Evaluate a position's P&L percentage against the thresholds.
    pub fn evaluate(&self, pnl_percentage: f64) -> ExitSignal {
        if pnl_percentage <= self.stop_loss_pct {
            ExitSignal::StopLoss
        } else if pnl_percentage >= self.take_profit_pct {
            ExitSignal::TakeProfit
        } else {
            ExitSignal::HoldOpen
        }
    }
}

impl Default for ExitPolicy {
    fn default() -> Self {
        ExitPolicy {
            stop_loss_pct: Self::DEFAULT_STOP_LOSS_PCT,
            take_profit_pct: Self::DEFAULT_TAKE_PROFIT_PCT,
        }
    }
}
