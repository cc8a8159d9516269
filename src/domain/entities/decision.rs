//! Trading decision vocabulary: asset classes, decision directions, and the
//! decision lifecycle state machine.

use crate::domain::entities::trade::TradeSide;

/// Asset class of the instrument a decision refers to.
///
/// Only crypto assets have live market data and an execution path today;
/// stocks and CEDEARs are tracked for analysis but never routed to an
/// exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetType {
    Crypto,
    Stock,
    Cedear,
}

impl AssetType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "crypto" => Some(AssetType::Crypto),
            "stock" => Some(AssetType::Stock),
            "cedear" => Some(AssetType::Cedear),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Crypto => "crypto",
            AssetType::Stock => "stock",
            AssetType::Cedear => "cedear",
        }
    }

    pub fn is_crypto(&self) -> bool {
        matches!(self, AssetType::Crypto)
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Direction recommended by a decision. `Hold` never produces an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionType {
    Buy,
    Sell,
    Hold,
}

impl DecisionType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "BUY" => Some(DecisionType::Buy),
            "SELL" => Some(DecisionType::Sell),
            "HOLD" => Some(DecisionType::Hold),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionType::Buy => "BUY",
            DecisionType::Sell => "SELL",
            DecisionType::Hold => "HOLD",
        }
    }

    /// Map to an order side, if this decision is executable at all.
    pub fn to_side(&self) -> Option<TradeSide> {
        match self {
            DecisionType::Buy => Some(TradeSide::Buy),
            DecisionType::Sell => Some(TradeSide::Sell),
            DecisionType::Hold => None,
        }
    }
}

impl std::fmt::Display for DecisionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decision lifecycle.
///
/// ```text
/// pending ──> approved ──> executed
///    │            │
///    │            └──> rejected
///    ├──> rejected
///    └──> executed          (auto-execute path)
/// ```
///
/// `executed` and `rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionStatus {
    Pending,
    Approved,
    Rejected,
    Executed,
}

impl DecisionStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(DecisionStatus::Pending),
            "approved" => Some(DecisionStatus::Approved),
            "rejected" => Some(DecisionStatus::Rejected),
            "executed" => Some(DecisionStatus::Executed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionStatus::Pending => "pending",
            DecisionStatus::Approved => "approved",
            DecisionStatus::Rejected => "rejected",
            DecisionStatus::Executed => "executed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DecisionStatus::Rejected | DecisionStatus::Executed)
    }

    /// Whether an order may be placed for a decision in this state.
    pub fn can_execute(&self) -> bool {
        matches!(self, DecisionStatus::Pending | DecisionStatus::Approved)
    }

    pub fn can_transition_to(&self, next: DecisionStatus) -> bool {
        use DecisionStatus::*;
        matches!(
            (self, next),
            (Pending, Approved) | (Pending, Rejected) | (Pending, Executed)
                | (Approved, Executed)
                | (Approved, Rejected)
        )
    }
}

impl std::fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
