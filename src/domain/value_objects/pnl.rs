use crate::domain::errors::ValidationError;

/// Realized or unrealized P&L for a position, derived from entry price,
/// current (or exit) price, and quantity.
///
/// Both components are computed together so they can never disagree:
/// percentage is relative to the entry price, amount is absolute in quote
/// currency. Construction fails on non-finite inputs and on a non-positive
/// entry price, which would otherwise divide into infinity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pnl {
    amount: f64,
    percentage: f64,
}

impl Pnl {
    /// Compute P&L from prices.
    ///
    /// # Errors
    /// Returns `ValidationError::NonPositiveEntryPrice` if `entry_price <= 0`
    /// and `ValidationError::MustBeFinite` if any input is NaN or infinite.
    pub fn from_prices(
        entry_price: f64,
        current_price: f64,
        quantity: f64,
    ) -> Result<Self, ValidationError> {
        if !entry_price.is_finite() || !current_price.is_finite() || !quantity.is_finite() {
            return Err(ValidationError::MustBeFinite);
        }
        if entry_price <= 0.0 {
            return Err(ValidationError::NonPositiveEntryPrice { entry_price });
        }

        Ok(Pnl {
            amount: (current_price - entry_price) * quantity,
            percentage: ((current_price - entry_price) / entry_price) * 100.0,
        })
    }

    /// Absolute P&L in quote currency: (current - entry) * quantity.
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// P&L as a percentage of the entry price.
    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    pub fn is_profit(&self) -> bool {
        self.percentage > 0.0
    }

    pub fn is_loss(&self) -> bool {
        self.percentage < 0.0
    }
}

impl std::fmt::Display for Pnl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:+.2}% ({:+.2})", self.percentage, self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pnl_profit() {
        let pnl = Pnl::from_prices(100.0, 112.0, 2.0).unwrap();
        assert_eq!(pnl.percentage(), 12.0);
        assert_eq!(pnl.amount(), 24.0);
        assert!(pnl.is_profit());
        assert!(!pnl.is_loss());
    }

    #[test]
    fn test_pnl_loss() {
        let pnl = Pnl::from_prices(200.0, 188.0, 0.5).unwrap();
        assert_eq!(pnl.percentage(), -6.0);
        assert_eq!(pnl.amount(), -6.0);
        assert!(pnl.is_loss());
        assert!(!pnl.is_profit());
    }

    #[test]
    fn test_pnl_breakeven() {
        let pnl = Pnl::from_prices(50.0, 50.0, 10.0).unwrap();
        assert_eq!(pnl.percentage(), 0.0);
        assert_eq!(pnl.amount(), 0.0);
        assert!(!pnl.is_profit());
        assert!(!pnl.is_loss());
    }

    #[test]
    fn test_pnl_zero_entry_rejected() {
        let err = Pnl::from_prices(0.0, 100.0, 1.0).unwrap_err();
        assert_eq!(err, ValidationError::NonPositiveEntryPrice { entry_price: 0.0 });
    }

    #[test]
    fn test_pnl_negative_entry_rejected() {
        assert!(Pnl::from_prices(-10.0, 100.0, 1.0).is_err());
    }

    #[test]
    fn test_pnl_non_finite_rejected() {
        assert_eq!(
            Pnl::from_prices(f64::NAN, 100.0, 1.0).unwrap_err(),
            ValidationError::MustBeFinite
        );
        assert_eq!(
            Pnl::from_prices(100.0, f64::INFINITY, 1.0).unwrap_err(),
            ValidationError::MustBeFinite
        );
        assert_eq!(
            Pnl::from_prices(100.0, 100.0, f64::NAN).unwrap_err(),
            ValidationError::MustBeFinite
        );
    }

    #[test]
    fn test_pnl_display() {
        let pnl = Pnl::from_prices(100.0, 105.0, 2.0).unwrap();
        assert_eq!(format!("{}", pnl), "+5.00% (+10.00)");
    }
}
