//! Portfolio limits and check verdicts

use crate::config::LimitsConfig;
use crate::error::ConfigError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Immutable portfolio limit configuration
///
/// Percentage fields are fractions in [0, 1]; construction fails on
/// anything outside that range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioLimits {
    /// Total capital the limits are expressed against
    pub max_portfolio_value: Decimal,
    /// Largest single position as a fraction of portfolio value
    pub max_single_position_pct: Decimal,
    /// Total open exposure as a fraction of portfolio value
    pub max_total_exposure_pct: Decimal,
    /// Daily loss that trips the circuit breaker, as a fraction
    pub daily_loss_limit_pct: Decimal,
    /// Maximum leverage per position
    pub max_leverage: u32,
}

impl PortfolioLimits {
    /// Create validated limits
    pub fn new(
        max_portfolio_value: Decimal,
        max_single_position_pct: Decimal,
        max_total_exposure_pct: Decimal,
        daily_loss_limit_pct: Decimal,
        max_leverage: u32,
    ) -> Result<Self, ConfigError> {
        if max_portfolio_value <= Decimal::ZERO {
            return Err(ConfigError::NonPositivePortfolioValue(max_portfolio_value));
        }
        check_pct("max_single_position_pct", max_single_position_pct)?;
        check_pct("max_total_exposure_pct", max_total_exposure_pct)?;
        check_pct("daily_loss_limit_pct", daily_loss_limit_pct)?;
        if max_leverage < 1 {
            return Err(ConfigError::InvalidLeverage(max_leverage));
        }

        Ok(Self {
            max_portfolio_value,
            max_single_position_pct,
            max_total_exposure_pct,
            daily_loss_limit_pct,
            max_leverage,
        })
    }

    /// Largest allowed single position value
    pub fn max_position_value(&self) -> Decimal {
        self.max_portfolio_value * self.max_single_position_pct
    }

    /// Largest allowed total exposure
    pub fn max_exposure_value(&self) -> Decimal {
        self.max_portfolio_value * self.max_total_exposure_pct
    }

    /// Daily loss threshold as a positive currency amount
    pub fn daily_loss_limit(&self) -> Decimal {
        self.max_portfolio_value * self.daily_loss_limit_pct
    }
}

fn check_pct(field: &'static str, value: Decimal) -> Result<(), ConfigError> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(ConfigError::PercentageOutOfRange { field, value });
    }
    Ok(())
}

impl TryFrom<&LimitsConfig> for PortfolioLimits {
    type Error = ConfigError;

    fn try_from(config: &LimitsConfig) -> Result<Self, Self::Error> {
        Self::new(
            config.max_portfolio_value,
            config.max_single_position_pct,
            config.max_total_exposure_pct,
            config.daily_loss_limit_pct,
            config.max_leverage,
        )
    }
}

/// Outcome of a limit check: pass/fail plus a human-readable reason
///
/// Limit violations are verdicts, not errors; the caller decides whether a
/// rejection is fatal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitCheck {
    /// Whether the checked action is allowed
    pub allowed: bool,
    /// Human-readable explanation
    pub reason: String,
}

impl LimitCheck {
    /// Passing verdict
    pub fn allow(reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
        }
    }

    /// Failing verdict
    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
        }
    }
}

/// Outcome of a concentration check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcentrationCheck {
    /// Whether the book is acceptably diversified
    pub is_diversified: bool,
    /// One warning per violated threshold
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_valid_limits() {
        let limits =
            PortfolioLimits::new(dec!(10000), dec!(0.10), dec!(0.80), dec!(0.07), 3).unwrap();
        assert_eq!(limits.max_position_value(), dec!(1000));
        assert_eq!(limits.max_exposure_value(), dec!(8000));
        assert_eq!(limits.daily_loss_limit(), dec!(700));
    }

    #[test]
    fn test_percentage_out_of_range() {
        let result = PortfolioLimits::new(dec!(10000), dec!(1.5), dec!(0.80), dec!(0.07), 3);
        assert!(result.is_err());

        let result = PortfolioLimits::new(dec!(10000), dec!(0.10), dec!(-0.1), dec!(0.07), 3);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_leverage_rejected() {
        let result = PortfolioLimits::new(dec!(10000), dec!(0.10), dec!(0.80), dec!(0.07), 0);
        assert!(matches!(result, Err(ConfigError::InvalidLeverage(0))));
    }

    #[test]
    fn test_non_positive_portfolio_value_rejected() {
        let result = PortfolioLimits::new(dec!(0), dec!(0.10), dec!(0.80), dec!(0.07), 3);
        assert!(result.is_err());
    }

    #[test]
    fn test_try_from_config() {
        let config = LimitsConfig::default();
        let limits = PortfolioLimits::try_from(&config).unwrap();
        assert_eq!(limits.max_leverage, config.max_leverage);
    }

    #[test]
    fn test_limit_check_constructors() {
        let ok = LimitCheck::allow("within limits");
        assert!(ok.allowed);
        let no = LimitCheck::reject("too large");
        assert!(!no.allowed);
        assert_eq!(no.reason, "too large");
    }
}
