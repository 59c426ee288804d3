//! Configuration errors
//!
//! The only failures surfaced as errors are invalid static configuration,
//! caught at construction time. Limit violations and degenerate numeric
//! input are reported through structured check results instead.

use rust_decimal::Decimal;
use thiserror::Error;

/// Invalid static configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A percentage field is outside [0, 1]
    #[error("{field} must be within [0, 1], got {value}")]
    PercentageOutOfRange {
        /// Field name
        field: &'static str,
        /// Offending value
        value: Decimal,
    },
    /// Maximum portfolio value must be positive
    #[error("max_portfolio_value must be positive, got {0}")]
    NonPositivePortfolioValue(Decimal),
    /// Leverage limit must be at least 1
    #[error("max_leverage must be at least 1, got {0}")]
    InvalidLeverage(u32),
    /// Kelly fraction must be in (0, 1]
    #[error("kelly fraction must be within (0, 1], got {0}")]
    InvalidKellyFraction(f64),
    /// Confidence level must be in (0, 1)
    #[error("{field} must be within (0, 1), got {value}")]
    InvalidConfidence {
        /// Field name
        field: &'static str,
        /// Offending value
        value: f64,
    },
}
