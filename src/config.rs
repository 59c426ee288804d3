//! Configuration types for risk-engine

use crate::error::ConfigError;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RiskEngineConfig {
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub kelly: KellyConfig,
    #[serde(default)]
    pub correlation: CorrelationConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Portfolio limit configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Total capital the limits are expressed against
    #[serde(default = "default_max_portfolio_value")]
    pub max_portfolio_value: Decimal,

    /// Largest single position as a fraction of portfolio value
    #[serde(default = "default_max_single_position_pct")]
    pub max_single_position_pct: Decimal,

    /// Total open exposure as a fraction of portfolio value
    #[serde(default = "default_max_total_exposure_pct")]
    pub max_total_exposure_pct: Decimal,

    /// Daily loss that trips the circuit breaker, as a fraction
    #[serde(default = "default_daily_loss_limit_pct")]
    pub daily_loss_limit_pct: Decimal,

    /// Maximum leverage per position
    #[serde(default = "default_max_leverage")]
    pub max_leverage: u32,
}

fn default_max_portfolio_value() -> Decimal {
    Decimal::new(10_000, 0)
}
fn default_max_single_position_pct() -> Decimal {
    Decimal::new(10, 2) // 0.10
}
fn default_max_total_exposure_pct() -> Decimal {
    Decimal::new(80, 2) // 0.80
}
fn default_daily_loss_limit_pct() -> Decimal {
    Decimal::new(7, 2) // 0.07
}
fn default_max_leverage() -> u32 {
    3
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_portfolio_value: default_max_portfolio_value(),
            max_single_position_pct: default_max_single_position_pct(),
            max_total_exposure_pct: default_max_total_exposure_pct(),
            daily_loss_limit_pct: default_daily_loss_limit_pct(),
            max_leverage: default_max_leverage(),
        }
    }
}

/// Kelly sizing configuration
///
/// The variance thresholds are expressed in the account's currency unit and
/// default to values tuned for a small crypto account.
#[derive(Debug, Clone, Deserialize)]
pub struct KellyConfig {
    /// Fractional Kelly multiplier (e.g., 0.25 for quarter Kelly)
    #[serde(default = "default_kelly_fraction")]
    pub fraction: f64,

    /// Sample size at which the confidence adjustment reaches 1.0
    #[serde(default = "default_min_sample_size")]
    pub min_sample_size: usize,

    /// P&L standard deviation above which the conservative fraction applies
    #[serde(default = "default_high_variance_stdev")]
    pub high_variance_stdev: f64,

    /// P&L standard deviation above which the moderate fraction applies
    #[serde(default = "default_medium_variance_stdev")]
    pub medium_variance_stdev: f64,

    /// Fraction recommended for high-variance trade history
    #[serde(default = "default_conservative_fraction")]
    pub conservative_fraction: f64,

    /// Fraction recommended for medium-variance trade history
    #[serde(default = "default_moderate_fraction")]
    pub moderate_fraction: f64,
}

fn default_kelly_fraction() -> f64 {
    0.25
}
fn default_min_sample_size() -> usize {
    30
}
fn default_high_variance_stdev() -> f64 {
    100.0
}
fn default_medium_variance_stdev() -> f64 {
    50.0
}
fn default_conservative_fraction() -> f64 {
    0.10
}
fn default_moderate_fraction() -> f64 {
    0.20
}

impl Default for KellyConfig {
    fn default() -> Self {
        Self {
            fraction: 0.25,
            min_sample_size: 30,
            high_variance_stdev: 100.0,
            medium_variance_stdev: 50.0,
            conservative_fraction: 0.10,
            moderate_fraction: 0.20,
        }
    }
}

/// Correlation analysis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CorrelationConfig {
    /// Days of price history per symbol
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Absolute correlation above which a pair is flagged
    #[serde(default = "default_high_correlation_threshold")]
    pub high_correlation_threshold: f64,

    /// Per-symbol fetch timeout in seconds
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Candle timeframe requested from the market-data service
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
}

fn default_lookback_days() -> u32 {
    30
}
fn default_high_correlation_threshold() -> f64 {
    0.7
}
fn default_fetch_timeout_secs() -> u64 {
    10
}
fn default_timeframe() -> String {
    "1d".to_string()
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            lookback_days: 30,
            high_correlation_threshold: 0.7,
            fetch_timeout_secs: 10,
            timeframe: "1d".to_string(),
        }
    }
}

/// Risk metrics configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Annual risk-free rate used for excess returns
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,

    /// Return periods per year (crypto trades every day)
    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: u32,

    /// Confidence level for VaR / CVaR
    #[serde(default = "default_var_confidence")]
    pub var_confidence: f64,

    /// Ceiling reported instead of an unbounded ratio
    #[serde(default = "default_ratio_cap")]
    pub ratio_cap: f64,
}

fn default_risk_free_rate() -> f64 {
    0.02
}
fn default_periods_per_year() -> u32 {
    365
}
fn default_var_confidence() -> f64 {
    0.95
}
fn default_ratio_cap() -> f64 {
    10.0
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.02,
            periods_per_year: 365,
            var_confidence: 0.95,
            ratio_cap: 10.0,
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Install the Prometheus recorder on init
    #[serde(default)]
    pub prometheus_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            prometheus_enabled: false,
        }
    }
}

impl RiskEngineConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RiskEngineConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate static configuration, failing fast on the first violation
    pub fn validate(&self) -> Result<(), ConfigError> {
        crate::guard::PortfolioLimits::try_from(&self.limits)?;

        if self.kelly.fraction <= 0.0 || self.kelly.fraction > 1.0 {
            return Err(ConfigError::InvalidKellyFraction(self.kelly.fraction));
        }
        if self.correlation.high_correlation_threshold <= 0.0
            || self.correlation.high_correlation_threshold >= 1.0
        {
            return Err(ConfigError::InvalidConfidence {
                field: "high_correlation_threshold",
                value: self.correlation.high_correlation_threshold,
            });
        }
        if self.metrics.var_confidence <= 0.0 || self.metrics.var_confidence >= 1.0 {
            return Err(ConfigError::InvalidConfidence {
                field: "var_confidence",
                value: self.metrics.var_confidence,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_config_deserialize() {
        let toml = r#"
            [limits]
            max_portfolio_value = 2626.96
            max_single_position_pct = 0.10
            max_total_exposure_pct = 0.80
            daily_loss_limit_pct = 0.07
            max_leverage = 3

            [kelly]
            fraction = 0.25
            min_sample_size = 30

            [correlation]
            lookback_days = 30
            high_correlation_threshold = 0.7

            [metrics]
            risk_free_rate = 0.02
            periods_per_year = 365

            [telemetry]
            log_level = "info"
        "#;

        let config: RiskEngineConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.limits.max_portfolio_value, dec!(2626.96));
        assert_eq!(config.limits.max_leverage, 3);
        assert_eq!(config.kelly.min_sample_size, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
            [limits]
            max_portfolio_value = 5000
        "#;

        let config: RiskEngineConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.limits.max_single_position_pct, dec!(0.10));
        assert_eq!(config.kelly.fraction, 0.25);
        assert_eq!(config.correlation.timeframe, "1d");
        assert_eq!(config.metrics.periods_per_year, 365);
    }

    #[test]
    fn test_validate_rejects_bad_percentage() {
        let mut config = RiskEngineConfig::default();
        config.limits.max_single_position_pct = dec!(1.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_leverage() {
        let mut config = RiskEngineConfig::default();
        config.limits.max_leverage = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_kelly_fraction() {
        let mut config = RiskEngineConfig::default();
        config.kelly.fraction = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = RiskEngineConfig::load("/nonexistent/path/config.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_clone() {
        let config = RiskEngineConfig::default();
        let cloned = config.clone();
        assert_eq!(
            config.limits.max_portfolio_value,
            cloned.limits.max_portfolio_value
        );
    }
}
