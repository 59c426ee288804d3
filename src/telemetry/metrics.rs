//! Prometheus gauges for portfolio state

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Total open exposure
    TotalExposure,
    /// Exposure as a fraction of portfolio value
    ExposurePct,
    /// Unrealized P&L
    UnrealizedPnl,
    /// Daily P&L
    DailyPnl,
    /// Open position count
    OpenPositions,
    /// Circuit breaker flag (1 when active)
    CircuitBreakerActive,
    /// Diversification score of the last correlation matrix
    DiversificationScore,
    /// Current maximum drawdown percentage
    MaxDrawdownPct,
}

impl GaugeMetric {
    fn name(self) -> &'static str {
        match self {
            GaugeMetric::TotalExposure => "riskengine_total_exposure",
            GaugeMetric::ExposurePct => "riskengine_exposure_pct",
            GaugeMetric::UnrealizedPnl => "riskengine_unrealized_pnl",
            GaugeMetric::DailyPnl => "riskengine_daily_pnl",
            GaugeMetric::OpenPositions => "riskengine_open_positions",
            GaugeMetric::CircuitBreakerActive => "riskengine_circuit_breaker_active",
            GaugeMetric::DiversificationScore => "riskengine_diversification_score",
            GaugeMetric::MaxDrawdownPct => "riskengine_max_drawdown_pct",
        }
    }
}

/// Set a gauge value on the installed recorder
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    ::metrics::gauge!(metric.name()).set(value);
}
