//! Portfolio limit guard
//!
//! Gatekeeper for new positions and daily-loss circuit breaking. One
//! owning object holds all mutable portfolio state (ledger, breaker, last
//! observed daily P&L) behind a single lock; there is no ambient singleton.

use super::breaker::CircuitBreaker;
use super::ledger::{PortfolioStatus, PositionInfo, PositionLedger};
use super::limits::{ConcentrationCheck, LimitCheck, PortfolioLimits};
use crate::alert::{AlertSeverity, AlertSink};
use crate::telemetry::{set_gauge, GaugeMetric};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::{Arc, Mutex, MutexGuard};

struct GuardState {
    ledger: PositionLedger,
    breaker: CircuitBreaker,
    daily_pnl: Decimal,
}

/// Portfolio limit guard and circuit breaker
pub struct PortfolioGuard {
    limits: PortfolioLimits,
    state: Mutex<GuardState>,
    alert: Option<Arc<dyn AlertSink>>,
}

impl PortfolioGuard {
    /// Create a guard with an empty ledger and inactive breaker
    pub fn new(limits: PortfolioLimits) -> Self {
        Self {
            limits,
            state: Mutex::new(GuardState {
                ledger: PositionLedger::new(),
                breaker: CircuitBreaker::new(),
                daily_pnl: Decimal::ZERO,
            }),
            alert: None,
        }
    }

    /// Attach an alert sink notified on circuit-breaker trips
    pub fn with_alert_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.alert = Some(sink);
        self
    }

    /// The configured limits
    pub fn limits(&self) -> &PortfolioLimits {
        &self.limits
    }

    fn state(&self) -> MutexGuard<'_, GuardState> {
        // A poisoned lock still holds consistent state; recover it
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Check whether a new position of the given value may be opened
    ///
    /// The single-position cap is evaluated before the exposure cap; an
    /// active circuit breaker fails every new-position check until reset.
    pub fn check_position_limits(&self, new_position_value: Decimal) -> LimitCheck {
        let state = self.state();

        if state.breaker.is_active() {
            let reason = state.breaker.reason().unwrap_or("unspecified").to_string();
            return LimitCheck::reject(format!("Circuit breaker active: {}", reason));
        }

        let max_position = self.limits.max_position_value();
        if new_position_value > max_position {
            return LimitCheck::reject(format!(
                "Position value {} exceeds single-position limit {} ({}% of portfolio)",
                new_position_value.round_dp(2),
                max_position.round_dp(2),
                (self.limits.max_single_position_pct * dec!(100)).round_dp(0),
            ));
        }

        let current_exposure = state.ledger.total_exposure();
        let max_exposure = self.limits.max_exposure_value();
        let new_exposure = current_exposure + new_position_value;
        if new_exposure > max_exposure {
            return LimitCheck::reject(format!(
                "Total exposure {} would exceed limit {} ({}% of portfolio)",
                new_exposure.round_dp(2),
                max_exposure.round_dp(2),
                (self.limits.max_total_exposure_pct * dec!(100)).round_dp(0),
            ));
        }

        LimitCheck::allow(format!(
            "Within limits: position {}, exposure {} of {}",
            new_position_value.round_dp(2),
            new_exposure.round_dp(2),
            max_exposure.round_dp(2),
        ))
    }

    /// Check a requested leverage against the configured maximum
    pub fn check_leverage_limit(&self, leverage: u32) -> LimitCheck {
        if leverage > self.limits.max_leverage {
            return LimitCheck::reject(format!(
                "Leverage {}x exceeds maximum {}x",
                leverage, self.limits.max_leverage
            ));
        }
        LimitCheck::allow(format!(
            "Leverage {}x within maximum {}x",
            leverage, self.limits.max_leverage
        ))
    }

    /// Check today's P&L against the daily loss limit, tripping the
    /// circuit breaker on breach
    pub fn check_daily_loss_limit(&self, current_pnl: Decimal) -> LimitCheck {
        let limit = self.limits.daily_loss_limit();

        let breached = {
            let mut state = self.state();
            state.daily_pnl = current_pnl;

            if current_pnl < -limit {
                let reason = format!(
                    "Daily loss {} exceeds limit {} ({}% of portfolio)",
                    current_pnl.round_dp(2),
                    limit.round_dp(2),
                    (self.limits.daily_loss_limit_pct * dec!(100)).round_dp(0),
                );
                state.breaker.trip(reason.clone());
                Some(reason)
            } else {
                None
            }
        };

        if let Some(reason) = breached {
            tracing::warn!(
                daily_pnl = %current_pnl,
                limit = %limit,
                "Daily loss limit breached, circuit breaker tripped"
            );
            self.notify(AlertSeverity::Critical, &reason);
            return LimitCheck::reject(reason);
        }

        let consumed = if current_pnl < Decimal::ZERO && limit > Decimal::ZERO {
            (-current_pnl / limit * dec!(100)).round_dp(1)
        } else {
            Decimal::ZERO
        };
        LimitCheck::allow(format!("Daily loss at {}% of limit {}", consumed, limit.round_dp(2)))
    }

    /// Trip the circuit breaker
    ///
    /// Closing open positions is delegated to the orchestrator's trading
    /// engine; the guard only latches the halt and notifies.
    pub fn trigger_circuit_breaker(&self, reason: &str) {
        self.state().breaker.trip(reason);
        tracing::warn!(reason = %reason, "Circuit breaker tripped");
        self.notify(AlertSeverity::Critical, reason);
    }

    /// Manual-only clear; there is no automatic recovery timer
    pub fn reset_circuit_breaker(&self) {
        self.state().breaker.reset();
        tracing::info!("Circuit breaker reset");
        self.notify(AlertSeverity::Info, "Circuit breaker manually reset");
    }

    pub fn is_circuit_breaker_active(&self) -> bool {
        self.state().breaker.is_active()
    }

    pub fn circuit_breaker_reason(&self) -> Option<String> {
        self.state().breaker.reason().map(str::to_string)
    }

    /// Concentration check with the default thresholds (40% single
    /// position, 60% for the top three together)
    pub fn check_position_concentration(&self) -> ConcentrationCheck {
        self.check_position_concentration_with(dec!(0.4))
    }

    /// Concentration check against a caller-supplied largest-position cap
    pub fn check_position_concentration_with(
        &self,
        max_concentration_pct: Decimal,
    ) -> ConcentrationCheck {
        let state = self.state();
        let portfolio_value = self.limits.max_portfolio_value;
        let mut warnings = Vec::new();

        if let Some(largest) = state.ledger.largest_position() {
            let pct = largest.position_value / portfolio_value;
            if pct > max_concentration_pct {
                warnings.push(format!(
                    "Largest position {} is {}% of portfolio (max {}%)",
                    largest.symbol,
                    (pct * dec!(100)).round_dp(1),
                    (max_concentration_pct * dec!(100)).round_dp(0),
                ));
            }
        }

        let top3: Decimal = state.ledger.values_descending().into_iter().take(3).sum();
        let top3_pct = top3 / portfolio_value;
        if top3_pct > dec!(0.6) {
            warnings.push(format!(
                "Top 3 positions are {}% of portfolio (max 60%)",
                (top3_pct * dec!(100)).round_dp(1),
            ));
        }

        ConcentrationCheck {
            is_diversified: warnings.is_empty(),
            warnings,
        }
    }

    /// Register a newly opened position
    pub fn add_position(&self, position: PositionInfo) {
        self.state().ledger.add(position);
    }

    /// Drop a closed position; unknown symbols warn and no-op
    pub fn remove_position(&self, symbol: &str) -> Option<PositionInfo> {
        self.state().ledger.remove(symbol)
    }

    /// Mark a position to a new price; unknown symbols warn and no-op
    pub fn update_position(&self, symbol: &str, current_price: Decimal, unrealized_pnl: Decimal) {
        self.state().ledger.update(symbol, current_price, unrealized_pnl);
    }

    /// Snapshot of one position
    pub fn get_position(&self, symbol: &str) -> Option<PositionInfo> {
        self.state().ledger.get(symbol).cloned()
    }

    /// Snapshot of all open positions
    pub fn open_positions(&self) -> Vec<PositionInfo> {
        self.state().ledger.all().into_iter().cloned().collect()
    }

    /// Largest open position and its share of portfolio value
    pub fn largest_position(&self) -> Option<(PositionInfo, Decimal)> {
        let state = self.state();
        state.ledger.largest_position().map(|p| {
            let pct = p.position_value / self.limits.max_portfolio_value;
            (p.clone(), pct)
        })
    }

    /// Computed portfolio snapshot, derived from the position set at call
    /// time
    pub fn portfolio_status(&self) -> PortfolioStatus {
        let state = self.state();
        let portfolio_value = self.limits.max_portfolio_value;
        let total_exposure = state.ledger.total_exposure();
        let largest = state.ledger.largest_position();

        PortfolioStatus {
            total_portfolio_value: portfolio_value,
            open_positions: state.ledger.len(),
            total_exposure,
            exposure_pct: total_exposure / portfolio_value,
            largest_position_symbol: largest.map(|p| p.symbol.clone()),
            largest_position_value: largest.map(|p| p.position_value).unwrap_or(Decimal::ZERO),
            largest_position_pct: largest
                .map(|p| p.position_value / portfolio_value)
                .unwrap_or(Decimal::ZERO),
            total_unrealized_pnl: state.ledger.total_unrealized_pnl(),
            daily_pnl: state.daily_pnl,
            timestamp: Utc::now(),
        }
    }

    /// Export portfolio gauges to the metrics recorder
    pub fn record_gauges(&self) {
        let status = self.portfolio_status();
        set_gauge(
            GaugeMetric::TotalExposure,
            status.total_exposure.try_into().unwrap_or(0.0),
        );
        set_gauge(
            GaugeMetric::ExposurePct,
            status.exposure_pct.try_into().unwrap_or(0.0),
        );
        set_gauge(
            GaugeMetric::UnrealizedPnl,
            status.total_unrealized_pnl.try_into().unwrap_or(0.0),
        );
        set_gauge(
            GaugeMetric::DailyPnl,
            status.daily_pnl.try_into().unwrap_or(0.0),
        );
        set_gauge(GaugeMetric::OpenPositions, status.open_positions as f64);
        set_gauge(
            GaugeMetric::CircuitBreakerActive,
            if self.is_circuit_breaker_active() { 1.0 } else { 0.0 },
        );
    }

    fn notify(&self, severity: AlertSeverity, message: &str) {
        if let Some(sink) = &self.alert {
            sink.notify(severity, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::PositionSide;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn chf_limits() -> PortfolioLimits {
        // 2626.96 CHF portfolio, 10% single position, 80% exposure, 7% daily loss
        PortfolioLimits::new(dec!(2626.96), dec!(0.10), dec!(0.80), dec!(0.07), 3).unwrap()
    }

    fn guard() -> PortfolioGuard {
        PortfolioGuard::new(chf_limits())
    }

    #[test]
    fn test_position_within_single_limit_allowed() {
        // 300 CHF against a 262.70 CHF cap? No: 10% of 2626.96 = 262.696,
        // so 300 is rejected; 250 passes.
        let guard = guard();
        let check = guard.check_position_limits(dec!(250));
        assert!(check.allowed, "{}", check.reason);
    }

    #[test]
    fn test_position_over_single_limit_rejected() {
        let guard = guard();
        let check = guard.check_position_limits(dec!(300));
        assert!(!check.allowed);
        assert!(check.reason.contains("single-position limit"));
        assert!(check.reason.contains("262.70"));
    }

    #[test]
    fn test_exposure_limit_rejected() {
        // Single-position cap 50%, exposure cap 60%: a second large
        // position passes the single check but breaches total exposure.
        let limits =
            PortfolioLimits::new(dec!(1000), dec!(0.50), dec!(0.60), dec!(0.07), 3).unwrap();
        let guard = PortfolioGuard::new(limits);
        guard.add_position(PositionInfo::new(
            "BTCUSDT",
            PositionSide::Long,
            dec!(1),
            dec!(400),
            1,
        ));

        let check = guard.check_position_limits(dec!(300));
        assert!(!check.allowed);
        assert!(check.reason.contains("exposure"));
    }

    #[test]
    fn test_leverage_limit() {
        let guard = guard();
        assert!(guard.check_leverage_limit(3).allowed);
        let check = guard.check_leverage_limit(5);
        assert!(!check.allowed);
        assert!(check.reason.contains("5x"));
    }

    #[test]
    fn test_daily_loss_within_limit() {
        let guard = guard();
        // Limit is 183.8872; -100 is within it
        let check = guard.check_daily_loss_limit(dec!(-100));
        assert!(check.allowed);
        assert!(!guard.is_circuit_breaker_active());
    }

    #[test]
    fn test_daily_loss_breach_trips_breaker() {
        let guard = guard();
        // 7% of 2626.96 = 183.8872; -200 breaches
        let check = guard.check_daily_loss_limit(dec!(-200));
        assert!(!check.allowed);
        assert!(guard.is_circuit_breaker_active());
    }

    #[test]
    fn test_breaker_latches_until_reset() {
        let guard = guard();
        guard.trigger_circuit_breaker("manual halt");

        for _ in 0..5 {
            assert!(!guard.check_position_limits(dec!(10)).allowed);
            assert!(guard.is_circuit_breaker_active());
        }

        guard.reset_circuit_breaker();
        assert!(!guard.is_circuit_breaker_active());
        assert!(guard.check_position_limits(dec!(10)).allowed);
    }

    #[test]
    fn test_breaker_rejection_cites_reason() {
        let guard = guard();
        guard.trigger_circuit_breaker("daily loss limit");
        let check = guard.check_position_limits(dec!(10));
        assert!(check.reason.contains("daily loss limit"));
    }

    #[test]
    fn test_alert_sink_notified_on_trip() {
        struct Counter(AtomicUsize);
        impl AlertSink for Counter {
            fn notify(&self, severity: AlertSeverity, _message: &str) {
                if severity == AlertSeverity::Critical {
                    self.0.fetch_add(1, Ordering::SeqCst);
                }
            }
        }

        let sink = Arc::new(Counter(AtomicUsize::new(0)));
        let guard = PortfolioGuard::new(chf_limits()).with_alert_sink(sink.clone());

        guard.check_daily_loss_limit(dec!(-200));
        assert_eq!(sink.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concentration_flags_largest() {
        let guard = guard();
        // 1200 of 2626.96 is ~45.7%, above the 40% default
        guard.add_position(PositionInfo::new(
            "BTCUSDT",
            PositionSide::Long,
            dec!(1),
            dec!(1200),
            1,
        ));

        let check = guard.check_position_concentration();
        assert!(!check.is_diversified);
        assert!(check.warnings[0].contains("BTCUSDT"));
    }

    #[test]
    fn test_concentration_flags_top_three() {
        let guard = guard();
        for (symbol, value) in [("A", 600), ("B", 550), ("C", 500), ("D", 50)] {
            guard.add_position(PositionInfo::new(
                symbol,
                PositionSide::Long,
                dec!(1),
                Decimal::from(value),
                1,
            ));
        }

        // Top 3 = 1650 of 2626.96 ≈ 62.8% > 60%
        let check = guard.check_position_concentration_with(dec!(0.9));
        assert!(!check.is_diversified);
        assert!(check.warnings.iter().any(|w| w.contains("Top 3")));
    }

    #[test]
    fn test_concentration_ok_when_diversified() {
        let guard = guard();
        for (symbol, value) in [("A", 200), ("B", 180), ("C", 150)] {
            guard.add_position(PositionInfo::new(
                symbol,
                PositionSide::Long,
                dec!(1),
                Decimal::from(value),
                1,
            ));
        }

        let check = guard.check_position_concentration();
        assert!(check.is_diversified, "{:?}", check.warnings);
    }

    #[test]
    fn test_portfolio_status() {
        let guard = guard();
        guard.add_position(PositionInfo::new(
            "BTCUSDT",
            PositionSide::Long,
            dec!(0.01),
            dec!(20000),
            2,
        ));
        guard.update_position("BTCUSDT", dec!(21000), dec!(10));
        guard.check_daily_loss_limit(dec!(-50));

        let status = guard.portfolio_status();
        assert_eq!(status.open_positions, 1);
        assert_eq!(status.total_exposure, dec!(210));
        assert_eq!(status.largest_position_symbol.as_deref(), Some("BTCUSDT"));
        assert_eq!(status.total_unrealized_pnl, dec!(10));
        assert_eq!(status.daily_pnl, dec!(-50));
    }

    #[test]
    fn test_largest_position() {
        let guard = guard();
        assert!(guard.largest_position().is_none());

        guard.add_position(PositionInfo::new(
            "BTCUSDT",
            PositionSide::Long,
            dec!(1),
            dec!(262.696),
            1,
        ));

        let (position, pct) = guard.largest_position().unwrap();
        assert_eq!(position.symbol, "BTCUSDT");
        // 262.696 of 2626.96 is exactly 10%
        assert_eq!(pct, dec!(0.1));
    }
}
