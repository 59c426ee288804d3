//! Kelly criterion position sizing
//!
//! Full Kelly from win rate and payoff ratio: `f* = W - (1 - W) / R` with
//! `R = avg_win / avg_loss`. Full Kelly is growth-optimal but ruin-prone,
//! so sizing always goes through a fractional multiplier and a sample-size
//! confidence adjustment.

use super::types::{PositionSizingResult, TradeResult, TradeStats};
use crate::config::KellyConfig;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;

/// Kelly criterion position sizer
#[derive(Debug, Clone)]
pub struct KellySizer {
    config: KellyConfig,
}

impl KellySizer {
    /// Create a sizer with the given configuration
    pub fn new(config: KellyConfig) -> Self {
        Self { config }
    }

    /// The configured fractional Kelly multiplier
    pub fn fraction(&self) -> f64 {
        self.config.fraction
    }

    /// Full Kelly percentage `W - (1 - W) / R`
    ///
    /// Returns 0.0 for degenerate inputs: win rate outside (0, 1), zero
    /// average loss, non-positive average win, or a negative Kelly edge.
    /// Capped at 1.0.
    pub fn kelly_percentage(&self, win_rate: f64, avg_win: Decimal, avg_loss: Decimal) -> f64 {
        if win_rate <= 0.0 || win_rate >= 1.0 {
            return 0.0;
        }
        if avg_loss.is_zero() || avg_win <= Decimal::ZERO {
            return 0.0;
        }

        let ratio: f64 = (avg_win / avg_loss).abs().try_into().unwrap_or(0.0);
        if ratio <= 0.0 {
            return 0.0;
        }

        let kelly = win_rate - (1.0 - win_rate) / ratio;
        if kelly <= 0.0 {
            return 0.0;
        }
        kelly.min(1.0)
    }

    /// Apply the configured fractional multiplier
    pub fn fractional(&self, full_kelly_pct: f64) -> f64 {
        self.fractional_with(full_kelly_pct, self.config.fraction)
    }

    /// Apply an explicit fractional multiplier
    pub fn fractional_with(&self, full_kelly_pct: f64, fraction: f64) -> f64 {
        full_kelly_pct * fraction
    }

    /// Sample-size confidence multiplier
    ///
    /// Kelly parameters estimated from few trades are unreliable, so the
    /// size is shrunk: <5 samples 0.5, <10 samples 0.7, then linear up to
    /// 1.0 at `min_sample_size`.
    pub fn confidence_adjustment(&self, sample_size: usize) -> f64 {
        let min = self.config.min_sample_size;
        if sample_size < 5 {
            0.5
        } else if sample_size < 10 {
            0.7
        } else if sample_size < min && min > 10 {
            0.7 + 0.3 * (sample_size - 10) as f64 / (min - 10) as f64
        } else {
            1.0
        }
    }

    /// Recommended position size in currency
    ///
    /// Full Kelly, then the fractional multiplier, then the optional
    /// confidence adjustment (`None` leaves the size unadjusted). A zero
    /// Kelly edge yields a zero size; the result is never negative.
    pub fn position_size(
        &self,
        win_rate: f64,
        avg_win: Decimal,
        avg_loss: Decimal,
        portfolio_value: Decimal,
        confidence_adjustment: Option<f64>,
    ) -> Decimal {
        let full = self.kelly_percentage(win_rate, avg_win, avg_loss);
        let pct = self.fractional(full) * confidence_adjustment.unwrap_or(1.0);
        let size = portfolio_value * Decimal::try_from(pct).unwrap_or(Decimal::ZERO);
        size.max(Decimal::ZERO).round_dp(8)
    }

    /// Aggregate win/loss statistics from a trade history
    ///
    /// Average loss is reported as a positive amount; an empty history
    /// yields all-zero stats.
    pub fn analyze_trades(&self, trades: &[TradeResult]) -> TradeStats {
        if trades.is_empty() {
            return TradeStats::default();
        }

        let (wins, losses): (Vec<&TradeResult>, Vec<&TradeResult>) =
            trades.iter().partition(|t| t.is_win);

        let avg_win = if wins.is_empty() {
            Decimal::ZERO
        } else {
            wins.iter().map(|t| t.pnl).sum::<Decimal>() / Decimal::from(wins.len())
        };
        let avg_loss = if losses.is_empty() {
            Decimal::ZERO
        } else {
            (losses.iter().map(|t| t.pnl).sum::<Decimal>() / Decimal::from(losses.len())).abs()
        };

        TradeStats {
            win_rate: wins.len() as f64 / trades.len() as f64,
            avg_win,
            avg_loss,
            sample_size: trades.len(),
        }
    }

    /// Run the full pipeline over a lookback window of trade history
    ///
    /// Filters trades to the window (inclusive), analyzes them, and sizes
    /// with the internally computed confidence adjustment.
    pub fn size_from_history(
        &self,
        trades: &[TradeResult],
        portfolio_value: Decimal,
        lookback_days: u32,
    ) -> PositionSizingResult {
        let cutoff = Utc::now() - Duration::days(lookback_days as i64);
        let recent: Vec<TradeResult> = trades
            .iter()
            .filter(|t| t.timestamp >= cutoff)
            .cloned()
            .collect();

        let stats = self.analyze_trades(&recent);
        let full = self.kelly_percentage(stats.win_rate, stats.avg_win, stats.avg_loss);
        let fractional = self.fractional(full);
        let confidence = self.confidence_adjustment(stats.sample_size);

        let pct = fractional * confidence;
        let recommended_size = (portfolio_value * Decimal::try_from(pct).unwrap_or(Decimal::ZERO))
            .max(Decimal::ZERO)
            .round_dp(8);

        let win_loss_ratio = if stats.avg_loss.is_zero() {
            0.0
        } else {
            (stats.avg_win / stats.avg_loss).abs().try_into().unwrap_or(0.0)
        };

        tracing::debug!(
            sample_size = stats.sample_size,
            win_rate = stats.win_rate,
            full_kelly_pct = full,
            fractional_kelly_pct = fractional,
            confidence_adjustment = confidence,
            recommended_size = %recommended_size,
            "Kelly sizing from trade history"
        );

        PositionSizingResult {
            win_rate: stats.win_rate,
            avg_win: stats.avg_win,
            avg_loss: stats.avg_loss,
            win_loss_ratio,
            full_kelly_pct: full,
            fractional_kelly_pct: fractional,
            confidence_adjustment: confidence,
            recommended_size,
            sample_size: stats.sample_size,
            timestamp: Utc::now(),
        }
    }

    /// Recommend a Kelly fraction from realized P&L variance
    ///
    /// High-variance histories get the conservative fraction, medium the
    /// moderate one, otherwise the configured default. Thresholds are in
    /// the account's currency unit.
    pub fn recommend_fraction(&self, trades: &[TradeResult]) -> f64 {
        if trades.is_empty() {
            return self.config.fraction;
        }

        let pnls: Vec<f64> = trades
            .iter()
            .map(|t| t.pnl.try_into().unwrap_or(0.0))
            .collect();
        let n = pnls.len() as f64;
        let mean = pnls.iter().sum::<f64>() / n;
        let variance = pnls.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();

        if std_dev > self.config.high_variance_stdev {
            self.config.conservative_fraction
        } else if std_dev > self.config.medium_variance_stdev {
            self.config.moderate_fraction
        } else {
            self.config.fraction
        }
    }
}

impl Default for KellySizer {
    fn default() -> Self {
        Self::new(KellyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sizer() -> KellySizer {
        KellySizer::default()
    }

    fn trade(pnl: Decimal, days_ago: i64) -> TradeResult {
        TradeResult::new(
            "BTCUSDT",
            dec!(100),
            dec!(100) + pnl,
            dec!(1),
            pnl,
            Utc::now() - Duration::days(days_ago),
        )
    }

    #[test]
    fn test_breakeven_edge_is_zero() {
        // W = 0.5, R = 1 -> 0.5 - 0.5/1 = 0
        assert_eq!(sizer().kelly_percentage(0.5, dec!(100), dec!(100)), 0.0);
    }

    #[test]
    fn test_positive_edge() {
        // W = 0.6, R = 2 -> 0.6 - 0.4/2 = 0.4
        let kelly = sizer().kelly_percentage(0.6, dec!(100), dec!(50));
        assert!((kelly - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_inputs_are_zero() {
        let s = sizer();
        assert_eq!(s.kelly_percentage(0.0, dec!(100), dec!(50)), 0.0);
        assert_eq!(s.kelly_percentage(1.0, dec!(100), dec!(50)), 0.0);
        assert_eq!(s.kelly_percentage(0.6, dec!(100), dec!(0)), 0.0);
        assert_eq!(s.kelly_percentage(0.6, dec!(0), dec!(50)), 0.0);
        assert_eq!(s.kelly_percentage(0.6, dec!(-10), dec!(50)), 0.0);
        // Negative edge: W = 0.3, R = 1
        assert_eq!(s.kelly_percentage(0.3, dec!(100), dec!(100)), 0.0);
    }

    #[test]
    fn test_kelly_capped_at_one() {
        // W = 0.99, R = 1000 -> essentially 0.99, under the cap; push with
        // an extreme ratio to verify the cap holds
        let kelly = sizer().kelly_percentage(0.999999, dec!(1000000), dec!(1));
        assert!(kelly <= 1.0);
    }

    #[test]
    fn test_fractional_default_quarter() {
        let s = sizer();
        assert!((s.fractional(0.4) - 0.1).abs() < 1e-12);
        assert!((s.fractional_with(0.4, 0.5) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_confidence_tiers() {
        let s = sizer();
        assert_eq!(s.confidence_adjustment(3), 0.5);
        assert_eq!(s.confidence_adjustment(7), 0.7);
        // Linear between 10 and min_sample_size (30): at 20, 0.7 + 0.3 * 0.5
        assert!((s.confidence_adjustment(20) - 0.85).abs() < 1e-9);
        assert_eq!(s.confidence_adjustment(30), 1.0);
        assert_eq!(s.confidence_adjustment(50), 1.0);
        assert!(s.confidence_adjustment(3) < s.confidence_adjustment(50));
    }

    #[test]
    fn test_position_size_monotone_in_win_rate() {
        let s = sizer();
        let mut last = Decimal::MIN;
        for win_rate in [0.3, 0.4, 0.5, 0.6, 0.7, 0.8] {
            let size = s.position_size(win_rate, dec!(100), dec!(50), dec!(10000), None);
            assert!(size >= last, "size decreased at win_rate {}", win_rate);
            last = size;
        }
    }

    #[test]
    fn test_position_size_zero_edge_is_zero() {
        let size = sizer().position_size(0.5, dec!(100), dec!(100), dec!(10000), None);
        assert_eq!(size, dec!(0));
    }

    #[test]
    fn test_position_size_confidence_shrinks() {
        let s = sizer();
        let unadjusted = s.position_size(0.6, dec!(100), dec!(50), dec!(10000), None);
        let adjusted = s.position_size(0.6, dec!(100), dec!(50), dec!(10000), Some(0.5));
        assert_eq!(adjusted, unadjusted / dec!(2));
    }

    #[test]
    fn test_analyze_trades() {
        let trades = vec![
            trade(dec!(100), 1),
            trade(dec!(60), 2),
            trade(dec!(-40), 3),
            trade(dec!(-40), 4),
        ];
        let stats = sizer().analyze_trades(&trades);

        assert_eq!(stats.win_rate, 0.5);
        assert_eq!(stats.avg_win, dec!(80));
        assert_eq!(stats.avg_loss, dec!(40)); // reported positive
        assert_eq!(stats.sample_size, 4);
    }

    #[test]
    fn test_analyze_empty_history() {
        let stats = sizer().analyze_trades(&[]);
        assert_eq!(stats, TradeStats::default());
    }

    #[test]
    fn test_size_from_empty_history_is_zero() {
        let result = sizer().size_from_history(&[], dec!(10000), 30);
        assert_eq!(result.recommended_size, dec!(0));
        assert_eq!(result.sample_size, 0);
        assert_eq!(result.win_rate, 0.0);
    }

    #[test]
    fn test_size_from_history_filters_lookback() {
        // Old losing trades fall outside the 30-day window; only the
        // recent winners remain, and with no losses Kelly is zero
        let trades = vec![
            trade(dec!(50), 1),
            trade(dec!(50), 2),
            trade(dec!(-500), 90),
            trade(dec!(-500), 91),
        ];
        let result = sizer().size_from_history(&trades, dec!(10000), 30);
        assert_eq!(result.sample_size, 2);
        assert_eq!(result.win_rate, 1.0);
        assert_eq!(result.recommended_size, dec!(0));
    }

    #[test]
    fn test_size_from_history_pipeline() {
        // 6 wins of 100, 4 losses of 50 over the last 10 days:
        // W = 0.6, R = 2 -> full 0.4, quarter 0.1, confidence(10) = 0.7
        let mut trades = Vec::new();
        for i in 0..6 {
            trades.push(trade(dec!(100), i));
        }
        for i in 6..10 {
            trades.push(trade(dec!(-50), i as i64));
        }

        let result = sizer().size_from_history(&trades, dec!(10000), 30);
        assert!((result.full_kelly_pct - 0.4).abs() < 1e-9);
        assert!((result.fractional_kelly_pct - 0.1).abs() < 1e-9);
        assert!((result.win_loss_ratio - 2.0).abs() < 1e-9);
        // 10000 * 0.1 * 0.7 = 700
        assert_eq!(result.recommended_size, dec!(700));
    }

    #[test]
    fn test_recommend_fraction_by_variance() {
        let s = sizer();

        // Alternating +-500: std dev 500 > 100 -> conservative
        let wild: Vec<TradeResult> = (0..10)
            .map(|i| trade(if i % 2 == 0 { dec!(500) } else { dec!(-500) }, i))
            .collect();
        assert_eq!(s.recommend_fraction(&wild), 0.10);

        // Alternating +-60: std dev 60 -> moderate
        let medium: Vec<TradeResult> = (0..10)
            .map(|i| trade(if i % 2 == 0 { dec!(60) } else { dec!(-60) }, i))
            .collect();
        assert_eq!(s.recommend_fraction(&medium), 0.20);

        // Alternating +-10: std dev 10 -> default
        let calm: Vec<TradeResult> = (0..10)
            .map(|i| trade(if i % 2 == 0 { dec!(10) } else { dec!(-10) }, i))
            .collect();
        assert_eq!(s.recommend_fraction(&calm), 0.25);

        assert_eq!(s.recommend_fraction(&[]), 0.25);
    }
}
