//! Risk metrics calculation
//!
//! Pure, single-pass statistics over a period-return series and an equity
//! curve. Currency fields stay in exact decimals; ratios and statistical
//! quantities are floating-point.

use crate::config::MetricsConfig;
use crate::kelly::TradeResult;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregate risk metrics snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Total return over the equity curve
    pub total_return: f64,
    /// Annualized total return
    pub annualized_return: f64,
    /// Annualized Sharpe ratio
    pub sharpe_ratio: f64,
    /// Annualized Sortino ratio
    pub sortino_ratio: f64,
    /// Calmar ratio (annualized return over max drawdown)
    pub calmar_ratio: f64,
    /// Maximum drawdown in currency
    pub max_drawdown: Decimal,
    /// Maximum drawdown as a fraction of its peak
    pub max_drawdown_pct: f64,
    /// Annualized volatility of returns
    pub volatility: f64,
    /// Downside deviation (per period, negative returns only)
    pub downside_deviation: f64,
    /// Value at Risk at the configured confidence
    pub value_at_risk: f64,
    /// Conditional VaR (expected shortfall)
    pub conditional_var: f64,
    /// Fraction of winning periods or trades
    pub win_rate: f64,
    /// Gross wins over gross losses
    pub profit_factor: f64,
    /// Number of trades (or periods when derived from returns)
    pub total_trades: usize,
    /// Winning count
    pub winning_trades: usize,
    /// Losing count
    pub losing_trades: usize,
    /// Gross winning amount
    pub total_wins: Decimal,
    /// Gross losing amount, positive
    pub total_losses: Decimal,
    /// Mean winning amount
    pub avg_win: Decimal,
    /// Mean losing amount, positive
    pub avg_loss: Decimal,
    /// Best single-period return
    pub best_return: f64,
    /// Worst single-period return
    pub worst_return: f64,
    /// Mean single-period return
    pub avg_return: f64,
    /// Highest equity observed
    pub equity_peak: Decimal,
    /// Final equity value
    pub equity_final: Decimal,
    /// Snapshot timestamp
    pub timestamp: DateTime<Utc>,
}

/// Risk metrics calculator
///
/// Every method is pure; degenerate inputs produce documented sentinels
/// (0.0 or the configured ratio cap) instead of errors.
#[derive(Debug, Clone)]
pub struct MetricsCalculator {
    config: MetricsConfig,
}

impl MetricsCalculator {
    /// Create a calculator with the given configuration
    pub fn new(config: MetricsConfig) -> Self {
        Self { config }
    }

    fn mean(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }

    fn std_dev(values: &[f64]) -> f64 {
        if values.len() < 2 {
            return 0.0;
        }
        let mean = Self::mean(values);
        let variance =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        variance.sqrt()
    }

    /// Annualized Sharpe ratio; 0.0 for fewer than two returns or zero
    /// standard deviation
    pub fn sharpe_ratio(&self, returns: &[f64]) -> f64 {
        if returns.len() < 2 {
            return 0.0;
        }
        let std = Self::std_dev(returns);
        if std == 0.0 {
            return 0.0;
        }

        let periods = self.config.periods_per_year as f64;
        let per_period_rf = self.config.risk_free_rate / periods;
        let excess = Self::mean(returns) - per_period_rf;
        excess / std * periods.sqrt()
    }

    /// Annualized Sortino ratio; the ratio cap stands in when there are no
    /// negative returns
    pub fn sortino_ratio(&self, returns: &[f64]) -> f64 {
        if returns.len() < 2 {
            return 0.0;
        }

        let downside = self.downside_deviation(returns);
        if downside == 0.0 {
            return self.config.ratio_cap;
        }

        let periods = self.config.periods_per_year as f64;
        let per_period_rf = self.config.risk_free_rate / periods;
        let excess = Self::mean(returns) - per_period_rf;
        excess / downside * periods.sqrt()
    }

    /// Per-period standard deviation of the negative returns only
    pub fn downside_deviation(&self, returns: &[f64]) -> f64 {
        let negatives: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
        if negatives.len() < 2 {
            return 0.0;
        }
        Self::std_dev(&negatives)
    }

    /// Maximum drawdown over an equity curve
    ///
    /// Returns the largest peak-to-trough decline in currency and as a
    /// fraction of the peak it fell from (not of the final peak).
    pub fn max_drawdown(&self, equity_curve: &[Decimal]) -> (Decimal, f64) {
        if equity_curve.len() < 2 {
            return (Decimal::ZERO, 0.0);
        }

        let mut peak = equity_curve[0];
        let mut max_dd = Decimal::ZERO;
        let mut max_dd_pct = 0.0;

        for value in &equity_curve[1..] {
            if *value > peak {
                peak = *value;
                continue;
            }
            let dd = peak - *value;
            if dd > max_dd {
                max_dd = dd;
                max_dd_pct = if peak.is_zero() {
                    0.0
                } else {
                    (dd / peak).try_into().unwrap_or(0.0)
                };
            }
        }

        (max_dd, max_dd_pct)
    }

    /// Calmar ratio; zero drawdown yields the ratio cap for a positive
    /// return and 0.0 otherwise
    pub fn calmar_ratio(&self, annualized_return: f64, max_drawdown_pct: f64) -> f64 {
        if max_drawdown_pct == 0.0 {
            return if annualized_return > 0.0 {
                self.config.ratio_cap
            } else {
                0.0
            };
        }
        annualized_return / max_drawdown_pct
    }

    /// Historical Value at Risk: the (1 − confidence) percentile of the
    /// return distribution, a negative number for any loss tail
    pub fn value_at_risk(&self, returns: &[f64], confidence: f64) -> f64 {
        if returns.is_empty() {
            return 0.0;
        }

        let mut sorted = returns.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let index = ((1.0 - confidence) * sorted.len() as f64).floor() as usize;
        sorted[index.min(sorted.len() - 1)]
    }

    /// Conditional VaR (expected shortfall): mean of returns at or below
    /// the VaR threshold; equals VaR itself when nothing falls below
    pub fn conditional_var(&self, returns: &[f64], confidence: f64) -> f64 {
        if returns.is_empty() {
            return 0.0;
        }

        let var = self.value_at_risk(returns, confidence);
        let tail: Vec<f64> = returns.iter().copied().filter(|r| *r <= var).collect();
        if tail.is_empty() {
            return var;
        }
        Self::mean(&tail)
    }

    /// Gross wins over gross losses; the ratio cap stands in when there
    /// are no losses and positive wins
    pub fn profit_factor(&self, total_wins: Decimal, total_losses: Decimal) -> f64 {
        let losses = total_losses.abs();
        if losses.is_zero() {
            return if total_wins > Decimal::ZERO {
                self.config.ratio_cap
            } else {
                0.0
            };
        }
        (total_wins / losses).try_into().unwrap_or(0.0)
    }

    /// Annualized volatility of per-period returns
    pub fn annualized_volatility(&self, returns: &[f64]) -> f64 {
        Self::std_dev(returns) * (self.config.periods_per_year as f64).sqrt()
    }

    /// Annualize a total return observed over `periods` return periods
    pub fn annualized_return(&self, total_return: f64, periods: usize) -> f64 {
        if periods == 0 || total_return <= -1.0 {
            return 0.0;
        }
        let years = periods as f64 / self.config.periods_per_year as f64;
        if years == 0.0 {
            return 0.0;
        }
        (1.0 + total_return).powf(1.0 / years) - 1.0
    }

    /// Compute every metric in one pass
    ///
    /// Trade counts and gross win/loss sums come from the supplied trades
    /// when present, otherwise they are derived from the sign of each
    /// return period.
    pub fn calculate_all(
        &self,
        returns: &[f64],
        equity_curve: &[Decimal],
        trades: Option<&[TradeResult]>,
    ) -> RiskMetrics {
        let (max_dd, max_dd_pct) = self.max_drawdown(equity_curve);

        let equity_final = equity_curve.last().copied().unwrap_or(Decimal::ZERO);
        let equity_peak = equity_curve
            .iter()
            .copied()
            .max()
            .unwrap_or(Decimal::ZERO);
        let total_return = match equity_curve.first() {
            Some(first) if !first.is_zero() => ((equity_final - *first) / *first)
                .try_into()
                .unwrap_or(0.0),
            _ => 0.0,
        };
        let annualized = self.annualized_return(total_return, returns.len());

        // Trade statistics, from trades when supplied, else from returns
        let (winning, losing, total_wins, total_losses, avg_win, avg_loss, total) =
            match trades {
                Some(trades) => {
                    let wins: Vec<Decimal> =
                        trades.iter().filter(|t| t.is_win).map(|t| t.pnl).collect();
                    let losses: Vec<Decimal> = trades
                        .iter()
                        .filter(|t| !t.is_win)
                        .map(|t| t.pnl.abs())
                        .collect();
                    let total_wins: Decimal = wins.iter().copied().sum();
                    let total_losses: Decimal = losses.iter().copied().sum();
                    let avg_win = if wins.is_empty() {
                        Decimal::ZERO
                    } else {
                        total_wins / Decimal::from(wins.len())
                    };
                    let avg_loss = if losses.is_empty() {
                        Decimal::ZERO
                    } else {
                        total_losses / Decimal::from(losses.len())
                    };
                    (
                        wins.len(),
                        losses.len(),
                        total_wins,
                        total_losses,
                        avg_win,
                        avg_loss,
                        trades.len(),
                    )
                }
                None => {
                    let wins: Vec<f64> =
                        returns.iter().copied().filter(|r| *r > 0.0).collect();
                    let losses: Vec<f64> =
                        returns.iter().copied().filter(|r| *r < 0.0).collect();
                    let total_wins =
                        Decimal::try_from(wins.iter().sum::<f64>()).unwrap_or(Decimal::ZERO);
                    let total_losses =
                        Decimal::try_from(losses.iter().map(|r| r.abs()).sum::<f64>())
                            .unwrap_or(Decimal::ZERO);
                    let avg_win = if wins.is_empty() {
                        Decimal::ZERO
                    } else {
                        total_wins / Decimal::from(wins.len())
                    };
                    let avg_loss = if losses.is_empty() {
                        Decimal::ZERO
                    } else {
                        total_losses / Decimal::from(losses.len())
                    };
                    (
                        wins.len(),
                        losses.len(),
                        total_wins,
                        total_losses,
                        avg_win,
                        avg_loss,
                        returns.len(),
                    )
                }
            };

        let win_rate = if total == 0 {
            0.0
        } else {
            winning as f64 / total as f64
        };

        RiskMetrics {
            total_return,
            annualized_return: annualized,
            sharpe_ratio: self.sharpe_ratio(returns),
            sortino_ratio: self.sortino_ratio(returns),
            calmar_ratio: self.calmar_ratio(annualized, max_dd_pct),
            max_drawdown: max_dd,
            max_drawdown_pct: max_dd_pct,
            volatility: self.annualized_volatility(returns),
            downside_deviation: self.downside_deviation(returns),
            value_at_risk: self.value_at_risk(returns, self.config.var_confidence),
            conditional_var: self.conditional_var(returns, self.config.var_confidence),
            win_rate,
            profit_factor: self.profit_factor(total_wins, total_losses),
            total_trades: total,
            winning_trades: winning,
            losing_trades: losing,
            total_wins,
            total_losses,
            avg_win,
            avg_loss,
            best_return: if returns.is_empty() {
                0.0
            } else {
                returns.iter().copied().fold(f64::NEG_INFINITY, f64::max)
            },
            worst_return: if returns.is_empty() {
                0.0
            } else {
                returns.iter().copied().fold(f64::INFINITY, f64::min)
            },
            avg_return: Self::mean(returns),
            equity_peak,
            equity_final,
            timestamp: Utc::now(),
        }
    }
}

impl Default for MetricsCalculator {
    fn default() -> Self {
        Self::new(MetricsConfig::default())
    }
}
