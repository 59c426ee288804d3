//! Correlation analysis over historical price series

use super::types::{
    CorrelatedPair, CorrelationMatrix, CorrelationRisk, CorrelationStrength, RiskLevel,
};
use crate::config::CorrelationConfig;
use crate::feed::{MarketData, PriceHistory};
use chrono::Utc;
use futures_util::future::join_all;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Computes pairwise correlation of position returns and flags
/// concentration risk from correlated positions
pub struct CorrelationAnalyzer {
    config: CorrelationConfig,
    market_data: Arc<dyn MarketData>,
}

impl CorrelationAnalyzer {
    /// Create an analyzer over a market-data source
    pub fn new(config: CorrelationConfig, market_data: Arc<dyn MarketData>) -> Self {
        Self {
            config,
            market_data,
        }
    }

    /// Fetch price history for each symbol concurrently
    ///
    /// Fetches are independent and joined before returning. A failed or
    /// timed-out symbol degrades to an empty history; the batch never
    /// aborts.
    pub async fn fetch_price_history(&self, symbols: &[String], days: u32) -> Vec<PriceHistory> {
        let timeout = Duration::from_secs(self.config.fetch_timeout_secs);

        let fetches = symbols.iter().map(|symbol| {
            let market_data = self.market_data.clone();
            let timeframe = self.config.timeframe.clone();
            async move {
                match tokio::time::timeout(
                    timeout,
                    market_data.get_ohlcv(symbol, &timeframe, days as usize),
                )
                .await
                {
                    Ok(Ok(candles)) => PriceHistory::from_candles(symbol.clone(), &candles),
                    Ok(Err(e)) => {
                        tracing::warn!(symbol = %symbol, error = %e, "Price history fetch failed, using empty history");
                        PriceHistory::empty(symbol.clone())
                    }
                    Err(_) => {
                        tracing::warn!(symbol = %symbol, timeout_secs = timeout.as_secs(), "Price history fetch timed out, using empty history");
                        PriceHistory::empty(symbol.clone())
                    }
                }
            }
        });

        join_all(fetches).await
    }

    /// Simple period returns `(p[i] - p[i-1]) / p[i-1]`
    ///
    /// Steps with a zero previous price are skipped; fewer than two prices
    /// yield an empty series.
    pub fn calculate_returns(prices: &[Decimal]) -> Vec<f64> {
        if prices.len() < 2 {
            return Vec::new();
        }

        let mut returns = Vec::with_capacity(prices.len() - 1);
        for i in 1..prices.len() {
            if prices[i - 1].is_zero() {
                continue;
            }
            let prev: f64 = prices[i - 1].try_into().unwrap_or(0.0);
            let curr: f64 = prices[i].try_into().unwrap_or(0.0);
            if prev != 0.0 {
                returns.push((curr - prev) / prev);
            }
        }
        returns
    }

    /// Pearson correlation coefficient of two return series
    ///
    /// Series of different lengths are truncated to the shorter one,
    /// aligned from the start. Returns 0.0 when either side has fewer than
    /// two points or the coefficient is not finite (e.g., a constant
    /// series).
    pub fn calculate_correlation(returns_a: &[f64], returns_b: &[f64]) -> f64 {
        let n = returns_a.len().min(returns_b.len());
        if n < 2 {
            return 0.0;
        }

        let a = &returns_a[..n];
        let b = &returns_b[..n];
        let nf = n as f64;

        let mean_a = a.iter().sum::<f64>() / nf;
        let mean_b = b.iter().sum::<f64>() / nf;

        let mut cov = 0.0;
        let mut var_a = 0.0;
        let mut var_b = 0.0;
        for i in 0..n {
            let da = a[i] - mean_a;
            let db = b[i] - mean_b;
            cov += da * db;
            var_a += da * da;
            var_b += db * db;
        }

        let denom = (var_a * var_b).sqrt();
        if denom == 0.0 {
            return 0.0;
        }

        let corr = cov / denom;
        if corr.is_finite() {
            corr
        } else {
            0.0
        }
    }

    /// Build the full symmetric correlation matrix for a symbol set
    ///
    /// Fewer than two symbols short-circuits to an empty matrix with a
    /// diversification score of 1.0. The diagonal is forced to exactly 1.0.
    pub async fn calculate_portfolio_correlation(
        &self,
        symbols: &[String],
        days: u32,
    ) -> CorrelationMatrix {
        if symbols.len() < 2 {
            return CorrelationMatrix::empty(symbols.to_vec());
        }

        let histories = self.fetch_price_history(symbols, days).await;
        let returns: Vec<Vec<f64>> = histories
            .iter()
            .map(|h| Self::calculate_returns(&h.prices()))
            .collect();

        let mut matrix: HashMap<String, HashMap<String, f64>> = HashMap::new();
        for symbol in symbols {
            matrix
                .entry(symbol.clone())
                .or_default()
                .insert(symbol.clone(), 1.0);
        }

        for i in 0..symbols.len() {
            for j in (i + 1)..symbols.len() {
                let corr = Self::calculate_correlation(&returns[i], &returns[j]);
                matrix
                    .entry(symbols[i].clone())
                    .or_default()
                    .insert(symbols[j].clone(), corr);
                matrix
                    .entry(symbols[j].clone())
                    .or_default()
                    .insert(symbols[i].clone(), corr);
            }
        }

        let mut result = CorrelationMatrix {
            symbols: symbols.to_vec(),
            matrix,
            high_correlation_pairs: Vec::new(),
            diversification_score: 1.0,
            timestamp: Utc::now(),
        };
        result.high_correlation_pairs =
            self.check_correlation_limits(&result, self.config.high_correlation_threshold);
        result.diversification_score = Self::calculate_diversification_score(&result);

        tracing::debug!(
            symbols = symbols.len(),
            high_pairs = result.high_correlation_pairs.len(),
            diversification_score = result.diversification_score,
            "Built portfolio correlation matrix"
        );

        result
    }

    /// Pairs whose absolute correlation exceeds the threshold
    ///
    /// Each unordered pair is visited exactly once and reported under its
    /// lexicographically sorted key.
    pub fn check_correlation_limits(
        &self,
        matrix: &CorrelationMatrix,
        threshold: f64,
    ) -> Vec<CorrelatedPair> {
        let mut pairs = Vec::new();

        for i in 0..matrix.symbols.len() {
            for j in (i + 1)..matrix.symbols.len() {
                let a = &matrix.symbols[i];
                let b = &matrix.symbols[j];
                let Some(corr) = matrix.get(a, b) else {
                    continue;
                };
                if corr.abs() > threshold {
                    let (symbol_a, symbol_b) = if a <= b { (a, b) } else { (b, a) };
                    pairs.push(CorrelatedPair {
                        symbol_a: symbol_a.clone(),
                        symbol_b: symbol_b.clone(),
                        correlation: corr,
                        strength: CorrelationStrength::from_abs(corr.abs()),
                    });
                }
            }
        }

        pairs
    }

    /// `1 − mean(|correlation|)` over off-diagonal entries, clamped to
    /// [0, 1]; 1.0 for a degenerate matrix
    pub fn calculate_diversification_score(matrix: &CorrelationMatrix) -> f64 {
        let n = matrix.symbols.len();
        if n < 2 {
            return 1.0;
        }

        let mut sum = 0.0;
        let mut count = 0usize;
        for i in 0..n {
            for j in (i + 1)..n {
                if let Some(corr) = matrix.get(&matrix.symbols[i], &matrix.symbols[j]) {
                    sum += corr.abs();
                    count += 1;
                }
            }
        }

        if count == 0 {
            return 1.0;
        }

        (1.0 - sum / count as f64).clamp(0.0, 1.0)
    }

    /// Assess overall correlation risk from a matrix
    ///
    /// LOW by default; a diversification score below 0.5 raises MEDIUM and
    /// below 0.3 raises HIGH. Any very-strong pair upgrades LOW to MEDIUM
    /// but never downgrades.
    pub fn assess_correlation_risk(&self, matrix: &CorrelationMatrix) -> CorrelationRisk {
        let mut level = RiskLevel::Low;
        let mut warnings = Vec::new();

        if matrix.diversification_score < 0.3 {
            level = RiskLevel::High;
            warnings.push(format!(
                "Very low diversification score {:.2}",
                matrix.diversification_score
            ));
        } else if matrix.diversification_score < 0.5 {
            level = RiskLevel::Medium;
            warnings.push(format!(
                "Low diversification score {:.2}",
                matrix.diversification_score
            ));
        }

        let very_strong: Vec<&CorrelatedPair> = matrix
            .high_correlation_pairs
            .iter()
            .filter(|p| p.strength == CorrelationStrength::VeryStrong)
            .collect();

        if !very_strong.is_empty() {
            if level == RiskLevel::Low {
                level = RiskLevel::Medium;
            }
            for pair in very_strong {
                warnings.push(format!(
                    "Very strong correlation {:.2} between {} and {}",
                    pair.correlation, pair.symbol_a, pair.symbol_b
                ));
            }
        }

        CorrelationRisk { level, warnings }
    }
}
