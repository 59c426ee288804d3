//! Market-data types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single OHLCV candle from an exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    /// Candle open time
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// A single observed price
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PricePoint {
    /// Observed price
    pub price: Decimal,
    /// Observation timestamp
    pub timestamp: DateTime<Utc>,
}

/// Time-ascending price history for one symbol
///
/// Immutable once fetched for a calculation; an empty history stands in for
/// a symbol whose fetch failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceHistory {
    /// Trading symbol (e.g., "BTCUSDT")
    pub symbol: String,
    /// Ordered (price, timestamp) observations
    pub points: Vec<PricePoint>,
}

impl PriceHistory {
    /// Create a history from closes of a candle series
    pub fn from_candles(symbol: impl Into<String>, candles: &[Candle]) -> Self {
        Self {
            symbol: symbol.into(),
            points: candles
                .iter()
                .map(|c| PricePoint {
                    price: c.close,
                    timestamp: c.timestamp,
                })
                .collect(),
        }
    }

    /// Empty history for a symbol whose fetch failed
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            points: Vec::new(),
        }
    }

    /// Prices in time order
    pub fn prices(&self) -> Vec<Decimal> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_history_from_candles() {
        let now = Utc::now();
        let candles = vec![
            Candle {
                timestamp: now,
                open: dec!(100),
                high: dec!(110),
                low: dec!(95),
                close: dec!(105),
                volume: dec!(1000),
            },
            Candle {
                timestamp: now + chrono::Duration::days(1),
                open: dec!(105),
                high: dec!(112),
                low: dec!(101),
                close: dec!(110),
                volume: dec!(900),
            },
        ];

        let history = PriceHistory::from_candles("BTCUSDT", &candles);
        assert_eq!(history.len(), 2);
        assert_eq!(history.prices(), vec![dec!(105), dec!(110)]);
    }

    #[test]
    fn test_empty_history() {
        let history = PriceHistory::empty("ETHUSDT");
        assert!(history.is_empty());
        assert_eq!(history.symbol, "ETHUSDT");
    }
}
