//! Kelly sizing types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A completed trade, input to Kelly analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeResult {
    /// Record identifier
    pub id: Uuid,
    /// Trading symbol
    pub symbol: String,
    /// Entry price
    pub entry_price: Decimal,
    /// Exit price
    pub exit_price: Decimal,
    /// Traded quantity
    pub quantity: Decimal,
    /// Realized P&L
    pub pnl: Decimal,
    /// Whether the trade was profitable
    pub is_win: bool,
    /// Trade close timestamp
    pub timestamp: DateTime<Utc>,
}

impl TradeResult {
    /// Create a trade record; the win flag follows the P&L sign
    pub fn new(
        symbol: impl Into<String>,
        entry_price: Decimal,
        exit_price: Decimal,
        quantity: Decimal,
        pnl: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.into(),
            entry_price,
            exit_price,
            quantity,
            pnl,
            is_win: pnl > Decimal::ZERO,
            timestamp,
        }
    }
}

/// Aggregate statistics over a trade history
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeStats {
    /// Fraction of winning trades
    pub win_rate: f64,
    /// Mean P&L of winning trades
    pub avg_win: Decimal,
    /// Mean loss of losing trades, reported as a positive amount
    pub avg_loss: Decimal,
    /// Number of trades analyzed
    pub sample_size: usize,
}

/// Full output of the Kelly sizing pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionSizingResult {
    /// Fraction of winning trades
    pub win_rate: f64,
    /// Mean winning P&L
    pub avg_win: Decimal,
    /// Mean loss, positive
    pub avg_loss: Decimal,
    /// avg_win / avg_loss, 0 when undefined
    pub win_loss_ratio: f64,
    /// Full Kelly percentage
    pub full_kelly_pct: f64,
    /// Kelly percentage after the fractional multiplier
    pub fractional_kelly_pct: f64,
    /// Sample-size confidence multiplier applied to the size
    pub confidence_adjustment: f64,
    /// Recommended position size in currency
    pub recommended_size: Decimal,
    /// Number of trades behind the estimate
    pub sample_size: usize,
    /// Calculation timestamp
    pub timestamp: DateTime<Utc>,
}
