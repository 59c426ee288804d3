//! Position ledger
//!
//! Authoritative in-memory store of open positions and derived aggregates.
//! Keyed by symbol; one position per symbol.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Trade side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionSide {
    Long,
    Short,
}

/// An open position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionInfo {
    /// Trading symbol, unique per open position
    pub symbol: String,
    /// Trade side
    pub side: PositionSide,
    /// Position quantity in base units
    pub quantity: Decimal,
    /// Entry price
    pub entry_price: Decimal,
    /// Latest marked price
    pub current_price: Decimal,
    /// Current unrealized P&L
    pub unrealized_pnl: Decimal,
    /// Leverage applied to the position
    pub leverage: u32,
    /// Notional value at the current price
    pub position_value: Decimal,
    /// Last mark timestamp
    pub last_update: DateTime<Utc>,
}

impl PositionInfo {
    /// Open a position at its entry price
    pub fn new(
        symbol: impl Into<String>,
        side: PositionSide,
        quantity: Decimal,
        entry_price: Decimal,
        leverage: u32,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity,
            entry_price,
            current_price: entry_price,
            unrealized_pnl: Decimal::ZERO,
            leverage,
            position_value: quantity.abs() * entry_price,
            last_update: Utc::now(),
        }
    }
}

/// Computed portfolio snapshot, derived from the position set at call time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioStatus {
    /// Configured portfolio value the limits run against
    pub total_portfolio_value: Decimal,
    /// Open position count
    pub open_positions: usize,
    /// Sum of position values
    pub total_exposure: Decimal,
    /// Exposure as a fraction of portfolio value
    pub exposure_pct: Decimal,
    /// Symbol of the largest position, if any
    pub largest_position_symbol: Option<String>,
    /// Value of the largest position
    pub largest_position_value: Decimal,
    /// Largest position as a fraction of portfolio value
    pub largest_position_pct: Decimal,
    /// Sum of unrealized P&L
    pub total_unrealized_pnl: Decimal,
    /// Last observed daily P&L
    pub daily_pnl: Decimal,
    /// Snapshot timestamp
    pub timestamp: DateTime<Utc>,
}

/// In-memory store of open positions
#[derive(Debug, Default)]
pub struct PositionLedger {
    positions: HashMap<String, PositionInfo>,
}

impl PositionLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self {
            positions: HashMap::new(),
        }
    }

    /// Add an open position; replaces (with a warning) any existing entry
    /// for the same symbol
    pub fn add(&mut self, position: PositionInfo) {
        if self.positions.contains_key(&position.symbol) {
            tracing::warn!(symbol = %position.symbol, "Replacing existing position");
        }
        self.positions.insert(position.symbol.clone(), position);
    }

    /// Remove a position; unknown symbols warn and no-op
    pub fn remove(&mut self, symbol: &str) -> Option<PositionInfo> {
        let removed = self.positions.remove(symbol);
        if removed.is_none() {
            tracing::warn!(symbol = %symbol, "Attempted to remove unknown position");
        }
        removed
    }

    /// Mark a position to a new price; unknown symbols warn and no-op
    pub fn update(&mut self, symbol: &str, current_price: Decimal, unrealized_pnl: Decimal) {
        match self.positions.get_mut(symbol) {
            Some(position) => {
                position.current_price = current_price;
                position.unrealized_pnl = unrealized_pnl;
                position.position_value = position.quantity.abs() * current_price;
                position.last_update = Utc::now();
            }
            None => {
                tracing::warn!(symbol = %symbol, "Attempted to update unknown position");
            }
        }
    }

    /// Look up a position by symbol
    pub fn get(&self, symbol: &str) -> Option<&PositionInfo> {
        self.positions.get(symbol)
    }

    /// All open positions, in map order
    pub fn all(&self) -> Vec<&PositionInfo> {
        self.positions.values().collect()
    }

    /// Sum of position values
    pub fn total_exposure(&self) -> Decimal {
        self.positions.values().map(|p| p.position_value).sum()
    }

    /// Sum of unrealized P&L
    pub fn total_unrealized_pnl(&self) -> Decimal {
        self.positions.values().map(|p| p.unrealized_pnl).sum()
    }

    /// Largest position by value
    pub fn largest_position(&self) -> Option<&PositionInfo> {
        self.positions.values().max_by_key(|p| p.position_value)
    }

    /// Position values sorted descending, for concentration checks
    pub fn values_descending(&self) -> Vec<Decimal> {
        let mut values: Vec<Decimal> = self.positions.values().map(|p| p.position_value).collect();
        values.sort_unstable_by(|a, b| b.cmp(a));
        values
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn btc_long() -> PositionInfo {
        PositionInfo::new("BTCUSDT", PositionSide::Long, dec!(0.01), dec!(30000), 2)
    }

    #[test]
    fn test_new_position_values() {
        let position = btc_long();
        assert_eq!(position.position_value, dec!(300));
        assert_eq!(position.current_price, dec!(30000));
        assert_eq!(position.unrealized_pnl, dec!(0));
    }

    #[test]
    fn test_add_and_get() {
        let mut ledger = PositionLedger::new();
        ledger.add(btc_long());

        assert_eq!(ledger.len(), 1);
        let position = ledger.get("BTCUSDT").unwrap();
        assert_eq!(position.side, PositionSide::Long);
    }

    #[test]
    fn test_update_marks_price_and_value() {
        let mut ledger = PositionLedger::new();
        ledger.add(btc_long());

        ledger.update("BTCUSDT", dec!(31000), dec!(10));

        let position = ledger.get("BTCUSDT").unwrap();
        assert_eq!(position.current_price, dec!(31000));
        assert_eq!(position.unrealized_pnl, dec!(10));
        assert_eq!(position.position_value, dec!(310)); // 0.01 * 31000
    }

    #[test]
    fn test_update_unknown_symbol_is_noop() {
        let mut ledger = PositionLedger::new();
        ledger.update("ETHUSDT", dec!(2000), dec!(5));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_remove_unknown_symbol_is_noop() {
        let mut ledger = PositionLedger::new();
        assert!(ledger.remove("ETHUSDT").is_none());
    }

    #[test]
    fn test_aggregates() {
        let mut ledger = PositionLedger::new();
        ledger.add(btc_long());
        ledger.add(PositionInfo::new(
            "ETHUSDT",
            PositionSide::Short,
            dec!(0.5),
            dec!(2000),
            1,
        ));

        ledger.update("BTCUSDT", dec!(30000), dec!(15));
        ledger.update("ETHUSDT", dec!(2000), dec!(-5));

        assert_eq!(ledger.total_exposure(), dec!(1300)); // 300 + 1000
        assert_eq!(ledger.total_unrealized_pnl(), dec!(10));
        assert_eq!(ledger.largest_position().unwrap().symbol, "ETHUSDT");
    }

    #[test]
    fn test_values_descending() {
        let mut ledger = PositionLedger::new();
        ledger.add(btc_long());
        ledger.add(PositionInfo::new(
            "ETHUSDT",
            PositionSide::Long,
            dec!(0.5),
            dec!(2000),
            1,
        ));
        ledger.add(PositionInfo::new(
            "SOLUSDT",
            PositionSide::Long,
            dec!(10),
            dec!(50),
            1,
        ));

        assert_eq!(
            ledger.values_descending(),
            vec![dec!(1000), dec!(500), dec!(300)]
        );
    }

    #[test]
    fn test_short_quantity_uses_absolute_value() {
        let position = PositionInfo::new("BTCUSDT", PositionSide::Short, dec!(-0.01), dec!(30000), 2);
        assert_eq!(position.position_value, dec!(300));
    }
}
