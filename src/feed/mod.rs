//! Market-data module
//!
//! Interface to the external market-data service supplying historical
//! candles, plus a REST reference client.

mod rest;
mod types;

pub use rest::{RestConfig, RestMarketData};
pub use types::{Candle, PriceHistory, PricePoint};

use async_trait::async_trait;

/// Trait for market-data implementations
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Fetch up to `limit` candles for a symbol at the given timeframe,
    /// oldest first
    async fn get_ohlcv(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<Candle>>;
}
