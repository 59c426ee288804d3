//! REST market-data client
//!
//! Reference implementation of [`MarketData`] against a Binance-style
//! klines endpoint. Every request is bounded by the client-level timeout.

use super::{Candle, MarketData};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;

/// Default REST API base URL
pub const REST_API_URL: &str = "https://api.binance.com";

/// Configuration for the REST client
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Base URL for the klines API
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: REST_API_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// REST client for historical candles
pub struct RestMarketData {
    config: RestConfig,
    client: Client,
}

impl RestMarketData {
    /// Create a new client with default configuration
    pub fn new() -> Self {
        Self::with_config(RestConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: RestConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Parse one kline row: `[open_time_ms, open, high, low, close, volume, ...]`
    fn parse_kline(row: &serde_json::Value) -> anyhow::Result<Candle> {
        let arr = row
            .as_array()
            .ok_or_else(|| anyhow::anyhow!("kline row is not an array"))?;
        if arr.len() < 6 {
            anyhow::bail!("kline row too short: {} fields", arr.len());
        }

        let open_time_ms = arr[0]
            .as_i64()
            .ok_or_else(|| anyhow::anyhow!("invalid kline open time"))?;
        let timestamp = DateTime::<Utc>::from_timestamp_millis(open_time_ms)
            .ok_or_else(|| anyhow::anyhow!("kline open time out of range: {}", open_time_ms))?;

        let field = |i: usize| -> anyhow::Result<Decimal> {
            let s = arr[i]
                .as_str()
                .ok_or_else(|| anyhow::anyhow!("kline field {} is not a string", i))?;
            Ok(Decimal::from_str(s)?)
        };

        Ok(Candle {
            timestamp,
            open: field(1)?,
            high: field(2)?,
            low: field(3)?,
            close: field(4)?,
            volume: field(5)?,
        })
    }
}

impl Default for RestMarketData {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketData for RestMarketData {
    async fn get_ohlcv(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<Candle>> {
        let url = format!("{}/api/v3/klines", self.config.base_url);

        tracing::debug!(url = %url, symbol = %symbol, timeframe = %timeframe, limit = limit, "Fetching candles");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol),
                ("interval", timeframe),
                ("limit", &limit.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("klines API error: {} - {}", status, body);
        }

        let rows: Vec<serde_json::Value> = response.json().await?;
        let mut candles = Vec::with_capacity(rows.len());
        for row in &rows {
            candles.push(Self::parse_kline(row)?);
        }

        tracing::debug!(symbol = %symbol, candle_count = candles.len(), "Fetched candles");

        Ok(candles)
    }
}
