//! risk-engine: Portfolio risk and position-sizing engine for crypto trading
//!
//! This library provides the core components for:
//! - Portfolio limit enforcement and the trading circuit breaker
//! - In-memory position ledger with exposure and P&L aggregates
//! - Pairwise correlation analysis of position returns
//! - Fractional Kelly position sizing from trade history
//! - Risk metrics (Sharpe, Sortino, drawdown, VaR/CVaR) over equity curves
//! - Full observability stack
//!
//! The engine is consumed by an orchestrator that owns market data, trade
//! history, and order execution; this crate never touches an exchange.

pub mod alert;
pub mod analytics;
pub mod config;
pub mod correlation;
pub mod error;
pub mod feed;
pub mod guard;
pub mod kelly;
pub mod telemetry;
