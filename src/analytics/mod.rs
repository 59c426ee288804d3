//! Risk analytics module
//!
//! Pure risk and trade-performance statistics over returns and equity
//! curves

mod metrics;

pub use metrics::{MetricsCalculator, RiskMetrics};
