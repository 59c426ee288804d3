//! Alerting and orchestrator interfaces
//!
//! The engine reports, the orchestrator acts: when the circuit breaker
//! trips, the guard notifies the alert sink and it is the orchestrator's
//! job to flatten positions through its trading engine.

use async_trait::async_trait;

/// Alert severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

/// Fire-and-forget notification sink
///
/// Implementations must not block; anything slow belongs behind a queue on
/// the implementer's side.
pub trait AlertSink: Send + Sync {
    /// Deliver a notification
    fn notify(&self, severity: AlertSeverity, message: &str);
}

/// Alert sink that emits tracing events at severity-mapped levels
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn notify(&self, severity: AlertSeverity, message: &str) {
        match severity {
            AlertSeverity::Info => tracing::info!(alert = message, "Risk alert"),
            AlertSeverity::Warning => tracing::warn!(alert = message, "Risk alert"),
            AlertSeverity::Critical => tracing::error!(alert = message, "Risk alert"),
        }
    }
}

/// Trading engine interface for flattening the book
///
/// Invoked by the orchestrator after a circuit-breaker trip; the risk core
/// never places or closes orders itself.
#[async_trait]
pub trait PositionCloser: Send + Sync {
    /// Close every open position, citing the halt reason
    async fn close_all_positions(&self, reason: &str) -> anyhow::Result<()>;
}
