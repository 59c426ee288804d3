//! Telemetry module
//!
//! Structured logging and Prometheus gauges

mod logging;
mod metrics;

pub use self::logging::{init_logging, LogFormat};
pub use self::metrics::{set_gauge, GaugeMetric};

use crate::config::TelemetryConfig;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Guard holding the installed telemetry backends
pub struct TelemetryGuard {
    prometheus: Option<PrometheusHandle>,
}

impl TelemetryGuard {
    /// Render the current Prometheus scrape payload, if the exporter is
    /// enabled
    pub fn render_prometheus(&self) -> Option<String> {
        self.prometheus.as_ref().map(|h| h.render())
    }
}

/// Initialize all telemetry subsystems
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<TelemetryGuard> {
    init_logging(&config.log_level)?;

    let prometheus = if config.prometheus_enabled {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;
        Some(handle)
    } else {
        None
    };

    Ok(TelemetryGuard { prometheus })
}
