//! Portfolio circuit breaker
//!
//! A manual-reset trading halt. Distinct from a fault-tolerance retry
//! breaker: there is no recovery timer, only an explicit human reset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Circuit-breaker state: a latched flag plus the trip reason
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CircuitBreaker {
    active: bool,
    reason: Option<String>,
    tripped_at: Option<DateTime<Utc>>,
}

impl CircuitBreaker {
    /// Create an inactive breaker
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch the breaker; re-tripping overwrites the reason and is harmless
    pub fn trip(&mut self, reason: impl Into<String>) {
        self.active = true;
        self.reason = Some(reason.into());
        self.tripped_at = Some(Utc::now());
    }

    /// Manual-only clear
    pub fn reset(&mut self) {
        self.active = false;
        self.reason = None;
        self.tripped_at = None;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn tripped_at(&self) -> Option<DateTime<Utc>> {
        self.tripped_at
    }
}
