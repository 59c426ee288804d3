//! Correlation analysis types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Strength class for an absolute correlation
///
/// One canonical threshold table, used by classification and pair
/// reporting alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
    Weak,
    Moderate,
    Strong,
    VeryStrong,
}

impl CorrelationStrength {
    /// Classify an absolute correlation: <0.3 weak, <0.5 moderate,
    /// <0.7 strong, else very strong
    pub fn from_abs(abs_correlation: f64) -> Self {
        if abs_correlation < 0.3 {
            Self::Weak
        } else if abs_correlation < 0.5 {
            Self::Moderate
        } else if abs_correlation < 0.7 {
            Self::Strong
        } else {
            Self::VeryStrong
        }
    }
}

/// Portfolio correlation risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// A flagged pair of correlated symbols, reported once per unordered pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelatedPair {
    /// Lexicographically smaller symbol
    pub symbol_a: String,
    /// Lexicographically larger symbol
    pub symbol_b: String,
    /// Pearson correlation of the pair's returns
    pub correlation: f64,
    /// Strength class of the absolute correlation
    pub strength: CorrelationStrength,
}

/// Pairwise correlation matrix over a symbol set
///
/// Built fresh per calculation; symmetric with an exact 1.0 diagonal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    /// Symbols in calculation order
    pub symbols: Vec<String>,
    /// symbol -> symbol -> correlation coefficient
    pub matrix: HashMap<String, HashMap<String, f64>>,
    /// Pairs above the configured threshold
    pub high_correlation_pairs: Vec<CorrelatedPair>,
    /// 1 − mean(|correlation|) over off-diagonal entries, in [0, 1]
    pub diversification_score: f64,
    /// Calculation timestamp
    pub timestamp: DateTime<Utc>,
}

impl CorrelationMatrix {
    /// Empty matrix with a perfect diversification score
    pub fn empty(symbols: Vec<String>) -> Self {
        Self {
            symbols,
            matrix: HashMap::new(),
            high_correlation_pairs: Vec::new(),
            diversification_score: 1.0,
            timestamp: Utc::now(),
        }
    }

    /// Correlation of a symbol pair, if present
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        self.matrix.get(a).and_then(|row| row.get(b)).copied()
    }
}

/// Correlation risk assessment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationRisk {
    /// Overall risk level
    pub level: RiskLevel,
    /// One warning per contributing condition
    pub warnings: Vec<String>,
}
