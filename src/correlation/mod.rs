//! Correlation analysis module
//!
//! Pairwise correlation of position returns, diversification scoring, and
//! correlation risk assessment

mod analyzer;
mod types;

pub use analyzer::CorrelationAnalyzer;
pub use types::{
    CorrelatedPair, CorrelationMatrix, CorrelationRisk, CorrelationStrength, RiskLevel,
};
