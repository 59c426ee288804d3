//! Portfolio limit guard module
//!
//! Position/exposure/leverage/daily-loss limits, the position ledger, and
//! the portfolio circuit breaker

mod breaker;
#[allow(clippy::module_inception)]
mod guard;
mod ledger;
mod limits;

pub use breaker::CircuitBreaker;
pub use guard::PortfolioGuard;
pub use ledger::{PortfolioStatus, PositionInfo, PositionLedger, PositionSide};
pub use limits::{ConcentrationCheck, LimitCheck, PortfolioLimits};
