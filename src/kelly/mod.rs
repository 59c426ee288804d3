//! Kelly position sizing module
//!
//! Fractional Kelly sizing from historical trade statistics

mod sizer;
mod types;

pub use sizer::KellySizer;
pub use types::{PositionSizingResult, TradeResult, TradeStats};
