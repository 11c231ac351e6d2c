//! Strategy families. Each family is one parameterised shape; the registry
//! binds families to canonical names and market classes.

mod bollinger;
mod momentum;
mod pullback;
mod rsi_reversal;
mod sma_trend;
mod sr_reversal;

pub use bollinger::BollingerReclaim;
pub use momentum::Momentum;
pub use pullback::TrendPullback;
pub use rsi_reversal::RsiReversal;
pub use sma_trend::SmaTrend;
pub use sr_reversal::SupportResistanceReversal;
