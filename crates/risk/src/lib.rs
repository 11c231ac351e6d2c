pub mod limits;

pub use limits::{SessionLimits, StopReason, MAX_TRADES_CEILING};
