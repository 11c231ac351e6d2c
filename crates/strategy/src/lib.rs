pub mod config;
pub mod gate;
pub mod indicators;
pub mod market;
pub mod pipeline;
pub mod registry;
pub mod resample;
pub mod strategies;
pub mod window;

pub use config::{ProfileBook, StrategyProfile};
pub use market::{is_otc, MarketClass, MarketKind};
pub use pipeline::{trend_filter, CooldownTracker, PipelineConfig, SignalPipeline};
pub use registry::{StrategyRegistry, StrategySpec};
pub use resample::{is_native_timeframe, resample_to_n, NATIVE_TIMEFRAMES};
pub use window::{CandleWindow, WindowAlignment};

use common::SignalResult;

/// All strategy families must satisfy this trait.
///
/// Implementations are pure: no I/O, no interior state, safe to call from
/// any task.
pub trait Strategy: Send + Sync {
    /// Family name, shared by every canonical strategy built on it.
    fn family(&self) -> &'static str;

    /// Fewest candles the family needs before it will consider a signal.
    fn min_candles(&self) -> usize;

    /// Evaluate the window at its confirm candle.
    ///
    /// Only closed candles may influence the result; `window` never exposes
    /// the forming one. Returns NEUTRAL when no setup is present.
    fn evaluate(
        &self,
        instrument: &str,
        window: &CandleWindow<'_>,
        profile: &StrategyProfile,
    ) -> SignalResult;
}
