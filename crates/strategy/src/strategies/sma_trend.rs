use common::{Direction, SignalResult};

use crate::config::StrategyProfile;
use crate::indicators::sma;
use crate::window::CandleWindow;
use crate::Strategy;

/// Close above (below) its SMA calls (puts) with flat confidence. Kept for
/// sessions configured with the legacy "SMA Trend" name.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmaTrend;

impl Strategy for SmaTrend {
    fn family(&self) -> &'static str {
        "sma_trend"
    }

    fn min_candles(&self) -> usize {
        20
    }

    fn evaluate(
        &self,
        _instrument: &str,
        window: &CandleWindow<'_>,
        profile: &StrategyProfile,
    ) -> SignalResult {
        let closes = window.closes();
        if closes.len() < profile.sma_period {
            return SignalResult::neutral_because("insufficient data");
        }
        let average = sma(&closes, profile.sma_period);
        let close = window.confirm().close;
        if close > average {
            SignalResult::directional(Direction::Call, 60.0, "close above SMA")
        } else if close < average {
            SignalResult::directional(Direction::Put, 60.0, "close below SMA")
        } else {
            SignalResult::neutral()
        }
    }
}
