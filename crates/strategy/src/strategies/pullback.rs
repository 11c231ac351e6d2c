use common::{Direction, SignalResult};

use crate::config::StrategyProfile;
use crate::indicators::{atr, ema_series, features, has_volatility, rsi};
use crate::window::CandleWindow;
use crate::Strategy;

const FAST: usize = 20;
const SLOW: usize = 50;
/// Bars over which EMA20 must keep sloping with the trend.
const SLOPE_BARS: usize = 3;

/// Trend-pullback: in an EMA20/EMA50 trend the confirm candle dips into
/// EMA20, closes back on the trend side with a rejection wick, and RSI
/// agrees. Repeated closes through EMA20 mean the trend is tired.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrendPullback;

impl Strategy for TrendPullback {
    fn family(&self) -> &'static str {
        "trend_pullback"
    }

    fn min_candles(&self) -> usize {
        60
    }

    fn evaluate(
        &self,
        _instrument: &str,
        window: &CandleWindow<'_>,
        profile: &StrategyProfile,
    ) -> SignalResult {
        let closed = window.closed();
        let c = window.confirm_index();
        let lookback = profile.pullback_failure_lookback;
        if c < SLOW || c < lookback || c < SLOPE_BARS {
            return SignalResult::neutral_because("insufficient data");
        }
        let volatility = atr(closed, profile.atr_period);
        if !has_volatility(volatility) {
            return SignalResult::neutral_because("no volatility data");
        }

        let closes = window.closes();
        let fast = ema_series(&closes, FAST);
        let slow = ema_series(&closes, SLOW);
        let rising = (c + 1 - SLOPE_BARS..=c).all(|i| fast[i] > fast[i - 1]);
        let falling = (c + 1 - SLOPE_BARS..=c).all(|i| fast[i] < fast[i - 1]);

        let direction = if fast[c] > slow[c] && rising && slow[c] > slow[c - 1] {
            Direction::Call
        } else if fast[c] < slow[c] && falling && slow[c] < slow[c - 1] {
            Direction::Put
        } else {
            return SignalResult::neutral_because("no established trend");
        };

        let failures = (c - lookback..c)
            .filter(|&i| match direction {
                Direction::Call => closes[i] < fast[i],
                Direction::Put => closes[i] > fast[i],
            })
            .count();
        if failures > profile.pullback_max_failures {
            return SignalResult::neutral_because("repeated EMA20 failures");
        }

        let candle = window.confirm();
        let f = features(candle);
        let momentum = rsi(&closes, profile.rsi_period);
        let (touched, wick) = match direction {
            Direction::Call => (
                candle.low <= fast[c] && candle.close > fast[c] && momentum > 50.0,
                f.lower_wick_ratio,
            ),
            Direction::Put => (
                candle.high >= fast[c] && candle.close < fast[c] && momentum < 50.0,
                f.upper_wick_ratio,
            ),
        };
        if !touched || wick < profile.pullback_min_wick_ratio {
            return SignalResult::neutral();
        }

        let separation = ((fast[c] - slow[c]).abs() / volatility).min(2.0);
        let confidence =
            74.0 + ((wick - profile.pullback_min_wick_ratio) * 30.0).min(8.0) + separation * 4.0;
        SignalResult::directional(
            direction,
            confidence.min(92.0),
            format!("{direction} pullback into EMA20"),
        )
    }
}
