use common::{Direction, SignalResult};

use crate::config::StrategyProfile;
use crate::indicators::{atr, ema, features, has_volatility, rsi_series};
use crate::window::CandleWindow;
use crate::Strategy;

const EMA_PERIOD: usize = 50;

/// RSI mean-reversion: RSI leaves an extreme on the confirm candle, which
/// prints a fresh local extreme with a rejection wick while price is
/// stretched away from EMA50.
#[derive(Debug, Clone, Copy, Default)]
pub struct RsiReversal;

impl Strategy for RsiReversal {
    fn family(&self) -> &'static str {
        "rsi_reversal"
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
        let lookback = profile.reversal_extreme_lookback;
        if c < EMA_PERIOD || c < lookback + 1 {
            return SignalResult::neutral_because("insufficient data");
        }

        let volatility = atr(closed, profile.atr_period);
        if !has_volatility(volatility) {
            return SignalResult::neutral_because("no volatility data");
        }

        let closes = window.closes();
        let rsi = rsi_series(&closes, profile.rsi_period);
        let (r_prev, r_now) = (rsi[c - 1], rsi[c]);
        let candle = window.confirm();
        let f = features(candle);
        let prior = &closed[c - lookback..c];
        let prior_low = prior.iter().map(|p| p.low).fold(f64::INFINITY, f64::min);
        let prior_high = prior.iter().map(|p| p.high).fold(f64::NEG_INFINITY, f64::max);
        // Positive when the close sits below EMA50.
        let stretch = (ema(&closes, EMA_PERIOD) - candle.close) / volatility;

        if r_prev <= profile.rsi_oversold
            && r_now > r_prev
            && candle.low < prior_low
            && f.lower_wick_ratio >= profile.reversal_min_wick_ratio
            && stretch >= profile.reversal_ema_atr_distance
        {
            let confidence = 70.0
                + (profile.rsi_oversold - r_prev)
                + (f.lower_wick_ratio - profile.reversal_min_wick_ratio) * 40.0;
            return SignalResult::directional(
                Direction::Call,
                confidence.min(95.0),
                format!("RSI turning up from {r_prev:.1} with lower rejection wick"),
            );
        }

        if r_prev >= profile.rsi_overbought
            && r_now < r_prev
            && candle.high > prior_high
            && f.upper_wick_ratio >= profile.reversal_min_wick_ratio
            && -stretch >= profile.reversal_ema_atr_distance
        {
            let confidence = 70.0
                + (r_prev - profile.rsi_overbought)
                + (f.upper_wick_ratio - profile.reversal_min_wick_ratio) * 40.0;
            return SignalResult::directional(
                Direction::Put,
                confidence.min(95.0),
                format!("RSI turning down from {r_prev:.1} with upper rejection wick"),
            );
        }

        SignalResult::neutral()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::fixtures::{bars, closed};
    use common::Action;

    /// A steady slide (or climb) followed by a rejection candle.
    fn exhausted(falling: bool, wick: f64) -> Vec<common::Candle> {
        let step = if falling { -0.001 } else { 0.001 };
        let mut price: f64 = 1.2;
        let mut ohlc = Vec::new();
        for _ in 0..60 {
            let (o, c) = (price, price + step);
            ohlc.push((o, o.max(c) + 0.0002, o.min(c) - 0.0002, c));
            price = c;
        }
        // reverses slightly, wick pierces the recent extreme
        let o = price;
        let c = price - step * 0.3;
        if falling {
            ohlc.push((o, c + 0.0001, o - wick, c));
        } else {
            ohlc.push((o, o + wick, c - 0.0001, c));
        }
        bars(&ohlc)
    }

    #[test]
    fn oversold_rejection_calls() {
        let candles = exhausted(true, 0.003);
        let r = RsiReversal.evaluate("EURUSD-OTC", &closed(&candles), &StrategyProfile::default());
        assert_eq!(r.action, Action::Call, "{r:?}");
        assert!(r.confidence > 70.0 && r.confidence <= 95.0);
    }

    #[test]
    fn overbought_rejection_puts() {
        let candles = exhausted(false, 0.003);
        let r = RsiReversal.evaluate("EURUSD-OTC", &closed(&candles), &StrategyProfile::default());
        assert_eq!(r.action, Action::Put, "{r:?}");
    }

    #[test]
    fn short_wick_is_not_a_rejection() {
        let candles = exhausted(true, 0.0004);
        let r = RsiReversal.evaluate("EURUSD-OTC", &closed(&candles), &StrategyProfile::default());
        assert_eq!(r.action, Action::Neutral);
    }

    #[test]
    fn flat_market_abstains() {
        let candles = bars(&vec![(1.0, 1.0, 1.0, 1.0); 70]);
        let r = RsiReversal.evaluate("EURUSD-OTC", &closed(&candles), &StrategyProfile::default());
        assert_eq!(r.action, Action::Neutral);
        assert_eq!(r.reason.as_deref(), Some("no volatility data"));
    }
}
