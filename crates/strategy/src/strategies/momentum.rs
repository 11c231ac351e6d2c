use common::{Candle, Direction, SignalResult};

use crate::config::StrategyProfile;
use crate::indicators::candle::RANGE_EPSILON;
use crate::indicators::{features, CandleFeatures};
use crate::window::CandleWindow;
use crate::Strategy;

/// Streaks longer than this add no confidence.
const MAX_COUNTED_STREAK: usize = 6;

/// Momentum-N: N consecutive same-colour confirmed candles, each closing
/// beyond the previous one, with non-shrinking bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct Momentum;

impl Strategy for Momentum {
    fn family(&self) -> &'static str {
        "momentum"
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
        let confirm = features(window.confirm());
        let direction = if confirm.bullish {
            Direction::Call
        } else if confirm.bearish {
            Direction::Put
        } else {
            return SignalResult::neutral_because("confirm candle has no body");
        };

        let needed = profile.momentum_streak;
        let mut streak = 0usize;
        let mut newer: Option<(&Candle, CandleFeatures)> = None;
        for k in 0..MAX_COUNTED_STREAK.max(needed) {
            let Some(candle) = window.back(k) else {
                break;
            };
            let f = features(candle);
            let same_colour = match direction {
                Direction::Call => f.bullish,
                Direction::Put => f.bearish,
            };
            if !same_colour || f.body_ratio < profile.momentum_min_body_ratio {
                break;
            }
            if let Some((next, next_f)) = newer {
                let progressing = match direction {
                    Direction::Call => next.close > candle.close,
                    Direction::Put => next.close < candle.close,
                };
                if !progressing || next_f.body + RANGE_EPSILON < f.body {
                    break;
                }
            }
            streak += 1;
            newer = Some((candle, f));
        }

        if streak < needed {
            return SignalResult::neutral_because(format!("streak {streak} below {needed}"));
        }
        let confidence = (70.0 + 5.0 * streak as f64).min(95.0);
        SignalResult::directional(
            direction,
            confidence,
            format!("{streak} consecutive {direction} candles"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::fixtures::{bars, chop, closed};
    use common::Action;

    fn with_streak(bodies: &[f64], bullish: bool) -> Vec<Candle> {
        let mut ohlc = chop(30, 1.1);
        let mut price: f64 = 1.1;
        for &b in bodies {
            let (o, c) = if bullish { (price, price + b) } else { (price, price - b) };
            let (h, l) = (o.max(c) + 0.0001, o.min(c) - 0.0001);
            ohlc.push((o, h, l, c));
            price = c;
        }
        bars(&ohlc)
    }

    #[test]
    fn three_green_candles_call() {
        let candles = with_streak(&[0.0006, 0.0006, 0.0008], true);
        let r = Momentum.evaluate("EURUSD-OTC", &closed(&candles), &StrategyProfile::default());
        assert_eq!(r.action, Action::Call);
        assert_eq!(r.confidence, 85.0);
    }

    #[test]
    fn three_red_candles_put() {
        let candles = with_streak(&[0.0006, 0.0007, 0.0007], false);
        let r = Momentum.evaluate("EURUSD-OTC", &closed(&candles), &StrategyProfile::default());
        assert_eq!(r.action, Action::Put);
    }

    #[test]
    fn shrinking_body_breaks_streak() {
        let candles = with_streak(&[0.0008, 0.0006, 0.0006], true);
        let r = Momentum.evaluate("EURUSD-OTC", &closed(&candles), &StrategyProfile::default());
        assert_eq!(r.action, Action::Neutral);
    }

    #[test]
    fn two_candles_are_not_enough() {
        let candles = with_streak(&[0.0006, 0.0006], true);
        let r = Momentum.evaluate("EURUSD-OTC", &closed(&candles), &StrategyProfile::default());
        assert_eq!(r.action, Action::Neutral);
    }

    #[test]
    fn longer_streak_scores_higher_but_caps() {
        let candles = with_streak(&[0.0006; 8], true);
        let r = Momentum.evaluate("EURUSD-OTC", &closed(&candles), &StrategyProfile::default());
        assert_eq!(r.action, Action::Call);
        assert_eq!(r.confidence, 95.0);
    }
}
