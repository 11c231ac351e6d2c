use common::{Candle, Direction, SignalResult};

use crate::config::StrategyProfile;
use crate::indicators::{atr, bollinger, ema, has_volatility, rsi_series, BollingerBands};
use crate::window::CandleWindow;
use crate::Strategy;

const EMA_PERIOD: usize = 20;

/// Bollinger break-reclaim: during a squeeze the setup candle closes outside
/// a band and the confirm candle closes back inside, still short of EMA20,
/// with RSI turning toward the middle.
#[derive(Debug, Clone, Copy, Default)]
pub struct BollingerReclaim;

impl Strategy for BollingerReclaim {
    fn family(&self) -> &'static str {
        "bollinger_reclaim"
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
        let period = profile.bb_period;
        let lookback = profile.bb_squeeze_lookback;
        if c + 1 < period + lookback + 2 {
            return SignalResult::neutral_because("insufficient data");
        }
        if !has_volatility(atr(closed, profile.atr_period)) {
            return SignalResult::neutral_because("no volatility data");
        }

        let closes = window.closes();
        let bands_at = |i: usize| bollinger(&closes[..=i], period, profile.bb_std_dev);
        let now = bands_at(c);
        let average_width =
            (c - lookback..c).map(|i| bands_at(i).width()).sum::<f64>() / lookback as f64;
        if !(now.width() < average_width) {
            return SignalResult::neutral_because("no squeeze");
        }

        let (confirm, setup, before) = (&closed[c], &closed[c - 1], &closed[c - 2]);
        let setup_bands = bands_at(c - 1);
        let before_bands = bands_at(c - 2);
        let ema20 = ema(&closes, EMA_PERIOD);
        let rsi = rsi_series(&closes, profile.rsi_period);
        let (r_prev, r_now) = (rsi[c - 1], rsi[c]);

        let direction = if setup.close < setup_bands.lower
            && confirm.close > now.lower
            && confirm.close > confirm.open
            && confirm.close < ema20
            && r_now > r_prev
            && r_now < 50.0
        {
            Direction::Call
        } else if setup.close > setup_bands.upper
            && confirm.close < now.upper
            && confirm.close < confirm.open
            && confirm.close > ema20
            && r_now < r_prev
            && r_now > 50.0
        {
            Direction::Put
        } else {
            return SignalResult::neutral();
        };

        if broke_out(before, &before_bands, direction) {
            return SignalResult::neutral_because("second unreclaimed break");
        }

        let squeeze = 1.0 - now.width() / average_width;
        let confidence = 72.0 + (r_now - r_prev).abs().min(10.0) + (squeeze * 20.0).min(10.0);
        SignalResult::directional(
            direction,
            confidence.min(92.0),
            format!("{direction} band reclaim in squeeze"),
        )
    }
}

fn broke_out(candle: &Candle, bands: &BollingerBands, direction: Direction) -> bool {
    match direction {
        Direction::Call => candle.close < bands.lower,
        Direction::Put => candle.close > bands.upper,
    }
}
