use common::{Candle, Direction, SignalResult};

use crate::config::StrategyProfile;
use crate::indicators::{
    atr, cluster_levels, features, has_volatility, identify_zones, rsi, rsi_series,
};
use crate::resample::resample_to_n;
use crate::window::CandleWindow;
use crate::Strategy;

/// Candles at the end of the window that may not form pivots yet.
const UNCONFIRMED_TAIL: usize = 3;
const BASE_CONFIDENCE: f64 = 76.0;
const HTF_PENALTY: f64 = 12.0;
const HTF_RANGE_BONUS: f64 = 5.0;

/// Support/resistance reversal: an indecision candle tags a clustered swing
/// level with RSI stretched, and the confirm candle engulfs it away from
/// the level. A higher-timeframe RSI tilts the confidence.
#[derive(Debug, Clone, Copy, Default)]
pub struct SupportResistanceReversal;

impl Strategy for SupportResistanceReversal {
    fn family(&self) -> &'static str {
        "sr_reversal"
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
        if closed.len() < UNCONFIRMED_TAIL + 5 {
            return SignalResult::neutral_because("insufficient data");
        }
        let volatility = atr(closed, profile.atr_period);
        if !has_volatility(volatility) {
            return SignalResult::neutral_because("no volatility data");
        }

        let (setup, confirm) = (&closed[c - 1], &closed[c]);
        let (sf, cf) = (features(setup), features(confirm));
        if sf.body_ratio > profile.sr_indecision_max_body {
            return SignalResult::neutral_because("setup is not an indecision candle");
        }
        if cf.body_ratio < profile.sr_confirm_min_body || cf.body <= sf.body {
            return SignalResult::neutral_because("confirm candle lacks conviction");
        }

        let zones = identify_zones(&closed[..closed.len() - UNCONFIRMED_TAIL]);
        let band = profile.sr_touch_tolerance * volatility;
        let closes = window.closes();
        let setup_rsi = rsi_series(&closes, profile.rsi_period)[c - 1];

        let direction = if cf.bullish && confirm.close > sf.midpoint {
            let support = cluster_levels(&zones.support, volatility, profile.sr_cluster_tolerance);
            let low = setup.low.min(confirm.low);
            if !touches(&support, low, band) {
                return SignalResult::neutral_because("no support touch");
            }
            if setup_rsi > profile.sr_rsi_oversold {
                return SignalResult::neutral_because("RSI not oversold at support");
            }
            Direction::Call
        } else if cf.bearish && confirm.close < sf.midpoint {
            let resistance =
                cluster_levels(&zones.resistance, volatility, profile.sr_cluster_tolerance);
            let high = setup.high.max(confirm.high);
            if !touches(&resistance, high, band) {
                return SignalResult::neutral_because("no resistance touch");
            }
            if setup_rsi < profile.sr_rsi_overbought {
                return SignalResult::neutral_because("RSI not overbought at resistance");
            }
            Direction::Put
        } else {
            return SignalResult::neutral();
        };

        let confidence = BASE_CONFIDENCE + higher_timeframe_tilt(closed, profile, direction);
        SignalResult::directional(
            direction,
            confidence.clamp(0.0, 90.0),
            format!("{direction} reversal at swing level"),
        )
    }
}

fn touches(levels: &[f64], price: f64, band: f64) -> bool {
    levels.iter().any(|level| (price - level).abs() <= band)
}

/// Penalise trading against a higher-timeframe trend, reward a ranging one.
/// Zero when there are too few aggregated bars for an RSI.
fn higher_timeframe_tilt(closed: &[Candle], profile: &StrategyProfile, direction: Direction) -> f64 {
    let htf = resample_to_n(closed, profile.sr_htf_factor);
    if htf.len() < profile.rsi_period + 1 {
        return 0.0;
    }
    let closes: Vec<f64> = htf.iter().map(|c| c.close).collect();
    let trend = rsi(&closes, profile.rsi_period);
    match direction {
        Direction::Call if trend < 40.0 => -HTF_PENALTY,
        Direction::Put if trend > 60.0 => -HTF_PENALTY,
        _ if (40.0..=60.0).contains(&trend) => HTF_RANGE_BONUS,
        _ => 0.0,
    }
}
