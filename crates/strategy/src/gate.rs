//! Extra screens for real-market strategies: session hours, ATR regime and
//! quoted spread.

use chrono::{DateTime, Timelike, Utc};

use crate::config::StrategyProfile;
use crate::indicators::{atr_series, has_volatility};
use crate::window::CandleWindow;

/// Why the gate turned a window away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRejection {
    OutsideSession,
    NoVolatilityData,
    VolatilityTooLow,
    VolatilityTooHigh,
    SpreadTooWide,
}

impl std::fmt::Display for GateRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateRejection::OutsideSession => write!(f, "outside trading session"),
            GateRejection::NoVolatilityData => write!(f, "no volatility data"),
            GateRejection::VolatilityTooLow => write!(f, "volatility below regime"),
            GateRejection::VolatilityTooHigh => write!(f, "volatility above regime"),
            GateRejection::SpreadTooWide => write!(f, "spread too wide for volatility"),
        }
    }
}

pub fn in_session(timestamp: i64, start_hour: u32, end_hour: u32) -> bool {
    let Some(ts) = DateTime::<Utc>::from_timestamp(timestamp, 0) else {
        return false;
    };
    let hour = ts.hour();
    if start_hour <= end_hour {
        hour >= start_hour && hour < end_hour
    } else {
        hour >= start_hour || hour < end_hour
    }
}

pub fn check(
    window: &CandleWindow<'_>,
    profile: &StrategyProfile,
    spread: Option<f64>,
) -> Result<(), GateRejection> {
    if !in_session(
        window.confirm().timestamp,
        profile.session_start_hour,
        profile.session_end_hour,
    ) {
        return Err(GateRejection::OutsideSession);
    }

    let series = atr_series(window.closed(), profile.atr_period);
    let current = series.last().copied().unwrap_or(f64::NAN);
    if !has_volatility(current) {
        return Err(GateRejection::NoVolatilityData);
    }
    let recent: Vec<f64> = series
        .iter()
        .rev()
        .take(profile.atr_ma_period)
        .copied()
        .filter(|v| v.is_finite())
        .collect();
    if recent.len() < profile.atr_ma_period {
        return Err(GateRejection::NoVolatilityData);
    }
    let mean = recent.iter().sum::<f64>() / recent.len() as f64;
    if !has_volatility(mean) {
        return Err(GateRejection::NoVolatilityData);
    }
    let ratio = current / mean;
    if ratio < profile.atr_min_ratio {
        return Err(GateRejection::VolatilityTooLow);
    }
    if ratio > profile.atr_max_ratio {
        return Err(GateRejection::VolatilityTooHigh);
    }

    if let Some(spread) = spread {
        if spread.is_finite() && spread > profile.max_spread_atr_ratio * current {
            return Err(GateRejection::SpreadTooWide);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::WindowAlignment;
    use common::Candle;

    // 2024-01-01 10:00:00 UTC
    const TEN_AM: i64 = 1_704_103_200;

    fn steady(n: usize, start: i64) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let mid = 1.1 + if i % 2 == 0 { 0.0005 } else { -0.0005 };
                Candle::new(mid, mid + 0.001, mid - 0.001, mid, start + i as i64 * 60)
            })
            .collect()
    }

    #[test]
    fn session_window_with_and_without_wrap() {
        assert!(in_session(TEN_AM, 7, 20));
        assert!(!in_session(TEN_AM, 12, 20));
        assert!(in_session(TEN_AM, 22, 11));
        assert!(!in_session(TEN_AM + 3 * 3600, 22, 11));
    }

    #[test]
    fn steady_market_in_session_passes() {
        let candles = steady(60, TEN_AM);
        let w = CandleWindow::new(&candles, WindowAlignment::Forming).unwrap();
        assert_eq!(check(&w, &StrategyProfile::default(), None), Ok(()));
    }

    #[test]
    fn night_candles_are_rejected() {
        let candles = steady(60, TEN_AM + 12 * 3600);
        let w = CandleWindow::new(&candles, WindowAlignment::Forming).unwrap();
        assert_eq!(
            check(&w, &StrategyProfile::default(), None),
            Err(GateRejection::OutsideSession)
        );
    }

    #[test]
    fn wide_spread_is_rejected() {
        let candles = steady(60, TEN_AM);
        let w = CandleWindow::new(&candles, WindowAlignment::Forming).unwrap();
        assert_eq!(
            check(&w, &StrategyProfile::default(), Some(0.01)),
            Err(GateRejection::SpreadTooWide)
        );
        assert_eq!(check(&w, &StrategyProfile::default(), Some(0.0001)), Ok(()));
    }

    #[test]
    fn flat_market_has_no_volatility() {
        let candles: Vec<Candle> = (0..60)
            .map(|i| Candle::new(1.0, 1.0, 1.0, 1.0, TEN_AM + i * 60))
            .collect();
        let w = CandleWindow::new(&candles, WindowAlignment::Forming).unwrap();
        assert_eq!(
            check(&w, &StrategyProfile::default(), None),
            Err(GateRejection::NoVolatilityData)
        );
    }
}
