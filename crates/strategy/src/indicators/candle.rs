//! Candle-shape features.

use common::Candle;

/// Floor for a candle's range so ratios stay finite on zero-range candles.
pub const RANGE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandleFeatures {
    pub body: f64,
    pub range: f64,
    pub body_ratio: f64,
    pub upper_wick: f64,
    pub lower_wick: f64,
    pub upper_wick_ratio: f64,
    pub lower_wick_ratio: f64,
    pub bullish: bool,
    pub bearish: bool,
    pub midpoint: f64,
}

pub fn features(c: &Candle) -> CandleFeatures {
    let body = (c.close - c.open).abs();
    let range = (c.high - c.low).max(RANGE_EPSILON);
    let upper_wick = (c.high - c.open.max(c.close)).max(0.0);
    let lower_wick = (c.open.min(c.close) - c.low).max(0.0);
    CandleFeatures {
        body,
        range,
        body_ratio: body / range,
        upper_wick,
        lower_wick,
        upper_wick_ratio: upper_wick / range,
        lower_wick_ratio: lower_wick / range,
        bullish: c.close > c.open,
        bearish: c.close < c.open,
        midpoint: (c.high + c.low) / 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hammer_features() {
        // open 10, close 10.5, high 10.6, low 9.0
        let f = features(&Candle::new(10.0, 10.6, 9.0, 10.5, 0));
        assert!(f.bullish && !f.bearish);
        assert!((f.range - 1.6).abs() < 1e-12);
        assert!((f.lower_wick - 1.0).abs() < 1e-12);
        assert!((f.lower_wick_ratio - 0.625).abs() < 1e-12);
        assert!((f.midpoint - 9.8).abs() < 1e-12);
    }

    #[test]
    fn zero_range_candle_is_finite() {
        let f = features(&Candle::new(1.0, 1.0, 1.0, 1.0, 0));
        assert!(f.body_ratio.is_finite());
        assert_eq!(f.body_ratio, 0.0);
        assert!(!f.bullish && !f.bearish);
    }
}
