//! Average True Range.
//!
//! True range: max(high − low, |high − prev_close|, |low − prev_close|).
//! The first `period` true ranges are averaged for the seed, then Wilder
//! smoothing (alpha = 1/period) carries it forward.

use common::Candle;

/// True range per candle. The first candle has no previous close and uses
/// its own high − low.
pub fn true_range(candles: &[Candle]) -> Vec<f64> {
    candles
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let hl = c.high - c.low;
            if i == 0 {
                return hl;
            }
            let pc = candles[i - 1].close;
            hl.max((c.high - pc).abs()).max((c.low - pc).abs())
        })
        .collect()
}

/// ATR at every index, `NaN` until `period` true ranges are available.
pub fn atr_series(candles: &[Candle], period: usize) -> Vec<f64> {
    let n = candles.len();
    let mut out = vec![f64::NAN; n];
    if period == 0 || n < period {
        return out;
    }

    let tr = true_range(candles);
    let mut prev = tr[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = prev;
    for i in period..n {
        prev = (prev * (period - 1) as f64 + tr[i]) / period as f64;
        out[i] = prev;
    }
    out
}

/// ATR at the last candle, or 0 when there is no usable volatility data.
pub fn atr(candles: &[Candle], period: usize) -> f64 {
    match atr_series(candles, period).last() {
        Some(&v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

/// Strategies that divide by ATR abstain unless this holds.
pub fn has_volatility(atr: f64) -> bool {
    atr.is_finite() && atr > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(o: f64, h: f64, l: f64, c: f64) -> Candle {
        Candle::new(o, h, l, c, 0)
    }

    #[test]
    fn true_range_uses_previous_close_gap() {
        let bars = [bar(10.0, 11.0, 9.0, 10.0), bar(13.0, 14.0, 12.5, 13.5)];
        let tr = true_range(&bars);
        assert!((tr[0] - 2.0).abs() < 1e-12);
        // gap up: high - prev close = 4
        assert!((tr[1] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn atr_of_constant_range() {
        let bars: Vec<Candle> = (0..30).map(|_| bar(10.0, 11.0, 9.0, 10.0)).collect();
        assert!((atr(&bars, 14) - 2.0).abs() < 1e-12);
        let s = atr_series(&bars, 14);
        assert!(s[12].is_nan());
        assert!((s[13] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn atr_guards_short_and_flat_input() {
        let bars: Vec<Candle> = (0..5).map(|_| bar(10.0, 11.0, 9.0, 10.0)).collect();
        assert_eq!(atr(&bars, 14), 0.0);
        let flat: Vec<Candle> = (0..30).map(|_| bar(1.0, 1.0, 1.0, 1.0)).collect();
        assert_eq!(atr(&flat, 14), 0.0);
        assert!(!has_volatility(atr(&flat, 14)));
        assert!(!has_volatility(f64::NAN));
    }
}
