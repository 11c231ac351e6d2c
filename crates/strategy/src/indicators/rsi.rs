//! RSI (Relative Strength Index).
//!
//! Uses Wilder's smoothed moving average (same as TradingView / standard RSI):
//! the first average gain/loss is the plain mean of the first `period`
//! changes, later values are smoothed with `(prev * (period - 1) + x) / period`.
//!
//! Short input is not an error: anything with fewer than `period + 1` closes
//! reads as a neutral 50.

pub const NEUTRAL_RSI: f64 = 50.0;

/// RSI of the last element of `closes` (oldest first).
///
/// Callers pass closed candles only; feeding the forming candle repaints.
pub fn rsi(closes: &[f64], period: usize) -> f64 {
    rsi_series(closes, period)
        .last()
        .copied()
        .unwrap_or(NEUTRAL_RSI)
}

/// RSI for every index of `closes`. Indices without enough history hold 50.
pub fn rsi_series(closes: &[f64], period: usize) -> Vec<f64> {
    let n = closes.len();
    let mut out = vec![NEUTRAL_RSI; n];
    if period == 0 || n < period + 1 {
        return out;
    }

    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let initial = &changes[..period];

    let mut avg_gain = initial.iter().filter(|&&c| c > 0.0).sum::<f64>() / period as f64;
    let mut avg_loss =
        initial.iter().filter(|&&c| c < 0.0).map(|c| c.abs()).sum::<f64>() / period as f64;
    out[period] = from_averages(avg_gain, avg_loss);

    for (i, &change) in changes.iter().enumerate().skip(period) {
        let gain = if change > 0.0 { change } else { 0.0 };
        let loss = if change < 0.0 { change.abs() } else { 0.0 };
        avg_gain = (avg_gain * (period - 1) as f64 + gain) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + loss) / period as f64;
        // changes[i] moves closes[i] -> closes[i + 1]
        out[i + 1] = from_averages(avg_gain, avg_loss);
    }
    out
}

fn from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if !avg_gain.is_finite() || !avg_loss.is_finite() {
        return NEUTRAL_RSI;
    }
    if avg_loss == 0.0 {
        return if avg_gain == 0.0 { NEUTRAL_RSI } else { 100.0 };
    }
    let rs = avg_gain / avg_loss;
    (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_neutral_when_insufficient_data() {
        // Need at least period+1 = 15 values
        let prices = vec![100.0; 14];
        assert_eq!(rsi(&prices, 14), NEUTRAL_RSI);
        assert_eq!(rsi(&[], 14), NEUTRAL_RSI);
    }

    #[test]
    fn rsi_all_gains_returns_100() {
        let prices = vec![10.0, 11.0, 12.0, 13.0, 14.0];
        let value = rsi(&prices, 3);
        assert!((value - 100.0).abs() < 1e-6, "Expected ~100, got {value}");
    }

    #[test]
    fn rsi_all_losses_returns_0() {
        let prices = vec![14.0, 13.0, 12.0, 11.0, 10.0];
        let value = rsi(&prices, 3);
        assert!(value.abs() < 1e-6, "Expected ~0, got {value}");
    }

    #[test]
    fn rsi_flat_prices_are_neutral() {
        let prices = vec![5.0; 40];
        assert_eq!(rsi(&prices, 14), NEUTRAL_RSI);
    }

    #[test]
    fn rsi_known_value_in_range() {
        let prices = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.15, 43.61, 44.33, 44.83, 45.10,
            45.15, 44.34, 44.09,
        ];
        let v = rsi(&prices, 14);
        assert!((0.0..=100.0).contains(&v), "RSI out of range: {v}");
        assert_ne!(v, NEUTRAL_RSI);
    }

    #[test]
    fn series_last_matches_scalar() {
        let prices: Vec<f64> = (0..50).map(|i| 100.0 + ((i * 7) % 11) as f64).collect();
        let series = rsi_series(&prices, 14);
        assert_eq!(series.len(), prices.len());
        assert_eq!(series[13], NEUTRAL_RSI);
        assert!((series[49] - rsi(&prices, 14)).abs() < 1e-12);
        // value at index i only depends on prices[..=i]
        assert!((series[30] - rsi(&prices[..31], 14)).abs() < 1e-12);
    }
}
