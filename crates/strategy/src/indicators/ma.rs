//! Simple and exponential moving averages over close prices (oldest first).
//!
//! Insufficient input returns the latest available value instead of failing;
//! empty input returns 0.

/// Mean of the last `period` values.
pub fn sma(values: &[f64], period: usize) -> f64 {
    let Some(&last) = values.last() else {
        return 0.0;
    };
    if period == 0 || values.len() < period {
        return last;
    }
    values[values.len() - period..].iter().sum::<f64>() / period as f64
}

/// Exponential moving average of the whole series with decay `2 / (period + 1)`.
pub fn ema(values: &[f64], period: usize) -> f64 {
    let Some(&last) = values.last() else {
        return 0.0;
    };
    if period == 0 || values.len() < period {
        return last;
    }
    ema_series(values, period).last().copied().unwrap_or(last)
}

/// EMA for every index. The seed at `period - 1` is the SMA of the first
/// `period` values; earlier indices hold the running mean so the series is
/// finite everywhere.
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    if period <= 1 {
        return values.to_vec();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(n);
    let mut running = 0.0;
    let mut prev = 0.0;
    for (i, &v) in values.iter().enumerate() {
        if i < period {
            running += v;
            prev = running / (i + 1) as f64;
        } else {
            prev = v * k + prev * (1.0 - k);
        }
        out.push(prev);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_of_last_period_values() {
        let v = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((sma(&v, 2) - 4.5).abs() < 1e-12);
        assert!((sma(&v, 5) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn short_input_returns_latest_value() {
        assert_eq!(sma(&[3.0, 7.0], 14), 7.0);
        assert_eq!(ema(&[3.0, 7.0], 14), 7.0);
        assert_eq!(sma(&[], 14), 0.0);
        assert_eq!(ema(&[], 14), 0.0);
    }

    #[test]
    fn ema_of_constant_is_constant() {
        let v = vec![4.2; 60];
        assert!((ema(&v, 20) - 4.2).abs() < 1e-12);
    }

    #[test]
    fn ema_seed_is_sma() {
        let v = [2.0, 4.0, 6.0, 8.0];
        let s = ema_series(&v, 3);
        assert!((s[2] - 4.0).abs() < 1e-12);
        // 8 * 0.5 + 4 * 0.5
        assert!((s[3] - 6.0).abs() < 1e-12);
    }

    #[test]
    fn ema_lags_rising_series() {
        let v: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let e = ema(&v, 20);
        assert!(e < 99.0 && e > 80.0, "unexpected ema {e}");
        assert!(ema(&v, 10) > ema(&v, 50));
    }
}
