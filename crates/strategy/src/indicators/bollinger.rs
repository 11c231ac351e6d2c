//! Bollinger Bands: SMA middle band ± population standard deviation × multiplier.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerBands {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Bands over the last `period` closes. Short input collapses all three
/// bands onto the latest close (zero width).
pub fn bollinger(closes: &[f64], period: usize, multiplier: f64) -> BollingerBands {
    let last = closes.last().copied().unwrap_or(0.0);
    if period == 0 || closes.len() < period {
        return BollingerBands {
            upper: last,
            middle: last,
            lower: last,
        };
    }

    let window = &closes[closes.len() - period..];
    let mean = window.iter().sum::<f64>() / period as f64;
    let var = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / period as f64;
    let sd = var.sqrt();
    BollingerBands {
        upper: mean + sd * multiplier,
        middle: mean,
        lower: mean - sd * multiplier,
    }
}

/// Bands as they stood at each index (computed from `closes[..=i]`).
pub fn bollinger_series(closes: &[f64], period: usize, multiplier: f64) -> Vec<BollingerBands> {
    (0..closes.len())
        .map(|i| bollinger(&closes[..=i], period, multiplier))
        .collect()
}
