//! Support/resistance zones from 5-point swing pivots.

use common::Candle;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Zones {
    /// Swing lows, in candle order.
    pub support: Vec<f64>,
    /// Swing highs, in candle order.
    pub resistance: Vec<f64>,
}

/// A candle is a swing high (low) when its high (low) strictly exceeds
/// (undercuts) the two candles on each side. Levels are returned unclustered.
pub fn identify_zones(candles: &[Candle]) -> Zones {
    let mut zones = Zones::default();
    if candles.len() < 5 {
        return zones;
    }
    for i in 2..candles.len() - 2 {
        let c = &candles[i];
        let neighbours = [i - 2, i - 1, i + 1, i + 2];
        if neighbours.iter().all(|&j| c.high > candles[j].high) {
            zones.resistance.push(c.high);
        }
        if neighbours.iter().all(|&j| c.low < candles[j].low) {
            zones.support.push(c.low);
        }
    }
    zones
}

/// Sort `levels` and drop any level within `tolerance · atr` of the last
/// accepted representative.
pub fn cluster_levels(levels: &[f64], atr: f64, tolerance: f64) -> Vec<f64> {
    let mut sorted: Vec<f64> = levels.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let band = (tolerance * atr).abs();
    let mut out: Vec<f64> = Vec::with_capacity(sorted.len());
    for level in sorted {
        match out.last() {
            Some(&rep) if (level - rep).abs() <= band => {}
            _ => out.push(level),
        }
    }
    out
}
