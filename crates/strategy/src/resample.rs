//! Aggregation of fine candles into coarser ones.

use common::Candle;

/// Granularities (minutes) the candle source serves directly.
pub const NATIVE_TIMEFRAMES: [u32; 5] = [1, 2, 5, 15, 60];

pub fn is_native_timeframe(minutes: u32) -> bool {
    NATIVE_TIMEFRAMES.contains(&minutes)
}

/// Group `candles` into consecutive chunks of `n` and aggregate each one:
/// open of the first, close of the last, max high, min low, summed volume.
///
/// A leading partial chunk is dropped so the newest chunk is complete.
/// `n <= 1` is the identity.
pub fn resample_to_n(candles: &[Candle], n: usize) -> Vec<Candle> {
    if n <= 1 {
        return candles.to_vec();
    }
    let skip = candles.len() % n;
    candles[skip..].chunks_exact(n).map(aggregate).collect()
}

fn aggregate(chunk: &[Candle]) -> Candle {
    let first = &chunk[0];
    let last = &chunk[chunk.len() - 1];
    let high = chunk.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
    let low = chunk.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    let volume = chunk
        .iter()
        .filter_map(|c| c.volume)
        .fold(None, |acc: Option<f64>, v| Some(acc.unwrap_or(0.0) + v));
    Candle {
        open: first.open,
        high,
        low,
        close: last.close,
        volume,
        timestamp: first.timestamp,
    }
}
