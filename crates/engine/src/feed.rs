use common::{Candle, CandleSource, Result};
use strategy::{is_native_timeframe, resample_to_n};

/// Fetch `count` candles of `timeframe` minutes. Native granularities are
/// requested directly; anything else is built from one-minute candles.
pub async fn fetch_window<S>(
    source: &S,
    instrument: &str,
    timeframe: u32,
    count: usize,
) -> Result<Vec<Candle>>
where
    S: CandleSource + ?Sized,
{
    if is_native_timeframe(timeframe) {
        return source.candles(instrument, timeframe, count).await;
    }
    let factor = timeframe.max(1) as usize;
    let minutes = source
        .candles(instrument, 1, count.saturating_mul(factor))
        .await?;
    Ok(resample_to_n(&minutes, factor))
}
