use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use common::{Candle, CandleSource, Error, Result};
use strategy::resample_to_n;

/// Replayed one-minute candles for one instrument.
#[derive(Debug, Default)]
struct Series {
    candles: Vec<Candle>,
    /// Number of candles currently visible to readers.
    visible: usize,
    spread: Option<f64>,
}

/// Shared replay market. Readers see a growing prefix of each series;
/// [`PaperMarket::advance`] reveals one more minute everywhere.
#[derive(Debug, Default)]
pub struct PaperMarket {
    series: RwLock<HashMap<String, Series>>,
}

impl PaperMarket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `<INSTRUMENT>.json` file (a JSON array of candles) in `dir`.
    /// `warmup` candles of each series are visible immediately.
    pub async fn load_dir(dir: impl AsRef<Path>, warmup: usize) -> Result<Self> {
        let market = Self::new();
        let dir = dir.as_ref();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(instrument) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let content = std::fs::read_to_string(&path)?;
            let candles: Vec<Candle> = serde_json::from_str(&content).map_err(|e| {
                Error::Config(format!("Invalid candle file '{}': {e}", path.display()))
            })?;
            info!(%instrument, candles = candles.len(), "Loaded replay series");
            market.insert_series(instrument, candles, warmup).await;
        }
        if market.instruments().await.is_empty() {
            warn!(dir = %dir.display(), "No replay series found");
        }
        Ok(market)
    }

    /// Replace the series of `instrument`, revealing the first `visible` candles.
    pub async fn insert_series(&self, instrument: &str, candles: Vec<Candle>, visible: usize) {
        let visible = visible.min(candles.len());
        let mut series = self.series.write().await;
        let entry = series.entry(instrument.to_ascii_uppercase()).or_default();
        entry.candles = candles;
        entry.visible = visible;
    }

    /// Append a live candle and make it visible.
    pub async fn push(&self, instrument: &str, candle: Candle) {
        let mut series = self.series.write().await;
        let entry = series.entry(instrument.to_ascii_uppercase()).or_default();
        entry.candles.truncate(entry.visible);
        entry.candles.push(candle);
        entry.visible = entry.candles.len();
    }

    pub async fn set_spread(&self, instrument: &str, spread: Option<f64>) {
        let mut series = self.series.write().await;
        series.entry(instrument.to_ascii_uppercase()).or_default().spread = spread;
    }

    /// Reveal one more candle of every series. Returns `false` once every
    /// series is exhausted.
    pub async fn advance(&self) -> bool {
        let mut series = self.series.write().await;
        let mut moved = false;
        for s in series.values_mut() {
            if s.visible < s.candles.len() {
                s.visible += 1;
                moved = true;
            }
        }
        debug!(moved, "Replay advanced");
        moved
    }

    pub async fn latest_close(&self, instrument: &str) -> Option<f64> {
        let series = self.series.read().await;
        let s = series.get(&instrument.to_ascii_uppercase())?;
        s.candles[..s.visible].last().map(|c| c.close)
    }

    pub async fn instruments(&self) -> Vec<String> {
        let mut names: Vec<String> = self.series.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl CandleSource for PaperMarket {
    async fn candles(
        &self,
        instrument: &str,
        timeframe_minutes: u32,
        count: usize,
    ) -> Result<Vec<Candle>> {
        let series = self.series.read().await;
        let Some(s) = series.get(&instrument.to_ascii_uppercase()) else {
            return Err(Error::Broker(format!("No replay data for {instrument}")));
        };
        let visible = &s.candles[..s.visible];
        let bars = resample_to_n(visible, timeframe_minutes.max(1) as usize);
        let start = bars.len().saturating_sub(count);
        Ok(bars[start..].to_vec())
    }

    async fn spread(&self, instrument: &str) -> Option<f64> {
        self.series
            .read()
            .await
            .get(&instrument.to_ascii_uppercase())
            .and_then(|s| s.spread)
    }
}
