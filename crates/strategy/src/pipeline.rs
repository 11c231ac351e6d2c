//! Cross-cutting filters around strategy dispatch: real-market trend
//! confirmation, then per-(instrument, strategy) cooldown, then confidence
//! clamping.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use common::{Candle, Direction, SignalResult};

use crate::config::ProfileBook;
use crate::indicators::ema;
use crate::market::MarketKind;
use crate::registry::StrategyRegistry;
use crate::window::{CandleWindow, WindowAlignment};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Minimum spacing between two surviving signals for one key.
    #[serde(with = "secs")]
    pub cooldown: Duration,
    pub alignment: WindowAlignment,
    pub trend_fast: usize,
    pub trend_slow: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(180),
            alignment: WindowAlignment::Forming,
            trend_fast: 50,
            trend_slow: 200,
        }
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

/// Last surviving signal time per (instrument, canonical strategy).
/// Shared by every session in the process.
#[derive(Debug)]
pub struct CooldownTracker {
    window: Duration,
    last: Mutex<HashMap<(String, &'static str), DateTime<Utc>>>,
}

impl CooldownTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last: Mutex::new(HashMap::new()),
        }
    }

    /// `true` (and records `now`) when no signal for this key survived within
    /// the window. A clock that went backwards counts as inside the window.
    pub fn admit(&self, instrument: &str, strategy: &'static str, now: DateTime<Utc>) -> bool {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        let key = (instrument.to_ascii_uppercase(), strategy);
        if self.within_window(last.get(&key), now) {
            return false;
        }
        last.insert(key, now);
        true
    }

    /// Read-only twin of [`CooldownTracker::admit`]: `true` while the key
    /// would be refused.
    pub fn is_cooling(&self, instrument: &str, strategy: &'static str, now: DateTime<Utc>) -> bool {
        let last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        let key = (instrument.to_ascii_uppercase(), strategy);
        self.within_window(last.get(&key), now)
    }

    fn within_window(&self, prev: Option<&DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        prev.is_some_and(|prev| (now - *prev).to_std().unwrap_or(Duration::ZERO) < self.window)
    }

    pub fn len(&self) -> usize {
        self.last.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Downgrade a directional result that disagrees with the EMA(fast) vs
/// EMA(slow) ordering. Fewer than `slow` closes downgrades too.
pub fn trend_filter(result: SignalResult, closes: &[f64], fast: usize, slow: usize) -> SignalResult {
    let Some(direction) = result.action.direction() else {
        return result;
    };
    if closes.len() < slow {
        return SignalResult::neutral_because("insufficient trend history");
    }
    let (fast_ema, slow_ema) = (ema(closes, fast), ema(closes, slow));
    let agrees = match direction {
        Direction::Call => fast_ema > slow_ema,
        Direction::Put => fast_ema < slow_ema,
    };
    if agrees {
        result
    } else {
        SignalResult::neutral_because("against higher trend")
    }
}

/// Strategy dispatch plus filters. One instance is shared by all sessions.
#[derive(Debug)]
pub struct SignalPipeline {
    registry: StrategyRegistry,
    profiles: Arc<ProfileBook>,
    config: PipelineConfig,
    cooldowns: CooldownTracker,
}

impl SignalPipeline {
    pub fn new(profiles: Arc<ProfileBook>, config: PipelineConfig) -> Self {
        info!(
            cooldown_secs = config.cooldown.as_secs(),
            alignment = ?config.alignment,
            "Signal pipeline ready"
        );
        Self {
            registry: StrategyRegistry::builtin(),
            cooldowns: CooldownTracker::new(config.cooldown),
            profiles,
            config,
        }
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    pub fn profiles(&self) -> &ProfileBook {
        &self.profiles
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Full pipeline at the current wall-clock time.
    pub fn evaluate(&self, instrument: &str, candles: &[Candle], strategy: &str) -> SignalResult {
        self.evaluate_at(instrument, candles, strategy, None, Utc::now())
    }

    /// Full pipeline; a surviving directional result starts the cooldown
    /// for (instrument, strategy).
    pub fn evaluate_at(
        &self,
        instrument: &str,
        candles: &[Candle],
        strategy: &str,
        spread: Option<f64>,
        now: DateTime<Utc>,
    ) -> SignalResult {
        let (canonical, result) = self.filtered(instrument, candles, strategy, spread);
        if let Some(canonical) = canonical {
            if result.is_directional() && !self.cooldowns.admit(instrument, canonical, now) {
                debug!(%instrument, strategy = canonical, "Suppressed by cooldown");
                return SignalResult::neutral_because("cooldown");
            }
        }
        result.clamped()
    }

    /// Dispatch and trend filter without touching cooldown state, for
    /// ad-hoc scans.
    pub fn preview(
        &self,
        instrument: &str,
        candles: &[Candle],
        strategy: &str,
        spread: Option<f64>,
    ) -> SignalResult {
        self.filtered(instrument, candles, strategy, spread).1.clamped()
    }

    /// Full pipeline without recording anything: a key that is still
    /// cooling down reads as NEUTRAL "cooldown". Used to rank candidates
    /// before one of them is [`claimed`](SignalPipeline::claim).
    pub fn screen_at(
        &self,
        instrument: &str,
        candles: &[Candle],
        strategy: &str,
        spread: Option<f64>,
        now: DateTime<Utc>,
    ) -> SignalResult {
        let (canonical, result) = self.filtered(instrument, candles, strategy, spread);
        if let Some(canonical) = canonical {
            if result.is_directional() && self.cooldowns.is_cooling(instrument, canonical, now) {
                return SignalResult::neutral_because("cooldown");
            }
        }
        result.clamped()
    }

    /// Start the cooldown for a signal chosen after [`SignalPipeline::screen_at`].
    /// `false` when the key is still cooling down or the strategy is unknown.
    pub fn claim(&self, instrument: &str, strategy: &str, now: DateTime<Utc>) -> bool {
        match self.registry.canonical_name(strategy) {
            Some(canonical) => self.cooldowns.admit(instrument, canonical, now),
            None => false,
        }
    }

    fn filtered(
        &self,
        instrument: &str,
        candles: &[Candle],
        strategy: &str,
        spread: Option<f64>,
    ) -> (Option<&'static str>, SignalResult) {
        let profile = self.profiles.resolve(instrument);
        let result = self.registry.dispatch(
            instrument,
            candles,
            strategy,
            profile,
            self.config.alignment,
            spread,
        );
        let Some(spec) = self.registry.resolve(strategy) else {
            return (None, result);
        };
        if !result.is_directional() {
            return (Some(spec.name), result);
        }

        let result = if MarketKind::of(instrument) == MarketKind::Real && !spec.reversal {
            let closes = CandleWindow::new(candles, self.config.alignment)
                .map(|w| w.closes())
                .unwrap_or_default();
            let filtered =
                trend_filter(result, &closes, self.config.trend_fast, self.config.trend_slow);
            if !filtered.is_directional() {
                debug!(%instrument, strategy = spec.name, "Downgraded by trend filter");
            }
            filtered
        } else {
            result
        };
        (Some(spec.name), result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Action;

    fn pipeline() -> SignalPipeline {
        SignalPipeline::new(Arc::new(ProfileBook::default()), PipelineConfig::default())
    }

    /// A long slide with the last few closes popping back up.
    fn downtrend_with_bounce(bounce: bool) -> Vec<Candle> {
        let mut candles: Vec<Candle> = (0..250)
            .map(|i| {
                let c = 1.2 - 0.0002 * i as f64;
                Candle::new(c + 0.0001, c + 0.0003, c - 0.0003, c, i * 60)
            })
            .collect();
        if bounce {
            let base = candles[245].close;
            for (k, c) in candles.iter_mut().skip(246).enumerate() {
                c.close = base + 0.002 * (k + 1) as f64;
                c.open = c.close - 0.0005;
                c.high = c.close + 0.0001;
                c.low = c.open - 0.0001;
            }
        }
        candles
    }

    #[test]
    fn cooldown_suppresses_then_expires() {
        let tracker = CooldownTracker::new(Duration::from_secs(180));
        let t0 = Utc::now();
        assert!(tracker.admit("EURUSD", "sma_trend", t0));
        assert!(!tracker.admit("eurusd", "sma_trend", t0 + chrono::Duration::seconds(60)));
        assert!(tracker.admit("EURUSD", "momentum_otc", t0));
        assert!(tracker.admit("EURUSD", "sma_trend", t0 + chrono::Duration::seconds(181)));
        assert!(!tracker.admit("EURUSD", "sma_trend", t0));
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn trend_filter_needs_history() {
        let call = SignalResult::directional(Direction::Call, 80.0, "x");
        let r = trend_filter(call, &[1.0; 50], 50, 200);
        assert_eq!((r.action, r.confidence), (Action::Neutral, 0.0));
    }

    #[test]
    fn call_against_downtrend_is_downgraded() {
        let p = pipeline();
        let candles = downtrend_with_bounce(true);
        let raw = p.registry().dispatch(
            "EURUSD",
            &candles,
            "sma_trend",
            p.profiles().default_profile(),
            WindowAlignment::Forming,
            None,
        );
        assert_eq!(raw.action, Action::Call);

        let r = p.evaluate("EURUSD", &candles, "SMA Trend");
        assert_eq!((r.action, r.confidence), (Action::Neutral, 0.0));
    }

    #[test]
    fn put_with_downtrend_passes() {
        let p = pipeline();
        let candles = downtrend_with_bounce(false);
        let r = p.evaluate("EURUSD", &candles, "sma_trend");
        assert_eq!((r.action, r.confidence), (Action::Put, 60.0));
    }

    #[test]
    fn preview_leaves_cooldown_untouched() {
        let p = pipeline();
        let candles = downtrend_with_bounce(false);
        let now = Utc::now();
        assert_eq!(p.preview("EURUSD", &candles, "sma_trend", None).action, Action::Put);
        assert!(p.cooldowns.is_empty());
        assert_eq!(
            p.evaluate_at("EURUSD", &candles, "sma_trend", None, now).action,
            Action::Put
        );
        let again = p.evaluate_at("EURUSD", &candles, "sma_trend", None, now);
        assert_eq!(again.action, Action::Neutral);
        assert_eq!(again.reason.as_deref(), Some("cooldown"));
        assert_eq!(p.preview("EURUSD", &candles, "sma_trend", None).action, Action::Put);
    }

    #[test]
    fn screening_skips_cooling_keys_without_recording() {
        let p = pipeline();
        let candles = downtrend_with_bounce(false);
        let now = Utc::now();
        let first = p.screen_at("EURUSD", &candles, "sma_trend", None, now);
        assert_eq!(first.action, Action::Put);
        assert!(p.cooldowns.is_empty());

        assert!(p.claim("EURUSD", "sma_trend", now));
        let cooling = p.screen_at("EURUSD", &candles, "sma_trend", None, now);
        assert_eq!((cooling.action, cooling.confidence), (Action::Neutral, 0.0));
        assert_eq!(cooling.reason.as_deref(), Some("cooldown"));

        let later = now + chrono::Duration::seconds(181);
        assert_eq!(p.screen_at("EURUSD", &candles, "sma_trend", None, later).action, Action::Put);
        assert!(p.cooldowns.is_cooling("eurusd", "sma_trend", now + chrono::Duration::seconds(60)));
        assert!(!p.cooldowns.is_cooling("eurusd", "sma_trend", later));
    }

    #[test]
    fn claim_shares_cooldown_with_evaluate() {
        let p = pipeline();
        let now = Utc::now();
        assert!(p.claim("EURUSD-OTC", "Quick 2M Strategy", now));
        assert!(!p.claim("EURUSD-OTC", "momentum_otc", now));
        assert!(!p.claim("EURUSD-OTC", "no such thing", now));
    }
}
