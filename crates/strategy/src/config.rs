use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use common::{Error, Result};

/// Tunable thresholds shared by every strategy family.
///
/// Example `config/profiles.toml`:
/// ```toml
/// [profiles.default]
/// rsi_oversold = 28.0
/// rsi_overbought = 72.0
///
/// [profiles."EURUSD-OTC"]
/// momentum_streak = 4
/// ```
/// Instrument tables only need the keys they change; everything else is
/// inherited from `default`, then from the built-in defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyProfile {
    // RSI
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,

    // Momentum-N
    pub momentum_streak: usize,
    pub momentum_min_body_ratio: f64,

    // RSI mean-reversion
    pub reversal_min_wick_ratio: f64,
    pub reversal_extreme_lookback: usize,
    /// Minimum |close − EMA50| in ATR units.
    pub reversal_ema_atr_distance: f64,

    // Bollinger break-reclaim
    pub bb_period: usize,
    pub bb_std_dev: f64,
    pub bb_squeeze_lookback: usize,

    // Trend-pullback
    pub pullback_min_wick_ratio: f64,
    pub pullback_failure_lookback: usize,
    pub pullback_max_failures: usize,

    // Support/resistance reversal
    pub sr_rsi_oversold: f64,
    pub sr_rsi_overbought: f64,
    pub sr_indecision_max_body: f64,
    pub sr_confirm_min_body: f64,
    pub sr_cluster_tolerance: f64,
    pub sr_touch_tolerance: f64,
    pub sr_htf_factor: usize,

    // SMA trend
    pub sma_period: usize,

    // Real-market gate
    pub atr_period: usize,
    pub atr_ma_period: usize,
    pub atr_min_ratio: f64,
    pub atr_max_ratio: f64,
    pub max_spread_atr_ratio: f64,
    /// UTC hour the trading session opens (inclusive).
    pub session_start_hour: u32,
    /// UTC hour the trading session closes (exclusive). May wrap midnight.
    pub session_end_hour: u32,
}

impl Default for StrategyProfile {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            rsi_oversold: 28.0,
            rsi_overbought: 72.0,
            momentum_streak: 3,
            momentum_min_body_ratio: 0.5,
            reversal_min_wick_ratio: 0.6,
            reversal_extreme_lookback: 5,
            reversal_ema_atr_distance: 0.5,
            bb_period: 20,
            bb_std_dev: 2.0,
            bb_squeeze_lookback: 30,
            pullback_min_wick_ratio: 0.4,
            pullback_failure_lookback: 10,
            pullback_max_failures: 2,
            sr_rsi_oversold: 35.0,
            sr_rsi_overbought: 65.0,
            sr_indecision_max_body: 0.3,
            sr_confirm_min_body: 0.5,
            sr_cluster_tolerance: 0.5,
            sr_touch_tolerance: 0.3,
            sr_htf_factor: 5,
            sma_period: 14,
            atr_period: 14,
            atr_ma_period: 20,
            atr_min_ratio: 0.8,
            atr_max_ratio: 2.5,
            max_spread_atr_ratio: 0.3,
            session_start_hour: 7,
            session_end_hour: 20,
        }
    }
}

impl StrategyProfile {
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(Error::Config(msg));

        for (key, period) in [
            ("rsi_period", self.rsi_period),
            ("bb_period", self.bb_period),
            ("sma_period", self.sma_period),
            ("atr_period", self.atr_period),
            ("atr_ma_period", self.atr_ma_period),
            ("momentum_streak", self.momentum_streak),
            ("sr_htf_factor", self.sr_htf_factor),
            ("bb_squeeze_lookback", self.bb_squeeze_lookback),
        ] {
            if period < 2 {
                return fail(format!("{key} must be >= 2, got {period}"));
            }
        }
        if self.reversal_extreme_lookback == 0 || self.pullback_failure_lookback == 0 {
            return fail("lookbacks must be >= 1".into());
        }
        if !(self.rsi_oversold < self.rsi_overbought) {
            return fail("rsi_oversold must be below rsi_overbought".into());
        }
        if !(self.sr_rsi_oversold < self.sr_rsi_overbought) {
            return fail("sr_rsi_oversold must be below sr_rsi_overbought".into());
        }
        for (key, ratio) in [
            ("momentum_min_body_ratio", self.momentum_min_body_ratio),
            ("reversal_min_wick_ratio", self.reversal_min_wick_ratio),
            ("pullback_min_wick_ratio", self.pullback_min_wick_ratio),
            ("sr_indecision_max_body", self.sr_indecision_max_body),
            ("sr_confirm_min_body", self.sr_confirm_min_body),
        ] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return fail(format!("{key} must be in (0, 1], got {ratio}"));
            }
        }
        if !(self.atr_min_ratio >= 0.0 && self.atr_min_ratio < self.atr_max_ratio) {
            return fail("atr_min_ratio must be >= 0 and below atr_max_ratio".into());
        }
        if self.session_start_hour > 23 || self.session_end_hour > 23 {
            return fail("session hours must be in 0..=23".into());
        }
        Ok(())
    }
}

/// Profiles resolved per instrument with a `default` fallback.
/// Immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct ProfileBook {
    default: StrategyProfile,
    instruments: HashMap<String, StrategyProfile>,
}

#[derive(Debug, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    profiles: toml::Table,
}

impl ProfileBook {
    pub fn new(default: StrategyProfile) -> Self {
        Self {
            default,
            instruments: HashMap::new(),
        }
    }

    /// Load from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read profiles at '{path}': {e}")))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ProfileFile = toml::from_str(content)?;
        let mut tables = file.profiles;

        let base = match tables.remove("default") {
            Some(toml::Value::Table(t)) => t,
            Some(_) => return Err(Error::Config("[profiles.default] must be a table".into())),
            None => toml::Table::new(),
        };
        let default: StrategyProfile = toml::Value::Table(base.clone()).try_into()?;
        default.validate()?;

        let mut instruments = HashMap::new();
        for (instrument, value) in tables {
            let toml::Value::Table(overrides) = value else {
                return Err(Error::Config(format!(
                    "[profiles.\"{instrument}\"] must be a table"
                )));
            };
            let mut merged = base.clone();
            merged.extend(overrides);
            let profile: StrategyProfile = toml::Value::Table(merged).try_into()?;
            profile
                .validate()
                .map_err(|e| Error::Config(format!("profile '{instrument}': {e}")))?;
            instruments.insert(instrument.to_ascii_uppercase(), profile);
        }

        Ok(Self {
            default,
            instruments,
        })
    }

    pub fn with_instrument(mut self, instrument: &str, profile: StrategyProfile) -> Self {
        self.instruments
            .insert(instrument.to_ascii_uppercase(), profile);
        self
    }

    pub fn resolve(&self, instrument: &str) -> &StrategyProfile {
        self.instruments
            .get(&instrument.to_ascii_uppercase())
            .unwrap_or(&self.default)
    }

    pub fn default_profile(&self) -> &StrategyProfile {
        &self.default
    }
}
