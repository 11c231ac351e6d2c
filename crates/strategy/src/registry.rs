use tracing::debug;

use common::{Candle, SignalResult};

use crate::config::StrategyProfile;
use crate::gate;
use crate::market::{MarketClass, MarketKind};
use crate::strategies::{
    BollingerReclaim, Momentum, RsiReversal, SmaTrend, SupportResistanceReversal, TrendPullback,
};
use crate::window::{CandleWindow, WindowAlignment};
use crate::Strategy;

/// No strategy evaluates a window shorter than this.
pub const MIN_WINDOW: usize = 20;

/// Legacy and shorthand names, already normalised (see [`normalize`]).
const ALIASES: &[(&str, &str)] = &[
    ("rsireversal", "rsi_reversal_otc"),
    ("smatrend", "sma_trend"),
    ("quick2mstrategy", "momentum_otc"),
    ("momentum", "momentum_otc"),
    ("bollinger", "bollinger_reclaim"),
    ("pullback", "trend_pullback"),
    ("supportresistance", "sr_reversal_otc"),
    ("sr", "sr_reversal_otc"),
];

/// One registered strategy: a family bound to a canonical name and the
/// markets it may run on.
pub struct StrategySpec {
    pub name: &'static str,
    pub class: MarketClass,
    /// Reversal strategies trade against the trend and skip the trend filter.
    pub reversal: bool,
    strategy: Box<dyn Strategy>,
}

impl StrategySpec {
    fn new(
        name: &'static str,
        class: MarketClass,
        reversal: bool,
        strategy: impl Strategy + 'static,
    ) -> Self {
        Self {
            name,
            class,
            reversal,
            strategy: Box::new(strategy),
        }
    }

    pub fn strategy(&self) -> &dyn Strategy {
        self.strategy.as_ref()
    }

    /// Fewest candles (forming one included) the strategy will look at.
    pub fn min_candles(&self) -> usize {
        self.strategy.min_candles().max(MIN_WINDOW)
    }
}

impl std::fmt::Debug for StrategySpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategySpec")
            .field("name", &self.name)
            .field("class", &self.class)
            .field("reversal", &self.reversal)
            .field("family", &self.strategy.family())
            .finish()
    }
}

/// All strategies keyed by canonical name, with alias resolution.
#[derive(Debug)]
pub struct StrategyRegistry {
    specs: Vec<StrategySpec>,
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl StrategyRegistry {
    pub fn builtin() -> Self {
        use MarketClass::{Any, OtcOnly, RealOnly};
        Self {
            specs: vec![
                StrategySpec::new("momentum_otc", OtcOnly, false, Momentum),
                StrategySpec::new("momentum_real", RealOnly, false, Momentum),
                StrategySpec::new("rsi_reversal_otc", OtcOnly, true, RsiReversal),
                StrategySpec::new("rsi_reversal_real", RealOnly, true, RsiReversal),
                StrategySpec::new("bollinger_reclaim", RealOnly, true, BollingerReclaim),
                StrategySpec::new("trend_pullback", RealOnly, false, TrendPullback),
                StrategySpec::new("sr_reversal_otc", OtcOnly, true, SupportResistanceReversal),
                StrategySpec::new("sr_reversal_real", RealOnly, true, SupportResistanceReversal),
                StrategySpec::new("sma_trend", Any, false, SmaTrend),
            ],
        }
    }

    /// Look a strategy up by canonical name or alias.
    pub fn resolve(&self, name: &str) -> Option<&StrategySpec> {
        let key = normalize(name);
        self.specs
            .iter()
            .find(|s| normalize(s.name) == key)
            .or_else(|| {
                ALIASES
                    .iter()
                    .find(|(alias, _)| *alias == key)
                    .and_then(|(_, canonical)| self.specs.iter().find(|s| s.name == *canonical))
            })
    }

    pub fn canonical_name(&self, name: &str) -> Option<&'static str> {
        self.resolve(name).map(|s| s.name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.specs.iter().map(|s| s.name)
    }

    /// Run one strategy over a raw candle window. Never fails: every guard
    /// that trips yields NEUTRAL/0 with a reason.
    pub fn dispatch(
        &self,
        instrument: &str,
        candles: &[Candle],
        name: &str,
        profile: &StrategyProfile,
        alignment: WindowAlignment,
        spread: Option<f64>,
    ) -> SignalResult {
        let Some(spec) = self.resolve(name) else {
            debug!(strategy = %name, "Unknown strategy");
            return SignalResult::neutral_because("unknown strategy");
        };
        if candles.len() < spec.min_candles() {
            return SignalResult::neutral_because("insufficient data");
        }
        let Some(window) = CandleWindow::new(candles, alignment) else {
            return SignalResult::neutral_because("insufficient data");
        };

        let kind = MarketKind::of(instrument);
        if !spec.class.admits(kind) {
            debug!(%instrument, strategy = spec.name, "Market class mismatch");
            return SignalResult::neutral_because("strategy not available for this market");
        }
        if spec.class == MarketClass::RealOnly {
            if let Err(rejection) = gate::check(&window, profile, spread) {
                debug!(%instrument, strategy = spec.name, %rejection, "Gate rejected window");
                return SignalResult::neutral_because(rejection.to_string());
            }
        }

        let result = spec.strategy.evaluate(instrument, &window, profile);
        if !result.is_directional() {
            debug!(
                %instrument,
                strategy = spec.name,
                reason = result.reason.as_deref().unwrap_or(""),
                "Abstained"
            );
        }
        result
    }
}

/// Lowercase and drop spaces, dashes and underscores.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}
