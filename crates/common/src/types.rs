use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One price candle as delivered by the candle source.
///
/// Sequences are ordered oldest → newest. The last element of a live window
/// is usually still forming; see `strategy::CandleWindow` for how strategies
/// pick the candle they trigger on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<f64>,
    /// Candle open time, epoch seconds.
    pub timestamp: i64,
}

impl Candle {
    pub fn new(open: f64, high: f64, low: f64, close: f64, timestamp: i64) -> Self {
        Self {
            open,
            high,
            low,
            close,
            volume: None,
            timestamp,
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }
}

/// Direction of a binary-option trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Call,
    Put,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Call => write!(f, "CALL"),
            Direction::Put => write!(f, "PUT"),
        }
    }
}

/// Action carried by a signal. `Neutral` means "do nothing".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Call,
    Put,
    #[default]
    Neutral,
}

impl Action {
    pub fn direction(self) -> Option<Direction> {
        match self {
            Action::Call => Some(Direction::Call),
            Action::Put => Some(Direction::Put),
            Action::Neutral => None,
        }
    }

    pub fn is_directional(self) -> bool {
        self != Action::Neutral
    }
}

impl From<Direction> for Action {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Call => Action::Call,
            Direction::Put => Action::Put,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Call => write!(f, "CALL"),
            Action::Put => write!(f, "PUT"),
            Action::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Output of a strategy evaluation, before or after the pipeline filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SignalResult {
    pub action: Action,
    /// 0..=100 once the pipeline has clamped it.
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SignalResult {
    pub fn neutral() -> Self {
        Self::default()
    }

    pub fn neutral_because(reason: impl Into<String>) -> Self {
        Self {
            action: Action::Neutral,
            confidence: 0.0,
            reason: Some(reason.into()),
        }
    }

    pub fn directional(direction: Direction, confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            action: direction.into(),
            confidence,
            reason: Some(reason.into()),
        }
    }

    pub fn is_directional(&self) -> bool {
        self.action.is_directional()
    }

    /// Enforce the output invariants: confidence in [0, 100] and
    /// NEUTRAL ⇒ confidence 0.
    pub fn clamped(mut self) -> Self {
        if self.action == Action::Neutral || !self.confidence.is_finite() {
            self.confidence = 0.0;
        }
        self.confidence = self.confidence.clamp(0.0, 100.0);
        self
    }
}

/// A directional signal that survived the pipeline, as recorded in bot
/// history and handed to notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub instrument: String,
    pub strategy: String,
    pub action: Direction,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub timeframe: u32,
    pub timestamp: DateTime<Utc>,
}

/// Configuration of one streaming signal bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotSessionConfig {
    pub instruments: Vec<String>,
    /// Candle granularity in minutes.
    pub timeframe: u32,
    pub strategy: String,
    /// Push recipients for notifications (device tokens / chat ids).
    #[serde(default)]
    pub recipients: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BotStats {
    pub total: u64,
    pub calls: u64,
    pub puts: u64,
}

/// Snapshot returned by a bot status query. Never an error: unknown users
/// get [`BotStatus::inactive`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BotStatus {
    pub active: bool,
    pub config: Option<BotSessionConfig>,
    pub stats: BotStats,
    pub last_signal: Option<SignalEvent>,
    /// Oldest first, bounded by the session.
    pub history: VecDeque<SignalEvent>,
}

impl BotStatus {
    pub fn inactive() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountType {
    #[default]
    Practice,
    Real,
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountType::Practice => write!(f, "PRACTICE"),
            AccountType::Real => write!(f, "REAL"),
        }
    }
}

/// Per-user login for the brokerage connector.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub user: String,
    pub password: String,
    #[serde(default)]
    pub account_type: AccountType,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("account_type", &self.account_type)
            .finish()
    }
}

fn default_instruments() -> Vec<String> {
    vec!["EURUSD-OTC".to_string()]
}

/// Configuration of one autotrade session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutotradeConfig {
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(default = "default_instruments")]
    pub instruments: Vec<String>,
    /// Stake per trade, in account currency.
    pub amount: f64,
    /// Minutes; 0 selects the best of the auto-timeframe candidates.
    pub timeframe: u32,
    pub strategy: String,
    /// Session loss (account currency) at which trading stops.
    #[serde(default)]
    pub stop_loss: Option<f64>,
    /// Session profit (account currency) at which trading stops.
    #[serde(default)]
    pub take_profit: Option<f64>,
    pub max_consecutive_losses: u32,
    pub max_trades: u32,
}

impl AutotradeConfig {
    pub fn user(&self) -> &str {
        &self.credentials.user
    }
}

/// Outcome bookkeeping for one placed trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub trade_id: String,
    pub instrument: String,
    pub direction: Direction,
    pub timeframe: u32,
    pub confidence: f64,
    pub amount: f64,
    /// Signed payout once the outcome is known.
    pub payout: Option<f64>,
    pub opened_at: DateTime<Utc>,
}

/// Running statistics of an autotrade session. Written only by the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TradeSessionStats {
    pub total_trades: u32,
    pub wins: u32,
    pub losses: u32,
    pub profit: f64,
    pub consecutive_losses: u32,
    pub balance: f64,
    pub currency: Option<String>,
    pub active: bool,
    #[serde(default)]
    pub last_trade: Option<TradeRecord>,
}

impl TradeSessionStats {
    pub fn started() -> Self {
        Self {
            active: true,
            ..Self::default()
        }
    }

    /// Book a settled trade: a positive payout is a win and resets the
    /// loss streak, anything else loses the stake.
    pub fn record_outcome(&mut self, payout: f64, stake: f64) {
        if payout > 0.0 {
            self.wins += 1;
            self.profit += payout;
            self.consecutive_losses = 0;
        } else {
            self.losses += 1;
            self.profit -= stake;
            self.consecutive_losses += 1;
        }
    }
}

/// Answer of the trade execution collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradePlacement {
    pub accepted: bool,
    pub trade_id: Option<String>,
}

/// Payload handed to the notification collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub data: BTreeMap<String, String>,
}

impl Notification {
    pub fn for_signal(event: &SignalEvent) -> Self {
        let mut data = BTreeMap::new();
        data.insert("instrument".to_string(), event.instrument.clone());
        data.insert("action".to_string(), event.action.to_string());
        data.insert("confidence".to_string(), format!("{:.1}", event.confidence));
        data.insert("strategy".to_string(), event.strategy.clone());
        data.insert("timeframe".to_string(), event.timeframe.to_string());
        Self {
            title: format!("{} signal detected", event.action),
            body: format!(
                "{}: {} with {:.1}% confidence.",
                event.instrument, event.action, event.confidence
            ),
            data,
        }
    }
}

/// Commands accepted by the session command router.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    StartBot { user: String, config: BotSessionConfig },
    StopBot { user: String },
    StartAutotrade(AutotradeConfig),
    StopAutotrade { user: String },
}
