#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use common::{
    AccountType, AutotradeConfig, Broker, BrokerConnector, Candle, CandleSource, Credentials,
    Direction, Error, Notification, Notifier, Result, TradeExecutor, TradePlacement,
    TradeSessionStats,
};
use engine::{AutotradeSettings, BotSettings, Collaborators, MemoryStatusStore, Orchestrator};
use paper::PaperAccount;
use strategy::{PipelineConfig, ProfileBook, SignalPipeline};

// 2024-01-01 10:00:00 UTC
pub const START: i64 = 1_704_103_200;

fn series(ohlc: &[(f64, f64, f64, f64)]) -> Vec<Candle> {
    ohlc.iter()
        .enumerate()
        .map(|(i, &(o, h, l, c))| Candle::new(o, h, l, c, START + i as i64 * 60))
        .collect()
}

/// `n` bars as (open, high, low, close): chop around 1.1 ending red, a
/// green streak with the given bodies, then one bodiless forming bar.
pub fn momentum_bars(bodies: &[f64], n: usize) -> Vec<(f64, f64, f64, f64)> {
    let chop = n - bodies.len() - 1;
    let level: f64 = 1.1;
    let mut ohlc: Vec<(f64, f64, f64, f64)> = (0..chop)
        .map(|i| {
            if (chop - i) % 2 == 0 {
                (level, level + 0.0006, level - 0.0002, level + 0.0004)
            } else {
                (level + 0.0004, level + 0.0006, level - 0.0002, level)
            }
        })
        .collect();
    let mut price = level;
    for &body in bodies {
        ohlc.push((price, price + body + 0.0001, price - 0.0001, price + body));
        price += body;
    }
    ohlc.push((price, price + 0.0001, price - 0.0001, price));
    ohlc
}

/// Three-candle streak: momentum CALL at 85.
pub fn momentum_candles(n: usize) -> Vec<Candle> {
    series(&momentum_bars(&[0.0006, 0.0006, 0.0008], n))
}

/// Four-candle streak: momentum CALL at 90.
pub fn strong_momentum_candles(n: usize) -> Vec<Candle> {
    series(&momentum_bars(&[0.0006, 0.0006, 0.0006, 0.0008], n))
}

/// One-minute candles whose five-minute bars carry a three-bar streak while
/// the one- and two-minute views end on flat candles.
pub fn five_minute_momentum(bars: usize) -> Vec<Candle> {
    let mut minutes = Vec::with_capacity(bars * 5);
    let five = momentum_bars(&[0.0006, 0.0006, 0.0008], bars);
    let last = five.len() - 1;
    for (k, &(o, h, l, c)) in five.iter().enumerate() {
        if k == last {
            minutes.extend(std::iter::repeat((o, o, o, o)).take(5));
            continue;
        }
        minutes.push((o, h, l, o));
        minutes.extend(std::iter::repeat((o, o, o, o)).take(3));
        minutes.push((o, o.max(c), o.min(c), c));
    }
    series(&minutes)
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(Vec<String>, Notification)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, recipients: &[String], notification: &Notification) -> Result<()> {
        self.sent
            .lock()
            .await
            .push((recipients.to_vec(), notification.clone()));
        Ok(())
    }
}

pub fn pipeline_with_cooldown(cooldown: Duration) -> Arc<SignalPipeline> {
    Arc::new(SignalPipeline::new(
        Arc::new(ProfileBook::default()),
        PipelineConfig {
            cooldown,
            ..PipelineConfig::default()
        },
    ))
}

pub fn orchestrator(
    pipeline: Arc<SignalPipeline>,
    candles: Arc<dyn CandleSource>,
    notifier: Arc<dyn Notifier>,
    connector: Arc<dyn BrokerConnector>,
    store: Arc<MemoryStatusStore>,
) -> Arc<Orchestrator> {
    Arc::new(Orchestrator::new(
        pipeline,
        Collaborators {
            candles,
            notifier,
            connector,
            status: store,
        },
        BotSettings::default(),
        AutotradeSettings::default(),
    ))
}

pub fn autotrade_config(user: &str, instruments: &[&str], timeframe: u32, max_trades: u32) -> AutotradeConfig {
    AutotradeConfig {
        credentials: Credentials {
            user: user.into(),
            password: "pw".into(),
            account_type: AccountType::Practice,
        },
        instruments: instruments.iter().map(|s| s.to_string()).collect(),
        amount: 10.0,
        timeframe,
        strategy: "Quick 2M Strategy".into(),
        stop_loss: None,
        take_profit: None,
        max_consecutive_losses: 3,
        max_trades,
    }
}

/// Paper account wrapper that records candle requests and can be told to
/// fail trade placement with a non-broker error.
pub struct ScriptedBroker {
    pub account: Arc<PaperAccount>,
    pub fetches: Mutex<Vec<(String, u32)>>,
    pub corrupt_ledger: bool,
}

impl ScriptedBroker {
    pub fn new(account: Arc<PaperAccount>, corrupt_ledger: bool) -> Arc<Self> {
        Arc::new(Self {
            account,
            fetches: Mutex::new(Vec::new()),
            corrupt_ledger,
        })
    }
}

#[async_trait]
impl CandleSource for ScriptedBroker {
    async fn candles(&self, instrument: &str, timeframe: u32, count: usize) -> Result<Vec<Candle>> {
        self.fetches
            .lock()
            .await
            .push((instrument.to_string(), timeframe));
        self.account.candles(instrument, timeframe, count).await
    }

    async fn spread(&self, instrument: &str) -> Option<f64> {
        self.account.spread(instrument).await
    }
}

#[async_trait]
impl TradeExecutor for ScriptedBroker {
    async fn place_trade(
        &self,
        amount: f64,
        instrument: &str,
        direction: Direction,
        timeframe: u32,
    ) -> Result<TradePlacement> {
        if self.corrupt_ledger {
            return Err(Error::Other("trade ledger corrupted".into()));
        }
        self.account
            .place_trade(amount, instrument, direction, timeframe)
            .await
    }

    async fn check_outcome(&self, trade_id: &str) -> Result<f64> {
        self.account.check_outcome(trade_id).await
    }

    async fn balance(&self) -> Result<f64> {
        self.account.balance().await
    }

    async fn currency(&self) -> Result<String> {
        self.account.currency().await
    }

    async fn is_connected(&self) -> bool {
        self.account.is_connected().await
    }

    async fn reconnect(&self) -> Result<()> {
        self.account.reconnect().await
    }
}

/// Hands out the same scripted broker to every user.
pub struct ScriptedConnector(pub Arc<ScriptedBroker>);

#[async_trait]
impl BrokerConnector for ScriptedConnector {
    async fn connect(&self, _credentials: &Credentials) -> Result<Arc<dyn Broker>> {
        let broker: Arc<dyn Broker> = self.0.clone();
        Ok(broker)
    }
}

/// Candle source whose every fetch takes `delay` and returns nothing.
pub struct SlowSource {
    pub delay: Duration,
    pub calls: Mutex<Vec<String>>,
}

#[async_trait]
impl CandleSource for SlowSource {
    async fn candles(&self, instrument: &str, _timeframe: u32, _count: usize) -> Result<Vec<Candle>> {
        self.calls.lock().await.push(instrument.to_string());
        tokio::time::sleep(self.delay).await;
        Ok(Vec::new())
    }
}

/// Poll once per simulated second until `user` has placed `trades` trades.
pub async fn wait_for_trades(o: &Orchestrator, user: &str, trades: u32) -> Option<TradeSessionStats> {
    for _ in 0..600 {
        let stats = o.autotrade_status(user).await;
        if stats.total_trades >= trades {
            return Some(stats);
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    None
}

/// Poll once per simulated second until an inactive snapshot of `user` is saved.
pub async fn wait_for_final_save(store: &MemoryStatusStore, user: &str) -> Option<TradeSessionStats> {
    for _ in 0..600 {
        if let Some(saved) = store.get(user).await.filter(|s| !s.active) {
            return Some(saved);
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    None
}
