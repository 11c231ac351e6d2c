use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::seq::SliceRandom;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use common::{
    AutotradeConfig, Broker, Config, Direction, Error, Result, SignalResult, TradeRecord,
    TradeSessionStats,
};
use risk::SessionLimits;
use strategy::SignalPipeline;

use crate::feed::fetch_window;

#[derive(Debug, Clone)]
pub struct AutotradeSettings {
    pub candle_count: usize,
    /// Candidate timeframes (minutes) when a session asks for "auto".
    pub auto_timeframes: Vec<u32>,
    /// A candidate at or above this is taken without scanning further.
    pub take_immediately: f64,
    /// Only candidates strictly above this are traded.
    pub min_confidence: f64,
    /// Added to the timeframe before the outcome is queried.
    pub settlement_padding: Duration,
    /// Pause between two scan iterations.
    pub scan_pause: Duration,
    pub status_interval: Duration,
    pub stop_timeout: Duration,
}

impl Default for AutotradeSettings {
    fn default() -> Self {
        Self {
            candle_count: 250,
            auto_timeframes: vec![1, 2, 5],
            take_immediately: 90.0,
            min_confidence: 70.0,
            settlement_padding: Duration::from_secs(5),
            scan_pause: Duration::from_secs(1),
            status_interval: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
        }
    }
}

impl AutotradeSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            candle_count: config.candle_count,
            status_interval: config.status_interval,
            ..Self::default()
        }
    }
}

/// Best candidate of one scan.
#[derive(Debug, Clone)]
struct Opportunity {
    instrument: String,
    timeframe: u32,
    direction: Direction,
    confidence: f64,
}

/// Scan, execute and settle loop of one autotrade session.
///
/// The worker is the only writer of its stats. It exits when cancelled,
/// when a session limit trips, or on a fatal error; every exit leaves
/// `active = false`.
pub struct AutotradeWorker {
    config: AutotradeConfig,
    limits: SessionLimits,
    broker: Arc<dyn Broker>,
    pipeline: Arc<SignalPipeline>,
    settings: AutotradeSettings,
    stats: Arc<RwLock<TradeSessionStats>>,
    token: CancellationToken,
}

impl AutotradeWorker {
    pub fn new(
        config: AutotradeConfig,
        limits: SessionLimits,
        broker: Arc<dyn Broker>,
        pipeline: Arc<SignalPipeline>,
        settings: AutotradeSettings,
        stats: Arc<RwLock<TradeSessionStats>>,
        token: CancellationToken,
    ) -> Self {
        Self {
            config,
            limits,
            broker,
            pipeline,
            settings,
            stats,
            token,
        }
    }

    /// Run until stopped. Call from `tokio::spawn`.
    pub async fn run(self) -> Result<()> {
        info!(
            user = %self.config.user(),
            instruments = ?self.config.instruments,
            timeframe = self.config.timeframe,
            strategy = %self.config.strategy,
            amount = self.limits.stake,
            "Autotrade worker running"
        );
        let outcome = self.trade_loop().await;
        self.stats.write().await.active = false;
        if let Err(e) = &outcome {
            error!(user = %self.config.user(), error = %e, "Autotrade worker failed");
            self.token.cancel();
        }
        info!(user = %self.config.user(), "Autotrade worker exited");
        outcome
    }

    async fn trade_loop(&self) -> Result<()> {
        loop {
            if self.token.is_cancelled() {
                return Ok(());
            }
            let stats = self.stats.read().await.clone();
            if let Some(reason) = self.limits.check(&stats) {
                info!(user = %self.config.user(), %reason, "Stop condition reached");
                return Ok(());
            }

            match self.iteration().await {
                Ok(()) => {}
                Err(e) if e.is_collaborator() => {
                    warn!(user = %self.config.user(), error = %e, "Broker call failed, retrying next tick");
                }
                Err(e) => return Err(e),
            }

            if !self.pause(self.settings.scan_pause).await {
                return Ok(());
            }
        }
    }

    async fn iteration(&self) -> Result<()> {
        self.ensure_connected().await?;
        self.refresh_account().await;

        let Some(best) = self.scan().await? else {
            return Ok(());
        };
        if best.confidence <= self.settings.min_confidence {
            debug!(
                user = %self.config.user(),
                instrument = %best.instrument,
                confidence = best.confidence,
                "Best candidate below threshold"
            );
            return Ok(());
        }
        if !self
            .pipeline
            .claim(&best.instrument, &self.config.strategy, Utc::now())
        {
            debug!(instrument = %best.instrument, "Candidate still cooling down");
            return Ok(());
        }
        self.execute(best).await
    }

    async fn ensure_connected(&self) -> Result<()> {
        if self.broker.is_connected().await {
            return Ok(());
        }
        info!(user = %self.config.user(), "Broker connection lost, reconnecting");
        self.broker.reconnect().await
    }

    /// Best-effort balance and currency refresh.
    async fn refresh_account(&self) {
        match self.broker.balance().await {
            Ok(balance) => self.stats.write().await.balance = balance,
            Err(e) => warn!(user = %self.config.user(), error = %e, "Balance refresh failed"),
        }
        match self.broker.currency().await {
            Ok(currency) => self.stats.write().await.currency = Some(currency),
            Err(e) => warn!(user = %self.config.user(), error = %e, "Currency refresh failed"),
        }
    }

    /// Evaluate every instrument (in random order) on the configured or
    /// auto timeframes. Keys still cooling down are skipped. `None` when
    /// cancelled or nothing is directional.
    async fn scan(&self) -> Result<Option<Opportunity>> {
        let mut instruments = self.config.instruments.clone();
        instruments.shuffle(&mut rand::thread_rng());
        let timeframes = if self.config.timeframe == 0 {
            self.settings.auto_timeframes.clone()
        } else {
            vec![self.config.timeframe]
        };

        let mut best: Option<Opportunity> = None;
        for instrument in &instruments {
            for &timeframe in &timeframes {
                if self.token.is_cancelled() {
                    return Ok(None);
                }
                let fetched = tokio::select! {
                    _ = self.token.cancelled() => return Ok(None),
                    fetched = fetch_window(
                        self.broker.as_ref(),
                        instrument,
                        timeframe,
                        self.settings.candle_count,
                    ) => fetched,
                };
                let candles = match fetched {
                    Ok(c) => c,
                    Err(e) if e.is_connection() => return Err(e),
                    Err(e) => {
                        warn!(%instrument, timeframe, error = %e, "Candle fetch failed");
                        continue;
                    }
                };
                let spread = self.broker.spread(instrument).await;
                let result = self.pipeline.screen_at(
                    instrument,
                    &candles,
                    &self.config.strategy,
                    spread,
                    Utc::now(),
                );

                let Some(candidate) = opportunity(instrument, timeframe, &result) else {
                    continue;
                };
                if best.as_ref().map_or(true, |b| candidate.confidence > b.confidence) {
                    best = Some(candidate);
                }
                if result.confidence >= self.settings.take_immediately {
                    return Ok(best);
                }
            }
        }
        Ok(best)
    }

    async fn execute(&self, best: Opportunity) -> Result<()> {
        let amount = self.limits.stake;
        let placement = self
            .broker
            .place_trade(amount, &best.instrument, best.direction, best.timeframe)
            .await?;
        if !placement.accepted {
            warn!(instrument = %best.instrument, amount, "Trade rejected by broker");
            return Ok(());
        }
        let trade_id = placement
            .trade_id
            .ok_or_else(|| Error::Broker("accepted trade without id".into()))?;

        {
            let mut stats = self.stats.write().await;
            stats.total_trades += 1;
            stats.last_trade = Some(TradeRecord {
                trade_id: trade_id.clone(),
                instrument: best.instrument.clone(),
                direction: best.direction,
                timeframe: best.timeframe,
                confidence: best.confidence,
                amount,
                payout: None,
                opened_at: Utc::now(),
            });
        }
        info!(
            user = %self.config.user(),
            instrument = %best.instrument,
            direction = %best.direction,
            timeframe = best.timeframe,
            confidence = best.confidence,
            amount,
            trade_id = %trade_id,
            "Trade placed"
        );

        let expiry = Duration::from_secs(u64::from(best.timeframe) * 60) + self.settings.settlement_padding;
        if !self.pause(expiry).await {
            info!(trade_id = %trade_id, "Cancelled while waiting for expiry");
            return Ok(());
        }

        let payout = self.broker.check_outcome(&trade_id).await?;
        {
            let mut stats = self.stats.write().await;
            stats.record_outcome(payout, amount);
            if let Some(trade) = stats.last_trade.as_mut() {
                trade.payout = Some(payout);
            }
            info!(
                user = %self.config.user(),
                trade_id = %trade_id,
                payout,
                profit = stats.profit,
                wins = stats.wins,
                losses = stats.losses,
                "Trade settled"
            );
        }
        self.refresh_account().await;
        Ok(())
    }

    /// Sleep unless cancelled first. `false` when cancelled.
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.token.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}

fn opportunity(instrument: &str, timeframe: u32, result: &SignalResult) -> Option<Opportunity> {
    Some(Opportunity {
        instrument: instrument.to_string(),
        timeframe,
        direction: result.action.direction()?,
        confidence: result.confidence,
    })
}
