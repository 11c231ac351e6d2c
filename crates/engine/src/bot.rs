use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use common::{
    BotSessionConfig, BotStatus, CandleSource, Config, Direction, Error, Notification, Notifier,
    Result, SignalEvent,
};
use strategy::SignalPipeline;

use crate::feed::fetch_window;

/// Signals kept per session; the oldest is evicted first.
pub const HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone)]
pub struct BotSettings {
    /// Pause between two full scans of the instrument list.
    pub poll_interval: Duration,
    pub candle_count: usize,
    /// How long `stop` waits for the poll loop before abandoning it.
    pub stop_timeout: Duration,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            candle_count: 250,
            stop_timeout: Duration::from_secs(2),
        }
    }
}

impl BotSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_interval: config.bot_poll_interval,
            candle_count: config.candle_count,
            ..Self::default()
        }
    }
}

struct BotSession {
    token: CancellationToken,
    /// Taken by the first `stop` call.
    handle: Option<JoinHandle<()>>,
    status: Arc<RwLock<BotStatus>>,
}

/// One independent polling session per user.
pub struct BotSessionManager {
    pipeline: Arc<SignalPipeline>,
    source: Arc<dyn CandleSource>,
    notifier: Arc<dyn Notifier>,
    settings: BotSettings,
    sessions: Mutex<HashMap<String, BotSession>>,
}

impl BotSessionManager {
    pub fn new(
        pipeline: Arc<SignalPipeline>,
        source: Arc<dyn CandleSource>,
        notifier: Arc<dyn Notifier>,
        settings: BotSettings,
    ) -> Self {
        Self {
            pipeline,
            source,
            notifier,
            settings,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Validate `config` and spawn a poll loop for `user`.
    pub async fn start(&self, user: &str, mut config: BotSessionConfig) -> Result<()> {
        if config.instruments.is_empty() {
            return Err(Error::Config("bot session needs at least one instrument".into()));
        }
        if config.timeframe == 0 {
            return Err(Error::Config("bot timeframe must be at least one minute".into()));
        }
        let canonical = self
            .pipeline
            .registry()
            .canonical_name(&config.strategy)
            .ok_or_else(|| Error::UnknownStrategy(config.strategy.clone()))?;
        config.strategy = canonical.to_string();

        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(user) {
            return Err(Error::SessionExists { user: user.to_string() });
        }

        let status = Arc::new(RwLock::new(BotStatus {
            active: true,
            config: Some(config.clone()),
            ..BotStatus::default()
        }));
        let token = CancellationToken::new();
        let poller = BotPoller {
            user: user.to_string(),
            config,
            pipeline: self.pipeline.clone(),
            source: self.source.clone(),
            notifier: self.notifier.clone(),
            settings: self.settings.clone(),
            status: status.clone(),
            token: token.clone(),
        };
        let handle = tokio::spawn(poller.run());
        sessions.insert(
            user.to_string(),
            BotSession {
                token,
                handle: Some(handle),
                status,
            },
        );
        info!(%user, "Bot session started");
        Ok(())
    }

    /// Cancel `user`'s session and wait (bounded) for its loop before
    /// removing it.
    pub async fn stop(&self, user: &str) -> Result<()> {
        let (token, handle) = {
            let mut sessions = self.sessions.lock().await;
            let session = sessions
                .get_mut(user)
                .ok_or_else(|| Error::SessionNotFound { user: user.to_string() })?;
            let handle = session
                .handle
                .take()
                .ok_or_else(|| Error::SessionNotFound { user: user.to_string() })?;
            (session.token.clone(), handle)
        };

        token.cancel();
        if tokio::time::timeout(self.settings.stop_timeout, handle)
            .await
            .is_err()
        {
            warn!(%user, "Bot loop did not exit in time, abandoning it");
        }
        self.sessions.lock().await.remove(user);
        info!(%user, "Bot session stopped");
        Ok(())
    }

    /// Snapshot of `user`'s session; inactive when there is none.
    pub async fn status(&self, user: &str) -> BotStatus {
        let status = {
            let sessions = self.sessions.lock().await;
            match sessions.get(user) {
                Some(session) => session.status.clone(),
                None => return BotStatus::inactive(),
            }
        };
        let snapshot = status.read().await.clone();
        snapshot
    }

    pub async fn users(&self) -> Vec<String> {
        self.sessions.lock().await.keys().cloned().collect()
    }
}

/// The poll loop of one bot session.
struct BotPoller {
    user: String,
    config: BotSessionConfig,
    pipeline: Arc<SignalPipeline>,
    source: Arc<dyn CandleSource>,
    notifier: Arc<dyn Notifier>,
    settings: BotSettings,
    status: Arc<RwLock<BotStatus>>,
    token: CancellationToken,
}

impl BotPoller {
    async fn run(self) {
        info!(
            user = %self.user,
            instruments = ?self.config.instruments,
            timeframe = self.config.timeframe,
            strategy = %self.config.strategy,
            "Bot poll loop running"
        );
        loop {
            for instrument in &self.config.instruments {
                if self.token.is_cancelled() {
                    break;
                }
                self.scan(instrument).await;
            }
            tokio::select! {
                _ = self.token.cancelled() => break,
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
            }
        }
        self.status.write().await.active = false;
        info!(user = %self.user, "Bot poll loop exited");
    }

    async fn scan(&self, instrument: &str) {
        let fetched = tokio::select! {
            _ = self.token.cancelled() => return,
            fetched = async {
                let candles = fetch_window(
                    self.source.as_ref(),
                    instrument,
                    self.config.timeframe,
                    self.settings.candle_count,
                )
                .await?;
                let spread = self.source.spread(instrument).await;
                Ok::<_, Error>((candles, spread))
            } => fetched,
        };
        let (candles, spread) = match fetched {
            Ok(v) => v,
            Err(e) => {
                warn!(user = %self.user, %instrument, error = %e, "Candle fetch failed");
                return;
            }
        };

        let result =
            self.pipeline
                .evaluate_at(instrument, &candles, &self.config.strategy, spread, Utc::now());
        let Some(action) = result.action.direction() else {
            debug!(user = %self.user, %instrument, "No signal");
            return;
        };

        let event = SignalEvent {
            instrument: instrument.to_string(),
            strategy: self.config.strategy.clone(),
            action,
            confidence: result.confidence,
            reason: result.reason,
            timeframe: self.config.timeframe,
            timestamp: Utc::now(),
        };
        info!(
            user = %self.user,
            %instrument,
            action = %event.action,
            confidence = event.confidence,
            "Signal found"
        );
        self.record(&event).await;

        let notification = Notification::for_signal(&event);
        tokio::select! {
            _ = self.token.cancelled() => {}
            sent = self.notifier.notify(&self.config.recipients, &notification) => {
                if let Err(e) = sent {
                    warn!(user = %self.user, error = %e, "Notification failed");
                }
            }
        }
    }

    async fn record(&self, event: &SignalEvent) {
        let mut status = self.status.write().await;
        status.stats.total += 1;
        match event.action {
            Direction::Call => status.stats.calls += 1,
            Direction::Put => status.stats.puts += 1,
        }
        status.last_signal = Some(event.clone());
        status.history.push_back(event.clone());
        while status.history.len() > HISTORY_LIMIT {
            status.history.pop_front();
        }
    }
}
