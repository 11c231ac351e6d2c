use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use common::{
    AutotradeConfig, BrokerConnector, Error, Result, StatusStore, TradeSessionStats,
};
use risk::SessionLimits;
use strategy::SignalPipeline;

use crate::autotrade::{AutotradeSettings, AutotradeWorker};

const MIN_STATUS_INTERVAL: Duration = Duration::from_millis(100);

struct AutotradeSession {
    token: CancellationToken,
    /// Taken by the first `stop` call.
    supervisor: Option<JoinHandle<()>>,
    stats: Arc<RwLock<TradeSessionStats>>,
}

impl AutotradeSession {
    /// Running, or being stopped.
    fn is_running(&self) -> bool {
        match &self.supervisor {
            Some(handle) => !handle.is_finished(),
            None => true,
        }
    }
}

/// Owns the autotrade sessions: connects each user through the broker
/// connector, supervises its worker, and publishes status snapshots.
pub struct AutotradeManager {
    connector: Arc<dyn BrokerConnector>,
    pipeline: Arc<SignalPipeline>,
    store: Arc<dyn StatusStore>,
    settings: AutotradeSettings,
    sessions: Mutex<HashMap<String, AutotradeSession>>,
}

impl AutotradeManager {
    pub fn new(
        connector: Arc<dyn BrokerConnector>,
        pipeline: Arc<SignalPipeline>,
        store: Arc<dyn StatusStore>,
        settings: AutotradeSettings,
    ) -> Self {
        Self {
            connector,
            pipeline,
            store,
            settings,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Validate `config`, connect the user's account and spawn a supervised
    /// worker. A finished session of the same user is replaced.
    pub async fn start(&self, mut config: AutotradeConfig) -> Result<()> {
        let user = config.user().to_string();
        if user.is_empty() {
            return Err(Error::Config("autotrade session needs a user".into()));
        }
        if config.instruments.is_empty() {
            return Err(Error::Config("autotrade session needs at least one instrument".into()));
        }
        let canonical = self
            .pipeline
            .registry()
            .canonical_name(&config.strategy)
            .ok_or_else(|| Error::UnknownStrategy(config.strategy.clone()))?;
        config.strategy = canonical.to_string();
        let limits = SessionLimits::from_config(&config)?;

        if self.is_running(&user).await {
            return Err(Error::SessionExists { user });
        }
        let broker = self.connector.connect(&config.credentials).await?;

        let mut sessions = self.sessions.lock().await;
        if sessions.get(&user).is_some_and(AutotradeSession::is_running) {
            return Err(Error::SessionExists { user });
        }

        let stats = Arc::new(RwLock::new(TradeSessionStats::started()));
        let token = CancellationToken::new();
        let worker = AutotradeWorker::new(
            config,
            limits,
            broker,
            self.pipeline.clone(),
            self.settings.clone(),
            stats.clone(),
            token.clone(),
        );
        let supervisor = tokio::spawn(supervise(
            user.clone(),
            worker,
            stats.clone(),
            token.clone(),
            self.store.clone(),
            self.settings.clone(),
        ));
        sessions.insert(
            user.clone(),
            AutotradeSession {
                token,
                supervisor: Some(supervisor),
                stats,
            },
        );
        info!(%user, "Autotrade session started");
        Ok(())
    }

    /// Cancel `user`'s session, wait (bounded) for it to wind down, then
    /// remove it.
    pub async fn stop(&self, user: &str) -> Result<()> {
        let (token, supervisor) = {
            let mut sessions = self.sessions.lock().await;
            let session = sessions
                .get_mut(user)
                .ok_or_else(|| Error::SessionNotFound { user: user.to_string() })?;
            let supervisor = session
                .supervisor
                .take()
                .ok_or_else(|| Error::SessionNotFound { user: user.to_string() })?;
            (session.token.clone(), supervisor)
        };

        token.cancel();
        if tokio::time::timeout(self.settings.stop_timeout, supervisor)
            .await
            .is_err()
        {
            warn!(%user, "Autotrade worker did not exit in time, abandoning it");
        }
        self.sessions.lock().await.remove(user);
        info!(%user, "Autotrade session stopped");
        Ok(())
    }

    /// Latest stats of `user`'s session. A session that stopped on its own
    /// reports `active = false` until it is stopped or replaced; unknown
    /// users get an empty inactive snapshot.
    pub async fn status(&self, user: &str) -> TradeSessionStats {
        let stats = {
            let sessions = self.sessions.lock().await;
            match sessions.get(user) {
                Some(session) => session.stats.clone(),
                None => return TradeSessionStats::default(),
            }
        };
        let snapshot = stats.read().await.clone();
        snapshot
    }

    pub async fn is_running(&self, user: &str) -> bool {
        self.sessions
            .lock()
            .await
            .get(user)
            .is_some_and(AutotradeSession::is_running)
    }

    pub async fn users(&self) -> Vec<String> {
        self.sessions.lock().await.keys().cloned().collect()
    }
}

/// Run the worker, saving a status snapshot every interval and a final
/// inactive one on exit. A failed or panicked worker ends the same way.
async fn supervise(
    user: String,
    worker: AutotradeWorker,
    stats: Arc<RwLock<TradeSessionStats>>,
    token: CancellationToken,
    store: Arc<dyn StatusStore>,
    settings: AutotradeSettings,
) {
    let mut handle = tokio::spawn(worker.run());
    let mut ticker = tokio::time::interval(settings.status_interval.max(MIN_STATUS_INTERVAL));

    let joined = loop {
        tokio::select! {
            joined = &mut handle => break joined,
            _ = ticker.tick() => {
                let snapshot = stats.read().await.clone();
                save(store.as_ref(), &user, &snapshot).await;
            }
        }
    };
    match joined {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(%user, error = %e, "Autotrade session ended with an error"),
        Err(e) => error!(%user, error = %e, "Autotrade worker panicked"),
    }

    token.cancel();
    let snapshot = {
        let mut stats = stats.write().await;
        stats.active = false;
        stats.clone()
    };
    save(store.as_ref(), &user, &snapshot).await;
    info!(
        %user,
        trades = snapshot.total_trades,
        wins = snapshot.wins,
        losses = snapshot.losses,
        profit = snapshot.profit,
        "Autotrade session finished"
    );
}

async fn save(store: &dyn StatusStore, user: &str, snapshot: &TradeSessionStats) {
    if let Err(e) = store.save_status(user, snapshot).await {
        warn!(%user, error = %e, "Status save failed");
    }
}
