use std::sync::Arc;

use tracing::{info, warn};

use common::{
    AutotradeConfig, BotSessionConfig, BotStatus, BrokerConnector, Candle, CandleSource, Notifier,
    Result, SessionCommand, SignalResult, StatusStore, TradeSessionStats,
};
use strategy::SignalPipeline;

use crate::autotrade::AutotradeSettings;
use crate::bot::{BotSessionManager, BotSettings};
use crate::manager::AutotradeManager;

/// External collaborators the orchestrator is wired to.
#[derive(Clone)]
pub struct Collaborators {
    /// Candle feed for bot sessions.
    pub candles: Arc<dyn CandleSource>,
    pub notifier: Arc<dyn Notifier>,
    /// Per-user brokerage connections for autotrade sessions.
    pub connector: Arc<dyn BrokerConnector>,
    pub status: Arc<dyn StatusStore>,
}

/// The core's public surface. Constructed once at startup and shared.
pub struct Orchestrator {
    pipeline: Arc<SignalPipeline>,
    bots: BotSessionManager,
    autotrade: AutotradeManager,
}

impl Orchestrator {
    pub fn new(
        pipeline: Arc<SignalPipeline>,
        collaborators: Collaborators,
        bot_settings: BotSettings,
        autotrade_settings: AutotradeSettings,
    ) -> Self {
        let bots = BotSessionManager::new(
            pipeline.clone(),
            collaborators.candles,
            collaborators.notifier,
            bot_settings,
        );
        let autotrade = AutotradeManager::new(
            collaborators.connector,
            pipeline.clone(),
            collaborators.status,
            autotrade_settings,
        );
        Self {
            pipeline,
            bots,
            autotrade,
        }
    }

    pub async fn start_bot_session(&self, user: &str, config: BotSessionConfig) -> Result<()> {
        self.bots.start(user, config).await
    }

    pub async fn stop_bot_session(&self, user: &str) -> Result<()> {
        self.bots.stop(user).await
    }

    pub async fn bot_status(&self, user: &str) -> BotStatus {
        self.bots.status(user).await
    }

    pub async fn start_autotrade(&self, config: AutotradeConfig) -> Result<()> {
        self.autotrade.start(config).await
    }

    pub async fn stop_autotrade(&self, user: &str) -> Result<()> {
        self.autotrade.stop(user).await
    }

    pub async fn autotrade_status(&self, user: &str) -> TradeSessionStats {
        self.autotrade.status(user).await
    }

    /// Stateless ad-hoc scan: no cooldown is read or recorded.
    pub fn evaluate_signal(
        &self,
        instrument: &str,
        candles: &[Candle],
        strategy: &str,
    ) -> SignalResult {
        self.pipeline.preview(instrument, candles, strategy, None)
    }

    pub fn pipeline(&self) -> &SignalPipeline {
        &self.pipeline
    }

    pub async fn handle(&self, command: SessionCommand) -> Result<()> {
        match command {
            SessionCommand::StartBot { user, config } => self.start_bot_session(&user, config).await,
            SessionCommand::StopBot { user } => self.stop_bot_session(&user).await,
            SessionCommand::StartAutotrade(config) => self.start_autotrade(config).await,
            SessionCommand::StopAutotrade { user } => self.stop_autotrade(&user).await,
        }
    }

    /// Stop every session. Used on process shutdown.
    pub async fn shutdown(&self) {
        info!("Stopping all sessions");
        for user in self.bots.users().await {
            if let Err(e) = self.bots.stop(&user).await {
                warn!(%user, error = %e, "Bot stop failed during shutdown");
            }
        }
        for user in self.autotrade.users().await {
            if let Err(e) = self.autotrade.stop(&user).await {
                warn!(%user, error = %e, "Autotrade stop failed during shutdown");
            }
        }
    }
}
