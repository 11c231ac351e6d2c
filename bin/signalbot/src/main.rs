mod sessions;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use common::{Config, Notifier};
use engine::{
    AutotradeSettings, BotSettings, Collaborators, CommandRouter, LogNotifier, MemoryStatusStore,
    Orchestrator,
};
use paper::{PaperConnector, PaperMarket};
use strategy::{PipelineConfig, ProfileBook, SignalPipeline};
use telegram_ctrl::TelegramNotifier;

use crate::sessions::SessionsFile;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    info!(profiles = %cfg.strategy_profiles_path, "Signal bot starting");

    // ── Strategy profiles ─────────────────────────────────────────────────────
    let profiles = if std::path::Path::new(&cfg.strategy_profiles_path).exists() {
        ProfileBook::load(&cfg.strategy_profiles_path)
            .with_context(|| format!("loading {}", cfg.strategy_profiles_path))?
    } else {
        warn!(path = %cfg.strategy_profiles_path, "No profile file, using built-in defaults");
        ProfileBook::default()
    };
    let pipeline = Arc::new(SignalPipeline::new(
        Arc::new(profiles),
        PipelineConfig {
            cooldown: cfg.signal_cooldown,
            ..PipelineConfig::default()
        },
    ));

    // ── Paper brokerage ───────────────────────────────────────────────────────
    let market = if std::path::Path::new(&cfg.paper_data_dir).is_dir() {
        PaperMarket::load_dir(&cfg.paper_data_dir, cfg.candle_count)
            .await
            .with_context(|| format!("loading replay data from {}", cfg.paper_data_dir))?
    } else {
        warn!(dir = %cfg.paper_data_dir, "No replay data directory, market is empty");
        PaperMarket::new()
    };
    let market = Arc::new(market);
    let connector = Arc::new(PaperConnector::new(
        market.clone(),
        cfg.paper_initial_balance,
        cfg.paper_payout_ratio,
    ));

    // ── Notifications ─────────────────────────────────────────────────────────
    let notifier: Arc<dyn Notifier> = match &cfg.telegram_token {
        Some(token) => Arc::new(TelegramNotifier::new(token.clone(), &cfg.telegram_chat_ids)),
        None => {
            info!("TELEGRAM_TOKEN not set, notifications go to the log");
            Arc::new(LogNotifier)
        }
    };

    // ── Orchestrator ──────────────────────────────────────────────────────────
    let orchestrator = Arc::new(Orchestrator::new(
        pipeline,
        Collaborators {
            candles: market.clone(),
            notifier,
            connector,
            status: Arc::new(MemoryStatusStore::new()),
        },
        BotSettings::from_config(&cfg),
        AutotradeSettings::from_config(&cfg),
    ));
    let (router, commands) = CommandRouter::new(orchestrator.clone());

    // ── Spawn all tasks ───────────────────────────────────────────────────────
    let replay_interval = cfg.replay_interval.max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(replay_interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if !market.advance().await {
                info!("Replay data exhausted");
                break;
            }
        }
    });
    let router_task = tokio::spawn(router.run());

    // ── Boot sessions ─────────────────────────────────────────────────────────
    match std::fs::read_to_string(&cfg.sessions_path) {
        Ok(content) => {
            let file = SessionsFile::parse(&content)
                .with_context(|| format!("parsing {}", cfg.sessions_path))?;
            for command in file.into_commands() {
                commands.send(command).await?;
            }
        }
        Err(e) => warn!(path = %cfg.sessions_path, error = %e, "No sessions file, starting idle"),
    }

    info!("All subsystems started. Waiting for shutdown signal.");
    tokio::signal::ctrl_c()
        .await
        .context("waiting for ctrl-c")?;
    info!("Shutdown signal received.");

    drop(commands);
    if let Err(e) = router_task.await {
        warn!(error = %e, "Command router task failed");
    }
    orchestrator.shutdown().await;
    info!("Exiting.");
    Ok(())
}
