use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use common::{Error, Result, SessionCommand};

use crate::orchestrator::Orchestrator;

/// Cloneable handle for submitting session commands.
#[derive(Clone)]
pub struct CommandHandle {
    command_tx: mpsc::Sender<SessionCommand>,
}

impl CommandHandle {
    pub async fn send(&self, cmd: SessionCommand) -> Result<()> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| Error::Other("command router is gone".into()))
    }
}

/// Consumes session commands and applies them to the orchestrator in
/// arrival order. A failed command is logged and the router moves on.
pub struct CommandRouter {
    orchestrator: Arc<Orchestrator>,
    command_rx: mpsc::Receiver<SessionCommand>,
}

impl CommandRouter {
    pub fn new(orchestrator: Arc<Orchestrator>) -> (Self, CommandHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let router = CommandRouter {
            orchestrator,
            command_rx,
        };
        (router, CommandHandle { command_tx })
    }

    /// Run until every handle is dropped. Call from `tokio::spawn`.
    pub async fn run(mut self) {
        info!("Command router running");
        while let Some(cmd) = self.command_rx.recv().await {
            let label = describe(&cmd);
            match self.orchestrator.handle(cmd).await {
                Ok(()) => info!(command = %label, "Command applied"),
                Err(e) => warn!(command = %label, error = %e, "Command failed"),
            }
        }
        warn!("Command channel closed, router exiting");
    }
}

fn describe(cmd: &SessionCommand) -> String {
    match cmd {
        SessionCommand::StartBot { user, .. } => format!("start bot for {user}"),
        SessionCommand::StopBot { user } => format!("stop bot for {user}"),
        SessionCommand::StartAutotrade(cfg) => format!("start autotrade for {}", cfg.user()),
        SessionCommand::StopAutotrade { user } => format!("stop autotrade for {user}"),
    }
}
