pub mod autotrade;
pub mod bot;
pub mod feed;
pub mod lifecycle;
pub mod manager;
pub mod orchestrator;
pub mod sinks;

pub use autotrade::{AutotradeSettings, AutotradeWorker};
pub use bot::{BotSessionManager, BotSettings, HISTORY_LIMIT};
pub use feed::fetch_window;
pub use lifecycle::{CommandHandle, CommandRouter};
pub use manager::AutotradeManager;
pub use orchestrator::{Collaborators, Orchestrator};
pub use sinks::{LogNotifier, MemoryStatusStore};
