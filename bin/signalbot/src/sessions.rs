use serde::Deserialize;

use common::{AutotradeConfig, BotSessionConfig, SessionCommand};

/// Sessions to start at boot, read from `SESSIONS_PATH`.
///
/// ```toml
/// [[bots]]
/// user = "alice"
/// instruments = ["EURUSD-OTC"]
/// timeframe = 1
/// strategy = "Quick 2M Strategy"
///
/// [[autotrade]]
/// user = "carol"
/// password = "practice"
/// amount = 10.0
/// timeframe = 0
/// strategy = "momentum_otc"
/// max_consecutive_losses = 3
/// max_trades = 20
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct SessionsFile {
    #[serde(default)]
    pub bots: Vec<BotEntry>,
    #[serde(default)]
    pub autotrade: Vec<AutotradeConfig>,
}

#[derive(Debug, Deserialize)]
pub struct BotEntry {
    pub user: String,
    #[serde(flatten)]
    pub config: BotSessionConfig,
}

impl SessionsFile {
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn into_commands(self) -> Vec<SessionCommand> {
        let bots = self.bots.into_iter().map(|b| SessionCommand::StartBot {
            user: b.user,
            config: b.config,
        });
        let autotrade = self.autotrade.into_iter().map(SessionCommand::StartAutotrade);
        bots.chain(autotrade).collect()
    }
}
