use std::time::Duration;

/// All process configuration loaded from environment variables at startup.
/// Malformed values cause an immediate panic with a clear message.
#[derive(Debug, Clone)]
pub struct Config {
    // Files
    pub strategy_profiles_path: String,
    pub sessions_path: String,

    // Paper brokerage
    pub paper_data_dir: String,
    pub paper_initial_balance: f64,
    pub paper_payout_ratio: f64,
    pub replay_interval: Duration,

    // Signal pipeline / sessions
    pub signal_cooldown: Duration,
    pub bot_poll_interval: Duration,
    pub candle_count: usize,
    pub status_interval: Duration,

    // Telegram notifications (optional)
    pub telegram_token: Option<String>,
    pub telegram_chat_ids: Vec<i64>,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let telegram_chat_ids = optional_env("TELEGRAM_CHAT_IDS")
            .map(|raw| {
                raw.split(',')
                    .filter(|s| !s.trim().is_empty())
                    .map(|s| {
                        s.trim().parse::<i64>().unwrap_or_else(|_| {
                            panic!("TELEGRAM_CHAT_IDS contains non-numeric ID: '{}'", s.trim())
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Config {
            strategy_profiles_path: optional_env("STRATEGY_PROFILES_PATH")
                .unwrap_or_else(|| "config/profiles.toml".to_string()),
            sessions_path: optional_env("SESSIONS_PATH")
                .unwrap_or_else(|| "config/sessions.toml".to_string()),
            paper_data_dir: optional_env("PAPER_DATA_DIR").unwrap_or_else(|| "data".to_string()),
            paper_initial_balance: parsed_env("PAPER_INITIAL_BALANCE", 10_000.0),
            paper_payout_ratio: parsed_env("PAPER_PAYOUT_RATIO", 0.8),
            replay_interval: Duration::from_secs(parsed_env("REPLAY_INTERVAL_SECS", 5)),
            signal_cooldown: Duration::from_secs(parsed_env("SIGNAL_COOLDOWN_SECS", 180)),
            bot_poll_interval: Duration::from_secs(parsed_env("BOT_POLL_INTERVAL_SECS", 5)),
            candle_count: parsed_env("CANDLE_COUNT", 250),
            status_interval: Duration::from_secs(parsed_env("STATUS_INTERVAL_SECS", 5)),
            telegram_token: optional_env("TELEGRAM_TOKEN").filter(|t| !t.is_empty()),
            telegram_chat_ids,
        }
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match optional_env(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            panic!("Environment variable '{key}' has an invalid value: '{raw}'")
        }),
        None => default,
    }
}
