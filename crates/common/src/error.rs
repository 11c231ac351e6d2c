use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Broker error: {0}")]
    Broker(String),

    #[error("Connection lost: {0}")]
    Connection(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Status store error: {0}")]
    Status(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown strategy '{0}'")]
    UnknownStrategy(String),

    #[error("A session is already running for '{user}'")]
    SessionExists { user: String },

    #[error("No active session for '{user}'")]
    SessionNotFound { user: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Connection-level failures are answered with a reconnect attempt
    /// rather than a plain retry.
    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Connection(_))
    }

    /// Failures of an external collaborator. These are logged and retried
    /// on the next loop tick; anything else inside a worker is fatal.
    pub fn is_collaborator(&self) -> bool {
        matches!(
            self,
            Error::Broker(_) | Error::Connection(_) | Error::Notification(_) | Error::Status(_)
        )
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
