use std::{path::PathBuf, time::Duration};

/// Core error type for the bot.
///
/// Adapter crates map their specific errors into this type so the dispatcher
/// can log failures consistently and keep every update's outcome explicit.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("external error: {0}")]
    External(String),

    #[error("{operation} timed out after {}ms", .after.as_millis())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("persistence error: {path}: {reason}")]
    Persistence { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
