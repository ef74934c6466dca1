//! Configuration-level errors.
//!
//! Only these abort a run. Everything that goes wrong while scanning is
//! recorded in the [`CleanupReport`](crate::report::CleanupReport) instead.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unknown topology '{id}' (known: {known})")]
    UnknownTopology { id: String, known: String },

    #[error("No root directory configured for topology '{topology}'")]
    MissingRoot { topology: &'static str },

    #[error("Root directory {path} is not usable: {reason}")]
    UnusableRoot { path: PathBuf, reason: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Failed to read config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },
}

impl Error {
    pub fn unusable_root(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::UnusableRoot {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
