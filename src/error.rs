use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("Malformed status line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    #[error("Duplicate key '{key}' on status line {line}")]
    DuplicateKey { line: usize, key: String },

    #[error("Status file {path:?} is unreadable: {source}")]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot open bees work directory {path:?}: {source}")]
    WorkDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to install confinement policy: {0}")]
    ConfinementInstallFailed(String),

    #[error("Failed to bind to {addr}: {source}")]
    ListenBindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ExporterError>;
