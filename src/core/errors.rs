//! SFS-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, SfsError>;

/// Top-level error type for the stale file sweeper.
#[derive(Debug, Error)]
pub enum SfsError {
    #[error("[SFS-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[SFS-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[SFS-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[SFS-2001] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[SFS-3001] source vanished before move: {path}")]
    SourceVanished { path: PathBuf },

    #[error("[SFS-3002] source changed since scan: {path}")]
    SourceChanged { path: PathBuf },

    #[error("[SFS-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl SfsError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "SFS-1001",
            Self::MissingConfig { .. } => "SFS-1002",
            Self::ConfigParse { .. } => "SFS-1003",
            Self::Io { .. } => "SFS-2001",
            Self::SourceVanished { .. } => "SFS-3001",
            Self::SourceChanged { .. } => "SFS-3002",
            Self::Runtime { .. } => "SFS-3900",
        }
    }

    /// Whether retrying might resolve the failure.
    ///
    /// The sweeper performs no retries itself; this flag is surfaced in the
    /// move-failure summary so the user knows which failures a second run
    /// could clear.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Runtime { .. })
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<toml::de::Error> for SfsError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
