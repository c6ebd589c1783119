//! Error types for protneed export
//!
//! Provides error handling for:
//! - Export configuration loading and validation
//! - Table writes to the destination directory
//! - Model/derivation mismatches

use protneed_core::{DeriveError, ModelError};
use std::path::PathBuf;

/// Export configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        /// File that was read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Config text is not valid TOML for [`ExportConfig`](crate::ExportConfig)
    #[error("invalid export config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Delimiter cannot separate CSV fields
    #[error("invalid delimiter {0:?}")]
    InvalidDelimiter(char),
}

/// Export errors
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Destination could not be written; no partial table is left under the final name
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        /// File or directory being written
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Exporter was configured with an invalid config
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The derived table has no entry for an element of the model
    #[error("no derivation results for element {element:?}")]
    MissingResults {
        /// Element without results
        element: String,
    },
}

impl ExportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Any error raised while building, deriving, or exporting
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Model construction or validation failed
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Derivation was misused
    #[error("derivation error: {0}")]
    Derive(#[from] DeriveError),

    /// Export failed
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// Whether retrying without changing the model or config can succeed.
    ///
    /// Only I/O failures are transient; structural and config errors need an
    /// edit first.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Export(
                ExportError::Io { .. } | ExportError::Config(ConfigError::Read { .. })
            ) | Self::Config(ConfigError::Read { .. })
        )
    }
}

/// Result alias for fallible export operations
pub type Result<T> = std::result::Result<T, Error>;
