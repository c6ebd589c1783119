//! Export configuration
//!
//! Loaded from TOML; every field is optional and falls back to its default.
//!
//! ```toml
//! delimiter = ","
//! utf8_bom = false
//! skip_hidden = true
//! transitive_dependencies = true
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// CSV export configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Field separator
    pub delimiter: char,
    /// Prefix every file with a UTF-8 byte order mark
    pub utf8_bom: bool,
    /// Leave out hidden elements, and elements below hidden ones
    pub skip_hidden: bool,
    /// Emit the dependency column
    pub list_dependencies: bool,
    /// List everything reachable instead of direct dependencies only
    pub transitive_dependencies: bool,
}

impl ExportConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    /// [`ConfigError::Parse`] on malformed TOML or unknown keys,
    /// [`ConfigError::InvalidDelimiter`] if the delimiter is unusable.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// [`ConfigError::Read`] if the file cannot be read, otherwise as
    /// [`ExportConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), ?config, "export config loaded");
        Ok(config)
    }

    /// Check that the delimiter can separate quoted fields
    ///
    /// # Errors
    /// [`ConfigError::InvalidDelimiter`] for `"`, CR, or LF.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.delimiter {
            '"' | '\r' | '\n' => Err(ConfigError::InvalidDelimiter(self.delimiter)),
            _ => Ok(()),
        }
    }

    /// With field separator
    #[inline]
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// With or without byte order mark
    #[inline]
    #[must_use]
    pub fn with_utf8_bom(mut self, bom: bool) -> Self {
        self.utf8_bom = bom;
        self
    }

    /// With hidden elements left out
    #[inline]
    #[must_use]
    pub fn with_skip_hidden(mut self, skip: bool) -> Self {
        self.skip_hidden = skip;
        self
    }

    /// With or without the dependency column
    #[inline]
    #[must_use]
    pub fn with_list_dependencies(mut self, list: bool) -> Self {
        self.list_dependencies = list;
        self
    }

    /// With transitive dependency listing
    #[inline]
    #[must_use]
    pub fn with_transitive_dependencies(mut self, transitive: bool) -> Self {
        self.transitive_dependencies = transitive;
        self
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            delimiter: ';',
            utf8_bom: true,
            skip_hidden: false,
            list_dependencies: true,
            transitive_dependencies: false,
        }
    }
}
