//! Configuration loading, defaulting, and validation.

mod types;
mod validation;

pub use types::*;

use crate::core::identifier::TableRef;
use crate::error::Result;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    ///
    /// Defaults are not applied and the result is not validated yet, so
    /// command-line overrides can still be merged in. Call
    /// [`Config::finalize`] before use.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Fill in derived defaults, then validate.
    pub fn finalize(mut self) -> Result<Self> {
        self.apply_defaults();
        self.validate()?;
        Ok(self)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// Defaults that depend on other fields:
    ///
    /// - source without host or socket uses the local default socket
    /// - target table, user, and password fall back to the source's
    pub fn apply_defaults(&mut self) {
        if self.source.address().is_none() {
            self.source.socket = Some(DEFAULT_SOCKET.to_string());
        }
        if self.target.table.is_empty() {
            self.target.table = self.source.table.clone();
        }
        if self.target.user.is_empty() {
            self.target.user = self.source.user.clone();
        }
        if self.target.password.is_empty() {
            self.target.password = self.source.password.clone();
        }
    }

    pub fn source_table(&self) -> Result<TableRef> {
        TableRef::parse(&self.source.table)
    }

    pub fn target_table(&self) -> Result<TableRef> {
        TableRef::parse(&self.target.table)
    }
}
