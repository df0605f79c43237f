//! CLI context - configuration and store access shared by all commands

use crate::config::{ConfigError, NeedleConfig};
use crate::store::{RecordStore, StoreError};
use std::path::{Path, PathBuf};

/// Shared context for CLI commands
pub struct CliContext {
    /// Configuration file that was loaded, if any
    pub config_path: Option<PathBuf>,
    /// Loaded configuration
    pub config: NeedleConfig,
    /// Output format preference
    pub output_format: super::OutputFormat,
    /// Quiet mode (suppress status messages)
    pub quiet: bool,
    /// Verbose mode (extra debug output)
    pub verbose: bool,
}

impl CliContext {
    /// Create a new CLI context from an explicit configuration path
    pub fn new(config_path: PathBuf) -> Result<Self, ConfigError> {
        let (config, loaded) = NeedleConfig::discover(Some(config_path.as_path()))?;
        Ok(Self::from_config(config, loaded))
    }

    /// Create context from `needle_track.toml` if present, else defaults
    pub fn with_defaults() -> Result<Self, ConfigError> {
        let (config, loaded) = NeedleConfig::discover(None)?;
        Ok(Self::from_config(config, loaded))
    }

    pub fn from_config(config: NeedleConfig, config_path: Option<PathBuf>) -> Self {
        Self {
            config_path,
            config,
            output_format: super::OutputFormat::Table,
            quiet: false,
            verbose: false,
        }
    }

    /// Override the database location (flag or environment beats the file)
    pub fn with_db_path(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.config.store.path = path;
        }
        self
    }

    pub fn db_path(&self) -> &Path {
        &self.config.store.path
    }

    /// Open the record store for the duration of one command
    pub fn open_store(&self) -> Result<RecordStore, StoreError> {
        self.debug(&format!("Opening record store at {}", self.db_path().display()));
        RecordStore::open(self.db_path())
    }

    /// Print status message (respects quiet mode)
    pub fn status(&self, message: &str) {
        if !self.quiet {
            eprintln!("{}", message);
        }
    }

    /// Print verbose message (only in verbose mode)
    pub fn debug(&self, message: &str) {
        if self.verbose {
            eprintln!("[DEBUG] {}", message);
        }
    }
}
