//! Configuration loading
//!
//! Settings are layered, later sources winning:
//!
//! 1. Built-in defaults
//! 2. A TOML file: the explicit path if one is given (it must exist),
//!    otherwise `tessera.toml` in the working directory when present
//! 3. `TESSERA_*` environment variables (`TESSERA_LOG_LEVEL`, ...)
//! 4. Overrides set on the [`ConfigBuilder`]
//!
//! The file path can also come from `TESSERA_CONFIG_PATH`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub const ENV_PREFIX: &str = "TESSERA";
pub const CONFIG_PATH_ENV: &str = "TESSERA_CONFIG_PATH";
pub const DEFAULT_CONFIG_FILE: &str = "tessera.toml";

const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid log level {level:?}: {reason}")]
    InvalidLogLevel { level: String, reason: String },

    #[error("failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Effective settings of the command line tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Log filter, either a level or a full `tracing` filter directive.
    pub log_level: String,

    /// Cap on printed diagnostics. 0 prints all of them.
    pub max_diagnostics: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            max_diagnostics: 0,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load from the default sources.
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder().build()
    }

    /// Render as TOML, the same format the config file uses.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// Number of diagnostics to print out of `total`.
    pub fn diagnostic_limit(&self, total: usize) -> usize {
        match self.max_diagnostics {
            0 => total,
            max => total.min(max),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        EnvFilter::try_new(&self.log_level).map_err(|err| ConfigError::InvalidLogLevel {
            level: self.log_level.clone(),
            reason: err.to_string(),
        })?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config_path: Option<PathBuf>,
    log_level: Option<String>,
    max_diagnostics: Option<usize>,
    environment: bool,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            config_path: None,
            log_level: None,
            max_diagnostics: None,
            environment: true,
        }
    }
}

impl ConfigBuilder {
    /// Config file to read instead of the default search.
    pub fn config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub fn log_level(mut self, level: Option<String>) -> Self {
        self.log_level = level;
        self
    }

    pub fn max_diagnostics(mut self, max: Option<usize>) -> Self {
        self.max_diagnostics = max;
        self
    }

    /// Whether to read `TESSERA_*` environment variables.
    pub fn environment(mut self, enabled: bool) -> Self {
        self.environment = enabled;
        self
    }

    pub fn build(self) -> Result<Config, ConfigError> {
        let defaults = Config::default();
        let mut builder = config::Config::builder()
            .set_default("log_level", defaults.log_level)?
            .set_default("max_diagnostics", defaults.max_diagnostics as u64)?;

        let explicit = self.config_path.clone().or_else(|| {
            if self.environment {
                std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from)
            } else {
                None
            }
        });

        builder = match &explicit {
            Some(path) => builder.add_source(config::File::from(path.as_path()).required(true)),
            None => builder.add_source(
                config::File::new(DEFAULT_CONFIG_FILE, config::FileFormat::Toml).required(false),
            ),
        };

        if self.environment {
            builder = builder.add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .ignore_empty(true),
            );
        }

        if let Some(level) = self.log_level {
            builder = builder.set_override("log_level", level)?;
        }
        if let Some(max) = self.max_diagnostics {
            builder = builder.set_override("max_diagnostics", max as u64)?;
        }

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;

        tracing::debug!(
            path = ?explicit,
            log_level = %config.log_level,
            max_diagnostics = config.max_diagnostics,
            "configuration loaded"
        );
        Ok(config)
    }
}
