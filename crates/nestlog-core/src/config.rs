//! Layered configuration.
//!
//! Sources, highest priority first:
//! 1. Environment variables (`NESTLOG_*` prefix, `__` as section separator)
//! 2. `./nestlog.toml`
//! 3. `<config dir>/nestlog/config.toml`
//! 4. Built-in defaults
//!
//! `NESTLOG_PARSE__DATE_ORDER=month_first` maps to `parse.date_order`.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ConfigError;
use crate::message::DateOrder;

const LOCAL_CONFIG: &str = "nestlog.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NestlogConfig {
    #[serde(default)]
    pub parse: ParseConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ParseConfig {
    /// Reading of dates whose day and month are both 12 or less.
    #[serde(default)]
    pub date_order: DateOrder,

    /// Transcripts with fewer non-whitespace characters are rejected.
    #[serde(default = "default_min_transcript_chars")]
    pub min_transcript_chars: usize,
}

const fn default_min_transcript_chars() -> usize {
    1
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            date_order: DateOrder::default(),
            min_transcript_chars: default_min_transcript_chars(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Directory holding one JSON file per subject.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    /// Default `tracing` filter directive; `RUST_LOG` wins when set.
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl NestlogConfig {
    /// Load from defaults, config files and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(None)
    }

    /// Like [`load`](Self::load), with an explicit file layered above the
    /// standard files and below the environment.
    pub fn load_with(extra: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(extra).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the provider chain. Public so tests can inspect it directly.
    pub fn figment(extra: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global) = Self::global_config_path()
            && global.exists()
        {
            debug!(path = %global.display(), "merging user config");
            figment = figment.merge(Toml::file(global));
        }

        let local = PathBuf::from(LOCAL_CONFIG);
        if local.exists() {
            debug!(path = %local.display(), "merging project config");
            figment = figment.merge(Toml::file(local));
        }

        if let Some(path) = extra {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed("NESTLOG_").split("__"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("nestlog").join("config.toml"))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.store.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "store.data_dir".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.parse.min_transcript_chars == 0 {
            return Err(ConfigError::InvalidValue {
                field: "parse.min_transcript_chars".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}
