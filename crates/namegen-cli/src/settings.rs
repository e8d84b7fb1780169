use std::path::{Path, PathBuf};

use namegen_generate::DEFAULT_COUNTER_PREFIX;
use namegen_sequence::DEFAULT_BLOCK_SIZE;
use namegen_sequence::atomic::write_bytes_atomic;
use serde::{Deserialize, Serialize};

use crate::CliError;

pub const DEFAULT_SETTINGS_FILE: &str = "namegen.toml";

/// Where durable counters live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreSettings {
    /// Process-local; counters restart with every invocation.
    Memory,
    File { path: PathBuf },
    Postgres { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceSettings {
    pub block_size: i64,
    /// Scope of sample counters, `withCounter` sequences and genId.
    pub scope: String,
    pub counter_prefix: String,
}

impl Default for SequenceSettings {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            scope: "default".to_string(),
            counter_prefix: DEFAULT_COUNTER_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub format: LogFormat,
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            level: "warn".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamegenSettings {
    pub store: StoreSettings,
    #[serde(default)]
    pub sequences: SequenceSettings,
    #[serde(default)]
    pub logging: LogSettings,
}

impl Default for NamegenSettings {
    fn default() -> Self {
        Self {
            store: StoreSettings::File {
                path: PathBuf::from(".namegen/sequences.json"),
            },
            sequences: SequenceSettings::default(),
            logging: LogSettings::default(),
        }
    }
}

impl NamegenSettings {
    fn validate(&self) -> Result<(), CliError> {
        if self.sequences.block_size < 1 {
            return Err(CliError::InvalidConfig(format!(
                "block_size must be positive, got {}",
                self.sequences.block_size
            )));
        }
        if self.sequences.scope.trim().is_empty() {
            return Err(CliError::InvalidConfig("scope must not be blank".to_string()));
        }
        Ok(())
    }
}

/// Settings from `path`, or the defaults when the file does not exist.
pub fn load_settings(path: &Path) -> Result<NamegenSettings, CliError> {
    let settings = if path.exists() {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)?
    } else {
        NamegenSettings::default()
    };
    settings.validate()?;
    Ok(settings)
}

pub fn save_settings(path: &Path, settings: &NamegenSettings) -> Result<(), CliError> {
    settings.validate()?;
    let encoded = toml::to_string_pretty(settings)?;
    write_bytes_atomic(path, encoded.as_bytes()).map_err(CliError::from)
}
