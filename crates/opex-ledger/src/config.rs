use std::path::{Path, PathBuf};

use opex_store::SyncMode;
use opex_types::Decimal;
use serde::{Deserialize, Serialize};

/// Deployment settings for a ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Rate stamped on every Issue and Distribution record.
    pub issue_rate: Decimal,
    pub store: StoreConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            issue_rate: Decimal::ONE,
            store: StoreConfig::default(),
        }
    }
}

/// Where the durable log lives and how hard it syncs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub sync: SyncMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("opex.log"),
            sync: SyncMode::EveryWrite,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl LedgerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: LedgerConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issue_rate < Decimal::ZERO {
            return Err(ConfigError::Invalid(format!(
                "issue_rate must not be negative, got {}",
                self.issue_rate
            )));
        }
        if self.store.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("store.path is empty".into()));
        }
        Ok(())
    }
}
