use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, TimelogError};
use crate::types::TASK_ENTITY_TYPE;

/// Top-level configuration for the timelog action.
///
/// Loaded from `~/.timelog-action/config.toml` by default. Every section is
/// optional and falls back to its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub action: ActionConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl PluginConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PluginConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| TimelogError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// How the action presents itself and what it applies to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    /// Button label shown by the host.
    pub label: String,
    /// Identifier the host echoes back on launch.
    pub identifier: String,
    /// Tooltip shown by the host.
    pub description: String,
    /// Selection entity type the action is offered for.
    pub entity_type: String,
    /// Store entity holding the time logs.
    pub timelog_entity: String,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            label: "Timelogs".to_string(),
            identifier: "show.edit.timelogs".to_string(),
            description: "Show and edit timelogs".to_string(),
            entity_type: TASK_ENTITY_TYPE.to_string(),
            timelog_entity: "Timelog".to_string(),
        }
    }
}

/// Local record store used when running outside the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON document holding the records, keyed by entity type.
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "~/.timelog-action/store.json".to_string(),
        }
    }
}
