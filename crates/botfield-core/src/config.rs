//! Runtime configuration, stored as JSON.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Autosave policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosaveConfig {
    pub enabled: bool,
    /// Minutes of absolute game time between autosaves
    pub interval: i32,
    /// Number of autosave directories kept
    pub slots: i32,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: 5,
            slots: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Root of level files and program sources
    pub data_dir: PathBuf,
    /// Root of player save directories
    pub save_dir: PathBuf,
    pub player_name: String,
    pub autosave: AutosaveConfig,
    /// Fraction of decorative objects kept, 0..1
    pub gadget_quantity: f32,
    /// Load solution programs and allow the show-soluce command
    pub show_soluce: bool,
    /// Post Quit as soon as a mission ends
    pub exit_after_mission: bool,
    /// Insects may be selected
    pub select_insect: bool,
    /// Play cut-scenes
    pub movies: bool,
    /// Custom level directory for the CustomLevels category
    pub custom_dir: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            save_dir: PathBuf::from("savegame"),
            player_name: "Player".to_string(),
            autosave: AutosaveConfig::default(),
            gadget_quantity: 1.0,
            show_soluce: false,
            exit_after_mission: false,
            select_insect: false,
            movies: true,
            custom_dir: String::new(),
        }
    }
}

impl RuntimeConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        };
        let text = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, text).map_err(io_err)
    }

    /// Save directory of the current player
    pub fn player_dir(&self) -> PathBuf {
        self.save_dir.join(&self.player_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RuntimeConfig = serde_json::from_str(r#"{"player_name": "ada", "autosave": {"slots": 5}}"#).unwrap();
        assert_eq!(config.player_name, "ada");
        assert_eq!(config.autosave.slots, 5);
        assert_eq!(config.autosave.interval, 5);
        assert!(config.movies);
        assert_eq!(config.player_dir(), PathBuf::from("savegame").join("ada"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("botfield-config-{}", std::process::id()));
        let path = dir.join("config.json");
        let config = RuntimeConfig {
            gadget_quantity: 0.5,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(RuntimeConfig::load(&path).unwrap(), config);
        assert!(matches!(
            RuntimeConfig::load(&dir.join("missing.json")),
            Err(ConfigError::Io { .. })
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
