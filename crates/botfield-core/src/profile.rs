//! Player progress: passed levels, try counts and free-game unlocks.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use botfield_logic::mission::LevelId;

use crate::config::ConfigError;

fn level_key(level: &LevelId) -> String {
    format!("{}/{}/{}", level.category.dir_name(), level.chap, level.rank)
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerProfile {
    pub name: String,
    /// Research unlocked for free games by finished missions
    pub free_game_research: u32,
    /// Buildings unlocked for free games by finished missions
    pub free_game_build: u32,
    passed: BTreeSet<String>,
    tries: BTreeMap<String, u32>,
}

impl PlayerProfile {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn set_level_passed(&mut self, level: &LevelId, passed: bool) {
        let key = level_key(level);
        if passed {
            self.passed.insert(key);
        } else {
            self.passed.remove(&key);
        }
    }

    pub fn is_level_passed(&self, level: &LevelId) -> bool {
        self.passed.contains(&level_key(level))
    }

    pub fn increment_try_count(&mut self, level: &LevelId) {
        *self.tries.entry(level_key(level)).or_insert(0) += 1;
    }

    pub fn try_count(&self, level: &LevelId) -> u32 {
        self.tries.get(&level_key(level)).copied().unwrap_or(0)
    }

    /// Adds what a mission unlocked to the free-game unlocks
    pub fn merge_unlocks(&mut self, research: u32, build: u32) {
        self.free_game_research |= research;
        self.free_game_build |= build;
    }

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
}

#[cfg(test)]
mod tests {
    use super::*;
    use botfield_logic::mission::LevelCategory;

    #[test]
    fn test_progress_tracking() {
        let mut profile = PlayerProfile::new("ada");
        let level = LevelId::new(LevelCategory::Missions, 1, 3);
        assert!(!profile.is_level_passed(&level));
        profile.set_level_passed(&level, true);
        assert!(profile.is_level_passed(&level));
        profile.increment_try_count(&level);
        profile.increment_try_count(&level);
        assert_eq!(profile.try_count(&level), 2);
        assert_eq!(profile.try_count(&LevelId::new(LevelCategory::Missions, 1, 4)), 0);
    }

    #[test]
    fn test_json_round_trip() {
        let mut profile = PlayerProfile::new("ada");
        profile.merge_unlocks(0b101, 0b11);
        profile.set_level_passed(&LevelId::new(LevelCategory::Exercises, 2, 1), true);
        let json = serde_json::to_string(&profile).unwrap();
        let back: PlayerProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, profile);
    }
}
