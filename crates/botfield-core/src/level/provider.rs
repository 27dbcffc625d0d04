//! Where level files and program sources come from.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use botfield_logic::mission::{LevelCategory, LevelId};

use super::error::LevelError;

/// Read access to level data (scene files, program sources)
pub trait LevelProvider: Send {
    fn read(&self, path: &str) -> Result<String, LevelError>;
    fn exists(&self, path: &str) -> bool;
}

/// Path of a level's scene file relative to the data root
pub fn level_path(level: &LevelId, custom_dir: &str) -> String {
    if level.category == LevelCategory::CustomLevels {
        format!("levels/custom/{}/level{:03}/scene.txt", custom_dir, level.rank)
    } else {
        format!(
            "levels/{}/chapter{:03}/level{:03}/scene.txt",
            level.category.dir_name(),
            level.chap,
            level.rank
        )
    }
}

/// Path of a program source referenced by a level
pub fn program_path(filename: &str) -> String {
    format!("ai/{}", filename)
}

/// Reads level data from a directory tree
#[derive(Debug, Clone)]
pub struct FileLevelProvider {
    root: PathBuf,
}

impl FileLevelProvider {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.root.join(p)
        }
    }
}

impl LevelProvider for FileLevelProvider {
    fn read(&self, path: &str) -> Result<String, LevelError> {
        let full = self.resolve(path);
        if !full.exists() {
            return Err(LevelError::NotFound(full.display().to_string()));
        }
        std::fs::read_to_string(&full).map_err(|source| LevelError::Io {
            path: full.display().to_string(),
            source,
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }
}

/// Level data held in memory, for tests and the harness
#[derive(Debug, Clone, Default)]
pub struct MemoryLevelProvider {
    files: HashMap<String, String>,
}

impl MemoryLevelProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, text: &str) {
        self.files.insert(path.to_string(), text.to_string());
    }

    pub fn with_file(mut self, path: &str, text: &str) -> Self {
        self.insert(path, text);
        self
    }

    /// Registers the scene file of `level`
    pub fn with_level(self, level: &LevelId, text: &str) -> Self {
        let path = level_path(level, "");
        self.with_file(&path, text)
    }
}

impl LevelProvider for MemoryLevelProvider {
    fn read(&self, path: &str) -> Result<String, LevelError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| LevelError::NotFound(path.to_string()))
    }

    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_paths() {
        let id = LevelId::new(LevelCategory::Missions, 2, 5);
        assert_eq!(level_path(&id, ""), "levels/missions/chapter002/level005/scene.txt");
        let custom = LevelId::new(LevelCategory::CustomLevels, 0, 1);
        assert_eq!(level_path(&custom, "mine"), "levels/custom/mine/level001/scene.txt");
    }

    #[test]
    fn test_memory_provider() {
        let provider = MemoryLevelProvider::new().with_file("ai/a.txt", "extern void object::A() {}");
        assert!(provider.exists("ai/a.txt"));
        assert!(provider.read("ai/a.txt").is_ok());
        assert!(matches!(provider.read("ai/b.txt"), Err(LevelError::NotFound(_))));
    }
}
