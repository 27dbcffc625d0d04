//! Level categories, mission types and mission timer formatting.

use serde::{Deserialize, Serialize};

// ============================================================================
// LEVEL CATEGORIES
// ============================================================================

/// Category a level belongs to; decides its directory and save rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum LevelCategory {
    Exercises = 0,
    Challenges = 1,
    Missions = 2,
    FreeGame = 3,
    GamePlus = 4,
    CodeBattles = 5,
    CustomLevels = 6,
    Win = 7,
    Lost = 8,
    Perso = 9,
}

impl LevelCategory {
    pub fn from_u8(val: u8) -> Option<Self> {
        Some(match val {
            0 => Self::Exercises,
            1 => Self::Challenges,
            2 => Self::Missions,
            3 => Self::FreeGame,
            4 => Self::GamePlus,
            5 => Self::CodeBattles,
            6 => Self::CustomLevels,
            7 => Self::Win,
            8 => Self::Lost,
            9 => Self::Perso,
            _ => return None,
        })
    }

    /// Directory name under `levels/`.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Exercises => "exercises",
            Self::Challenges => "challenges",
            Self::Missions => "missions",
            Self::FreeGame => "freemissions",
            Self::GamePlus => "plus",
            Self::CodeBattles => "battles",
            Self::CustomLevels => "custom",
            Self::Win => "win",
            Self::Lost => "lost",
            Self::Perso => "perso",
        }
    }

    pub fn from_dir_name(name: &str) -> Option<Self> {
        (0u8..=9)
            .filter_map(Self::from_u8)
            .find(|c| c.dir_name() == name)
    }

    /// Single character used in saved program file names.
    pub fn file_char(&self) -> char {
        self.dir_name().chars().next().unwrap_or('x')
    }

    /// Whether autosave runs for levels of this category.
    pub fn allows_autosave(&self) -> bool {
        matches!(self, Self::Missions | Self::FreeGame | Self::CustomLevels)
    }
}

/// Identity of a level: category, chapter and rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LevelId {
    pub category: LevelCategory,
    pub chap: i32,
    pub rank: i32,
}

impl LevelId {
    pub fn new(category: LevelCategory, chap: i32, rank: i32) -> Self {
        Self {
            category,
            chap,
            rank,
        }
    }

    /// Ending scenes (win/lost) live in chapter 0.
    pub fn ending(category: LevelCategory, rank: i32) -> Self {
        Self::new(category, 0, rank)
    }
}

// ============================================================================
// MISSION TYPES
// ============================================================================

/// Gameplay variant of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MissionType {
    Normal,
    /// Old-style level with retro controls.
    Retro,
    /// Robots fight with player programs; the player cannot intervene once
    /// the battle starts.
    CodeBattle,
}

impl MissionType {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "NORMAL" => Self::Normal,
            "RETRO" => Self::Retro,
            "CODE_BATTLE" => Self::CodeBattle,
            _ => return None,
        })
    }
}

/// Format a mission timer as `m:ss.cc`.
pub fn format_mission_time(seconds: f32) -> String {
    let seconds = seconds.max(0.0);
    let minutes = (seconds / 60.0).floor() as u32;
    let rest = seconds - minutes as f32 * 60.0;
    let whole = rest.floor() as u32;
    let hundredths = ((rest - whole as f32) * 100.0).floor() as u32;
    format!("{}:{:02}.{:02}", minutes, whole, hundredths.min(99))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_dirs() {
        assert_eq!(LevelCategory::FreeGame.dir_name(), "freemissions");
        assert_eq!(
            LevelCategory::from_dir_name("custom"),
            Some(LevelCategory::CustomLevels)
        );
        assert_eq!(LevelCategory::Missions.file_char(), 'm');
    }

    #[test]
    fn test_autosave_categories() {
        assert!(LevelCategory::Missions.allows_autosave());
        assert!(LevelCategory::CustomLevels.allows_autosave());
        assert!(!LevelCategory::Exercises.allows_autosave());
        assert!(!LevelCategory::CodeBattles.allows_autosave());
    }

    #[test]
    fn test_timer_format() {
        assert_eq!(format_mission_time(0.0), "0:00.00");
        assert_eq!(format_mission_time(75.5), "1:15.50");
        assert_eq!(format_mission_time(3600.25), "60:00.25");
    }
}
