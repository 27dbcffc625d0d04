//! Mission-level state built by the scene loader.
//!
//! Everything a level file declares that is not an object or an environment
//! setting lands here: texts, unlock masks, end conditions, token lists,
//! audio assignments and colours.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use botfield_logic::constants::DEFAULT_END_DELAY;
use botfield_logic::mission::MissionType;

use crate::math::Color;

use super::condition::{AudioChange, EndCondition};

/// Which help text an info file slot holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(usize)]
pub enum InfoSlot {
    /// Mission instructions shown by the satellite computer
    Huston = 0,
    Satellite = 1,
    Object = 2,
    Loading = 3,
    Program = 4,
    Soluce = 5,
}

pub const INFO_SLOTS: usize = 6;

/// Per-team text shown in win/loss messages
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TeamNames {
    names: BTreeMap<i32, String>,
}

impl TeamNames {
    pub fn set(&mut self, team: i32, name: &str) {
        self.names.insert(team, name.to_string());
    }

    /// Name of `team`, or a generic label
    pub fn get(&self, team: i32) -> String {
        self.names
            .get(&team)
            .cloned()
            .unwrap_or_else(|| format!("Team {}", team))
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }
}

/// Colour overrides applied to models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneColors {
    pub ambient: [Color; 2],
    pub fog: [Color; 2],
    pub vehicle: Color,
    pub insect: Color,
    pub greenery: Color,
    pub water: Color,
}

impl Default for SceneColors {
    fn default() -> Self {
        Self {
            ambient: [Color::gray(0.2); 2],
            fog: [Color::gray(0.5); 2],
            vehicle: Color::new(0.3, 0.3, 0.3, 0.0),
            insect: Color::new(0.0, 0.0, 0.0, 0.0),
            greenery: Color::gray(0.533),
            water: Color::new(0.0, 0.3, 0.5, 0.0),
        }
    }
}

/// Minimap appearance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSettings {
    pub floor: Color,
    pub water: Color,
    pub show: bool,
    pub toy_icon: bool,
    pub image: String,
    pub zoom: f32,
    pub enabled: bool,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            floor: Color::new(0.58, 0.62, 0.46, 1.0),
            water: Color::new(0.27, 0.51, 0.73, 1.0),
            show: true,
            toy_icon: false,
            image: String::new(),
            zoom: 2.0,
            enabled: true,
        }
    }
}

/// Interpreted level file, minus objects and environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescriptor {
    pub title: String,
    pub resume: String,
    pub script_name: String,
    pub script_file: String,
    pub info_files: [String; INFO_SLOTS],
    /// Ending scene ranks, 0 = fallback text screen
    pub ending_win: i32,
    pub ending_lost: i32,
    pub message_delay: f32,
    pub mission_timer_enabled: bool,
    pub team_names: TeamNames,
    pub audio_track: String,
    pub audio_repeat: bool,
    pub satcom_track: String,
    pub satcom_repeat: bool,
    pub editor_track: String,
    pub editor_repeat: bool,
    pub cached_audio: Vec<String>,
    pub audio_changes: Vec<AudioChange>,
    pub colors: SceneColors,
    pub mission_type: MissionType,
    /// World units per level-file unit
    pub unit_scale: f32,
    pub trace_quality: f32,
    pub shortcut: bool,
    pub magnify_damage: f32,
    /// Buildings the player may construct
    pub build: u32,
    /// Research completed, per team; team 0 is the player
    pub research_done: BTreeMap<i32, u32>,
    /// Research the player may start
    pub research_enable: u32,
    pub end_take: Vec<EndCondition>,
    pub end_take_win_delay: f32,
    pub end_take_lost_delay: f32,
    /// Research that must be done before a win counts
    pub end_take_research: u32,
    pub obligatory_tokens: Vec<String>,
    pub prohibited_tokens: Vec<String>,
    pub new_script_names: Vec<(String, String)>,
    pub map: MapSettings,
    /// A mission controller object drives the ending instead of end
    /// conditions
    pub has_controller: bool,
    pub immediat_satcom: bool,
    pub locked_satcom: bool,
    pub fixed_scene: bool,
}

impl Default for SceneDescriptor {
    fn default() -> Self {
        Self {
            title: String::new(),
            resume: String::new(),
            script_name: String::new(),
            script_file: String::new(),
            info_files: Default::default(),
            ending_win: 0,
            ending_lost: 0,
            message_delay: 1.0,
            mission_timer_enabled: false,
            team_names: TeamNames::default(),
            audio_track: String::new(),
            audio_repeat: true,
            satcom_track: String::new(),
            satcom_repeat: true,
            editor_track: String::new(),
            editor_repeat: true,
            cached_audio: Vec::new(),
            audio_changes: Vec::new(),
            colors: SceneColors::default(),
            mission_type: MissionType::Normal,
            unit_scale: 4.0,
            trace_quality: 1.0,
            shortcut: true,
            magnify_damage: 1.0,
            build: 0,
            research_done: BTreeMap::new(),
            research_enable: 0,
            end_take: Vec::new(),
            end_take_win_delay: DEFAULT_END_DELAY,
            end_take_lost_delay: DEFAULT_END_DELAY,
            end_take_research: 0,
            obligatory_tokens: Vec::new(),
            prohibited_tokens: Vec::new(),
            new_script_names: Vec::new(),
            map: MapSettings::default(),
            has_controller: false,
            immediat_satcom: false,
            locked_satcom: false,
            fixed_scene: false,
        }
    }
}

impl SceneDescriptor {
    /// Clears what a full load redefines. A reset-only replay keeps all of it.
    pub fn reset_for_load(&mut self) {
        *self = Self::default();
    }

    pub fn info_file(&self, slot: InfoSlot) -> &str {
        &self.info_files[slot as usize]
    }

    pub fn set_info_file(&mut self, slot: InfoSlot, name: &str) {
        self.info_files[slot as usize] = name.to_string();
    }

    /// Research bits done by `team`. Teams other than 0 start from a copy of
    /// the player's research the first time they are asked about.
    pub fn research_done_mut(&mut self, team: i32) -> &mut u32 {
        let base = self.research_done.get(&0).copied().unwrap_or(0);
        self.research_done
            .entry(team)
            .or_insert(if team == 0 { 0 } else { base })
    }

    pub fn research_done(&self, team: i32) -> u32 {
        self.research_done
            .get(&team)
            .or_else(|| self.research_done.get(&0))
            .copied()
            .unwrap_or(0)
    }

    pub fn is_research_done(&self, team: i32, flag: u32) -> bool {
        self.research_done(team) & flag != 0
    }

    /// Teams that own at least one end condition
    pub fn end_condition_teams(&self) -> Vec<i32> {
        let mut teams: Vec<i32> = self
            .end_take
            .iter()
            .map(|c| c.win_team)
            .filter(|t| *t != 0)
            .collect();
        teams.sort_unstable();
        teams.dedup();
        teams
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use botfield_logic::constants::research;

    #[test]
    fn test_team_research_copies_player_lazily() {
        let mut scene = SceneDescriptor::default();
        *scene.research_done_mut(0) |= research::FLY;
        assert!(scene.is_research_done(2, research::FLY));

        *scene.research_done_mut(2) |= research::TANK;
        assert!(scene.is_research_done(2, research::FLY | research::TANK));
        assert!(!scene.is_research_done(0, research::TANK));
    }

    #[test]
    fn test_team_names_fallback() {
        let mut names = TeamNames::default();
        names.set(1, "Blue");
        assert_eq!(names.get(1), "Blue");
        assert_eq!(names.get(2), "Team 2");
    }

    #[test]
    fn test_end_condition_teams() {
        let mut scene = SceneDescriptor::default();
        for team in [2, 0, 1, 2] {
            scene.end_take.push(EndCondition {
                win_team: team,
                ..Default::default()
            });
        }
        assert_eq!(scene.end_condition_teams(), vec![1, 2]);
    }

    #[test]
    fn test_reset_for_load() {
        let mut scene = SceneDescriptor {
            unit_scale: 2.0,
            build: 7,
            ..Default::default()
        };
        scene.reset_for_load();
        assert_eq!(scene.build, 0);
        assert_eq!(scene.unit_scale, 4.0);
        assert_eq!(scene.end_take_win_delay, DEFAULT_END_DELAY);
    }
}
