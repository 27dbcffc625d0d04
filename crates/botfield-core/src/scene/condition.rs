//! Object-count conditions: mission end clauses and music triggers.
//!
//! Both kinds count the objects matching a filter (type, team, power range,
//! distance to a point) and compare the count against bounds.

use hecs::Entity;
use serde::{Deserialize, Serialize};

use botfield_logic::end_mission::{ConditionOutcome, MissionResult};
use botfield_logic::object_type::ObjectType;

use crate::level::{LevelError, LevelLine};
use crate::math::Vec3;
use crate::registry::ObjectRegistry;

/// Filter and bounds shared by end conditions and audio triggers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectCondition {
    pub pos: Vec3,
    /// Horizontal radius around `pos`
    pub dist: f32,
    /// `Null` counts objects of every type
    pub object_type: ObjectType,
    /// Power range of the object's cell; ignored when `power_min < 0`
    pub power_min: f32,
    pub power_max: f32,
    /// Team filter, 0 = any team
    pub team: i32,
    pub min: i32,
    pub max: i32,
    pub count_transported: bool,
}

impl Default for ObjectCondition {
    fn default() -> Self {
        Self {
            pos: Vec3::ZERO,
            dist: 8.0,
            object_type: ObjectType::Null,
            power_min: -1.0,
            power_max: 100.0,
            team: 0,
            min: 1,
            max: 9999,
            count_transported: true,
        }
    }
}

impl ObjectCondition {
    /// Reads the filter parameters; distances are scaled by `unit`
    pub fn read(line: &LevelLine, unit: f32) -> Result<Self, LevelError> {
        let d = Self::default();
        Ok(Self {
            pos: line.point_or("pos", d.pos)? * unit,
            dist: line.float_or("dist", d.dist)? * unit,
            object_type: line.object_type_or("type", d.object_type)?,
            power_min: line.float_or("powermin", d.power_min)?,
            power_max: line.float_or("powermax", d.power_max)?,
            team: line.int_or("team", d.team)?,
            min: line.int_or("min", d.min)?,
            max: line.int_or("max", d.max)?,
            count_transported: line.bool_or("countTransported", d.count_transported)?,
        })
    }

    fn matches(&self, registry: &ObjectRegistry, entity: Entity) -> bool {
        let Some(ty) = registry.object_type(entity) else {
            return false;
        };
        if self.object_type != ObjectType::Null && ty != self.object_type {
            return false;
        }
        if registry.flags(entity).dead {
            return false;
        }
        if !self.count_transported && registry.is_transported(entity) {
            return false;
        }
        if self.team != 0 && registry.team(entity) != self.team {
            return false;
        }
        if self.power_min >= 0.0 {
            let energy = if ty.is_power_cell() {
                registry.attributes(entity).energy
            } else {
                registry
                    .power_of(entity)
                    .map(|cell| registry.attributes(cell).energy)
                    .unwrap_or(0.0)
            };
            if energy < self.power_min || energy > self.power_max {
                return false;
            }
        }
        registry
            .position(entity)
            .is_some_and(|p| p.distance_2d(&self.pos) <= self.dist)
    }

    pub fn count(&self, registry: &ObjectRegistry) -> i32 {
        registry
            .all()
            .into_iter()
            .filter(|e| self.matches(registry, *e))
            .count() as i32
    }

    pub fn in_bounds(&self, count: i32) -> bool {
        count >= self.min && count <= self.max
    }
}

// ============================================================================
// END CONDITIONS
// ============================================================================

/// One `EndMissionTake` clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndCondition {
    pub condition: ObjectCondition,
    /// Loss threshold: the mission is lost when the count drops to or below
    /// it. Negative for winning clauses.
    pub lost: i32,
    pub immediate: bool,
    /// Team whose victory this clause decides, 0 = global
    pub win_team: i32,
}

impl Default for EndCondition {
    fn default() -> Self {
        Self {
            condition: ObjectCondition::default(),
            lost: -1,
            immediate: false,
            win_team: 0,
        }
    }
}

impl EndCondition {
    pub fn read(line: &LevelLine, unit: f32) -> Result<Self, LevelError> {
        Ok(Self {
            condition: ObjectCondition::read(line, unit)?,
            lost: line.int_or("lost", -1)?,
            immediate: line.bool_or("immediat", false)?,
            win_team: line.int_or("winTeam", 0)?,
        })
    }

    pub fn is_winning(&self) -> bool {
        self.lost < 0
    }

    /// Result of this clause alone. Losing the pilot is immediate.
    pub fn mission_result(&self, registry: &ObjectRegistry) -> MissionResult {
        let count = self.condition.count(registry);
        if self.lost >= 0 && count <= self.lost {
            return if self.condition.object_type == ObjectType::Human {
                MissionResult::LostImmediate
            } else {
                MissionResult::Lost
            };
        }
        if !self.condition.in_bounds(count) {
            return MissionResult::NotTerminated;
        }
        MissionResult::Won
    }

    pub fn outcome(&self, registry: &ObjectRegistry) -> ConditionOutcome {
        ConditionOutcome {
            result: self.mission_result(registry),
            is_winning: self.is_winning(),
            immediate: self.immediate,
        }
    }
}

// ============================================================================
// AUDIO CHANGES
// ============================================================================

/// Music switch fired once when its object count falls in bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioChange {
    pub condition: ObjectCondition,
    pub music: String,
    pub repeat: bool,
    pub changed: bool,
}

impl AudioChange {
    pub fn read(line: &LevelLine, unit: f32) -> Result<Self, LevelError> {
        let music = match line.get("track") {
            Some(_) => music_track_file(line.int("track")?),
            None => line.string_or("filename", ""),
        };
        Ok(Self {
            condition: ObjectCondition::read(line, unit)?,
            music,
            repeat: line.bool_or("repeat", true)?,
            changed: false,
        })
    }

    pub fn check(&self, registry: &ObjectRegistry) -> bool {
        self.condition.in_bounds(self.condition.count(registry))
    }
}

/// File name of a numbered music track, empty for track 0
pub fn music_track_file(track: i32) -> String {
    if track == 0 {
        String::new()
    } else {
        format!("music{:03}.ogg", track)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::LevelParser;
    use crate::registry::CreateParams;

    fn line(text: &str) -> LevelLine {
        LevelParser::parse_str("test.txt", text)
            .map(|p| p.lines()[0].clone())
            .unwrap()
    }

    #[test]
    fn test_read_defaults() {
        let take = EndCondition::read(&line("EndMissionTake type=Me"), 4.0).unwrap();
        assert_eq!(take.condition.dist, 32.0);
        assert_eq!(take.condition.min, 1);
        assert_eq!(take.condition.max, 9999);
        assert_eq!(take.lost, -1);
        assert!(take.is_winning());
    }

    #[test]
    fn test_count_filters() {
        let mut reg = ObjectRegistry::new();
        reg.create(CreateParams::new(ObjectType::Stone, Vec3::new(1.0, 0.0, 1.0)))
            .unwrap();
        reg.create(CreateParams::new(ObjectType::Stone, Vec3::new(50.0, 0.0, 0.0)))
            .unwrap();
        reg.create(CreateParams::new(ObjectType::Human, Vec3::ZERO).with_team(2))
            .unwrap();

        let mut cond = ObjectCondition {
            object_type: ObjectType::Stone,
            ..Default::default()
        };
        assert_eq!(cond.count(&reg), 1);
        cond.dist = 100.0;
        assert_eq!(cond.count(&reg), 2);
        cond.object_type = ObjectType::Null;
        cond.team = 2;
        assert_eq!(cond.count(&reg), 1);
    }

    #[test]
    fn test_lost_pilot_is_immediate() {
        let reg = ObjectRegistry::new();
        let take = EndCondition {
            condition: ObjectCondition {
                object_type: ObjectType::Human,
                ..Default::default()
            },
            lost: 0,
            ..Default::default()
        };
        assert_eq!(take.mission_result(&reg), MissionResult::LostImmediate);
    }

    #[test]
    fn test_audio_track_names() {
        assert_eq!(music_track_file(7), "music007.ogg");
        assert_eq!(music_track_file(0), "");
        let change = AudioChange::read(&line("AudioChange track=3 type=Me"), 1.0).unwrap();
        assert_eq!(change.music, "music003.ogg");
        assert!(change.repeat);
    }
}
