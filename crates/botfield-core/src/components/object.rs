//! Identity, placement and state flags shared by every object.

use botfield_logic::camera::CameraType;
use botfield_logic::object_type::{CapabilitySet, ObjectType};
use serde::{Deserialize, Serialize};

use crate::math::Vec3;

/// Stable integer id, unique among live objects and kept across save/restore
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub i32);

/// Object type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Kind(pub ObjectType);

/// Position, rotation (radians) and scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    pub fn new(position: Vec3, angle_y: f32, zoom: f32) -> Self {
        Self {
            position,
            rotation: Vec3::new(0.0, angle_y, 0.0),
            scale: Vec3::splat(zoom),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 0.0, 1.0)
    }
}

/// Owning team, 0 = no team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Team(pub i32);

/// Capability tags resolved from the object type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities(pub CapabilitySet);

/// Boolean object state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectFlags {
    pub selectable: bool,
    pub selected: bool,
    pub highlighted: bool,
    pub active: bool,
    pub dead: bool,
    pub burning: bool,
    pub exploding: bool,
    pub trainer: bool,
    pub toy: bool,
    pub animate_on_reset: bool,
    pub proxy_activate: bool,
    pub check_token: bool,
    pub camera_lock: bool,
    /// Collides with terrain and other objects
    pub clip: bool,
}

impl Default for ObjectFlags {
    fn default() -> Self {
        Self {
            selectable: true,
            selected: false,
            highlighted: false,
            active: true,
            dead: false,
            burning: false,
            exploding: false,
            trainer: false,
            toy: false,
            animate_on_reset: false,
            proxy_activate: false,
            check_token: true,
            camera_lock: false,
            clip: true,
        }
    }
}

/// Numeric object state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectAttributes {
    /// Model variant selected by the level
    pub option: i32,
    pub proxy_distance: f32,
    pub range: f32,
    pub shield: f32,
    pub magnify_damage: f32,
    /// Stored energy (power cells)
    pub energy: f32,
    /// Radius shown by the show-limit effect, 0 = none
    pub show_limit_radius: f32,
    /// Rank among objects that carry programs, used for program file names
    pub def_rank: i32,
    pub tooltip: Option<String>,
    /// Sequence number of the last per-frame update
    pub update_seq: u64,
}

impl Default for ObjectAttributes {
    fn default() -> Self {
        Self {
            option: 0,
            proxy_distance: 60.0,
            range: 1.0,
            shield: 1.0,
            magnify_damage: 1.0,
            energy: 0.0,
            show_limit_radius: 0.0,
            def_rank: -1,
            tooltip: None,
            update_seq: 0,
        }
    }
}

/// Camera the object prefers when selected
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPrefs {
    pub camera_type: CameraType,
    pub distance: f32,
}

impl Default for CameraPrefs {
    fn default() -> Self {
        Self {
            camera_type: CameraType::Back,
            distance: 50.0,
        }
    }
}
