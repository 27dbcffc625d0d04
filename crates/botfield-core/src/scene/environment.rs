//! World environment - terrain, water, weather, sky and lights.
//!
//! The environment is parameter state for the rendering and physics
//! collaborators. It is filled by the scene loader, advanced once per frame
//! and wiped on every world reset.

use serde::{Deserialize, Serialize};

use crate::math::{Color, Point, Vec3};

// ============================================================================
// TERRAIN
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainParams {
    pub mosaic: i32,
    pub brick: i32,
    pub size: f32,
    pub vision: f32,
    pub depth: i32,
    pub hard: f32,
}

/// Relief height map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainRelief {
    pub image: String,
    pub factor: f32,
    pub border: bool,
}

/// Texture mosaic used by TerrainInitTextures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureGrid {
    pub name: String,
    pub dx: i32,
    pub dy: i32,
    /// `dx * dy` cells, row by row
    pub table: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainMaterial {
    pub id: i32,
    pub image: String,
    pub uv: Point,
    /// Neighbour material ids: up, right, down, left
    pub neighbours: [i32; 4],
    pub hard: f32,
}

/// Material placement rule from TerrainLevel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainLevelRule {
    pub ids: Vec<i32>,
    pub min: f32,
    pub max: f32,
    pub slope: f32,
    pub freq: f32,
    pub center: Vec3,
    pub radius: f32,
}

/// Zone where the flying ceiling is lowered
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlyingLimit {
    pub center: Vec3,
    pub ext_radius: f32,
    pub int_radius: f32,
    pub max_height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Terrain {
    pub params: Option<TerrainParams>,
    pub wind: Vec3,
    pub relief: Option<TerrainRelief>,
    pub random_relief: bool,
    pub resource: Option<String>,
    pub textures: Option<TextureGrid>,
    pub init_id: Option<i32>,
    pub materials: Vec<TerrainMaterial>,
    pub levels: Vec<TerrainLevelRule>,
    pub created: bool,
    pub max_flying_height: f32,
    pub flying_limits: Vec<FlyingLimit>,
}

pub const DEFAULT_MAX_FLYING_HEIGHT: f32 = 280.0;

impl Default for Terrain {
    fn default() -> Self {
        Self {
            params: None,
            wind: Vec3::ZERO,
            relief: None,
            random_relief: false,
            resource: None,
            textures: None,
            init_id: None,
            materials: Vec::new(),
            levels: Vec::new(),
            created: false,
            max_flying_height: DEFAULT_MAX_FLYING_HEIGHT,
            flying_limits: Vec::new(),
        }
    }
}

impl Terrain {
    /// Ground height under `pos`. Relief data lives in the renderer, so the
    /// core works on a flat floor.
    pub fn floor_level(&self, _pos: Vec3) -> f32 {
        0.0
    }

    /// `pos` moved onto the floor, keeping `height` above it
    pub fn adjust_to_floor(&self, pos: Vec3, height: f32) -> Vec3 {
        Vec3::new(pos.x, self.floor_level(pos) + height, pos.z)
    }

    pub fn add_flying_limit(&mut self, limit: FlyingLimit) {
        self.flying_limits.push(limit);
    }

    /// Flying ceiling at `pos`, blending the limit zones between their inner
    /// and outer radius
    pub fn flying_height(&self, pos: Vec3) -> f32 {
        let mut height = self.max_flying_height;
        for limit in &self.flying_limits {
            let dist = pos.distance_2d(&limit.center);
            if dist >= limit.ext_radius {
                continue;
            }
            let h = if dist <= limit.int_radius {
                limit.max_height
            } else {
                let span = (limit.ext_radius - limit.int_radius).max(f32::EPSILON);
                let t = (dist - limit.int_radius) / span;
                limit.max_height + (self.max_flying_height - limit.max_height) * t
            };
            height = height.min(h);
        }
        height
    }

    pub fn flush_flying_limits(&mut self) {
        self.max_flying_height = DEFAULT_MAX_FLYING_HEIGHT;
        self.flying_limits.clear();
    }
}

// ============================================================================
// WATER, CLOUDS, LIGHTNING, PLANETS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Water {
    pub air_type: String,
    pub water_type: String,
    pub image: String,
    pub diffuse: Color,
    pub ambient: Color,
    pub level: f32,
    pub glint: f32,
    pub moxe: Point,
    pub color: Color,
    pub brightness: f32,
    pub lava: bool,
    /// Wave animation time
    pub time: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cloud {
    pub image: String,
    pub diffuse: Color,
    pub ambient: Color,
    pub level: f32,
}

/// Periodic lightning storm. `sleep` seconds between strikes, `delay`
/// seconds of warning, strikes attracted within `magnetic`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Lightning {
    pub sleep: f32,
    pub delay: f32,
    pub magnetic: f32,
    /// Progress through the current cycle, 0..1
    pub progress: f32,
    pub active: bool,
    pub strikes: u32,
}

/// Lightning parameters as written to save files
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightningStatus {
    pub sleep: f32,
    pub delay: f32,
    pub magnetic: f32,
    pub progress: f32,
}

impl Lightning {
    pub fn create(&mut self, sleep: f32, delay: f32, magnetic: f32) {
        self.sleep = sleep;
        self.delay = delay;
        self.magnetic = magnetic;
        self.progress = 0.0;
        self.active = sleep > 0.0 || delay > 0.0;
    }

    /// Current parameters, `None` when no storm is running
    pub fn get_status(&self) -> Option<LightningStatus> {
        self.active.then_some(LightningStatus {
            sleep: self.sleep,
            delay: self.delay,
            magnetic: self.magnetic,
            progress: self.progress,
        })
    }

    pub fn set_status(&mut self, status: LightningStatus) {
        self.create(status.sleep, status.delay, status.magnetic);
        self.progress = status.progress.clamp(0.0, 1.0);
    }

    pub fn flush(&mut self) {
        *self = Self::default();
    }

    pub fn advance(&mut self, rel_time: f32) {
        if !self.active {
            return;
        }
        let cycle = (self.sleep + self.delay).max(f32::EPSILON);
        self.progress += rel_time / cycle;
        while self.progress >= 1.0 {
            self.progress -= 1.0;
            self.strikes += 1;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    pub mode: i32,
    pub pos: Point,
    pub dim: f32,
    pub speed: f32,
    pub dir: f32,
    pub image: String,
    pub uv1: Point,
    pub uv2: Point,
}

impl Planet {
    pub fn advance(&mut self, rel_time: f32) {
        self.dir += self.speed * rel_time;
    }
}

// ============================================================================
// LIGHTS AND BACKGROUND
// ============================================================================

/// Object categories a light is restricted to
pub mod light_mask {
    pub const TERRAIN: u32 = 1 << 0;
    pub const QUARTZ: u32 = 1 << 1;
    pub const METAL: u32 = 1 << 2;
    pub const FIX: u32 = 1 << 3;

    pub fn from_name(name: &str) -> Option<u32> {
        Some(match name {
            "TERRAIN" => TERRAIN,
            "QUARTZ" => QUARTZ,
            "METAL" => METAL,
            "FIX" => FIX,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LightKind {
    Directional { direction: Vec3 },
    Spot { position: Vec3 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneLight {
    pub kind: LightKind,
    pub color: Color,
    pub ambient: Color,
    pub include: u32,
    pub exclude: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Background {
    pub image: String,
    pub up: Color,
    pub down: Color,
    pub cloud_up: Color,
    pub cloud_down: Color,
    pub full: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundSpot {
    pub pos: Vec3,
    pub radius: f32,
    pub color: Color,
    pub smooth: f32,
    pub min: f32,
    pub max: f32,
}

// ============================================================================
// ENVIRONMENT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub terrain: Terrain,
    pub water: Option<Water>,
    pub cloud: Option<Cloud>,
    pub lightning: Lightning,
    pub planets: Vec<Planet>,
    pub lights: Vec<SceneLight>,
    pub background: Background,
    pub ground_spots: Vec<GroundSpot>,
    /// View distance in air and under water
    pub deep_view: [f32; 2],
    pub fog_start: [f32; 2],
    pub second_texture: String,
    pub foreground: String,
    pub time: f32,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            terrain: Terrain::default(),
            water: None,
            cloud: None,
            lightning: Lightning::default(),
            planets: Vec::new(),
            lights: Vec::new(),
            background: Background::default(),
            ground_spots: Vec::new(),
            deep_view: [1000.0, 1000.0],
            fog_start: [0.75, 0.75],
            second_texture: String::new(),
            foreground: String::new(),
            time: 0.0,
        }
    }
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes everything built by a level
    pub fn flush(&mut self) {
        *self = Self::default();
    }

    /// Per-frame advance of water, lightning and planets. Runs even while
    /// the game is paused.
    pub fn advance(&mut self, rel_time: f32) {
        self.time += rel_time;
        if let Some(water) = self.water.as_mut() {
            water.time += rel_time;
        }
        self.lightning.advance(rel_time);
        for planet in &mut self.planets {
            planet.advance(rel_time);
        }
    }
}
