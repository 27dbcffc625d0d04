//! Scene camera - follows the selected object, runs guided visits and
//! projects world positions for object picking.

use hecs::Entity;

use botfield_logic::camera::CameraType;

use crate::math::{Matrix, Point, Vec3};
use crate::registry::ObjectRegistry;

const FOV_Y: f32 = 0.75;
const NEAR: f32 = 1.0;
const FAR: f32 = 1000.0;
const MIN_DISTANCE: f32 = 10.0;
const MAX_DISTANCE: f32 = 200.0;
/// Fraction of the remaining gap closed per second when following
const FOLLOW_SPEED: f32 = 5.0;

/// Guided flight towards a message goal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visit {
    pub goal: Vec3,
    pub distance: f32,
    pub elapsed: f32,
    /// Camera type to restore when the visit ends
    pub previous: CameraType,
}

#[derive(Debug, Clone)]
pub struct Camera {
    camera_type: CameraType,
    controlling: Option<Entity>,
    pub eye: Vec3,
    pub look_at: Vec3,
    pub distance: f32,
    /// Horizontal orbit angle added by the camera buttons
    pub pan: f32,
    /// Height factor added by the camera buttons
    pub zoom: f32,
    pub fix_direction: f32,
    /// Scene camera, not moved by follow logic
    pub fixed: bool,
    visit: Option<Visit>,
    pub aspect: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            camera_type: CameraType::Dialog,
            controlling: None,
            eye: Vec3::new(0.0, 50.0, -50.0),
            look_at: Vec3::ZERO,
            distance: 50.0,
            pan: 0.0,
            zoom: 0.0,
            fix_direction: 0.25 * std::f32::consts::PI,
            fixed: false,
            visit: None,
            aspect: 4.0 / 3.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places the camera; a `delay` of 0 jumps immediately
    pub fn init(&mut self, eye: Vec3, look_at: Vec3, _delay: f32) {
        self.eye = eye;
        self.look_at = look_at;
        self.distance = eye.distance(&look_at).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    pub fn camera_type(&self) -> CameraType {
        self.camera_type
    }

    pub fn set_type(&mut self, camera_type: CameraType) {
        if camera_type != CameraType::Null {
            self.camera_type = camera_type;
        }
    }

    pub fn controlling(&self) -> Option<Entity> {
        self.controlling
    }

    pub fn set_controlling(&mut self, entity: Option<Entity>) {
        self.controlling = entity;
    }

    pub fn set_distance(&mut self, distance: f32) {
        self.distance = distance.clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Back to the neutral menu view with no bound object
    pub fn reset(&mut self) {
        let aspect = self.aspect;
        *self = Self::default();
        self.aspect = aspect;
    }

    pub fn add_pan(&mut self, delta: f32) {
        self.pan += delta;
    }

    pub fn add_zoom(&mut self, delta: f32) {
        self.zoom = (self.zoom + delta).clamp(-1.0, 1.0);
    }

    // ========================================================================
    // VISIT
    // ========================================================================

    pub fn start_visit(&mut self, goal: Vec3, distance: f32) {
        let previous = self.visit.map(|v| v.previous).unwrap_or(self.camera_type);
        self.visit = Some(Visit {
            goal,
            distance,
            elapsed: 0.0,
            previous,
        });
        self.camera_type = CameraType::Visit;
    }

    pub fn stop_visit(&mut self) {
        if let Some(visit) = self.visit.take() {
            self.camera_type = visit.previous;
        }
    }

    pub fn visit(&self) -> Option<&Visit> {
        self.visit.as_ref()
    }

    // ========================================================================
    // FRAME
    // ========================================================================

    /// Moves the camera for one frame
    pub fn frame(&mut self, registry: &ObjectRegistry, rel_time: f32) {
        if let Some(visit) = self.visit.as_mut() {
            visit.elapsed += rel_time;
            let angle = visit.elapsed * 0.3;
            let target_eye = visit.goal
                + Vec3::new(angle.cos() * visit.distance, visit.distance * 0.5, angle.sin() * visit.distance);
            let goal = visit.goal;
            self.approach(target_eye, goal, rel_time);
            return;
        }
        if self.fixed {
            return;
        }
        let Some(target) = self.controlling.filter(|e| registry.is_alive(*e)) else {
            return;
        };
        let Some(transform) = registry.transform(target) else {
            return;
        };
        let pos = transform.position;
        let heading = transform.rotation.y + self.pan;
        let height = 0.4 + self.zoom * 0.3;
        let target_eye = match self.camera_type {
            CameraType::Onboard => pos + Vec3::new(0.0, 2.0, 0.0),
            CameraType::Plane => pos + Vec3::new(0.0, self.distance, 0.01),
            CameraType::Fix => {
                let a = self.fix_direction + self.pan;
                pos + Vec3::new(a.cos() * self.distance, self.distance * height, a.sin() * self.distance)
            }
            CameraType::Free | CameraType::Edit | CameraType::Script | CameraType::Dialog => return,
            _ => pos + Vec3::new(
                -heading.cos() * self.distance,
                self.distance * height,
                -heading.sin() * self.distance,
            ),
        };
        let target_look = if self.camera_type == CameraType::Onboard {
            pos + Vec3::new(heading.cos() * 10.0, 2.0, heading.sin() * 10.0)
        } else {
            pos
        };
        self.approach(target_eye, target_look, rel_time);
    }

    fn approach(&mut self, eye: Vec3, look_at: Vec3, rel_time: f32) {
        let t = (rel_time * FOLLOW_SPEED).clamp(0.0, 1.0);
        self.eye = self.eye + (eye - self.eye) * t;
        self.look_at = self.look_at + (look_at - self.look_at) * t;
    }

    // ========================================================================
    // PROJECTION
    // ========================================================================

    pub fn view_matrix(&self) -> Matrix {
        Matrix::look_at(self.eye, self.look_at, Vec3::new(0.0, 1.0, 0.0))
    }

    pub fn projection_matrix(&self) -> Matrix {
        Matrix::perspective(FOV_Y, self.aspect, NEAR, FAR)
    }

    /// Interface coordinates (0..1, y up) of a world position, `None` when
    /// it is behind the camera
    pub fn project(&self, world: Vec3) -> Option<Point> {
        let view_proj = self.projection_matrix().multiply(&self.view_matrix());
        let (clip, w) = view_proj.transform_point(world);
        if w <= NEAR * 0.5 {
            return None;
        }
        Some(Point::new(clip.x / w * 0.5 + 0.5, clip.y / w * 0.5 + 0.5))
    }
}
