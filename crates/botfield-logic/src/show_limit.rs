//! Boundary-ring geometry for show-limit effects.
//!
//! A show-limit is a ring of particles around a point marking a usable
//! radius. The ring fades in during its first second, fades out during its
//! last second, and slowly rotates (slower for larger rings).

use crate::constants::MAX_SHOW_PARTICLES;

/// Static layout of a ring for a given radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingLayout {
    /// Particle size (square).
    pub particle_size: f32,
    /// Height above the floor.
    pub lift: f32,
    /// Number of particles on the ring.
    pub total: usize,
}

/// Layout for a ring of `radius`; `None` when nothing should be shown.
pub fn ring_layout(radius: f32) -> Option<RingLayout> {
    if radius <= 0.0 {
        return None;
    }
    let (particle_size, spacing, lift) = if radius <= 50.0 {
        (0.3, 2.5, 0.5)
    } else {
        (1.5, 10.0, 2.0)
    };
    let total = ((radius * 2.0 * std::f32::consts::PI) / spacing) as usize;
    Some(RingLayout {
        particle_size,
        lift,
        total: total.min(MAX_SHOW_PARTICLES),
    })
}

/// Radius scale factor for fade-in / fade-out.
pub fn ring_factor(time: f32, duration: f32) -> f32 {
    if time < 1.0 {
        time
    } else if time > duration - 1.0 {
        duration - time
    } else {
        1.0
    }
}

/// Rotation speed in radians per second.
pub fn ring_speed(radius: f32) -> f32 {
    (0.4 - radius * 0.001).max(0.1)
}

/// Horizontal positions `(x, z)` of the ring particles.
pub fn ring_points(center: (f32, f32), radius: f32, time: f32, duration: f32, total: usize) -> Vec<(f32, f32)> {
    if total == 0 {
        return Vec::new();
    }
    let r = radius * ring_factor(time, duration);
    let step = (2.0 * std::f32::consts::PI) / total as f32;
    let mut angle = time * ring_speed(radius);
    let mut points = Vec::with_capacity(total);
    for _ in 0..total {
        points.push((center.0 + r * angle.cos(), center.1 + r * angle.sin()));
        angle += step;
    }
    points
}
