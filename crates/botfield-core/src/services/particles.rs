//! Particle bookkeeping for the effects the runtime drives itself (fog
//! banks, show-limit rings, visit arrows).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::math::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticleKind {
    /// Ground fog bank, variant from the level file
    Fog(u8),
    ShowLimit,
    VisitArrow,
    VisitGlint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticleHandle(u32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub kind: ParticleKind,
    pub position: Vec3,
    pub size: f32,
    /// Lifetime in seconds, 0 = until deleted
    pub life: f32,
    pub age: f32,
}

#[derive(Debug, Default)]
pub struct ParticleSystem {
    particles: BTreeMap<ParticleHandle, Particle>,
    next: u32,
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, kind: ParticleKind, position: Vec3, size: f32, life: f32) -> ParticleHandle {
        self.next += 1;
        let handle = ParticleHandle(self.next);
        self.particles.insert(
            handle,
            Particle {
                kind,
                position,
                size,
                life,
                age: 0.0,
            },
        );
        handle
    }

    pub fn delete(&mut self, handle: ParticleHandle) -> bool {
        self.particles.remove(&handle).is_some()
    }

    pub fn set_position(&mut self, handle: ParticleHandle, position: Vec3) -> bool {
        match self.particles.get_mut(&handle) {
            Some(p) => {
                p.position = position;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, handle: ParticleHandle) -> Option<&Particle> {
        self.particles.get(&handle)
    }

    pub fn delete_kind(&mut self, kind: ParticleKind) {
        self.particles.retain(|_, p| p.kind != kind);
    }

    pub fn count_kind(&self, kind: ParticleKind) -> usize {
        self.particles.values().filter(|p| p.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn flush(&mut self) {
        self.particles.clear();
    }

    /// Ages particles and drops the expired ones
    pub fn frame(&mut self, rel_time: f32) {
        for p in self.particles.values_mut() {
            p.age += rel_time;
        }
        self.particles.retain(|_, p| p.life <= 0.0 || p.age < p.life);
    }
}
