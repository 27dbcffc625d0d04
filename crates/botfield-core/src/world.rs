//! Everything that exists while a level is loaded.

use crate::registry::ObjectRegistry;
use crate::scene::Environment;
use crate::services::{Camera, DisplayText, MiniMap, ParticleSystem, PyroManager, SoundService};

/// Objects plus the services that hold per-level state
#[derive(Default)]
pub struct GameWorld {
    pub registry: ObjectRegistry,
    pub environment: Environment,
    pub camera: Camera,
    pub particles: ParticleSystem,
    pub pyro: PyroManager,
    pub display: DisplayText,
    pub sound: SoundService,
    pub map: MiniMap,
}

impl GameWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Destroys every object and world resource
    pub fn teardown(&mut self) {
        self.registry.clear();
        self.environment.flush();
        self.particles.flush();
        self.pyro.delete_all();
        self.map.flush();
    }
}
