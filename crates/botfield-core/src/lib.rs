//! Botfield runtime core.
//!
//! The runtime of a 3D programming game: a clock with real and scaled time,
//! an event pipeline, an object registry backed by `hecs`, a level
//! description interpreter that builds scenes, and the mission orchestrator
//! that runs the phase machine, the per-frame driver, end-of-mission
//! evaluation and save/restore.
//!
//! # Architecture
//!
//! One simulation thread owns the [`app::Application`]. Each tick it stamps
//! a Frame event and pushes every queued event through a fixed handler chain
//! (application, interface, orchestrator). A render thread may run next to
//! it; the two only meet through the [`frame_gate::FrameGate`].
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`app`] | Main loop: clock sync, event dispatch, frame publishing |
//! | [`clock`] | Real and scaled simulation time |
//! | [`frame_gate`] | Simulation/render handshake and render snapshots |
//! | [`graphics`] | Graphics device contract, headless device, render loop |
//! | [`event`] | Events, input slots, FIFO queue, handler trait |
//! | [`math`] | Vectors, points, colours, matrices |
//! | [`components`] | Object components (transform, flags, attributes, brain, automat) |
//! | [`registry`] | Object registry: creation, lookup, deferred destruction |
//! | [`level`] | Level description parser and providers |
//! | [`scene`] | Scene descriptor, end conditions, environment |
//! | [`loader`] | Scene loader interpreting level commands |
//! | [`services`] | Camera, display, interface, particles, pyro, sound, map |
//! | [`world`] | Everything that exists while a level is loaded |
//! | [`script`] | Program interpreter contract |
//! | [`persistence`] | Save/restore files, program files, autosave rotation |
//! | [`config`] | Runtime configuration (JSON) |
//! | [`profile`] | Player progress and free-game unlocks |
//! | [`orchestrator`] | Mission orchestrator |
//!
//! # Example
//!
//! ```rust,no_run
//! use botfield_core::prelude::*;
//!
//! let config = RuntimeConfig::default();
//! let provider = FileLevelProvider::new(config.data_dir.clone());
//! let orchestrator = MissionOrchestrator::new(config, Box::new(provider), Box::new(BasicScriptHost::new()));
//! let mut app = Application::new(Clock::system(), orchestrator);
//! app.run_until_quit(u64::MAX);
//! ```

pub mod app;
pub mod clock;
pub mod components;
pub mod config;
pub mod event;
pub mod frame_gate;
pub mod graphics;
pub mod level;
pub mod loader;
pub mod math;
pub mod orchestrator;
pub mod persistence;
pub mod profile;
pub mod registry;
pub mod scene;
pub mod script;
pub mod services;
pub mod world;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::app::Application;
    pub use crate::clock::{Clock, ManualTimeSource, TimeSource};
    pub use crate::config::RuntimeConfig;
    pub use crate::event::{Event, EventHandler, EventQueue, EventType, InputSlot};
    pub use crate::level::{FileLevelProvider, LevelError, LevelProvider, MemoryLevelProvider};
    pub use crate::math::{Point, Vec3};
    pub use crate::orchestrator::{InteractionMode, MissionOrchestrator, PauseType};
    pub use crate::registry::ObjectRegistry;
    pub use crate::script::{BasicScriptHost, ScriptHost};
    pub use botfield_logic::end_mission::MissionResult;
    pub use botfield_logic::mission::{LevelCategory, LevelId};
    pub use botfield_logic::object_type::ObjectType;
    pub use botfield_logic::phase::Phase;
}
