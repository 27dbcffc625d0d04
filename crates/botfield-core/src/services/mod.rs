//! Collaborator services the orchestrator drives: camera, particles,
//! pyrotechnics, on-screen text, music, minimap and the interface layer.
//!
//! Each one keeps only the state the runtime needs to make decisions; the
//! drawing and playback behind them are external.

pub mod audio;
pub mod camera;
pub mod display;
pub mod interface;
pub mod map;
pub mod particles;
pub mod pyro;

pub use audio::SoundService;
pub use camera::Camera;
pub use display::{DisplayText, Notice, TextKind};
pub use interface::{DialogKind, Interface, Rect};
pub use map::MiniMap;
pub use particles::{ParticleHandle, ParticleKind, ParticleSystem};
pub use pyro::{PyroManager, PyroType};
