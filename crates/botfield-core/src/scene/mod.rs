//! Scene data produced by the loader: mission descriptor, end and audio
//! conditions, and the world environment.

pub mod condition;
pub mod descriptor;
pub mod environment;

pub use condition::{music_track_file, AudioChange, EndCondition, ObjectCondition};
pub use descriptor::{InfoSlot, MapSettings, SceneColors, SceneDescriptor, TeamNames, INFO_SLOTS};
pub use environment::Environment;
