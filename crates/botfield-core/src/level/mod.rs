//! Level description format.
//!
//! A level file is a list of commands, one per line:
//!
//! ```text
//! // comment
//! Title text="Crash landing"
//! CreateObject type=Me pos=12.5;-3 dir=0.5 select=1
//! ```
//!
//! Parameter values stay raw text until read through a typed accessor, so a
//! bad value is reported with the file, line and parameter that held it.

mod error;
mod parser;
mod provider;

pub use error::LevelError;
pub use parser::{LevelLine, LevelParam, LevelParser};
pub use provider::{level_path, program_path, FileLevelProvider, LevelProvider, MemoryLevelProvider};
