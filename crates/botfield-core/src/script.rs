//! Contract with the program interpreter.
//!
//! The runtime never executes programs itself. It asks a [`ScriptHost`] to
//! compile sources into a brain slot and to save or restore the
//! interpreter-wide static state that sits at the end of a stack file.

use serde::{Deserialize, Serialize};

use crate::components::Program;

pub trait ScriptHost: Send {
    /// Interpreter version written into stack files. Stacks saved under a
    /// different version are not restored.
    fn version(&self) -> i32;

    /// Compiles `program.source`, updating `compiled` and `error`
    fn compile(&mut self, program: &mut Program) -> bool;

    fn save_static_state(&self) -> Vec<u8>;

    fn restore_static_state(&mut self, data: &[u8]) -> bool;
}

pub const BASIC_SCRIPT_VERSION: i32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct StaticState {
    compiled: u64,
    failed: u64,
}

/// Minimal host that accepts any non-empty source with balanced braces
#[derive(Debug, Clone)]
pub struct BasicScriptHost {
    version: i32,
    state: StaticState,
}

impl Default for BasicScriptHost {
    fn default() -> Self {
        Self::new()
    }
}

impl BasicScriptHost {
    pub fn new() -> Self {
        Self::with_version(BASIC_SCRIPT_VERSION)
    }

    pub fn with_version(version: i32) -> Self {
        Self {
            version,
            state: StaticState::default(),
        }
    }

    pub fn compiled_count(&self) -> u64 {
        self.state.compiled
    }
}

fn check_braces(source: &str) -> Result<(), String> {
    let mut depth = 0i32;
    for (n, line) in source.lines().enumerate() {
        for c in line.chars() {
            match c {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
            if depth < 0 {
                return Err(format!("line {}: unexpected '}}'", n + 1));
            }
        }
    }
    if depth != 0 {
        return Err("missing '}'".to_string());
    }
    Ok(())
}

impl ScriptHost for BasicScriptHost {
    fn version(&self) -> i32 {
        self.version
    }

    fn compile(&mut self, program: &mut Program) -> bool {
        let result = if program.source.trim().is_empty() {
            Err("empty program".to_string())
        } else {
            check_braces(&program.source)
        };
        match result {
            Ok(()) => {
                program.compiled = true;
                program.error = None;
                self.state.compiled += 1;
            }
            Err(e) => {
                program.compiled = false;
                program.error = Some(e);
                self.state.failed += 1;
            }
        }
        program.compiled
    }

    fn save_static_state(&self) -> Vec<u8> {
        bincode::serialize(&self.state).unwrap_or_default()
    }

    fn restore_static_state(&mut self, data: &[u8]) -> bool {
        match bincode::deserialize::<StaticState>(data) {
            Ok(state) => {
                self.state = state;
                true
            }
            Err(e) => {
                log::warn!("Cannot restore interpreter state: {}", e);
                false
            }
        }
    }
}
