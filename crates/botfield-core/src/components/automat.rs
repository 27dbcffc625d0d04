//! Automaton state of buildings and other self-running objects.

use botfield_logic::object_type::ObjectType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Automat {
    /// Sub-type, e.g. the vehicle a factory builds
    pub auto_type: Option<ObjectType>,
    pub values: [f32; 5],
    pub string: String,
    /// Initial run state from the level, -1 = none
    pub run: i32,
    /// A timed action is in progress
    pub busy: bool,
    pub progress: f32,
    pub abort_count: u32,
}

impl Default for Automat {
    fn default() -> Self {
        Self {
            auto_type: None,
            values: [0.0; 5],
            string: String::new(),
            run: -1,
            busy: false,
            progress: 0.0,
            abort_count: 0,
        }
    }
}

impl Automat {
    pub fn start(&mut self) {
        self.busy = true;
        self.progress = 0.0;
    }

    /// Stops the current action (cut-scene abort)
    pub fn abort(&mut self) {
        if self.busy {
            self.busy = false;
        }
        self.abort_count += 1;
    }

    pub fn update(&mut self, rel_time: f32) {
        if self.busy {
            self.progress += rel_time;
        }
    }
}
