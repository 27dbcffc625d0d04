//! Program slots and execution state of programmable objects.

use serde::{Deserialize, Serialize};

use botfield_logic::constants::MAX_PROGRAM_SLOTS;

/// One program slot
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    /// File the program was loaded from, empty for programs typed in-game
    pub filename: String,
    pub source: String,
    pub read_only: bool,
    pub runnable: bool,
    pub compiled: bool,
    /// Last compile error, if any
    pub error: Option<String>,
}

impl Program {
    pub fn from_file(filename: &str) -> Self {
        Self {
            filename: filename.to_string(),
            runnable: true,
            ..Default::default()
        }
    }
}

/// One call frame of a suspended program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    pub function: String,
    pub line: u32,
}

/// Resumable state of a running program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStack {
    /// Program slot the stack belongs to
    pub program: usize,
    /// Instructions executed so far
    pub instruction: u64,
    pub frames: Vec<StackFrame>,
}

impl ExecutionStack {
    pub fn new(program: usize) -> Self {
        Self {
            program,
            instruction: 0,
            frames: vec![StackFrame {
                function: "main".to_string(),
                line: 1,
            }],
        }
    }
}

/// Program storage and the running program of one object
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Brain {
    pub programs: Vec<Program>,
    /// Program started automatically after the level is built
    pub script_run: Option<usize>,
    /// Program currently executing
    pub running: Option<usize>,
    pub stack: Option<ExecutionStack>,
    /// Solution program name shown by the show-soluce cheat
    pub soluce_name: String,
}

impl Brain {
    /// Slot `index`, growing the slot list as needed
    pub fn program_mut(&mut self, index: usize) -> Option<&mut Program> {
        if index >= MAX_PROGRAM_SLOTS {
            return None;
        }
        if self.programs.len() <= index {
            self.programs.resize_with(index + 1, Program::default);
        }
        self.programs.get_mut(index)
    }

    pub fn add_program(&mut self, program: Program) -> usize {
        self.programs.push(program);
        self.programs.len() - 1
    }

    /// Starts slot `index` if it compiled. Returns `false` otherwise.
    pub fn run_program(&mut self, index: usize) -> bool {
        match self.programs.get(index) {
            Some(p) if p.compiled => {
                self.running = Some(index);
                self.stack = Some(ExecutionStack::new(index));
                true
            }
            _ => false,
        }
    }

    pub fn stop_program(&mut self) {
        self.running = None;
        self.stack = None;
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Advances the running program by one frame
    pub fn step(&mut self) {
        if let Some(stack) = self.stack.as_mut() {
            stack.instruction += 1;
        }
    }

    /// Installs a restored stack, resuming its program
    pub fn restore_stack(&mut self, stack: ExecutionStack) -> bool {
        if stack.program >= self.programs.len() {
            return false;
        }
        self.running = Some(stack.program);
        self.stack = Some(stack);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_requires_compiled() {
        let mut brain = Brain::default();
        let i = brain.add_program(Program::from_file("a.txt"));
        assert!(!brain.run_program(i));
        brain.programs[i].compiled = true;
        assert!(brain.run_program(i));
        brain.step();
        brain.step();
        assert_eq!(brain.stack.as_ref().map(|s| s.instruction), Some(2));
        brain.stop_program();
        assert!(!brain.is_running());
    }

    #[test]
    fn test_program_slots_grow_and_cap() {
        let mut brain = Brain::default();
        assert!(brain.program_mut(3).is_some());
        assert_eq!(brain.programs.len(), 4);
        assert!(brain.program_mut(MAX_PROGRAM_SLOTS).is_none());
    }

    #[test]
    fn test_restore_stack_out_of_range() {
        let mut brain = Brain::default();
        assert!(!brain.restore_stack(ExecutionStack::new(0)));
        brain.add_program(Program::default());
        assert!(brain.restore_stack(ExecutionStack::new(0)));
        assert_eq!(brain.running, Some(0));
    }
}
