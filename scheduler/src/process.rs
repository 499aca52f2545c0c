use std::collections::{BTreeMap, HashMap};
use std::time::SystemTime;

use crate::instruction::{flatten, Instruction, Signal};
use crate::scheduler::Pid;

/// One line of process output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// When the line was printed.
    pub timestamp: SystemTime,

    /// The core that executed the `PRINT`.
    pub core: usize,

    /// The printed text.
    pub text: String,
}

/// A simulated process: a flat program, its variables and its output.
///
/// Only the owner of a `Process` value can run it, so moving it between
/// queues and cores is the whole synchronization story.
#[derive(Debug, Clone)]
pub struct Process {
    pid: Pid,
    name: String,
    program: Vec<Instruction>,
    cursor: usize,
    memory: HashMap<String, u16>,
    sleep_remaining: u16,
    last_core: Option<usize>,
    logs: Vec<LogEntry>,
}

impl Process {
    /// Creates a process at the start of `program`.
    ///
    /// `FOR` instructions are expanded here.
    pub fn new(pid: Pid, name: impl Into<String>, program: impl IntoIterator<Item = Instruction>) -> Process {
        Process {
            pid,
            name: name.into(),
            program: flatten(program),
            cursor: 0,
            memory: HashMap::new(),
            sleep_remaining: 0,
            last_core: None,
            logs: Vec::new(),
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn program(&self) -> &[Instruction] {
        &self.program
    }

    /// Index of the next instruction to execute.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of instructions in the (flattened) program.
    pub fn len(&self) -> usize {
        self.program.len()
    }

    pub fn is_empty(&self) -> bool {
        self.program.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.program.len() - self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.cursor == self.program.len()
    }

    pub fn is_asleep(&self) -> bool {
        self.sleep_remaining > 0
    }

    pub fn sleep_remaining(&self) -> u16 {
        self.sleep_remaining
    }

    /// The core that executed the most recent instruction, if any.
    pub fn last_core(&self) -> Option<usize> {
        self.last_core
    }

    pub fn value(&self, var: &str) -> Option<u16> {
        self.memory.get(var).copied()
    }

    /// A sorted copy of the variables.
    pub fn memory(&self) -> BTreeMap<String, u16> {
        self.memory
            .iter()
            .map(|(var, value)| (var.clone(), *value))
            .collect()
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    /// Executes the instruction under the cursor on behalf of `core`.
    ///
    /// Never fails: malformed instructions are skipped. Arithmetic wraps
    /// modulo 65536.
    pub fn execute(&mut self, core: usize) -> Signal {
        if self.is_asleep() {
            return Signal::Blocked;
        }
        let Some(instruction) = self.program.get(self.cursor) else {
            return Signal::Blocked;
        };

        let mut signal = Signal::Continue;
        match instruction {
            Instruction::Declare { var, value } => {
                let value = value.resolve(&self.memory);
                self.memory.insert(var.clone(), value);
            }
            Instruction::Add { dst, lhs, rhs } => {
                let value = lhs.resolve(&self.memory).wrapping_add(rhs.resolve(&self.memory));
                self.memory.insert(dst.clone(), value);
            }
            Instruction::Subtract { dst, lhs, rhs } => {
                let value = lhs.resolve(&self.memory).wrapping_sub(rhs.resolve(&self.memory));
                self.memory.insert(dst.clone(), value);
            }
            Instruction::Print { words } => {
                let text = words
                    .iter()
                    .map(|word| match self.memory.get(word) {
                        Some(value) => value.to_string(),
                        None => word.clone(),
                    })
                    .collect::<Vec<String>>()
                    .join(" ");
                self.logs.push(LogEntry {
                    timestamp: SystemTime::now(),
                    core,
                    text,
                });
            }
            Instruction::Sleep { ticks } => {
                self.sleep_remaining = ticks.resolve(&self.memory);
                if self.sleep_remaining > 0 {
                    signal = Signal::SleepEntered;
                }
            }
            // Loops are expanded in `new`; anything left here is skipped.
            Instruction::For { .. } | Instruction::Unknown { .. } => {}
        }

        self.cursor += 1;
        self.last_core = Some(core);
        signal
    }

    /// Advances the sleep countdown by one tick.
    ///
    /// Returns true once the process is awake.
    pub fn tick(&mut self) -> bool {
        self.sleep_remaining = self.sleep_remaining.saturating_sub(1);
        self.sleep_remaining == 0
    }
}
