use std::collections::BTreeMap;
use std::fmt::{self, Display};

use scheduler::{Handoff, LogEntry, Pid, Process, ProcessState};

/// A read-only summary of a process.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessInfo {
    /// The PID of the process.
    pub pid: Pid,

    pub name: String,

    /// Where the process was when the information was taken.
    pub state: ProcessState,

    /// Index of the next instruction.
    pub cursor: usize,

    /// Number of instructions in the program.
    pub len: usize,

    /// The core that executed the most recent instruction.
    pub last_core: Option<usize>,

    /// The most recent output line.
    pub last_log: Option<LogEntry>,
}

impl ProcessInfo {
    pub(crate) fn new(process: &Process, state: ProcessState) -> ProcessInfo {
        ProcessInfo {
            pid: process.pid(),
            name: process.name().to_string(),
            state,
            cursor: process.cursor(),
            len: process.len(),
            last_core: process.last_core(),
            last_log: process.logs().last().cloned(),
        }
    }
}

/// Everything an inspection screen needs about one process.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessView {
    pub info: ProcessInfo,
    pub logs: Vec<LogEntry>,
    pub memory: BTreeMap<String, u16>,
}

impl ProcessView {
    pub(crate) fn new(process: &Process, state: ProcessState) -> ProcessView {
        ProcessView {
            info: ProcessInfo::new(process, state),
            logs: process.logs().to_vec(),
            memory: process.memory(),
        }
    }
}

/// What one core is doing.
#[derive(Debug, Clone, PartialEq)]
pub struct CoreState {
    pub id: usize,
    pub process: Option<ProcessInfo>,
}

impl CoreState {
    pub fn is_active(&self) -> bool {
        self.process.is_some()
    }
}

/// A consistent picture of every core and queue at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Ticks elapsed so far.
    pub tick: u64,
    pub cores: Vec<CoreState>,
    pub ready: Vec<ProcessInfo>,
    pub sleeping: Vec<ProcessInfo>,
    pub finished: Vec<ProcessInfo>,
}

impl Snapshot {
    pub fn cores_used(&self) -> usize {
        self.cores.iter().filter(|core| core.is_active()).count()
    }

    pub fn cores_available(&self) -> usize {
        self.cores.len() - self.cores_used()
    }

    /// Percentage of busy cores.
    pub fn utilization(&self) -> f64 {
        if self.cores.is_empty() {
            return 0.0;
        }
        self.cores_used() as f64 * 100.0 / self.cores.len() as f64
    }

    /// Every process in the snapshot, running ones first.
    pub fn processes(&self) -> impl Iterator<Item = &ProcessInfo> {
        self.cores
            .iter()
            .filter_map(|core| core.process.as_ref())
            .chain(&self.ready)
            .chain(&self.sleeping)
            .chain(&self.finished)
    }
}

/// One dispatch, as recorded in the processor history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    /// The core that ran the process.
    pub core: usize,

    pub pid: Pid,

    pub name: String,

    /// Instructions executed during this dispatch.
    pub executed: usize,

    /// Where the process went afterwards.
    pub handoff: Handoff,
}

impl Display for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "core {}\t{} (pid {})\tran {}\t-> {}",
            self.core, self.name, self.pid, self.executed, self.handoff
        )
    }
}

/// Format a dispatch history to a [`String`], one dispatch per line.
///
/// ## Example
///
/// ```rust
/// use processor::{format_history, Processor};
/// use scheduler::{Config, Instruction};
///
/// let processor = Processor::with_config(Config::default()).unwrap();
/// let process = processor.create_process_with(Some("demo"), vec![Instruction::print("hi")]);
/// processor.admit(process);
/// processor.step(0);
///
/// println!("{}", format_history(&processor.take_history()));
/// ```
pub fn format_history(history: &[Dispatch]) -> String {
    let mut s = String::new();
    for dispatch in history {
        s.push_str(&dispatch.to_string());
        s.push('\n');
    }
    s
}
