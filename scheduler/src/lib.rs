//! A scheduler library.
//!
//! This library provides the process model, the instruction interpreter
//! and the scheduling policies used by the `processor` crate to simulate
//! a multi-core CPU.
//!

use std::num::NonZeroUsize;

mod config;
mod error;
mod generator;
mod instruction;
mod process;
mod scheduler;

pub use crate::config::{Config, Policy};
pub use crate::error::ConfigError;
pub use crate::generator::{Generator, MAX_PROGRAM_LEN};
pub use crate::instruction::{flatten, Instruction, Operand, Signal};
pub use crate::process::{LogEntry, Process};
pub use crate::scheduler::{Handoff, Pid, PidAllocator, ProcessState, Queue, Scheduler};

mod schedulers;

pub use schedulers::{Fcfs, RoundRobin};

/// Returns a structure that implements the `Scheduler` trait with a first come, first served policy
pub fn fcfs() -> impl Scheduler {
    Fcfs
}

/// Returns a structure that implements the `Scheduler` trait with a round robin scheduler policy
///
/// * `quantum` - the number of instructions a process can execute before it is preempted
pub fn round_robin(quantum: NonZeroUsize) -> impl Scheduler {
    RoundRobin::new(quantum)
}

/// Returns the scheduler selected by `config`.
pub fn from_config(config: &Config) -> Box<dyn Scheduler> {
    match config.policy {
        Policy::Fcfs => Box::new(fcfs()),
        Policy::RoundRobin => {
            let quantum = NonZeroUsize::new(config.quantum).unwrap_or(NonZeroUsize::MIN);
            Box::new(round_robin(quantum))
        }
    }
}
