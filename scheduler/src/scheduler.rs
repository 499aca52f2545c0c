use std::fmt::{self, Display};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::Policy;
use crate::process::Process;

/// The PID of a process
///
/// The PID cannot be 0, PIDs start from 1.
#[derive(PartialEq, Eq, Copy, Clone, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct Pid(NonZeroUsize);

impl Pid {
    /// Returns `None` for 0.
    pub fn new(pid: usize) -> Option<Pid> {
        NonZeroUsize::new(pid).map(Pid)
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl PartialEq<usize> for Pid {
    fn eq(&self, other: &usize) -> bool {
        self.0.get() == *other
    }
}

impl Display for Pid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Pid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out PIDs in increasing order, starting from 1.
///
/// A PID is never handed out twice by the same allocator.
#[derive(Debug, Default)]
pub struct PidAllocator {
    issued: AtomicUsize,
}

impl PidAllocator {
    pub fn new() -> PidAllocator {
        PidAllocator::default()
    }

    pub fn next(&self) -> Pid {
        let issued = self.issued.fetch_add(1, Ordering::Relaxed);
        Pid(NonZeroUsize::MIN.saturating_add(issued))
    }
}

/// The state of a process.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProcessState {
    /// The process is waiting in the ready queue.
    Ready,

    /// The process is owned by the core with this id.
    Running {
        /// The core id.
        core: usize,
    },

    /// The process is waiting for its sleep countdown to expire.
    Sleeping {
        /// Ticks left before the process is ready again.
        remaining: u16,
    },

    /// The process has executed its whole program.
    Finished,
}

impl Display for ProcessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessState::Ready => write!(f, "READY"),
            ProcessState::Running { core } => write!(f, "RUNNING {}", core),
            ProcessState::Sleeping { remaining } => write!(f, "SLEEP {}", remaining),
            ProcessState::Finished => write!(f, "FINISHED"),
        }
    }
}

/// The queue a process joins when it leaves a core.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Queue {
    Ready,
    Sleeping,
    Finished,
}

/// How a dispatch ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Handoff {
    /// The process entered a sleep and goes to the sleeping queue.
    Sleeping,

    /// The budget ran out before the program did; back to the ready queue tail.
    Ready,

    /// The whole program has been executed.
    Finished,

    /// The processor was stopped mid-dispatch and the process stays in the core slot.
    ///
    /// There is no [`Queue`] for this case: the process is not moved.
    Abandoned,
}

impl From<Queue> for Handoff {
    fn from(queue: Queue) -> Handoff {
        match queue {
            Queue::Ready => Handoff::Ready,
            Queue::Sleeping => Handoff::Sleeping,
            Queue::Finished => Handoff::Finished,
        }
    }
}

impl Display for Handoff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Handoff::Sleeping => write!(f, "SLEEPING"),
            Handoff::Ready => write!(f, "READY"),
            Handoff::Finished => write!(f, "FINISHED"),
            Handoff::Abandoned => write!(f, "ABANDONED"),
        }
    }
}

/// The trait that any scheduling policy has to implement.
pub trait Scheduler: Send + Sync {
    /// The policy this scheduler implements.
    fn policy(&self) -> Policy;

    /// Returns how many instructions a process with `remaining`
    /// instructions left may execute in one dispatch.
    fn budget(&self, remaining: usize) -> usize;

    /// Decides where a process goes after a dispatch.
    ///
    /// A sleeping process always goes to the sleeping queue, even if its
    /// program is over, so that it is woken before being retired.
    fn classify(&self, process: &Process) -> Queue {
        if process.is_asleep() {
            Queue::Sleeping
        } else if process.is_finished() {
            Queue::Finished
        } else {
            Queue::Ready
        }
    }
}
