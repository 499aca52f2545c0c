use crate::config::Policy;
use crate::Scheduler;

/// First come, first served.
///
/// A dispatched process keeps its core until its program ends or it
/// goes to sleep, so it is never put back in the ready queue mid-program.
#[derive(Debug, Default, Copy, Clone)]
pub struct Fcfs;

impl Scheduler for Fcfs {
    fn policy(&self) -> Policy {
        Policy::Fcfs
    }

    fn budget(&self, remaining: usize) -> usize {
        remaining
    }
}
