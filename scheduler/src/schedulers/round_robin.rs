use std::num::NonZeroUsize;

use crate::config::Policy;
use crate::Scheduler;

/// Round robin with a fixed quantum, counted in instructions.
#[derive(Debug, Copy, Clone)]
pub struct RoundRobin {
    quantum: NonZeroUsize,
}

impl RoundRobin {
    pub fn new(quantum: NonZeroUsize) -> Self {
        RoundRobin { quantum }
    }
}

impl Scheduler for RoundRobin {
    fn policy(&self) -> Policy {
        Policy::RoundRobin
    }

    fn budget(&self, remaining: usize) -> usize {
        remaining.min(self.quantum.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Instruction, Pid, Process, Queue};

    fn round_robin(quantum: usize) -> RoundRobin {
        RoundRobin::new(NonZeroUsize::new(quantum).unwrap())
    }

    #[test]
    fn budget_is_capped_by_quantum() {
        let scheduler = round_robin(2);
        assert_eq!(scheduler.budget(5), 2);
        assert_eq!(scheduler.budget(1), 1);
        assert_eq!(scheduler.budget(0), 0);
    }

    #[test]
    fn preempted_process_goes_back_to_ready() {
        let scheduler = round_robin(2);
        let mut process = Process::new(
            Pid::new(1).unwrap(),
            "p",
            vec![Instruction::declare("x", 0); 5],
        );
        for _ in 0..scheduler.budget(process.remaining()) {
            process.execute(0);
        }
        assert_eq!(process.cursor(), 2);
        assert_eq!(scheduler.classify(&process), Queue::Ready);
    }

    #[test]
    fn sleeping_process_goes_to_sleeping_even_on_its_last_instruction() {
        let scheduler = round_robin(4);
        let mut process = Process::new(Pid::new(1).unwrap(), "p", vec![Instruction::sleep(2)]);
        process.execute(0);
        assert!(process.is_finished());
        assert_eq!(scheduler.classify(&process), Queue::Sleeping);
    }
}
