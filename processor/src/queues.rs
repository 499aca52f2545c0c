use std::collections::VecDeque;

use parking_lot::Mutex;
use scheduler::{Process, Queue};
use tracing::trace;

/// The three process collections shared by every core.
///
/// Locks are always taken in the order ready, sleeping, finished, and
/// only ever after any core slot lock.
#[derive(Debug, Default)]
pub(crate) struct Queues {
    pub(crate) ready: Mutex<VecDeque<Process>>,
    pub(crate) sleeping: Mutex<VecDeque<Process>>,
    pub(crate) finished: Mutex<Vec<Process>>,
}

impl Queues {
    pub(crate) fn admit(&self, process: Process) {
        self.ready.lock().push_back(process);
    }

    /// Moves `process` to `queue`.
    pub(crate) fn hand_off(&self, queue: Queue, process: Process) {
        match queue {
            Queue::Ready => self.ready.lock().push_back(process),
            Queue::Sleeping => self.sleeping.lock().push_back(process),
            Queue::Finished => self.finished.lock().push(process),
        }
    }

    /// Counts one tick down on every sleeper.
    ///
    /// Processes that wake up join the ready queue in the order they
    /// were sleeping in.
    pub(crate) fn wake(&self) -> usize {
        let mut ready = self.ready.lock();
        let mut sleeping = self.sleeping.lock();

        let mut still_sleeping = VecDeque::with_capacity(sleeping.len());
        let mut woken = 0;
        for mut process in sleeping.drain(..) {
            if process.tick() {
                trace!(pid = %process.pid(), name = process.name(), "process woke up");
                ready.push_back(process);
                woken += 1;
            } else {
                still_sleeping.push_back(process);
            }
        }
        *sleeping = still_sleeping;
        woken
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scheduler::{Instruction, Pid};

    fn asleep(pid: usize, ticks: u16) -> Process {
        let mut process = Process::new(Pid::new(pid).unwrap(), format!("p{pid}"), vec![Instruction::sleep(ticks)]);
        process.execute(0);
        process
    }

    #[test]
    fn wake_preserves_order_among_wakers() {
        let queues = Queues::default();
        queues.hand_off(Queue::Sleeping, asleep(1, 2));
        queues.hand_off(Queue::Sleeping, asleep(2, 1));
        queues.hand_off(Queue::Sleeping, asleep(3, 2));

        assert_eq!(queues.wake(), 1);
        assert_eq!(queues.wake(), 2);

        let ready: Vec<usize> = queues.ready.lock().iter().map(|p| p.pid().get()).collect();
        assert_eq!(ready, vec![2, 1, 3]);
        assert!(queues.sleeping.lock().is_empty());
    }
}
