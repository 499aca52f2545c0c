//! Simulated cores, the dispatch loop they run and the tick driver.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use scheduler::{Handoff, Process, Scheduler, Signal};
use tracing::debug;

use crate::snapshot::Dispatch;
use crate::{Setup, Shared};

/// How long an idle core waits before looking at the ready queue again.
pub(crate) const IDLE_POLL: Duration = Duration::from_millis(5);

/// One simulated core.
///
/// The slot holds the process the core owns. While it is there, only
/// this core executes it.
#[derive(Debug)]
pub(crate) struct Core {
    pub(crate) id: usize,
    pub(crate) slot: Mutex<Option<Process>>,
}

impl Core {
    pub(crate) fn new(id: usize) -> Core {
        Core {
            id,
            slot: Mutex::new(None),
        }
    }

    /// Runs one dispatch.
    ///
    /// Resumes the process already in the slot, if any, otherwise takes
    /// the head of the ready queue. Returns `None` when there was nothing
    /// to run. `halted` is checked before every instruction; once it
    /// returns true the process is left in the slot.
    pub(crate) fn dispatch(&self, shared: &Shared, setup: &Setup, halted: &dyn Fn() -> bool) -> Option<Dispatch> {
        let (pid, name, budget) = {
            let mut slot = self.slot.lock();
            if slot.is_none() {
                *slot = shared.queues.ready.lock().pop_front();
            }
            let process = slot.as_ref()?;
            (
                process.pid(),
                process.name().to_string(),
                setup.scheduler.budget(process.remaining()),
            )
        };

        let delay = setup.config.instruction_delay;
        let mut executed = 0;
        let mut handoff = None;
        while executed < budget {
            if halted() {
                handoff = Some(Handoff::Abandoned);
                break;
            }

            let signal = match self.slot.lock().as_mut() {
                Some(process) => process.execute(self.id),
                None => Signal::Blocked,
            };
            if signal == Signal::Blocked {
                break;
            }
            executed += 1;
            pause(delay, halted);
            if signal == Signal::SleepEntered {
                break;
            }
        }

        let handoff = match handoff {
            Some(handoff) => handoff,
            None => self.release(shared, setup.scheduler.as_ref())?,
        };

        let dispatch = Dispatch {
            core: self.id,
            pid,
            name,
            executed,
            handoff,
        };
        debug!(
            core = self.id,
            pid = %dispatch.pid,
            name = %dispatch.name,
            executed,
            handoff = %handoff,
            "dispatch complete"
        );
        shared.record(dispatch.clone());
        Some(dispatch)
    }

    /// Moves the process out of the slot into the queue the scheduler picks.
    ///
    /// The slot stays locked until the process is in its queue, so
    /// snapshots never see it in both places or in neither.
    fn release(&self, shared: &Shared, scheduler: &dyn Scheduler) -> Option<Handoff> {
        let mut slot = self.slot.lock();
        let process = slot.take()?;
        let queue = scheduler.classify(&process);
        shared.queues.hand_off(queue, process);
        Some(queue.into())
    }
}

/// The body of a core thread.
pub(crate) fn run(shared: Arc<Shared>, id: usize) {
    let Some(setup) = shared.setup.get() else {
        return;
    };
    let Some(core) = setup.cores.get(id) else {
        return;
    };

    debug!(core = id, "core started");
    let halted = || !shared.is_running();
    while shared.is_running() {
        if core.dispatch(&shared, setup, &halted).is_none() {
            thread::sleep(IDLE_POLL);
        }
    }
    debug!(core = id, "core stopped");
}

/// The body of the tick driver thread.
pub(crate) fn drive_ticks(shared: Arc<Shared>) {
    let Some(setup) = shared.setup.get() else {
        return;
    };

    let interval = setup.config.tick_interval;
    let halted = || !shared.is_running();
    while shared.is_running() {
        if !pause(interval, &halted) {
            break;
        }
        shared.tick();
    }
}

/// Sleeps for `duration` in slices of at most [`IDLE_POLL`], checking
/// `halted` between slices.
///
/// Returns false if `halted` cut the pause short.
pub(crate) fn pause(duration: Duration, halted: &dyn Fn() -> bool) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if halted() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(IDLE_POLL));
    }
}
