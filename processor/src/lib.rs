//! A multi-core processor simulation library
//!
//! The [`Processor`] owns the ready, sleeping and finished queues, one
//! thread per simulated core and a tick driver thread. It uses a policy
//! from the [`scheduler`] crate to decide how long each dispatch lasts.
//!
//! Every [`Process`] lives in exactly one place at a time: a queue or a
//! core slot. Moving it is the only way to change its owner.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use scheduler::{Config, Generator, Instruction, Pid, PidAllocator, Process, ProcessState, Scheduler};
use tracing::{debug, info, warn};

mod error;
mod queues;
mod snapshot;
mod worker;

use crate::queues::Queues;
use crate::worker::Core;

pub use crate::error::ProcessorError;
pub use crate::snapshot::{format_history, CoreState, Dispatch, ProcessInfo, ProcessView, Snapshot};

/// How many dispatches the history keeps.
pub const HISTORY_LIMIT: usize = 1024;

/// Everything fixed by [`Processor::configure`].
pub(crate) struct Setup {
    pub(crate) config: Config,
    pub(crate) scheduler: Box<dyn Scheduler>,
    pub(crate) cores: Vec<Core>,
    generator: Mutex<Generator>,
}

impl Setup {
    fn new(config: Config) -> Setup {
        Setup {
            scheduler: scheduler::from_config(&config),
            cores: (0..config.num_cores).map(Core::new).collect(),
            generator: Mutex::new(Generator::new(config.min_instructions, config.max_instructions)),
            config,
        }
    }
}

/// State shared with the core and tick threads.
pub(crate) struct Shared {
    pub(crate) setup: OnceLock<Setup>,
    pub(crate) queues: Queues,
    running: AtomicBool,
    synthetic: AtomicBool,
    ticks: AtomicU64,
    since_enabled: AtomicU64,
    pids: PidAllocator,
    history: Mutex<VecDeque<Dispatch>>,
}

impl Shared {
    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub(crate) fn record(&self, dispatch: Dispatch) {
        let mut history = self.history.lock();
        if history.len() == HISTORY_LIMIT {
            history.pop_front();
        }
        history.push_back(dispatch);
    }

    fn create_process(&self, setup: &Setup, name: Option<&str>) -> Process {
        let (pid, name) = self.allocate(name);
        let program = setup.generator.lock().program(&name);
        Process::new(pid, name, program)
    }

    fn allocate(&self, name: Option<&str>) -> (Pid, String) {
        let pid = self.pids.next();
        let name = match name {
            Some(name) => name.to_string(),
            None => format!("PROC-{pid}"),
        };
        (pid, name)
    }

    pub(crate) fn tick(&self) -> u64 {
        let tick = self.ticks.fetch_add(1, Ordering::AcqRel) + 1;
        self.queues.wake();

        if self.synthetic.load(Ordering::Acquire) {
            if let Some(setup) = self.setup.get() {
                let elapsed = self.since_enabled.fetch_add(1, Ordering::AcqRel) + 1;
                if elapsed % setup.config.batch_frequency.max(1) == 0 {
                    let process = self.create_process(setup, None);
                    debug!(tick, pid = %process.pid(), len = process.len(), "synthetic process admitted");
                    self.queues.admit(process);
                }
            }
        }
        tick
    }
}

/// The processor simulator.
pub struct Processor {
    shared: Arc<Shared>,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl Default for Processor {
    fn default() -> Self {
        Processor::new()
    }
}

impl Processor {
    /// An unconfigured processor. Call [`Processor::configure`] before
    /// [`Processor::start`].
    pub fn new() -> Processor {
        Processor {
            shared: Arc::new(Shared {
                setup: OnceLock::new(),
                queues: Queues::default(),
                running: AtomicBool::new(false),
                synthetic: AtomicBool::new(false),
                ticks: AtomicU64::new(0),
                since_enabled: AtomicU64::new(0),
                pids: PidAllocator::new(),
                history: Mutex::new(VecDeque::new()),
            }),
            threads: Mutex::new(Vec::new()),
        }
    }

    pub fn with_config(config: Config) -> Result<Processor, ProcessorError> {
        let processor = Processor::new();
        processor.configure(config)?;
        Ok(processor)
    }

    /// Fixes the configuration. Can only succeed once.
    pub fn configure(&self, config: Config) -> Result<(), ProcessorError> {
        config.validate()?;
        let (cores, policy, quantum) = (config.num_cores, config.policy, config.quantum);
        self.shared
            .setup
            .set(Setup::new(config))
            .map_err(|_| ProcessorError::AlreadyConfigured)?;
        info!(cores, %policy, quantum, "processor configured");
        Ok(())
    }

    pub fn config(&self) -> Option<&Config> {
        self.shared.setup.get().map(|setup| &setup.config)
    }

    fn setup(&self) -> &Setup {
        match self.shared.setup.get() {
            Some(setup) => setup,
            None => panic!("the processor must be configured before it is used"),
        }
    }

    /// Appends a process to the ready queue.
    pub fn admit(&self, process: Process) {
        debug!(pid = %process.pid(), name = process.name(), "process admitted");
        self.shared.queues.admit(process);
    }

    /// Builds a process with a synthetic program, not yet admitted.
    ///
    /// Without a name the process is called `PROC-<pid>`.
    ///
    /// # Panics
    ///
    /// Panics if the processor is not configured.
    pub fn create_process(&self, name: Option<&str>) -> Process {
        self.shared.create_process(self.setup(), name)
    }

    /// Builds a process running `program`, not yet admitted.
    pub fn create_process_with(&self, name: Option<&str>, program: impl IntoIterator<Item = Instruction>) -> Process {
        let (pid, name) = self.shared.allocate(name);
        Process::new(pid, name, program)
    }

    /// Spawns one thread per core and the tick driver.
    ///
    /// Does nothing if the processor is already running.
    ///
    /// # Panics
    ///
    /// Panics if the processor is not configured.
    pub fn start(&self) -> Result<(), ProcessorError> {
        let setup = self.setup();
        let mut threads = self.threads.lock();
        if self.shared.running.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        for core in &setup.cores {
            let shared = Arc::clone(&self.shared);
            let id = core.id;
            let spawned = thread::Builder::new()
                .name(format!("core-{id}"))
                .spawn(move || worker::run(shared, id));
            match spawned {
                Ok(handle) => threads.push(handle),
                Err(err) => {
                    self.halt(&mut threads);
                    return Err(err.into());
                }
            }
        }

        let shared = Arc::clone(&self.shared);
        match thread::Builder::new()
            .name("tick".to_string())
            .spawn(move || worker::drive_ticks(shared))
        {
            Ok(handle) => threads.push(handle),
            Err(err) => {
                self.halt(&mut threads);
                return Err(err.into());
            }
        }

        info!(cores = setup.cores.len(), policy = %setup.scheduler.policy(), "processor started");
        Ok(())
    }

    /// Stops every thread after its current instruction and waits for it.
    ///
    /// A process in the middle of a dispatch stays in its core slot.
    /// Calling `stop` again has no further effect.
    pub fn stop(&self) {
        let mut threads = self.threads.lock();
        if self.halt(&mut threads) {
            info!("processor stopped");
        }
    }

    fn halt(&self, threads: &mut Vec<JoinHandle<()>>) -> bool {
        let was_running = self.shared.running.swap(false, Ordering::AcqRel);
        for handle in threads.drain(..) {
            let name = handle.thread().name().unwrap_or("unnamed").to_string();
            if handle.join().is_err() {
                warn!(thread = %name, "processor thread panicked");
            }
        }
        was_running
    }

    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    /// Starts admitting a synthetic process every `batch_frequency` ticks.
    ///
    /// The count restarts only when the load was off; enabling it again
    /// does not delay the next admission.
    pub fn enable_synthetic_load(&self) {
        if self.shared.synthetic.load(Ordering::Acquire) {
            return;
        }
        self.shared.since_enabled.store(0, Ordering::Release);
        if !self.shared.synthetic.swap(true, Ordering::AcqRel) {
            info!("synthetic load enabled");
        }
    }

    pub fn disable_synthetic_load(&self) {
        if self.shared.synthetic.swap(false, Ordering::AcqRel) {
            info!("synthetic load disabled");
        }
    }

    pub fn is_synthetic_load_enabled(&self) -> bool {
        self.shared.synthetic.load(Ordering::Acquire)
    }

    /// Advances the clock by one tick and returns the new tick count.
    ///
    /// Sleepers are counted down and woken, then a synthetic process is
    /// admitted if one is due.
    pub fn tick(&self) -> u64 {
        self.shared.tick()
    }

    pub fn ticks(&self) -> u64 {
        self.shared.ticks.load(Ordering::Acquire)
    }

    /// Runs one dispatch of `core` on the calling thread.
    ///
    /// Returns `None` if there was nothing to run, if `core` does not
    /// exist, or if the core threads are running.
    ///
    /// # Panics
    ///
    /// Panics if the processor is not configured.
    pub fn step(&self, core: usize) -> Option<Dispatch> {
        let setup = self.setup();
        if self.is_running() {
            return None;
        }
        setup.cores.get(core)?.dispatch(&self.shared, setup, &|| false)
    }

    /// Finds a process by name.
    ///
    /// Core slots are searched first, then the ready, sleeping and
    /// finished queues.
    pub fn locate(&self, name: &str) -> Option<ProcessView> {
        let cores = self.cores();
        let slots: Vec<_> = cores.iter().map(|core| (core.id, core.slot.lock())).collect();
        let ready = self.shared.queues.ready.lock();
        let sleeping = self.shared.queues.sleeping.lock();
        let finished = self.shared.queues.finished.lock();

        let running = slots.iter().find_map(|(id, slot)| {
            slot.as_ref()
                .filter(|process| process.name() == name)
                .map(|process| ProcessView::new(process, ProcessState::Running { core: *id }))
        });
        running
            .or_else(|| {
                ready
                    .iter()
                    .find(|process| process.name() == name)
                    .map(|process| ProcessView::new(process, ProcessState::Ready))
            })
            .or_else(|| {
                sleeping.iter().find(|process| process.name() == name).map(|process| {
                    ProcessView::new(
                        process,
                        ProcessState::Sleeping {
                            remaining: process.sleep_remaining(),
                        },
                    )
                })
            })
            .or_else(|| {
                finished
                    .iter()
                    .find(|process| process.name() == name)
                    .map(|process| ProcessView::new(process, ProcessState::Finished))
            })
    }

    /// Takes a consistent picture of every core and queue.
    pub fn snapshot(&self) -> Snapshot {
        let cores = self.cores();
        let slots: Vec<_> = cores.iter().map(|core| (core.id, core.slot.lock())).collect();
        let ready = self.shared.queues.ready.lock();
        let sleeping = self.shared.queues.sleeping.lock();
        let finished = self.shared.queues.finished.lock();

        Snapshot {
            tick: self.ticks(),
            cores: slots
                .iter()
                .map(|(id, slot)| CoreState {
                    id: *id,
                    process: slot
                        .as_ref()
                        .map(|process| ProcessInfo::new(process, ProcessState::Running { core: *id })),
                })
                .collect(),
            ready: ready
                .iter()
                .map(|process| ProcessInfo::new(process, ProcessState::Ready))
                .collect(),
            sleeping: sleeping
                .iter()
                .map(|process| {
                    ProcessInfo::new(
                        process,
                        ProcessState::Sleeping {
                            remaining: process.sleep_remaining(),
                        },
                    )
                })
                .collect(),
            finished: finished
                .iter()
                .map(|process| ProcessInfo::new(process, ProcessState::Finished))
                .collect(),
        }
    }

    /// Drains the dispatch history, oldest first.
    pub fn take_history(&self) -> Vec<Dispatch> {
        self.shared.history.lock().drain(..).collect()
    }

    fn cores(&self) -> &[Core] {
        self.shared
            .setup
            .get()
            .map(|setup| setup.cores.as_slice())
            .unwrap_or(&[])
    }
}

impl Drop for Processor {
    fn drop(&mut self) {
        self.stop();
    }
}
