//! Scheduling policies.
//!
//! A policy only decides how many instructions a dispatch may run and
//! where the process goes afterwards. Queues and cores live in the
//! `processor` crate.

mod fcfs;
pub use fcfs::Fcfs;

mod round_robin;
pub use round_robin::RoundRobin;
