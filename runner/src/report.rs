//! Text rendering of processor snapshots.

use std::fmt::{self, Display};
use std::sync::OnceLock;
use std::time::SystemTime;

use processor::{ProcessInfo, ProcessView, Snapshot};
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};
use tracing::warn;

const RULE: &str = "---------------------------------------";

static LOCAL_OFFSET: OnceLock<UtcOffset> = OnceLock::new();

/// Looks up the local UTC offset used by [`format_timestamp`].
///
/// Must run before any other thread is spawned: the lookup fails in a
/// multi-threaded process on most Unix systems. Without it timestamps
/// are rendered in UTC.
pub fn init_local_offset() {
    let offset = UtcOffset::current_local_offset().unwrap_or_else(|err| {
        warn!(%err, "local time offset unavailable, using UTC");
        UtcOffset::UTC
    });
    let _ = LOCAL_OFFSET.set(offset);
}

/// Formats a timestamp in local time like `(10/16/2026 03:09:12 PM)`.
pub fn format_timestamp(timestamp: SystemTime) -> String {
    format_timestamp_in(timestamp, LOCAL_OFFSET.get().copied().unwrap_or(UtcOffset::UTC))
}

fn format_timestamp_in(timestamp: SystemTime, offset: UtcOffset) -> String {
    let format = format_description!("([month]/[day]/[year] [hour repr:12]:[minute]:[second] [period])");
    OffsetDateTime::from(timestamp)
        .to_offset(offset)
        .format(format)
        .unwrap_or_else(|_| "(--)".to_string())
}

fn recent(info: &ProcessInfo) -> String {
    match &info.last_log {
        Some(entry) => format_timestamp(entry.timestamp),
        None => "(--)".to_string(),
    }
}

/// The utilization report shown by `screen -ls` and written by `report-util`.
pub struct Report<'a>(pub &'a Snapshot);

impl Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.0;
        writeln!(f, "CPU utilization: {:.2}%", snapshot.utilization())?;
        writeln!(f, "Cores used: {}", snapshot.cores_used())?;
        writeln!(f, "Cores available: {}", snapshot.cores_available())?;
        writeln!(f)?;
        writeln!(f, "{}", RULE)?;

        writeln!(f, "Running processes:")?;
        for core in &snapshot.cores {
            if let Some(info) = &core.process {
                writeln!(
                    f,
                    "{}\t{}\tCore: {}\t{} / {}",
                    info.name,
                    recent(info),
                    core.id,
                    info.cursor,
                    info.len
                )?;
            }
        }

        writeln!(f)?;
        writeln!(f, "Finished processes:")?;
        for info in &snapshot.finished {
            writeln!(
                f,
                "{}\t{}\tFinished\t{} / {}",
                info.name,
                recent(info),
                info.cursor,
                info.len
            )?;
        }
        writeln!(f, "{}", RULE)
    }
}

/// The `process-smi` view of one process.
pub struct ProcessScreen<'a>(pub &'a ProcessView);

impl Display for ProcessScreen<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let view = self.0;
        writeln!(f, "Process name: {}", view.info.name)?;
        writeln!(f, "ID: {}", view.info.pid)?;
        writeln!(f, "Logs:")?;
        for entry in &view.logs {
            writeln!(
                f,
                "{} Core:{} \"{}\"",
                format_timestamp(entry.timestamp),
                entry.core,
                entry.text
            )?;
        }
        writeln!(f)?;
        if view.info.cursor < view.info.len {
            writeln!(f, "Current instruction line: {}", view.info.cursor)?;
            writeln!(f, "Lines of code: {}", view.info.len)
        } else {
            writeln!(f, "Finished!")
        }
    }
}
