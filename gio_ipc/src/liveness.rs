//! Process liveness tracking.
//!
//! Each attach reconciles the PID table stored in the file header against
//! the processes that are still running. Dead entries are dropped, the
//! caller's PID is appended, and the result decides whether this is a cold
//! start (nobody else shares the file) or a warm start.

use crate::error::{IpcError, IpcResult};
use crate::layout::ProcessTable;
use crate::platform;
use gio_common::consts::MAX_PROCESSES;
use serde::Serialize;
use std::collections::HashSet;

/// Operating system process id.
pub type Pid = i32;

/// Fixed-capacity list of live PIDs.
pub type AliveList = heapless::Vec<Pid, MAX_PROCESSES>;

/// Outcome of registering with the shared file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Liveness {
    /// Not registered yet
    Unknown,
    /// No other live process shares the file
    ColdStart,
    /// At least one other live process shares the file
    WarmStart,
}

/// Answers whether a PID belongs to a running process.
pub trait ProcessProbe {
    /// Whether `pid` is running.
    fn is_running(&self, pid: Pid) -> bool;
}

/// A snapshot of running PIDs, as supplied by a startup hook.
impl ProcessProbe for HashSet<Pid> {
    fn is_running(&self, pid: Pid) -> bool {
        self.contains(&pid)
    }
}

impl<P: ProcessProbe + ?Sized> ProcessProbe for &P {
    fn is_running(&self, pid: Pid) -> bool {
        (**self).is_running(pid)
    }
}

/// Probes liveness by sending a null signal to the PID.
#[derive(Debug, Default, Clone, Copy)]
pub struct SignalProbe;

impl ProcessProbe for SignalProbe {
    fn is_running(&self, pid: Pid) -> bool {
        platform::pid_is_running(pid)
    }
}

/// Prune dead PIDs from `stored` and register `own`.
///
/// Returns the start kind together with the table to write back. When the
/// table already holds [`MAX_PROCESSES`] live PIDs other than `own`,
/// nothing can be written and [`IpcError::TooManyProcesses`] is returned.
pub fn reconcile(
    stored: &ProcessTable,
    own: Pid,
    probe: &dyn ProcessProbe,
) -> IpcResult<(Liveness, ProcessTable)> {
    let others = alive_others(stored, own, probe);
    if others.is_full() {
        return Err(IpcError::TooManyProcesses {
            alive: others.len(),
            max: MAX_PROCESSES,
        });
    }

    let liveness = if others.is_empty() {
        Liveness::ColdStart
    } else {
        Liveness::WarmStart
    };

    let mut pids = others;
    // Cannot fail: the list is not full.
    let _ = pids.push(own);
    let table = ProcessTable::from_pids(&pids).unwrap_or_default();
    Ok((liveness, table))
}

/// Remove `own` from `stored`, keeping every other entry as is.
pub fn deregister(stored: &ProcessTable, own: Pid) -> ProcessTable {
    let mut pids = AliveList::new();
    for pid in stored.pids().filter(|pid| *pid != own) {
        let _ = pids.push(pid);
    }
    ProcessTable::from_pids(&pids).unwrap_or_default()
}

/// Running PIDs in `stored` other than `own`, without duplicates.
pub fn alive_others(stored: &ProcessTable, own: Pid, probe: &dyn ProcessProbe) -> AliveList {
    let mut alive = AliveList::new();
    for pid in stored.pids() {
        if pid == own || alive.contains(&pid) || !probe.is_running(pid) {
            continue;
        }
        // The stored table never holds more than MAX_PROCESSES entries.
        let _ = alive.push(pid);
    }
    alive
}
