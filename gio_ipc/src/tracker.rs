//! Session-tracking facade over a [`Store`].
//!
//! Shares the session id, user id and foreground timestamps of a tracking
//! pipeline between processes of one application.

use crate::error::IpcResult;
use crate::liveness::{Liveness, Pid, ProcessProbe};
use crate::schema::{SchemaLayout, VarIndex, VariableRegistry};
use crate::store::Store;
use gio_common::config::StoreConfig;
use tracing::warn;

/// Last pause time after a cold start: no process was in the foreground.
pub const NO_PAUSE_TIME: i64 = -1;

/// Indices of the tracker variables.
#[derive(Debug, Clone, Copy)]
pub struct TrackerVars {
    /// `sessionId`, at most 10 characters
    pub session_id: VarIndex,
    /// `userId`, at most 1000 characters
    pub user_id: VarIndex,
    /// `lastPauseTime`, epoch milliseconds
    pub last_pause_time: VarIndex,
    /// `lastResumeTime`, epoch milliseconds
    pub last_resume_time: VarIndex,
}

/// Declare the tracker schema.
///
/// Declaration order is part of the file format.
pub fn tracker_schema() -> IpcResult<(SchemaLayout, TrackerVars)> {
    let mut registry = VariableRegistry::new();
    let vars = TrackerVars {
        session_id: registry.declare_string("sessionId", 10)?,
        user_id: registry.declare_string("userId", 1000)?,
        last_pause_time: registry.declare_long("lastPauseTime")?,
        last_resume_time: registry.declare_long("lastResumeTime")?,
    };
    Ok((registry.finalize(), vars))
}

/// Typed accessors for the tracker variables.
pub struct TrackerStore {
    store: Store,
    vars: TrackerVars,
}

impl TrackerStore {
    /// Open the tracker file described by `config` and register `pid`.
    ///
    /// Environment problems do not fail the call: they are logged and leave
    /// the store in single-process mode. On a cold start the last pause time
    /// is reset to [`NO_PAUSE_TIME`].
    pub fn open(config: &StoreConfig, pid: Pid, probe: &dyn ProcessProbe) -> IpcResult<Self> {
        let (layout, vars) = tracker_schema()?;
        let store = Store::open(&config.file_path(), layout, config.multi_process, pid);

        // Failures are already logged and reflected in the store's mode.
        let liveness = store
            .finalize_and_register(probe)
            .unwrap_or_else(|_| store.liveness());

        let tracker = Self { store, vars };
        if liveness == Liveness::ColdStart {
            if let Err(e) = tracker.set_last_pause_time(NO_PAUSE_TIME) {
                warn!("Failed to reset last pause time: {}", e);
            }
        }
        Ok(tracker)
    }

    /// Current session id.
    pub fn session_id(&self) -> Option<String> {
        self.store.get(self.vars.session_id).unwrap_or_default()
    }

    /// Replace the session id.
    pub fn set_session_id(&self, session_id: Option<&str>) -> IpcResult<()> {
        self.store.put_string(self.vars.session_id, session_id)
    }

    /// Current user id.
    pub fn user_id(&self) -> Option<String> {
        self.store.get(self.vars.user_id).unwrap_or_default()
    }

    /// Replace the user id.
    pub fn set_user_id(&self, user_id: Option<&str>) -> IpcResult<()> {
        self.store.put_string(self.vars.user_id, user_id)
    }

    /// Time the application last went to the background.
    pub fn last_pause_time(&self) -> i64 {
        self.store.get(self.vars.last_pause_time).unwrap_or_default()
    }

    /// Record the time the application went to the background.
    pub fn set_last_pause_time(&self, millis: i64) -> IpcResult<()> {
        self.store.put(self.vars.last_pause_time, millis)
    }

    /// Time the application last came to the foreground.
    pub fn last_resume_time(&self) -> i64 {
        self.store.get(self.vars.last_resume_time).unwrap_or_default()
    }

    /// Record the time the application came to the foreground.
    pub fn set_last_resume_time(&self, millis: i64) -> IpcResult<()> {
        self.store.put(self.vars.last_resume_time, millis)
    }

    /// Whether no other process shared the file at attach.
    pub fn is_cold_start(&self) -> bool {
        self.store.is_cold_start()
    }

    /// Variable indices, for direct store access.
    pub fn vars(&self) -> TrackerVars {
        self.vars
    }

    /// Underlying store.
    pub fn store(&self) -> &Store {
        &self.store
    }
}
