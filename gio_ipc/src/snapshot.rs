//! Serializable diagnostic view of a store.

use crate::codec::Value;
use crate::liveness::{Liveness, Pid};
use crate::schema::ValueKind;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Point-in-time view of a store's mode, PID table, counters and cache.
#[derive(Debug, Clone, Serialize)]
pub struct StoreSnapshot {
    /// Shared file path
    pub path: PathBuf,
    /// PID the store registered as
    pub pid: Pid,
    /// Whether values are shared through the file
    pub multi_process: bool,
    /// Attach outcome
    pub liveness: Liveness,
    /// PIDs in the file header, when mapped
    pub processes: Vec<Pid>,
    /// Global counter in the file, when mapped
    pub global_mod_count: Option<u32>,
    /// Global counter value last observed by this store
    pub seen_global_mod_count: Option<u32>,
    /// One entry per declared variable
    pub variables: Vec<VariableSnapshot>,
}

/// Cached state of one variable.
#[derive(Debug, Clone, Serialize)]
pub struct VariableSnapshot {
    /// Variable name
    pub name: String,
    /// Declared kind
    pub kind: ValueKind,
    /// Payload capacity in bytes
    pub capacity: usize,
    /// Cached value
    pub value: Option<Value>,
    /// Counter value the cache was last synchronised with
    pub seen_mod_count: Option<u32>,
    /// Counter value in the file, when mapped
    pub file_mod_count: Option<u32>,
    /// Whether the cache must be refreshed before the next read
    pub dirty: bool,
}

fn opt<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

impl fmt::Display for StoreSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "file:        {}", self.path.display())?;
        writeln!(f, "pid:         {}", self.pid)?;
        writeln!(f, "multi:       {}", self.multi_process)?;
        writeln!(f, "liveness:    {:?}", self.liveness)?;
        writeln!(f, "processes:   {:?}", self.processes)?;
        writeln!(
            f,
            "global mod:  {} (seen {})",
            opt(self.global_mod_count),
            opt(self.seen_global_mod_count)
        )?;
        for var in &self.variables {
            let value = match &var.value {
                None => "null".to_string(),
                Some(Value::Int(v)) => v.to_string(),
                Some(Value::Long(v)) => v.to_string(),
                Some(Value::Float(v)) => v.to_string(),
                Some(Value::Bool(v)) => v.to_string(),
                Some(Value::String(s)) => format!("{s:?}"),
                Some(Value::Bytes(b)) => format!("<{} bytes>", b.len()),
            };
            writeln!(
                f,
                "  {:<16} {:<7} mod {}/{}{} = {}",
                var.name,
                format!("{:?}", var.kind),
                opt(var.seen_mod_count),
                opt(var.file_mod_count),
                if var.dirty { " dirty" } else { "" },
                value
            )?;
        }
        Ok(())
    }
}
