//! # GIO Shared Variable Store
//!
//! Typed variables shared between cooperating processes of one application
//! through a single memory-mapped file.
//!
//! ## Features
//!
//! - **Fixed schema**: variables are declared once, in order, before the file
//!   is mapped; every process must declare the same schema
//! - **Lazy change detection**: reads are served from an in-process cache
//!   until a global modification counter in the file moves
//! - **Fine-grained locking**: blocking byte-range locks on one variable's
//!   slot, the counter region, or the process table
//! - **Liveness tracking**: a 10-slot PID table decides cold versus warm
//!   start and prunes processes that died
//! - **Graceful degradation**: mapping, lock and header failures drop the
//!   store to single-process mode instead of failing the caller
//!
//! ## File Layout
//!
//! ```text
//! ┌───────────────────────┬──────────────────────────┬─────────────────────┐
//! │ Header (44 bytes)     │ Meta (4 + 4n bytes)      │ Data                │
//! │ magic, count, PIDs[10]│ global + per-var counters│ [len?][payload] ... │
//! └───────────────────────┴──────────────────────────┴─────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gio_ipc::{Liveness, SignalProbe, Store, VariableRegistry, current_pid};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut registry = VariableRegistry::new();
//! let session = registry.declare_string("sessionId", 10)?;
//! let pause = registry.declare_long("lastPauseTime")?;
//! let layout = registry.finalize();
//!
//! let path = std::path::Path::new("/tmp/.gio.dir/gio.core.ipc.1");
//! let store = Store::open(path, layout, true, current_pid());
//! if store.finalize_and_register(&SignalProbe)? == Liveness::ColdStart {
//!     store.put(pause, -1i64)?;
//! }
//!
//! store.put_string(session, Some("abc123"))?;
//! let current: Option<String> = store.get(session)?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod error;
pub mod layout;
pub mod liveness;
pub mod platform;
pub mod schema;
pub mod snapshot;
pub mod store;
pub mod tracker;

pub use codec::{SharedValue, Value};
pub use error::{IpcError, IpcResult, LockRegion};
pub use liveness::{AliveList, Liveness, Pid, ProcessProbe, SignalProbe};
pub use platform::{current_pid, running_processes_same_user};
pub use schema::{LengthPrefix, SchemaLayout, ValueKind, VarIndex, VariableDescriptor, VariableRegistry};
pub use snapshot::{StoreSnapshot, VariableSnapshot};
pub use store::Store;
pub use tracker::{NO_PAUSE_TIME, TrackerStore, TrackerVars, tracker_schema};
