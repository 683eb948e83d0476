//! Prelude module for common re-exports.
//!
//! ```rust
//! use gio_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, IpcConfig, LogLevel, SharedConfig, StoreConfig};

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::logging::{LogFormat, init_tracing};

// ─── Constants ──────────────────────────────────────────────────────
pub use crate::consts::{DEFAULT_SHARED_FILE, MAX_PROCESSES, SHARED_DIR_NAME};
