//! Workspace-wide constants.
//!
//! Single source of truth for shared file names and limits.

/// Directory created under the host's private files directory.
pub const SHARED_DIR_NAME: &str = ".gio.dir";

/// Default shared file name.
///
/// The trailing number is the schema version. Any change to the declared
/// variables (names, order, sizes) must bump it so that processes running
/// an older build never map the new layout.
pub const DEFAULT_SHARED_FILE: &str = "gio.core.ipc.1";

/// Maximum number of processes tracked in the shared file header.
pub const MAX_PROCESSES: usize = 10;
