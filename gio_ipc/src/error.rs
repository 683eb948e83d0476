//! Error types for shared-variable store operations

use crate::schema::ValueKind;
use std::path::PathBuf;
use thiserror::Error;

/// Byte region of the shared file a lock was requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockRegion {
    /// Header: magic, live count and PID slots.
    ProcessTable,
    /// Global and per-variable modification counters.
    Meta,
    /// One variable's slot in the data region.
    Data {
        /// Descriptor index of the variable.
        index: usize,
    },
}

/// Errors that can occur during store operations.
///
/// `SchemaFrozen`, `InvalidDescriptor`, `ValueTooLarge`, `UnknownVariable`
/// and `TypeMismatch` are programmer errors. The remaining variants report
/// an environment problem the store already recovered from by degrading.
#[derive(Error, Debug)]
pub enum IpcError {
    /// Variable declared after the registry was finalized
    #[error("Schema is frozen, cannot declare variable: {name}")]
    SchemaFrozen {
        /// Variable name
        name: String,
    },

    /// Descriptor rejected at declaration time
    #[error("Invalid variable descriptor {name}: {reason}")]
    InvalidDescriptor {
        /// Variable name
        name: String,
        /// Why the descriptor was rejected
        reason: String,
    },

    /// Encoded payload exceeds the declared capacity
    #[error("Value for {name} too large: {len} bytes (capacity {capacity})")]
    ValueTooLarge {
        /// Variable name
        name: String,
        /// Encoded payload length
        len: usize,
        /// Declared capacity
        capacity: usize,
    },

    /// Index does not refer to a declared variable
    #[error("Unknown variable index: {index}")]
    UnknownVariable {
        /// Requested index
        index: usize,
    },

    /// Accessor type does not match the declared kind
    #[error("Type mismatch for {name}: declared {declared:?}, accessed as {requested:?}")]
    TypeMismatch {
        /// Variable name
        name: String,
        /// Declared kind
        declared: ValueKind,
        /// Kind implied by the accessor
        requested: ValueKind,
    },

    /// Byte-range lock could not be acquired or released
    #[error("Lock acquisition failed for {region:?}: {source}")]
    LockAcquisitionFailed {
        /// Region that was being locked
        region: LockRegion,
        /// Underlying system call error
        #[source]
        source: nix::Error,
    },

    /// Shared file could not be opened or mapped
    #[error("Failed to map shared file {}: {source}", path.display())]
    MapFailed {
        /// Shared file path
        path: PathBuf,
        /// Source IO error
        #[source]
        source: std::io::Error,
    },

    /// Shared file exists with a different layout
    #[error("Shared file {} has {actual} bytes, layout needs {expected}", path.display())]
    LayoutMismatch {
        /// Shared file path
        path: PathBuf,
        /// Size required by the declared schema
        expected: u64,
        /// Size found on disk
        actual: u64,
    },

    /// Magic number in the header is neither zero nor ours
    #[error("Bad magic number in shared file: {found:#06x}")]
    BadMagic {
        /// Magic found in the header
        found: u16,
    },

    /// Process table is full
    #[error("Too many live processes: {alive} already registered (max {max})")]
    TooManyProcesses {
        /// Live processes other than the caller
        alive: usize,
        /// Table capacity
        max: usize,
    },

    /// Stored length prefix does not fit the slot
    #[error("Corrupt entry for {name}: stored length {len} exceeds capacity {capacity}")]
    CorruptEntry {
        /// Variable name
        name: String,
        /// Length read from the prefix
        len: usize,
        /// Declared capacity
        capacity: usize,
    },

    /// IO error
    #[error("IO error: {source}")]
    Io {
        /// Source IO error
        #[from]
        source: std::io::Error,
    },
}

impl IpcError {
    /// Whether the error is a caller mistake rather than an environment
    /// failure the store degraded around.
    pub const fn is_programmer_error(&self) -> bool {
        matches!(
            self,
            Self::SchemaFrozen { .. }
                | Self::InvalidDescriptor { .. }
                | Self::ValueTooLarge { .. }
                | Self::UnknownVariable { .. }
                | Self::TypeMismatch { .. }
        )
    }
}

/// Result type for store operations
pub type IpcResult<T> = Result<T, IpcError>;
