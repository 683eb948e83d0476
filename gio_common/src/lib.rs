//! GIO Common Library
//!
//! Shared configuration loading, logging setup and constants for the
//! crates of the `gio_ipc` workspace.
//!
//! # Module Structure
//!
//! - [`config`] - TOML configuration loading traits and types
//! - [`consts`] - File names and limits shared by every crate
//! - [`logging`] - `tracing` subscriber initialization
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use gio_common::prelude::*;
//! ```

pub mod config;
pub mod consts;
pub mod logging;
pub mod prelude;
