//! # GIO Shared File Inspector
//!
//! Prints the PID table, modification counters and current values of a
//! tracker shared file without registering in it.
//!
//! # Usage
//!
//! ```bash
//! # Inspect a file directly
//! gio_inspect /data/user/0/com.example/files/.gio.dir/gio.core.ipc.1
//!
//! # Resolve the file from a host configuration
//! gio_inspect --config gio.toml
//!
//! # Machine-readable output
//! gio_inspect --config gio.toml --json
//! ```

#![deny(warnings)]

use clap::Parser;
use gio_common::config::{ConfigLoader, IpcConfig, LogLevel};
use gio_common::logging::{LogFormat, init_tracing};
use gio_ipc::{Store, current_pid, tracker_schema};
use std::path::PathBuf;
use tracing::{debug, error, warn};

/// GIO Inspect - dump a shared-variable file
#[derive(Parser, Debug)]
#[command(name = "gio_inspect")]
#[command(version)]
#[command(about = "Print a diagnostic snapshot of a gio shared-variable file")]
#[command(long_about = None)]
struct Args {
    /// Shared file to inspect
    #[arg(value_name = "FILE", required_unless_present = "config")]
    file: Option<PathBuf>,

    /// Host configuration file; the shared file is taken from its [store] section
    #[arg(short, long, value_name = "TOML", conflicts_with = "file")]
    config: Option<PathBuf>,

    /// Print the snapshot as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    log_json: bool,
}

fn main() {
    if let Err(e) = run() {
        error!("Inspection failed: {}", e);
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let (path, configured_level) = match (&args.file, &args.config) {
        (Some(file), _) => (file.clone(), LogLevel::Warn),
        (None, Some(config_path)) => {
            let config = IpcConfig::load(config_path)?;
            config.validate()?;
            (config.store.file_path(), config.shared.log_level)
        }
        (None, None) => return Err("either FILE or --config is required".into()),
    };

    let level = if args.verbose {
        LogLevel::Debug
    } else {
        configured_level
    };
    let format = if args.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    init_tracing(level, format);

    // Opening creates missing files; an inspector must never do that.
    let len = std::fs::metadata(&path)
        .map_err(|e| format!("{}: {}", path.display(), e))?
        .len();
    if len == 0 {
        return Err(format!("{} is empty", path.display()).into());
    }

    let (layout, _) = tracker_schema()?;
    let store = Store::try_open(&path, layout, current_pid())?;
    debug!("Opened {} ({} bytes)", path.display(), len);

    for descriptor in store.layout().descriptors() {
        if let Err(e) = store.read_value(descriptor.index()) {
            warn!("Could not read {}: {}", descriptor.name(), e);
        }
    }

    let snapshot = store.snapshot();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{snapshot}");
    }
    Ok(())
}
