//! Main CLI parser and top-level argument handling.
//!
//! This module defines the root CLI structure with global options.

use std::path::PathBuf;

use clap::Parser;
use orchd_core::settings::SettingsOverrides;

use crate::commands::Commands;

/// Command-line interface for the orchestrator single-instance lock.
///
/// Global options override `ORCHD_*` environment variables, which in turn
/// override built-in defaults.
#[derive(Parser)]
#[command(name = "orchestrator-lock")]
#[command(about = "Inspect, acquire and release the orchestrator single-instance lock")]
#[command(version)]
pub struct Cli {
    /// Port guarded by the lock
    #[arg(short = 'p', long = "port", global = true, env = "ORCHD_PORT")]
    pub port: Option<u16>,

    /// Directory holding lock files
    #[arg(long = "lock-dir", global = true, env = "ORCHD_LOCK_DIR")]
    pub lock_dir: Option<PathBuf>,

    /// Seconds between SIGTERM and SIGKILL during force takeover (1-5)
    #[arg(long = "force-grace", global = true, env = "ORCHD_FORCE_GRACE_SECS")]
    pub force_grace_secs: Option<u64>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Settings fields given on the command line.
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            lock_dir: self.lock_dir.clone(),
            port: self.port,
            force_grace_secs: self.force_grace_secs,
            ..SettingsOverrides::default()
        }
    }
}
