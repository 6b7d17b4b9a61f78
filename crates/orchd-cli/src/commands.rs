//! Subcommands of `orchestrator-lock`.

use clap::Subcommand;

/// Available commands for the lock utility.
///
/// Every command except `acquire` exits 0 on its normal paths.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show the running orchestrator on the port, if any
    Check {
        /// Print the peer descriptor as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove lock files left behind by dead orchestrators
    Clean,

    /// Acquire the lock and hold it until SIGINT or SIGTERM
    Acquire {
        /// Terminate a running orchestrator and take over its port
        #[arg(short, long)]
        force: bool,
    },

    /// Release the lock held by a PID (defaults to this process)
    Release {
        /// Owner PID recorded in the lock file
        #[arg(long)]
        pid: Option<u32>,
    },

    /// Show host load, admission limits and the current peer
    Status {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}
