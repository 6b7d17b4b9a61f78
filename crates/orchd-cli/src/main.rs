//! CLI entry point - the composition root.
//!
//! Settings are resolved here (defaults, then `.env` and `ORCHD_*`
//! variables, then flags) and handed to the handlers. `acquire` and
//! `status` reject invalid settings; the lock-file commands tolerate them.

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use orchd_cli::{Cli, CliError, Commands, exit_code_for, handlers};
use orchd_core::settings::{GuardSettings, validate_settings};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err:#}");
        std::process::exit(exit_code_for(&err));
    }
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Defaults, then env, then flags; any invalid value is an error.
fn resolve_settings(cli: &Cli) -> Result<GuardSettings, CliError> {
    let mut settings = GuardSettings::from_env()?;
    settings.merge(&cli.overrides());
    validate_settings(&settings)?;
    Ok(settings)
}

/// Settings for commands that only touch the lock triplet.
///
/// They read the port and lock directory alone, so invalid values elsewhere
/// are logged and replaced by defaults instead of failing the command.
fn resolve_lock_settings(cli: &Cli) -> GuardSettings {
    let (mut settings, errors) = GuardSettings::from_env_lossy();
    for err in &errors {
        warn!(error = %err, "Ignoring invalid setting");
    }
    settings.merge(&cli.overrides());
    if let Err(err) = validate_settings(&settings) {
        warn!(error = %err, "Ignoring invalid setting");
    }
    settings
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Check { json } => handlers::check::execute(&resolve_lock_settings(&cli), json),
        Commands::Clean => handlers::clean::execute(&resolve_lock_settings(&cli)),
        Commands::Release { pid } => handlers::release::execute(&resolve_lock_settings(&cli), pid),
        Commands::Acquire { force } => {
            handlers::acquire::execute(&resolve_settings(&cli)?, force).await
        }
        Commands::Status { json } => handlers::status::execute(&resolve_settings(&cli)?, json),
    }
}
