//! CLI-specific error types and mappings.
//!
//! This module maps controller errors to exit codes and user-facing messages.

use orchd_core::settings::SettingsError;
use orchd_runtime::AcquireError;
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Another orchestrator holds, or just won, the lock.
    #[error("{0}")]
    Contention(String),

    /// Force takeover could not terminate the peer.
    #[error("Takeover failed: {0}")]
    Takeover(String),

    /// IO error (permission denied, read-only lock dir, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Misuse of the lock manager.
    #[error("{0}")]
    Usage(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 0: Success
    /// - 1: Lock held by a peer or race lost
    /// - 64-78: Reserved for specific error categories (see sysexits.h)
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Contention(_) => 1,
            Self::Usage(_) => 64,    // EX_USAGE
            Self::Takeover(_) => 71, // EX_OSERR
            Self::Io(_) => 74,       // EX_IOERR
            Self::Config(_) => 78,   // EX_CONFIG
        }
    }
}

impl From<AcquireError> for CliError {
    fn from(err: AcquireError) -> Self {
        match err {
            AcquireError::PeerPresent { .. }
            | AcquireError::RaceLost { .. }
            | AcquireError::UnknownPeer { .. } => Self::Contention(err.to_string()),
            AcquireError::TakeoverFailed { .. } => Self::Takeover(err.to_string()),
            AcquireError::Io(_) => Self::Io(err.to_string()),
            AcquireError::AlreadyHeld { .. } | AcquireError::AlreadyReleased => {
                Self::Usage(err.to_string())
            }
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Exit code for any error reaching `main`.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<CliError>().map_or(1, CliError::exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchd_core::domain::OrchestratorDescriptor;

    #[test]
    fn contention_exits_one() {
        let err: CliError = AcquireError::RaceLost { port: 9500 }.into();
        assert_eq!(err.exit_code(), 1);

        let err: CliError = AcquireError::PeerPresent {
            peer: OrchestratorDescriptor::new(7, 9500, None),
        }
        .into();
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("kill 7"));
    }

    #[test]
    fn takeover_and_config_have_distinct_codes() {
        let takeover: CliError = AcquireError::TakeoverFailed {
            pid: 7,
            source: std::io::Error::other("still alive"),
        }
        .into();
        let config: CliError = SettingsError::ZeroThreshold.into();
        assert_eq!(takeover.exit_code(), 71);
        assert_eq!(config.exit_code(), 78);
    }

    #[test]
    fn wrapped_cli_error_keeps_its_code() {
        let err = anyhow::Error::from(CliError::Io("disk full".into()));
        assert_eq!(exit_code_for(&err), 74);
        assert_eq!(exit_code_for(&anyhow::anyhow!("other")), 1);
    }
}
