use std::process::ExitCode;

use thiserror::Error;

/// Process exit statuses. Every path out of the probe resolves to one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitStatus {
    Success = 0,
    /// The request failed at the transport level or returned a non-2xx status.
    Failure = 1,
    /// Flags or target were rejected before any network activity.
    Usage = 2,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status as u8)
    }
}

/// Errors detected while resolving the command line, before any request is made.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Rejected by the argument parser itself (unknown flag, missing value, `--help`).
    #[error(transparent)]
    Arguments(#[from] clap::Error),

    #[error("Invalid header: {0:?}")]
    InvalidHeader(String),

    #[error("Invalid timeout: {input:?}: {source}")]
    InvalidTimeout {
        input: String,
        #[source]
        source: humantime::DurationError,
    },

    #[error("Invalid URL: {input:?}: {source}")]
    InvalidUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid scheme: {0:?}")]
    InvalidScheme(String),

    #[error("Invalid hostname: {0:?}")]
    InvalidHost(String),
}

impl ConfigError {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            // clap reports `--help` through its error type with a success code
            ConfigError::Arguments(err) if err.exit_code() == 0 => ExitStatus::Success,
            _ => ExitStatus::Usage,
        }
    }
}

pub type ConfigResult<T, E = ConfigError> = Result<T, E>;
