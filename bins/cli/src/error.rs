use lab_finder_shared::ErrorKind;
use thiserror::Error;

/// Process exit status. Backend failures map onto these through [`ErrorKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Ok = 0,
    Internal = 1,
    InvalidInput = 2,
    Io = 3,
    NotFound = 4,
    Unavailable = 5,
    Interrupted = 130,
}

impl ExitCode {
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Exit status for a failed client call.
    #[must_use]
    pub const fn for_error_kind(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Validation => Self::InvalidInput,
            ErrorKind::NotFound => Self::NotFound,
            ErrorKind::Network | ErrorKind::Service => Self::Unavailable,
            ErrorKind::Cancelled => Self::Interrupted,
            ErrorKind::Internal => Self::Internal,
        }
    }
}

/// Failures of the CLI itself, after the client call has produced output.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CliError {
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::Io(_) => ExitCode::Io,
            Self::Serialization(_) => ExitCode::Internal,
        }
    }
}
