use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TtyError>;

/// Failures surfaced by the tty lifecycle.
#[derive(Debug, Error)]
pub enum TtyError {
    #[error("cannot open terminal device {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("terminal mode change rejected: {0}")]
    Mode(#[source] io::Error),

    #[error("terminal size query failed: {0}")]
    Query(#[source] io::Error),

    #[error("invalid {var} value `{value}`: expected an integer")]
    InvalidEnvValue { var: &'static str, value: String },

    #[error("cannot subscribe to window-change signal: {0}")]
    Signal(#[source] io::Error),

    #[error("terminal session already finished; sessions are single-use")]
    SessionSpent,
}

/// Copyable discriminant of [`TtyError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    OpenFailed,
    ModeFailed,
    QueryFailed,
    InvalidEnvValue,
    SignalFailed,
    SessionSpent,
}

impl TtyError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Open { .. } => ErrorKind::OpenFailed,
            Self::Mode(_) => ErrorKind::ModeFailed,
            Self::Query(_) => ErrorKind::QueryFailed,
            Self::InvalidEnvValue { .. } => ErrorKind::InvalidEnvValue,
            Self::Signal(_) => ErrorKind::SignalFailed,
            Self::SessionSpent => ErrorKind::SessionSpent,
        }
    }

    #[must_use]
    pub fn open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn invalid_env(var: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidEnvValue {
            var,
            value: value.into(),
        }
    }
}
