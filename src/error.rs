//! Error taxonomy and process exit codes.

use crate::config::ConfigError;
use crate::pty::PtyError;
use crate::relay::RelayError;
use crate::terminal::TerminalError;

/// Normal end of session.
pub const EXIT_OK: i32 = 0;
/// PTY allocation or terminal capture failed before the split.
pub const EXIT_ALLOCATION: i32 = 1;
/// fork(2) failed.
pub const EXIT_SPLIT: i32 = 2;
/// Exit status of a child whose exec failed.
pub const EXIT_EXEC: i32 = 127;
/// Bad arguments or config file (sysexits EX_USAGE).
pub const EXIT_USAGE: i32 = 64;

/// Fatal errors that end a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("cannot capture terminal state: {0}")]
    Terminal(#[from] TerminalError),

    #[error("cannot enter raw mode: {0}")]
    RawMode(TerminalError),

    #[error("opening pseudo tty: {0}")]
    Allocation(#[from] PtyError),

    #[error("fork failed on shell: {0}")]
    SplitFailed(std::io::Error),

    #[error("cannot open transcript '{path}': {source}")]
    Transcript {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("relay aborted: {0}")]
    Relay(#[from] RelayError),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl SessionError {
    /// Process exit code reported for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            SessionError::Config(_) | SessionError::Transcript { .. } => EXIT_USAGE,
            SessionError::Terminal(_) | SessionError::Allocation(_) => EXIT_ALLOCATION,
            SessionError::RawMode(_) => EXIT_ALLOCATION,
            SessionError::SplitFailed(_) => EXIT_SPLIT,
            SessionError::Relay(_) | SessionError::Io(_) => EXIT_ALLOCATION,
        }
    }
}
