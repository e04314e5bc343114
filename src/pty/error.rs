//! PTY error types

use std::path::PathBuf;

/// Fatal failures while allocating the master/slave pair.
///
/// Every variant means the allocation was abandoned and every descriptor
/// opened so far has been closed.
#[derive(Debug, thiserror::Error)]
pub enum PtyError {
    #[error("masterfd.open: {0}")]
    OpenMaster(std::io::Error),

    #[error("masterfd.grantpt: {0}")]
    Grant(std::io::Error),

    #[error("masterfd.unlockpt: {0}")]
    Unlock(std::io::Error),

    #[error("masterfd.ptsname: {0}")]
    SlaveName(std::io::Error),

    #[error("slavefd.open '{}': {source}", .path.display())]
    OpenSlave {
        path: PathBuf,
        source: std::io::Error,
    },
}
