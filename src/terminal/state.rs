//! Captured terminal mode and its restoration.

use std::fmt;
use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::sync::OnceLock;

/// Errors raised while reading or changing a terminal's mode.
#[derive(Debug, thiserror::Error)]
pub enum TerminalError {
    #[error("tcgetattr on fd {fd}: {source}")]
    Capture { fd: RawFd, source: io::Error },

    #[error("tcsetattr on fd {fd}: {source}")]
    Apply { fd: RawFd, source: io::Error },
}

/// The mode of a terminal device at one point in time.
///
/// Restoring is a single `tcsetattr(2)` on plain data, so it can be called
/// from a signal handler.
#[derive(Clone, Copy)]
pub struct TerminalSnapshot {
    fd: RawFd,
    termios: libc::termios,
}

/// The snapshot taken at startup, readable from signal context.
static SAVED: OnceLock<TerminalSnapshot> = OnceLock::new();

impl TerminalSnapshot {
    /// Read the current mode of `fd`.
    ///
    /// The snapshot refers to the raw descriptor; the caller keeps it open
    /// for as long as the snapshot may be restored.
    pub fn capture(fd: &impl AsRawFd) -> Result<Self, TerminalError> {
        let fd = fd.as_raw_fd();
        let mut termios: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(fd, &mut termios) } == -1 {
            return Err(TerminalError::Capture {
                fd,
                source: io::Error::last_os_error(),
            });
        }
        Ok(Self { fd, termios })
    }

    /// Reapply the captured mode, discarding pending input and draining output.
    pub fn restore(&self) -> Result<(), TerminalError> {
        self.apply(&self.termios)
    }

    /// The mode used while relaying: no canonical editing, no signal keys, no
    /// echo, and reads return as soon as one byte is available.
    pub fn raw(&self) -> libc::termios {
        let mut raw = self.termios;
        raw.c_lflag &= !(libc::ISIG | libc::ECHO | libc::ICANON);
        raw.c_cc[libc::VMIN] = 1;
        raw.c_cc[libc::VTIME] = 0;
        raw
    }

    pub(crate) fn apply(&self, termios: &libc::termios) -> Result<(), TerminalError> {
        if unsafe { libc::tcsetattr(self.fd, libc::TCSAFLUSH, termios) } == -1 {
            return Err(TerminalError::Apply {
                fd: self.fd,
                source: io::Error::last_os_error(),
            });
        }
        Ok(())
    }

    pub fn fd(&self) -> RawFd {
        self.fd
    }

    pub fn termios(&self) -> &libc::termios {
        &self.termios
    }

    /// Whether two snapshots describe the same terminal mode.
    pub fn same_mode(&self, other: &TerminalSnapshot) -> bool {
        let (a, b) = (&self.termios, &other.termios);
        a.c_iflag == b.c_iflag
            && a.c_oflag == b.c_oflag
            && a.c_cflag == b.c_cflag
            && a.c_lflag == b.c_lflag
            && a.c_cc == b.c_cc
    }

    /// Make this snapshot the process-wide one restored on child exit or panic.
    ///
    /// Only the first call has an effect; returns the snapshot now installed.
    pub fn publish(self) -> &'static TerminalSnapshot {
        SAVED.get_or_init(|| self)
    }
}

/// The process-wide snapshot, if one was published.
pub fn saved() -> Option<&'static TerminalSnapshot> {
    SAVED.get()
}

impl fmt::Debug for TerminalSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalSnapshot")
            .field("fd", &self.fd)
            .field("c_lflag", &format_args!("{:#o}", self.termios.c_lflag))
            .finish()
    }
}
