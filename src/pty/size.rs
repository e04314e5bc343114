//! PTY size configuration

use std::io;
use std::os::fd::AsRawFd;

/// Terminal window geometry in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PtySize {
    pub rows: u16,
    pub cols: u16,
}

impl Default for PtySize {
    fn default() -> Self {
        Self { rows: 25, cols: 80 }
    }
}

impl From<PtySize> for libc::winsize {
    fn from(size: PtySize) -> Self {
        libc::winsize {
            ws_row: size.rows,
            ws_col: size.cols,
            ws_xpixel: 0,
            ws_ypixel: 0,
        }
    }
}

impl From<libc::winsize> for PtySize {
    fn from(ws: libc::winsize) -> Self {
        Self {
            rows: ws.ws_row,
            cols: ws.ws_col,
        }
    }
}

/// Set the window size of a terminal device (TIOCSWINSZ).
pub fn set_window_size(fd: &impl AsRawFd, size: PtySize) -> io::Result<()> {
    let ws: libc::winsize = size.into();
    if unsafe { libc::ioctl(fd.as_raw_fd(), libc::TIOCSWINSZ, &ws) } == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Read the window size of a terminal device (TIOCGWINSZ).
pub fn window_size(fd: &impl AsRawFd) -> io::Result<PtySize> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    if unsafe { libc::ioctl(fd.as_raw_fd(), libc::TIOCGWINSZ, &mut ws) } == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(ws.into())
}
