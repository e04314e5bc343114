//! SIGCHLD handling: when the shell exits, put the terminal back and leave.

use std::io;

use crate::error::EXIT_OK;
use crate::terminal;

const RESTORE_FAILED: &[u8] = b"ptyscript: failed to restore terminal mode\r\n";

/// Runs in signal context. Only async-signal-safe calls: tcsetattr, write,
/// _exit. The snapshot is plain data published before the handler was armed.
extern "C" fn on_child_exit(_: libc::c_int) {
    if let Some(saved) = terminal::saved() {
        if saved.restore().is_err() {
            unsafe {
                libc::write(
                    libc::STDERR_FILENO,
                    RESTORE_FAILED.as_ptr().cast(),
                    RESTORE_FAILED.len(),
                )
            };
        }
    }
    unsafe { libc::_exit(EXIT_OK) }
}

/// Install the child-exit handler. Call after publishing the terminal
/// snapshot and before `fork(2)`.
///
/// All other signals are blocked while the handler runs, and stopped children
/// do not trigger it.
pub fn arm() -> io::Result<()> {
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = on_child_exit as extern "C" fn(libc::c_int) as libc::sighandler_t;
        action.sa_flags = libc::SA_NOCLDSTOP;
        libc::sigfillset(&mut action.sa_mask);
        if libc::sigaction(libc::SIGCHLD, &action, std::ptr::null_mut()) == -1 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}
