//! Raw terminal mode management with panic-safe cleanup.

use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};

use super::state::{self, TerminalError, TerminalSnapshot};

/// Static flag to track if raw mode is active (for panic handler)
pub(crate) static RAW_MODE_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Guard that puts a terminal into raw mode and restores the captured mode on
/// drop. This handles both normal returns and panics.
pub struct RawModeGuard {
    snapshot: TerminalSnapshot,
    /// Whether this guard is responsible for cleanup
    active: bool,
}

impl RawModeGuard {
    /// Switch the snapshot's terminal to raw mode.
    ///
    /// # Errors
    /// Returns an error if the terminal rejects the new attributes
    pub fn enter(snapshot: TerminalSnapshot) -> Result<Self, TerminalError> {
        install_panic_hook();

        snapshot.apply(&snapshot.raw())?;
        RAW_MODE_ACTIVE.store(true, Ordering::SeqCst);

        Ok(Self {
            snapshot,
            active: true,
        })
    }

    /// Restore the captured mode now. After this the guard's drop is a no-op.
    pub fn exit(&mut self) -> Result<(), TerminalError> {
        if self.active {
            self.active = false;
            RAW_MODE_ACTIVE.store(false, Ordering::SeqCst);
            self.snapshot.restore()?;
        }
        Ok(())
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if self.active {
            RAW_MODE_ACTIVE.store(false, Ordering::SeqCst);
            if let Err(e) = self.snapshot.restore() {
                eprintln!("Warning: restoring terminal mode: {}", e);
            }
        }
    }
}

/// Install a panic hook that restores the published terminal mode before the
/// panic message is printed.
pub(crate) fn install_panic_hook() {
    static HOOK_INSTALLED: AtomicBool = AtomicBool::new(false);

    if HOOK_INSTALLED.swap(true, Ordering::SeqCst) {
        return;
    }

    let original_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        if RAW_MODE_ACTIVE.swap(false, Ordering::SeqCst) {
            if let Some(saved) = state::saved() {
                let _ = saved.restore();
            }
        }

        original_hook(panic_info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pty::{open_pair, PtySize};

    #[test]
    fn test_raw_mode_guard_enter_and_drop() {
        let pair = open_pair(PtySize::default()).unwrap();
        let before = TerminalSnapshot::capture(&pair.slave).unwrap();

        let guard = RawModeGuard::enter(before).expect("Should enter raw mode");
        let during = TerminalSnapshot::capture(&pair.slave).unwrap();
        assert_eq!(during.termios().c_lflag & libc::ICANON, 0);

        drop(guard);
        let after = TerminalSnapshot::capture(&pair.slave).unwrap();
        assert!(before.same_mode(&after));
    }

    #[test]
    fn test_raw_mode_guard_manual_exit() {
        let pair = open_pair(PtySize::default()).unwrap();
        let before = TerminalSnapshot::capture(&pair.slave).unwrap();

        let mut guard = RawModeGuard::enter(before).unwrap();
        guard.exit().expect("Should exit raw mode");
        let after = TerminalSnapshot::capture(&pair.slave).unwrap();
        assert!(before.same_mode(&after));

        // Drop should be a no-op now
        drop(guard);
    }

    #[test]
    fn test_panic_hook_installation() {
        install_panic_hook();
        install_panic_hook(); // Second call should be no-op
    }
}
