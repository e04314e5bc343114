//! Controlling-terminal mode: capture, raw mode, restore.

mod raw_mode;
mod state;

pub use raw_mode::RawModeGuard;
pub use state::{saved, TerminalError, TerminalSnapshot};
