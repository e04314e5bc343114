//! Pseudo-terminal allocation.
//!
//! # Structure
//!
//! - [`error`] - Error types for PTY allocation
//! - [`size`] - Window geometry and its ioctls
//! - [`pair`] - Master/slave pair setup

mod error;
mod pair;
mod size;

pub use error::PtyError;
pub use pair::{open_pair, PtyPair};
pub use size::{set_window_size, window_size, PtySize};
