//! ptyscript library crate.
//!
//! Runs an interactive shell on the slave side of a pseudo-terminal while the
//! calling process relays bytes between its own terminal and the master side,
//! optionally keeping a transcript of the shell's output.

#![cfg(unix)]

pub mod cli;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod pty;
pub mod relay;
pub mod session;
pub mod shell;
pub mod terminal;
