//! One shell invocation from start to finish.
//!
//! Order matters: capture the terminal mode, allocate the pty, open the
//! transcript, arm the exit handler, then fork. The child and parent continue in [`child_path`] and
//! [`parent_path`], which share nothing but the config and their half of the
//! descriptor pair.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::AsFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::lifecycle;
use crate::pty::{open_pair, PtyError, PtyPair, PtySize};
use crate::relay::{Relay, RelayStats};
use crate::shell::{exec_shell, ShellCommand};
use crate::terminal::{RawModeGuard, TerminalSnapshot};

/// Run a full session on the process's own stdin/stdout.
///
/// Returns when the relay ends on its own. Normally the shell's exit is seen
/// first by the SIGCHLD handler, which restores the terminal and exits 0
/// without returning here.
pub fn run(config: &SessionConfig) -> Result<RelayStats, SessionError> {
    let snapshot = TerminalSnapshot::capture(&io::stdin())?;
    let snapshot = *snapshot.publish();

    let command = ShellCommand::new(config)?;
    let (pair, transcript) = allocate(config, open_pair)?;
    eprintln!("slavename={}", pair.slave_name.display());

    lifecycle::arm().map_err(SessionError::SplitFailed)?;

    match unsafe { libc::fork() } {
        -1 => Err(SessionError::SplitFailed(io::Error::last_os_error())),
        0 => child_path(pair, &command),
        pid => {
            log::debug!("shell {} started as pid {}", config.shell.display(), pid);
            parent_path(pair, snapshot, transcript, config)
        }
    }
}

/// Allocate the pty, then open the transcript.
///
/// A failed allocation leaves an existing transcript file untouched.
fn allocate<F>(config: &SessionConfig, open: F) -> Result<(PtyPair, Option<File>), SessionError>
where
    F: FnOnce(PtySize) -> Result<PtyPair, PtyError>,
{
    let pair = open(config.size)?;
    let transcript = config
        .transcript
        .as_deref()
        .map(open_transcript)
        .transpose()?;
    Ok((pair, transcript))
}

/// Child: drop the master and become the shell.
fn child_path(pair: PtyPair, command: &ShellCommand) -> ! {
    exec_shell(pair.into_slave(), command)
}

/// Parent: drop the slave, go raw, relay until the shell side closes.
fn parent_path(
    pair: PtyPair,
    snapshot: TerminalSnapshot,
    transcript: Option<File>,
    config: &SessionConfig,
) -> Result<RelayStats, SessionError> {
    let master = pair.into_master();

    let input = File::from(io::stdin().as_fd().try_clone_to_owned()?);
    let output = File::from(io::stdout().as_fd().try_clone_to_owned()?);

    let _raw = RawModeGuard::enter(snapshot).map_err(SessionError::RawMode)?;

    let mut relay = Relay::new(input, master, output).debug(config.debug);
    if let Some(file) = transcript {
        relay = relay.with_transcript(file);
    }
    Ok(relay.run()?)
}

/// Create or truncate the transcript file, write-only.
pub fn open_transcript(path: &Path) -> Result<File, SessionError> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o666)
        .open(path)
        .map_err(|e| SessionError::Transcript {
            path: path.to_path_buf(),
            source: e,
        })
}
