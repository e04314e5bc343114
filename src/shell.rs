//! Child side of the split: bind the PTY slave and exec the shell.
//!
//! Everything the child needs is built by [`ShellCommand::new`] in the parent
//! before `fork(2)`, so [`exec_shell`] only issues system calls.

use std::ffi::{CString, OsStr};
use std::fs::File;
use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::ffi::OsStrExt;

use crate::config::{ConfigError, SessionConfig};
use crate::error::EXIT_EXEC;

/// Flag that makes the shell interactive.
const INTERACTIVE_FLAG: &str = "-i";

/// A fully prepared `execve(2)` call.
pub struct ShellCommand {
    program: CString,
    argv: Vec<CString>,
    envp: Vec<CString>,
    working_dir: Option<CString>,
    // Point into the CStrings above, whose heap buffers never move.
    argv_ptrs: Vec<*const libc::c_char>,
    envp_ptrs: Vec<*const libc::c_char>,
}

impl ShellCommand {
    /// Build the exec arguments from the session config and the current
    /// environment, with `TERM` replaced when the config sets one.
    pub fn new(config: &SessionConfig) -> Result<Self, ConfigError> {
        Self::with_env(config, std::env::vars_os())
    }

    fn with_env<I, K, V>(config: &SessionConfig, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        let program = c_string(config.shell.as_os_str(), "shell path")?;
        let argv = vec![program.clone(), c_string(OsStr::new(INTERACTIVE_FLAG), "argv")?];

        let mut envp = Vec::new();
        for (key, value) in vars {
            let (key, value) = (key.as_ref(), value.as_ref());
            if config.term.is_some() && key == "TERM" {
                continue;
            }
            envp.push(env_entry(key, value)?);
        }
        if let Some(term) = &config.term {
            envp.push(env_entry(OsStr::new("TERM"), OsStr::new(term))?);
        }

        let working_dir = config
            .working_dir
            .as_deref()
            .map(|dir| c_string(dir.as_os_str(), "working directory"))
            .transpose()?;

        let argv_ptrs = null_terminated(&argv);
        let envp_ptrs = null_terminated(&envp);

        Ok(Self {
            program,
            argv,
            envp,
            working_dir,
            argv_ptrs,
            envp_ptrs,
        })
    }

    pub fn program(&self) -> &CString {
        &self.program
    }

    pub fn argv(&self) -> &[CString] {
        &self.argv
    }

    pub fn envp(&self) -> &[CString] {
        &self.envp
    }
}

fn c_string(value: &OsStr, what: &'static str) -> Result<CString, ConfigError> {
    CString::new(value.as_bytes())
        .map_err(|_| ConfigError::Args(format!("{what} contains a NUL byte")))
}

fn env_entry(key: &OsStr, value: &OsStr) -> Result<CString, ConfigError> {
    let mut entry = Vec::with_capacity(key.len() + value.len() + 1);
    entry.extend_from_slice(key.as_bytes());
    entry.push(b'=');
    entry.extend_from_slice(value.as_bytes());
    CString::new(entry).map_err(|_| ConfigError::Args("environment contains a NUL byte".into()))
}

fn null_terminated(strings: &[CString]) -> Vec<*const libc::c_char> {
    strings
        .iter()
        .map(|s| s.as_ptr())
        .chain(std::iter::once(std::ptr::null()))
        .collect()
}

/// Write raw bytes to stderr without allocating. Errors are ignored.
fn write_stderr(parts: &[&[u8]]) {
    for part in parts {
        unsafe { libc::write(libc::STDERR_FILENO, part.as_ptr().cast(), part.len()) };
    }
}

/// Point stdin, stdout and stderr at `fd`, all inheritable across exec.
///
/// `dup2` onto itself is a no-op that keeps the close-on-exec flag, so a
/// descriptor that already is 0, 1 or 2 has the flag cleared explicitly.
pub(crate) fn bind_standard_streams(fd: RawFd) -> io::Result<()> {
    for target in [libc::STDIN_FILENO, libc::STDOUT_FILENO, libc::STDERR_FILENO] {
        if fd == target {
            clear_cloexec(fd)?;
        } else if unsafe { libc::dup2(fd, target) } == -1 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

fn clear_cloexec(fd: RawFd) -> io::Result<()> {
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFD) };
    if flags == -1 || unsafe { libc::fcntl(fd, libc::F_SETFD, flags & !libc::FD_CLOEXEC) } == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Turn the current (child) process into the shell.
///
/// Starts a new session so the shell leads its own process group, makes the
/// slave its controlling terminal, points stdin, stdout and stderr at the
/// slave, and execs. Never returns: on exec failure the process exits with
/// status 127.
pub fn exec_shell(slave: File, command: &ShellCommand) -> ! {
    unsafe {
        if libc::setsid() == -1 {
            libc::setpgid(0, 0);
        }
        // Best-effort; job control in the shell needs it, I/O does not.
        libc::ioctl(slave.as_raw_fd(), libc::TIOCSCTTY as _, 0);
    }
    if bind_standard_streams(slave.as_raw_fd()).is_err() {
        unsafe { libc::_exit(EXIT_EXEC) };
    }
    if slave.as_raw_fd() > libc::STDERR_FILENO {
        drop(slave);
    } else {
        std::mem::forget(slave);
    }

    if let Some(dir) = &command.working_dir {
        if unsafe { libc::chdir(dir.as_ptr()) } == -1 {
            write_stderr(&[b"ptyscript: cannot chdir to ", dir.as_bytes(), b"\r\n"]);
        }
    }

    unsafe {
        libc::execve(
            command.program.as_ptr(),
            command.argv_ptrs.as_ptr(),
            command.envp_ptrs.as_ptr(),
        );
    }
    write_stderr(&[
        b"ptyscript: cannot execute ",
        command.program.as_bytes(),
        b"\r\n",
    ]);
    unsafe { libc::_exit(EXIT_EXEC) }
}
