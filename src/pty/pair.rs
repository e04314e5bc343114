//! Master/slave pseudo-terminal allocation.

use std::ffi::{CStr, OsStr};
use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::AsRawFd;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use super::error::PtyError;
use super::size::{set_window_size, PtySize};

/// Pseudo-terminal multiplexor device.
const PTMX: &str = "/dev/ptmx";

/// An allocated pseudo-terminal.
///
/// Both ends are opened close-on-exec; the child re-binds the slave to its
/// standard streams with `dup2`, which clears that flag on the copies.
#[derive(Debug)]
pub struct PtyPair {
    pub master: File,
    pub slave: File,
    pub slave_name: PathBuf,
}

impl PtyPair {
    /// Open a new master/slave pair with the given initial geometry.
    ///
    /// Opening the master, granting and unlocking the slave, and opening the
    /// slave are fatal steps. Line discipline setup and the window size are
    /// best-effort: failures are reported on stderr and the pair is returned anyway.
    pub fn open(size: PtySize) -> Result<Self, PtyError> {
        let master = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(PTMX)
            .map_err(PtyError::OpenMaster)?;

        // From here on an early return drops `master`, closing it.
        if unsafe { libc::grantpt(master.as_raw_fd()) } == -1 {
            return Err(PtyError::Grant(io::Error::last_os_error()));
        }
        if unsafe { libc::unlockpt(master.as_raw_fd()) } == -1 {
            return Err(PtyError::Unlock(io::Error::last_os_error()));
        }

        let slave_name = slave_name(&master).map_err(PtyError::SlaveName)?;
        log::debug!("slave device: {}", slave_name.display());

        let slave = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(&slave_name)
            .map_err(|e| PtyError::OpenSlave {
                path: slave_name.clone(),
                source: e,
            })?;

        let step = format!("line discipline setup on {}", slave_name.display());
        best_effort(&step, attach_line_discipline(&slave));
        best_effort("slavefd.ioctl(TIOCSWINSZ)", set_window_size(&slave, size));

        Ok(Self {
            master,
            slave,
            slave_name,
        })
    }

    /// Consume the pair, keeping only the master (parent side).
    pub fn into_master(self) -> File {
        self.master
    }

    /// Consume the pair, keeping only the slave (child side).
    pub fn into_slave(self) -> File {
        self.slave
    }
}

/// Report a failed best-effort step on stderr and carry on.
///
/// Returns the printed warning so callers and tests can see what was said.
fn best_effort(step: &str, result: io::Result<()>) -> Option<String> {
    let e = result.err()?;
    let warning = format!("{}: {}", step, e);
    eprintln!("Warning: {}", warning);
    Some(warning)
}

/// Open a pseudo-terminal pair. See [`PtyPair::open`].
pub fn open_pair(size: PtySize) -> Result<PtyPair, PtyError> {
    PtyPair::open(size)
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn slave_name(master: &File) -> io::Result<PathBuf> {
    let mut buf = [0 as libc::c_char; 128];
    let rc = unsafe { libc::ptsname_r(master.as_raw_fd(), buf.as_mut_ptr(), buf.len()) };
    if rc != 0 {
        return Err(io::Error::from_raw_os_error(rc));
    }
    let name = unsafe { CStr::from_ptr(buf.as_ptr()) };
    Ok(Path::new(OsStr::from_bytes(name.to_bytes())).to_path_buf())
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn slave_name(master: &File) -> io::Result<PathBuf> {
    // ptsname uses a static buffer; copied out before anything else can call it.
    let ptr = unsafe { libc::ptsname(master.as_raw_fd()) };
    if ptr.is_null() {
        return Err(io::Error::last_os_error());
    }
    let name = unsafe { CStr::from_ptr(ptr) };
    Ok(Path::new(OsStr::from_bytes(name.to_bytes())).to_path_buf())
}

/// Push the terminal emulation and line discipline modules onto the slave.
///
/// Fails harmlessly when the stream already carries them, e.g. when the
/// program itself runs under a pseudo-terminal.
#[cfg(any(target_os = "solaris", target_os = "illumos"))]
fn attach_line_discipline(slave: &File) -> io::Result<()> {
    // <sys/stropts.h>: I_PUSH = ('S' << 8) | 02
    const I_PUSH: libc::c_int = ((b'S' as libc::c_int) << 8) | 0o2;

    let mut result = Ok(());
    for module in [c"ptem", c"ldterm"] {
        if unsafe { libc::ioctl(slave.as_raw_fd(), I_PUSH, module.as_ptr()) } == -1 {
            let err = io::Error::last_os_error();
            eprintln!("Warning: slavefd.ioctl({:?}): {}", module, err);
            result = Err(err);
        }
    }
    result
}

/// Without STREAMS the kernel attaches the tty line discipline on open; only
/// verify that the slave really is a terminal.
#[cfg(not(any(target_os = "solaris", target_os = "illumos")))]
fn attach_line_discipline(slave: &File) -> io::Result<()> {
    if unsafe { libc::isatty(slave.as_raw_fd()) } == 1 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}
