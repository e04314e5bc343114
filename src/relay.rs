//! Parent side of the split: shuttle bytes between the controlling terminal
//! and the PTY master.
//!
//! The loop waits on two descriptors with no timeout. Terminal input goes to
//! the master unchanged; master output goes to the transcript (if any) and then
//! to our own stdout. It ends when the master reports end-of-stream.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, RawFd};

/// Bytes moved per read, the size of stdio's `BUFSIZ` on glibc.
pub const BUFFER_SIZE: usize = 8192;

/// Relay failures. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("waiting for input: {0}")]
    Wait(io::Error),

    #[error("reading terminal input: {0}")]
    ReadInput(io::Error),

    #[error("writing to pty master: {0}")]
    WriteMaster(io::Error),

    #[error("reading pty master: {0}")]
    ReadMaster(io::Error),

    #[error("writing output: {0}")]
    WriteOutput(io::Error),

    #[error("writing transcript: {0}")]
    WriteTranscript(io::Error),
}

/// Byte counts of a finished relay.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelayStats {
    /// Terminal input forwarded to the shell.
    pub bytes_in: u64,
    /// Shell output copied to stdout.
    pub bytes_out: u64,
    /// Whether terminal input reached end-of-file.
    pub input_closed: bool,
}

/// The two-source relay loop.
pub struct Relay<I, O> {
    input: I,
    master: File,
    output: O,
    transcript: Option<File>,
    debug: bool,
    stats: RelayStats,
}

impl<I, O> Relay<I, O>
where
    I: Read + AsRawFd,
    O: Write,
{
    pub fn new(input: I, master: File, output: O) -> Self {
        Self {
            input,
            master,
            output,
            transcript: None,
            debug: false,
            stats: RelayStats::default(),
        }
    }

    /// Copy everything the shell prints into `file` as well.
    pub fn with_transcript(mut self, file: File) -> Self {
        self.transcript = Some(file);
        self
    }

    /// Dump every relayed chunk as hex on stderr.
    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    /// Run until the shell side closes or an I/O error occurs.
    pub fn run(&mut self) -> Result<RelayStats, RelayError> {
        let mut buf = [0u8; BUFFER_SIZE];
        let mut fds = [
            poll_fd(self.input.as_raw_fd()),
            poll_fd(self.master.as_raw_fd()),
        ];

        loop {
            let rc = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, -1) };
            if rc == -1 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(RelayError::Wait(err));
            }

            if ready(&fds[0])? && !self.forward_input(&mut buf)? {
                // poll(2) skips negative descriptors.
                fds[0].fd = -1;
            }

            if ready(&fds[1])? && !self.forward_output(&mut buf)? {
                log::debug!(
                    "relay finished: {} bytes in, {} bytes out",
                    self.stats.bytes_in,
                    self.stats.bytes_out
                );
                return Ok(self.stats);
            }
        }
    }

    /// Terminal to master. Returns false once input is exhausted.
    fn forward_input(&mut self, buf: &mut [u8]) -> Result<bool, RelayError> {
        let n = match self.input.read(buf) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => return Ok(true),
            Err(e) => return Err(RelayError::ReadInput(e)),
        };
        if n == 0 {
            log::debug!("terminal input closed");
            self.stats.input_closed = true;
            return Ok(false);
        }
        if self.debug {
            eprint!("{}\r\n", hex_dump("> stdin -> pty", &buf[..n]));
        }

        self.master
            .write_all(&buf[..n])
            .map_err(RelayError::WriteMaster)?;
        self.stats.bytes_in += n as u64;
        Ok(true)
    }

    /// Master to transcript and stdout. Returns false at end-of-stream.
    fn forward_output(&mut self, buf: &mut [u8]) -> Result<bool, RelayError> {
        let n = match self.master.read(buf) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => return Ok(true),
            // Linux reports a closed slave as EIO rather than a zero read.
            Err(e) if e.raw_os_error() == Some(libc::EIO) => 0,
            Err(e) => return Err(RelayError::ReadMaster(e)),
        };
        if n == 0 {
            return Ok(false);
        }
        if self.debug {
            eprint!("{}\r\n", hex_dump("< stdout <- pty", &buf[..n]));
        }

        if let Some(transcript) = self.transcript.as_mut() {
            transcript
                .write_all(&buf[..n])
                .map_err(RelayError::WriteTranscript)?;
        }
        self.output
            .write_all(&buf[..n])
            .map_err(RelayError::WriteOutput)?;
        self.output.flush().map_err(RelayError::WriteOutput)?;
        self.stats.bytes_out += n as u64;
        Ok(true)
    }
}

fn poll_fd(fd: RawFd) -> libc::pollfd {
    libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    }
}

/// Whether a polled descriptor has something to read (data, hangup or error;
/// the following read reports which).
fn ready(fd: &libc::pollfd) -> Result<bool, RelayError> {
    if fd.revents & libc::POLLNVAL != 0 {
        return Err(RelayError::Wait(io::Error::from_raw_os_error(libc::EBADF)));
    }
    Ok(fd.revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR) != 0)
}

/// Format one relayed chunk as `<label>: num read:<n> <hex bytes>`.
pub fn hex_dump(label: &str, bytes: &[u8]) -> String {
    let mut line = format!("{}: num read:{}", label, bytes.len());
    for b in bytes {
        let _ = write!(line, " {:02x}", b);
    }
    line
}
