//! Terminal device handle.
//!
//! The device is opened twice: read-only for input and write-only for output.
//! The two descriptors are closed at different times and, on some platforms,
//! in different ways, so they are never shared.
//!
//! Mode changes and size queries go through the *output* descriptor. Some
//! platforms only answer termios requests on the side that is not being
//! polled for input.

use std::fmt;
use std::io;
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};
use std::path::{Path, PathBuf};

use rustix::fs::{self, Mode, OFlags};
use rustix::io::Errno;
use rustix::termios::{self, OptionalActions, Termios};
use termio_core::winsize::{self, TermDefaults};
use termio_core::{Dimensions, EnvLookup, Result, TtyError};

use crate::close::CloseStrategy;

/// ASCII bell.
pub const BEL: u8 = 0x07;

/// Terminal mode captured right before raw mode was entered.
///
/// Restoring consumes it, so a snapshot is applied at most once.
pub struct SavedMode(Termios);

impl fmt::Debug for SavedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SavedMode").finish_non_exhaustive()
    }
}

/// Independent input and output descriptors on one terminal device.
#[derive(Debug)]
pub struct TtyHandle {
    input: OwnedFd,
    output: OwnedFd,
    path: PathBuf,
}

impl TtyHandle {
    /// Open `path` for reading and, separately, for writing.
    ///
    /// If the second open fails the first descriptor is closed before the
    /// error is returned.
    ///
    /// # Errors
    ///
    /// [`TtyError::Open`] if either open fails (for `/dev/tty`, typically
    /// because the process has no controlling terminal).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let (input, output) = open_pair(
            || open_device(path, OFlags::RDONLY),
            || open_device(path, OFlags::WRONLY),
        )
        .map_err(|err| TtyError::open(path, err))?;
        Ok(Self {
            input,
            output,
            path: path.to_path_buf(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn input(&self) -> BorrowedFd<'_> {
        self.input.as_fd()
    }

    #[must_use]
    pub fn output(&self) -> BorrowedFd<'_> {
        self.output.as_fd()
    }

    /// Put the terminal into raw mode: no line buffering, no echo, no
    /// signal-generating control characters.
    ///
    /// # Errors
    ///
    /// [`TtyError::Mode`] if the device is not a terminal or rejects the
    /// change. The terminal is left untouched in that case.
    pub fn enter_raw_mode(&self) -> Result<SavedMode> {
        let saved = termios::tcgetattr(&self.output).map_err(mode_error)?;
        let mut raw = saved.clone();
        raw.make_raw();
        termios::tcsetattr(&self.output, OptionalActions::Now, &raw).map_err(mode_error)?;
        Ok(SavedMode(saved))
    }

    /// Reapply a mode captured by [`enter_raw_mode`](Self::enter_raw_mode).
    ///
    /// # Errors
    ///
    /// [`TtyError::Mode`] if the device rejects the change.
    pub fn restore(&self, saved: SavedMode) -> Result<()> {
        termios::tcsetattr(&self.output, OptionalActions::Now, &saved.0).map_err(mode_error)
    }

    /// Raw size as reported by the device, zeros included.
    ///
    /// # Errors
    ///
    /// The underlying `TIOCGWINSZ` failure.
    pub fn query_size(&self) -> io::Result<Dimensions> {
        query_size(&self.output)
    }

    /// Current size with the `COLUMNS`/`LINES` and database fallbacks applied.
    ///
    /// # Errors
    ///
    /// See [`winsize::resolve`].
    pub fn resolve_size(&self, env: &EnvLookup, defaults: TermDefaults) -> Result<Dimensions> {
        winsize::resolve(self.query_size(), env, defaults)
    }

    /// Write every byte to the output descriptor.
    ///
    /// # Errors
    ///
    /// Any write failure other than `EINTR`.
    pub fn write_all(&self, bytes: &[u8]) -> io::Result<()> {
        write_all(self.output.as_fd(), bytes)
    }

    /// Duplicate the input descriptor for a reader thread.
    pub(crate) fn dup_input(&self) -> io::Result<OwnedFd> {
        self.input.try_clone()
    }

    /// Duplicate the output descriptor for size queries off-thread.
    pub(crate) fn dup_output(&self) -> io::Result<OwnedFd> {
        self.output.try_clone()
    }

    /// Close both descriptors: output first, synchronously, then input
    /// through `strategy`.
    pub fn close<C: CloseStrategy + ?Sized>(self, strategy: &C) {
        let Self { input, output, .. } = self;
        drop(output);
        strategy.close_input(input);
    }
}

/// Query the window size of any terminal descriptor.
///
/// # Errors
///
/// The underlying `TIOCGWINSZ` failure (`ENOTTY` for non-terminals).
pub fn query_size<Fd: AsFd>(fd: Fd) -> io::Result<Dimensions> {
    let ws = termios::tcgetwinsize(fd)?;
    Ok(Dimensions::new(ws.ws_col, ws.ws_row))
}

fn open_device(path: &Path, access: OFlags) -> io::Result<OwnedFd> {
    Ok(fs::open(
        path,
        access | OFlags::NOCTTY | OFlags::CLOEXEC,
        Mode::empty(),
    )?)
}

/// Acquire input, then output. A failed output open drops (closes) the input.
fn open_pair<T>(
    open_input: impl FnOnce() -> io::Result<T>,
    open_output: impl FnOnce() -> io::Result<T>,
) -> io::Result<(T, T)> {
    let input = open_input()?;
    let output = open_output()?;
    Ok((input, output))
}

fn write_all(fd: BorrowedFd<'_>, mut bytes: &[u8]) -> io::Result<()> {
    while !bytes.is_empty() {
        match rustix::io::write(fd, bytes) {
            Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
            Ok(n) => bytes = &bytes[n..],
            Err(Errno::INTR) => {}
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

fn mode_error(err: Errno) -> TtyError {
    TtyError::Mode(err.into())
}
