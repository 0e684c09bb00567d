//! Terminal session lifecycle.
//!
//! [`TtySession`] owns everything a full-screen application borrows from the
//! terminal: the input and output descriptors, the mode that was in effect
//! before raw mode, the SIGWINCH subscription, and the shutdown token shared
//! with whatever reads input.
//!
//! # Lifecycle
//!
//! ```text
//! Closed ──init──▶ Opening ──▶ Active ──fini──▶ Closing ──▶ Closed
//! ```
//!
//! `init` opens the device, enters raw mode, starts the resize monitor and
//! publishes the initial size. Any failure rolls back what was acquired and
//! leaves the session `Closed`.
//!
//! `fini` tears down in a fixed order:
//!
//! 1. Stop the resize monitor, so no resize work runs during teardown.
//! 2. Wait for the input consumer's shutdown signal. This wait is unbounded:
//!    the input descriptor must not be closed under an active reader.
//! 3. Restore the saved mode on the output descriptor. A restore failure is
//!    logged and teardown continues.
//! 4. Close the output descriptor.
//! 5. Close the input descriptor with the platform [`CloseStrategy`].
//!
//! A session is single-use. On macOS the input descriptor may outlive `fini`
//! (see [`crate::close`]), so reopening the terminal from the same process is
//! not guaranteed to work there.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::sync::mpsc;
//! use termio_core::{LatestSize, SessionOptions};
//! use termio_tty::TtySession;
//!
//! let latest = Arc::new(LatestSize::new());
//! let mut session = TtySession::new(SessionOptions::default(), latest.clone());
//! session.init()?;
//!
//! let (tx, rx) = mpsc::channel();
//! session.start_input(tx)?;
//! if let Ok(bytes) = rx.recv() {
//!     if bytes.contains(&b'q') {
//!         session.beep();
//!     }
//! }
//!
//! session.fini();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::io;
use std::os::fd::BorrowedFd;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::Duration;

use termio_core::{
    Dimensions, ResizeSink, Result, SessionOptions, SessionState, ShutdownNotifier,
    ShutdownSignal, TtyError, shutdown_channel,
};

use crate::close::{CloseStrategy, DetachedClose, PlatformClose};
use crate::device::{BEL, SavedMode, TtyHandle};
use crate::input::InputReader;
use crate::signals::{ResizeMonitor, SizePublisher};

/// How long a dropped (not `fini`-ed) session waits for the input consumer.
const DROP_GRACE: Duration = Duration::from_millis(250);

/// Exclusive owner of the terminal while an application is full-screen.
pub struct TtySession<C: CloseStrategy = PlatformClose> {
    options: SessionOptions,
    sink: Arc<dyn ResizeSink>,
    strategy: C,
    state: SessionState,
    spent: bool,
    handle: Option<TtyHandle>,
    saved: Option<SavedMode>,
    monitor: Option<ResizeMonitor>,
    shutdown: Option<ShutdownSignal>,
    notifier: Option<ShutdownNotifier>,
    reader: Option<InputReader>,
}

impl TtySession<PlatformClose> {
    /// Create a closed session using the platform close strategy.
    #[must_use]
    pub fn new(options: SessionOptions, sink: Arc<dyn ResizeSink>) -> Self {
        Self::with_close_strategy(options, sink, PlatformClose::default())
    }
}

impl<C: CloseStrategy> TtySession<C> {
    /// Create a closed session with an explicit close strategy.
    #[must_use]
    pub fn with_close_strategy(
        options: SessionOptions,
        sink: Arc<dyn ResizeSink>,
        strategy: C,
    ) -> Self {
        Self {
            options,
            sink,
            strategy,
            state: SessionState::Closed,
            spent: false,
            handle: None,
            saved: None,
            monitor: None,
            shutdown: None,
            notifier: None,
            reader: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    #[must_use]
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Take over the terminal.
    ///
    /// Calling `init` on an active session does nothing.
    ///
    /// # Errors
    ///
    /// - [`TtyError::Open`]: the device could not be opened.
    /// - [`TtyError::Mode`]: raw mode was rejected.
    /// - [`TtyError::Signal`]: the window-change subscription failed.
    /// - [`TtyError::SessionSpent`]: the session already ran `fini`.
    ///
    /// On error the session is `Closed` and holds no descriptors.
    pub fn init(&mut self) -> Result<()> {
        if self.spent {
            return Err(TtyError::SessionSpent);
        }
        if self.state != SessionState::Closed {
            return Ok(());
        }

        self.transition(SessionState::Opening);
        if let Err(err) = self.open() {
            tracing::warn!(device = %self.options.device.display(), error = %err, "terminal init failed");
            self.transition(SessionState::Closed);
            return Err(err);
        }
        self.transition(SessionState::Active);
        tracing::info!(
            device = %self.options.device.display(),
            close = self.strategy.name(),
            "terminal session active"
        );

        // The monitor publishes the starting size itself, ahead of any resize.
        if self.monitor.is_none() {
            self.publish_initial_size();
        }
        Ok(())
    }

    /// Acquire in order, releasing everything already held on failure.
    fn open(&mut self) -> Result<()> {
        let handle = TtyHandle::open(&self.options.device)?;
        let saved = handle.enter_raw_mode()?;
        tracing::info!("terminal raw mode enabled");

        let monitor = if self.options.watch_resize {
            match self.start_monitor(&handle) {
                Ok(monitor) => Some(monitor),
                Err(err) => {
                    if let Err(restore_err) = handle.restore(saved) {
                        tracing::warn!(error = %restore_err, "mode restore after failed init");
                    }
                    return Err(err);
                }
            }
        } else {
            None
        };

        let (notifier, shutdown) = shutdown_channel();
        self.handle = Some(handle);
        self.saved = Some(saved);
        self.monitor = monitor;
        self.notifier = Some(notifier);
        self.shutdown = Some(shutdown);
        Ok(())
    }

    fn start_monitor(&self, handle: &TtyHandle) -> Result<ResizeMonitor> {
        let output = handle.dup_output().map_err(TtyError::Signal)?;
        ResizeMonitor::start(SizePublisher::new(
            output,
            self.options.env.clone(),
            self.options.defaults,
            self.sink.clone(),
        ))
    }

    /// A failed or degenerate first query is not fatal: the screen keeps its
    /// default size until the next window change.
    fn publish_initial_size(&self) {
        let Some(handle) = &self.handle else {
            return;
        };
        match handle.resolve_size(&self.options.env, self.options.defaults) {
            Ok(dims) if !dims.is_degenerate() => {
                tracing::debug!(size = %dims, "initial terminal size");
                self.sink.resize(dims);
            }
            Ok(dims) => tracing::debug!(size = %dims, "degenerate initial size skipped"),
            Err(err) => tracing::warn!(error = %err, "initial terminal size unavailable"),
        }
    }

    /// The session's own input descriptor, for an external consumer.
    ///
    /// Whoever reads it must hold the token from
    /// [`take_shutdown_notifier`](Self::take_shutdown_notifier) and fire it
    /// once reading has stopped; `fini` hands this descriptor to the close
    /// strategy only after that. `None` when the session is not active.
    #[must_use]
    pub fn input(&self) -> Option<BorrowedFd<'_>> {
        self.active_handle().map(TtyHandle::input)
    }

    /// Hand the shutdown token to an external input consumer.
    ///
    /// The consumer must fire (or drop) it once it stops reading; `fini`
    /// blocks until then. Returns `None` when the session is not active or the
    /// token was already claimed. If nobody claims it, `fini` does not wait.
    pub fn take_shutdown_notifier(&mut self) -> Option<ShutdownNotifier> {
        if !self.is_active() {
            return None;
        }
        self.notifier.take()
    }

    /// Start the built-in input reader, forwarding raw bytes to `tx`.
    ///
    /// The reader owns the shutdown token; `fini` asks it to stop and waits
    /// for it. It reads a duplicate of the input descriptor and closes that
    /// duplicate itself on exit; the close strategy only ever sees the
    /// session's own descriptor.
    ///
    /// # Errors
    ///
    /// `NotConnected` when the session is not active, `AlreadyExists` when the
    /// shutdown token was already claimed, or the descriptor/thread failure.
    pub fn start_input(&mut self, tx: Sender<Vec<u8>>) -> io::Result<()> {
        let Some(handle) = self.handle.as_ref().filter(|_| self.state.is_active()) else {
            return Err(not_active());
        };
        if self.notifier.is_none() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "input consumer already attached",
            ));
        }
        let input = handle.dup_input()?;
        let Some(notifier) = self.notifier.take() else {
            return Err(not_active());
        };
        self.reader = Some(InputReader::spawn(input, tx, notifier)?);
        tracing::debug!("input reader started");
        Ok(())
    }

    /// Current size with fallbacks applied.
    ///
    /// # Errors
    ///
    /// [`TtyError::Query`] when inactive or the device query fails;
    /// [`TtyError::InvalidEnvValue`] for a malformed override.
    pub fn size(&self) -> Result<Dimensions> {
        match self.active_handle() {
            Some(handle) => handle.resolve_size(&self.options.env, self.options.defaults),
            None => Err(TtyError::Query(not_active())),
        }
    }

    /// Write bytes to the terminal.
    ///
    /// # Errors
    ///
    /// `NotConnected` when the session is not active, otherwise the write
    /// failure.
    pub fn write_all(&self, bytes: &[u8]) -> io::Result<()> {
        match self.active_handle() {
            Some(handle) => handle.write_all(bytes),
            None => Err(not_active()),
        }
    }

    /// Ring the terminal bell. Best-effort; does nothing when inactive.
    pub fn beep(&self) {
        if let Err(err) = self.write_all(&[BEL]) {
            tracing::trace!(error = %err, "beep dropped");
        }
    }

    /// Release the terminal.
    ///
    /// Blocks until the input consumer has signalled shutdown. Never fails:
    /// a mode-restore error is logged and the descriptors are closed anyway.
    /// Tolerates sessions that never became active.
    pub fn fini(&mut self) {
        if !self.is_active() {
            tracing::debug!(state = %self.state, "fini on inactive session ignored");
            return;
        }
        self.teardown(None);
    }

    fn teardown(&mut self, grace: Option<Duration>) {
        self.transition(SessionState::Closing);

        if let Some(monitor) = self.monitor.take() {
            monitor.stop();
        }

        if let Some(reader) = &self.reader {
            reader.request_stop();
        }
        // Unclaimed token: nothing is reading.
        drop(self.notifier.take());

        let drained = match (self.shutdown.take(), grace) {
            (None, _) => true,
            (Some(signal), None) => {
                signal.wait();
                true
            }
            (Some(signal), Some(grace)) => signal.wait_timeout(grace),
        };

        if drained {
            if let Some(reader) = self.reader.take() {
                reader.join();
            }
            release(self.handle.take(), self.saved.take(), &self.strategy);
        } else {
            tracing::warn!("input consumer still reading, input close detached");
            release(self.handle.take(), self.saved.take(), &DetachedClose);
        }

        self.transition(SessionState::Closed);
        self.spent = true;
        tracing::info!("terminal session closed");
    }

    fn active_handle(&self) -> Option<&TtyHandle> {
        self.handle.as_ref().filter(|_| self.state.is_active())
    }

    fn transition(&mut self, next: SessionState) {
        debug_assert!(
            self.state.can_transition(next),
            "illegal session transition {} -> {}",
            self.state,
            next
        );
        tracing::trace!(from = %self.state, to = %next, "session transition");
        self.state = next;
    }
}

impl<C: CloseStrategy> Drop for TtySession<C> {
    fn drop(&mut self) {
        if self.is_active() {
            self.teardown(Some(DROP_GRACE));
        }
    }
}

impl<C: CloseStrategy> std::fmt::Debug for TtySession<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtySession")
            .field("device", &self.options.device)
            .field("state", &self.state)
            .field("close", &self.strategy.name())
            .field("spent", &self.spent)
            .finish_non_exhaustive()
    }
}

/// Restore the saved mode when there is one, then close both descriptors.
fn release<S: CloseStrategy + ?Sized>(
    handle: Option<TtyHandle>,
    saved: Option<SavedMode>,
    strategy: &S,
) {
    let Some(handle) = handle else {
        return;
    };
    if let Some(saved) = saved {
        match handle.restore(saved) {
            Ok(()) => tracing::info!("terminal mode restored"),
            Err(err) => tracing::warn!(error = %err, "terminal mode restore failed"),
        }
    }
    handle.close(strategy);
}

fn not_active() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "terminal session is not active")
}
