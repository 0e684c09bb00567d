//! SIGWINCH monitor.
//!
//! A dedicated thread publishes the starting size, then waits on the
//! window-change signal and, on each delivery, re-resolves the terminal size
//! and publishes it. The subscription exists before the first query and all
//! publishing happens on that one thread, so the starting size can never land
//! after a newer one. The kernel coalesces rapid
//! changes into fewer deliveries; each published value is the current size,
//! never a delta.
//!
//! The thread queries a duplicate of the session's output descriptor. It never
//! changes the mode of, or closes, the session's own descriptors.

use std::os::fd::OwnedFd;
use std::sync::{Arc, mpsc};
use std::thread::{self, JoinHandle};

use signal_hook::consts::signal::SIGWINCH;
use signal_hook::iterator::{Handle, Signals};
use termio_core::winsize::{self, TermDefaults};
use termio_core::{Dimensions, EnvLookup, ResizeSink, Result, TtyError};

use crate::device::query_size;

/// Resolves the size of one descriptor and hands it to the screen.
pub(crate) struct SizePublisher {
    output: OwnedFd,
    env: EnvLookup,
    defaults: TermDefaults,
    sink: Arc<dyn ResizeSink>,
    last: Option<Dimensions>,
}

impl SizePublisher {
    pub(crate) fn new(
        output: OwnedFd,
        env: EnvLookup,
        defaults: TermDefaults,
        sink: Arc<dyn ResizeSink>,
    ) -> Self {
        Self {
            output,
            env,
            defaults,
            sink,
            last: None,
        }
    }

    /// Resolve and publish. Failures are logged and dropped: the screen keeps
    /// its previous size.
    pub(crate) fn publish(&mut self) {
        match winsize::resolve(query_size(&self.output), &self.env, self.defaults) {
            Ok(dims) => {
                let changed = self.last != Some(dims);
                tracing::debug!(size = %dims, changed, "publishing terminal size");
                self.last = Some(dims);
                self.sink.resize(dims);
            }
            Err(err) => tracing::warn!(error = %err, "terminal size unavailable"),
        }
    }
}

/// Running SIGWINCH subscription.
#[derive(Debug)]
pub(crate) struct ResizeMonitor {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl ResizeMonitor {
    /// Subscribe to SIGWINCH and start publishing. Returns once the starting
    /// size has been published (or failed to resolve).
    pub(crate) fn start(mut publisher: SizePublisher) -> Result<Self> {
        let mut signals = Signals::new([SIGWINCH]).map_err(TtyError::Signal)?;
        let handle = signals.handle();
        let (ready_tx, ready_rx) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("termio-sigwinch".into())
            .spawn(move || {
                publisher.publish();
                let _ = ready_tx.send(());
                for _ in signals.forever() {
                    tracing::debug!("SIGWINCH received");
                    publisher.publish();
                }
            })
            .map_err(TtyError::Signal)?;
        if ready_rx.recv().is_err() {
            tracing::warn!("window-change monitor exited before the starting size");
        }
        tracing::debug!("window-change monitor started");
        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }

    /// Unsubscribe and wait for the monitor thread. Nothing is published
    /// after this returns.
    pub(crate) fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("window-change monitor panicked");
            }
            tracing::debug!("window-change monitor stopped");
        }
    }
}

impl Drop for ResizeMonitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use termio_core::LatestSize;

    fn null_publisher(sink: Arc<dyn ResizeSink>) -> SizePublisher {
        let fd = rustix::fs::open(
            "/dev/null",
            rustix::fs::OFlags::WRONLY,
            rustix::fs::Mode::empty(),
        )
        .unwrap();
        SizePublisher::new(fd, EnvLookup::default(), TermDefaults::VT100, sink)
    }

    #[test]
    fn failed_query_publishes_nothing() {
        let latest = Arc::new(LatestSize::new());
        let mut publisher = null_publisher(latest.clone());
        publisher.publish();
        assert_eq!(latest.generation(), 0);
    }

    #[test]
    fn stop_joins_thread_promptly() {
        let latest = Arc::new(LatestSize::new());
        let monitor = ResizeMonitor::start(null_publisher(latest)).unwrap();
        let started = Instant::now();
        monitor.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn start_returns_after_starting_size_is_published() {
        let pair = match portable_pty::native_pty_system().openpty(portable_pty::PtySize {
            rows: 40,
            cols: 100,
            pixel_width: 0,
            pixel_height: 0,
        }) {
            Ok(pair) => pair,
            Err(err) => {
                eprintln!("skipping: no pty available: {err}");
                return;
            }
        };
        let Some(path) = pair.master.tty_name() else {
            eprintln!("skipping: pty slave has no path");
            return;
        };
        let fd = rustix::fs::open(
            &path,
            rustix::fs::OFlags::WRONLY | rustix::fs::OFlags::NOCTTY,
            rustix::fs::Mode::empty(),
        )
        .unwrap();
        let latest = Arc::new(LatestSize::new());
        let publisher =
            SizePublisher::new(fd, EnvLookup::default(), TermDefaults::VT100, latest.clone());

        let monitor = ResizeMonitor::start(publisher).unwrap();
        assert_eq!(latest.peek(), Some(Dimensions::new(100, 40)));
        assert_eq!(latest.generation(), 1);
        monitor.stop();
    }

    #[test]
    fn drop_also_unsubscribes() {
        let latest = Arc::new(LatestSize::new());
        let monitor = ResizeMonitor::start(null_publisher(latest)).unwrap();
        drop(monitor);
    }
}
