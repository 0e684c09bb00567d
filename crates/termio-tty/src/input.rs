//! Input reader thread.
//!
//! Reads raw bytes from a duplicate of the session's input descriptor and
//! forwards them over a channel. The reader never blocks indefinitely in
//! `read`: it polls with a short timeout and checks its stop flag between
//! polls, so teardown works even where closing a descriptor does not wake a
//! blocked reader.
//!
//! When the loop exits (stop request, EOF, hangup, receiver gone, or an I/O
//! error) the reader closes its descriptor and fires its [`ShutdownNotifier`],
//! telling the session the input is no longer being read.

use std::io;
use std::os::fd::{AsFd, OwnedFd};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use termio_core::ShutdownNotifier;

/// Upper bound on how long a stop request goes unnoticed.
const POLL_INTERVAL_MS: u16 = 50;

const READ_CHUNK: usize = 1024;

/// Handle to a running input reader.
#[derive(Debug)]
pub struct InputReader {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl InputReader {
    /// Spawn a reader on `input`, forwarding bytes to `tx`.
    ///
    /// # Errors
    ///
    /// The thread could not be spawned. `notifier` has fired in that case.
    pub fn spawn(
        input: OwnedFd,
        tx: Sender<Vec<u8>>,
        notifier: ShutdownNotifier,
    ) -> io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        let thread = thread::Builder::new()
            .name("termio-input".into())
            .spawn(move || {
                read_loop(&input, &tx, &flag);
                drop(input);
                notifier.fire();
            })?;
        Ok(Self {
            stop,
            thread: Some(thread),
        })
    }

    /// Ask the reader to stop at its next poll boundary.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Whether the reader thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Stop the reader and wait for it to exit.
    pub fn join(mut self) {
        self.request_stop();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("input reader panicked");
            }
        }
    }
}

impl Drop for InputReader {
    fn drop(&mut self) {
        // Not joined: a reader stuck in the kernel must not hang the owner.
        self.request_stop();
    }
}

fn read_loop(input: &OwnedFd, tx: &Sender<Vec<u8>>, stop: &AtomicBool) {
    let mut buf = [0u8; READ_CHUNK];
    while !stop.load(Ordering::Acquire) {
        let revents = {
            let mut fds = [PollFd::new(input.as_fd(), PollFlags::POLLIN)];
            match poll(&mut fds, PollTimeout::from(POLL_INTERVAL_MS)) {
                Ok(0) => continue,
                Ok(_) => fds[0].revents().unwrap_or(PollFlags::empty()),
                Err(Errno::EINTR) => continue,
                Err(err) => {
                    tracing::warn!(error = %err, "input poll failed");
                    break;
                }
            }
        };
        if revents.intersects(PollFlags::POLLERR | PollFlags::POLLNVAL) {
            tracing::debug!(?revents, "input descriptor unusable");
            break;
        }
        match rustix::io::read(input, &mut buf[..]) {
            Ok(0) => {
                tracing::debug!("input reached end of file");
                break;
            }
            Ok(n) => {
                if tx.send(buf[..n].to_vec()).is_err() {
                    break;
                }
            }
            Err(rustix::io::Errno::INTR | rustix::io::Errno::AGAIN) => {}
            Err(err) => {
                tracing::debug!(error = %err, "input read failed");
                break;
            }
        }
    }
    tracing::debug!("input reader exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::net::UnixStream;
    use std::sync::mpsc;
    use std::time::Duration;
    use termio_core::shutdown_channel;

    #[test]
    fn forwards_bytes_and_fires_on_stop() {
        let (ours, mut peer) = UnixStream::pair().unwrap();
        let (tx, rx) = mpsc::channel();
        let (notifier, signal) = shutdown_channel();
        let reader = InputReader::spawn(OwnedFd::from(ours), tx, notifier).unwrap();

        peer.write_all(b"hello").unwrap();
        let mut got = Vec::new();
        while got.len() < 5 {
            got.extend(rx.recv_timeout(Duration::from_secs(5)).unwrap());
        }
        assert_eq!(got, b"hello");
        assert!(!signal.is_fired());

        reader.request_stop();
        assert!(signal.wait_timeout(Duration::from_secs(5)));
        reader.join();
    }

    #[test]
    fn eof_ends_reader() {
        let (ours, peer) = UnixStream::pair().unwrap();
        let (tx, _rx) = mpsc::channel();
        let (notifier, signal) = shutdown_channel();
        let reader = InputReader::spawn(OwnedFd::from(ours), tx, notifier).unwrap();

        drop(peer);
        assert!(signal.wait_timeout(Duration::from_secs(5)));
        reader.join();
    }

    #[test]
    fn dropped_receiver_ends_reader() {
        let (ours, mut peer) = UnixStream::pair().unwrap();
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let (notifier, signal) = shutdown_channel();
        let reader = InputReader::spawn(OwnedFd::from(ours), tx, notifier).unwrap();

        peer.write_all(b"x").unwrap();
        assert!(signal.wait_timeout(Duration::from_secs(5)));
        reader.join();
    }
}
