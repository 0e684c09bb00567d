//! Platform close strategies for the input descriptor.
//!
//! On most Unix systems, closing a descriptor wakes any thread blocked reading
//! it, so the input side can be closed inline ([`SyncClose`]).
//!
//! The macOS tty driver does not wake blocked `read`/`poll` callers when the
//! descriptor is closed. There the close is issued from a detached thread
//! ([`DetachedClose`]); if some reader is stuck forever, that thread and the
//! descriptor may leak until the process exits. This is an accepted cost: the
//! alternative is a teardown that can hang. Sessions are single-use on that
//! platform for the same reason.
//!
//! The strategy is picked at compile time through [`PlatformClose`]. Both
//! implementations are built on every Unix so either can be exercised.

use std::fmt::Debug;
use std::os::fd::OwnedFd;
use std::thread;

/// How the input descriptor of a terminal session is closed.
pub trait CloseStrategy: Debug + Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Close `input`. Must not block on readers of the descriptor.
    fn close_input(&self, input: OwnedFd);
}

/// Ordinary close on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncClose;

impl CloseStrategy for SyncClose {
    fn name(&self) -> &'static str {
        "sync"
    }

    fn close_input(&self, input: OwnedFd) {
        drop(input);
    }
}

/// Best-effort close on a detached thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedClose;

impl CloseStrategy for DetachedClose {
    fn name(&self) -> &'static str {
        "detached"
    }

    fn close_input(&self, input: OwnedFd) {
        let spawned = thread::Builder::new()
            .name("termio-close".into())
            .spawn(move || drop(input));
        if let Err(err) = spawned {
            // The closure, and with it the descriptor, was already dropped here.
            tracing::warn!(error = %err, "detached close unavailable, closed inline");
        }
    }
}

/// Close strategy for the build target.
#[cfg(target_os = "macos")]
pub type PlatformClose = DetachedClose;

/// Close strategy for the build target.
#[cfg(not(target_os = "macos"))]
pub type PlatformClose = SyncClose;
