//! Single-fire shutdown token between the input consumer and the session.
//!
//! The session must not close the input descriptor while something is still
//! blocked reading it. The consumer holds a [`ShutdownNotifier`] and fires it
//! once it has stopped reading; the session holds the matching
//! [`ShutdownSignal`] and waits on it during teardown.
//!
//! # Design
//!
//! Both halves share one `Arc` (a flag guarded by a mutex plus a condvar).
//! The notifier is consumed by [`ShutdownNotifier::fire`], so it can fire at
//! most once. Dropping an unfired notifier fires it too: a consumer that
//! exits early or panics has stopped reading just the same.
//!
//! # Example
//!
//! ```
//! use termio_core::shutdown_channel;
//!
//! let (notifier, signal) = shutdown_channel();
//! let reader = std::thread::spawn(move || {
//!     // ... read until asked to stop ...
//!     notifier.fire();
//! });
//! signal.wait();
//! reader.join().unwrap();
//! ```

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

#[cfg(feature = "tracing")]
use crate::logging::debug;
#[cfg(not(feature = "tracing"))]
use crate::debug;

struct Shared {
    fired: Mutex<bool>,
    cond: Condvar,
}

impl Shared {
    fn fire(&self) {
        let mut fired = self.fired.lock().unwrap_or_else(PoisonError::into_inner);
        if !*fired {
            *fired = true;
            self.cond.notify_all();
        }
    }

    fn is_fired(&self) -> bool {
        *self.fired.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Create a connected notifier/signal pair.
#[must_use]
pub fn shutdown_channel() -> (ShutdownNotifier, ShutdownSignal) {
    let shared = Arc::new(Shared {
        fired: Mutex::new(false),
        cond: Condvar::new(),
    });
    (
        ShutdownNotifier {
            shared: Some(shared.clone()),
        },
        ShutdownSignal { shared },
    )
}

/// Firing half, owned by the input consumer.
pub struct ShutdownNotifier {
    shared: Option<Arc<Shared>>,
}

impl ShutdownNotifier {
    /// Report that reading has stopped.
    pub fn fire(mut self) {
        if let Some(shared) = self.shared.take() {
            debug!("input consumer signalled shutdown");
            shared.fire();
        }
    }
}

impl Drop for ShutdownNotifier {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            shared.fire();
        }
    }
}

impl fmt::Debug for ShutdownNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownNotifier").finish_non_exhaustive()
    }
}

/// Waiting half, owned by the session.
pub struct ShutdownSignal {
    shared: Arc<Shared>,
}

impl ShutdownSignal {
    /// Whether the notifier has fired (or was dropped).
    #[must_use]
    pub fn is_fired(&self) -> bool {
        self.shared.is_fired()
    }

    /// Block until the notifier fires. Unbounded.
    pub fn wait(&self) {
        let mut fired = self
            .shared
            .fired
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while !*fired {
            fired = self
                .shared
                .cond
                .wait(fired)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block until the notifier fires or `timeout` elapses.
    ///
    /// Returns `true` if the signal fired.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut fired = self
            .shared
            .fired
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while !*fired {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = self
                .shared
                .cond
                .wait_timeout(fired, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            fired = guard;
        }
        true
    }
}

impl fmt::Debug for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownSignal")
            .field("fired", &self.is_fired())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn starts_unfired() {
        let (_notifier, signal) = shutdown_channel();
        assert!(!signal.is_fired());
        assert!(!signal.wait_timeout(Duration::from_millis(5)));
    }

    #[test]
    fn fire_releases_waiter() {
        let (notifier, signal) = shutdown_channel();
        notifier.fire();
        assert!(signal.is_fired());
        signal.wait();
    }

    #[test]
    fn drop_counts_as_fire() {
        let (notifier, signal) = shutdown_channel();
        drop(notifier);
        assert!(signal.is_fired());
    }

    #[test]
    fn cross_thread_fire_wakes_wait() {
        let (notifier, signal) = shutdown_channel();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            notifier.fire();
        });
        signal.wait();
        assert!(signal.is_fired());
        handle.join().unwrap();
    }

    #[test]
    fn wait_timeout_sees_late_fire() {
        let (notifier, signal) = shutdown_channel();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(5));
            notifier.fire();
        });
        assert!(signal.wait_timeout(Duration::from_secs(5)));
        handle.join().unwrap();
    }

    #[test]
    fn panicking_consumer_still_fires() {
        let (notifier, signal) = shutdown_channel();
        let handle = thread::spawn(move || {
            let _notifier = notifier;
            panic!("reader crashed");
        });
        assert!(handle.join().is_err());
        assert!(signal.is_fired());
    }

    #[test]
    fn debug_shows_state() {
        let (notifier, signal) = shutdown_channel();
        assert!(format!("{signal:?}").contains("fired: false"));
        notifier.fire();
        assert!(format!("{signal:?}").contains("fired: true"));
    }
}
