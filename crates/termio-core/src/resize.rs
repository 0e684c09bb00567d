#![forbid(unsafe_code)]

//! Resize publication to the screen collaborator.
//!
//! The session calls [`ResizeSink::resize`] once at startup and again from the
//! window-change monitor thread. Each published value is the current truth,
//! not a delta, and consecutive values may be coalesced.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::geometry::Dimensions;

/// Receiver of new terminal sizes. Values are always non-zero on both axes.
pub trait ResizeSink: Send + Sync {
    fn resize(&self, dims: Dimensions);
}

impl<F> ResizeSink for F
where
    F: Fn(Dimensions) + Send + Sync,
{
    fn resize(&self, dims: Dimensions) {
        self(dims);
    }
}

#[derive(Debug, Default)]
struct Slot {
    latest: Option<Dimensions>,
    generation: u64,
}

/// Last-write-wins mailbox for published sizes.
///
/// If several sizes arrive before the consumer looks, only the newest is
/// observed. The generation counter still tells the consumer how many
/// publications happened.
#[derive(Debug, Default)]
pub struct LatestSize {
    slot: Mutex<Slot>,
}

impl LatestSize {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the pending size, if one was published since the last take.
    pub fn take(&self) -> Option<Dimensions> {
        self.lock().latest.take()
    }

    /// Peek at the pending size without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<Dimensions> {
        self.lock().latest
    }

    /// Number of sizes published so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ResizeSink for LatestSize {
    fn resize(&self, dims: Dimensions) {
        let mut slot = self.lock();
        slot.latest = Some(dims);
        slot.generation += 1;
    }
}
