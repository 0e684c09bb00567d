#![forbid(unsafe_code)]

//! Native Unix terminal session: device access, raw mode, SIGWINCH, and
//! platform-aware teardown.
//!
//! Start with [`TtySession`]. The lower-level pieces are public for callers
//! that need a different lifecycle.

#[cfg(unix)]
pub mod close;
#[cfg(unix)]
pub mod device;
#[cfg(unix)]
pub mod input;
#[cfg(unix)]
pub mod session;
#[cfg(unix)]
mod signals;

#[cfg(unix)]
pub use close::{CloseStrategy, DetachedClose, PlatformClose, SyncClose};
#[cfg(unix)]
pub use device::{BEL, SavedMode, TtyHandle};
#[cfg(unix)]
pub use input::InputReader;
#[cfg(unix)]
pub use session::TtySession;
