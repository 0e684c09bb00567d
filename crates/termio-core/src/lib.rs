#![forbid(unsafe_code)]

//! Core: size resolution, shutdown signalling, resize publication, and the
//! session lifecycle model shared by the native tty backend.

pub mod config;
pub mod error;
pub mod geometry;
pub mod lifecycle;
pub mod logging;
pub mod resize;
pub mod shutdown;
pub mod winsize;

pub use config::{EnvLookup, SessionOptions};
pub use error::{ErrorKind, Result, TtyError};
pub use geometry::Dimensions;
pub use lifecycle::SessionState;
pub use resize::{LatestSize, ResizeSink};
pub use shutdown::{ShutdownNotifier, ShutdownSignal, shutdown_channel};
pub use winsize::TermDefaults;
