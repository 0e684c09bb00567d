#![forbid(unsafe_code)]

//! Session configuration.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use crate::winsize::TermDefaults;

/// Path of the controlling terminal on every supported Unix.
pub const CONTROLLING_TTY: &str = "/dev/tty";

/// Where size overrides (`COLUMNS`, `LINES`) are read from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EnvLookup {
    /// The real process environment.
    #[default]
    Process,
    /// A fixed set of variables. Everything else reads as unset.
    Fixed(HashMap<String, String>),
}

impl EnvLookup {
    /// Build a fixed lookup from `(name, value)` pairs.
    pub fn fixed<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Fixed(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Read a variable. Values that are not valid Unicode come back lossily
    /// converted so they fail integer parsing instead of reading as unset.
    #[must_use]
    pub fn var(&self, key: &str) -> Option<String> {
        match self {
            Self::Process => match env::var(key) {
                Ok(value) => Some(value),
                Err(env::VarError::NotPresent) => None,
                Err(env::VarError::NotUnicode(raw)) => Some(raw.to_string_lossy().into_owned()),
            },
            Self::Fixed(vars) => vars.get(key).cloned(),
        }
    }
}

/// Terminal session configuration.
///
/// # Example
///
/// ```
/// use termio_core::{SessionOptions, TermDefaults};
///
/// let opts = SessionOptions {
///     defaults: TermDefaults::new(100, 30),
///     watch_resize: false,
///     ..Default::default()
/// };
/// assert_eq!(opts.device.to_str(), Some("/dev/tty"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Terminal device opened for input and output.
    pub device: PathBuf,
    /// Terminal-type database fallback for zero-sized axes.
    pub defaults: TermDefaults,
    /// Source of the `COLUMNS` / `LINES` overrides.
    pub env: EnvLookup,
    /// Subscribe to window-change notifications while active.
    pub watch_resize: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            device: PathBuf::from(CONTROLLING_TTY),
            defaults: TermDefaults::default(),
            env: EnvLookup::Process,
            watch_resize: true,
        }
    }
}
