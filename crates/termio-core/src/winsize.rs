#![forbid(unsafe_code)]

//! Window size resolution.
//!
//! Terminals sometimes report a 0x0 size (output redirected through a pipe,
//! some virtual consoles, freshly spawned ptys). Each axis is resolved on its
//! own, in strict order:
//!
//! 1. the value reported by the device, when non-zero;
//! 2. the `COLUMNS` / `LINES` environment override, when set and non-empty;
//! 3. the terminal-type database default.
//!
//! A failed device query is an error, distinct from a legitimate zero report.
//! An override that is present but not an integer is an error too; it is
//! never silently skipped.

use std::io;

use crate::config::EnvLookup;
use crate::error::{Result, TtyError};
use crate::geometry::Dimensions;

#[cfg(feature = "tracing")]
use crate::logging::trace;
#[cfg(not(feature = "tracing"))]
use crate::trace;

/// Environment variable overriding a zero column count.
pub const COLUMNS_VAR: &str = "COLUMNS";

/// Environment variable overriding a zero row count.
pub const LINES_VAR: &str = "LINES";

/// Fallback size supplied by the terminal-type database.
///
/// The database itself lives outside this crate; callers copy its
/// `cols`/`lines` capabilities in here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermDefaults {
    pub columns: u16,
    pub lines: u16,
}

impl TermDefaults {
    /// Classic VT100 geometry, used when the database has nothing better.
    pub const VT100: Self = Self {
        columns: 80,
        lines: 24,
    };

    #[must_use]
    pub const fn new(columns: u16, lines: u16) -> Self {
        Self { columns, lines }
    }

    /// Database default for the column axis, never zero.
    #[must_use]
    pub const fn columns_or_vt100(&self) -> u16 {
        if self.columns == 0 {
            Self::VT100.columns
        } else {
            self.columns
        }
    }

    /// Database default for the row axis, never zero.
    #[must_use]
    pub const fn lines_or_vt100(&self) -> u16 {
        if self.lines == 0 {
            Self::VT100.lines
        } else {
            self.lines
        }
    }
}

impl Default for TermDefaults {
    fn default() -> Self {
        Self::VT100
    }
}

/// Resolve the terminal size from a device report.
///
/// `reported` is the raw result of the device query. The returned
/// [`Dimensions`] never has a zero component.
///
/// An override must be a plain run of ASCII digits. Values above
/// `u16::MAX` saturate; a sign or surrounding whitespace makes it invalid.
///
/// # Errors
///
/// [`TtyError::Query`] when the device query failed, and
/// [`TtyError::InvalidEnvValue`] when an override consulted for a zero axis
/// does not parse.
pub fn resolve(
    reported: io::Result<Dimensions>,
    env: &EnvLookup,
    defaults: TermDefaults,
) -> Result<Dimensions> {
    let reported = reported.map_err(TtyError::Query)?;

    let columns = resolve_axis(
        reported.columns,
        COLUMNS_VAR,
        env,
        defaults.columns_or_vt100(),
    )?;
    let rows = resolve_axis(reported.rows, LINES_VAR, env, defaults.lines_or_vt100())?;

    let resolved = Dimensions::new(columns, rows);
    if resolved != reported {
        trace!(
            reported = %reported,
            resolved = %resolved,
            "terminal reported a zero axis, fallback applied"
        );
    }
    Ok(resolved)
}

fn resolve_axis(
    reported: u16,
    var: &'static str,
    env: &EnvLookup,
    default: u16,
) -> Result<u16> {
    if reported != 0 {
        return Ok(reported);
    }
    match env.var(var) {
        Some(raw) if !raw.is_empty() => {
            let value = parse_override(&raw)
                .ok_or_else(|| TtyError::invalid_env(var, raw.as_str()))?;
            // An explicit zero is no better than what the device said.
            Ok(if value == 0 { default } else { value })
        }
        _ => Ok(default),
    }
}

/// Digits only, saturating at `u16::MAX`.
fn parse_override(raw: &str) -> Option<u16> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(
        raw.parse::<u64>()
            .ok()
            .and_then(|v| u16::try_from(v).ok())
            .unwrap_or(u16::MAX),
    )
}
