#![forbid(unsafe_code)]

//! Terminal geometry.

use std::fmt;

/// Terminal size in character cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub columns: u16,
    pub rows: u16,
}

impl Dimensions {
    #[must_use]
    pub const fn new(columns: u16, rows: u16) -> Self {
        Self { columns, rows }
    }

    /// Whether either axis is zero. Degenerate sizes are never published.
    #[inline]
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        self.columns == 0 || self.rows == 0
    }
}

impl From<(u16, u16)> for Dimensions {
    fn from((columns, rows): (u16, u16)) -> Self {
        Self { columns, rows }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.columns, self.rows)
    }
}
