#![forbid(unsafe_code)]

//! Session lifecycle states.
//!
//! ```text
//! Closed ──init──▶ Opening ──raw mode──▶ Active ──fini──▶ Closing ──▶ Closed
//!                     │                                                 ▲
//!                     └──────────────── open/mode failure ──────────────┘
//! ```
//!
//! Nothing moves backwards once `Closing` has begun.

use std::fmt;

/// Where a tty session is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
    #[default]
    Closed,
    Opening,
    Active,
    Closing,
}

impl SessionState {
    /// Whether `self -> next` is a legal transition.
    #[must_use]
    pub const fn can_transition(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Closed, Self::Opening)
                | (Self::Opening, Self::Active)
                | (Self::Opening, Self::Closed)
                | (Self::Active, Self::Closing)
                | (Self::Closing, Self::Closed)
        )
    }

    #[inline]
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Opening => "opening",
            Self::Active => "active",
            Self::Closing => "closing",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
