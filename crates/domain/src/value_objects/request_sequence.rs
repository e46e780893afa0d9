//! Request sequence numbers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-resolver sequence number tagging a reverse-geocode request
///
/// Sequence `0` is never issued; it stands for "nothing issued / applied yet"
/// and is the initial value of both the issue counter and the watermark.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RequestSequence(u64);

impl RequestSequence {
    /// The "nothing issued yet" value
    pub const ZERO: Self = Self(0);

    /// Wrap a raw sequence number
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The sequence number issued after this one
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Raw value
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for RequestSequence {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
