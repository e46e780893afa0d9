//! Reverse-geocode resolution request

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::value_objects::{GeoLocation, RequestSequence};

/// A reverse-geocode request issued by a resolver
///
/// Requests are ephemeral; the sequence decides whether the response may
/// still be applied when it comes back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolutionRequest {
    /// Issue order within one resolver
    pub sequence: RequestSequence,
    /// Coordinates being resolved
    pub target: GeoLocation,
}

impl ResolutionRequest {
    /// Create a new request
    #[must_use]
    pub const fn new(sequence: RequestSequence, target: GeoLocation) -> Self {
        Self { sequence, target }
    }

    /// Whether a newer request has been issued since this one
    #[must_use]
    pub fn is_superseded_by(&self, latest: RequestSequence) -> bool {
        self.sequence < latest
    }
}

impl fmt::Display for ResolutionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.sequence, self.target)
    }
}
