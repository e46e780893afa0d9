//! Listing location entity

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::value_objects::GeoLocation;

/// The point a listing is placed at, as stored by the listing form
///
/// `coordinates` and `address` only ever change together: a new value is
/// produced by [`Location::merged`] and replaces the old one wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Chosen point; `(0, 0)` means nothing was chosen yet
    #[serde(default)]
    coordinates: GeoLocation,

    /// Reverse-geocoded label for the point
    #[serde(default, skip_serializing_if = "Option::is_none")]
    address: Option<String>,
}

impl Location {
    /// Create a location from coordinates and an optional address
    #[must_use]
    pub fn new(coordinates: GeoLocation, address: Option<String>) -> Self {
        Self {
            coordinates,
            address: address.filter(|a| !a.trim().is_empty()),
        }
    }

    /// The empty location (sentinel coordinates, no address)
    #[must_use]
    pub fn unset() -> Self {
        Self::default()
    }

    /// A location with coordinates but no address yet
    #[must_use]
    pub const fn at(coordinates: GeoLocation) -> Self {
        Self {
            coordinates,
            address: None,
        }
    }

    /// Chosen coordinates
    #[must_use]
    pub const fn coordinates(&self) -> GeoLocation {
        self.coordinates
    }

    /// Reverse-geocoded address, if one was resolved
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Whether non-sentinel coordinates have been chosen
    #[must_use]
    pub fn is_set(&self) -> bool {
        !self.coordinates.is_unset()
    }

    /// Produce the next value after a resolution attempt for `coordinates`
    ///
    /// A resolved address replaces the old one. Without one (geocoder failed
    /// or had no match) the previous address is kept, matching how the form
    /// merges partial updates.
    #[must_use]
    pub fn merged(&self, coordinates: GeoLocation, address: Option<String>) -> Self {
        let address = address
            .filter(|a| !a.trim().is_empty())
            .or_else(|| self.address.clone());
        Self {
            coordinates,
            address,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.address {
            Some(address) => write!(f, "{address} ({})", self.coordinates),
            None => write!(f, "{}", self.coordinates),
        }
    }
}
