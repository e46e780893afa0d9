//! Geographic location value object

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::DomainError;

/// A geographic location with latitude and longitude
///
/// Serialized as `{ "lat": .., "lng": .. }`, which is the shape the listing
/// form stores. `latitude` / `longitude` are accepted on input as well.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    /// Latitude in degrees (-90 to 90)
    #[serde(rename = "lat", alias = "latitude")]
    latitude: f64,
    /// Longitude in degrees (-180 to 180)
    #[serde(rename = "lng", alias = "longitude")]
    longitude: f64,
}

/// Error type for invalid coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidCoordinates {
    /// Rejected latitude
    pub latitude: f64,
    /// Rejected longitude
    pub longitude: f64,
}

impl fmt::Display for InvalidCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid coordinates ({}, {}): latitude must be -90 to 90, longitude must be -180 to 180",
            self.latitude, self.longitude
        )
    }
}

impl std::error::Error for InvalidCoordinates {}

impl GeoLocation {
    /// Create a new location with validation
    ///
    /// # Errors
    ///
    /// Returns `InvalidCoordinates` if latitude is not in [-90, 90]
    /// or longitude is not in [-180, 180] (NaN is rejected as well)
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinates> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(InvalidCoordinates {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Create a location without validation (for trusted sources)
    ///
    /// Caller must ensure latitude is in [-90, 90] and longitude in [-180, 180]
    #[must_use]
    pub const fn new_unchecked(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// The `(0, 0)` sentinel meaning "no location chosen"
    #[must_use]
    pub const fn unset() -> Self {
        Self::new_unchecked(0.0, 0.0)
    }

    /// Whether this is the `(0, 0)` sentinel
    ///
    /// A genuine point on the equator at the prime meridian cannot be told
    /// apart from the sentinel; forms treat it as "not chosen".
    #[must_use]
    pub fn is_unset(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }

    /// Get the latitude
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Get the longitude
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl Default for GeoLocation {
    fn default() -> Self {
        Self::unset()
    }
}

impl fmt::Display for GeoLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// Parses `"lat, lng"` or `"lat lng"`
impl FromStr for GeoLocation {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .collect();

        let [lat, lng] = parts.as_slice() else {
            return Err(DomainError::InvalidCoordinateInput(s.trim().to_string()));
        };

        let parse = |part: &str| {
            part.parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| DomainError::InvalidCoordinateInput(s.trim().to_string()))
        };

        Ok(Self::new(parse(*lat)?, parse(*lng)?)?)
    }
}

/// Well-known points used as display defaults
impl GeoLocation {
    /// Geographic centre of India, the default map centre when nothing is resolved
    #[must_use]
    pub const fn india_center() -> Self {
        Self::new_unchecked(20.5937, 78.9629)
    }

    /// Bengaluru, India
    #[must_use]
    pub const fn bengaluru() -> Self {
        Self::new_unchecked(12.9716, 77.5946)
    }
}
