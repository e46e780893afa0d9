//! Geocoding port
//!
//! Translates between coordinates and human-readable addresses. Calls are
//! stateless and may run concurrently; callers are free to ignore a result,
//! in-flight work is never cancelled on the callee side.

use async_trait::async_trait;
use domain::GeoLocation;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a geocoding lookup produced no usable answer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeocodeError {
    /// The service answered but had no match
    #[error("No geocoding result")]
    NoResult,

    /// Transport, quota or parsing failure
    #[error("Geocoding service error: {0}")]
    ServiceError(String),
}

/// Result of a reverse-geocode lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReverseGeocode {
    /// Human-readable address for the coordinates
    pub formatted_address: String,
}

impl ReverseGeocode {
    /// Create a new reverse-geocode result
    #[must_use]
    pub fn new(formatted_address: impl Into<String>) -> Self {
        Self {
            formatted_address: formatted_address.into(),
        }
    }
}

/// Port for geocoding services
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GeocodingPort: Send + Sync {
    /// Convert coordinates to a human-readable address
    async fn reverse_geocode(
        &self,
        coordinates: GeoLocation,
    ) -> Result<ReverseGeocode, GeocodeError>;

    /// Convert a free-form address to coordinates
    async fn geocode(&self, address: &str) -> Result<GeoLocation, GeocodeError>;
}
