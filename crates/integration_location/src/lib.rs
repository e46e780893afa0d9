//! Location service integration for Pinpoint
//!
//! Provides address geocoding and reverse geocoding via
//! [Nominatim/OpenStreetMap](https://nominatim.openstreetmap.org) and an
//! approximate device position via an [ip-api](https://ip-api.com) compatible
//! IP geolocation endpoint.
//!
//! # Architecture
//!
//! The crate follows a client-trait pattern. [`GeocodingClient`] is
//! implemented by [`NominatimGeocodingClient`] and [`PositionClient`] by
//! [`IpGeolocationClient`]. Both clients are stateless from the caller's point
//! of view and safe to call concurrently.
//!
//! # Example
//!
//! ```rust,ignore
//! use integration_location::{GeocodingClient, NominatimConfig, NominatimGeocodingClient};
//!
//! let client = NominatimGeocodingClient::new(&NominatimConfig::default())?;
//! let address = client.reverse_geocode(12.9716, 77.5946).await?;
//! ```

mod config;
mod error;
mod geocoding;
mod position;

pub use config::{IpGeolocationConfig, NominatimConfig};
pub use error::{GeocodingError, PositionLookupError};
pub use geocoding::{GeocodingClient, NominatimGeocodingClient};
pub use position::{IpGeolocationClient, PositionClient};
