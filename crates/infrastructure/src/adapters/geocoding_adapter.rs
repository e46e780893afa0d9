//! Geocoding adapter - Implements GeocodingPort using integration_location

use std::sync::Arc;

use application::error::ApplicationError;
use application::ports::{GeocodeError, GeocodingPort, ReverseGeocode};
use async_trait::async_trait;
use domain::GeoLocation;
use integration_location::{
    GeocodingClient, GeocodingError, NominatimConfig, NominatimGeocodingClient,
};
use tracing::{debug, instrument, warn};

/// Adapter for geocoding services using Nominatim
pub struct NominatimGeocodingAdapter {
    client: Arc<dyn GeocodingClient>,
}

impl std::fmt::Debug for NominatimGeocodingAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NominatimGeocodingAdapter")
            .field("client", &"<GeocodingClient>")
            .finish()
    }
}

impl NominatimGeocodingAdapter {
    /// Wrap an existing geocoding client
    #[must_use]
    pub fn new(client: Arc<dyn GeocodingClient>) -> Self {
        Self { client }
    }

    /// Create an adapter backed by a Nominatim client
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// fails to initialize.
    pub fn with_config(config: &NominatimConfig) -> Result<Self, ApplicationError> {
        config.validate().map_err(ApplicationError::Configuration)?;
        let client = NominatimGeocodingClient::new(config)
            .map_err(|e| ApplicationError::Configuration(e.to_string()))?;
        Ok(Self::new(Arc::new(client)))
    }

    /// Map integration errors to port errors
    fn map_error(err: GeocodingError) -> GeocodeError {
        match err {
            GeocodingError::AddressNotFound(_) => GeocodeError::NoResult,
            other => {
                if other.is_retryable() {
                    warn!(error = %other, "Geocoding service temporarily unavailable");
                }
                GeocodeError::ServiceError(other.to_string())
            },
        }
    }
}

#[async_trait]
impl GeocodingPort for NominatimGeocodingAdapter {
    #[instrument(skip(self), fields(position = %coordinates))]
    async fn reverse_geocode(
        &self,
        coordinates: GeoLocation,
    ) -> Result<ReverseGeocode, GeocodeError> {
        let address = self
            .client
            .reverse_geocode(coordinates)
            .await
            .map_err(Self::map_error)?;
        debug!(%address, "Resolved address");
        Ok(ReverseGeocode::new(address))
    }

    #[instrument(skip(self))]
    async fn geocode(&self, address: &str) -> Result<GeoLocation, GeocodeError> {
        self.client.geocode(address).await.map_err(Self::map_error)
    }
}
