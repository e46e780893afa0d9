//! Position adapters - Implement PositionPort
//!
//! Three sources are available: an IP geolocation lookup, a fixed configured
//! point and a disabled source that behaves like a refused permission prompt.

use std::sync::Arc;

use application::error::ApplicationError;
use application::ports::{PositionError, PositionPort};
use async_trait::async_trait;
use domain::GeoLocation;
use integration_location::{
    IpGeolocationClient, IpGeolocationConfig, PositionClient, PositionLookupError,
};
use tracing::{debug, instrument, warn};

/// Device position from the public IP address
pub struct IpPositionAdapter {
    client: Arc<dyn PositionClient>,
}

impl std::fmt::Debug for IpPositionAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpPositionAdapter")
            .field("client", &"<PositionClient>")
            .finish()
    }
}

impl IpPositionAdapter {
    /// Wrap an existing position client
    #[must_use]
    pub fn new(client: Arc<dyn PositionClient>) -> Self {
        Self { client }
    }

    /// Create an adapter backed by an ip-api client
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// fails to initialize.
    pub fn with_config(config: &IpGeolocationConfig) -> Result<Self, ApplicationError> {
        config.validate().map_err(ApplicationError::Configuration)?;
        let client = IpGeolocationClient::new(config)
            .map_err(|e| ApplicationError::Configuration(e.to_string()))?;
        Ok(Self::new(Arc::new(client)))
    }

    /// Map integration errors to port errors
    fn map_error(err: &PositionLookupError) -> PositionError {
        match err {
            PositionLookupError::Timeout { .. } => PositionError::Timeout,
            _ => PositionError::Unavailable,
        }
    }
}

#[async_trait]
impl PositionPort for IpPositionAdapter {
    #[instrument(skip(self))]
    async fn current_position(&self) -> Result<GeoLocation, PositionError> {
        self.client.current_position().await.map_err(|e| {
            warn!(error = %e, "IP geolocation failed");
            Self::map_error(&e)
        })
    }
}

/// Position source that always reports the same configured point
#[derive(Debug, Clone, Copy)]
pub struct FixedPositionSource {
    position: GeoLocation,
}

impl FixedPositionSource {
    /// Report `position` for every lookup
    #[must_use]
    pub const fn new(position: GeoLocation) -> Self {
        Self { position }
    }
}

#[async_trait]
impl PositionPort for FixedPositionSource {
    async fn current_position(&self) -> Result<GeoLocation, PositionError> {
        debug!(position = %self.position, "Reporting fixed device position");
        Ok(self.position)
    }
}

/// Position source for setups where location access is switched off
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledPositionSource;

#[async_trait]
impl PositionPort for DisabledPositionSource {
    async fn current_position(&self) -> Result<GeoLocation, PositionError> {
        Err(PositionError::PermissionDenied)
    }
}
