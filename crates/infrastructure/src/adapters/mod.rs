//! Infrastructure adapters
//!
//! Adapters connect application ports to concrete implementations.

mod geocoding_adapter;
mod position_adapter;

use std::sync::Arc;

use application::error::ApplicationError;
use application::ports::{GeocodingPort, PositionPort};
use integration_location::NominatimConfig;
use tracing::info;

pub use geocoding_adapter::NominatimGeocodingAdapter;
pub use position_adapter::{DisabledPositionSource, FixedPositionSource, IpPositionAdapter};

use crate::config::{PositionConfig, PositionProvider};

/// Build the device position source selected by `config`
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the HTTP client
/// fails to initialize.
pub fn position_port_from_config(
    config: &PositionConfig,
) -> Result<Arc<dyn PositionPort>, ApplicationError> {
    config.validate().map_err(ApplicationError::Configuration)?;

    let port: Arc<dyn PositionPort> = match config.provider {
        PositionProvider::Ip => Arc::new(IpPositionAdapter::with_config(&config.ip_config())?),
        PositionProvider::Fixed => {
            let point = config.fixed.ok_or_else(|| {
                ApplicationError::Configuration("position.fixed is not set".to_string())
            })?;
            Arc::new(FixedPositionSource::new(point))
        },
        PositionProvider::Disabled => Arc::new(DisabledPositionSource),
    };

    info!(provider = ?config.provider, "Device position source configured");
    Ok(port)
}

/// Build the Nominatim-backed geocoder
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the HTTP client
/// fails to initialize.
pub fn geocoding_port_from_config(
    config: &NominatimConfig,
) -> Result<Arc<dyn GeocodingPort>, ApplicationError> {
    let adapter = NominatimGeocodingAdapter::with_config(config)?;
    info!(base_url = %config.base_url, "Geocoder configured");
    Ok(Arc::new(adapter))
}
