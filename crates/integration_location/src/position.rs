//! IP geolocation client
//!
//! Approximates the device position from the public IP address using an
//! [ip-api](https://ip-api.com/docs/api:json) compatible endpoint. The result
//! is city-level at best.

use std::time::Duration;

use async_trait::async_trait;
use domain::GeoLocation;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::config::IpGeolocationConfig;
use crate::error::PositionLookupError;

/// Trait for device position clients
#[async_trait]
pub trait PositionClient: Send + Sync {
    /// Look up the current position of this device
    async fn current_position(&self) -> Result<GeoLocation, PositionLookupError>;
}

/// ip-api based position client
#[derive(Debug)]
pub struct IpGeolocationClient {
    client: Client,
    config: IpGeolocationConfig,
}

impl IpGeolocationClient {
    /// Create a new IP geolocation client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: &IpGeolocationConfig) -> Result<Self, PositionLookupError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PositionLookupError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl PositionClient for IpGeolocationClient {
    #[instrument(skip(self))]
    async fn current_position(&self) -> Result<GeoLocation, PositionLookupError> {
        let url = format!("{}/json/", self.config.base_url.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .query(&[("fields", "status,message,lat,lon")])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PositionLookupError::Timeout {
                        timeout_secs: self.config.timeout_secs,
                    }
                } else {
                    PositionLookupError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PositionLookupError::RequestFailed(format!("HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PositionLookupError::ParseError(e.to_string()))?;
        let lookup: IpApiResponse = serde_json::from_str(&body)
            .map_err(|e| PositionLookupError::ParseError(e.to_string()))?;

        lookup.into_location()
    }
}

/// Raw ip-api response
#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

impl IpApiResponse {
    fn into_location(self) -> Result<GeoLocation, PositionLookupError> {
        if self.status != "success" {
            let reason = self.message.unwrap_or_else(|| self.status.clone());
            return Err(PositionLookupError::NotLocated(reason));
        }

        let (Some(lat), Some(lon)) = (self.lat, self.lon) else {
            return Err(PositionLookupError::ParseError(
                "Response is missing lat/lon".to_string(),
            ));
        };

        let location =
            GeoLocation::new(lat, lon).map_err(|e| PositionLookupError::ParseError(e.to_string()))?;
        debug!(%location, "Located device by IP");
        Ok(location)
    }
}
