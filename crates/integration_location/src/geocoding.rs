//! Nominatim geocoding client
//!
//! Converts addresses to coordinates and coordinates to addresses using the
//! [Nominatim](https://nominatim.openstreetmap.org) API (OpenStreetMap).
//!
//! Requests are spaced out according to the Nominatim usage policy (at most
//! one per second by default) and results are cached to minimize API calls.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use domain::GeoLocation;
use moka::future::Cache;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::config::{MAX_CACHE_TTL_HOURS, NominatimConfig};
use crate::error::GeocodingError;

const CACHE_CAPACITY: u64 = 1000;

/// Trait for geocoding clients
#[async_trait]
pub trait GeocodingClient: Send + Sync {
    /// Convert a free-form address to geographic coordinates
    async fn geocode(&self, address: &str) -> Result<GeoLocation, GeocodingError>;

    /// Convert coordinates to a human-readable address
    async fn reverse_geocode(&self, coordinates: GeoLocation) -> Result<String, GeocodingError>;
}

/// Nominatim-based geocoding client with rate limiting and caching
#[derive(Debug)]
pub struct NominatimGeocodingClient {
    client: Client,
    config: NominatimConfig,
    forward_cache: Option<Cache<String, (f64, f64)>>,
    reverse_cache: Option<Cache<String, String>>,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl NominatimGeocodingClient {
    /// Create a new Nominatim geocoding client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: &NominatimConfig) -> Result<Self, GeocodingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| GeocodingError::ConnectionFailed(e.to_string()))?;

        let (forward_cache, reverse_cache) = if config.caching_enabled() {
            let hours = config.cache_ttl_hours.min(MAX_CACHE_TTL_HOURS);
            let ttl = Duration::from_secs(hours.saturating_mul(3600));
            (
                Some(
                    Cache::builder()
                        .max_capacity(CACHE_CAPACITY)
                        .time_to_live(ttl)
                        .build(),
                ),
                Some(
                    Cache::builder()
                        .max_capacity(CACHE_CAPACITY)
                        .time_to_live(ttl)
                        .build(),
                ),
            )
        } else {
            (None, None)
        };

        Ok(Self {
            client,
            config: config.clone(),
            forward_cache,
            reverse_cache,
            last_request: Arc::new(Mutex::new(None)),
        })
    }

    /// Enforce the configured minimum spacing between upstream requests
    ///
    /// Waiters are served in arrival order, so a burst of N lookups delays the
    /// last one by about N intervals. Cache hits never reach the limiter.
    async fn rate_limit(&self) {
        let interval = Duration::from_millis(self.config.min_request_interval_ms);
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < interval {
                let wait = interval.saturating_sub(elapsed);
                debug!(?wait, "Rate limiting geocoding request");
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Issue a GET against `path` and decode the JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, GeocodingError> {
        self.rate_limit().await;

        let url = format!("{}/{path}", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeocodingError::Timeout {
                        timeout_secs: self.config.timeout_secs,
                    }
                } else {
                    GeocodingError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            warn!(?retry_after_secs, "Nominatim rate limit hit");
            return Err(GeocodingError::RateLimitExceeded { retry_after_secs });
        }

        if !status.is_success() {
            return Err(GeocodingError::RequestFailed(format!("HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| GeocodingError::ParseError(e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| GeocodingError::ParseError(e.to_string()))
    }

    fn language_param(&self) -> Option<(&'static str, String)> {
        let language = self.config.accept_language.trim();
        (!language.is_empty()).then(|| ("accept-language", language.to_string()))
    }
}

fn reverse_cache_key(coordinates: GeoLocation) -> String {
    format!("{:.6},{:.6}", coordinates.latitude(), coordinates.longitude())
}

fn parse_coordinate(value: &str, name: &str) -> Result<f64, GeocodingError> {
    value
        .trim()
        .parse()
        .map_err(|_| GeocodingError::ParseError(format!("Invalid {name}: {value}")))
}

#[async_trait]
impl GeocodingClient for NominatimGeocodingClient {
    #[instrument(skip(self))]
    async fn geocode(&self, address: &str) -> Result<GeoLocation, GeocodingError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(GeocodingError::AddressNotFound(
                "Address must not be empty".to_string(),
            ));
        }

        let cache_key = address.to_lowercase();
        if let Some(cache) = &self.forward_cache {
            if let Some((lat, lon)) = cache.get(&cache_key).await {
                debug!(%address, "Geocoding cache hit");
                return GeoLocation::new(lat, lon)
                    .map_err(|e| GeocodingError::ParseError(e.to_string()));
            }
        }

        let mut params = vec![
            ("q", address.to_string()),
            ("format", "jsonv2".to_string()),
            ("limit", "1".to_string()),
        ];
        if let Some(language) = self.language_param() {
            params.push(language);
        }
        if !self.config.country_filter.is_empty() {
            params.push(("countrycodes", self.config.country_filter.clone()));
        }

        debug!(%address, "Geocoding address");
        let results: Vec<NominatimPlace> = self.get_json("search", &params).await?;

        let place = results
            .first()
            .ok_or_else(|| GeocodingError::AddressNotFound(address.to_string()))?;
        let lat = parse_coordinate(&place.lat, "latitude")?;
        let lon = parse_coordinate(&place.lon, "longitude")?;
        let location =
            GeoLocation::new(lat, lon).map_err(|e| GeocodingError::ParseError(e.to_string()))?;

        if let Some(cache) = &self.forward_cache {
            cache.insert(cache_key, (lat, lon)).await;
        }
        debug!(%address, %location, "Geocoded address");

        Ok(location)
    }

    #[instrument(skip(self), fields(position = %coordinates))]
    async fn reverse_geocode(&self, coordinates: GeoLocation) -> Result<String, GeocodingError> {
        let cache_key = reverse_cache_key(coordinates);
        if let Some(cache) = &self.reverse_cache {
            if let Some(address) = cache.get(&cache_key).await {
                debug!("Reverse geocoding cache hit");
                return Ok(address);
            }
        }

        let mut params = vec![
            ("lat", coordinates.latitude().to_string()),
            ("lon", coordinates.longitude().to_string()),
            ("format", "jsonv2".to_string()),
        ];
        if let Some(language) = self.language_param() {
            params.push(language);
        }

        debug!("Reverse geocoding");
        let result: NominatimReverse = self.get_json("reverse", &params).await?;

        // Nominatim reports "no match" as a 200 with an error field
        if let Some(error) = result.error {
            debug!(%error, "No address for coordinates");
            return Err(GeocodingError::AddressNotFound(coordinates.to_string()));
        }

        let address = result
            .display_name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| GeocodingError::AddressNotFound(coordinates.to_string()))?;

        if let Some(cache) = &self.reverse_cache {
            cache.insert(cache_key, address.clone()).await;
        }

        Ok(address)
    }
}

/// Raw Nominatim search hit
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// Raw Nominatim reverse response
#[derive(Debug, Deserialize)]
struct NominatimReverse {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    error: Option<String>,
}
