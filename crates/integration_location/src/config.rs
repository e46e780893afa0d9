//! Location service configuration

use serde::{Deserialize, Serialize};

/// Longest accepted cache TTL (one year)
pub const MAX_CACHE_TTL_HOURS: u64 = 24 * 365;

/// Configuration for the Nominatim geocoding service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NominatimConfig {
    /// Base URL for the Nominatim API
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_geocoding_timeout_secs")]
    pub timeout_secs: u64,

    /// Cache TTL in hours (0 to disable)
    #[serde(default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: u64,

    /// Country code filter for forward lookups (empty for worldwide)
    #[serde(default = "default_country_filter")]
    pub country_filter: String,

    /// Preferred languages for returned addresses
    #[serde(default = "default_accept_language")]
    pub accept_language: String,

    /// User agent sent with every request (required by the Nominatim usage policy)
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Minimum spacing between two upstream requests in milliseconds
    #[serde(default = "default_min_request_interval_ms")]
    pub min_request_interval_ms: u64,
}

fn default_geocoding_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

const fn default_geocoding_timeout_secs() -> u64 {
    5
}

const fn default_cache_ttl_hours() -> u64 {
    24
}

fn default_country_filter() -> String {
    "in".to_string()
}

fn default_accept_language() -> String {
    "en".to_string()
}

fn default_user_agent() -> String {
    concat!("Pinpoint/", env!("CARGO_PKG_VERSION")).to_string()
}

const fn default_min_request_interval_ms() -> u64 {
    1100
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_base_url(),
            timeout_secs: default_geocoding_timeout_secs(),
            cache_ttl_hours: default_cache_ttl_hours(),
            country_filter: default_country_filter(),
            accept_language: default_accept_language(),
            user_agent: default_user_agent(),
            min_request_interval_ms: default_min_request_interval_ms(),
        }
    }
}

impl NominatimConfig {
    /// Create a configuration suitable for testing
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            cache_ttl_hours: 0,
            min_request_interval_ms: 0,
            ..Default::default()
        }
    }

    /// Check if caching is enabled
    #[must_use]
    pub const fn caching_enabled(&self) -> bool {
        self.cache_ttl_hours > 0
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error message describing the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.trim().is_empty() {
            return Err("geocoding base_url must not be empty".to_string());
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(format!(
                "geocoding base_url must be an http(s) URL: {}",
                self.base_url
            ));
        }
        if self.timeout_secs == 0 {
            return Err("geocoding timeout_secs must be greater than 0".to_string());
        }
        if self.user_agent.trim().is_empty() {
            return Err("geocoding user_agent must not be empty".to_string());
        }
        if self.cache_ttl_hours > MAX_CACHE_TTL_HOURS {
            return Err(format!(
                "geocoding cache_ttl_hours must be at most {MAX_CACHE_TTL_HOURS}, got {}",
                self.cache_ttl_hours
            ));
        }
        Ok(())
    }
}

/// Configuration for the IP geolocation service used as device position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpGeolocationConfig {
    /// Base URL of an ip-api compatible endpoint
    #[serde(default = "default_position_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_position_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_position_base_url() -> String {
    "http://ip-api.com".to_string()
}

const fn default_position_timeout_secs() -> u64 {
    5
}

impl Default for IpGeolocationConfig {
    fn default() -> Self {
        Self {
            base_url: default_position_base_url(),
            timeout_secs: default_position_timeout_secs(),
        }
    }
}

impl IpGeolocationConfig {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error message describing the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(format!(
                "position base_url must be an http(s) URL: {}",
                self.base_url
            ));
        }
        if self.timeout_secs == 0 {
            return Err("position timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nominatim_config_default() {
        let config = NominatimConfig::default();
        assert_eq!(config.base_url, "https://nominatim.openstreetmap.org");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.cache_ttl_hours, 24);
        assert_eq!(config.country_filter, "in");
        assert_eq!(config.min_request_interval_ms, 1100);
        assert!(config.user_agent.starts_with("Pinpoint/"));
        assert!(config.caching_enabled());
    }

    #[test]
    fn test_nominatim_config_for_testing() {
        let config = NominatimConfig::for_testing();
        assert_eq!(config.cache_ttl_hours, 0);
        assert_eq!(config.min_request_interval_ms, 0);
        assert!(!config.caching_enabled());
    }

    #[test]
    fn test_nominatim_config_from_partial_toml_like_json() {
        let config: NominatimConfig =
            serde_json::from_str(r#"{"base_url": "http://localhost:8080"}"#).unwrap();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.accept_language, "en");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn test_nominatim_config_validation() {
        assert!(NominatimConfig::default().validate().is_ok());

        let config = NominatimConfig {
            base_url: "ftp://example.com".to_string(),
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("http(s)"));

        let config = NominatimConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = NominatimConfig {
            user_agent: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nominatim_config_cache_ttl_cap() {
        let config = NominatimConfig {
            cache_ttl_hours: MAX_CACHE_TTL_HOURS,
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let config = NominatimConfig {
            cache_ttl_hours: 10_000_000,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("cache_ttl_hours"));

        let config = NominatimConfig {
            cache_ttl_hours: u64::MAX,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ip_geolocation_config() {
        let config = IpGeolocationConfig::default();
        assert_eq!(config.base_url, "http://ip-api.com");
        assert!(config.validate().is_ok());

        let config = IpGeolocationConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
