//! Application configuration

use std::fmt;
use std::path::Path;
use std::time::Duration;

use application::ResolverConfig;
use domain::GeoLocation;
use integration_location::{IpGeolocationConfig, NominatimConfig};
use serde::{Deserialize, Serialize};

/// Default configuration file name (without extension)
pub const CONFIG_FILE: &str = "pinpoint";

/// Prefix for environment overrides (e.g. `PINPOINT_GEOCODING__BASE_URL`)
pub const ENV_PREFIX: &str = "PINPOINT";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid log format: {s}. Use 'text' or 'json'")),
        }
    }
}

/// Where the device position comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionProvider {
    /// Approximate position from the public IP address
    #[default]
    Ip,
    /// The configured `position.fixed` point
    Fixed,
    /// Location access switched off (reported as permission denied)
    Disabled,
}

/// Device position configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionConfig {
    /// Position source
    #[serde(default)]
    pub provider: PositionProvider,

    /// Base URL of the ip-api compatible endpoint
    #[serde(default = "default_position_base_url")]
    pub base_url: String,

    /// Request timeout in seconds for the IP lookup
    #[serde(default = "default_position_timeout_secs")]
    pub timeout_secs: u64,

    /// Point reported by the `fixed` provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed: Option<GeoLocation>,
}

fn default_position_base_url() -> String {
    IpGeolocationConfig::default().base_url
}

fn default_position_timeout_secs() -> u64 {
    IpGeolocationConfig::default().timeout_secs
}

impl Default for PositionConfig {
    fn default() -> Self {
        Self {
            provider: PositionProvider::default(),
            base_url: default_position_base_url(),
            timeout_secs: default_position_timeout_secs(),
            fixed: None,
        }
    }
}

impl PositionConfig {
    /// Client configuration for the IP lookup
    #[must_use]
    pub fn ip_config(&self) -> IpGeolocationConfig {
        IpGeolocationConfig {
            base_url: self.base_url.clone(),
            timeout_secs: self.timeout_secs,
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error message describing the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        match self.provider {
            PositionProvider::Ip => self.ip_config().validate(),
            PositionProvider::Fixed => {
                let fixed = self
                    .fixed
                    .ok_or_else(|| "position.fixed is required for the fixed provider".to_string())?;
                GeoLocation::new(fixed.latitude(), fixed.longitude())
                    .map(|_| ())
                    .map_err(|e| format!("position.fixed: {e}"))
            },
            PositionProvider::Disabled => Ok(()),
        }
    }
}

/// Resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverSettings {
    /// Reverse-geocode chosen points (off: coordinates only)
    #[serde(default = "default_true")]
    pub reverse_geocode: bool,

    /// Upper bound for the device-position lookup in seconds (unset waits forever)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_timeout_secs: Option<u64>,

    /// Map centre shown while no marker is set
    #[serde(default = "GeoLocation::india_center")]
    pub default_center: GeoLocation,
}

const fn default_true() -> bool {
    true
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            reverse_geocode: true,
            position_timeout_secs: None,
            default_center: GeoLocation::india_center(),
        }
    }
}

impl ResolverSettings {
    /// Resolver tuning derived from these settings
    #[must_use]
    pub fn resolver_config(&self) -> ResolverConfig {
        let config = ResolverConfig::default().with_default_center(self.default_center);
        match self.position_timeout_secs {
            Some(secs) => config.with_position_timeout(Duration::from_secs(secs)),
            None => config,
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error message describing the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.position_timeout_secs == Some(0) {
            return Err("resolver.position_timeout_secs must be greater than 0".to_string());
        }
        let center = self.default_center;
        GeoLocation::new(center.latitude(), center.longitude())
            .map(|_| ())
            .map_err(|e| format!("resolver.default_center: {e}"))
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,

    /// Geocoding service configuration
    #[serde(default)]
    pub geocoding: NominatimConfig,

    /// Device position configuration
    #[serde(default)]
    pub position: PositionConfig,

    /// Resolver configuration
    #[serde(default)]
    pub resolver: ResolverSettings,
}

impl AppConfig {
    /// Load configuration from environment and the optional `pinpoint.toml`
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from environment and an optional file
    ///
    /// Without `path`, `pinpoint.{toml,json,yaml}` in the working directory
    /// is used if present. An explicit `path` must exist.
    pub fn load_from(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(CONFIG_FILE).required(false),
        };

        let builder = config::Config::builder()
            .add_source(file)
            // Override with environment variables (e.g., PINPOINT_RESOLVER__REVERSE_GEOCODE)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate every section
    ///
    /// # Errors
    ///
    /// Returns an error message describing the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        self.geocoding.validate()?;
        self.position.validate()?;
        self.resolver.validate()
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn log_format_parse_and_display() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("TEXT".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::Json.to_string(), "json");
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.position.provider, PositionProvider::Ip);
        assert!(config.resolver.reverse_geocode);
        assert_eq!(config.resolver.default_center, GeoLocation::india_center());
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn resolver_config_from_settings() {
        let settings = ResolverSettings::default();
        let config = settings.resolver_config();
        assert!(config.position_timeout.is_none());
        assert_eq!(config.default_center, GeoLocation::india_center());

        let settings = ResolverSettings {
            position_timeout_secs: Some(10),
            default_center: GeoLocation::bengaluru(),
            reverse_geocode: true,
        };
        let config = settings.resolver_config();
        assert_eq!(config.position_timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.default_center, GeoLocation::bengaluru());
    }

    #[test]
    fn resolver_settings_reject_zero_timeout() {
        let settings = ResolverSettings {
            position_timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn fixed_provider_requires_point() {
        let position = PositionConfig {
            provider: PositionProvider::Fixed,
            ..Default::default()
        };
        assert!(position.validate().unwrap_err().contains("position.fixed"));

        let position = PositionConfig {
            provider: PositionProvider::Fixed,
            fixed: Some(GeoLocation::bengaluru()),
            ..Default::default()
        };
        assert!(position.validate().is_ok());
    }

    #[test]
    fn fixed_point_out_of_range_is_rejected() {
        let position = PositionConfig {
            provider: PositionProvider::Fixed,
            fixed: Some(GeoLocation::new_unchecked(95.0, 10.0)),
            ..Default::default()
        };
        assert!(position.validate().is_err());
    }

    #[test]
    fn ip_config_copies_fields() {
        let position = PositionConfig {
            base_url: "http://localhost:9000".to_string(),
            timeout_secs: 2,
            ..Default::default()
        };
        let ip = position.ip_config();
        assert_eq!(ip.base_url, "http://localhost:9000");
        assert_eq!(ip.timeout_secs, 2);
    }

    #[test]
    fn load_from_file() {
        let file = write_config(
            r#"
log_format = "json"

[geocoding]
base_url = "http://localhost:8080"
country_filter = ""

[position]
provider = "fixed"
fixed = { latitude = 12.9716, longitude = 77.5946 }

[resolver]
position_timeout_secs = 8
reverse_geocode = false
default_center = { lat = 28.6139, lng = 77.209 }
"#,
        );

        let config = AppConfig::load_from(Some(file.path())).unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.geocoding.base_url, "http://localhost:8080");
        assert!(config.geocoding.country_filter.is_empty());
        assert_eq!(config.geocoding.timeout_secs, 5);
        assert_eq!(config.position.provider, PositionProvider::Fixed);
        assert_eq!(config.position.fixed, Some(GeoLocation::bengaluru()));
        assert_eq!(config.resolver.position_timeout_secs, Some(8));
        assert!(!config.resolver.reverse_geocode);
        assert_eq!(
            config.resolver.default_center,
            GeoLocation::new(28.6139, 77.209).unwrap()
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_from_missing_file_fails() {
        let result = AppConfig::load_from(Some(Path::new("/nonexistent/pinpoint.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn to_toml_contains_sections() {
        let rendered = AppConfig::default().to_toml().unwrap();
        assert!(rendered.contains("[geocoding]"));
        assert!(rendered.contains("[position]"));
        assert!(rendered.contains("[resolver]"));
        assert!(rendered.contains("log_format = \"text\""));
    }
}
