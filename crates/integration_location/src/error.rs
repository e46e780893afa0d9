//! Location service error types

use thiserror::Error;

/// Errors that can occur during geocoding
#[derive(Debug, Error)]
pub enum GeocodingError {
    /// Connection to the geocoding service failed
    #[error("Geocoding connection failed: {0}")]
    ConnectionFailed(String),

    /// Request to the geocoding service failed
    #[error("Geocoding request failed: {0}")]
    RequestFailed(String),

    /// Failed to parse the geocoding response
    #[error("Geocoding parse error: {0}")]
    ParseError(String),

    /// The query matched nothing
    #[error("Address not found: {0}")]
    AddressNotFound(String),

    /// The service rejected the request for exceeding its usage policy
    #[error("Geocoding rate limit exceeded, retry after {retry_after_secs:?} seconds")]
    RateLimitExceeded {
        /// Seconds to wait before retrying (if provided by the service)
        retry_after_secs: Option<u64>,
    },

    /// Request timeout
    #[error("Geocoding request timed out after {timeout_secs} seconds")]
    Timeout {
        /// The timeout duration in seconds
        timeout_secs: u64,
    },
}

impl GeocodingError {
    /// Returns true if this error is retryable
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_)
                | Self::RequestFailed(_)
                | Self::Timeout { .. }
                | Self::RateLimitExceeded { .. }
        )
    }
}

/// Errors that can occur while looking up the device position
#[derive(Debug, Error)]
pub enum PositionLookupError {
    /// Connection to the geolocation service failed
    #[error("Position lookup connection failed: {0}")]
    ConnectionFailed(String),

    /// Request to the geolocation service failed
    #[error("Position lookup request failed: {0}")]
    RequestFailed(String),

    /// Failed to parse the geolocation response
    #[error("Position lookup parse error: {0}")]
    ParseError(String),

    /// The service answered but could not locate the caller
    #[error("Position not available: {0}")]
    NotLocated(String),

    /// Request timeout
    #[error("Position lookup timed out after {timeout_secs} seconds")]
    Timeout {
        /// The timeout duration in seconds
        timeout_secs: u64,
    },
}

impl PositionLookupError {
    /// Returns true if this error is retryable
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_) | Self::RequestFailed(_) | Self::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_geocoding_errors() {
        assert!(GeocodingError::ConnectionFailed("test".to_string()).is_retryable());
        assert!(GeocodingError::RequestFailed("test".to_string()).is_retryable());
        assert!(GeocodingError::Timeout { timeout_secs: 5 }.is_retryable());
        assert!(
            GeocodingError::RateLimitExceeded {
                retry_after_secs: Some(1)
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_non_retryable_geocoding_errors() {
        assert!(!GeocodingError::AddressNotFound("nowhere".to_string()).is_retryable());
        assert!(!GeocodingError::ParseError("test".to_string()).is_retryable());
    }

    #[test]
    fn test_position_lookup_retryable() {
        assert!(PositionLookupError::Timeout { timeout_secs: 5 }.is_retryable());
        assert!(!PositionLookupError::NotLocated("private range".to_string()).is_retryable());
        assert!(!PositionLookupError::ParseError("test".to_string()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = GeocodingError::AddressNotFound("MG Road".to_string());
        assert!(err.to_string().contains("MG Road"));

        let err = GeocodingError::Timeout { timeout_secs: 7 };
        assert!(err.to_string().contains("timed out after 7"));

        let err = PositionLookupError::NotLocated("reserved range".to_string());
        assert!(err.to_string().contains("reserved range"));
    }
}
