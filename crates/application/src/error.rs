//! Application-level errors

use domain::DomainError;
use thiserror::Error;

use crate::ports::{GeocodeError, PositionError};

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Device position could not be determined
    #[error(transparent)]
    Position(#[from] PositionError),

    /// Geocoding lookup failed
    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    /// The resolver was unmounted and no longer accepts events
    #[error("Location resolver is closed")]
    ResolverClosed,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ApplicationError {
    /// Check if this error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Position(PositionError::Timeout | PositionError::Unavailable)
                | Self::Geocode(GeocodeError::ServiceError(_))
        )
    }
}
