//! Device position port
//!
//! Single-shot access to the device's current coordinates. Implementations may
//! suspend indefinitely (e.g. an unanswered permission prompt); callers that
//! need a bound wrap the call in their own timeout.

use async_trait::async_trait;
use domain::GeoLocation;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

/// Reasons the device position could not be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PositionError {
    /// The user (or configuration) refused location access
    #[error("Location permission denied")]
    PermissionDenied,

    /// No position could be determined
    #[error("Position unavailable")]
    Unavailable,

    /// The position lookup did not finish in time
    #[error("Position request timed out")]
    Timeout,
}

/// Port for reading the device's current position
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PositionPort: Send + Sync {
    /// Fetch the current position once
    async fn current_position(&self) -> Result<GeoLocation, PositionError>;
}
