//! Infrastructure layer - Adapters for external systems
//!
//! Implements the ports defined in the application layer on top of the
//! location service clients, and owns configuration loading and logging
//! setup.

pub mod adapters;
pub mod config;
pub mod telemetry;

pub use adapters::*;
pub use config::{AppConfig, LogFormat, PositionConfig, PositionProvider, ResolverSettings};
pub use telemetry::{TelemetryError, init_logging};
