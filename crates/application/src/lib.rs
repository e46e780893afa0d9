//! Application layer - Use cases and orchestration
//!
//! Contains the location resolver and the port definitions it depends on.
//! Adapters for the ports live in the infrastructure layer.

pub mod error;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use ports::*;
pub use services::*;
