//! Domain layer for Pinpoint
//!
//! Contains the location entities and value objects shared by the resolver
//! and its adapters. This layer has no I/O.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;
