//! Value Objects - Immutable, identity-less domain primitives

mod geo_location;
mod request_sequence;

pub use geo_location::{GeoLocation, InvalidCoordinates};
pub use request_sequence::RequestSequence;
