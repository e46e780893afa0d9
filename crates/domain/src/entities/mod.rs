//! Domain entities

mod location;
mod resolution_request;

pub use location::Location;
pub use resolution_request::ResolutionRequest;
