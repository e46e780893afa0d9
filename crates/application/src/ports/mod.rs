//! Port definitions for application layer
//!
//! Ports are interfaces that define how the resolver interacts with the
//! outside world. Adapters in the infrastructure layer implement these ports.

mod geocoding_port;
mod location_sink;
mod position_port;

#[cfg(test)]
pub use geocoding_port::MockGeocodingPort;
pub use geocoding_port::{GeocodeError, GeocodingPort, ReverseGeocode};
pub use location_sink::{ChannelLocationSink, LocationSink};
#[cfg(test)]
pub use location_sink::MockLocationSink;
#[cfg(test)]
pub use position_port::MockPositionPort;
pub use position_port::{PositionError, PositionPort};
