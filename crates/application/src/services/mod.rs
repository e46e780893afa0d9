//! Application services - Use case implementations

mod location_resolver;

pub use location_resolver::{
    DEFAULT_ZOOM, LocationResolver, MARKER_ZOOM, MapEvent, MapView, PositionOutcome,
    ResolverConfig, ResolverHandle, ResolverPhase, ResolverSnapshot, ResolverState, ResolverStats,
    SeedOutcome,
};
