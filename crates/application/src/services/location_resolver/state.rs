//! Resolver state machine
//!
//! Pure, synchronous transitions for the location resolver. The async driver
//! feeds events in one at a time and performs whatever I/O a transition asks
//! for; nothing here touches a port.

use domain::{GeoLocation, Location, RequestSequence, ResolutionRequest};
use serde::{Deserialize, Serialize};

use crate::ports::PositionError;

use super::view::MapView;

/// Lifecycle phase of a resolver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverPhase {
    /// Created, not yet seeded
    #[default]
    Uninitialized,
    /// Waiting for the first source to produce (or fail to produce) a point
    Seeding,
    /// Seeding finished; clicks drive further updates
    Ready,
}

/// Which source ended the seeding phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedOutcome {
    /// The caller supplied a non-sentinel location
    Explicit,
    /// The device position was adopted
    DevicePosition,
    /// The device position lookup failed; the marker stays unset
    DeviceUnavailable,
    /// The user clicked before any other source settled
    UserClick,
}

/// What happened to a device position result
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionOutcome {
    /// Position became the marker; the request must be reverse-geocoded
    Adopted(ResolutionRequest),
    /// Lookup failed; marker left unset
    Failed(PositionError),
    /// Arrived after a click (or teardown) and was ignored
    Discarded,
}

/// Counters over reverse-geocode responses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverStats {
    /// Requests issued
    pub issued: u64,
    /// Responses merged into the location
    pub applied: u64,
    /// Responses dropped because a newer request existed
    pub discarded: u64,
    /// Requests retired without a lookup
    #[serde(default)]
    pub skipped: u64,
}

impl ResolverStats {
    /// Requests whose response has not come back yet
    #[must_use]
    pub const fn pending(&self) -> u64 {
        self.issued
            .saturating_sub(self.applied + self.discarded + self.skipped)
    }
}

/// Read-only view of a resolver, published after every processed event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolverSnapshot {
    /// Lifecycle phase
    pub phase: ResolverPhase,
    /// How seeding ended, once it has
    pub seed_outcome: Option<SeedOutcome>,
    /// Currently displayed point
    pub marker: Option<GeoLocation>,
    /// Last value reported to the form
    pub location: Location,
    /// Highest sequence issued
    pub last_issued: RequestSequence,
    /// Highest sequence whose response was applied
    pub last_applied: RequestSequence,
    /// Whether the device position was requested and has not settled yet
    pub awaiting_position: bool,
    /// Whether the resolver was torn down
    pub disposed: bool,
    /// Response counters
    pub stats: ResolverStats,
}

impl ResolverSnapshot {
    /// Map viewport for this snapshot
    #[must_use]
    pub fn view(&self, default_center: GeoLocation) -> MapView {
        MapView::for_marker(self.marker, default_center)
    }

    /// Whether no lookup this resolver still cares about is in flight
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.disposed || (!self.awaiting_position && self.stats.pending() == 0)
    }
}

/// The resolver's mutable state
///
/// `last_issued` is the issue counter, `last_applied` the watermark. A
/// response is applied only when its sequence equals `last_issued` and is
/// above `last_applied`, so each request applies at most once and never after
/// a newer one was issued.
#[derive(Debug, Clone, Default)]
pub struct ResolverState {
    phase: ResolverPhase,
    seed_outcome: Option<SeedOutcome>,
    marker: Option<GeoLocation>,
    location: Location,
    last_issued: RequestSequence,
    last_applied: RequestSequence,
    position_requested: bool,
    position_settled: bool,
    disposed: bool,
    stats: ResolverStats,
}

impl ResolverState {
    /// Create an uninitialized state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from the caller's location, entering `Seeding` or `Ready`
    ///
    /// Only the first call has an effect.
    pub fn begin(&mut self, explicit: Option<Location>) {
        if self.phase != ResolverPhase::Uninitialized {
            return;
        }

        let explicit = explicit.unwrap_or_default();
        if explicit.is_set() {
            self.marker = Some(explicit.coordinates());
            self.seed_outcome = Some(SeedOutcome::Explicit);
            self.phase = ResolverPhase::Ready;
        } else {
            self.phase = ResolverPhase::Seeding;
        }
        self.location = explicit;
    }

    /// The map became ready; returns whether to fetch the device position
    ///
    /// The fetch is requested at most once and only while seeding with no
    /// marker set.
    pub fn on_map_ready(&mut self) -> bool {
        let fetch = !self.disposed
            && !self.position_requested
            && self.phase == ResolverPhase::Seeding
            && self.marker.is_none();
        if fetch {
            self.position_requested = true;
        }
        fetch
    }

    /// Apply the settled device position lookup
    pub fn on_position(&mut self, result: Result<GeoLocation, PositionError>) -> PositionOutcome {
        self.position_settled = true;
        if self.disposed || self.marker.is_some() {
            return PositionOutcome::Discarded;
        }

        match result {
            Ok(position) if !position.is_unset() => {
                self.marker = Some(position);
                self.finish_seeding(SeedOutcome::DevicePosition);
                PositionOutcome::Adopted(self.issue(position))
            },
            Ok(_) => {
                self.finish_seeding(SeedOutcome::DeviceUnavailable);
                PositionOutcome::Failed(PositionError::Unavailable)
            },
            Err(err) => {
                self.finish_seeding(SeedOutcome::DeviceUnavailable);
                PositionOutcome::Failed(err)
            },
        }
    }

    /// Move the marker to a clicked point and issue a request for it
    ///
    /// Returns `None` after teardown.
    pub fn on_click(&mut self, target: GeoLocation) -> Option<ResolutionRequest> {
        if self.disposed {
            return None;
        }
        self.marker = Some(target);
        self.finish_seeding(SeedOutcome::UserClick);
        Some(self.issue(target))
    }

    /// Apply the outcome of a reverse-geocode request
    ///
    /// `address` is `None` when the lookup failed or found nothing. Returns
    /// the new location when the response was applied.
    pub fn on_resolved(
        &mut self,
        request: ResolutionRequest,
        address: Option<String>,
    ) -> Option<&Location> {
        if self.disposed {
            return None;
        }

        if request.is_superseded_by(self.last_issued) || request.sequence <= self.last_applied {
            self.stats.discarded += 1;
            return None;
        }

        self.location = self.location.merged(request.target, address);
        self.last_applied = request.sequence;
        self.stats.applied += 1;
        Some(&self.location)
    }

    /// Retire an issued request whose lookup will never run
    ///
    /// The location is left untouched.
    pub fn skip(&mut self, request: ResolutionRequest) {
        if !self.disposed && request.sequence <= self.last_issued {
            self.stats.skipped += 1;
        }
    }

    /// Tear down; every later event becomes a no-op
    pub fn dispose(&mut self) {
        self.disposed = true;
    }

    fn issue(&mut self, target: GeoLocation) -> ResolutionRequest {
        self.last_issued = self.last_issued.next();
        self.stats.issued += 1;
        ResolutionRequest::new(self.last_issued, target)
    }

    fn finish_seeding(&mut self, outcome: SeedOutcome) {
        if self.phase != ResolverPhase::Ready {
            self.phase = ResolverPhase::Ready;
            self.seed_outcome = Some(outcome);
        }
    }

    /// Current phase
    #[must_use]
    pub const fn phase(&self) -> ResolverPhase {
        self.phase
    }

    /// Currently displayed point
    #[must_use]
    pub const fn marker(&self) -> Option<GeoLocation> {
        self.marker
    }

    /// Last applied location
    #[must_use]
    pub const fn location(&self) -> &Location {
        &self.location
    }

    /// Highest sequence issued
    #[must_use]
    pub const fn last_issued(&self) -> RequestSequence {
        self.last_issued
    }

    /// Highest sequence applied
    #[must_use]
    pub const fn last_applied(&self) -> RequestSequence {
        self.last_applied
    }

    /// Whether teardown happened
    #[must_use]
    pub const fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Response counters
    #[must_use]
    pub const fn stats(&self) -> ResolverStats {
        self.stats
    }

    /// Copy of the observable state
    #[must_use]
    pub fn snapshot(&self) -> ResolverSnapshot {
        ResolverSnapshot {
            phase: self.phase,
            seed_outcome: self.seed_outcome,
            marker: self.marker,
            location: self.location.clone(),
            last_issued: self.last_issued,
            last_applied: self.last_applied,
            awaiting_position: self.position_requested
                && !self.position_settled
                && !self.disposed,
            disposed: self.disposed,
            stats: self.stats,
        }
    }
}
