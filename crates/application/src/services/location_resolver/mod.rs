//! Location resolver
//!
//! Determines the single point a listing is placed at by reconciling three
//! racing sources: a caller-supplied location, the device position and map
//! clicks. Every click (and an adopted device fix) issues a reverse-geocode
//! request tagged with a sequence number; a response only reaches the form if
//! no newer request was issued in the meantime.
//!
//! # Concurrency
//!
//! The resolver runs as a single task draining one event queue. Map events
//! from the [`ResolverHandle`] and completions of the device-position and
//! geocode lookups (each running in its own spawned task) are posted to the
//! same queue and applied one at a time, so [`ResolverState`] needs no locks.
//! Lookups are never aborted; once superseded or after unmount their results
//! are simply ignored.

mod state;
mod view;

use std::sync::Arc;
use std::time::Duration;

use domain::{GeoLocation, Location, ResolutionRequest};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::error::ApplicationError;
use crate::ports::{
    GeocodeError, GeocodingPort, LocationSink, PositionError, PositionPort, ReverseGeocode,
};

pub use state::{
    PositionOutcome, ResolverPhase, ResolverSnapshot, ResolverState, ResolverStats, SeedOutcome,
};
pub use view::{DEFAULT_ZOOM, MARKER_ZOOM, MapView};

/// Resolver tuning
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Map centre shown while no marker is set
    pub default_center: GeoLocation,
    /// Upper bound for the device-position lookup (`None` waits forever)
    pub position_timeout: Option<Duration>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_center: GeoLocation::india_center(),
            position_timeout: None,
        }
    }
}

impl ResolverConfig {
    /// Set the default map centre
    #[must_use]
    pub const fn with_default_center(mut self, center: GeoLocation) -> Self {
        self.default_center = center;
        self
    }

    /// Bound the device-position lookup
    #[must_use]
    pub const fn with_position_timeout(mut self, timeout: Duration) -> Self {
        self.position_timeout = Some(timeout);
        self
    }
}

/// Events reported by the map surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapEvent {
    /// The map finished loading
    Ready,
    /// The user clicked a point (already converted from pixels)
    Click(GeoLocation),
    /// The map is going away
    Unmount,
}

#[derive(Debug)]
enum ResolverEvent {
    Map {
        event: MapEvent,
        ack: Option<oneshot::Sender<()>>,
    },
    PositionSettled(Result<GeoLocation, PositionError>),
    GeocodeSettled {
        request: ResolutionRequest,
        result: Result<ReverseGeocode, GeocodeError>,
    },
}

/// Builder and entry point for a resolver instance
pub struct LocationResolver {
    position: Arc<dyn PositionPort>,
    geocoder: Option<Arc<dyn GeocodingPort>>,
    sink: Arc<dyn LocationSink>,
    config: ResolverConfig,
}

impl std::fmt::Debug for LocationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationResolver")
            .field("position", &"<PositionPort>")
            .field("geocoder", &self.geocoder.is_some())
            .field("sink", &"<LocationSink>")
            .field("config", &self.config)
            .finish()
    }
}

impl LocationResolver {
    /// Create a resolver reading the device position from `position` and
    /// reporting updates to `sink`
    #[must_use]
    pub fn new(position: Arc<dyn PositionPort>, sink: Arc<dyn LocationSink>) -> Self {
        Self {
            position,
            geocoder: None,
            sink,
            config: ResolverConfig::default(),
        }
    }

    /// Reverse-geocode resolved points with `geocoder`
    ///
    /// Without a geocoder, clicks report coordinates immediately and the
    /// address is never filled in.
    #[must_use]
    pub fn with_geocoder(mut self, geocoder: Arc<dyn GeocodingPort>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    /// Set the resolver configuration
    #[must_use]
    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Mount the resolver, seeding it from `initial`
    ///
    /// Must be called from within a Tokio runtime.
    #[instrument(skip(self, initial))]
    pub fn spawn(self, initial: Option<Location>) -> ResolverHandle {
        let mut state = ResolverState::new();
        state.begin(initial);
        info!(phase = ?state.phase(), marker = ?state.marker(), "Location resolver mounted");

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(state.snapshot());

        let task = ResolverTask {
            state,
            position: self.position,
            geocoder: self.geocoder,
            sink: self.sink,
            position_timeout: self.config.position_timeout,
            events_tx: events_tx.clone(),
            events_rx,
            snapshots: snapshot_tx,
        };

        ResolverHandle {
            events: events_tx,
            snapshots: snapshot_rx,
            default_center: self.config.default_center,
            task: Some(tokio::spawn(task.run())),
        }
    }
}

/// Owner-side handle of a mounted resolver
///
/// Dropping the handle unmounts the resolver.
#[derive(Debug)]
pub struct ResolverHandle {
    events: mpsc::UnboundedSender<ResolverEvent>,
    snapshots: watch::Receiver<ResolverSnapshot>,
    default_center: GeoLocation,
    task: Option<JoinHandle<()>>,
}

impl ResolverHandle {
    /// Deliver a map event and wait until the resolver has processed it
    ///
    /// Processing a click only moves the marker and issues the lookup; this
    /// never waits for the network.
    pub async fn dispatch(&self, event: MapEvent) -> Result<(), ApplicationError> {
        let (ack, processed) = oneshot::channel();
        self.events
            .send(ResolverEvent::Map {
                event,
                ack: Some(ack),
            })
            .map_err(|_| ApplicationError::ResolverClosed)?;
        processed.await.map_err(|_| ApplicationError::ResolverClosed)
    }

    /// Report that the map is ready
    pub async fn map_ready(&self) -> Result<(), ApplicationError> {
        self.dispatch(MapEvent::Ready).await
    }

    /// Report a map click
    pub async fn click(&self, target: GeoLocation) -> Result<(), ApplicationError> {
        self.dispatch(MapEvent::Click(target)).await
    }

    /// Unmount the resolver and wait for its task to finish
    ///
    /// Lookups still in flight complete in the background; their results are
    /// dropped.
    pub async fn unmount(mut self) -> Result<(), ApplicationError> {
        let result = self.dispatch(MapEvent::Unmount).await;
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(error = %err, "Location resolver task ended abnormally");
            }
        }
        result
    }

    /// Current observable state
    #[must_use]
    pub fn snapshot(&self) -> ResolverSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Currently displayed marker
    #[must_use]
    pub fn marker(&self) -> Option<GeoLocation> {
        self.snapshots.borrow().marker
    }

    /// Last location reported to the form
    #[must_use]
    pub fn location(&self) -> Location {
        self.snapshots.borrow().location.clone()
    }

    /// Viewport the map should show
    #[must_use]
    pub fn view(&self) -> MapView {
        self.snapshots.borrow().view(self.default_center)
    }

    /// Wait until no device or geocode lookup is in flight
    ///
    /// A device fetch that a click already overtook still counts until its
    /// result arrives and is discarded. Resolves immediately after unmount.
    pub async fn settled(&self) -> Result<ResolverSnapshot, ApplicationError> {
        let mut snapshots = self.snapshots.clone();
        let snapshot = snapshots
            .wait_for(ResolverSnapshot::is_idle)
            .await
            .map_err(|_| ApplicationError::ResolverClosed)?;
        Ok(snapshot.clone())
    }

    /// Watch snapshots as they are published
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ResolverSnapshot> {
        self.snapshots.clone()
    }

    /// Whether the resolver stopped accepting events
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.events.is_closed()
    }
}

impl Drop for ResolverHandle {
    fn drop(&mut self) {
        if self.task.is_some() {
            let _ = self.events.send(ResolverEvent::Map {
                event: MapEvent::Unmount,
                ack: None,
            });
        }
    }
}

struct ResolverTask {
    state: ResolverState,
    position: Arc<dyn PositionPort>,
    geocoder: Option<Arc<dyn GeocodingPort>>,
    sink: Arc<dyn LocationSink>,
    position_timeout: Option<Duration>,
    events_tx: mpsc::UnboundedSender<ResolverEvent>,
    events_rx: mpsc::UnboundedReceiver<ResolverEvent>,
    snapshots: watch::Sender<ResolverSnapshot>,
}

impl ResolverTask {
    async fn run(mut self) {
        while let Some(event) = self.events_rx.recv().await {
            match event {
                ResolverEvent::Map { event, ack } => {
                    let keep_running = self.on_map_event(event);
                    self.publish();
                    if let Some(ack) = ack {
                        let _ = ack.send(());
                    }
                    if !keep_running {
                        break;
                    }
                },
                ResolverEvent::PositionSettled(result) => {
                    self.on_position(result);
                    self.publish();
                },
                ResolverEvent::GeocodeSettled { request, result } => {
                    self.on_geocode(request, result);
                    self.publish();
                },
            }
        }
        debug!("Location resolver stopped");
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.state.snapshot());
    }

    fn on_map_event(&mut self, event: MapEvent) -> bool {
        match event {
            MapEvent::Ready => {
                if self.state.on_map_ready() {
                    debug!("Map ready, requesting device position");
                    self.fetch_position();
                }
                true
            },
            MapEvent::Click(target) => {
                if let Some(request) = self.state.on_click(target) {
                    debug!(sequence = %request.sequence, position = %target, "Marker moved by click");
                    self.resolve(request);
                }
                true
            },
            MapEvent::Unmount => {
                self.state.dispose();
                info!(
                    last_issued = %self.state.last_issued(),
                    last_applied = %self.state.last_applied(),
                    "Location resolver unmounted"
                );
                false
            },
        }
    }

    fn fetch_position(&self) {
        let position = Arc::clone(&self.position);
        let limit = self.position_timeout;
        let events = self.events_tx.clone();

        tokio::spawn(async move {
            let lookup = position.current_position();
            let result = match limit {
                Some(limit) => tokio::time::timeout(limit, lookup)
                    .await
                    .unwrap_or(Err(PositionError::Timeout)),
                None => lookup.await,
            };
            let _ = events.send(ResolverEvent::PositionSettled(result));
        });
    }

    fn resolve(&mut self, request: ResolutionRequest) {
        let Some(geocoder) = &self.geocoder else {
            self.apply(request, None);
            return;
        };

        let geocoder = Arc::clone(geocoder);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = geocoder.reverse_geocode(request.target).await;
            let _ = events.send(ResolverEvent::GeocodeSettled { request, result });
        });
    }

    fn on_position(&mut self, result: Result<GeoLocation, PositionError>) {
        match self.state.on_position(result) {
            PositionOutcome::Adopted(request) => {
                info!(sequence = %request.sequence, position = %request.target, "Adopted device position");
                if self.geocoder.is_some() {
                    self.resolve(request);
                } else {
                    // Only clicks write bare coordinates to the form.
                    self.state.skip(request);
                }
            },
            PositionOutcome::Failed(err) => {
                warn!(error = %err, "Device position unavailable, showing default view");
            },
            PositionOutcome::Discarded => {
                debug!("Device position arrived after the marker was set, ignoring");
            },
        }
    }

    fn on_geocode(
        &mut self,
        request: ResolutionRequest,
        result: Result<ReverseGeocode, GeocodeError>,
    ) {
        let address = match result {
            Ok(found) => Some(found.formatted_address),
            Err(err) => {
                warn!(sequence = %request.sequence, error = %err, "Reverse geocoding failed, keeping previous address");
                None
            },
        };
        self.apply(request, address);
    }

    fn apply(&mut self, request: ResolutionRequest, address: Option<String>) {
        match self.state.on_resolved(request, address) {
            Some(location) => {
                let location = location.clone();
                debug!(sequence = %request.sequence, %location, "Location updated");
                self.publish();
                self.sink.location_changed(&location);
            },
            None => {
                debug!(sequence = %request.sequence, "Dropping superseded geocode response");
            },
        }
    }
}
