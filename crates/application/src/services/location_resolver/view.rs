//! Map viewport policy
//!
//! The map centres on the marker when there is one and otherwise falls back
//! to a continental default. The default is display-only and never becomes
//! part of the reported `Location`.

use domain::GeoLocation;
use serde::{Deserialize, Serialize};

/// Zoom level used when a marker is shown (street level)
pub const MARKER_ZOOM: u8 = 15;

/// Zoom level used for the default continental view
pub const DEFAULT_ZOOM: u8 = 5;

/// What the map surface should display
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    /// Map centre
    pub center: GeoLocation,
    /// Zoom level
    pub zoom: u8,
    /// Whether a marker is drawn at `center`
    pub show_marker: bool,
}

impl MapView {
    /// Viewport for an optional marker
    #[must_use]
    pub const fn for_marker(marker: Option<GeoLocation>, default_center: GeoLocation) -> Self {
        match marker {
            Some(center) => Self {
                center,
                zoom: MARKER_ZOOM,
                show_marker: true,
            },
            None => Self {
                center: default_center,
                zoom: DEFAULT_ZOOM,
                show_marker: false,
            },
        }
    }
}
