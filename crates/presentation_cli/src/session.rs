//! Interactive resolver session
//!
//! Reads map events line by line and prints every location update and state
//! dump as a single JSON line.
//!
//! ```text
//! ready                 map finished loading
//! click <lat> <lng>     user clicked a point
//! show                  print the current state
//! settle                wait for outstanding lookups, then print the state
//! quit                  unmount immediately
//! ```

use std::time::Duration;

use application::{MapView, ResolverHandle, ResolverSnapshot};
use domain::{DomainError, GeoLocation, Location};
use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// A parsed session line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionCommand {
    /// Map finished loading
    Ready,
    /// Map click at the given point
    Click(GeoLocation),
    /// Print the current state
    Show,
    /// Wait for outstanding lookups
    Settle,
    /// Stop the session
    Quit,
}

/// Errors for malformed session lines
#[derive(Debug, Error, PartialEq)]
pub enum SessionParseError {
    /// First word is not a known command
    #[error("Unknown command '{0}' (expected ready, click, show, settle or quit)")]
    UnknownCommand(String),

    /// A required argument is missing
    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    /// Extra words after the command
    #[error("Unexpected argument '{0}'")]
    UnexpectedArgument(String),

    /// Click coordinates could not be used
    #[error(transparent)]
    InvalidCoordinates(#[from] DomainError),
}

/// Parse one input line; blank lines and `#` comments yield `None`
pub fn parse_line(line: &str) -> Result<Option<SessionCommand>, SessionParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (command, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(command, rest)| (command, rest.trim()));

    let parsed = match command.to_lowercase().as_str() {
        "click" => {
            if rest.is_empty() {
                return Err(SessionParseError::MissingArgument("coordinates"));
            }
            return Ok(Some(SessionCommand::Click(rest.parse()?)));
        },
        "ready" => SessionCommand::Ready,
        "show" | "state" => SessionCommand::Show,
        "settle" | "wait" => SessionCommand::Settle,
        "quit" | "exit" => SessionCommand::Quit,
        other => return Err(SessionParseError::UnknownCommand(other.to_string())),
    };

    match rest.split_whitespace().next() {
        Some(extra) => Err(SessionParseError::UnexpectedArgument(extra.to_string())),
        None => Ok(Some(parsed)),
    }
}

/// One line of session output
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionOutput<'a> {
    /// A location was reported to the form
    Location {
        /// New value
        location: &'a Location,
        /// Viewport after the update
        view: MapView,
    },
    /// State dump
    State {
        /// Resolver state
        snapshot: &'a ResolverSnapshot,
        /// Current viewport
        view: MapView,
    },
    /// A line could not be processed
    Error {
        /// What went wrong
        message: String,
    },
}

fn emit(output: &SessionOutput<'_>) {
    match serde_json::to_string(output) {
        Ok(line) => println!("{line}"),
        Err(e) => warn!(error = %e, "Failed to serialize session output"),
    }
}

/// Session tuning
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Map centre used while no marker is set
    pub default_center: GeoLocation,
    /// How long to wait for outstanding lookups on `settle` and end of input
    pub settle_timeout: Duration,
}

/// Drive a mounted resolver from `input` until `quit` or end of input
///
/// Returns the final state after unmounting.
pub async fn run<R>(
    handle: ResolverHandle,
    mut updates: mpsc::UnboundedReceiver<Location>,
    input: R,
    options: SessionOptions,
) -> anyhow::Result<ResolverSnapshot>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut snapshots = handle.subscribe();

    loop {
        tokio::select! {
            Some(location) = updates.recv() => {
                emit_location(&location, options.default_center);
            },
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("End of input, waiting for outstanding lookups");
                    settle(&handle, &mut updates, options).await;
                    break;
                };
                match parse_line(&line) {
                    Ok(None) => {},
                    Ok(Some(SessionCommand::Quit)) => break,
                    Ok(Some(SessionCommand::Ready)) => handle.map_ready().await?,
                    Ok(Some(SessionCommand::Click(point))) => handle.click(point).await?,
                    Ok(Some(SessionCommand::Show)) => {
                        drain(&mut updates, options.default_center);
                        emit_state(&handle.snapshot(), options.default_center);
                    },
                    Ok(Some(SessionCommand::Settle)) => {
                        settle(&handle, &mut updates, options).await;
                        emit_state(&handle.snapshot(), options.default_center);
                    },
                    Err(e) => emit(&SessionOutput::Error { message: e.to_string() }),
                }
            },
        }
    }

    handle.unmount().await?;
    drain(&mut updates, options.default_center);

    let snapshot = snapshots.borrow_and_update().clone();
    emit_state(&snapshot, options.default_center);
    Ok(snapshot)
}

async fn settle(
    handle: &ResolverHandle,
    updates: &mut mpsc::UnboundedReceiver<Location>,
    options: SessionOptions,
) {
    match tokio::time::timeout(options.settle_timeout, handle.settled()).await {
        Ok(Ok(_)) => {},
        Ok(Err(e)) => warn!(error = %e, "Resolver stopped while settling"),
        Err(_) => warn!(
            timeout_secs = options.settle_timeout.as_secs(),
            "Lookups still outstanding, giving up"
        ),
    }
    drain(updates, options.default_center);
}

fn drain(updates: &mut mpsc::UnboundedReceiver<Location>, default_center: GeoLocation) {
    while let Ok(location) = updates.try_recv() {
        emit_location(&location, default_center);
    }
}

fn emit_location(location: &Location, default_center: GeoLocation) {
    let marker = location.is_set().then(|| location.coordinates());
    emit(&SessionOutput::Location {
        location,
        view: MapView::for_marker(marker, default_center),
    });
}

fn emit_state(snapshot: &ResolverSnapshot, default_center: GeoLocation) {
    emit(&SessionOutput::State {
        snapshot,
        view: snapshot.view(default_center),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use application::{ChannelLocationSink, LocationResolver, ResolverPhase, SeedOutcome};
    use infrastructure::{DisabledPositionSource, FixedPositionSource};

    fn options() -> SessionOptions {
        SessionOptions {
            default_center: GeoLocation::india_center(),
            settle_timeout: Duration::from_secs(2),
        }
    }

    #[test]
    fn parse_ready_and_aliases() {
        assert_eq!(parse_line("ready"), Ok(Some(SessionCommand::Ready)));
        assert_eq!(parse_line("  READY "), Ok(Some(SessionCommand::Ready)));
        assert_eq!(parse_line("state"), Ok(Some(SessionCommand::Show)));
        assert_eq!(parse_line("wait"), Ok(Some(SessionCommand::Settle)));
        assert_eq!(parse_line("exit"), Ok(Some(SessionCommand::Quit)));
    }

    #[test]
    fn parse_blank_and_comment_lines() {
        assert_eq!(parse_line(""), Ok(None));
        assert_eq!(parse_line("   "), Ok(None));
        assert_eq!(parse_line("# seed from device"), Ok(None));
    }

    #[test]
    fn parse_click() {
        assert_eq!(
            parse_line("click 12.9716 77.5946"),
            Ok(Some(SessionCommand::Click(GeoLocation::bengaluru())))
        );
        assert_eq!(
            parse_line("click 12.9716, 77.5946"),
            Ok(Some(SessionCommand::Click(GeoLocation::bengaluru())))
        );
    }

    #[test]
    fn parse_click_errors() {
        assert_eq!(
            parse_line("click"),
            Err(SessionParseError::MissingArgument("coordinates"))
        );
        assert_eq!(
            parse_line("click 12.9"),
            Err(SessionParseError::InvalidCoordinates(
                DomainError::InvalidCoordinateInput("12.9".to_string())
            ))
        );
        assert!(matches!(
            parse_line("click north 77.5"),
            Err(SessionParseError::InvalidCoordinates(
                DomainError::InvalidCoordinateInput(_)
            ))
        ));
        assert!(matches!(
            parse_line("click 91 77.5"),
            Err(SessionParseError::InvalidCoordinates(
                DomainError::InvalidCoordinates(_)
            ))
        ));
    }

    #[test]
    fn parse_unknown_and_extra_words() {
        assert_eq!(
            parse_line("zoom 5"),
            Err(SessionParseError::UnknownCommand("zoom".to_string()))
        );
        assert_eq!(
            parse_line("ready now"),
            Err(SessionParseError::UnexpectedArgument("now".to_string()))
        );
    }

    #[test]
    fn output_is_tagged_json() {
        let location = Location::at(GeoLocation::bengaluru());
        let output = SessionOutput::Location {
            location: &location,
            view: MapView::for_marker(Some(GeoLocation::bengaluru()), GeoLocation::india_center()),
        };
        let json: serde_json::Value = serde_json::to_value(&output).unwrap();
        assert_eq!(json["event"], "location");
        assert_eq!(json["location"]["coordinates"]["lat"], 12.9716);
        assert_eq!(json["view"]["zoom"], 15);
    }

    #[tokio::test]
    async fn session_seeds_from_device_then_follows_clicks() {
        let (sink, updates) = ChannelLocationSink::channel();
        let handle = LocationResolver::new(
            Arc::new(FixedPositionSource::new(GeoLocation::bengaluru())),
            Arc::new(sink),
        )
        .spawn(None);

        let input = &b"ready\nsettle\nclick 13.05 77.55\n"[..];
        let snapshot = run(handle, updates, input, options()).await.unwrap();

        assert!(snapshot.disposed);
        assert_eq!(snapshot.seed_outcome, Some(SeedOutcome::DevicePosition));
        assert_eq!(
            snapshot.location,
            Location::at(GeoLocation::new(13.05, 77.55).unwrap())
        );
        assert_eq!(snapshot.stats.applied, 1);
        assert_eq!(snapshot.stats.skipped, 1);
    }

    #[tokio::test]
    async fn session_with_disabled_position_keeps_marker_unset() {
        let (sink, updates) = ChannelLocationSink::channel();
        let handle =
            LocationResolver::new(Arc::new(DisabledPositionSource), Arc::new(sink)).spawn(None);

        let input = &b"ready\nbogus line\n"[..];
        let snapshot = run(handle, updates, input, options()).await.unwrap();

        assert_eq!(snapshot.phase, ResolverPhase::Ready);
        assert_eq!(snapshot.seed_outcome, Some(SeedOutcome::DeviceUnavailable));
        assert!(snapshot.marker.is_none());
        assert!(!snapshot.location.is_set());
    }

    #[tokio::test]
    async fn quit_stops_before_remaining_lines() {
        let (sink, updates) = ChannelLocationSink::channel();
        let handle =
            LocationResolver::new(Arc::new(DisabledPositionSource), Arc::new(sink)).spawn(None);

        let input = &b"quit\nclick 12.9 77.6\n"[..];
        let snapshot = run(handle, updates, input, options()).await.unwrap();

        assert!(snapshot.marker.is_none());
        assert_eq!(snapshot.stats.issued, 0);
    }
}
