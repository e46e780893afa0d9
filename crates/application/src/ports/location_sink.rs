//! Location output sink
//!
//! The surrounding form receives every atomic `Location` update through this
//! port. Calls happen on the resolver's event loop and must not block.

use domain::Location;
#[cfg(test)]
use mockall::automock;
use tokio::sync::mpsc;
use tracing::debug;

/// Receiver of resolved location updates
#[cfg_attr(test, automock)]
pub trait LocationSink: Send + Sync {
    /// Called once per applied update with the complete new value
    fn location_changed(&self, location: &Location);
}

/// Sink that forwards every update into an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelLocationSink {
    tx: mpsc::UnboundedSender<Location>,
}

impl ChannelLocationSink {
    /// Create a sink together with the receiving end of its channel
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Location>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl LocationSink for ChannelLocationSink {
    fn location_changed(&self, location: &Location) {
        if self.tx.send(location.clone()).is_err() {
            debug!("Location update dropped, receiver is gone");
        }
    }
}

#[cfg(test)]
mod tests {
    use domain::GeoLocation;

    use super::*;

    #[test]
    fn channel_sink_forwards_updates() {
        let (sink, mut rx) = ChannelLocationSink::channel();
        let location = Location::at(GeoLocation::bengaluru());

        sink.location_changed(&location);

        assert_eq!(rx.try_recv().unwrap(), location);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn channel_sink_tolerates_dropped_receiver() {
        let (sink, rx) = ChannelLocationSink::channel();
        drop(rx);
        sink.location_changed(&Location::unset());
    }

    #[test]
    fn mock_sink_records_calls() {
        let mut mock = MockLocationSink::new();
        mock.expect_location_changed()
            .withf(|l| l.address() == Some("Addr"))
            .times(1)
            .return_const(());

        mock.location_changed(&Location::new(GeoLocation::bengaluru(), Some("Addr".to_string())));
    }
}
