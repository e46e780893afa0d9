//! End-to-end resolver tests against mocked location services
//!
//! The resolver runs with the real Nominatim and IP geolocation adapters;
//! wiremock stands in for the HTTP services so response order can be forced
//! with per-request delays.

use std::sync::Arc;
use std::time::Duration;

use application::{ChannelLocationSink, LocationResolver, ResolverHandle, ResolverPhase, SeedOutcome};
use domain::{GeoLocation, Location};
use infrastructure::{
    PositionConfig, PositionProvider, geocoding_port_from_config, position_port_from_config,
};
use integration_location::NominatimConfig;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WAIT: Duration = Duration::from_secs(5);

fn point_a() -> GeoLocation {
    GeoLocation::new(12.9, 77.6).unwrap()
}

fn point_b() -> GeoLocation {
    GeoLocation::new(13.05, 77.55).unwrap()
}

fn reverse_body(address: &str) -> String {
    serde_json::json!({ "place_id": 1, "display_name": address }).to_string()
}

async fn mount_reverse(server: &MockServer, at: GeoLocation, address: &str, delay: Duration) {
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("lat", at.latitude().to_string()))
        .and(query_param("lon", at.longitude().to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(reverse_body(address))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

fn geocoder_config(server: &MockServer) -> NominatimConfig {
    NominatimConfig {
        base_url: server.uri(),
        ..NominatimConfig::for_testing()
    }
}

async fn settle(handle: &ResolverHandle) {
    tokio::time::timeout(WAIT, handle.settled())
        .await
        .expect("resolver did not settle")
        .unwrap();
}

fn drain(updates: &mut mpsc::UnboundedReceiver<Location>) -> Vec<Location> {
    let mut seen = Vec::new();
    while let Ok(location) = updates.try_recv() {
        seen.push(location);
    }
    seen
}

#[tokio::test]
async fn slow_first_click_never_overwrites_second() {
    let server = MockServer::start().await;
    mount_reverse(&server, point_a(), "Slow street", Duration::from_millis(600)).await;
    mount_reverse(&server, point_b(), "Fast street", Duration::ZERO).await;

    let position = position_port_from_config(&PositionConfig {
        provider: PositionProvider::Disabled,
        ..Default::default()
    })
    .unwrap();
    let geocoder = geocoding_port_from_config(&geocoder_config(&server)).unwrap();
    let (sink, mut updates) = ChannelLocationSink::channel();

    let handle = LocationResolver::new(position, Arc::new(sink))
        .with_geocoder(geocoder)
        .spawn(None);

    handle.click(point_a()).await.unwrap();
    handle.click(point_b()).await.unwrap();
    settle(&handle).await;

    let seen = drain(&mut updates);
    assert_eq!(seen, vec![Location::new(point_b(), Some("Fast street".to_string()))]);

    let snapshot = handle.snapshot();
    assert_eq!(snapshot.marker, Some(point_b()));
    assert_eq!(snapshot.stats.applied, 1);
    assert_eq!(snapshot.stats.discarded, 1);

    handle.unmount().await.unwrap();
}

#[tokio::test]
async fn device_position_seeds_marker_and_address() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"status":"success","lat":12.9716,"lon":77.5946}"#),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_reverse(&server, GeoLocation::bengaluru(), "Bengaluru, Karnataka, India", Duration::ZERO).await;

    let position = position_port_from_config(&PositionConfig {
        provider: PositionProvider::Ip,
        base_url: server.uri(),
        timeout_secs: 2,
        fixed: None,
    })
    .unwrap();
    let geocoder = geocoding_port_from_config(&geocoder_config(&server)).unwrap();
    let (sink, mut updates) = ChannelLocationSink::channel();

    let handle = LocationResolver::new(position, Arc::new(sink))
        .with_geocoder(geocoder)
        .spawn(Some(Location::unset()));

    handle.map_ready().await.unwrap();
    handle.map_ready().await.unwrap();
    settle(&handle).await;

    let seen = drain(&mut updates);
    assert_eq!(
        seen,
        vec![Location::new(
            GeoLocation::bengaluru(),
            Some("Bengaluru, Karnataka, India".to_string())
        )]
    );
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.phase, ResolverPhase::Ready);
    assert_eq!(snapshot.seed_outcome, Some(SeedOutcome::DevicePosition));
}

#[tokio::test]
async fn geocoder_outage_moves_marker_and_keeps_address() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let position = position_port_from_config(&PositionConfig {
        provider: PositionProvider::Disabled,
        ..Default::default()
    })
    .unwrap();
    let geocoder = geocoding_port_from_config(&geocoder_config(&server)).unwrap();
    let (sink, mut updates) = ChannelLocationSink::channel();

    let explicit = Location::new(point_a(), Some("Listing street".to_string()));
    let handle = LocationResolver::new(position, Arc::new(sink))
        .with_geocoder(geocoder)
        .spawn(Some(explicit));

    handle.map_ready().await.unwrap();
    handle.click(point_b()).await.unwrap();
    settle(&handle).await;

    let seen = drain(&mut updates);
    assert_eq!(
        seen,
        vec![Location::new(point_b(), Some("Listing street".to_string()))]
    );
}

#[tokio::test]
async fn unmounted_resolver_drops_late_response() {
    let server = MockServer::start().await;
    mount_reverse(&server, point_a(), "Too late", Duration::from_millis(300)).await;

    let position = position_port_from_config(&PositionConfig {
        provider: PositionProvider::Disabled,
        ..Default::default()
    })
    .unwrap();
    let geocoder = geocoding_port_from_config(&geocoder_config(&server)).unwrap();
    let (sink, mut updates) = ChannelLocationSink::channel();

    let handle = LocationResolver::new(position, Arc::new(sink))
        .with_geocoder(geocoder)
        .spawn(None);
    handle.click(point_a()).await.unwrap();
    handle.unmount().await.unwrap();

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(drain(&mut updates).is_empty());
    assert_eq!(server.received_requests().await.map(|r| r.len()), Some(1));
}
