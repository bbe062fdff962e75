//! Integration tests for server discovery
//!
//! These tests run the locator against live responders on loopback: the
//! real access server, decoys with the wrong identity or device type, and
//! dead addresses. Candidate lists stand in for the subnet sweep so the
//! tests stay on 127.0.0.1.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use doorlink_core::{DeviceIdentity, DeviceKind};
use doorlink_network::{
    CandidateSource, LocatorConfig, RequestListener, RequestListenerConfig, ServerLocator,
};
use doorlink_protocol::{Request, Response};

const SERVER_IDENTITY: &str = "E4:5F:01:8D:26:5A";
const DECOY_IDENTITY: &str = "B8:27:EB:44:19:C3";

/// Serve identity probes until aborted, counting every probe answered.
async fn spawn_responder(
    device_type: DeviceKind,
    identity: &str,
    probes: Arc<AtomicUsize>,
) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let config = RequestListenerConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        ..Default::default()
    };
    let mut listener = RequestListener::bind(config).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let identity = DeviceIdentity::new(identity).unwrap();

    let handle = tokio::spawn(async move {
        loop {
            match listener.next_request(Duration::from_millis(200)).await {
                Ok(Some((Request::IdentityProbe, responder))) => {
                    probes.fetch_add(1, Ordering::SeqCst);
                    let _ = responder
                        .send(Response::identity(device_type, identity.clone()))
                        .await;
                }
                Ok(Some((_, responder))) => {
                    let _ = responder.send(Response::error(404, "Unknown command")).await;
                }
                Ok(None) => {}
                Err(_) => break,
            }
        }
    });

    (addr, handle)
}

fn locator_for(candidates: Vec<SocketAddr>) -> ServerLocator {
    let mut config = LocatorConfig::new(DeviceIdentity::new(SERVER_IDENTITY).unwrap());
    config.candidates = CandidateSource::Fixed(candidates);
    ServerLocator::new(config)
}

#[tokio::test]
async fn test_sweep_selects_identity_verified_server() {
    let probes = Arc::new(AtomicUsize::new(0));
    let (server_addr, server) =
        spawn_responder(DeviceKind::AccessServer, SERVER_IDENTITY, probes.clone()).await;

    // A dead candidate ahead of the real one must not stop the sweep
    let dead: SocketAddr = "127.0.0.1:1".parse().unwrap();
    let mut locator = locator_for(vec![dead, server_addr]);

    let location = locator
        .current(Instant::now())
        .await
        .expect("server should be located");

    assert_eq!(location.addr, server_addr);
    assert_eq!(locator.cached().map(|loc| loc.addr), Some(server_addr));
    assert!(probes.load(Ordering::SeqCst) >= 1);

    server.abort();
}

#[tokio::test]
async fn test_wrong_identity_host_is_probed_but_not_selected() {
    let probes = Arc::new(AtomicUsize::new(0));
    let (decoy_addr, decoy) =
        spawn_responder(DeviceKind::AccessServer, DECOY_IDENTITY, probes.clone()).await;

    let mut locator = locator_for(vec![decoy_addr]);
    let location = locator.current(Instant::now()).await;

    assert!(location.is_none());
    assert!(locator.cached().is_none());
    // The decoy answered a probe and was rejected on identity
    assert_eq!(probes.load(Ordering::SeqCst), 1);

    decoy.abort();
}

#[tokio::test]
async fn test_wrong_device_type_is_not_selected() {
    // Correct identity but a door controller, not the access server
    let probes = Arc::new(AtomicUsize::new(0));
    let (imposter_addr, imposter) =
        spawn_responder(DeviceKind::DoorController, SERVER_IDENTITY, probes.clone()).await;

    let mut locator = locator_for(vec![imposter_addr]);
    let location = locator.current(Instant::now()).await;

    assert!(location.is_none());
    assert_eq!(probes.load(Ordering::SeqCst), 1);

    imposter.abort();
}

#[tokio::test]
async fn test_decoy_on_subnet_does_not_capture_the_scanner() {
    let decoy_probes = Arc::new(AtomicUsize::new(0));
    let (decoy_addr, decoy) = spawn_responder(
        DeviceKind::AccessServer,
        DECOY_IDENTITY,
        decoy_probes.clone(),
    )
    .await;

    let server_probes = Arc::new(AtomicUsize::new(0));
    let (server_addr, server) = spawn_responder(
        DeviceKind::AccessServer,
        SERVER_IDENTITY,
        server_probes.clone(),
    )
    .await;

    // Decoy listed first; identity verification must still pick the server
    let mut locator = locator_for(vec![decoy_addr, server_addr]);
    let location = locator
        .current(Instant::now())
        .await
        .expect("server should be located");

    assert_eq!(location.addr, server_addr);

    decoy.abort();
    server.abort();
}

#[tokio::test]
async fn test_stale_location_is_reverified_against_live_server() {
    let probes = Arc::new(AtomicUsize::new(0));
    let (server_addr, server) =
        spawn_responder(DeviceKind::AccessServer, SERVER_IDENTITY, probes.clone()).await;

    let mut locator = locator_for(vec![server_addr]);

    let base = Instant::now();
    locator.install(server_addr, base);

    // Within the re-verification age no probe is needed
    let fresh = locator.current(base + Duration::from_secs(200)).await;
    assert_eq!(fresh.map(|loc| loc.addr), Some(server_addr));
    assert_eq!(probes.load(Ordering::SeqCst), 0);

    // Past the age the location is re-probed and the clock refreshed
    let later = base + Duration::from_secs(301);
    let refreshed = locator
        .current(later)
        .await
        .expect("live server should pass re-verification");

    assert_eq!(refreshed.addr, server_addr);
    assert_eq!(refreshed.verified_at, later);
    assert_eq!(probes.load(Ordering::SeqCst), 1);

    server.abort();
}

#[tokio::test]
async fn test_invalidate_allows_immediate_rescan() {
    let probes = Arc::new(AtomicUsize::new(0));
    let (server_addr, server) =
        spawn_responder(DeviceKind::AccessServer, SERVER_IDENTITY, probes.clone()).await;

    let mut locator = locator_for(vec![server_addr]);

    let base = Instant::now();
    locator
        .current(base)
        .await
        .expect("server should be located");

    // A failed submission drops the location; the next need may rescan
    // without waiting out the retry interval
    locator.invalidate();
    let relocated = locator
        .current(base + Duration::from_millis(1))
        .await
        .expect("rescan should run immediately after invalidate");

    assert_eq!(relocated.addr, server_addr);
    assert_eq!(probes.load(Ordering::SeqCst), 2);

    server.abort();
}

#[tokio::test]
async fn test_sweep_stops_at_the_first_verified_server() {
    let server_probes = Arc::new(AtomicUsize::new(0));
    let (server_addr, server) = spawn_responder(
        DeviceKind::AccessServer,
        SERVER_IDENTITY,
        server_probes.clone(),
    )
    .await;

    let trailing_probes = Arc::new(AtomicUsize::new(0));
    let (trailing_addr, trailing) = spawn_responder(
        DeviceKind::AccessServer,
        SERVER_IDENTITY,
        trailing_probes.clone(),
    )
    .await;

    // Dead hosts ahead of the server, a live one behind it. Probing one
    // candidate at a time keeps the order deterministic.
    let mut candidates: Vec<SocketAddr> = (1u16..=10)
        .map(|port| SocketAddr::from(([127, 0, 0, 1], port)))
        .collect();
    candidates.push(server_addr);
    candidates.push(trailing_addr);

    let mut config = LocatorConfig::new(DeviceIdentity::new(SERVER_IDENTITY).unwrap());
    config.candidates = CandidateSource::Fixed(candidates);
    config.concurrency = 1;
    let mut locator = ServerLocator::new(config);

    let location = locator
        .current(Instant::now())
        .await
        .expect("server should be located");

    assert_eq!(location.addr, server_addr);
    assert_eq!(server_probes.load(Ordering::SeqCst), 1);
    // The candidate behind the match was never probed
    assert_eq!(trailing_probes.load(Ordering::SeqCst), 0);

    server.abort();
    trailing.abort();
}

#[tokio::test]
async fn test_all_dead_candidates_find_nothing() {
    let dead: Vec<SocketAddr> = vec![
        "127.0.0.1:1".parse().unwrap(),
        "127.0.0.1:2".parse().unwrap(),
        "127.0.0.1:3".parse().unwrap(),
    ];

    let mut locator = locator_for(dead);
    let location = locator.current(Instant::now()).await;

    assert!(location.is_none());
    assert!(locator.cached().is_none());
}
