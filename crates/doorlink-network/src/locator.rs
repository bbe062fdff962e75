//! Access server discovery and location caching.
//!
//! Scanner nodes are not configured with the access server's address. They
//! find it by sweeping their own /24 subnet with identity probes and cache
//! the first host that answers with the expected identity. This module owns
//! that sweep, the cached location, and the retry and re-verification
//! schedule around it.
//!
//! # Discovery Algorithm
//!
//! ```text
//! local address 192.168.0.37
//!         │
//!         ├─> probe 192.168.0.1:8080  ──┐
//!         ├─> probe 192.168.0.2:8080    ├── identity_probe, short timeouts,
//!         │   ...        (skip .37)     │   bounded concurrency
//!         └─> probe 192.168.0.254:8080 ──┘
//!                     │
//!                     └─> first host answering with kind=identity,
//!                         device_type=access_server and the expected
//!                         identity wins
//! ```
//!
//! A host that answers the probe with the wrong identity is skipped, so a
//! second doorlink deployment on the same subnet cannot capture this door's
//! scanners.
//!
//! # Caching and Re-verification
//!
//! A found location is cached and reused for every submission. Once the
//! cache is older than [`LOCATION_REVERIFY_INTERVAL_MS`] the location is
//! re-probed before use; a failed re-probe discards it. Callers also
//! [`invalidate`](ServerLocator::invalidate) the cache when a submission
//! fails against a cached address, which clears the retry clock and allows
//! an immediate rescan.
//!
//! # Retry Schedule
//!
//! While no server is located, full sweeps are spaced at least
//! [`LOCATE_RETRY_INTERVAL_MS`] apart so an empty subnet is not hammered.
//!
//! # Example Usage
//!
//! ```no_run
//! use doorlink_network::{LocatorConfig, ServerLocator};
//! use doorlink_core::DeviceIdentity;
//! use std::time::Instant;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let target = DeviceIdentity::new("E4:5F:01:8D:26:5A")?;
//! let mut locator = ServerLocator::new(LocatorConfig::new(target));
//!
//! match locator.current(Instant::now()).await {
//!     Some(location) => println!("Access server at {}", location.addr),
//!     None => println!("Access server not located yet"),
//! }
//! # Ok(())
//! # }
//! ```

use doorlink_core::constants::{
    DEFAULT_SERVER_PORT, LOCATE_RETRY_INTERVAL_MS, LOCATION_REVERIFY_INTERVAL_MS, SUBNET_HOST_MAX,
    SUBNET_HOST_MIN,
};
use doorlink_core::{DeviceIdentity, DeviceKind};
use doorlink_protocol::{Request, Response};
use futures::StreamExt;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

use crate::client::{RequestClient, RequestClientConfig};

/// How many probes run at once during a sweep.
///
/// Bounded so a sweep does not open 253 sockets at the same time; with the
/// probe timeouts this keeps a full sweep of a silent subnet under a few
/// seconds.
const DEFAULT_SWEEP_CONCURRENCY: usize = 32;

/// Where sweep candidates come from
#[derive(Debug, Clone)]
pub enum CandidateSource {
    /// Every host on the local /24, own address excluded
    LocalSubnet,

    /// A fixed candidate list, probed in the same way as a sweep
    ///
    /// Used by deployments that know the handful of addresses the server
    /// may live at, and by tests.
    Fixed(Vec<SocketAddr>),
}

/// Configuration for the server locator
#[derive(Debug, Clone)]
pub struct LocatorConfig {
    /// Identity the access server must present to be accepted
    pub target_identity: DeviceIdentity,

    /// Device type the probe answer must carry
    pub expected_kind: DeviceKind,

    /// Port probed on every candidate host
    pub port: u16,

    /// Which hosts a sweep probes
    pub candidates: CandidateSource,

    /// Timeouts for individual probes
    pub probe: RequestClientConfig,

    /// Minimum spacing between full sweeps while unlocated
    pub retry_interval: Duration,

    /// Age after which a cached location must be re-verified before use
    pub reverify_interval: Duration,

    /// Number of concurrent probes during a sweep
    pub concurrency: usize,
}

impl LocatorConfig {
    /// Standard configuration for locating the access server
    ///
    /// # Example
    ///
    /// ```
    /// use doorlink_network::LocatorConfig;
    /// use doorlink_core::DeviceIdentity;
    ///
    /// let target = DeviceIdentity::new("E4:5F:01:8D:26:5A").unwrap();
    /// let config = LocatorConfig::new(target);
    /// assert_eq!(config.port, 8080);
    /// assert_eq!(config.retry_interval.as_secs(), 30);
    /// assert_eq!(config.reverify_interval.as_secs(), 300);
    /// ```
    pub fn new(target_identity: DeviceIdentity) -> Self {
        Self {
            target_identity,
            expected_kind: DeviceKind::AccessServer,
            port: DEFAULT_SERVER_PORT,
            candidates: CandidateSource::LocalSubnet,
            probe: RequestClientConfig::probe(),
            retry_interval: Duration::from_millis(LOCATE_RETRY_INTERVAL_MS),
            reverify_interval: Duration::from_millis(LOCATION_REVERIFY_INTERVAL_MS),
            concurrency: DEFAULT_SWEEP_CONCURRENCY,
        }
    }
}

/// A verified access server location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerLocation {
    /// Where the server answered
    pub addr: SocketAddr,

    /// When the identity was last confirmed
    pub verified_at: Instant,
}

/// Locates the access server and caches the result
///
/// The locator is driven with explicit instants so the retry and
/// re-verification schedule is deterministic under test. Service loops call
/// [`current`](ServerLocator::current) whenever they need the server; the
/// locator decides internally whether the cache is usable, needs
/// re-verification, or a sweep is due.
pub struct ServerLocator {
    config: LocatorConfig,
    client: RequestClient,
    location: Option<ServerLocation>,
    last_attempt: Option<Instant>,
}

impl ServerLocator {
    /// Create a locator with nothing cached
    pub fn new(config: LocatorConfig) -> Self {
        let client = RequestClient::new(config.probe.clone());
        Self {
            config,
            client,
            location: None,
            last_attempt: None,
        }
    }

    /// Locator configuration
    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    /// Cached location, if any, without freshness checks
    pub fn cached(&self) -> Option<ServerLocation> {
        self.location
    }

    /// Pin a known server address
    ///
    /// Used for deployments that configure the server address instead of
    /// discovering it. The address is subject to the same re-verification
    /// as a discovered one.
    pub fn install(&mut self, addr: SocketAddr, now: Instant) {
        info!("Using configured access server address {}", addr);
        self.location = Some(ServerLocation {
            addr,
            verified_at: now,
        });
    }

    /// Discard the cached location and the retry clock
    ///
    /// Called after a submission fails against the cached address. Clearing
    /// the retry clock lets the next [`current`](ServerLocator::current)
    /// call sweep immediately instead of waiting out the interval.
    pub fn invalidate(&mut self) {
        if let Some(loc) = self.location.take() {
            info!("Dropping access server location {}", loc.addr);
        }
        self.last_attempt = None;
    }

    /// Whether a sweep would run if the server were needed now
    pub fn scan_due(&self, now: Instant) -> bool {
        if self.location.is_some() {
            return false;
        }
        match self.last_attempt {
            None => true,
            Some(at) => now.duration_since(at) >= self.config.retry_interval,
        }
    }

    /// Get a usable server location, performing whatever work that takes
    ///
    /// - A fresh cached location is returned as is
    /// - A stale cached location is re-probed first; on failure it is
    ///   discarded and a sweep may follow immediately
    /// - With nothing cached, a subnet sweep runs if one is due
    ///
    /// Returns `None` when the server cannot be located right now. The
    /// caller reports unreachable and tries again on a later tick.
    pub async fn current(&mut self, now: Instant) -> Option<ServerLocation> {
        if let Some(loc) = self.location {
            if now.duration_since(loc.verified_at) < self.config.reverify_interval {
                return Some(loc);
            }

            debug!("Cached location {} is stale; re-verifying", loc.addr);
            if self.probe(loc.addr).await {
                let refreshed = ServerLocation {
                    addr: loc.addr,
                    verified_at: now,
                };
                self.location = Some(refreshed);
                return Some(refreshed);
            }

            info!("Server at {} failed re-verification", loc.addr);
            self.invalidate();
        }

        if !self.scan_due(now) {
            return None;
        }
        self.locate_now(now).await
    }

    /// Sweep the configured candidates for the access server, unconditionally
    ///
    /// Records the attempt for the retry schedule and caches the location
    /// on success. Most callers want [`current`](ServerLocator::current),
    /// which consults the schedule first.
    pub async fn locate_now(&mut self, now: Instant) -> Option<ServerLocation> {
        let port = self.config.port;
        let candidates: Vec<SocketAddr> = match &self.config.candidates {
            CandidateSource::LocalSubnet => {
                let Some(local) = local_ipv4() else {
                    warn!("No local IPv4 address; cannot sweep for the access server");
                    self.last_attempt = Some(now);
                    return None;
                };

                let [a, b, c, _] = local.octets();
                info!(
                    "Sweeping {}/24 for the access server (port {})",
                    Ipv4Addr::new(a, b, c, 0),
                    port
                );

                subnet_hosts(local)
                    .map(|host| SocketAddr::from((host, port)))
                    .collect()
            }
            CandidateSource::Fixed(addrs) => {
                debug!("Probing {} configured candidate hosts", addrs.len());
                addrs.clone()
            }
        };

        self.locate_among(&candidates, now).await
    }

    /// Probe an explicit candidate list, first verified identity wins
    ///
    /// Records the attempt and caches the winner exactly like a full sweep.
    pub async fn locate_among(
        &mut self,
        candidates: &[SocketAddr],
        now: Instant,
    ) -> Option<ServerLocation> {
        self.last_attempt = Some(now);

        let concurrency = self.config.concurrency.max(1);
        let this: &Self = self;
        let found = {
            let mut probes = futures::stream::iter(candidates.iter().copied().map(|addr| async move {
                if this.probe(addr).await {
                    Some(addr)
                } else {
                    None
                }
            }))
            .buffer_unordered(concurrency);

            let mut found = None;
            while let Some(result) = probes.next().await {
                if result.is_some() {
                    found = result;
                    break;
                }
            }
            found
        };

        match found {
            Some(addr) => {
                info!("Access server located at {}", addr);
                let location = ServerLocation {
                    addr,
                    verified_at: now,
                };
                self.location = Some(location);
                Some(location)
            }
            None => {
                info!("Sweep finished; access server not found");
                None
            }
        }
    }

    /// Probe one host and check the answer against the expected identity
    pub async fn probe(&self, addr: SocketAddr) -> bool {
        match self.client.request(addr, Request::IdentityProbe).await {
            Ok(Response::Identity {
                device_type,
                identity,
            }) => {
                if device_type == self.config.expected_kind
                    && identity == self.config.target_identity
                {
                    debug!("Identity verified for {}", addr);
                    true
                } else {
                    debug!(
                        %addr,
                        device_type = ?device_type,
                        identity = %identity,
                        "Host answered the probe with a different identity"
                    );
                    false
                }
            }
            Ok(other) => {
                debug!(%addr, response = ?other, "Unexpected probe answer");
                false
            }
            Err(e) => {
                trace!("Probe of {} failed: {}", addr, e);
                false
            }
        }
    }
}

/// All candidate hosts on the /24 of the given address, excluding itself
///
/// # Example
///
/// ```
/// use doorlink_network::locator::subnet_hosts;
/// use std::net::Ipv4Addr;
///
/// let hosts: Vec<_> = subnet_hosts(Ipv4Addr::new(192, 168, 0, 37)).collect();
/// assert_eq!(hosts.len(), 253);
/// assert!(!hosts.contains(&Ipv4Addr::new(192, 168, 0, 37)));
/// ```
pub fn subnet_hosts(local: Ipv4Addr) -> impl Iterator<Item = Ipv4Addr> {
    let [a, b, c, own] = local.octets();
    (SUBNET_HOST_MIN..=SUBNET_HOST_MAX)
        .filter(move |host| *host != own)
        .map(move |host| Ipv4Addr::new(a, b, c, host))
}

/// Local IPv4 address as seen by the routing table
///
/// Connects a UDP socket to a public address to let the kernel pick the
/// outgoing interface. No packet is sent; connect on UDP only fixes the
/// route and source address.
fn local_ipv4() -> Option<Ipv4Addr> {
    let socket = std::net::UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    match socket.local_addr().ok()? {
        SocketAddr::V4(v4) => Some(*v4.ip()),
        SocketAddr::V6(_) => None,
    }
}
