//! TCP request listener for door-control messaging.
//!
//! This module provides the serving side of the one-shot request model used
//! across the coordination layer. The door actuator and the access server
//! both answer short-lived connections: a peer connects, sends a single
//! [`Request`], receives one [`Response`], and the connection ends. The
//! listener uses [`ServerCodec`] for newline-delimited JSON framing.
//!
//! # Architecture
//!
//! ```text
//! Entry Scanner ┐
//!               │
//! Exit Scanner  ├──(TCP, one request each)──> RequestListener ──> service loop
//!               │                                  │
//! Access Server ┘                                  └──> ServerCodec
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use doorlink_network::{RequestListener, RequestListenerConfig};
//! use doorlink_protocol::Response;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut listener = RequestListener::bind(RequestListenerConfig::default()).await?;
//!
//! // Poll for one request, waiting at most 100ms
//! if let Some((request, responder)) = listener.next_request(Duration::from_millis(100)).await? {
//!     println!("Received: {:?}", request);
//!     responder.send(Response::error(400, "not handled here")).await?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Design Principles
//!
//! The RequestListener is designed for cooperative service loops:
//! - **Bounded waits**: [`RequestListener::next_request`] never blocks past
//!   its wait budget, so callers can interleave timer work between polls
//! - **One request per connection**: No session state to track
//! - **Misbehaving peers are absorbed**: Malformed frames, silent
//!   connections, and early hangups are logged and reported as "no request"
//!   rather than surfaced as fatal errors
//! - **No authentication, no TLS**: Peers on the door subnet are trusted
//!
//! Only listener socket failures propagate as errors; everything a remote
//! peer can cause is contained.

use doorlink_protocol::{Request, Response, ServerCodec};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;
use tracing::{debug, info, trace, warn};

use doorlink_core::constants::{REQUEST_READ_TIMEOUT_MS, RESPONSE_WRITE_TIMEOUT_MS};

/// Configuration for the request listener
///
/// # Example
///
/// ```
/// use doorlink_network::RequestListenerConfig;
///
/// let config = RequestListenerConfig {
///     bind_addr: "0.0.0.0:8081".parse().unwrap(),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct RequestListenerConfig {
    /// Address to bind the listener to
    pub bind_addr: SocketAddr,

    /// How long an accepted connection may take to deliver its request
    pub read_timeout: Duration,

    /// How long a response write may take before the connection is dropped
    pub write_timeout: Duration,
}

impl Default for RequestListenerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".parse().unwrap(),
            read_timeout: Duration::from_millis(REQUEST_READ_TIMEOUT_MS),
            write_timeout: Duration::from_millis(RESPONSE_WRITE_TIMEOUT_MS),
        }
    }
}

/// Errors that can occur during listener operations
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address
    #[error("Failed to bind to {0}")]
    BindFailed(SocketAddr),

    /// Response write timed out
    #[error("Write timeout after {0}ms")]
    WriteTimeout(u64),

    /// Protocol-level error from the wire codec
    #[error("Protocol error: {0}")]
    Protocol(#[from] doorlink_core::Error),

    /// Low-level I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pending reply handle for an accepted request
///
/// Holds the connection the request arrived on. Consuming [`Responder::send`]
/// enforces exactly one response per request; dropping the responder closes
/// the connection without replying, which the peer sees as a lost connection.
pub struct Responder {
    framed: Framed<TcpStream, ServerCodec>,
    peer: SocketAddr,
    write_timeout: Duration,
}

impl Responder {
    /// Address of the peer that sent the request
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Send the response and close the connection
    ///
    /// # Errors
    ///
    /// Returns an error if the write times out, the encoding fails, or the
    /// peer has already gone away.
    pub async fn send(mut self, response: Response) -> Result<(), ListenerError> {
        trace!(peer = %self.peer, response = ?response, "Sending response");

        match tokio::time::timeout(self.write_timeout, self.framed.send(response)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(ListenerError::Protocol(e)),
            Err(_) => {
                warn!(
                    "Response write to {} timed out after {}ms",
                    self.peer,
                    self.write_timeout.as_millis()
                );
                return Err(ListenerError::WriteTimeout(
                    self.write_timeout.as_millis() as u64
                ));
            }
        }

        // Best-effort graceful shutdown; the response is already flushed
        let mut stream = self.framed.into_inner();
        if let Ok(Err(e)) =
            tokio::time::timeout(Duration::from_millis(500), stream.shutdown()).await
        {
            debug!("Error during shutdown of {}: {}", self.peer, e);
        }

        Ok(())
    }
}

/// TCP listener serving one request per connection
///
/// The `RequestListener` accepts short-lived connections from scanners and
/// other coordination nodes, reads the single request each carries, and
/// hands it to the caller together with a [`Responder`] for the reply.
///
/// # Serving Lifecycle
///
/// 1. Bind with [`RequestListener::bind`]
/// 2. Poll with [`RequestListener::next_request`] from the service loop
/// 3. Answer each request through its [`Responder`]
///
/// # Example
///
/// ```no_run
/// use doorlink_network::{RequestListener, RequestListenerConfig};
/// use doorlink_protocol::{Request, Response};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut listener = RequestListener::bind(RequestListenerConfig::default()).await?;
///
/// loop {
///     let Some((request, responder)) = listener
///         .next_request(Duration::from_millis(100))
///         .await?
///     else {
///         // No request this round; run timer work and poll again
///         continue;
///     };
///
///     let response = match request {
///         Request::Status => Response::error(400, "no status available"),
///         _ => Response::error(404, "Unknown command"),
///     };
///     responder.send(response).await?;
/// }
/// # Ok(())
/// # }
/// ```
pub struct RequestListener {
    /// TCP listener for accepting connections
    listener: TcpListener,

    /// Listener configuration
    config: RequestListenerConfig,
}

impl RequestListener {
    /// Bind the listener to the configured address
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Address is already in use
    /// - Permission denied (e.g., binding to privileged port)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use doorlink_network::{RequestListener, RequestListenerConfig};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let listener = RequestListener::bind(RequestListenerConfig::default()).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn bind(config: RequestListenerConfig) -> Result<Self, ListenerError> {
        info!("Binding request listener to {}", config.bind_addr);

        let listener = TcpListener::bind(config.bind_addr)
            .await
            .map_err(|_| ListenerError::BindFailed(config.bind_addr))?;

        info!("Request listener ready on {}", config.bind_addr);

        Ok(Self { listener, config })
    }

    /// Get the local address the listener is bound to
    ///
    /// This is useful for tests that bind to port 0 (OS-assigned random port).
    pub fn local_addr(&self) -> Result<SocketAddr, ListenerError> {
        self.listener.local_addr().map_err(Into::into)
    }

    /// Wait up to `wait` for the next request
    ///
    /// Accepts at most one connection and reads its request. Returns
    /// `Ok(None)` when nothing actionable arrived within the budget:
    /// - No connection was attempted
    /// - The peer connected but sent nothing within the read timeout
    /// - The peer sent a malformed frame
    /// - The peer hung up before completing a request
    ///
    /// All of those are logged; none of them disturb the service loop.
    ///
    /// # Errors
    ///
    /// Returns an error only for listener socket failures.
    pub async fn next_request(
        &mut self,
        wait: Duration,
    ) -> Result<Option<(Request, Responder)>, ListenerError> {
        let accepted = match tokio::time::timeout(wait, self.listener.accept()).await {
            Ok(Ok(accepted)) => accepted,
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Ok(None),
        };

        let (stream, peer) = accepted;
        debug!("Accepted connection from {}", peer);

        // Set TCP_NODELAY for low latency
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY for {}: {}", peer, e);
        }

        let mut framed = Framed::new(stream, ServerCodec::new());
        match tokio::time::timeout(self.config.read_timeout, framed.next()).await {
            Ok(Some(Ok(request))) => {
                trace!(peer = %peer, request = ?request, "Received request");
                Ok(Some((
                    request,
                    Responder {
                        framed,
                        peer,
                        write_timeout: self.config.write_timeout,
                    },
                )))
            }
            Ok(Some(Err(e))) => {
                warn!("Malformed request from {}: {}", peer, e);
                Ok(None)
            }
            Ok(None) => {
                debug!("Connection from {} closed before a request arrived", peer);
                Ok(None)
            }
            Err(_) => {
                warn!(
                    "Connection from {} sent no request within {}ms",
                    peer,
                    self.config.read_timeout.as_millis()
                );
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{RequestClient, RequestClientConfig};
    use doorlink_core::{DeviceIdentity, DeviceKind};
    use doorlink_protocol::Response;

    fn loopback_config() -> RequestListenerConfig {
        RequestListenerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn test_config_default() {
        let config = RequestListenerConfig::default();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.read_timeout.as_millis(), 500);
        assert_eq!(config.write_timeout.as_millis(), 500);
    }

    #[tokio::test]
    async fn test_bind_and_local_addr() {
        let listener = RequestListener::bind(loopback_config()).await.unwrap();
        let addr = listener.local_addr().unwrap();
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_next_request_times_out_quietly() {
        let mut listener = RequestListener::bind(loopback_config()).await.unwrap();

        let got = listener
            .next_request(Duration::from_millis(50))
            .await
            .unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn test_full_exchange_with_client() {
        let mut listener = RequestListener::bind(loopback_config()).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client_task = tokio::spawn(async move {
            let client = RequestClient::new(RequestClientConfig::default());
            client.request(addr, Request::IdentityProbe).await
        });

        let (request, responder) = listener
            .next_request(Duration::from_millis(1000))
            .await
            .unwrap()
            .expect("request should arrive");
        assert!(matches!(request, Request::IdentityProbe));

        responder
            .send(Response::identity(
                DeviceKind::DoorController,
                DeviceIdentity::new("11:22:33:44:55:66").unwrap(),
            ))
            .await
            .unwrap();

        let response = client_task.await.unwrap().unwrap();
        match response {
            Response::Identity { device_type, .. } => {
                assert_eq!(device_type, DeviceKind::DoorController);
            }
            other => panic!("Unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_request_absorbed() {
        let mut listener = RequestListener::bind(loopback_config()).await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream.write_all(b"this is not json\n").await.unwrap();
        });

        let got = listener
            .next_request(Duration::from_millis(1000))
            .await
            .unwrap();
        assert!(got.is_none());

        // Listener keeps serving afterwards
        let addr2 = listener.local_addr().unwrap();
        assert_eq!(addr, addr2);
    }

    #[tokio::test]
    async fn test_silent_connection_absorbed() {
        let config = RequestListenerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            read_timeout: Duration::from_millis(50),
            ..Default::default()
        };
        let mut listener = RequestListener::bind(config).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let holder = tokio::spawn(async move {
            let stream = TcpStream::connect(addr).await.unwrap();
            tokio::time::sleep(Duration::from_secs(2)).await;
            drop(stream);
        });

        let got = listener
            .next_request(Duration::from_millis(1000))
            .await
            .unwrap();
        assert!(got.is_none());

        holder.abort();
    }

    #[tokio::test]
    async fn test_early_hangup_absorbed() {
        let mut listener = RequestListener::bind(loopback_config()).await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let stream = TcpStream::connect(addr).await.unwrap();
            drop(stream);
        });

        let got = listener
            .next_request(Duration::from_millis(1000))
            .await
            .unwrap();
        assert!(got.is_none());
    }
}
