//! TCP request client for door-control messaging.
//!
//! This module provides a one-shot TCP client for coordination nodes to reach
//! the access server and the door actuator. Every request opens a fresh
//! connection, sends a single [`Request`], waits for the matching [`Response`],
//! and closes. The client uses [`ClientCodec`] for newline-delimited JSON
//! framing with Tokio's async I/O.
//!
//! # Architecture
//!
//! ```text
//! ScannerNode
//!     │
//!     ├─> ScanSubmitter / ServerLocator
//!     │       │
//!     │       └─> RequestClient ───(TCP)───> Access Server / Actuator
//!     │              │
//!     │              └─> ClientCodec (newline-delimited JSON)
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use doorlink_network::{RequestClient, RequestClientConfig};
//! use doorlink_protocol::Request;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RequestClient::new(RequestClientConfig::default());
//!
//! let addr = "192.168.0.100:8080".parse()?;
//! let response = client.request(addr, Request::Status).await?;
//! println!("Received: {:?}", response);
//! # Ok(())
//! # }
//! ```
//!
//! # Design Principles
//!
//! The RequestClient is designed as a simple transport layer:
//! - **One connection per request**: No pooling, no keepalive
//! - **No automatic retry**: Caller decides retry strategy
//! - **Stateless**: A single client can serve probes and submissions alike
//! - **Simple error handling**: Clear errors, no recovery
//!
//! This keeps the client focused and testable, pushing business logic
//! to higher layers like ScanSubmitter and ServerLocator.
//!
//! # Timeout Handling
//!
//! Connection establishment and the request/response exchange have separate
//! configurable timeouts. Discovery probes use short timeouts
//! ([`RequestClientConfig::probe`]) so a subnet sweep does not stall on
//! silent hosts; submissions use the wider defaults. Timeout errors are
//! returned to the caller for appropriate handling.

use doorlink_core::constants::{
    PROBE_CONNECT_TIMEOUT_MS, PROBE_EXCHANGE_TIMEOUT_MS, SUBMIT_TIMEOUT_MS,
};
use doorlink_protocol::{ClientCodec, Request, Response};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, error, trace, warn};

/// Configuration for the request client
///
/// # Example
///
/// ```
/// use doorlink_network::RequestClientConfig;
/// use std::time::Duration;
///
/// let config = RequestClientConfig {
///     connect_timeout: Duration::from_millis(1000),
///     exchange_timeout: Duration::from_millis(2000),
/// };
/// ```
#[derive(Debug, Clone)]
pub struct RequestClientConfig {
    /// Timeout for establishing the TCP connection
    pub connect_timeout: Duration,

    /// Timeout applied separately to the send and receive halves of the
    /// exchange
    pub exchange_timeout: Duration,
}

impl RequestClientConfig {
    /// Short-timeout configuration for discovery probes
    ///
    /// A sweep touches every host on the subnet, most of which do not
    /// answer. Probe timeouts keep the per-host cost bounded.
    ///
    /// # Example
    ///
    /// ```
    /// use doorlink_network::RequestClientConfig;
    ///
    /// let config = RequestClientConfig::probe();
    /// assert_eq!(config.connect_timeout.as_millis(), 250);
    /// assert_eq!(config.exchange_timeout.as_millis(), 500);
    /// ```
    pub fn probe() -> Self {
        Self {
            connect_timeout: Duration::from_millis(PROBE_CONNECT_TIMEOUT_MS),
            exchange_timeout: Duration::from_millis(PROBE_EXCHANGE_TIMEOUT_MS),
        }
    }
}

impl Default for RequestClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(SUBMIT_TIMEOUT_MS),
            exchange_timeout: Duration::from_millis(SUBMIT_TIMEOUT_MS),
        }
    }
}

/// Errors that can occur during a request exchange
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection attempt timed out
    #[error("Connection timeout after {0}ms")]
    ConnectionTimeout(u64),

    /// Read operation timed out
    #[error("Read timeout after {0}ms")]
    ReadTimeout(u64),

    /// Write operation timed out
    #[error("Write timeout after {0}ms")]
    WriteTimeout(u64),

    /// Connection was lost during the exchange
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// Protocol-level error from the wire codec
    #[error("Protocol error: {0}")]
    Protocol(#[from] doorlink_core::Error),

    /// Low-level I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One-shot TCP client for door-control requests
///
/// The `RequestClient` opens a connection per request, exchanges exactly one
/// request/response pair, and closes. It handles message framing via
/// [`ClientCodec`] and timeout enforcement.
///
/// # Request Lifecycle
///
/// 1. Connect to the target address (bounded by `connect_timeout`)
/// 2. Send the request (bounded by `exchange_timeout`)
/// 3. Wait for the response (bounded by `exchange_timeout`)
/// 4. Close the connection gracefully
///
/// # Example
///
/// ```no_run
/// use doorlink_network::{RequestClient, RequestClientConfig};
/// use doorlink_protocol::{Request, Response};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RequestClient::new(RequestClientConfig::probe());
///
/// let addr = "192.168.0.37:8080".parse()?;
/// match client.request(addr, Request::IdentityProbe).await? {
///     Response::Identity { identity, .. } => println!("Found {}", identity),
///     other => println!("Unexpected reply: {:?}", other),
/// }
/// # Ok(())
/// # }
/// ```
pub struct RequestClient {
    /// Timeout for establishing the TCP connection
    connect_timeout: Duration,

    /// Timeout for each half of the exchange
    exchange_timeout: Duration,
}

impl RequestClient {
    /// Create a new request client with the given configuration
    ///
    /// # Example
    ///
    /// ```
    /// use doorlink_network::{RequestClient, RequestClientConfig};
    ///
    /// let client = RequestClient::new(RequestClientConfig::default());
    /// ```
    pub fn new(config: RequestClientConfig) -> Self {
        Self {
            connect_timeout: config.connect_timeout,
            exchange_timeout: config.exchange_timeout,
        }
    }

    /// Send a request to the given address and wait for the response
    ///
    /// Opens a fresh connection, performs one request/response exchange, and
    /// closes the connection before returning.
    ///
    /// Connection failures are logged at debug level only: during a subnet
    /// sweep most probed hosts refuse or stay silent, and that is the
    /// expected outcome rather than an anomaly.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Connection times out or is refused
    /// - Send or receive times out
    /// - The peer closes the connection before replying
    /// - The response cannot be decoded
    pub async fn request(
        &self,
        addr: SocketAddr,
        request: Request,
    ) -> Result<Response, ClientError> {
        trace!(%addr, request = ?request, "Opening request connection");

        // Attempt connection with timeout
        let stream = match tokio::time::timeout(self.connect_timeout, TcpStream::connect(addr))
            .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                debug!("Connection to {} failed: {}", addr, e);
                return Err(e.into());
            }
            Err(_) => {
                debug!(
                    "Connection to {} timed out after {}ms",
                    addr,
                    self.connect_timeout.as_millis()
                );
                return Err(ClientError::ConnectionTimeout(
                    self.connect_timeout.as_millis() as u64,
                ));
            }
        };

        // Configure TCP_NODELAY to disable Nagle's algorithm. Requests and
        // responses are single small frames; Nagle could hold them back
        // 40-200ms waiting for data that will never come.
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {} - latency may be impacted", e);
        }

        let mut framed = Framed::new(stream, ClientCodec::new());

        // Send request with timeout
        match tokio::time::timeout(self.exchange_timeout, framed.send(request)).await {
            Ok(Ok(())) => {
                trace!("Request sent successfully");
            }
            Ok(Err(e)) => {
                error!("Failed to send request to {}: {}", addr, e);
                return Err(ClientError::Protocol(e));
            }
            Err(_) => {
                warn!(
                    "Send to {} timed out after {}ms",
                    addr,
                    self.exchange_timeout.as_millis()
                );
                return Err(ClientError::WriteTimeout(
                    self.exchange_timeout.as_millis() as u64,
                ));
            }
        }

        // Receive response with timeout
        let response = match tokio::time::timeout(self.exchange_timeout, framed.next()).await {
            Ok(Some(Ok(response))) => {
                trace!(%addr, response = ?response, "Received response");
                response
            }
            Ok(Some(Err(e))) => {
                error!("Failed to decode response from {}: {}", addr, e);
                return Err(ClientError::Protocol(e));
            }
            Ok(None) => {
                warn!("Connection to {} closed before a response arrived", addr);
                return Err(ClientError::ConnectionLost(
                    "Peer closed connection before replying".to_string(),
                ));
            }
            Err(_) => {
                warn!(
                    "No response from {} within {}ms",
                    addr,
                    self.exchange_timeout.as_millis()
                );
                return Err(ClientError::ReadTimeout(
                    self.exchange_timeout.as_millis() as u64,
                ));
            }
        };

        close_stream(framed).await;
        Ok(response)
    }
}

/// Close a framed connection gracefully, best effort
///
/// Flush and shutdown each have a 500ms timeout to prevent hanging if the
/// network is down or unresponsive. Failures are logged and swallowed; the
/// response has already been received at this point.
async fn close_stream(mut framed: Framed<TcpStream, ClientCodec>) {
    let flush_timeout = Duration::from_millis(500);
    match tokio::time::timeout(flush_timeout, framed.flush()).await {
        Ok(Ok(())) => {
            trace!("Flush completed successfully");
        }
        Ok(Err(e)) => {
            warn!("Error flushing during close: {}", e);
        }
        Err(_) => {
            warn!(
                "Flush timeout during close ({}ms)",
                flush_timeout.as_millis()
            );
        }
    }

    let mut stream = framed.into_inner();
    let shutdown_timeout = Duration::from_millis(500);
    match tokio::time::timeout(shutdown_timeout, stream.shutdown()).await {
        Ok(Ok(())) => {
            trace!("Shutdown completed successfully");
        }
        Ok(Err(e)) => {
            warn!("Error during shutdown: {}", e);
        }
        Err(_) => {
            warn!(
                "Shutdown timeout during close ({}ms)",
                shutdown_timeout.as_millis()
            );
        }
    }
}
