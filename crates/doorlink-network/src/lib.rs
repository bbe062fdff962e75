//! Network layer for the doorlink coordination nodes
//!
//! This crate provides the TCP transport shared by scanners, the door
//! actuator, and the access server: a one-shot request client, a polling
//! request listener, and the subnet discovery that finds the access server
//! without configuration. All traffic is newline-delimited JSON framed by
//! the doorlink-protocol codecs.
//!
//! # Components
//!
//! - **RequestClient**: One connection per request, used for submissions,
//!   door commands, and probes
//! - **RequestListener**: Bounded-wait accept loop for cooperative services
//! - **ServerLocator**: /24 identity sweep with location caching
//!
//! # Example
//!
//! ```no_run
//! use doorlink_network::{RequestClient, RequestClientConfig};
//! use doorlink_protocol::Request;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RequestClient::new(RequestClientConfig::default());
//! let response = client
//!     .request("192.168.0.100:8080".parse()?, Request::Status)
//!     .await?;
//! println!("{:?}", response);
//! # Ok(())
//! # }
//! ```

mod client;
mod listener;
pub mod locator;

pub use client::{ClientError, RequestClient, RequestClientConfig};
pub use listener::{ListenerError, RequestListener, RequestListenerConfig, Responder};
pub use locator::{CandidateSource, LocatorConfig, ServerLocation, ServerLocator};
