//! Scan submission.
//!
//! One accepted scan becomes one request to the access server, with a
//! hard deadline on the whole exchange. A scanner is a fixture people
//! badge past; whatever goes wrong on the wire, the person in front of
//! the panel gets an answer within the deadline.
//!
//! Transport failures and nonsense replies all collapse into
//! [`Decision::Unreachable`]. The coordination loop reacts by showing
//! the unreachable denial and dropping the cached server location, so
//! the next scan triggers a rediscovery.

use std::time::Duration;

use doorlink_core::ScanEvent;
use doorlink_core::constants::SUBMIT_TIMEOUT_MS;
use doorlink_network::{RequestClient, RequestClientConfig, ServerLocation};
use doorlink_protocol::{Request, Response};
use tracing::{debug, warn};

/// Why the server denied a scan, inferred from the denial message.
///
/// The wire carries free-form text; this classification keys on the
/// phrases the server actually uses so callers can branch without
/// string-matching themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// The credential is not enrolled.
    NotRegistered,
    /// The credential exists but is deactivated.
    Inactive,
    /// Entry scan for someone already tracked as inside.
    AlreadyInside,
    /// Exit scan with no matching entry on record.
    NoEntryRecord,
    /// Any other denial.
    Other,
}

impl DenialReason {
    /// Classify a denial message.
    #[must_use]
    pub fn classify(message: &str) -> Self {
        let message = message.to_lowercase();

        if message.contains("not registered") {
            DenialReason::NotRegistered
        } else if message.contains("inactive") {
            DenialReason::Inactive
        } else if message.contains("already inside") {
            DenialReason::AlreadyInside
        } else if message.contains("no entry") {
            DenialReason::NoEntryRecord
        } else {
            DenialReason::Other
        }
    }
}

/// Outcome of one scan submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// The server accepted the scan and the door is being opened.
    Granted { user_name: Option<String> },
    /// The server answered with a denial.
    Denied {
        reason: DenialReason,
        message: String,
    },
    /// No usable answer within the deadline.
    Unreachable,
}

impl Decision {
    /// Returns `true` for a grant.
    #[must_use]
    pub fn is_granted(&self) -> bool {
        matches!(self, Decision::Granted { .. })
    }
}

/// Submits accepted scans to the located access server.
pub struct ScanSubmitter {
    client: RequestClient,
    deadline: Duration,
}

impl ScanSubmitter {
    /// Submitter with the standard deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::with_deadline(Duration::from_millis(SUBMIT_TIMEOUT_MS))
    }

    /// Submitter with an explicit end-to-end deadline.
    #[must_use]
    pub fn with_deadline(deadline: Duration) -> Self {
        Self {
            client: RequestClient::new(RequestClientConfig::default()),
            deadline,
        }
    }

    /// Submit one scan and wait for the verdict.
    ///
    /// The deadline covers the whole exchange: connect, send, reply.
    pub async fn submit(&self, event: &ScanEvent, location: ServerLocation) -> Decision {
        let exchange = self.client.request(location.addr, Request::submit_scan(event));

        let response = match tokio::time::timeout(self.deadline, exchange).await {
            Ok(Ok(response)) => response,
            Ok(Err(error)) => {
                warn!(addr = %location.addr, %error, "scan submission failed");
                return Decision::Unreachable;
            }
            Err(_) => {
                warn!(
                    addr = %location.addr,
                    deadline_ms = self.deadline.as_millis() as u64,
                    "scan submission deadline passed"
                );
                return Decision::Unreachable;
            }
        };

        match response {
            Response::ScanResult {
                status,
                message,
                user_name,
            } => {
                if status.is_success() {
                    debug!(user = ?user_name, "access granted");
                    Decision::Granted { user_name }
                } else {
                    let reason = DenialReason::classify(&message);
                    debug!(?reason, %message, "access denied");
                    Decision::Denied { reason, message }
                }
            }
            Response::Error { code, message } => {
                warn!(code, %message, "server rejected the submission");
                Decision::Denied {
                    reason: DenialReason::Other,
                    message,
                }
            }
            other => {
                warn!(?other, "unexpected reply to a scan submission");
                Decision::Unreachable
            }
        }
    }
}

impl Default for ScanSubmitter {
    fn default() -> Self {
        Self::new()
    }
}
