//! Wire frontend for the emulated access server.
//!
//! Binds the request listener, answers identity probes and scan
//! submissions against an [`AccessDirectory`], and optionally forwards
//! each grant to a door controller the way the production server does.
//!
//! The emulator is driven through two halves: the
//! [`AccessServerEmulator`] owns the socket and runs the serve loop,
//! while the cloneable [`EmulatorHandle`] lets a test enroll users and
//! inspect what the server saw while the loop runs.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use doorlink_core::constants::DEFAULT_SERVER_PORT;
use doorlink_core::{Credential, DeviceIdentity, DeviceKind, DoorReason, NodeRole};
use doorlink_network::{
    ListenerError, RequestClient, RequestClientConfig, RequestListener, RequestListenerConfig,
};
use doorlink_protocol::{Request, Response};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::directory::{AccessDirectory, ScanOutcome};

/// Emulator configuration.
#[derive(Debug, Clone)]
pub struct EmulatorConfig {
    /// Address the listener binds to.
    pub bind_addr: SocketAddr,
    /// Identity reported to identity probes.
    pub identity: DeviceIdentity,
    /// Longest a serve cycle blocks waiting for a connection.
    pub accept_wait: Duration,
    /// Door controller to forward grants to, if any.
    pub actuator: Option<SocketAddr>,
}

impl EmulatorConfig {
    /// Configuration with the standard port and no door controller.
    #[must_use]
    pub fn new(identity: DeviceIdentity) -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_SERVER_PORT)),
            identity,
            accept_wait: Duration::from_millis(100),
            actuator: None,
        }
    }
}

/// Emulator failures. Only listener socket faults surface here.
#[derive(Debug, Error)]
pub enum EmulatorError {
    #[error("listener error: {0}")]
    Listener(#[from] ListenerError),
}

/// The most recent submission, as received on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedScan {
    pub credential: Credential,
    pub action: NodeRole,
    pub origin_identity: DeviceIdentity,
}

#[derive(Debug, Default)]
struct EmulatorState {
    directory: AccessDirectory,
    scan_count: u64,
    probe_count: u64,
    last_scan: Option<RecordedScan>,
}

/// Emulated access server.
pub struct AccessServerEmulator {
    listener: RequestListener,
    state: Arc<Mutex<EmulatorState>>,
    identity: DeviceIdentity,
    accept_wait: Duration,
    actuator: Option<SocketAddr>,
    client: RequestClient,
}

impl AccessServerEmulator {
    /// Bind the listener and return the emulator with its handle.
    ///
    /// # Errors
    /// Returns `EmulatorError::Listener` if the bind address is not
    /// available.
    pub async fn bind(
        config: EmulatorConfig,
    ) -> Result<(Self, EmulatorHandle), EmulatorError> {
        let listener = RequestListener::bind(RequestListenerConfig {
            bind_addr: config.bind_addr,
            ..RequestListenerConfig::default()
        })
        .await?;

        let state = Arc::new(Mutex::new(EmulatorState::default()));
        let handle = EmulatorHandle {
            state: Arc::clone(&state),
        };

        let emulator = Self {
            listener,
            state,
            identity: config.identity,
            accept_wait: config.accept_wait,
            actuator: config.actuator,
            client: RequestClient::new(RequestClientConfig::probe()),
        };

        Ok((emulator, handle))
    }

    /// Local address of the listener.
    ///
    /// # Errors
    /// Returns `EmulatorError::Listener` if the socket has gone away.
    pub fn local_addr(&self) -> Result<SocketAddr, EmulatorError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until the listener socket fails.
    ///
    /// # Errors
    /// Returns `EmulatorError::Listener` on a listener socket fault.
    pub async fn run(&mut self) -> Result<(), EmulatorError> {
        let addr = self.listener.local_addr()?;
        info!(%addr, identity = %self.identity, "access server emulator serving");

        loop {
            self.serve_once(self.accept_wait).await?;
        }
    }

    /// Answer at most one request, waiting up to `wait` for it.
    ///
    /// Returns `true` when a request was answered.
    ///
    /// # Errors
    /// Returns `EmulatorError::Listener` on a listener socket fault.
    pub async fn serve_once(&mut self, wait: Duration) -> Result<bool, EmulatorError> {
        let Some((request, responder)) = self.listener.next_request(wait).await? else {
            return Ok(false);
        };

        let peer = responder.peer_addr();
        debug!(%peer, ?request, "request received");

        let response = self.handle(request).await;
        if let Err(error) = responder.send(response).await {
            warn!(%peer, %error, "reply not delivered");
        }

        Ok(true)
    }

    async fn handle(&self, request: Request) -> Response {
        match request {
            Request::IdentityProbe => {
                let mut state = self.state.lock().await;
                state.probe_count += 1;
                Response::identity(DeviceKind::AccessServer, self.identity.clone())
            }
            Request::SubmitScan {
                credential,
                action,
                origin_identity,
            } => self.handle_scan(credential, action, origin_identity).await,
            Request::UnlockEntry
            | Request::UnlockExit
            | Request::UnlockManual
            | Request::Lock
            | Request::Status => Response::error(404, "Unsupported operation"),
        }
    }

    async fn handle_scan(
        &self,
        credential: Credential,
        action: NodeRole,
        origin_identity: DeviceIdentity,
    ) -> Response {
        let outcome = {
            let mut state = self.state.lock().await;
            state.scan_count += 1;
            state.last_scan = Some(RecordedScan {
                credential: credential.clone(),
                action,
                origin_identity,
            });
            state.directory.evaluate(&credential, action)
        };

        match outcome {
            ScanOutcome::Granted { user_name, message } => {
                info!(%credential, %action, user = %user_name, "scan granted");
                self.forward_unlock(action).await;
                Response::scan_success(message, user_name)
            }
            ScanOutcome::Denied { message } => {
                info!(%credential, %action, %message, "scan denied");
                Response::scan_error(message)
            }
        }
    }

    /// Forward an unlock for a granted scan to the door controller.
    ///
    /// Best effort: failures are logged and do not change the scan
    /// reply.
    async fn forward_unlock(&self, action: NodeRole) {
        let Some(addr) = self.actuator else {
            return;
        };

        let request = Request::unlock(DoorReason::from(action));
        match self.client.request(addr, request).await {
            Ok(Response::DoorStatus(report)) => {
                debug!(%addr, door_open = report.door_open, "unlock forwarded");
            }
            Ok(other) => {
                warn!(%addr, ?other, "unexpected reply from door controller");
            }
            Err(error) => {
                warn!(%addr, %error, "unlock forwarding failed");
            }
        }
    }
}

/// Control and inspection handle for a running emulator.
///
/// Cloneable; all clones share the emulator's state.
#[derive(Debug, Clone)]
pub struct EmulatorHandle {
    state: Arc<Mutex<EmulatorState>>,
}

impl EmulatorHandle {
    /// Enroll an active user.
    pub async fn register(&self, credential: Credential, name: impl Into<String>) {
        self.state.lock().await.directory.register(credential, name);
    }

    /// Enroll a deactivated user.
    pub async fn register_inactive(&self, credential: Credential, name: impl Into<String>) {
        self.state
            .lock()
            .await
            .directory
            .register_inactive(credential, name);
    }

    /// Activate or deactivate an enrolled user.
    ///
    /// Returns `false` when the credential is not enrolled.
    pub async fn set_active(&self, credential: &Credential, active: bool) -> bool {
        self.state.lock().await.directory.set_active(credential, active)
    }

    /// Whether the credential is currently tracked as inside.
    pub async fn is_inside(&self, credential: &Credential) -> bool {
        self.state.lock().await.directory.is_inside(credential)
    }

    /// Submissions received so far.
    pub async fn scan_count(&self) -> u64 {
        self.state.lock().await.scan_count
    }

    /// Identity probes answered so far.
    pub async fn probe_count(&self) -> u64 {
        self.state.lock().await.probe_count
    }

    /// The most recent submission, if any.
    pub async fn last_scan(&self) -> Option<RecordedScan> {
        self.state.lock().await.last_scan.clone()
    }
}
