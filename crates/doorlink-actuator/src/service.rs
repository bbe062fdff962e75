//! Door controller service.
//!
//! Wraps a [`DoorMachine`] behind the wire listener and drives the lock
//! output, all from one cooperative loop:
//!
//! ```text
//! loop {
//!     wait up to accept_wait for a connection
//!     answer at most one command
//!     evaluate the close deadline
//!     sync the lock output
//! }
//! ```
//!
//! The accept wait bounds every cycle, so the close deadline is checked
//! regularly even when no commands arrive.
//!
//! # Error Policy
//!
//! Only listener socket faults escape [`ActuatorService::run`]. Malformed
//! or slow peers are absorbed by the listener, and lock drive faults are
//! logged and absorbed here. A door controller that panics or exits over
//! a bad peer would strand the door, so the loop treats everything short
//! of a dead socket as survivable.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use doorlink_core::constants::{ACTUATOR_ACCEPT_WAIT_MS, DEFAULT_ACTUATOR_PORT, OPEN_DURATION_MS};
use doorlink_core::{DeviceIdentity, DeviceKind, DoorReason};
use doorlink_hardware::LockDrive;
use doorlink_network::{ListenerError, RequestListener, RequestListenerConfig};
use doorlink_protocol::{Request, Response};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::state_machine::DoorMachine;

/// Door controller configuration.
#[derive(Debug, Clone)]
pub struct ActuatorConfig {
    /// Address the command listener binds to.
    pub bind_addr: SocketAddr,
    /// Stable identity reported to identity probes.
    pub identity: DeviceIdentity,
    /// Open window before automatic re-lock.
    pub open_duration: Duration,
    /// Longest a single cycle blocks waiting for an inbound connection.
    pub accept_wait: Duration,
}

impl ActuatorConfig {
    /// Configuration with the standard port, open window and accept wait.
    #[must_use]
    pub fn new(identity: DeviceIdentity) -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_ACTUATOR_PORT)),
            identity,
            open_duration: Duration::from_millis(OPEN_DURATION_MS),
            accept_wait: Duration::from_millis(ACTUATOR_ACCEPT_WAIT_MS),
        }
    }
}

/// Door controller failures.
///
/// Only listener socket faults surface here; bad peers and lock drive
/// faults are absorbed so the control loop keeps running.
#[derive(Debug, Error)]
pub enum ActuatorError {
    #[error("listener error: {0}")]
    Listener(#[from] ListenerError),
}

/// Door controller: command listener, door machine and lock drive.
pub struct ActuatorService<L: LockDrive> {
    listener: RequestListener,
    machine: DoorMachine,
    lock: L,
    identity: DeviceIdentity,
    accept_wait: Duration,
}

impl<L: LockDrive> ActuatorService<L> {
    /// Bind the command listener and start with a closed door.
    ///
    /// # Errors
    /// Returns `ActuatorError::Listener` if the bind address is not
    /// available.
    pub async fn bind(config: ActuatorConfig, lock: L) -> Result<Self, ActuatorError> {
        let listener = RequestListener::bind(RequestListenerConfig {
            bind_addr: config.bind_addr,
            ..RequestListenerConfig::default()
        })
        .await?;

        Ok(Self {
            listener,
            machine: DoorMachine::new(config.open_duration),
            lock,
            identity: config.identity,
            accept_wait: config.accept_wait,
        })
    }

    /// Local address of the command listener.
    ///
    /// # Errors
    /// Returns `ActuatorError::Listener` if the socket has gone away.
    pub fn local_addr(&self) -> Result<SocketAddr, ActuatorError> {
        Ok(self.listener.local_addr()?)
    }

    /// Read access to the door machine.
    #[must_use]
    pub fn machine(&self) -> &DoorMachine {
        &self.machine
    }

    /// Serve commands until the listener socket fails.
    ///
    /// # Errors
    /// Returns `ActuatorError::Listener` on a listener socket fault.
    pub async fn run(&mut self) -> Result<(), ActuatorError> {
        let addr = self.listener.local_addr()?;
        info!(
            %addr,
            identity = %self.identity,
            open_window = ?self.machine.open_duration(),
            "door controller serving"
        );

        loop {
            self.tick().await?;
        }
    }

    /// Run one cycle of the control loop.
    ///
    /// Waits up to `accept_wait` for an inbound connection, answers at
    /// most one command, then evaluates the close deadline. Quiet cycles
    /// return once the accept wait elapses.
    pub async fn tick(&mut self) -> Result<(), ActuatorError> {
        if let Some((request, responder)) = self.listener.next_request(self.accept_wait).await? {
            let peer = responder.peer_addr();
            debug!(%peer, ?request, "command received");

            let response = self.apply(&request, Instant::now()).await;
            if let Err(error) = responder.send(response).await {
                warn!(%peer, %error, "reply not delivered");
            }
        }

        self.settle(Instant::now()).await;
        Ok(())
    }

    /// Settle the close deadline, then answer one command.
    ///
    /// Settling first means a reply never reports the door as open after
    /// its close deadline has already passed.
    async fn apply(&mut self, request: &Request, now: Instant) -> Response {
        self.settle(now).await;

        match request {
            Request::IdentityProbe => {
                Response::identity(DeviceKind::DoorController, self.identity.clone())
            }
            Request::UnlockEntry => self.handle_unlock(DoorReason::Entry, now).await,
            Request::UnlockExit => self.handle_unlock(DoorReason::Exit, now).await,
            Request::UnlockManual => self.handle_unlock(DoorReason::Manual, now).await,
            Request::Lock => self.handle_lock(now).await,
            Request::Status => Response::DoorStatus(self.machine.report(&self.identity, now)),
            Request::SubmitScan { .. } => Response::error(404, "Unsupported operation"),
        }
    }

    async fn handle_unlock(&mut self, reason: DoorReason, now: Instant) -> Response {
        let transition = self.machine.unlock(reason, now);
        info!(%reason, from = %transition.from, "unlock command applied");
        self.sync_lock().await;
        Response::DoorStatus(self.machine.report(&self.identity, now))
    }

    async fn handle_lock(&mut self, now: Instant) -> Response {
        let transition = self.machine.lock();
        info!(from = %transition.from, "lock command applied");
        self.sync_lock().await;
        Response::DoorStatus(self.machine.report(&self.identity, now))
    }

    /// Close the door once the open window has elapsed.
    async fn settle(&mut self, now: Instant) {
        if self.machine.tick(now).is_some() {
            info!("open window elapsed, door re-locked");
            self.sync_lock().await;
        }
    }

    /// Drive the lock output to match the machine state.
    ///
    /// Drive faults are logged and absorbed; the machine stays
    /// authoritative and the next sync drives the output again.
    async fn sync_lock(&mut self) {
        let result = if self.machine.is_open() {
            self.lock.assert_unlock().await
        } else {
            self.lock.release_unlock().await
        };

        if let Err(error) = result {
            error!(%error, "lock drive fault");
        }
    }
}
