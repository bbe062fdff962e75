//! Scanner coordination loop.
//!
//! One task owns the reader, the debouncer, the server location and the
//! feedback panel, and works through a fixed cycle:
//!
//! ```text
//! loop {
//!     revert held feedback once its hold expires
//!     poll the reader for one scan
//!     debounce; submit if accepted; show the verdict
//!     sleep for the tick period
//! }
//! ```
//!
//! Everything that can go wrong locally (reader faults, unusable reads,
//! panel write failures, an unreachable server) is absorbed inside the
//! loop. A scanner node never exits over a bad read or a lost server;
//! it shows a denial and keeps scanning.

use std::time::{Duration, Instant};

use doorlink_core::constants::{FEEDBACK_HOLD_MS, SCANNER_TICK_PERIOD_MS};
use doorlink_core::{DeviceIdentity, NodeRole};
use doorlink_hardware::{CredentialReader, FeedbackSink};
use doorlink_network::{LocatorConfig, ServerLocator};
use tracing::{debug, info, warn};

use crate::debounce::ScanDebouncer;
use crate::display::{decision_message, ready_message};
use crate::intake::ScanIntake;
use crate::submit::{Decision, ScanSubmitter};

/// Scanner node configuration.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Which side of the door this scanner serves.
    pub role: NodeRole,
    /// This node's own identity, attached to every submission.
    pub identity: DeviceIdentity,
    /// Discovery settings, including the access server's identity.
    pub locator: LocatorConfig,
    /// Pause between coordination cycles.
    pub tick_period: Duration,
    /// How long a verdict stays on the panel before the idle banner.
    pub feedback_hold: Duration,
}

impl ScannerConfig {
    /// Configuration with the standard cadence and discovery settings.
    #[must_use]
    pub fn new(
        role: NodeRole,
        identity: DeviceIdentity,
        server_identity: DeviceIdentity,
    ) -> Self {
        Self {
            role,
            identity,
            locator: LocatorConfig::new(server_identity),
            tick_period: Duration::from_millis(SCANNER_TICK_PERIOD_MS),
            feedback_hold: Duration::from_millis(FEEDBACK_HOLD_MS),
        }
    }
}

/// A scanner node: reader in, feedback out, submissions in between.
pub struct ScannerNode<R, S> {
    role: NodeRole,
    identity: DeviceIdentity,
    tick_period: Duration,
    feedback_hold: Duration,
    intake: ScanIntake<R>,
    debouncer: ScanDebouncer,
    submitter: ScanSubmitter,
    locator: ServerLocator,
    feedback: S,
    feedback_until: Option<Instant>,
    submissions: u64,
}

impl<R: CredentialReader, S: FeedbackSink> ScannerNode<R, S> {
    pub fn new(config: ScannerConfig, reader: R, feedback: S) -> Self {
        let intake = ScanIntake::new(reader, config.role, config.identity.clone());

        Self {
            role: config.role,
            identity: config.identity,
            tick_period: config.tick_period,
            feedback_hold: config.feedback_hold,
            intake,
            debouncer: ScanDebouncer::default(),
            submitter: ScanSubmitter::new(),
            locator: ServerLocator::new(config.locator),
            feedback,
            feedback_until: None,
            submissions: 0,
        }
    }

    /// Which side of the door this scanner serves.
    #[must_use]
    pub fn role(&self) -> NodeRole {
        self.role
    }

    /// Scans submitted to the access server so far.
    #[must_use]
    pub fn submissions(&self) -> u64 {
        self.submissions
    }

    /// Read access to the feedback sink.
    #[must_use]
    pub fn feedback(&self) -> &S {
        &self.feedback
    }

    /// Mutable access to the feedback sink, for frontends that drain
    /// rendered frames between ticks.
    pub fn feedback_mut(&mut self) -> &mut S {
        &mut self.feedback
    }

    /// Mutable access to the server locator, for pinning a fixed address.
    pub fn locator_mut(&mut self) -> &mut ServerLocator {
        &mut self.locator
    }

    /// Log the reader and show the idle banner.
    pub async fn start(&mut self) {
        match self.intake.reader_info().await {
            Ok(info) => {
                info!(
                    role = %self.role,
                    identity = %self.identity,
                    reader = %info.name,
                    "scanner starting"
                );
            }
            Err(error) => {
                warn!(role = %self.role, %error, "reader info unavailable");
            }
        }

        self.show_ready().await;
    }

    /// Run one coordination cycle.
    pub async fn tick(&mut self, now: Instant) {
        self.refresh_feedback(now).await;

        let Some(event) = self.intake.poll().await else {
            return;
        };

        let verdict = self.debouncer.check(&event.credential, now);
        if !verdict.is_accepted() {
            debug!(credential = %event.credential, ?verdict, "scan debounced");
            return;
        }

        info!(credential = %event.credential, role = %self.role, "scan accepted");

        let Some(location) = self.locator.current(now).await else {
            warn!("no access server located, scan dropped");
            self.show_decision(&Decision::Unreachable, now).await;
            return;
        };

        let decision = self.submitter.submit(&event, location).await;
        self.submissions += 1;

        if decision == Decision::Unreachable {
            self.locator.invalidate();
        }

        self.show_decision(&decision, now).await;
    }

    /// Drive the loop at the configured tick period.
    ///
    /// Never returns; scanner nodes run until the process stops.
    pub async fn run(&mut self) {
        self.start().await;

        loop {
            self.tick(Instant::now()).await;
            tokio::time::sleep(self.tick_period).await;
        }
    }

    async fn refresh_feedback(&mut self, now: Instant) {
        if let Some(until) = self.feedback_until
            && now >= until
        {
            self.feedback_until = None;
            self.show_ready().await;
        }
    }

    async fn show_ready(&mut self) {
        let banner = ready_message(self.role);
        if let Err(error) = self.feedback.show(&banner).await {
            warn!(%error, "feedback panel write failed");
        }
    }

    async fn show_decision(&mut self, decision: &Decision, now: Instant) {
        let message = decision_message(self.role, decision);
        if let Err(error) = self.feedback.show(&message).await {
            warn!(%error, "feedback panel write failed");
        }
        self.feedback_until = Some(now + self.feedback_hold);
    }
}
