//! Reader intake: turns raw reads into scan events.
//!
//! Sits between the `CredentialReader` driver and the coordination loop.
//! Raw text is normalized into a [`Credential`]; reads the validator
//! rejects and reader faults are logged and dropped so one bad frame
//! never stalls the loop.

use doorlink_core::{Credential, DeviceIdentity, NodeRole, ScanEvent};
use doorlink_hardware::{CredentialReader, ReaderInfo, Result as HardwareResult};
use tracing::{debug, warn};

/// Credential intake for one scanner node.
pub struct ScanIntake<R> {
    reader: R,
    role: NodeRole,
    identity: DeviceIdentity,
}

impl<R: CredentialReader> ScanIntake<R> {
    pub fn new(reader: R, role: NodeRole, identity: DeviceIdentity) -> Self {
        Self {
            reader,
            role,
            identity,
        }
    }

    /// Take the next usable scan, if any.
    ///
    /// Returns `None` when no read is pending, when the read fails, or
    /// when the raw text does not normalize into a credential.
    pub async fn poll(&mut self) -> Option<ScanEvent> {
        let raw = match self.reader.poll_scan().await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(error) => {
                warn!(%error, "reader fault, read dropped");
                return None;
            }
        };

        match Credential::new(&raw.text) {
            Ok(credential) => {
                debug!(%credential, raw = %raw.text, "credential read");
                Some(ScanEvent::new(
                    credential,
                    self.role,
                    self.identity.clone(),
                ))
            }
            Err(error) => {
                warn!(raw = %raw.text, %error, "unusable read discarded");
                None
            }
        }
    }

    /// Reader metadata, for the startup log.
    ///
    /// # Errors
    /// Propagates the driver's error if the reader cannot be queried.
    pub async fn reader_info(&self) -> HardwareResult<ReaderInfo> {
        self.reader.reader_info().await
    }
}
