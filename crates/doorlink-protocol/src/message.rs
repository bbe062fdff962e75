use doorlink_core::{
    Credential, DeviceIdentity, DeviceKind, DoorOperation, DoorReason, DoorStatistics, NodeRole,
    ScanEvent,
};
use serde::{Deserialize, Serialize};

/// Request sent to an access server or door actuator
///
/// The `op` tag selects the operation. Unknown operations fail to
/// deserialize and the receiver answers with an error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    /// Ask the receiver who it is. Safe against arbitrary hosts.
    IdentityProbe,
    /// Submit an accepted credential scan for an access decision.
    SubmitScan {
        credential: Credential,
        action: NodeRole,
        origin_identity: DeviceIdentity,
    },
    /// Unlock the door for a granted entry.
    UnlockEntry,
    /// Unlock the door for a granted exit.
    UnlockExit,
    /// Unlock the door by operator override.
    UnlockManual,
    /// Lock the door immediately, cancelling any pending auto re-lock.
    Lock,
    /// Query door state and operation counters.
    Status,
}

impl Request {
    /// Build a scan submission from an accepted scan event.
    #[must_use]
    pub fn submit_scan(event: &ScanEvent) -> Self {
        Request::SubmitScan {
            credential: event.credential.clone(),
            action: event.origin_role,
            origin_identity: event.origin_identity.clone(),
        }
    }

    /// Build the unlock request for the given reason.
    #[must_use]
    pub fn unlock(reason: DoorReason) -> Self {
        match reason {
            DoorReason::Entry => Request::UnlockEntry,
            DoorReason::Exit => Request::UnlockExit,
            DoorReason::Manual => Request::UnlockManual,
        }
    }

    /// Unlock reason carried by this request, if it is an unlock.
    #[must_use]
    pub fn unlock_reason(&self) -> Option<DoorReason> {
        match self {
            Request::UnlockEntry => Some(DoorReason::Entry),
            Request::UnlockExit => Some(DoorReason::Exit),
            Request::UnlockManual => Some(DoorReason::Manual),
            _ => None,
        }
    }
}

/// Outcome class of a scan submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    Success,
    Error,
}

impl ScanStatus {
    #[inline]
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, ScanStatus::Success)
    }
}

/// Door state and counters as reported by the actuator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoorReport {
    pub device_type: DeviceKind,
    pub mac_address: DeviceIdentity,
    pub door_open: bool,
    pub door_closed: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_operation: Option<DoorOperation>,
    /// Remaining time before automatic re-lock. Present only while open.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub time_until_close_ms: Option<u64>,
    pub statistics: DoorStatistics,
}

/// Response sent back over an accepted connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Response {
    /// Answer to an identity probe.
    Identity {
        device_type: DeviceKind,
        identity: DeviceIdentity,
    },
    /// Access decision for a submitted scan.
    ScanResult {
        status: ScanStatus,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        user_name: Option<String>,
    },
    /// Door state snapshot, answers both door commands and status queries.
    DoorStatus(DoorReport),
    /// Request could not be served. `code` follows HTTP status conventions.
    Error { code: u16, message: String },
}

impl Response {
    /// Identity answer for the given device.
    #[must_use]
    pub fn identity(device_type: DeviceKind, identity: DeviceIdentity) -> Self {
        Response::Identity {
            device_type,
            identity,
        }
    }

    /// Granted scan result carrying the user's display name.
    #[must_use]
    pub fn scan_success(message: impl Into<String>, user_name: impl Into<String>) -> Self {
        Response::ScanResult {
            status: ScanStatus::Success,
            message: message.into(),
            user_name: Some(user_name.into()),
        }
    }

    /// Denied scan result with the denial message.
    #[must_use]
    pub fn scan_error(message: impl Into<String>) -> Self {
        Response::ScanResult {
            status: ScanStatus::Error,
            message: message.into(),
            user_name: None,
        }
    }

    /// Error response with an HTTP-style status code.
    #[must_use]
    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Response::Error {
            code,
            message: message.into(),
        }
    }
}
