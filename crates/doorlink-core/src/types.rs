use crate::{
    Result,
    constants::{MAX_CREDENTIAL_LENGTH, MAX_IDENTITY_LENGTH},
    error::Error,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Normalized RFID credential (uppercase hexadecimal, no separators)
///
/// Raw reader output may arrive with mixed case and `:`/`-`/whitespace
/// separators (`08 00 58 db b1`). Construction strips separators, uppercases
/// and validates, so two reads of the same physical tag always compare equal.
///
/// # Security
/// This type implements constant-time comparison to prevent timing attacks
/// when comparing credentials.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct Credential(String);

impl Credential {
    /// Create a credential from raw reader output.
    ///
    /// Normalization removes whitespace and `:`/`-` separators and converts
    /// to uppercase before validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidCredential` if:
    /// - Nothing remains after stripping separators
    /// - A non-hexadecimal character remains
    /// - The normalized form exceeds [`MAX_CREDENTIAL_LENGTH`] characters
    pub fn new(raw: &str) -> Result<Self> {
        let normalized: String = raw
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ':' && *c != '-')
            .collect::<String>()
            .to_uppercase();

        if normalized.is_empty() {
            return Err(Error::InvalidCredential {
                message: "empty after normalization".to_string(),
            });
        }

        if normalized.len() > MAX_CREDENTIAL_LENGTH {
            return Err(Error::InvalidCredential {
                message: format!(
                    "must be at most {MAX_CREDENTIAL_LENGTH} chars, got {}",
                    normalized.len()
                ),
            });
        }

        if let Some(c) = normalized.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(Error::InvalidCredential {
                message: format!("non-hexadecimal character '{c}'"),
            });
        }

        Ok(Credential(normalized))
    }

    /// Get the normalized credential as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Credential {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Credential::new(s)
    }
}

impl TryFrom<String> for Credential {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Credential::new(&s)
    }
}

/// Constant-time comparison implementation for Credential
///
/// This prevents timing attacks by ensuring comparison takes the same time
/// regardless of where the strings differ.
impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

/// Hash implementation for Credential
///
/// Implements standard hashing for use in hash-based collections.
impl std::hash::Hash for Credential {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

/// Stable device identity, independent of IP addressing
///
/// In deployed systems this is the device's MAC address
/// (`E4:65:B8:27:73:08`). Identities are normalized to uppercase at
/// construction so comparison is byte-for-byte on the normalized form,
/// which makes it effectively case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct DeviceIdentity(String);

impl DeviceIdentity {
    /// Create a device identity with validation.
    ///
    /// The identity is trimmed and uppercased before validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidIdentity` if the identity is empty, contains
    /// non-ASCII characters, or exceeds [`MAX_IDENTITY_LENGTH`] characters.
    pub fn new(identity: &str) -> Result<Self> {
        let identity = identity.trim().to_uppercase();

        if identity.is_empty() {
            return Err(Error::InvalidIdentity {
                message: "must not be empty".to_string(),
            });
        }

        if identity.len() > MAX_IDENTITY_LENGTH {
            return Err(Error::InvalidIdentity {
                message: format!(
                    "must be at most {MAX_IDENTITY_LENGTH} chars, got {}",
                    identity.len()
                ),
            });
        }

        if !identity.is_ascii() {
            return Err(Error::InvalidIdentity {
                message: "must be ASCII".to_string(),
            });
        }

        Ok(DeviceIdentity(identity))
    }

    /// Get the normalized identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DeviceIdentity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DeviceIdentity::new(s)
    }
}

impl TryFrom<String> for DeviceIdentity {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        DeviceIdentity::new(&s)
    }
}

/// Scanner node role
///
/// One parameterized scanner implementation serves both sides of the door;
/// the role selects the action submitted to the access server and the
/// idle banner shown on the feedback panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    Entry,
    Exit,
}

impl NodeRole {
    /// Wire representation of the role (`entry` / `exit`).
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NodeRole::Entry => "entry",
            NodeRole::Exit => "exit",
        }
    }

    /// Returns `true` if the role is Entry.
    #[inline]
    #[must_use]
    pub fn is_entry(self) -> bool {
        matches!(self, NodeRole::Entry)
    }

    /// Returns `true` if the role is Exit.
    #[inline]
    #[must_use]
    pub fn is_exit(self) -> bool {
        matches!(self, NodeRole::Exit)
    }

    /// Device kind a scanner of this role reports on the wire.
    #[inline]
    #[must_use]
    pub fn device_kind(self) -> DeviceKind {
        match self {
            NodeRole::Entry => DeviceKind::EntryScanner,
            NodeRole::Exit => DeviceKind::ExitScanner,
        }
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for NodeRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "entry" => Ok(NodeRole::Entry),
            "exit" => Ok(NodeRole::Exit),
            _ => Err(Error::InvalidRole {
                value: s.to_string(),
            }),
        }
    }
}

/// Kind of device answering an identity probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    AccessServer,
    DoorController,
    EntryScanner,
    ExitScanner,
}

impl DeviceKind {
    /// Wire representation of the device kind.
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceKind::AccessServer => "access_server",
            DeviceKind::DoorController => "door_controller",
            DeviceKind::EntryScanner => "entry_scanner",
            DeviceKind::ExitScanner => "exit_scanner",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reason attached to a door unlock command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorReason {
    Entry,
    Exit,
    Manual,
}

impl DoorReason {
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DoorReason::Entry => "entry",
            DoorReason::Exit => "exit",
            DoorReason::Manual => "manual",
        }
    }
}

impl From<NodeRole> for DoorReason {
    fn from(role: NodeRole) -> Self {
        match role {
            NodeRole::Entry => DoorReason::Entry,
            NodeRole::Exit => DoorReason::Exit,
        }
    }
}

impl fmt::Display for DoorReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Most recent state-affecting event on the door, as reported in the
/// status body (`last_operation`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorOperation {
    UnlockEntry,
    UnlockExit,
    UnlockManual,
    Lock,
    AutoClose,
}

impl DoorOperation {
    /// Operation recorded for an unlock command with the given reason.
    #[inline]
    #[must_use]
    pub fn from_unlock(reason: DoorReason) -> Self {
        match reason {
            DoorReason::Entry => DoorOperation::UnlockEntry,
            DoorReason::Exit => DoorOperation::UnlockExit,
            DoorReason::Manual => DoorOperation::UnlockManual,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DoorOperation::UnlockEntry => "unlock_entry",
            DoorOperation::UnlockExit => "unlock_exit",
            DoorOperation::UnlockManual => "unlock_manual",
            DoorOperation::Lock => "lock",
            DoorOperation::AutoClose => "auto_close",
        }
    }
}

impl fmt::Display for DoorOperation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Door operation counters, reported in the status body.
///
/// Every accepted unlock command increments the counter for its reason,
/// including a retrigger while the door is already open. An explicit lock
/// command counts as a manual operation. Automatic re-lock increments
/// nothing. `total_operations` is kept equal to the sum of the three
/// reason counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorStatistics {
    pub entry_count: u64,
    pub exit_count: u64,
    pub manual_operations: u64,
    pub total_operations: u64,
}

impl DoorStatistics {
    /// Record an accepted unlock command.
    pub fn record_unlock(&mut self, reason: DoorReason) {
        match reason {
            DoorReason::Entry => self.entry_count += 1,
            DoorReason::Exit => self.exit_count += 1,
            DoorReason::Manual => self.manual_operations += 1,
        }
        self.total_operations += 1;
    }

    /// Record an explicit lock command (manual override).
    pub fn record_manual_lock(&mut self) {
        self.manual_operations += 1;
        self.total_operations += 1;
    }
}

/// A credential read accepted past debounce, ready for submission.
///
/// Immutable once created; consumed exactly once by the submitter. The
/// timestamp is wall-clock time for logging; scheduling decisions use
/// monotonic instants held by the components themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanEvent {
    pub credential: Credential,
    pub origin_role: NodeRole,
    pub origin_identity: DeviceIdentity,
    pub timestamp: DateTime<Utc>,
}

impl ScanEvent {
    /// Create a scan event stamped with the current wall-clock time.
    #[must_use]
    pub fn new(credential: Credential, origin_role: NodeRole, origin_identity: DeviceIdentity) -> Self {
        Self {
            credential,
            origin_role,
            origin_identity,
            timestamp: Utc::now(),
        }
    }
}
