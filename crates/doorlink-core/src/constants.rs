//! System-wide constants for the access control network
//!
//! Centralizes timing windows, network defaults and validation limits so
//! scanner, actuator and emulator builds cannot drift apart.

// ============================================================================
// Network Defaults
// ============================================================================

/// TCP port the access server listens on.
///
/// # Value: 8080
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// TCP port the door actuator listens on.
///
/// # Value: 8081
pub const DEFAULT_ACTUATOR_PORT: u16 = 8081;

/// First host octet probed during a subnet sweep.
///
/// # Value: 1
pub const SUBNET_HOST_MIN: u8 = 1;

/// Last host octet probed during a subnet sweep.
///
/// Covers the full usable /24 host range; the network and broadcast
/// addresses are never probed.
///
/// # Value: 254
pub const SUBNET_HOST_MAX: u8 = 254;

// ============================================================================
// Discovery Timing
// ============================================================================

/// Connect timeout for a single identity probe during a subnet sweep.
///
/// Kept short so a full sweep of 253 candidate hosts completes quickly
/// even when most connections are refused or time out.
///
/// # Value: 250ms
pub const PROBE_CONNECT_TIMEOUT_MS: u64 = 250;

/// Read/write timeout for the identity exchange once a probe connects.
///
/// # Value: 500ms
pub const PROBE_EXCHANGE_TIMEOUT_MS: u64 = 500;

/// Minimum interval between discovery sweeps after a failed sweep.
///
/// A sweep that finds no server must not be retried before this much
/// time has passed.
///
/// # Value: 30s
pub const LOCATE_RETRY_INTERVAL_MS: u64 = 30_000;

/// Age at which a cached server location is considered stale.
///
/// A stale location is re-verified with a fresh identity probe before
/// the next submission uses it.
///
/// # Value: 5min
pub const LOCATION_REVERIFY_INTERVAL_MS: u64 = 300_000;

// ============================================================================
// Submission Timing
// ============================================================================

/// End-to-end timeout for one scan submission round trip.
///
/// Connect, send and response read must all complete within this window
/// or the attempt is treated as a reachability failure.
///
/// # Value: 3s
pub const SUBMIT_TIMEOUT_MS: u64 = 3000;

// ============================================================================
// Debounce Windows
// ============================================================================

/// Suppression window for repeated reads of the same credential.
///
/// Measured from the last accepted scan of that credential.
///
/// # Value: 5s
///
/// # Examples
///
/// ```
/// use doorlink_core::constants::{GLOBAL_SCAN_WINDOW_MS, SAME_CREDENTIAL_WINDOW_MS};
///
/// // The per-credential window always outlasts the global window.
/// assert!(SAME_CREDENTIAL_WINDOW_MS > GLOBAL_SCAN_WINDOW_MS);
/// ```
pub const SAME_CREDENTIAL_WINDOW_MS: u64 = 5000;

/// Suppression window for any scan following an accepted scan.
///
/// Measured from the last accepted scan of any credential. Checked before
/// the per-credential window.
///
/// # Value: 2s
pub const GLOBAL_SCAN_WINDOW_MS: u64 = 2000;

// ============================================================================
// Door Timing
// ============================================================================

/// How long the door stays unlocked after an accepted unlock command.
///
/// The actuator re-locks on its own once this much time has elapsed,
/// regardless of coordinator connectivity. A repeated unlock while open
/// restarts the countdown.
///
/// # Value: 5s
pub const OPEN_DURATION_MS: u64 = 5000;

/// How long the actuator service waits for an inbound connection per tick.
///
/// Bounds the latency of the automatic re-lock check while the listener
/// is otherwise idle.
///
/// # Value: 100ms
pub const ACTUATOR_ACCEPT_WAIT_MS: u64 = 100;

/// Read timeout for a request frame on an accepted connection.
///
/// # Value: 500ms
pub const REQUEST_READ_TIMEOUT_MS: u64 = 500;

/// Write timeout for a response frame.
///
/// # Value: 500ms
pub const RESPONSE_WRITE_TIMEOUT_MS: u64 = 500;

/// Maximum number of door transitions retained in history.
///
/// Oldest entries are dropped first once the limit is reached.
///
/// # Value: 100
pub const MAX_TRANSITION_HISTORY: usize = 100;

// ============================================================================
// Scanner Loop
// ============================================================================

/// Pacing interval of the scanner coordination loop.
///
/// Each pass polls the reader, advances feedback state and services any
/// pending location work.
///
/// # Value: 50ms
pub const SCANNER_TICK_PERIOD_MS: u64 = 50;

/// How long a scan outcome stays on the feedback panel before the idle
/// banner returns.
///
/// # Value: 3s
pub const FEEDBACK_HOLD_MS: u64 = 3000;

// ============================================================================
// Feedback Panel Geometry
// ============================================================================

/// Visible text lines on the feedback panel.
///
/// # Value: 4
pub const PANEL_MAX_LINES: usize = 4;

/// Visible columns per panel line.
///
/// Longer lines are truncated with a trailing ellipsis.
///
/// # Value: 21
pub const PANEL_MAX_COLUMNS: usize = 21;

// ============================================================================
// Validation Limits
// ============================================================================

/// Maximum length of a normalized credential in characters.
///
/// # Value: 32
///
/// # Examples
///
/// ```
/// use doorlink_core::constants::MAX_CREDENTIAL_LENGTH;
/// use doorlink_core::types::Credential;
///
/// let at_limit = "A".repeat(MAX_CREDENTIAL_LENGTH);
/// assert!(Credential::new(&at_limit).is_ok());
///
/// let over_limit = "A".repeat(MAX_CREDENTIAL_LENGTH + 1);
/// assert!(Credential::new(&over_limit).is_err());
/// ```
pub const MAX_CREDENTIAL_LENGTH: usize = 32;

/// Maximum length of a normalized device identity in characters.
///
/// # Value: 64
pub const MAX_IDENTITY_LENGTH: usize = 64;
