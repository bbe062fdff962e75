//! Hardware device trait definitions.
//!
//! This module defines trait interfaces for the peripherals a door access
//! node touches: the credential reader on a scanner, the lock output on
//! the door actuator, and the text panel that shows scan feedback. These
//! traits establish the contract between the coordination logic and the
//! devices, enabling substitution between mock and real implementations.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::types::ReaderInfo;

/// One raw read delivered by a credential reader.
///
/// The text is whatever the reader produced. No normalization happens at
/// this layer; separators and mixed case are cleaned up when the scan is
/// turned into a credential.
#[derive(Debug, Clone, PartialEq)]
pub struct RawScan {
    /// Raw reader output, often with `:` or space separators.
    pub text: String,

    /// Timestamp when the read was delivered.
    pub read_at: chrono::DateTime<chrono::Utc>,
}

impl RawScan {
    /// Create a raw scan stamped with the current time.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            read_at: chrono::Utc::now(),
        }
    }

    /// Set a custom timestamp, for replaying recorded scans in tests.
    pub fn with_read_at(mut self, read_at: chrono::DateTime<chrono::Utc>) -> Self {
        self.read_at = read_at;
        self
    }
}

/// Credential reader abstraction.
///
/// Represents an RFID tag reader attached to a scanner node. Reads are
/// polled rather than awaited so the caller's coordination loop keeps
/// control between reads.
///
/// # Object Safety and Dynamic Dispatch
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods return
/// `impl Future`, which is an opaque type that cannot be used in trait objects
/// (Edition 2024 RPITIT). You cannot use `Box<dyn CredentialReader>`. Use
/// generic type parameters instead:
///
/// ```no_run
/// use doorlink_hardware::traits::CredentialReader;
/// use doorlink_hardware::error::Result;
///
/// async fn drain_reads<R: CredentialReader>(reader: &mut R) -> Result<usize> {
///     let mut count = 0;
///     while let Some(scan) = reader.poll_scan().await? {
///         println!("read {}", scan.text);
///         count += 1;
///     }
///     Ok(count)
/// }
/// ```
pub trait CredentialReader: Send + Sync {
    /// Take the next pending read, if any.
    ///
    /// Returns `Ok(None)` when no read is pending; the caller retries on
    /// its next loop pass.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The device is disconnected
    /// - The device delivered an unreadable frame
    /// - A communication error occurs
    async fn poll_scan(&mut self) -> Result<Option<RawScan>>;

    /// Get reader information.
    ///
    /// # Errors
    ///
    /// Returns an error if a communication error occurs while querying
    /// reader information.
    async fn reader_info(&self) -> Result<ReaderInfo>;
}

/// Door lock output abstraction.
///
/// Represents the electrical output that holds the door strike open.
/// The actuator drives it level-style: asserted while the door should be
/// passable, released when it should be secure.
pub trait LockDrive: Send + Sync {
    /// Assert the unlock output.
    ///
    /// Idempotent; asserting an already asserted output is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be driven.
    async fn assert_unlock(&mut self) -> Result<()>;

    /// Release the unlock output, securing the door.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be driven.
    async fn release_unlock(&mut self) -> Result<()>;

    /// Current commanded state of the output.
    fn is_asserted(&self) -> bool;
}

/// Scanner feedback panel abstraction.
///
/// Receives the rendered text for a small character panel. Lines are
/// separated by `\n`; layout and truncation happen before this call.
pub trait FeedbackSink: Send + Sync {
    /// Replace the panel contents with the given text.
    ///
    /// # Errors
    ///
    /// Returns an error if the panel cannot be written.
    async fn show(&mut self, text: &str) -> Result<()>;
}
