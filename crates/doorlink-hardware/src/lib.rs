//! Hardware device abstraction layer for the door access nodes.
//!
//! This crate provides trait-based abstractions for the peripherals used
//! by scanner and actuator nodes: RFID credential readers, the door lock
//! output, and the scanner feedback panel. These traits enable substitution
//! between mock implementations (for development and testing) and real
//! hardware drivers.
//!
//! # Design Philosophy
//!
//! - **Async-first**: All I/O operations are asynchronous using native
//!   `async fn` in traits (Rust 1.90 + Edition 2024 RPITIT).
//! - **Poll-based reads**: Credential readers are polled so a node's
//!   coordination loop keeps control between reads.
//! - **Thread-safe**: All traits require `Send + Sync` for use with Tokio.
//! - **Error-aware**: All operations return `Result<T>` with detailed
//!   error information.
//!
//! # Device Traits
//!
//! The [`CredentialReader`] trait represents an RFID tag reader:
//!
//! ```no_run
//! use doorlink_hardware::traits::CredentialReader;
//! use doorlink_hardware::error::Result;
//!
//! async fn next_read<R: CredentialReader>(reader: &mut R) -> Result<Option<String>> {
//!     Ok(reader.poll_scan().await?.map(|scan| scan.text))
//! }
//! ```
//!
//! The [`LockDrive`] trait represents the door strike output, and the
//! [`FeedbackSink`] trait receives rendered text for the scanner's panel.
//!
//! # Mock Implementations
//!
//! The [`mock`] module provides [`MockReader`](mock::MockReader) and
//! [`MockLock`](mock::MockLock), each paired with a control handle so
//! tests and the demo binaries can drive them without physical hardware.
//!
//! [`CredentialReader`]: traits::CredentialReader
//! [`LockDrive`]: traits::LockDrive
//! [`FeedbackSink`]: traits::FeedbackSink

pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use traits::{CredentialReader, FeedbackSink, LockDrive, RawScan};
pub use types::ReaderInfo;
