//! Mock credential reader implementation for testing and development.
//!
//! This module provides a simulated RFID reader that can be driven
//! programmatically for testing without requiring physical hardware.

use crate::{
    Result,
    error::HardwareError,
    traits::{CredentialReader, RawScan},
    types::ReaderInfo,
};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

/// Mock credential reader for testing and development.
///
/// The reader consumes events queued through its [`MockReaderHandle`].
/// Each queued tag becomes one pending read; `poll_scan` drains them in
/// order and reports `None` once the queue is empty, matching how a real
/// reader driver surfaces buffered frames.
///
/// # Examples
///
/// ```
/// use doorlink_hardware::mock::MockReader;
/// use doorlink_hardware::traits::CredentialReader;
///
/// #[tokio::main]
/// async fn main() -> doorlink_hardware::Result<()> {
///     let (mut reader, handle) = MockReader::new();
///
///     handle.present_tag("08 00 58 db b1").await?;
///
///     let scan = reader.poll_scan().await?.expect("one read pending");
///     assert_eq!(scan.text, "08 00 58 db b1");
///
///     assert!(reader.poll_scan().await?.is_none());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockReader {
    /// Channel receiver for reader events
    event_rx: mpsc::Receiver<ReaderEvent>,

    /// Device name
    name: String,
}

impl MockReader {
    /// Create a new mock reader with the default name.
    ///
    /// Returns a tuple of (MockReader, MockReaderHandle) where the handle
    /// is used to simulate tag presentations.
    pub fn new() -> (Self, MockReaderHandle) {
        Self::with_name("Mock EM4100 Reader".to_string())
    }

    /// Create a new mock reader with a custom name.
    pub fn with_name(name: String) -> (Self, MockReaderHandle) {
        let (event_tx, event_rx) = mpsc::channel(32);

        let reader = Self {
            event_rx,
            name: name.clone(),
        };

        let handle = MockReaderHandle { event_tx, name };

        (reader, handle)
    }
}

impl Default for MockReader {
    fn default() -> Self {
        Self::new().0
    }
}

impl CredentialReader for MockReader {
    async fn poll_scan(&mut self) -> Result<Option<RawScan>> {
        match self.event_rx.try_recv() {
            Ok(ReaderEvent::Tag(scan)) => Ok(Some(scan)),
            Ok(ReaderEvent::Failure(message)) => Err(HardwareError::read_error(message)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                Err(HardwareError::disconnected("reader event channel closed"))
            }
        }
    }

    async fn reader_info(&self) -> Result<ReaderInfo> {
        Ok(
            ReaderInfo::new(self.name.clone(), vec!["EM4100".to_string()])
                .with_max_baud_rate(9600),
        )
    }
}

/// Internal event type for the mock reader.
#[derive(Debug, Clone)]
enum ReaderEvent {
    Tag(RawScan),
    Failure(String),
}

/// Handle for driving a mock credential reader.
///
/// Cloneable; every clone feeds the same reader.
#[derive(Debug, Clone)]
pub struct MockReaderHandle {
    /// Channel sender for reader events
    event_tx: mpsc::Sender<ReaderEvent>,

    /// Device name
    name: String,
}

impl MockReaderHandle {
    /// Present a tag to the reader.
    ///
    /// The text is delivered exactly as given, including any separators.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped and the channel
    /// is closed.
    pub async fn present_tag(&self, text: impl Into<String>) -> Result<()> {
        self.present_scan(RawScan::new(text)).await
    }

    /// Present a prepared scan, preserving its timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped and the channel
    /// is closed.
    pub async fn present_scan(&self, scan: RawScan) -> Result<()> {
        self.event_tx
            .send(ReaderEvent::Tag(scan))
            .await
            .map_err(|_| HardwareError::disconnected("reader event channel closed"))
    }

    /// Queue a read failure for the next poll.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped and the channel
    /// is closed.
    pub async fn inject_failure(&self, message: impl Into<String>) -> Result<()> {
        self.event_tx
            .send(ReaderEvent::Failure(message.into()))
            .await
            .map_err(|_| HardwareError::disconnected("reader event channel closed"))
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }
}
