//! Common types shared across hardware device implementations.

use serde::{Deserialize, Serialize};

/// Credential reader information.
///
/// Contains reader-specific metadata such as supported tag protocols
/// and maximum baud rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderInfo {
    /// Reader name (e.g., "RDM6300 125kHz Reader").
    pub name: String,

    /// List of supported tag protocols (e.g., ["EM4100"]).
    pub protocols: Vec<String>,

    /// Maximum supported baud rate in bits per second.
    pub max_baud_rate: Option<u32>,
}

impl ReaderInfo {
    /// Create a new ReaderInfo.
    pub fn new(name: impl Into<String>, protocols: Vec<String>) -> Self {
        Self {
            name: name.into(),
            protocols,
            max_baud_rate: None,
        }
    }

    /// Set the maximum baud rate.
    pub fn with_max_baud_rate(mut self, max_baud_rate: u32) -> Self {
        self.max_baud_rate = Some(max_baud_rate);
        self
    }
}
