//! Mock device implementations for testing and development.
//!
//! This module provides simulated device implementations that can be
//! controlled programmatically without requiring physical hardware.

pub mod lock;
pub mod reader;

// Re-export commonly used types
pub use lock::{MockLock, MockLockProbe};
pub use reader::{MockReader, MockReaderHandle};
