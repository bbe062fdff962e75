//! Scanner node: polls an RFID reader, debounces, submits scans to the
//! access server and shows the verdict on the feedback panel.
//!
//! # Components
//!
//! - [`ScanIntake`](intake::ScanIntake): raw reads to validated scan events
//! - [`ScanDebouncer`]: dual-window repeat suppression
//! - [`ScanSubmitter`]: one request per accepted scan, hard deadline
//! - [`PanelLayout`] and [`VirtualPanel`]: feedback rendering
//! - [`ScannerNode`]: the coordination loop tying them together
//!
//! ```no_run
//! use doorlink_core::{DeviceIdentity, NodeRole};
//! use doorlink_hardware::mock::MockReader;
//! use doorlink_scanner::{ScannerConfig, ScannerNode, VirtualPanel};
//!
//! # async fn start() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ScannerConfig::new(
//!     NodeRole::Entry,
//!     DeviceIdentity::new("E4:65:B8:27:73:08")?,
//!     DeviceIdentity::new("D8:3A:DD:78:01:07")?,
//! );
//!
//! let (reader, _handle) = MockReader::new();
//! let mut node = ScannerNode::new(config, reader, VirtualPanel::new());
//! node.run().await;
//! # Ok(())
//! # }
//! ```

pub mod debounce;
pub mod display;
pub mod intake;
pub mod node;
pub mod submit;

pub use debounce::{ScanDebouncer, Verdict};
pub use display::{PanelLayout, PanelLine, VirtualPanel};
pub use node::{ScannerConfig, ScannerNode};
pub use submit::{Decision, DenialReason, ScanSubmitter};
