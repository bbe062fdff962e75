//! Access server emulator.
//!
//! A self-contained stand-in for the production access server: it
//! answers identity probes so discovery finds it, decides scan
//! submissions against an in-memory user directory with the production
//! denial texts, and optionally forwards grants to a door controller.
//! Scanner and actuator nodes can be developed and tested against it
//! with nothing else running.
//!
//! ```no_run
//! use doorlink_core::{Credential, DeviceIdentity};
//! use doorlink_emulator::{AccessServerEmulator, EmulatorConfig};
//!
//! # async fn start() -> Result<(), Box<dyn std::error::Error>> {
//! let identity = DeviceIdentity::new("D8:3A:DD:78:01:07")?;
//! let (mut emulator, handle) = AccessServerEmulator::bind(EmulatorConfig::new(identity)).await?;
//!
//! handle.register(Credential::new("080058DBB1")?, "Alice Johnson").await;
//! emulator.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod directory;
pub mod server;

pub use directory::{AccessDirectory, ScanOutcome, UserRecord};
pub use server::{
    AccessServerEmulator, EmulatorConfig, EmulatorError, EmulatorHandle, RecordedScan,
};
