//! Door controller node: the timed-unlock state machine and the service
//! loop that exposes it on the wire.
//!
//! The controller answers unlock, lock and status commands, re-locks the
//! door automatically once the open window elapses, and keeps a physical
//! lock output (anything implementing `doorlink_hardware::LockDrive`) in
//! step with the machine state.
//!
//! ```no_run
//! use doorlink_actuator::{ActuatorConfig, ActuatorService};
//! use doorlink_core::DeviceIdentity;
//! use doorlink_hardware::mock::MockLock;
//!
//! # async fn start() -> Result<(), Box<dyn std::error::Error>> {
//! let identity = DeviceIdentity::new("D8:3A:DD:78:01:07")?;
//! let (lock, _probe) = MockLock::new();
//!
//! let mut service = ActuatorService::bind(ActuatorConfig::new(identity), lock).await?;
//! service.run().await?;
//! # Ok(())
//! # }
//! ```

mod service;
mod state_machine;

pub use service::{ActuatorConfig, ActuatorError, ActuatorService};
pub use state_machine::{DoorMachine, DoorState, DoorTransition};
