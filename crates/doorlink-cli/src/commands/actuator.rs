//! Door controller node with a simulated lock output.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use doorlink_actuator::{ActuatorConfig, ActuatorService};
use doorlink_core::DeviceIdentity;
use doorlink_hardware::mock::MockLock;

pub async fn run(bind: SocketAddr, identity: &str, open_ms: u64) -> anyhow::Result<()> {
    let identity = DeviceIdentity::new(identity).context("invalid actuator identity")?;

    let mut config = ActuatorConfig::new(identity);
    config.bind_addr = bind;
    config.open_duration = Duration::from_millis(open_ms);

    let (lock, _probe) = MockLock::new();
    let mut service = ActuatorService::bind(config, lock)
        .await
        .context("binding the door controller")?;

    service.run().await?;
    Ok(())
}
