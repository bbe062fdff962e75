//! Access server emulator node.

use std::net::SocketAddr;

use anyhow::{Context, bail};
use doorlink_core::{Credential, DeviceIdentity};
use doorlink_emulator::{AccessServerEmulator, EmulatorConfig};
use tracing::info;

pub async fn run(
    bind: SocketAddr,
    identity: &str,
    actuator: Option<SocketAddr>,
    users: &[String],
) -> anyhow::Result<()> {
    let identity = DeviceIdentity::new(identity).context("invalid emulator identity")?;

    let mut config = EmulatorConfig::new(identity);
    config.bind_addr = bind;
    config.actuator = actuator;

    let (mut emulator, handle) = AccessServerEmulator::bind(config)
        .await
        .context("binding the access server emulator")?;

    for spec in users {
        let Some((credential, name)) = spec.split_once('=') else {
            bail!("--user takes CREDENTIAL=NAME, got {spec:?}");
        };
        let credential = Credential::new(credential)
            .with_context(|| format!("invalid credential in --user {spec:?}"))?;
        handle.register(credential, name).await;
    }
    info!(registered = users.len(), "user directory loaded");

    emulator.run().await?;
    Ok(())
}
