//! One-shot identity and status queries against a running node.

use std::net::SocketAddr;

use anyhow::Context;
use doorlink_network::{RequestClient, RequestClientConfig};
use doorlink_protocol::{Request, Response};

pub async fn run(addr: SocketAddr, status: bool) -> anyhow::Result<()> {
    let client = RequestClient::new(RequestClientConfig::default());

    let response = client
        .request(addr, Request::IdentityProbe)
        .await
        .context("identity probe failed")?;

    match response {
        Response::Identity {
            device_type,
            identity,
        } => {
            println!("Device type: {device_type}");
            println!("Identity:    {identity}");
        }
        other => println!("Unexpected probe answer: {other:?}"),
    }

    if status {
        let response = client
            .request(addr, Request::Status)
            .await
            .context("status query failed")?;

        match response {
            Response::DoorStatus(report) => {
                println!(
                    "Door:        {}",
                    if report.door_open { "open" } else { "closed" }
                );
                if let Some(ms) = report.time_until_close_ms {
                    println!("Closes in:   {ms} ms");
                }
                if let Some(operation) = report.last_operation {
                    println!("Last action: {operation}");
                }
                let stats = report.statistics;
                println!(
                    "Operations:  {} entry / {} exit / {} manual ({} total)",
                    stats.entry_count,
                    stats.exit_count,
                    stats.manual_operations,
                    stats.total_operations
                );
            }
            Response::Error { code, message } => {
                println!("Status refused ({code}): {message}");
            }
            other => println!("Unexpected status answer: {other:?}"),
        }
    }

    Ok(())
}
