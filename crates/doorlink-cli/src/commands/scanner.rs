//! Scanner node with a terminal reader and panel.
//!
//! Badge reads are lines typed on stdin; every panel frame the node
//! would show on its display is drawn to stdout as a bordered box.

use std::net::SocketAddr;
use std::time::Instant;

use anyhow::Context;
use doorlink_core::constants::PANEL_MAX_COLUMNS;
use doorlink_core::{DeviceIdentity, NodeRole};
use doorlink_hardware::mock::MockReader;
use doorlink_scanner::display::PanelLayout;
use doorlink_scanner::{ScannerConfig, ScannerNode, VirtualPanel};
use tokio::io::AsyncBufReadExt;

/// Scanner side selector for the command line.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum RoleArg {
    Entry,
    Exit,
}

impl From<RoleArg> for NodeRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Entry => NodeRole::Entry,
            RoleArg::Exit => NodeRole::Exit,
        }
    }
}

pub async fn run(
    role: NodeRole,
    identity: &str,
    server_identity: &str,
    server: Option<SocketAddr>,
) -> anyhow::Result<()> {
    let identity = DeviceIdentity::new(identity).context("invalid scanner identity")?;
    let server_identity =
        DeviceIdentity::new(server_identity).context("invalid server identity")?;

    let config = ScannerConfig::new(role, identity, server_identity);
    let tick_period = config.tick_period;

    let (reader, handle) = MockReader::with_name("terminal reader".to_string());
    let mut node = ScannerNode::new(config, reader, VirtualPanel::new());

    if let Some(addr) = server {
        node.locator_mut().install(addr, Instant::now());
    }

    // Lines typed on stdin become badge presentations.
    tokio::spawn(async move {
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            if handle.present_tag(line).await.is_err() {
                break;
            }
        }
    });

    node.start().await;
    draw_pending_frame(&mut node);

    loop {
        node.tick(Instant::now()).await;
        draw_pending_frame(&mut node);
        tokio::time::sleep(tick_period).await;
    }
}

fn draw_pending_frame(node: &mut ScannerNode<MockReader, VirtualPanel>) {
    if let Some(frame) = node.feedback_mut().take_frame() {
        draw_frame(&frame);
    }
}

fn draw_frame(frame: &PanelLayout) {
    let width = PANEL_MAX_COLUMNS;
    println!("+{}+", "-".repeat(width));
    for line in &frame.lines {
        println!("|{:<width$}|", line.text);
    }
    println!("+{}+", "-".repeat(width));
}
