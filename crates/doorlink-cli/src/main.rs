//! Operator binary for running door access nodes.
//!
//! # Usage
//!
//! ```bash
//! # Access server emulator with two registered badges
//! doorlink emulator --user '080058DBB1=Alice Johnson' --user 'A1B2C3D4=Bob Smith'
//!
//! # Door controller driving a simulated lock output
//! doorlink actuator --bind 0.0.0.0:8081
//!
//! # Entry scanner; badge reads are lines typed on stdin
//! doorlink scanner entry --server 192.168.0.10:8080
//!
//! # Ask a device who it is
//! doorlink probe 192.168.0.10:8080
//! ```

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod commands {
    pub mod actuator;
    pub mod emulator;
    pub mod probe;
    pub mod scanner;
}

use commands::scanner::RoleArg;

#[derive(Parser)]
#[command(name = "doorlink")]
#[command(about = "Door access coordination nodes", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scanner node; badge reads are lines typed on stdin
    Scanner {
        /// Which side of the door this scanner serves
        #[arg(value_enum)]
        role: RoleArg,

        /// Identity attached to every submission
        #[arg(long, default_value = "E4:65:B8:27:73:08")]
        identity: String,

        /// Identity the access server must present
        #[arg(long, default_value = "D8:3A:DD:78:01:07")]
        server_identity: String,

        /// Fixed access server address, skipping the subnet sweep
        #[arg(long)]
        server: Option<SocketAddr>,
    },

    /// Run the door controller with a simulated lock output
    Actuator {
        /// Address to bind to
        #[arg(long, default_value = "0.0.0.0:8081")]
        bind: SocketAddr,

        /// Identity announced in probe answers
        #[arg(long, default_value = "DC:A6:32:5B:90:13")]
        identity: String,

        /// How long the door stays open, in milliseconds
        #[arg(long, default_value_t = 5000)]
        open_ms: u64,
    },

    /// Run the access server emulator
    Emulator {
        /// Address to bind to
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: SocketAddr,

        /// Identity announced in probe answers
        #[arg(long, default_value = "D8:3A:DD:78:01:07")]
        identity: String,

        /// Door controller address unlock commands are forwarded to
        #[arg(long)]
        actuator: Option<SocketAddr>,

        /// Register a badge as CREDENTIAL=NAME (repeatable)
        #[arg(long = "user", value_name = "CREDENTIAL=NAME")]
        users: Vec<String>,
    },

    /// Ask a device for its identity, optionally with door status
    Probe {
        /// Device address
        addr: SocketAddr,

        /// Also query door status after the identity probe
        #[arg(long)]
        status: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    match cli.command {
        Commands::Scanner {
            role,
            identity,
            server_identity,
            server,
        } => commands::scanner::run(role.into(), &identity, &server_identity, server).await,
        Commands::Actuator {
            bind,
            identity,
            open_ms,
        } => commands::actuator::run(bind, &identity, open_ms).await,
        Commands::Emulator {
            bind,
            identity,
            actuator,
            users,
        } => commands::emulator::run(bind, &identity, actuator, &users).await,
        Commands::Probe { addr, status } => commands::probe::run(addr, status).await,
    }
}
