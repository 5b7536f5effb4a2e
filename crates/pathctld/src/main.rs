//! pathctld entry point.
//!
//! Initializes logging, wires the event channel, and runs the
//! coordinator until interrupted. The switch transport is external: it
//! owns the [`NetworkEvent`] sender and, when present, the topology
//! authority the coordinator resyncs from. Run standalone, the daemon
//! pairs with a log-only forwarding plane so decisions are observable
//! without hardware.

use anyhow::Result;
use clap::Parser;
use log::info;
use pathctl_common::NetworkEvent;
use pathctld::daemon::{Coordinator, CoordinatorConfig};
use pathctld::flow::FlowInstallerConfig;
use pathctld::plane::LoggingPlane;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;

/// pathctl routing controller daemon
#[derive(Parser, Debug)]
#[command(name = "pathctld")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// Event channel capacity
    #[arg(long, default_value = "1024")]
    channel_capacity: usize,

    /// Priority for installed path rules
    #[arg(long, default_value = "10")]
    rule_priority: u16,

    /// Idle timeout in seconds for installed rules (0 = no expiry)
    #[arg(long, default_value = "0")]
    idle_timeout: u16,

    /// Do not install the table-miss rule when a switch joins
    #[arg(long)]
    no_table_miss: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    info!("starting pathctld");
    info!("event channel capacity: {}", args.channel_capacity);
    info!("path rule priority: {}", args.rule_priority);
    if args.idle_timeout > 0 {
        info!("rule idle timeout: {}s", args.idle_timeout);
    }
    if args.no_table_miss {
        info!("table-miss installation: disabled");
    }

    let (events_tx, events_rx) = mpsc::channel::<NetworkEvent>(args.channel_capacity);

    let mut coordinator = Coordinator::new(
        CoordinatorConfig {
            install_table_miss: !args.no_table_miss,
        },
        FlowInstallerConfig {
            priority: args.rule_priority,
            idle_timeout: args.idle_timeout,
        },
        Arc::new(LoggingPlane),
        None,
    );

    let worker = tokio::spawn(async move {
        coordinator.run(events_rx).await;
    });

    signal::ctrl_c().await?;
    info!("interrupt received, shutting down");

    // Closing the channel lets the coordinator drain and stop.
    drop(events_tx);
    worker.await?;

    info!("pathctld stopped");
    Ok(())
}
