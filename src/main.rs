//! proxysql-harness - ProxySQL test environment driver
//!
//! This is the composition root: it loads configuration, wires the Docker,
//! compose and MySQL adapters and runs one command.
//!
//! Commands:
//!   up        build and configure the environment, tear down on Ctrl-C
//!   down      stop and remove the environment
//!   topology  print the resolved backends as JSON

use proxysql_harness::{docker_harness, load_config, Harness};
use tracing_subscriber::fmt::format::FmtSpan;

const USAGE: &str = "usage: proxysql-harness <up|down|topology>";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Up,
    Down,
    Topology,
}

fn parse_command(arg: &str) -> anyhow::Result<Command> {
    match arg {
        "up" => Ok(Command::Up),
        "down" => Ok(Command::Down),
        "topology" => Ok(Command::Topology),
        other => anyhow::bail!("unknown command '{}'; {}", other, USAGE),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment
    let cfg = load_config()?;

    // Setup logging
    let log_level = if cfg.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    let command = parse_command(&std::env::args().nth(1).unwrap_or_default())?;

    // ===== COMPOSITION ROOT =====
    let mut harness = docker_harness(&cfg)?;

    match command {
        Command::Up => {
            tracing::info!("starting environment in {}", cfg.compose_dir.display());
            up(harness).await
        }
        Command::Down => {
            harness.teardown().await?;
            tracing::info!("environment removed");
            Ok(())
        }
        Command::Topology => {
            let backends = harness.backends().await?;
            println!("{}", serde_json::to_string_pretty(&backends)?);
            Ok(())
        }
    }
}

async fn up(mut harness: Harness) -> anyhow::Result<()> {
    let entries = match harness.setup().await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!("setup failed: {}", e);
            harness.shutdown().await?;
            return Err(e.into());
        }
    };

    println!("{}", serde_json::to_string_pretty(&entries)?);
    tracing::info!(
        "{} backends registered; press Ctrl-C to tear down",
        entries.len()
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    harness.shutdown().await?;
    Ok(())
}
