pub mod cli;
pub mod logging_system;

pub use cli::Cli;
pub use logging_system::{LogLevel, LoggingSystem, setup_logging};

use crate::domain::Severity;
use crate::drain::DrainOutcome;
use crate::normalizer::normalize;
use crate::transport::Transport;
use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Forward every line of `input` through `transport` until EOF or Ctrl-C.
///
/// Returns the number of records dispatched.
pub async fn forward_lines<R>(transport: &Transport, min_level: Severity, input: R) -> usize
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut dispatched = 0;

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let record = normalize(line);
                    if record.level >= min_level {
                        transport.write(record);
                        dispatched += 1;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    error!("Failed to read input: {}", e);
                    break;
                }
            },
            _ = &mut ctrl_c => {
                info!("Received SIGINT (Ctrl+C), draining and exiting");
                break;
            }
        }
    }

    dispatched
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.transport_config()?;
    let min_level = config.level;
    let transport = Transport::new(config)?;

    info!("Starting rask-log-transport v{}", get_version());

    let stdin = BufReader::new(tokio::io::stdin());
    let dispatched = forward_lines(&transport, min_level, stdin).await;

    match transport.wait_until_idle(cli.drain_timeout()).await {
        DrainOutcome::Idle => info!("Dispatched {} records; all deliveries finished", dispatched),
        DrainOutcome::TimedOut { in_flight } => warn!(
            "Dispatched {} records; {} deliveries still in flight after {:?}",
            dispatched,
            in_flight,
            cli.drain_timeout()
        ),
    }

    let stats = transport.stats();
    info!(
        "Remote delivery: {} succeeded, {} failed, {} skipped",
        stats.succeeded, stats.failed, stats.skipped
    );
    Ok(())
}

// Main entry point for the application
pub async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Err(e) = setup_logging(cli.log_level) {
        eprintln!("Failed to initialize logging: {e}");
    }

    run(cli).await
}
