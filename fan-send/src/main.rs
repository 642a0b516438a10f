//! fan-send - Scheduler daemon for Fanout
//!
//! Polls for scheduled posts that are due and publishes them to every
//! platform they target.

use clap::Parser;
use libfanout::logging::LoggingConfig;
use libfanout::{FanoutError, FanoutService, Result, SchedulerRun};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "fan-send")]
#[command(version)]
#[command(about = "Scheduler daemon that publishes due posts")]
#[command(long_about = "\
fan-send - Scheduler daemon that publishes due posts

DESCRIPTION:
    fan-send polls the Fanout database at a fixed interval. Every scheduled
    post whose time has come is claimed, published to each of its platforms
    and marked published (at least one platform succeeded) or failed.

    Several fan-send processes may run against the same database; a post is
    only ever processed by the run that claims it.

USAGE:
    # Run in foreground (logs to stderr)
    fan-send

    # Poll every 30 seconds
    fan-send --poll-interval 30

    # Process due posts once and print a summary
    fan-send --once --format json

SIGNALS:
    SIGTERM, SIGINT - Graceful shutdown (finishes the current run)

CONFIGURATION:
    Configuration file: ~/.config/fanout/config.toml (or $FANOUT_CONFIG)

    [scheduler]
    poll_interval = 60  # seconds between runs

EXIT CODES:
    0 - Clean shutdown
    1 - Runtime error
    2 - Configuration error
    3 - Invalid arguments
")]
struct Cli {
    /// Poll interval in seconds (overrides config)
    #[arg(long, value_name = "SECONDS")]
    poll_interval: Option<u64>,

    /// Process due posts once, print the run summary and exit
    #[arg(long)]
    once: bool,

    /// Summary format for --once: text or json
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::from_env("info", cli.verbose).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    if cli.format != "text" && cli.format != "json" {
        return Err(FanoutError::Validation(format!(
            "Invalid format '{}'. Valid options: text, json",
            cli.format
        )));
    }

    let service = FanoutService::new().await?;

    if cli.once {
        let run = service.scheduler().run_once().await?;
        print_run(&run, &cli.format)?;
        return Ok(());
    }

    let poll_interval = cli
        .poll_interval
        .unwrap_or(service.config().scheduler.poll_interval)
        .max(1);

    info!("fan-send starting, poll interval {}s", poll_interval);

    let shutdown = Arc::new(AtomicBool::new(false));
    setup_signal_handlers(shutdown.clone());

    run_daemon_loop(&service, poll_interval, shutdown).await;

    info!("fan-send stopped");
    Ok(())
}

#[cfg(unix)]
fn setup_signal_handlers(shutdown: Arc<AtomicBool>) {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = match Signals::new([SIGINT, SIGTERM]) {
        Ok(signals) => signals,
        Err(e) => {
            warn!("Signal handling unavailable, stop with kill -9: {}", e);
            return;
        }
    };

    std::thread::spawn(move || {
        if signals.forever().next().is_some() {
            info!("Received shutdown signal, stopping after the current run");
            shutdown.store(true, Ordering::Relaxed);
        }
    });
}

#[cfg(not(unix))]
fn setup_signal_handlers(_shutdown: Arc<AtomicBool>) {
    warn!("Graceful shutdown is only supported on Unix");
}

/// Run the scheduler until shutdown; a failed run is logged and retried
/// on the next tick
async fn run_daemon_loop(service: &FanoutService, poll_interval: u64, shutdown: Arc<AtomicBool>) {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        if let Err(e) = service.scheduler().run_once().await {
            error!("Scheduler run failed: {}", e);
        }

        // Sleep in one-second steps so a signal is noticed promptly
        for _ in 0..poll_interval {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            sleep(Duration::from_secs(1)).await;
        }
    }
}

fn print_run(run: &SchedulerRun, format: &str) -> Result<()> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(run)?);
    } else {
        println!(
            "processed: {}, published: {}, failed: {}",
            run.processed_count, run.published, run.failed
        );
    }
    Ok(())
}
