//! Watch command implementation

use crate::cli::utils;
use crate::StatusTracker;
use anyhow::{anyhow, Result};
use clap::{ArgMatches, Command};
use std::time::Duration;
use tracing::{info, warn};

pub fn command() -> Command {
    Command::new("watch")
        .about("Poll action status periodically and print changes")
        .arg(
            clap::Arg::new("interval")
                .short('i')
                .long("interval")
                .help("Seconds between polling rounds (overrides the configuration)")
                .value_name("SECS")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    let config = utils::load_config(matches)?;
    let interval = matches
        .get_one::<u64>("interval")
        .map(|secs| Duration::from_secs(*secs))
        .unwrap_or_else(|| config.poll_interval());

    let mut app = utils::create_app(config).await?;
    let mut results = app
        .take_results()
        .ok_or_else(|| anyhow!("Poll results already taken"))?;
    utils::print_warnings(&app);

    let printer = tokio::spawn(async move {
        let mut tracker = StatusTracker::new();
        while let Some(result) = results.recv().await {
            if let Some(alert) = tracker.observe(&result) {
                let at = alert.observed_at.format("%H:%M:%S");
                match &alert.current {
                    Some(status) => println!("[{}] {}: {}", at, alert.identifier, status),
                    None => println!("[{}] {}: cleared", at, alert.identifier),
                }
            }
        }
    });

    println!(
        "Watching action status every {}s, press Ctrl-C to stop",
        interval.as_secs()
    );
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    app.poller().run_periodic(interval, shutdown).await;

    info!("Waiting for running status probes");
    app.poller().wait_idle().await;
    printer.abort();

    Ok(())
}
