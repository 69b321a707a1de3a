//! Run command implementation

use crate::cli::utils;
use anyhow::Result;
use clap::{ArgMatches, Command};
use std::time::Duration;
use tracing::debug;

/// How long to wait for the status re-poll after running an action
const REPOLL_GRACE: Duration = Duration::from_secs(10);

pub fn command() -> Command {
    Command::new("run")
        .about("Run an action")
        .arg(clap::arg!(<ACTION> "Action identifier"))
        .arg(
            clap::Arg::new("action")
                .short('a')
                .long("action")
                .help("Run one of the action's sub-actions instead")
                .value_name("NAME"),
        )
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    let identifier = matches
        .get_one::<String>("ACTION")
        .expect("ACTION is required");

    let config = utils::load_config(matches)?;
    let mut app = utils::create_app(config).await?;
    let mut results = app.take_results();

    let outcome = match matches.get_one::<String>("action") {
        Some(name) => app.run_sub_action(identifier, name).await,
        None => app.run(identifier).await,
    };

    outcome?;
    println!("Started {}", identifier);

    // Report the refreshed status, if the probe finishes in time
    if tokio::time::timeout(REPOLL_GRACE, app.poller().wait_idle())
        .await
        .is_err()
    {
        debug!("Status re-poll for {} still running", identifier);
        return Ok(());
    }
    if let Some(results) = results.as_mut() {
        while let Ok(result) = results.try_recv() {
            if result.status.is_some() {
                println!("{}", utils::describe_result(&result));
            }
        }
    }

    Ok(())
}
