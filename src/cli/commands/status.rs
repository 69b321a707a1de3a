//! Status command implementation

use crate::cli::utils;
use crate::PollRequest;
use anyhow::Result;
use clap::{ArgMatches, Command};
use tracing::info;

pub fn command() -> Command {
    Command::new("status")
        .about("Probe action status once")
        .arg(clap::arg!([ACTION] ... "Action identifiers; every listed action when omitted"))
        .arg(
            clap::Arg::new("json")
                .long("json")
                .help("Print the results as JSON")
                .action(clap::ArgAction::SetTrue),
        )
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    let config = utils::load_config(matches)?;
    let mut app = utils::create_app(config).await?;
    let mut results = app
        .take_results()
        .ok_or_else(|| anyhow::anyhow!("Poll results already taken"))?;

    let requested: Vec<&String> = matches
        .get_many::<String>("ACTION")
        .map(|ids| ids.collect())
        .unwrap_or_default();

    let started = if requested.is_empty() {
        app.poller().trigger_all()
    } else {
        requested
            .iter()
            .map(|identifier| app.poller().poll(identifier))
            .filter(|request| *request == PollRequest::Scheduled)
            .count()
    };
    info!("Waiting for {} status probe(s)", started);

    app.poller().wait_idle().await;

    let mut collected = Vec::new();
    while let Ok(result) = results.try_recv() {
        collected.push(result);
    }
    collected.sort_by(|a, b| a.identifier.cmp(&b.identifier));

    for identifier in &requested {
        if !collected.iter().any(|r| &r.identifier == *identifier) {
            eprintln!("Action not found: {}", identifier);
        }
    }

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&collected)?);
    } else if collected.is_empty() {
        println!("No actions probed.");
    } else {
        for result in &collected {
            println!("{}", utils::describe_result(result));
        }
    }

    Ok(())
}
