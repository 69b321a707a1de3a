//! List command implementation

use crate::cli::utils;
use crate::plugin::evaluate_state;
use anyhow::Result;
use clap::{ArgMatches, Command};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

pub fn command() -> Command {
    Command::new("list")
        .about("List available actions")
        .arg(
            clap::Arg::new("beta")
                .short('b')
                .long("beta")
                .help("Include beta actions")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("json")
                .long("json")
                .help("Print the listing as JSON")
                .action(clap::ArgAction::SetTrue),
        )
}

/// Listing entry
#[derive(Debug, Serialize)]
struct ActionSummary<'a> {
    identifier: &'a str,
    name: &'a str,
    description: &'a str,
    groups: Vec<&'a str>,
    beta: bool,
    state: &'static str,
    pinned: bool,
    source: Option<&'a PathBuf>,
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    let config = utils::load_config(matches)?;
    let include_beta = matches.get_flag("beta") || config.show_beta;
    let app = utils::create_app(config).await?;

    let snapshot = app.registry().snapshot();
    let identifiers = snapshot.identifiers(include_beta);
    info!("Listing {} action(s)", identifiers.len());

    let summaries: Vec<ActionSummary> = identifiers
        .iter()
        .filter_map(|identifier| snapshot.get(identifier))
        .map(|action| {
            let metadata = action.metadata();
            ActionSummary {
                identifier: &metadata.identifier,
                name: &metadata.name,
                description: &metadata.description,
                groups: metadata.display_groups(),
                beta: metadata.beta,
                state: evaluate_state(action.as_ref()).label(),
                pinned: app.config().pinned.contains(&metadata.identifier),
                source: metadata.source.as_ref(),
            }
        })
        .collect();

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if summaries.is_empty() {
        println!("No actions found.");
    } else {
        println!("Available actions:");
        for summary in &summaries {
            let mut flags = Vec::new();
            if summary.pinned {
                flags.push("pinned");
            }
            if summary.beta {
                flags.push("beta");
            }
            if summary.state != "valid" {
                flags.push(summary.state);
            }

            let flags = if flags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", flags.join(", "))
            };
            println!("  {} - {}{}", summary.identifier, summary.name, flags);
            if !summary.description.is_empty() {
                println!("      {}", summary.description);
            }
        }
    }

    utils::print_warnings(&app);
    Ok(())
}
