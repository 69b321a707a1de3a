//! Groups command implementation

use crate::cli::utils;
use anyhow::Result;
use clap::{ArgMatches, Command};

pub fn command() -> Command {
    Command::new("groups")
        .about("List available actions by group")
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

pub async fn run(matches: &ArgMatches) -> Result<()> {
    let config = utils::load_config(matches)?;
    let include_beta = matches.get_flag("beta") || config.show_beta;
    let app = utils::create_app(config).await?;

    let grouped = app.registry().grouped_identifiers(include_beta);

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&grouped)?);
        return Ok(());
    }

    let pinned = app.pinned();
    if !pinned.is_empty() {
        println!("Pinned:");
        for identifier in &pinned {
            println!("  {}", identifier);
        }
    }

    for (group, identifiers) in &grouped {
        println!("{}:", group);
        for identifier in identifiers {
            println!("  {}", identifier);
        }
    }

    if grouped.is_empty() {
        println!("No actions found.");
    }

    utils::print_warnings(&app);
    Ok(())
}
