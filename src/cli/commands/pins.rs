//! Pinned action management

use crate::cli::utils;
use anyhow::Result;
use clap::{ArgMatches, Command};

pub fn command() -> Command {
    Command::new("pins")
        .about("Manage pinned actions")
        .subcommand(Command::new("list").about("List pinned actions"))
        .subcommand(
            Command::new("add")
                .about("Pin an action")
                .arg(clap::arg!(<ACTION> "Action identifier")),
        )
        .subcommand(
            Command::new("remove")
                .about("Unpin an action")
                .arg(clap::arg!(<ACTION> "Action identifier")),
        )
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    let config_path = utils::get_config_path(matches)?;
    let mut config = utils::load_config(matches)?;

    match matches.subcommand() {
        Some(("add", sub_matches)) => {
            let identifier = sub_matches
                .get_one::<String>("ACTION")
                .expect("ACTION is required");
            if config.pin(identifier) {
                config.save_to_file(&config_path)?;
                println!("Pinned {}", identifier);
            } else {
                println!("{} is already pinned", identifier);
            }
        }
        Some(("remove", sub_matches)) => {
            let identifier = sub_matches
                .get_one::<String>("ACTION")
                .expect("ACTION is required");
            if config.unpin(identifier) {
                config.save_to_file(&config_path)?;
                println!("Unpinned {}", identifier);
            } else {
                println!("{} is not pinned", identifier);
            }
        }
        _ => {
            let app = utils::create_app(config).await?;
            let available = app.pinned();
            for identifier in &app.config().pinned {
                let marker = if available.contains(identifier) {
                    ""
                } else {
                    " (unavailable)"
                };
                println!("  {}{}", identifier, marker);
            }
        }
    }

    Ok(())
}
