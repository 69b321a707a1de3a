//! Search path management

use crate::cli::utils;
use anyhow::Result;
use clap::{ArgMatches, Command};
use std::path::PathBuf;
use tracing::info;

pub fn command() -> Command {
    Command::new("paths")
        .about("Manage action search paths")
        .subcommand(Command::new("list").about("List configured search paths"))
        .subcommand(
            Command::new("add")
                .about("Add a search path")
                .arg(clap::arg!(<PATH> "Directory containing action manifests")),
        )
        .subcommand(
            Command::new("remove")
                .about("Remove a search path")
                .arg(clap::arg!(<PATH> "Configured search path")),
        )
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    let config_path = utils::get_config_path(matches)?;
    let mut config = utils::load_config(matches)?;

    match matches.subcommand() {
        Some(("add", sub_matches)) => {
            let path = PathBuf::from(
                sub_matches
                    .get_one::<String>("PATH")
                    .expect("PATH is required"),
            );
            if config.add_search_path(path.clone()) {
                config.save_to_file(&config_path)?;
                info!("Added search path {:?} to {:?}", path, config_path);
                println!("Added search path: {}", path.display());
            } else {
                println!("Search path already configured: {}", path.display());
            }
        }
        Some(("remove", sub_matches)) => {
            let path = PathBuf::from(
                sub_matches
                    .get_one::<String>("PATH")
                    .expect("PATH is required"),
            );
            if config.remove_search_path(&path) {
                config.save_to_file(&config_path)?;
                info!("Removed search path {:?} from {:?}", path, config_path);
                println!("Removed search path: {}", path.display());
            } else {
                println!("Search path not configured: {}", path.display());
            }
        }
        _ => {
            let expanded = config.expanded_search_paths()?;
            if expanded.is_empty() {
                println!("No search paths configured.");
            }
            for path in expanded {
                let marker = if path.is_dir() { "" } else { " (missing)" };
                println!("  {}{}", path.display(), marker);
            }
        }
    }

    Ok(())
}
