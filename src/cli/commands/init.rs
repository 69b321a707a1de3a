//! Init command implementation

use crate::Config;
use anyhow::{anyhow, Result};
use clap::{ArgMatches, Command};
use std::path::PathBuf;
use tracing::info;

pub fn command() -> Command {
    Command::new("init")
        .about("Initialize a new configuration file")
        .arg(
            clap::Arg::new("output")
                .short('o')
                .long("output")
                .help("Output file path")
                .value_name("FILE")
                .conflicts_with("user"),
        )
        .arg(
            clap::Arg::new("user")
                .short('u')
                .long("user")
                .help("Write the per-user configuration file")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("force")
                .short('f')
                .long("force")
                .help("Overwrite an existing file")
                .action(clap::ArgAction::SetTrue),
        )
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    let output_path = if matches.get_flag("user") {
        Config::user_config_path()?
    } else {
        matches
            .get_one::<String>("output")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("launchpad.yaml"))
    };

    if output_path.exists() && !matches.get_flag("force") {
        return Err(anyhow!(
            "Configuration file already exists: {:?} (use --force to overwrite)",
            output_path
        ));
    }

    info!("Initializing configuration file: {:?}", output_path);
    Config::default().save_to_file(&output_path)?;

    println!("Configuration file created: {}", output_path.display());
    println!("Add search paths with 'launchpad paths add <DIR>'.");

    Ok(())
}
