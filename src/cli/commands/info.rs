//! Info command implementation

use crate::cli::utils;
use anyhow::Result;
use clap::{ArgMatches, Command};

pub fn command() -> Command {
    Command::new("info")
        .about("Show information about an action")
        .arg(clap::arg!(<ACTION> "Action identifier"))
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    let identifier = matches
        .get_one::<String>("ACTION")
        .expect("ACTION is required");

    let config = utils::load_config(matches)?;
    let app = utils::create_app(config).await?;

    let handle = app.registry().request(identifier)?;
    let metadata = handle.metadata();

    println!("{} ({})", metadata.name, metadata.identifier);
    if !metadata.description.is_empty() {
        println!("  {}", metadata.description);
    }
    println!("  Groups: {}", metadata.display_groups().join(", "));
    println!("  State: {}", handle.state().label());
    println!("  Beta: {}", metadata.beta);
    println!("  Icon: {}", metadata.icon());
    if let Some(source) = &metadata.source {
        println!("  Source: {:?}", source);
    }

    let delay = handle.action().status_probe_delay();
    if !delay.is_zero() {
        println!(
            "  Status probe delay: {}",
            crate::utils::format_duration(delay)
        );
    }

    let sub_actions = app.sub_actions(identifier)?;
    if !sub_actions.is_empty() {
        println!("  Actions:");
        for name in sub_actions {
            println!("    - {}", name);
        }
    }

    Ok(())
}
