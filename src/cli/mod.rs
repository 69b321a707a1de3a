//! CLI command implementations

use anyhow::Result;
use clap::{ArgMatches, Command};

pub mod commands;

/// Main CLI application
pub struct CliApp;

impl CliApp {
    /// Create the CLI application
    pub fn app() -> Command {
        Command::new("launchpad")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Discover, run and monitor launcher actions")
            .arg(
                clap::Arg::new("config")
                    .short('c')
                    .long("config")
                    .help("Configuration file path")
                    .value_name("FILE")
                    .global(true),
            )
            .subcommand(commands::init::command())
            .subcommand(commands::list::command())
            .subcommand(commands::groups::command())
            .subcommand(commands::info::command())
            .subcommand(commands::run::command())
            .subcommand(commands::status::command())
            .subcommand(commands::watch::command())
            .subcommand(commands::paths::command())
            .subcommand(commands::pins::command())
    }

    /// Run the CLI application
    pub async fn run(matches: &ArgMatches) -> Result<()> {
        match matches.subcommand() {
            Some(("init", sub_matches)) => commands::init::run(sub_matches).await,
            Some(("list", sub_matches)) => commands::list::run(sub_matches).await,
            Some(("groups", sub_matches)) => commands::groups::run(sub_matches).await,
            Some(("info", sub_matches)) => commands::info::run(sub_matches).await,
            Some(("run", sub_matches)) => commands::run::run(sub_matches).await,
            Some(("status", sub_matches)) => commands::status::run(sub_matches).await,
            Some(("watch", sub_matches)) => commands::watch::run(sub_matches).await,
            Some(("paths", sub_matches)) => commands::paths::run(sub_matches).await,
            Some(("pins", sub_matches)) => commands::pins::run(sub_matches).await,
            _ => {
                // No subcommand provided, show help
                let _ = Self::app().print_help();
                Ok(())
            }
        }
    }
}

/// Common CLI utilities
pub mod utils {
    use anyhow::Result;
    use std::path::PathBuf;
    use tracing::debug;

    /// Configuration files looked up in the working directory
    const LOCAL_CONFIG_FILES: [&str; 3] = ["launchpad.yaml", "launchpad.yml", ".launchpad.yaml"];

    /// Get configuration file path from arguments, the working directory or
    /// the user configuration directory. `None` when no file exists yet.
    pub fn find_config_path(matches: &clap::ArgMatches) -> Result<Option<PathBuf>> {
        if let Some(config_path) = matches.get_one::<String>("config") {
            return Ok(Some(PathBuf::from(config_path)));
        }

        if let Some(path) = LOCAL_CONFIG_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
        {
            return Ok(Some(path));
        }

        let user_config = crate::Config::user_config_path()?;
        Ok(user_config.exists().then_some(user_config))
    }

    /// Configuration file the CLI writes to
    pub fn get_config_path(matches: &clap::ArgMatches) -> Result<PathBuf> {
        match find_config_path(matches)? {
            Some(path) => Ok(path),
            None => crate::Config::user_config_path(),
        }
    }

    /// Load configuration from file, falling back to defaults
    pub fn load_config(matches: &clap::ArgMatches) -> Result<crate::Config> {
        match find_config_path(matches)? {
            Some(path) => {
                debug!("Loading configuration from {:?}", path);
                crate::Config::from_file(&path)
            }
            None => {
                debug!("No configuration file found; using defaults");
                Ok(crate::Config::default())
            }
        }
    }

    /// Create LaunchPad instance
    pub async fn create_app(config: crate::Config) -> Result<crate::LaunchPad> {
        Ok(crate::LaunchPad::new(config).await?)
    }

    /// Print discovery warnings
    pub fn print_warnings(app: &crate::LaunchPad) {
        let warnings = app.registry().warnings();
        if !warnings.is_empty() {
            eprintln!("Warnings:");
            for warning in warnings {
                eprintln!("  - {}", warning);
            }
        }
    }

    /// One line summary of a poll result
    pub fn describe_result(result: &crate::PollResult) -> String {
        match &result.outcome {
            crate::PollOutcome::Reported => match &result.status {
                Some(status) => format!("{}: {}", result.identifier, status),
                None => format!("{}: ok", result.identifier),
            },
            crate::PollOutcome::Skipped => format!("{}: unavailable", result.identifier),
            crate::PollOutcome::Failed(message) => {
                format!("{}: probe failed ({})", result.identifier, message)
            }
        }
    }
}
