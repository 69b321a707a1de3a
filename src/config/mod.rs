//! Configuration management for LaunchPad

pub mod config;


pub use config::{Config, CONFIG_VERSION, DEFAULT_POLL_INTERVAL_SECS};
