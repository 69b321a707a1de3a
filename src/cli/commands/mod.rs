//! CLI command modules

pub mod groups;
pub mod info;
pub mod init;
pub mod list;
pub mod paths;
pub mod pins;
pub mod run;
pub mod status;
pub mod watch;
