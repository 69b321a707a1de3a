//! `command` actions: launch a program

pub mod action;
pub mod factory;
pub mod spec;

#[cfg(test)]
mod tests;

// Re-export main types for convenience
pub use action::CommandAction;
pub use factory::CommandActionFactory;
pub use spec::CommandSpec;
