//! Plugin traits and interfaces

pub mod action;
pub mod factory;


// Re-export main types for convenience
pub use action::*;
pub use factory::*;
