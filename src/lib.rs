/// Agents and the episode loop
pub mod agent;

/// Planning algorithms
pub mod algo;

/// Environment
pub mod env;

/// Crate error type
pub mod error;

/// Testing environments
pub mod gym;

mod util;

pub use error::{Error, Result};
