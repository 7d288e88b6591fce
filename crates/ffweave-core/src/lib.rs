//! ffweave-core: shared error type and configuration.
//!
//! This crate is the foundational dependency for the other ffweave crates.

pub mod config;
pub mod error;

// Re-export the most commonly used items at the crate root.
pub use config::{Config, FfmpegConfig, ProgressConfig};
pub use error::{Error, Result};
