//! Settings Module
//!
//! Describes which source a client reads from and how often it refreshes.
//! Loaded from a TOML file or from environment variables.

pub mod manager;
pub mod types;

pub use manager::SettingsManager;
pub use types::*;
