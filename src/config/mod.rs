//! Configuration module for Joinery.
//!
//! Handles query defaults, named connections and environment variable
//! expansion.

mod settings;

pub use settings::{expand_env_vars, ConnectionSettings, QuerySettings, Settings, SettingsError};
