//! Runtime configuration for the river generator.
//!
//! Settings persist to disk as RON and may be overridden from the command
//! line. Every section falls back to its defaults when absent.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Config, DebugConfig, DemoConfig, LayoutSettings, PopulateSettings, WindowSettings,
    WorldConfig, default_config_dir,
};
pub use error::ConfigError;
