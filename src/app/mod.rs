//! Application glue module
//!
//! Configuration loading for hosts and the headless binary.

mod config;

pub use config::{default_path, Config, ConfigError};
