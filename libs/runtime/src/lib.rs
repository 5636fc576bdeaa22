//! Process-level runtime support: layered configuration, logging bootstrap
//! and home directory resolution.

pub mod config;
pub mod logging;
pub mod paths;

pub use config::{
    AppConfig, AppConfigProvider, AuthConfig, CliArgs, DatabaseConfig, Environment, LoggingConfig,
    Section, ServerConfig,
};
