//! Configuration module for the YoAI runtime.
//!
//! This module provides layered configuration loading (files, environment,
//! programmatic overrides) and validation for the API client, the polling
//! loop, logging and the advertised command menu.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config};
pub use schema::{
    ApiConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, PollingConfig,
    SpanEventConfig, YoaiConfig,
};
pub use validation::validate_config;
