//! # ota-common
//!
//! Configuration and error types shared by the OTA update server.

pub mod config;
pub mod error;

pub use config::{AppConfig, ConfigError, LogFormat, Overrides};
pub use error::{AppError, AppResult};
