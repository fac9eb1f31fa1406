//! # Core Module
//!
//! Shared configuration types used by the engine driver and the CLI.

pub mod config;

pub use config::{ProjectionConfig, ResourceConfig, TutorialConfig, WindowConfig};
pub use crate::config::{Config, ConfigError, ConfigFormat};
