//! # Core Module
//!
//! Shared configuration types used by the session and the command line
//! front end.

pub mod config;

// Re-export commonly used config types
pub use config::{
    RendererConfig,
    LightConfig,
    MaterialConfig,
    LoggingConfig,
    Config,
    ConfigError,
};
