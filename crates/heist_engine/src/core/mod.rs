//! # Core Engine Module
//!
//! Shared abstractions used by the other engine subsystems.
//!
//! ## Organization
//!
//! - **Config**: Unified configuration system for all engine subsystems

pub mod config;

// Re-export commonly used config types
pub use config::{
    ApplicationConfig,
    CollisionConfig,
    EngineConfig,
    WorldConfig,
    Config,
    ConfigError,
};
