//! Game configuration
//!
//! One file configures both the engine sections and the gameplay tuning:
//!
//! ```toml
//! [engine]
//! log_level = "debug"
//!
//! [collision]
//! default_strategy = "rdc_aabb"
//!
//! [gameplay]
//! ticks = 600
//! ```

use heist_engine::core::config::{ApplicationConfig, CollisionConfig, Config, ConfigError, EngineConfig, WorldConfig};
use serde::{Deserialize, Serialize};

/// Complete game configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Logging and debug features
    pub engine: EngineConfig,
    /// Collision detection
    pub collision: CollisionConfig,
    /// Spatial index for region queries
    pub world: WorldConfig,
    /// Gameplay tuning
    pub gameplay: GameplayConfig,
}

impl GameConfig {
    /// Engine-side part of the configuration
    pub fn application(&self) -> ApplicationConfig {
        ApplicationConfig {
            engine: self.engine.clone(),
            collision: self.collision.clone(),
            world: self.world.clone(),
        }
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.application().validate()?;
        self.gameplay.validate()
    }
}

impl Config for GameConfig {}

/// Gameplay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplayConfig {
    /// Number of simulation ticks to run
    pub ticks: u32,
    /// Fixed time step in seconds
    pub timestep: f32,
    /// Map tile size
    pub tile_size: f32,
    /// Player walking speed
    pub player_speed: f32,
    /// Guard patrol speed
    pub guard_speed: f32,
    /// Side of the square a guard watches
    pub guard_sight: f32,
    /// Seed for guard patrol decisions
    pub seed: u64,
    /// Log a mouse pick every this many ticks (0 disables)
    pub pick_interval: u32,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            ticks: 300,
            timestep: 1.0 / 60.0,
            tile_size: 32.0,
            player_speed: 90.0,
            guard_speed: 40.0,
            guard_sight: 64.0,
            seed: 0x4e15,
            pick_interval: 60,
        }
    }
}

impl GameplayConfig {
    /// Validate gameplay values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.timestep.is_finite() && self.timestep > 0.0) {
            return Err(ConfigError::Invalid("timestep must be positive".to_string()));
        }
        if !(self.tile_size.is_finite() && self.tile_size > 0.0) {
            return Err(ConfigError::Invalid("tile_size must be positive".to_string()));
        }
        if !(self.guard_sight.is_finite() && self.guard_sight >= 0.0) {
            return Err(ConfigError::Invalid("guard_sight cannot be negative".to_string()));
        }
        Ok(())
    }
}
