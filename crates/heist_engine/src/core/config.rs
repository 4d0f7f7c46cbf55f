//! # Unified Configuration System
//!
//! All configuration structures for the engine live here. Each subsystem
//! gets its own section so a game can ship one file covering logging,
//! collision detection and the world's spatial index.
//!
//! ## Configuration Categories
//!
//! - **Engine Config**: logging and debug features
//! - **Collision Config**: default broad-phase strategy and its tuning
//! - **World Config**: spatial index used for region queries
//!
//! Files can be TOML or RON, see [`Config`].

use serde::{Deserialize, Serialize};

// Re-export from the config module for compatibility
pub use crate::config::{Config, ConfigError, ConfigFormat};
use crate::physics::StrategyKind;
use crate::spatial::{QuadtreeConfig, SpatialIndexKind};

/// # Engine Configuration
///
/// Core engine behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default log filter, e.g. `"info"` or `"heist_engine=trace"`
    pub log_level: String,
    /// Whether to enable debug features
    pub debug_mode: bool,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            debug_mode: cfg!(debug_assertions),
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable debug mode
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug_mode = enabled;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Collision Configuration
///
/// Tuning for the broad phase of the collision detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Strategy used when game code does not pick one explicitly
    pub default_strategy: StrategyKind,
    /// Clusters at or below this size are brute forced by the RDC strategies
    pub rdc_min_cluster: usize,
}

impl CollisionConfig {
    /// Default cluster size below which RDC falls back to brute force
    pub const DEFAULT_RDC_MIN_CLUSTER: usize = 10;

    /// Create a new collision configuration
    pub fn new() -> Self {
        Self {
            default_strategy: StrategyKind::Aabb,
            rdc_min_cluster: Self::DEFAULT_RDC_MIN_CLUSTER,
        }
    }

    /// Set the default strategy
    pub fn with_default_strategy(mut self, kind: StrategyKind) -> Self {
        self.default_strategy = kind;
        self
    }

    /// Set the RDC brute-force threshold
    pub fn with_rdc_min_cluster(mut self, min_cluster: usize) -> Self {
        self.rdc_min_cluster = min_cluster;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rdc_min_cluster == 0 {
            return Err(ConfigError::Invalid("rdc_min_cluster must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # World Configuration
///
/// Selects and tunes the spatial index behind region queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Index used by `get_entities_in_region`
    pub spatial_index: SpatialIndexKind,
    /// Quadtree settings, used when `spatial_index` is `quadtree`
    pub quadtree: QuadtreeConfig,
}

impl WorldConfig {
    /// Use the given index kind
    pub fn with_spatial_index(mut self, kind: SpatialIndexKind) -> Self {
        self.spatial_index = kind;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let quadtree = &self.quadtree;
        quadtree
            .bounds
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("quadtree bounds: {e}")))?;
        if quadtree.max_entities_per_node == 0 {
            return Err(ConfigError::Invalid("max_entities_per_node must be at least 1".to_string()));
        }
        if !(quadtree.min_node_size.is_finite() && quadtree.min_node_size > 0.0) {
            return Err(ConfigError::Invalid("min_node_size must be positive".to_string()));
        }
        Ok(())
    }
}

/// # Complete Application Configuration
///
/// Top-level configuration that encompasses all engine subsystems.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Engine core configuration
    pub engine: EngineConfig,
    /// Collision detection configuration
    pub collision: CollisionConfig,
    /// World configuration
    pub world: WorldConfig,
}

impl ApplicationConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.log_level.trim().is_empty() {
            return Err(ConfigError::Invalid("log_level cannot be empty".to_string()));
        }
        self.collision.validate()?;
        self.world.validate()?;
        Ok(())
    }
}

impl Config for ApplicationConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ApplicationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.collision.rdc_min_cluster, 10);
        assert_eq!(config.collision.default_strategy, StrategyKind::Aabb);
        assert_eq!(config.world.spatial_index, SpatialIndexKind::Linear);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml = r#"
            [collision]
            default_strategy = "rdc_aabb"
            rdc_min_cluster = 4

            [world]
            spatial_index = "quadtree"
        "#;
        let config = ApplicationConfig::from_str_as(toml, ConfigFormat::Toml).unwrap();
        assert_eq!(config.collision.default_strategy, StrategyKind::RdcAabb);
        assert_eq!(config.collision.rdc_min_cluster, 4);
        assert_eq!(config.world.spatial_index, SpatialIndexKind::Quadtree);
        assert_eq!(config.engine.log_level, "info");
    }

    #[test]
    fn test_ron_round_trip_preserves_values() {
        let mut config = ApplicationConfig::default();
        config.engine = config.engine.with_log_level("debug");
        config.collision = config.collision.with_default_strategy(StrategyKind::RdcRadius);

        let text = config.to_string_as(ConfigFormat::Ron).unwrap();
        let parsed = ApplicationConfig::from_str_as(&text, ConfigFormat::Ron).unwrap();
        assert_eq!(parsed.engine.log_level, "debug");
        assert_eq!(parsed.collision.default_strategy, StrategyKind::RdcRadius);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = ApplicationConfig::default();
        config.collision.rdc_min_cluster = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = ApplicationConfig::default();
        config.world.quadtree.bounds.w = -1.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = ApplicationConfig {
            engine: EngineConfig::new().with_log_level(" "),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
