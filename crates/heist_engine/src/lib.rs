//! # Heist Engine
//!
//! Collision detection and spatial queries for a 2D top-down stealth game.
//!
//! ## Features
//!
//! - **Entity World**: slotmap-backed arena of game objects with region and
//!   point queries
//! - **Named Groups**: shared entity lists game code keeps mutating between
//!   ticks
//! - **Broad Phase**: brute-force and recursive dimensional clustering, over
//!   rects or bounding circles
//! - **Narrow Phase**: type-pair keyed dispatch with a double-dispatch
//!   fallback
//! - **Configuration**: TOML/RON files for logging, strategies and the
//!   spatial index
//!
//! ## Quick Start
//!
//! ```rust
//! use std::any::Any;
//! use heist_engine::prelude::*;
//!
//! struct Wall { rect: Rect, bumps: u32 }
//!
//! impl Entity for Wall {
//!     fn rect(&self) -> Rect { self.rect }
//!     fn as_any(&self) -> &dyn Any { self }
//!     fn as_any_mut(&mut self) -> &mut dyn Any { self }
//! }
//!
//! let mut world = World::new();
//! let a = world.spawn(Wall { rect: Rect::new(0.0, 0.0, 10.0, 10.0), bumps: 0 }).unwrap();
//! let b = world.spawn(Wall { rect: Rect::new(5.0, 5.0, 10.0, 10.0), bumps: 0 }).unwrap();
//!
//! let mut detector = CollisionDetector::new();
//! detector.register_group("walls", Group::from_ids([a, b]));
//! detector.register_pair("walls", "walls", detector.default_strategy());
//! detector.on_collision(|first: &mut Wall, second: &mut Wall| {
//!     first.bumps += 1;
//!     second.bumps += 1;
//! });
//!
//! detector.check(&mut world);
//! assert_eq!(world.get_as::<Wall>(a).map(|w| w.bumps), Some(1));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod core;

pub mod config;
pub mod foundation;
pub mod physics;
pub mod spatial;
pub mod world;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        core::config::{ApplicationConfig, CollisionConfig, Config, EngineConfig, WorldConfig},
        foundation::math::{Rect, Vec2},
        physics::{
            typed, CollisionDetector, CollisionStrategy, DispatchStats, Group, NarrowFn, Pairing, StrategyKind,
            TypePair,
        },
        spatial::SpatialIndexKind,
        world::{Entity, EntityId, World, WorldError},
    };
}
