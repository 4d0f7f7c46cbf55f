//! Physics module for collision detection and response
//!
//! Provides group-based collision detection with interchangeable broad-phase
//! strategies (brute force and recursive dimensional clustering) and
//! type-pair keyed narrow-phase dispatch.

pub mod broad_phase;
pub mod detector;
pub mod group;
pub mod narrow_phase;
pub mod strategy;


pub use broad_phase::{Body, BoundingVolume, CandidatePair, Pairing};
pub use detector::{BroadResult, CollisionDetector, PairRegistration};
pub use group::{Group, GroupRegistry};
pub use narrow_phase::{typed, DispatchStats, NarrowFn, NarrowTable, ResponseFallback, TypePair};
pub use strategy::{
    AabbStrategy, BoundingRadiusStrategy, CollisionStrategy, RdcAabbStrategy, RdcRadiusStrategy, StrategyKind,
};
