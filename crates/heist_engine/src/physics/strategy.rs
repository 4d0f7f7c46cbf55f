//! Collision strategies
//!
//! A strategy pairs a broad-phase algorithm with the fallback its narrow phase
//! uses for unregistered type pairs. The detector holds strategies as
//! `Rc<dyn CollisionStrategy>`, so one instance can back many pair
//! registrations.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::broad_phase::{self, Body, CandidatePair, Pairing};
use super::group::{Group, GroupRegistry};
use super::narrow_phase::{self, DispatchStats, NarrowTable, ResponseFallback};
use crate::core::config::CollisionConfig;
use crate::world::World;

/// Broad and narrow phase behavior for one pair registration
pub trait CollisionStrategy: fmt::Debug {
    /// Short name for diagnostics
    fn name(&self) -> &'static str;

    /// Candidate pairs from geometry snapshots
    fn broad_pairs(&self, first: &[Body], second: &[Body], pairing: Pairing) -> Vec<CandidatePair>;

    /// Response used for type pairs without a narrow function
    fn fallback(&self) -> ResponseFallback;

    /// Candidate pairs for two named groups.
    ///
    /// A missing group yields no candidates. With [`Pairing::SelfCollision`]
    /// only the first group is read.
    fn check_broad(
        &self,
        name1: &str,
        name2: &str,
        pairing: Pairing,
        groups: &GroupRegistry,
        world: &World,
    ) -> Vec<CandidatePair> {
        let (Some(group1), Some(group2)) = (groups.get(name1), groups.get(name2)) else {
            log::debug!("{}: group '{name1}' or '{name2}' is not registered", self.name());
            return Vec::new();
        };

        let first = bodies(group1, world);
        let second = match pairing {
            Pairing::SelfCollision => Vec::new(),
            Pairing::Cross => bodies(group2, world),
        };
        self.broad_pairs(&first, &second, pairing)
    }

    /// Resolve candidate pairs through the narrow table
    fn check_narrow(&self, pairs: &[CandidatePair], table: &mut NarrowTable, world: &mut World) -> DispatchStats {
        narrow_phase::dispatch(pairs, table, world, self.fallback())
    }
}

/// Snapshot a group's members into bodies, skipping stale ids and malformed
/// geometry
pub fn bodies(group: &Group, world: &World) -> Vec<Body> {
    group
        .snapshot()
        .into_iter()
        .filter_map(|id| {
            let Some(entity) = world.get(id) else {
                log::debug!("Skipping {id:?}: grouped but no longer in the world");
                return None;
            };
            match Body::of(id, entity) {
                Ok(body) => Some(body),
                Err(e) => {
                    log::warn!("Skipping {id:?} in broad phase: {e}");
                    None
                }
            }
        })
        .collect()
}

/// Brute-force rect overlap
#[derive(Debug, Clone, Copy, Default)]
pub struct AabbStrategy;

impl CollisionStrategy for AabbStrategy {
    fn name(&self) -> &'static str {
        "aabb"
    }

    fn broad_pairs(&self, first: &[Body], second: &[Body], pairing: Pairing) -> Vec<CandidatePair> {
        broad_phase::brute_force_rect(first, second, pairing)
    }

    fn fallback(&self) -> ResponseFallback {
        ResponseFallback::FirstResponder
    }
}

/// Brute-force circle overlap
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundingRadiusStrategy;

impl CollisionStrategy for BoundingRadiusStrategy {
    fn name(&self) -> &'static str {
        "bounding_radius"
    }

    fn broad_pairs(&self, first: &[Body], second: &[Body], pairing: Pairing) -> Vec<CandidatePair> {
        broad_phase::brute_force_radius(first, second, pairing)
    }

    fn fallback(&self) -> ResponseFallback {
        ResponseFallback::BothRespond
    }
}

/// Recursive dimensional clustering over rects
#[derive(Debug, Clone, Copy)]
pub struct RdcAabbStrategy {
    /// Clusters at or below this size are brute forced
    pub min_cluster: usize,
}

impl Default for RdcAabbStrategy {
    fn default() -> Self {
        Self {
            min_cluster: CollisionConfig::DEFAULT_RDC_MIN_CLUSTER,
        }
    }
}

impl CollisionStrategy for RdcAabbStrategy {
    fn name(&self) -> &'static str {
        "rdc_aabb"
    }

    fn broad_pairs(&self, first: &[Body], second: &[Body], pairing: Pairing) -> Vec<CandidatePair> {
        broad_phase::rdc_rect(first, second, pairing, self.min_cluster)
    }

    fn fallback(&self) -> ResponseFallback {
        ResponseFallback::FirstResponder
    }
}

/// Recursive dimensional clustering over bounding circles
#[derive(Debug, Clone, Copy)]
pub struct RdcRadiusStrategy {
    /// Clusters at or below this size are brute forced
    pub min_cluster: usize,
}

impl Default for RdcRadiusStrategy {
    fn default() -> Self {
        Self {
            min_cluster: CollisionConfig::DEFAULT_RDC_MIN_CLUSTER,
        }
    }
}

impl CollisionStrategy for RdcRadiusStrategy {
    fn name(&self) -> &'static str {
        "rdc_radius"
    }

    fn broad_pairs(&self, first: &[Body], second: &[Body], pairing: Pairing) -> Vec<CandidatePair> {
        broad_phase::rdc_radius(first, second, pairing, self.min_cluster)
    }

    fn fallback(&self) -> ResponseFallback {
        ResponseFallback::BothRespond
    }
}

/// Strategy selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// [`AabbStrategy`]
    #[default]
    Aabb,
    /// [`BoundingRadiusStrategy`]
    BoundingRadius,
    /// [`RdcAabbStrategy`]
    RdcAabb,
    /// [`RdcRadiusStrategy`]
    RdcRadius,
}

impl StrategyKind {
    /// Build a shared strategy. `min_cluster` only applies to the RDC kinds.
    pub fn build(self, min_cluster: usize) -> Rc<dyn CollisionStrategy> {
        match self {
            Self::Aabb => Rc::new(AabbStrategy),
            Self::BoundingRadius => Rc::new(BoundingRadiusStrategy),
            Self::RdcAabb => Rc::new(RdcAabbStrategy { min_cluster }),
            Self::RdcRadius => Rc::new(RdcRadiusStrategy { min_cluster }),
        }
    }

    /// Build the default strategy described by a collision config
    pub fn from_config(config: &CollisionConfig) -> Rc<dyn CollisionStrategy> {
        config.default_strategy.build(config.rdc_min_cluster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::tests::Block;

    #[test]
    fn test_missing_group_yields_no_candidates() {
        let mut world = World::new();
        let id = world.spawn(Block::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        let mut groups = GroupRegistry::new();
        groups.register("player", Group::from_ids([id]));

        let pairs = AabbStrategy.check_broad("player", "walls", Pairing::Cross, &groups, &world);
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_stale_ids_are_skipped() {
        let mut world = World::new();
        let a = world.spawn(Block::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        let b = world.spawn(Block::new(5.0, 5.0, 10.0, 10.0)).unwrap();
        let c = world.spawn(Block::new(6.0, 6.0, 10.0, 10.0)).unwrap();
        world.despawn(b);

        let group = Group::from_ids([a, b, c]);
        let collected: Vec<_> = bodies(&group, &world).iter().map(|body| body.id).collect();
        assert_eq!(collected, vec![a, c]);
    }

    #[test]
    fn test_malformed_geometry_after_spawn_is_skipped() {
        let mut world = World::new();
        let a = world.spawn(Block::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        let b = world.spawn(Block::new(5.0, 5.0, 10.0, 10.0)).unwrap();
        if let Some(block) = world.get_as_mut::<Block>(b) {
            block.rect.w = f32::NAN;
        }

        let mut groups = GroupRegistry::new();
        groups.register("blocks", Group::from_ids([a, b]));
        for kind in [StrategyKind::Aabb, StrategyKind::RdcAabb] {
            let strategy = kind.build(1);
            let pairs = strategy.check_broad("blocks", "blocks", Pairing::SelfCollision, &groups, &world);
            assert!(pairs.is_empty(), "{}", strategy.name());
        }
    }

    #[test]
    fn test_every_kind_finds_the_same_pairs() {
        let mut world = World::new();
        let ids: Vec<_> = [(0.0, 0.0), (5.0, 5.0), (100.0, 100.0), (104.0, 100.0)]
            .into_iter()
            .map(|(x, y)| world.spawn(Block::new(x, y, 10.0, 10.0)).unwrap())
            .collect();
        let mut groups = GroupRegistry::new();
        groups.register("blocks", Group::from_ids(ids.clone()));

        for kind in [StrategyKind::Aabb, StrategyKind::RdcAabb] {
            let pairs = kind.build(1).check_broad("blocks", "blocks", Pairing::SelfCollision, &groups, &world);
            assert_eq!(pairs.len(), 2, "{kind:?}");
            assert!(pairs.contains(&(ids[0], ids[1])));
            assert!(pairs.contains(&(ids[2], ids[3])));
        }
    }

    #[test]
    fn test_fallback_differs_between_rect_and_radius() {
        assert_eq!(AabbStrategy.fallback(), ResponseFallback::FirstResponder);
        assert_eq!(RdcAabbStrategy::default().fallback(), ResponseFallback::FirstResponder);
        assert_eq!(BoundingRadiusStrategy.fallback(), ResponseFallback::BothRespond);
        assert_eq!(RdcRadiusStrategy::default().fallback(), ResponseFallback::BothRespond);
    }
}
