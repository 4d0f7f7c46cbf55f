//! Collision detector
//!
//! Two-phase collision detection over named groups:
//!
//! 1. **Broad phase**: every pair registration asks its strategy for
//!    candidate pairs between two groups.
//! 2. **Narrow phase**: each candidate pair is resolved by the function
//!    registered for the concrete types of its entities, or by the strategy's
//!    fallback.
//!
//! Registrations are processed in the order they were made. The detector
//! only holds group handles; game code keeps adding and removing entities
//! from its groups and the next [`CollisionDetector::check`] sees the change.

use std::fmt;
use std::rc::Rc;

use super::broad_phase::{CandidatePair, Pairing};
use super::group::{Group, GroupRegistry};
use super::narrow_phase::{typed, DispatchStats, NarrowFn, NarrowTable, TypePair};
use super::strategy::{CollisionStrategy, StrategyKind};
use crate::core::config::CollisionConfig;
use crate::world::{Entity, World};

/// One group pair to test and the strategy to test it with
#[derive(Clone)]
pub struct PairRegistration {
    /// First group name; its members come first in candidate pairs
    pub name1: String,
    /// Second group name
    pub name2: String,
    /// Self-collision or cross-group pairing
    pub pairing: Pairing,
    /// Strategy used for both phases
    pub strategy: Rc<dyn CollisionStrategy>,
}

impl fmt::Debug for PairRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PairRegistration")
            .field("name1", &self.name1)
            .field("name2", &self.name2)
            .field("pairing", &self.pairing)
            .field("strategy", &self.strategy.name())
            .finish()
    }
}

/// Candidate pairs of one registration, tagged with the strategy that
/// produced them
#[derive(Clone)]
pub struct BroadResult {
    /// Strategy whose narrow phase resolves `pairs`
    pub strategy: Rc<dyn CollisionStrategy>,
    /// Candidate pairs, in the order the strategy produced them
    pub pairs: Vec<CandidatePair>,
}

impl fmt::Debug for BroadResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BroadResult")
            .field("strategy", &self.strategy.name())
            .field("pairs", &self.pairs)
            .finish()
    }
}

/// Group registry, pair registrations and narrow functions driving one
/// collision pass per [`check`](Self::check)
pub struct CollisionDetector {
    groups: GroupRegistry,
    pairs: Vec<PairRegistration>,
    narrow: NarrowTable,
    default_strategy: Rc<dyn CollisionStrategy>,
}

impl CollisionDetector {
    /// Create a detector whose default strategy is brute-force rect overlap
    pub fn new() -> Self {
        Self::with_default_strategy(StrategyKind::Aabb.build(CollisionConfig::DEFAULT_RDC_MIN_CLUSTER))
    }

    /// Create a detector using the configured default strategy
    pub fn from_config(config: &CollisionConfig) -> Self {
        Self::with_default_strategy(StrategyKind::from_config(config))
    }

    /// Create a detector with an explicit default strategy
    pub fn with_default_strategy(strategy: Rc<dyn CollisionStrategy>) -> Self {
        Self {
            groups: GroupRegistry::new(),
            pairs: Vec::new(),
            narrow: NarrowTable::new(),
            default_strategy: strategy,
        }
    }

    /// Strategy handed out by [`default_strategy`](Self::default_strategy)
    pub fn default_strategy(&self) -> Rc<dyn CollisionStrategy> {
        Rc::clone(&self.default_strategy)
    }

    // Groups

    /// Register a group handle under a name, replacing any previous one
    pub fn register_group(&mut self, name: impl Into<String>, group: Group) {
        let name = name.into();
        if self.groups.register(name.clone(), group).is_some() {
            log::debug!("Group '{name}' replaced");
        }
    }

    /// Forget a group. Pair registrations naming it yield no candidates
    /// until a group with that name is registered again.
    pub fn remove_group(&mut self, name: &str) -> Option<Group> {
        self.groups.remove(name)
    }

    /// Look up a group by name
    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    /// All registered groups
    pub fn groups(&self) -> &GroupRegistry {
        &self.groups
    }

    // Pair registrations

    /// Test `name1` against `name2` with `strategy`. Registering a name
    /// against itself selects self-collision pairing.
    pub fn register_pair(&mut self, name1: impl Into<String>, name2: impl Into<String>, strategy: Rc<dyn CollisionStrategy>) {
        let (name1, name2) = (name1.into(), name2.into());
        let pairing = Pairing::for_names(&name1, &name2);
        self.register_pair_with(name1, name2, pairing, strategy);
    }

    /// Test `name1` against `name2` with an explicit pairing
    pub fn register_pair_with(
        &mut self,
        name1: impl Into<String>,
        name2: impl Into<String>,
        pairing: Pairing,
        strategy: Rc<dyn CollisionStrategy>,
    ) {
        let registration = PairRegistration {
            name1: name1.into(),
            name2: name2.into(),
            pairing,
            strategy,
        };
        log::debug!(
            "Registered pair '{}' x '{}' ({:?}, {})",
            registration.name1,
            registration.name2,
            registration.pairing,
            registration.strategy.name()
        );
        self.pairs.push(registration);
    }

    /// Remove one pair registration.
    ///
    /// With a strategy, removes the first registration of the name pair
    /// using that exact strategy instance; without, removes the first
    /// registration of the name pair. Returns false if nothing matched.
    pub fn remove_pair(&mut self, name1: &str, name2: &str, strategy: Option<&Rc<dyn CollisionStrategy>>) -> bool {
        let position = self.pairs.iter().position(|registration| {
            registration.name1 == name1
                && registration.name2 == name2
                && strategy.map_or(true, |strategy| Rc::ptr_eq(strategy, &registration.strategy))
        });
        match position {
            Some(index) => {
                self.pairs.remove(index);
                true
            }
            None => false,
        }
    }

    /// Registered pairs, in processing order
    pub fn pairs(&self) -> &[PairRegistration] {
        &self.pairs
    }

    /// Number of pair registrations
    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    // Narrow functions

    /// Register the function resolving a type pair, replacing any previous
    /// one
    pub fn register_narrow_func(&mut self, pair: TypePair, func: NarrowFn) {
        if self.narrow.register(pair, func) {
            log::debug!("Narrow function for {pair} replaced");
        }
    }

    /// Register a function over concrete entity types
    pub fn on_collision<A, B, F>(&mut self, f: F)
    where
        A: Entity,
        B: Entity,
        F: FnMut(&mut A, &mut B) + 'static,
    {
        self.register_narrow_func(TypePair::of::<A, B>(), typed(f));
    }

    /// Remove the function for a type pair
    pub fn remove_narrow_func(&mut self, pair: &TypePair) -> bool {
        self.narrow.remove(pair)
    }

    /// Narrow function table
    pub fn narrow_table(&self) -> &NarrowTable {
        &self.narrow
    }

    /// Register two groups, the pair between them and the function for one
    /// type pair in a single call
    #[allow(clippy::too_many_arguments)]
    pub fn register_once(
        &mut self,
        name1: impl Into<String>,
        name2: impl Into<String>,
        group1: Group,
        group2: Group,
        strategy: Rc<dyn CollisionStrategy>,
        type_pair: TypePair,
        func: NarrowFn,
    ) {
        let (name1, name2) = (name1.into(), name2.into());
        self.register_group(name1.clone(), group1);
        self.register_group(name2.clone(), group2);
        self.register_pair(name1, name2, strategy);
        self.register_narrow_func(type_pair, func);
    }

    // Checking

    /// Candidate pairs for every registration, in registration order
    pub fn check_broad(&self, world: &World) -> Vec<BroadResult> {
        self.pairs
            .iter()
            .map(|registration| BroadResult {
                strategy: Rc::clone(&registration.strategy),
                pairs: registration.strategy.check_broad(
                    &registration.name1,
                    &registration.name2,
                    registration.pairing,
                    &self.groups,
                    world,
                ),
            })
            .collect()
    }

    /// Resolve broad-phase results with each result's own strategy
    pub fn check_narrow(&mut self, world: &mut World, broad: Vec<BroadResult>) -> DispatchStats {
        let mut stats = DispatchStats::default();
        for result in broad {
            stats += result.strategy.check_narrow(&result.pairs, &mut self.narrow, world);
        }
        stats
    }

    /// Run both phases once
    pub fn check(&mut self, world: &mut World) -> DispatchStats {
        let broad = self.check_broad(world);
        let candidates: usize = broad.iter().map(|result| result.pairs.len()).sum();
        let stats = self.check_narrow(world, broad);
        log::trace!(
            "Collision check: {} candidates, {} dispatched, {} fallbacks, {} skipped",
            candidates,
            stats.dispatched,
            stats.fallbacks,
            stats.skipped
        );
        stats
    }

    /// Remove all groups, pair registrations and narrow functions
    pub fn clear(&mut self) {
        self.groups.clear();
        self.pairs.clear();
        self.narrow.clear();
    }
}

impl Default for CollisionDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CollisionDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollisionDetector")
            .field("groups", &self.groups.len())
            .field("pairs", &self.pairs)
            .field("narrow", &self.narrow)
            .field("default_strategy", &self.default_strategy.name())
            .finish()
    }
}
