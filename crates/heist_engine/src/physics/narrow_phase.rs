//! Narrow-phase dispatch
//!
//! Candidate pairs are resolved by looking up the concrete types of both
//! entities in a [`NarrowTable`]. A registered function receives the world
//! and both ids; unregistered type pairs fall back to each entity's
//! [`Entity::collision_response`].

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::AddAssign;

use super::broad_phase::CandidatePair;
use crate::world::{Entity, EntityId, EntityType, World};

/// Ordered pair of concrete entity types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypePair {
    /// Type of the first entity in a candidate pair
    pub first: EntityType,
    /// Type of the second entity in a candidate pair
    pub second: EntityType,
}

impl TypePair {
    /// Pair from two runtime types
    pub fn new(first: EntityType, second: EntityType) -> Self {
        Self { first, second }
    }

    /// Pair of `A` and `B`
    pub fn of<A: Entity, B: Entity>() -> Self {
        Self::new(EntityType::of::<A>(), EntityType::of::<B>())
    }
}

impl fmt::Display for TypePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.first.name, self.second.name)
    }
}

/// Narrow-phase function: world plus the two entity ids of a candidate pair
pub type NarrowFn = Box<dyn FnMut(&mut World, EntityId, EntityId)>;

/// Adapt a function over concrete entity types into a [`NarrowFn`].
///
/// The function is skipped if either entity is missing, is not of the
/// expected type, or both ids name the same entity.
pub fn typed<A, B, F>(mut f: F) -> NarrowFn
where
    A: Entity,
    B: Entity,
    F: FnMut(&mut A, &mut B) + 'static,
{
    Box::new(move |world: &mut World, a: EntityId, b: EntityId| match world.pair_as_mut::<A, B>(a, b) {
        Some((a, b)) => f(a, b),
        None => log::debug!(
            "Narrow function for {} skipped: pair {:?}/{:?} not available",
            TypePair::of::<A, B>(),
            a,
            b
        ),
    })
}

/// Type pair to narrow function table
#[derive(Default)]
pub struct NarrowTable {
    funcs: HashMap<TypePair, NarrowFn>,
    /// Type pairs that already reported a fallback
    warned: HashSet<TypePair>,
}

impl NarrowTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function, replacing any previous one for the same pair.
    /// Returns true if a function was replaced.
    pub fn register(&mut self, pair: TypePair, func: NarrowFn) -> bool {
        self.warned.remove(&pair);
        self.funcs.insert(pair, func).is_some()
    }

    /// Remove the function for a type pair
    pub fn remove(&mut self, pair: &TypePair) -> bool {
        self.funcs.remove(pair).is_some()
    }

    /// Check if a function is registered for a type pair
    pub fn contains(&self, pair: &TypePair) -> bool {
        self.funcs.contains_key(pair)
    }

    /// Number of registered functions
    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    /// Check if no functions are registered
    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }

    /// Remove all functions
    pub fn clear(&mut self) {
        self.funcs.clear();
        self.warned.clear();
    }

    fn note_fallback(&mut self, pair: TypePair) {
        if self.warned.insert(pair) {
            log::warn!("No narrow function registered for {pair}, using collision_response fallback");
        } else {
            log::trace!("Fallback dispatch for {pair}");
        }
    }
}

impl fmt::Debug for NarrowTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NarrowTable")
            .field("pairs", &self.funcs.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// How unregistered type pairs are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFallback {
    /// `a` responds first; `b` responds only if `a` did not handle it
    FirstResponder,
    /// Both entities respond, `a` first
    BothRespond,
}

impl ResponseFallback {
    /// Run the fallback on a pair. Returns true if any response handled it.
    pub fn respond(self, world: &mut World, a: EntityId, b: EntityId) -> bool {
        let Some((first, second)) = world.pair_mut(a, b) else {
            return false;
        };
        match self {
            Self::FirstResponder => first.collision_response(&*second) || second.collision_response(&*first),
            Self::BothRespond => {
                let handled_a = first.collision_response(&*second);
                let handled_b = second.collision_response(&*first);
                handled_a || handled_b
            }
        }
    }
}

/// Counters from one narrow pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Pairs handed to a registered function
    pub dispatched: usize,
    /// Pairs resolved by the fallback
    pub fallbacks: usize,
    /// Pairs dropped because an entity was gone or the pair named one
    /// entity twice
    pub skipped: usize,
}

impl DispatchStats {
    /// Total pairs seen
    pub fn total(&self) -> usize {
        self.dispatched + self.fallbacks + self.skipped
    }
}

impl AddAssign for DispatchStats {
    fn add_assign(&mut self, rhs: Self) {
        self.dispatched += rhs.dispatched;
        self.fallbacks += rhs.fallbacks;
        self.skipped += rhs.skipped;
    }
}

/// Resolve candidate pairs in order.
///
/// Types are looked up per pair, so an entity despawned by an earlier
/// function in the same pass is skipped.
pub fn dispatch(
    pairs: &[CandidatePair],
    table: &mut NarrowTable,
    world: &mut World,
    fallback: ResponseFallback,
) -> DispatchStats {
    let mut stats = DispatchStats::default();

    for &(a, b) in pairs {
        let (Some(type_a), Some(type_b)) = (world.entity_type(a), world.entity_type(b)) else {
            log::debug!("Skipping pair {a:?}/{b:?}: entity no longer exists");
            stats.skipped += 1;
            continue;
        };

        let key = TypePair::new(type_a, type_b);
        if let Some(func) = table.funcs.get_mut(&key) {
            func(world, a, b);
            stats.dispatched += 1;
            continue;
        }

        if a == b {
            stats.skipped += 1;
            continue;
        }
        table.note_fallback(key);
        fallback.respond(world, a, b);
        stats.fallbacks += 1;
    }

    stats
}
