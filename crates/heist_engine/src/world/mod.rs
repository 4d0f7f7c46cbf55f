//! World: entity storage and spatial queries
//!
//! The world owns every entity and answers "what is in this region?". That
//! query backs mouse picking, guard perception and the action menu, so it is
//! routed through a pluggable [`SpatialIndex`] which can be swapped without
//! touching call sites.
//!
//! Entities only change through `&mut World` accessors, which lets the world
//! rebuild its index lazily: any mutable borrow, spawn or despawn marks the
//! index dirty and the next query rebuilds it.

mod entity;

pub use entity::{Entity, EntityId, EntityType};

use std::cell::{Cell, RefCell};
use std::cmp::Reverse;

use slotmap::SlotMap;
use thiserror::Error;

use crate::core::config::WorldConfig;
use crate::foundation::math::{GeometryError, Rect, Vec2};
use crate::spatial::{LinearIndex, SpatialIndex};

/// World errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorldError {
    /// An entity or query rect has malformed geometry
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(#[from] GeometryError),

    /// The entity does not exist (never spawned or already despawned)
    #[error("Unknown entity: {0:?}")]
    UnknownEntity(EntityId),
}

struct EntitySlot {
    entity: Box<dyn Entity>,
    ty: EntityType,
    spawn_order: u64,
}

/// Container for all entities of a level
pub struct World {
    entities: SlotMap<EntityId, EntitySlot>,
    next_spawn_order: u64,
    index: RefCell<Box<dyn SpatialIndex>>,
    index_dirty: Cell<bool>,
}

impl World {
    /// Create a world backed by a linear-scan index
    pub fn new() -> Self {
        Self::with_index(Box::new(LinearIndex::new()))
    }

    /// Create a world using the index selected in the configuration
    pub fn from_config(config: &WorldConfig) -> Self {
        Self::with_index(config.spatial_index.build(&config.quadtree))
    }

    /// Create a world with a custom spatial index
    pub fn with_index(index: Box<dyn SpatialIndex>) -> Self {
        Self {
            entities: SlotMap::with_key(),
            next_spawn_order: 0,
            index: RefCell::new(index),
            index_dirty: Cell::new(true),
        }
    }

    /// Add an entity to the world.
    ///
    /// Fails if the entity's rect has NaN/infinite coordinates or a negative
    /// size.
    pub fn spawn<E: Entity>(&mut self, entity: E) -> Result<EntityId, WorldError> {
        entity.rect().validate()?;

        let spawn_order = self.next_spawn_order;
        self.next_spawn_order += 1;
        self.index_dirty.set(true);

        let id = self.entities.insert(EntitySlot {
            entity: Box::new(entity),
            ty: EntityType::of::<E>(),
            spawn_order,
        });
        log::trace!("Spawned {} as {:?}", std::any::type_name::<E>(), id);
        Ok(id)
    }

    /// Remove an entity from the world, handing it back to the caller.
    ///
    /// Groups that still list the id simply skip it from now on.
    pub fn despawn(&mut self, id: EntityId) -> Option<Box<dyn Entity>> {
        let slot = self.entities.remove(id)?;
        self.index_dirty.set(true);
        log::trace!("Despawned {} {:?}", slot.ty.name, id);
        Some(slot.entity)
    }

    /// Check if an entity exists
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Number of entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if the world has no entities
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Ids of all entities, in storage order
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys()
    }

    /// Iterate over all entities
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &dyn Entity)> + '_ {
        self.entities.iter().map(|(id, slot)| (id, slot.entity.as_ref()))
    }

    /// Get an entity
    pub fn get(&self, id: EntityId) -> Option<&dyn Entity> {
        self.entities.get(id).map(|slot| slot.entity.as_ref())
    }

    /// Get an entity mutably
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut dyn Entity> {
        let slot = self.entities.get_mut(id)?;
        self.index_dirty.set(true);
        Some(slot.entity.as_mut())
    }

    /// Get an entity as its concrete type
    pub fn get_as<E: Entity>(&self, id: EntityId) -> Option<&E> {
        self.entities.get(id)?.entity.as_any().downcast_ref::<E>()
    }

    /// Get an entity mutably as its concrete type
    pub fn get_as_mut<E: Entity>(&mut self, id: EntityId) -> Option<&mut E> {
        let slot = self.entities.get_mut(id)?;
        self.index_dirty.set(true);
        slot.entity.as_any_mut().downcast_mut::<E>()
    }

    /// Borrow two distinct entities mutably at the same time.
    ///
    /// Returns `None` if either id is unknown or both ids are the same.
    pub fn pair_mut(&mut self, a: EntityId, b: EntityId) -> Option<(&mut dyn Entity, &mut dyn Entity)> {
        let [first, second] = self.entities.get_disjoint_mut([a, b])?;
        self.index_dirty.set(true);
        let first: &mut dyn Entity = first.entity.as_mut();
        let second: &mut dyn Entity = second.entity.as_mut();
        Some((first, second))
    }

    /// Borrow two distinct entities mutably as their concrete types
    pub fn pair_as_mut<A: Entity, B: Entity>(&mut self, a: EntityId, b: EntityId) -> Option<(&mut A, &mut B)> {
        let (first, second) = self.pair_mut(a, b)?;
        let first = first.as_any_mut().downcast_mut::<A>()?;
        let second = second.as_any_mut().downcast_mut::<B>()?;
        Some((first, second))
    }

    /// Runtime type of an entity
    pub fn entity_type(&self, id: EntityId) -> Option<EntityType> {
        self.entities.get(id).map(|slot| slot.ty)
    }

    /// Entities whose rects overlap `region`, ordered by ascending layer
    /// (ties in spawn order).
    ///
    /// Rects sharing only an edge with the region are not included.
    pub fn get_entities_in_region(&self, region: &Rect) -> Result<Vec<EntityId>, WorldError> {
        region.validate()?;
        self.refresh_index();

        let mut hits = Vec::new();
        self.index.borrow().query_rect(region, &mut hits);
        hits.retain(|&id| self.entities.contains_key(id));
        hits.sort_by_key(|&id| {
            let slot = &self.entities[id];
            (slot.entity.layer(), slot.spawn_order)
        });
        Ok(hits)
    }

    /// Entities within `margin` of another entity's rect, excluding the
    /// entity itself. Ordered like [`World::get_entities_in_region`].
    pub fn get_entities_around(&self, id: EntityId, margin: f32) -> Result<Vec<EntityId>, WorldError> {
        let center = self.get(id).ok_or(WorldError::UnknownEntity(id))?.rect();
        let region = center.inflate(2.0 * margin, 2.0 * margin);
        let mut hits = self.get_entities_in_region(&region)?;
        hits.retain(|&other| other != id);
        Ok(hits)
    }

    /// Entities hit by a point, top-most (highest layer) first.
    ///
    /// Every entity is asked through [`Entity::hit`], so hit areas may
    /// extend past an entity's rect.
    pub fn get_entities_at_point(&self, point: Vec2) -> Vec<EntityId> {
        if !(point.x.is_finite() && point.y.is_finite()) {
            return Vec::new();
        }

        let mut hits: Vec<EntityId> = self
            .entities
            .iter()
            .filter(|(_, slot)| slot.entity.hit(point))
            .map(|(id, _)| id)
            .collect();
        hits.sort_by_key(|&id| {
            let slot = &self.entities[id];
            (Reverse(slot.entity.layer()), Reverse(slot.spawn_order))
        });
        hits
    }

    /// Force the spatial index to be rebuilt on the next query
    pub fn mark_dirty(&self) {
        self.index_dirty.set(true);
    }

    fn refresh_index(&self) {
        if !self.index_dirty.get() {
            return;
        }

        let entries: Vec<(EntityId, Rect)> = self
            .entities
            .iter()
            .filter_map(|(id, slot)| {
                let rect = slot.entity.rect();
                match rect.validate() {
                    Ok(()) => Some((id, rect)),
                    Err(err) => {
                        log::warn!("Excluding {} {:?} from spatial index: {}", slot.ty.name, id, err);
                        None
                    }
                }
            })
            .collect();

        let mut index = self.index.borrow_mut();
        index.rebuild(&entries);
        log::trace!("Rebuilt {} index with {} entities", index.name(), entries.len());
        self.index_dirty.set(false);
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.entities.len())
            .field("index", &self.index.borrow().name())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::spatial::{QuadtreeConfig, QuadtreeIndex};
    use std::any::Any;

    /// Plain rect entity used across the crate's tests
    #[derive(Debug, Clone)]
    pub(crate) struct Block {
        pub rect: Rect,
        pub layer: i32,
        pub hits: u32,
    }

    impl Block {
        pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
            Self { rect: Rect::new(x, y, w, h), layer: 0, hits: 0 }
        }

        pub fn on_layer(mut self, layer: i32) -> Self {
            self.layer = layer;
            self
        }
    }

    impl Entity for Block {
        fn rect(&self) -> Rect {
            self.rect
        }

        fn layer(&self) -> i32 {
            self.layer
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn scenario(world: &mut World) -> (EntityId, EntityId, EntityId) {
        let a = world.spawn(Block::new(0.0, 0.0, 10.0, 10.0).on_layer(2)).unwrap();
        let b = world.spawn(Block::new(5.0, 5.0, 10.0, 10.0).on_layer(1)).unwrap();
        let c = world.spawn(Block::new(100.0, 100.0, 10.0, 10.0)).unwrap();
        (a, b, c)
    }

    #[test]
    fn test_region_query_orders_by_layer() {
        let mut world = World::new();
        let (a, b, _c) = scenario(&mut world);

        let hits = world.get_entities_in_region(&Rect::new(0.0, 0.0, 50.0, 50.0)).unwrap();
        assert_eq!(hits, vec![b, a]);
    }

    #[test]
    fn test_region_query_disjoint_is_empty() {
        let mut world = World::new();
        scenario(&mut world);

        let hits = world.get_entities_in_region(&Rect::new(500.0, 500.0, 5.0, 5.0)).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_region_query_excludes_touching_edges() {
        let mut world = World::new();
        let (_, _, c) = scenario(&mut world);

        let touching = world.get_entities_in_region(&Rect::new(110.0, 100.0, 10.0, 10.0)).unwrap();
        assert!(touching.is_empty());
        let inside = world.get_entities_in_region(&Rect::new(109.0, 100.0, 10.0, 10.0)).unwrap();
        assert_eq!(inside, vec![c]);
    }

    #[test]
    fn test_region_query_rejects_malformed_rect() {
        let world = World::new();
        let result = world.get_entities_in_region(&Rect::new(0.0, 0.0, -5.0, 5.0));
        assert!(matches!(result, Err(WorldError::InvalidGeometry(_))));
    }

    #[test]
    fn test_spawn_rejects_nan_geometry() {
        let mut world = World::new();
        let result = world.spawn(Block::new(f32::NAN, 0.0, 1.0, 1.0));
        assert!(matches!(result, Err(WorldError::InvalidGeometry(GeometryError::NonFinite { .. }))));
        assert!(world.is_empty());
    }

    #[test]
    fn test_region_query_sees_mutation() {
        let mut world = World::new();
        let (_, _, c) = scenario(&mut world);
        let region = Rect::new(0.0, 0.0, 50.0, 50.0);
        assert_eq!(world.get_entities_in_region(&region).unwrap().len(), 2);

        world.get_as_mut::<Block>(c).unwrap().rect = Rect::new(20.0, 20.0, 5.0, 5.0);
        assert!(world.get_entities_in_region(&region).unwrap().contains(&c));
    }

    #[test]
    fn test_quadtree_world_matches_linear_world() {
        let config = QuadtreeConfig {
            bounds: Rect::new(0.0, 0.0, 256.0, 256.0),
            max_entities_per_node: 2,
            max_depth: 6,
            min_node_size: 4.0,
        };
        let mut linear = World::new();
        let mut tree = World::with_index(Box::new(QuadtreeIndex::new(config)));

        for i in 0..40 {
            let x = (i * 37 % 250) as f32;
            let y = (i * 53 % 250) as f32;
            let block = Block::new(x, y, 6.0 + (i % 5) as f32, 4.0).on_layer(i % 3);
            linear.spawn(block.clone()).unwrap();
            tree.spawn(block).unwrap();
        }

        let region = Rect::new(30.0, 40.0, 90.0, 70.0);
        let linear_hits = linear.get_entities_in_region(&region).unwrap().len();
        let tree_hits = tree.get_entities_in_region(&region).unwrap().len();
        assert!(linear_hits > 0);
        assert_eq!(linear_hits, tree_hits);
    }

    #[test]
    fn test_point_query_returns_top_most_first() {
        let mut world = World::new();
        let (a, b, _) = scenario(&mut world);

        assert_eq!(world.get_entities_at_point(Vec2::new(7.0, 7.0)), vec![a, b]);
        assert_eq!(world.get_entities_at_point(Vec2::new(1.0, 1.0)), vec![a]);
        assert!(world.get_entities_at_point(Vec2::new(50.0, 50.0)).is_empty());
    }

    /// Button whose hit area is padded around its rect
    #[derive(Debug)]
    struct Button {
        rect: Rect,
        padding: f32,
    }

    impl Entity for Button {
        fn rect(&self) -> Rect {
            self.rect
        }

        fn layer(&self) -> i32 {
            5
        }

        fn hit(&self, point: Vec2) -> bool {
            self.rect.inflate(2.0 * self.padding, 2.0 * self.padding).contains_point(point)
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_point_query_honours_hit_areas_outside_rect() {
        let mut world = World::new();
        let (a, _, _) = scenario(&mut world);
        let button = world
            .spawn(Button {
                rect: Rect::new(40.0, 0.0, 10.0, 10.0),
                padding: 8.0,
            })
            .unwrap();

        // 5 units left of the button's rect, inside its padding
        assert_eq!(world.get_entities_at_point(Vec2::new(35.0, 5.0)), vec![button]);
        assert!(world.get_entities_at_point(Vec2::new(20.0, 5.0)).is_empty());

        world.get_as_mut::<Button>(button).unwrap().padding = 40.0;
        assert_eq!(world.get_entities_at_point(Vec2::new(2.0, 2.0)), vec![button, a]);
    }

    #[test]
    fn test_entities_around_excludes_self() {
        let mut world = World::new();
        let (a, b, c) = scenario(&mut world);

        assert_eq!(world.get_entities_around(a, 1.0).unwrap(), vec![b]);
        world.despawn(c);
        assert_eq!(world.get_entities_around(c, 1.0), Err(WorldError::UnknownEntity(c)));
    }

    #[test]
    fn test_pair_mut_requires_distinct_ids() {
        let mut world = World::new();
        let (a, b, _) = scenario(&mut world);

        assert!(world.pair_mut(a, a).is_none());
        let (first, second) = world.pair_as_mut::<Block, Block>(a, b).unwrap();
        first.hits += 1;
        second.hits += 2;
        assert_eq!(world.get_as::<Block>(b).unwrap().hits, 2);
    }

    #[test]
    fn test_despawn_removes_from_queries() {
        let mut world = World::new();
        let (a, b, _) = scenario(&mut world);
        assert!(world.despawn(a).is_some());
        assert!(world.despawn(a).is_none());

        let hits = world.get_entities_in_region(&Rect::new(0.0, 0.0, 50.0, 50.0)).unwrap();
        assert_eq!(hits, vec![b]);
        assert_eq!(world.entity_type(b), Some(EntityType::of::<Block>()));
    }
}
