//! Entity contract
//!
//! The collision core only needs a small amount of information from game
//! objects: a bounding rect, a layer for ordering, a position and optionally
//! a bounding radius. Everything else about an entity belongs to the game.

use std::any::{Any, TypeId};

use crate::foundation::math::{Rect, Vec2};

slotmap::new_key_type! {
    /// Identity of an entity stored in a [`World`](super::World).
    ///
    /// Two ids compare equal only if they refer to the same entity; a
    /// despawned entity's id is never handed out again.
    pub struct EntityId;
}

/// Minimal contract a game object has to fulfil to take part in collision
/// detection and spatial queries.
///
/// Implementors write the two `as_any` accessors so that narrow-phase
/// callbacks can be handed concrete types:
///
/// ```
/// use std::any::Any;
/// use heist_engine::foundation::math::Rect;
/// use heist_engine::world::Entity;
///
/// struct Crate { rect: Rect }
///
/// impl Entity for Crate {
///     fn rect(&self) -> Rect { self.rect }
///     fn as_any(&self) -> &dyn Any { self }
///     fn as_any_mut(&mut self) -> &mut dyn Any { self }
/// }
/// ```
pub trait Entity: Any {
    /// Bounding box in world coordinates
    fn rect(&self) -> Rect;

    /// Ordering key; higher layers are drawn and picked later
    fn layer(&self) -> i32 {
        0
    }

    /// World position. Defaults to the center of [`Entity::rect`].
    fn position(&self) -> Vec2 {
        self.rect().center()
    }

    /// Radius used by the bounding-radius strategies.
    /// Defaults to half the diagonal of the rect.
    fn bounding_radius(&self) -> f32 {
        let rect = self.rect();
        0.5 * (rect.w * rect.w + rect.h * rect.h).sqrt()
    }

    /// Generic collision response used when no narrow-phase function is
    /// registered for a pair of entity types.
    ///
    /// Returns `true` if the collision was handled.
    fn collision_response(&mut self, _other: &dyn Entity) -> bool {
        false
    }

    /// Hit test for picking. May cover more or less than [`Entity::rect`].
    fn hit(&self, point: Vec2) -> bool {
        self.rect().contains_point(point)
    }

    /// Downcast to Any for type-specific access
    fn as_any(&self) -> &dyn Any;

    /// Downcast to Any for mutable type-specific access
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Runtime concrete type of an entity, recorded when it is spawned
#[derive(Debug, Clone, Copy)]
pub struct EntityType {
    /// Type identity
    pub id: TypeId,
    /// Type name, for diagnostics only
    pub name: &'static str,
}

impl EntityType {
    /// Type of `E`
    pub fn of<E: Entity>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: std::any::type_name::<E>(),
        }
    }
}

impl PartialEq for EntityType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EntityType {}

impl std::hash::Hash for EntityType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
