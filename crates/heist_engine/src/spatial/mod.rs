//! Spatial partitioning data structures
//!
//! Provides the region-query indexes behind
//! [`World::get_entities_in_region`](crate::world::World::get_entities_in_region).

mod quadtree;
mod spatial_query;

pub use quadtree::{QuadtreeConfig, QuadtreeEntry, QuadtreeIndex, QuadtreeNode};
pub use spatial_query::{LinearIndex, SpatialIndex};

use serde::{Deserialize, Serialize};

/// Spatial index selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpatialIndexKind {
    /// Scan every entity on each query
    #[default]
    Linear,
    /// Quadtree over the configured bounds
    Quadtree,
}

impl SpatialIndexKind {
    /// Build an empty index of this kind
    pub fn build(self, quadtree: &QuadtreeConfig) -> Box<dyn SpatialIndex> {
        match self {
            Self::Linear => Box::new(LinearIndex::new()),
            Self::Quadtree => Box::new(QuadtreeIndex::new(quadtree.clone())),
        }
    }
}
