//! Abstract spatial query interface for region queries
//!
//! The world answers every "what is in this rect?" question through this
//! trait, so a linear scan can be swapped for a tree or grid without touching
//! call sites.

use crate::foundation::math::Rect;
use crate::world::EntityId;

/// Spatial index over entity rects
///
/// Implementations are rebuilt in bulk from a snapshot of the world and must
/// return exactly the entries whose rects overlap the query (edge contact is
/// not overlap), in any order.
pub trait SpatialIndex {
    /// Replace the index contents with `entries`
    fn rebuild(&mut self, entries: &[(EntityId, Rect)]);

    /// Append every entry overlapping `region` to `out`
    fn query_rect(&self, region: &Rect, out: &mut Vec<EntityId>);

    /// Number of indexed entries
    fn len(&self) -> usize;

    /// Check if the index is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all entries
    fn clear(&mut self);

    /// Short name for diagnostics
    fn name(&self) -> &'static str;
}

/// One-sided brute force: every query tests the region against every entry
#[derive(Debug, Clone, Default)]
pub struct LinearIndex {
    entries: Vec<(EntityId, Rect)>,
}

impl LinearIndex {
    /// Create an empty linear index
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpatialIndex for LinearIndex {
    fn rebuild(&mut self, entries: &[(EntityId, Rect)]) {
        self.entries.clear();
        self.entries.extend_from_slice(entries);
    }

    fn query_rect(&self, region: &Rect, out: &mut Vec<EntityId>) {
        out.extend(
            self.entries
                .iter()
                .filter(|(_, rect)| region.intersects(rect))
                .map(|&(id, _)| id),
        );
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn name(&self) -> &'static str {
        "linear"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn test_linear_index_rebuild_and_query() {
        let mut keys: SlotMap<EntityId, ()> = SlotMap::with_key();
        let a = keys.insert(());
        let b = keys.insert(());

        let mut index = LinearIndex::new();
        index.rebuild(&[(a, Rect::new(0.0, 0.0, 10.0, 10.0)), (b, Rect::new(20.0, 0.0, 10.0, 10.0))]);
        assert_eq!(index.len(), 2);

        let mut hits = Vec::new();
        index.query_rect(&Rect::new(5.0, 5.0, 2.0, 2.0), &mut hits);
        assert_eq!(hits, vec![a]);

        index.clear();
        assert!(index.is_empty());
    }
}
