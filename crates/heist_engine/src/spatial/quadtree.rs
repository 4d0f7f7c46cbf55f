//! Quadtree spatial partitioning structure
//!
//! Divides the level into hierarchical square-ish regions. Entries are
//! bucketed by the center of their rect; each node subdivides into 4
//! quadrants when its bucket exceeds a threshold. Queries pad node bounds by
//! the largest half-extent stored so that rects reaching into neighbouring
//! nodes are still found.

use serde::{Deserialize, Serialize};

use super::spatial_query::SpatialIndex;
use crate::foundation::math::{Rect, Vec2};
use crate::world::EntityId;

/// Configuration for quadtree behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadtreeConfig {
    /// World-space bounds covered by the tree. Entries centered outside are
    /// kept in an overflow list and scanned linearly.
    pub bounds: Rect,

    /// Maximum entries per node before subdivision
    pub max_entities_per_node: usize,

    /// Maximum subdivision depth
    pub max_depth: u32,

    /// Minimum node size (prevents excessive subdivision)
    pub min_node_size: f32,
}

impl Default for QuadtreeConfig {
    fn default() -> Self {
        Self {
            bounds: Rect::new(0.0, 0.0, 4096.0, 4096.0),
            max_entities_per_node: 8,
            max_depth: 8,
            min_node_size: 16.0,
        }
    }
}

/// Entry stored in the quadtree
#[derive(Debug, Clone, Copy)]
pub struct QuadtreeEntry {
    /// Entity the rect belongs to
    pub id: EntityId,
    /// World-space rect
    pub rect: Rect,
}

/// Single node in the quadtree hierarchy
#[derive(Debug, Clone)]
pub struct QuadtreeNode {
    /// World-space bounds of this node
    pub bounds: Rect,

    /// Entries held by this node
    pub entries: Vec<QuadtreeEntry>,

    /// Child nodes (4 quadrants), None if this is a leaf
    pub children: Option<Box<[QuadtreeNode; 4]>>,

    /// Depth in the tree (0 = root)
    pub depth: u32,
}

impl QuadtreeNode {
    /// Create a new leaf node
    pub fn new(bounds: Rect, depth: u32) -> Self {
        Self {
            bounds,
            entries: Vec::new(),
            children: None,
            depth,
        }
    }

    /// Check if this node is a leaf (has no children)
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    // Quadrant layout:
    // 0: -X, -Y (top-left)
    // 1: +X, -Y (top-right)
    // 2: -X, +Y (bottom-left)
    // 3: +X, +Y (bottom-right)
    fn quadrant_index(bounds: &Rect, point: Vec2) -> usize {
        let center = bounds.center();
        let x_bit = usize::from(point.x >= center.x);
        let y_bit = usize::from(point.y >= center.y);
        (y_bit << 1) | x_bit
    }

    fn subdivide(&mut self) {
        if self.children.is_some() {
            return;
        }

        let half_w = self.bounds.w * 0.5;
        let half_h = self.bounds.h * 0.5;
        let depth = self.depth + 1;
        let quadrant = |col: f32, row: f32| {
            QuadtreeNode::new(
                Rect::new(self.bounds.x + half_w * col, self.bounds.y + half_h * row, half_w, half_h),
                depth,
            )
        };
        let children = [quadrant(0.0, 0.0), quadrant(1.0, 0.0), quadrant(0.0, 1.0), quadrant(1.0, 1.0)];

        // Redistribute existing entries; anything rounding puts outside every
        // child stays here.
        let entries = std::mem::take(&mut self.entries);
        let mut children = Box::new(children);
        for entry in entries {
            let index = Self::quadrant_index(&self.bounds, entry.rect.center());
            if children[index].bounds.contains_point(entry.rect.center()) {
                children[index].entries.push(entry);
            } else {
                self.entries.push(entry);
            }
        }
        self.children = Some(children);
    }

    /// Insert an entry into this node. Returns false if its center lies
    /// outside the node.
    pub fn insert(&mut self, entry: QuadtreeEntry, config: &QuadtreeConfig) -> bool {
        let center = entry.rect.center();
        if !self.bounds.contains_point(center) {
            return false;
        }

        if self.is_leaf() {
            let should_subdivide = self.entries.len() >= config.max_entities_per_node
                && self.depth < config.max_depth
                && self.bounds.w.min(self.bounds.h) * 0.5 >= config.min_node_size;

            if !should_subdivide {
                self.entries.push(entry);
                return true;
            }
            self.subdivide();
        }

        let index = Self::quadrant_index(&self.bounds, center);
        if let Some(children) = self.children.as_mut() {
            if children[index].insert(entry, config) {
                return true;
            }
        }
        self.entries.push(entry);
        true
    }

    /// Collect every entry overlapping `region`. `pad` is the largest
    /// half-extent of any stored rect.
    pub fn query_rect(&self, region: &Rect, pad: f32, out: &mut Vec<EntityId>) {
        if !self.bounds.inflate(2.0 * pad, 2.0 * pad).intersects(region) {
            return;
        }

        out.extend(
            self.entries
                .iter()
                .filter(|entry| entry.rect.intersects(region))
                .map(|entry| entry.id),
        );

        if let Some(children) = &self.children {
            for child in children.iter() {
                child.query_rect(region, pad, out);
            }
        }
    }

    /// Get all leaf nodes (for debug drawing)
    pub fn get_all_leaves<'a>(&'a self, leaves: &mut Vec<&'a QuadtreeNode>) {
        match &self.children {
            None => leaves.push(self),
            Some(children) => {
                for child in children.iter() {
                    child.get_all_leaves(leaves);
                }
            }
        }
    }

    /// Count total entries in this node and all children
    pub fn count_entries(&self) -> usize {
        self.entries.len()
            + self
                .children
                .as_ref()
                .map_or(0, |children| children.iter().map(QuadtreeNode::count_entries).sum())
    }
}

/// Quadtree-backed [`SpatialIndex`]
#[derive(Debug, Clone)]
pub struct QuadtreeIndex {
    /// Root node containing the configured bounds
    pub root: QuadtreeNode,

    config: QuadtreeConfig,

    /// Entries centered outside the root bounds
    overflow: Vec<QuadtreeEntry>,

    /// Largest half-extent of any entry in the tree
    max_half_extent: f32,
}

impl QuadtreeIndex {
    /// Create an empty quadtree
    pub fn new(config: QuadtreeConfig) -> Self {
        Self {
            root: QuadtreeNode::new(config.bounds, 0),
            config,
            overflow: Vec::new(),
            max_half_extent: 0.0,
        }
    }

    /// Insert a single entry
    pub fn insert(&mut self, id: EntityId, rect: Rect) {
        let entry = QuadtreeEntry { id, rect };
        if self.root.insert(entry, &self.config) {
            self.max_half_extent = self.max_half_extent.max(rect.max_half_extent());
        } else {
            self.overflow.push(entry);
        }
    }

    /// Number of entries that did not fit inside the tree bounds
    pub fn overflow_len(&self) -> usize {
        self.overflow.len()
    }

    /// Get all leaf nodes (for debug drawing)
    pub fn get_all_leaves(&self) -> Vec<&QuadtreeNode> {
        let mut leaves = Vec::new();
        self.root.get_all_leaves(&mut leaves);
        leaves
    }
}

impl SpatialIndex for QuadtreeIndex {
    fn rebuild(&mut self, entries: &[(EntityId, Rect)]) {
        self.clear();
        for &(id, rect) in entries {
            self.insert(id, rect);
        }
        if !self.overflow.is_empty() {
            log::debug!(
                "Quadtree: {} entries centered outside {:?}",
                self.overflow.len(),
                self.config.bounds
            );
        }
    }

    fn query_rect(&self, region: &Rect, out: &mut Vec<EntityId>) {
        self.root.query_rect(region, self.max_half_extent, out);
        out.extend(
            self.overflow
                .iter()
                .filter(|entry| entry.rect.intersects(region))
                .map(|entry| entry.id),
        );
    }

    fn len(&self) -> usize {
        self.root.count_entries() + self.overflow.len()
    }

    fn clear(&mut self) {
        self.root = QuadtreeNode::new(self.config.bounds, 0);
        self.overflow.clear();
        self.max_half_extent = 0.0;
    }

    fn name(&self) -> &'static str {
        "quadtree"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn keys(n: usize) -> Vec<EntityId> {
        let mut map: SlotMap<EntityId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    fn small_config() -> QuadtreeConfig {
        QuadtreeConfig {
            bounds: Rect::new(0.0, 0.0, 100.0, 100.0),
            max_entities_per_node: 4,
            max_depth: 3,
            min_node_size: 1.0,
        }
    }

    #[test]
    fn test_quadtree_subdivision() {
        let ids = keys(10);
        let mut tree = QuadtreeIndex::new(small_config());

        // Same position to force subdivision down to max depth
        for &id in &ids {
            tree.insert(id, Rect::new(10.0, 10.0, 2.0, 2.0));
        }

        assert_eq!(tree.len(), 10);
        assert!(!tree.root.is_leaf());
    }

    #[test]
    fn test_quadtree_finds_rect_reaching_into_neighbour() {
        let ids = keys(6);
        let mut tree = QuadtreeIndex::new(small_config());
        for (i, &id) in ids.iter().take(5).enumerate() {
            tree.insert(id, Rect::new(i as f32, 1.0, 1.0, 1.0));
        }
        // Centered in the top-left quadrant, reaching into the top-right one
        tree.insert(ids[5], Rect::new(5.0, 10.0, 80.0, 4.0));

        let mut hits = Vec::new();
        tree.query_rect(&Rect::new(80.0, 11.0, 2.0, 2.0), &mut hits);
        assert_eq!(hits, vec![ids[5]]);
    }

    #[test]
    fn test_quadtree_overflow_is_queried() {
        let ids = keys(1);
        let mut tree = QuadtreeIndex::new(small_config());
        tree.rebuild(&[(ids[0], Rect::new(-50.0, -50.0, 10.0, 10.0))]);

        assert_eq!(tree.overflow_len(), 1);
        let mut hits = Vec::new();
        tree.query_rect(&Rect::new(-45.0, -45.0, 1.0, 1.0), &mut hits);
        assert_eq!(hits, ids);
    }

    #[test]
    fn test_quadtree_rebuild_replaces_contents() {
        let ids = keys(3);
        let mut tree = QuadtreeIndex::new(small_config());
        tree.rebuild(&[(ids[0], Rect::new(1.0, 1.0, 1.0, 1.0)), (ids[1], Rect::new(50.0, 50.0, 1.0, 1.0))]);
        tree.rebuild(&[(ids[2], Rect::new(1.0, 1.0, 1.0, 1.0))]);

        let mut hits = Vec::new();
        tree.query_rect(&Rect::new(0.0, 0.0, 100.0, 100.0), &mut hits);
        assert_eq!(hits, vec![ids[2]]);
        assert_eq!(tree.get_all_leaves().len(), 1);
    }
}
