//! Broad-phase pair generation
//!
//! Produces candidate pairs from two lists of [`Body`] snapshots, either by
//! testing every pair (brute force) or by recursive dimensional clustering
//! (RDC): a sweep along one axis splits the set into groups whose intervals
//! do not overlap, alternating axes until clusters are small enough to brute
//! force.
//!
//! Every function here returns exactly the pairs whose bounding volumes
//! overlap. Pairs are oriented `(earlier, later)` for self-collision and
//! `(first, second)` for cross-group tests.

use std::collections::VecDeque;

use crate::foundation::math::{Axis, GeometryError, Rect, Vec2};
use crate::world::{Entity, EntityId};

/// Candidate pair produced by the broad phase
pub type CandidatePair = (EntityId, EntityId);

/// How the two sides of a pair registration relate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pairing {
    /// Test a group against itself: each unordered pair once, never an
    /// entity with itself
    SelfCollision,
    /// Test every member of the first group against every member of the
    /// second
    #[default]
    Cross,
}

impl Pairing {
    /// Pairing used when a registration does not say: self-collision iff both
    /// names are the same
    pub fn for_names(name1: &str, name2: &str) -> Self {
        if name1 == name2 {
            Self::SelfCollision
        } else {
            Self::Cross
        }
    }
}

/// Geometry of one entity, captured at the start of a broad pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    /// Entity the geometry belongs to
    pub id: EntityId,
    /// Bounding box
    pub rect: Rect,
    /// Center used by the radius tests
    pub position: Vec2,
    /// Bounding radius
    pub radius: f32,
}

impl Body {
    /// Snapshot an entity's geometry, rejecting anything malformed
    pub fn of(id: EntityId, entity: &dyn Entity) -> Result<Self, GeometryError> {
        let rect = entity.rect();
        rect.validate()?;

        let position = entity.position();
        if !(position.x.is_finite() && position.y.is_finite()) {
            return Err(GeometryError::NonFinitePosition(position.x, position.y));
        }

        let radius = entity.bounding_radius();
        if !radius.is_finite() || radius < 0.0 {
            return Err(GeometryError::InvalidRadius(radius));
        }

        Ok(Self {
            id,
            rect,
            position,
            radius,
        })
    }

    /// Body whose position and radius are derived from a rect
    pub fn from_rect(id: EntityId, rect: Rect) -> Self {
        Self {
            id,
            rect,
            position: rect.center(),
            radius: 0.5 * (rect.w * rect.w + rect.h * rect.h).sqrt(),
        }
    }
}

/// Shape tested by a strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundingVolume {
    /// Axis-aligned rect, edges touching do not overlap
    Rect,
    /// Circle of `radius` around `position`
    Radius,
}

impl BoundingVolume {
    /// Check if two bodies overlap
    pub fn overlaps(self, a: &Body, b: &Body) -> bool {
        match self {
            Self::Rect => a.rect.intersects(&b.rect),
            Self::Radius => {
                let reach = a.radius + b.radius;
                (a.position - b.position).norm_squared() < reach * reach
            }
        }
    }

    /// Near and far extent of a body along an axis
    pub fn span(self, body: &Body, axis: Axis) -> (f32, f32) {
        match self {
            Self::Rect => body.rect.span(axis),
            Self::Radius => {
                let center = axis.of(body.position);
                (center - body.radius, center + body.radius)
            }
        }
    }
}

/// Test every pair with an arbitrary overlap predicate.
///
/// With [`Pairing::SelfCollision`] only `first` is used and the upper
/// triangle is tested, so each unordered pair is reported once.
pub fn brute_force_with<F>(first: &[Body], second: &[Body], pairing: Pairing, mut overlaps: F) -> Vec<CandidatePair>
where
    F: FnMut(&Body, &Body) -> bool,
{
    let mut pairs = Vec::new();
    match pairing {
        Pairing::SelfCollision => {
            for (i, a) in first.iter().enumerate() {
                for b in &first[i + 1..] {
                    if overlaps(a, b) {
                        pairs.push((a.id, b.id));
                    }
                }
            }
        }
        Pairing::Cross => {
            for a in first {
                for b in second {
                    if overlaps(a, b) {
                        pairs.push((a.id, b.id));
                    }
                }
            }
        }
    }
    pairs
}

/// Brute force with rect overlap
pub fn brute_force_rect(first: &[Body], second: &[Body], pairing: Pairing) -> Vec<CandidatePair> {
    brute_force_with(first, second, pairing, |a, b| BoundingVolume::Rect.overlaps(a, b))
}

/// Brute force with circle overlap
pub fn brute_force_radius(first: &[Body], second: &[Body], pairing: Pairing) -> Vec<CandidatePair> {
    brute_force_with(first, second, pairing, |a, b| BoundingVolume::Radius.overlaps(a, b))
}

/// Recursive dimensional clustering with rect overlap
pub fn rdc_rect(first: &[Body], second: &[Body], pairing: Pairing, min_cluster: usize) -> Vec<CandidatePair> {
    rdc_with(BoundingVolume::Rect, first, second, pairing, min_cluster)
}

/// Recursive dimensional clustering with circle overlap
pub fn rdc_radius(first: &[Body], second: &[Body], pairing: Pairing, min_cluster: usize) -> Vec<CandidatePair> {
    rdc_with(BoundingVolume::Radius, first, second, pairing, min_cluster)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    First,
    Second,
}

// Begin sorts before End so that intervals meeting at a single coordinate
// land in the same cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Boundary {
    Begin,
    End,
}

#[derive(Debug)]
struct Cluster {
    /// Indices into the member list
    members: Vec<usize>,
    axis: Axis,
    /// The previous sweep of this set failed to split it
    stalled: bool,
}

/// Recursive dimensional clustering.
///
/// Clusters at or below `min_cluster` members are brute forced. A sweep that
/// cannot split a cluster retries once on the other axis; if that also fails
/// the cluster is brute forced, which bounds the work on fully overlapping
/// sets.
///
/// For [`Pairing::Cross`] the union of both lists is clustered and only
/// first × second pairs inside a leaf cluster are tested.
pub fn rdc_with(
    volume: BoundingVolume,
    first: &[Body],
    second: &[Body],
    pairing: Pairing,
    min_cluster: usize,
) -> Vec<CandidatePair> {
    let members: Vec<(Body, Side)> = match pairing {
        Pairing::SelfCollision => first.iter().map(|body| (*body, Side::First)).collect(),
        Pairing::Cross => {
            if first.is_empty() || second.is_empty() {
                return Vec::new();
            }
            first
                .iter()
                .map(|body| (*body, Side::First))
                .chain(second.iter().map(|body| (*body, Side::Second)))
                .collect()
        }
    };

    let mut pairs = Vec::new();
    let mut queue = VecDeque::new();
    queue.push_back(Cluster {
        members: (0..members.len()).collect(),
        axis: Axis::X,
        stalled: false,
    });

    while let Some(cluster) = queue.pop_front() {
        if pairing == Pairing::Cross && !has_both_sides(&members, &cluster.members) {
            continue;
        }

        if cluster.members.len() <= min_cluster.max(1) {
            brute_force_leaf(volume, &members, cluster.members, pairing, &mut pairs);
            continue;
        }

        let mut split = sweep(volume, &members, &cluster.members, cluster.axis);
        let next_axis = cluster.axis.other();
        if split.len() == 1 {
            if cluster.stalled {
                brute_force_leaf(volume, &members, cluster.members, pairing, &mut pairs);
            } else {
                queue.push_back(Cluster {
                    members: split.pop().unwrap_or_default(),
                    axis: next_axis,
                    stalled: true,
                });
            }
            continue;
        }

        queue.extend(split.into_iter().map(|members| Cluster {
            members,
            axis: next_axis,
            stalled: false,
        }));
    }

    pairs
}

fn has_both_sides(members: &[(Body, Side)], cluster: &[usize]) -> bool {
    let mut first = false;
    let mut second = false;
    for &index in cluster {
        match members[index].1 {
            Side::First => first = true,
            Side::Second => second = true,
        }
        if first && second {
            return true;
        }
    }
    false
}

/// Split a cluster into the connected runs of its intervals along `axis`
fn sweep(volume: BoundingVolume, members: &[(Body, Side)], cluster: &[usize], axis: Axis) -> Vec<Vec<usize>> {
    let mut bounds: Vec<(f32, Boundary, usize)> = Vec::with_capacity(cluster.len() * 2);
    for &index in cluster {
        let (near, far) = volume.span(&members[index].0, axis);
        bounds.push((near, Boundary::Begin, index));
        bounds.push((far, Boundary::End, index));
    }
    // Stable, so equal boundaries keep insertion order
    bounds.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut clusters = Vec::new();
    let mut current = Vec::new();
    let mut open = 0usize;
    for (_, boundary, index) in bounds {
        match boundary {
            Boundary::Begin => {
                open += 1;
                current.push(index);
            }
            Boundary::End => {
                open = open.saturating_sub(1);
                if open == 0 {
                    clusters.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        clusters.push(current);
    }
    clusters
}

/// Brute force one leaf cluster, in input order
fn brute_force_leaf(
    volume: BoundingVolume,
    members: &[(Body, Side)],
    mut cluster: Vec<usize>,
    pairing: Pairing,
    pairs: &mut Vec<CandidatePair>,
) {
    cluster.sort_unstable();
    match pairing {
        Pairing::SelfCollision => {
            for (i, &a) in cluster.iter().enumerate() {
                for &b in &cluster[i + 1..] {
                    let (a, b) = (&members[a].0, &members[b].0);
                    if volume.overlaps(a, b) {
                        pairs.push((a.id, b.id));
                    }
                }
            }
        }
        Pairing::Cross => {
            // First-side indices all precede second-side ones
            let split = cluster.partition_point(|&index| members[index].1 == Side::First);
            let (firsts, seconds) = cluster.split_at(split);
            for &a in firsts {
                for &b in seconds {
                    let (a, b) = (&members[a].0, &members[b].0);
                    if volume.overlaps(a, b) {
                        pairs.push((a.id, b.id));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use slotmap::SlotMap;
    use std::collections::HashSet;

    fn keys(n: usize) -> Vec<EntityId> {
        let mut map: SlotMap<EntityId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    fn bodies(rects: &[Rect]) -> Vec<Body> {
        keys(rects.len())
            .into_iter()
            .zip(rects)
            .map(|(id, rect)| Body::from_rect(id, *rect))
            .collect()
    }

    fn unordered(pairs: &[CandidatePair]) -> HashSet<(EntityId, EntityId)> {
        pairs.iter().map(|&(a, b)| if a < b { (a, b) } else { (b, a) }).collect()
    }

    fn random_bodies(rng: &mut StdRng, n: usize, extent: f32) -> Vec<Body> {
        let rects: Vec<Rect> = (0..n)
            .map(|_| {
                Rect::new(
                    rng.gen_range(0.0..extent),
                    rng.gen_range(0.0..extent),
                    rng.gen_range(1.0..40.0),
                    rng.gen_range(1.0..40.0),
                )
            })
            .collect();
        bodies(&rects)
    }

    #[test]
    fn test_three_entity_scenario() {
        let set = bodies(&[
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(5.0, 5.0, 10.0, 10.0),
            Rect::new(100.0, 100.0, 10.0, 10.0),
        ]);
        let expected = vec![(set[0].id, set[1].id)];

        assert_eq!(brute_force_rect(&set, &set, Pairing::SelfCollision), expected);
        assert_eq!(rdc_rect(&set, &set, Pairing::SelfCollision, 1), expected);
        assert_eq!(rdc_rect(&set, &set, Pairing::SelfCollision, 10), expected);
    }

    #[test]
    fn test_self_pairing_reports_each_pair_once() {
        let set = bodies(&[Rect::new(0.0, 0.0, 10.0, 10.0); 4]);

        let pairs = brute_force_rect(&set, &set, Pairing::SelfCollision);
        assert_eq!(pairs.len(), 6);
        assert_eq!(unordered(&pairs).len(), 6);
        assert!(pairs.iter().all(|(a, b)| a != b));
    }

    #[test]
    fn test_cross_pairing_orients_first_group_first() {
        let all = bodies(&[Rect::new(0.0, 0.0, 10.0, 10.0); 5]);
        let (first, second) = all.split_at(2);
        let first_ids: HashSet<_> = first.iter().map(|body| body.id).collect();

        for pairs in [
            brute_force_rect(first, second, Pairing::Cross),
            rdc_rect(first, second, Pairing::Cross, 1),
        ] {
            assert_eq!(pairs.len(), 6);
            assert!(pairs.iter().all(|(a, b)| first_ids.contains(a) && !first_ids.contains(b)));
        }
    }

    #[test]
    fn test_touching_edges_are_not_candidates() {
        let set = bodies(&[Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(10.0, 0.0, 10.0, 10.0)]);

        assert!(brute_force_rect(&set, &set, Pairing::SelfCollision).is_empty());
        assert!(rdc_rect(&set, &set, Pairing::SelfCollision, 1).is_empty());
        assert!(brute_force_rect(&set[..1], &set[1..], Pairing::Cross).is_empty());
    }

    #[test]
    fn test_radius_overlap() {
        let ids = keys(3);
        let circle = |id, x: f32, r: f32| Body {
            id,
            rect: Rect::from_center(Vec2::new(x, 0.0), 2.0 * r, 2.0 * r),
            position: Vec2::new(x, 0.0),
            radius: r,
        };
        // 0 and 1 overlap, 1 and 2 only touch
        let set = vec![circle(ids[0], 0.0, 5.0), circle(ids[1], 8.0, 5.0), circle(ids[2], 18.0, 5.0)];

        let expected = vec![(ids[0], ids[1])];
        assert_eq!(brute_force_radius(&set, &set, Pairing::SelfCollision), expected);
        assert_eq!(rdc_radius(&set, &set, Pairing::SelfCollision, 1), expected);
    }

    #[test]
    fn test_rdc_matches_brute_force_on_random_sets() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for round in 0..40 {
            let set = random_bodies(&mut rng, 10 + round * 3, 400.0);
            let min_cluster = 1 + round % 6;

            for volume in [BoundingVolume::Rect, BoundingVolume::Radius] {
                let brute = brute_force_with(&set, &set, Pairing::SelfCollision, |a, b| volume.overlaps(a, b));
                let rdc = rdc_with(volume, &set, &set, Pairing::SelfCollision, min_cluster);
                assert_eq!(rdc.len(), brute.len(), "duplicate or missing pairs in round {round}");
                assert_eq!(unordered(&rdc), unordered(&brute), "round {round}");
            }
        }
    }

    #[test]
    fn test_cross_rdc_matches_brute_force_on_random_sets() {
        let mut rng = StdRng::seed_from_u64(42);
        for round in 0..20 {
            let all = random_bodies(&mut rng, 35 + round, 300.0);
            let (first, second) = all.split_at(5 + round);

            let brute: HashSet<_> = brute_force_rect(first, second, Pairing::Cross).into_iter().collect();
            let rdc: HashSet<_> = rdc_rect(first, second, Pairing::Cross, 2).into_iter().collect();
            assert_eq!(rdc, brute, "round {round}");
        }
    }

    #[test]
    fn test_rdc_terminates_on_fully_overlapping_cluster() {
        let min_cluster = 10;
        let set = bodies(&vec![Rect::new(-1000.0, -1000.0, 5000.0, 5000.0); min_cluster + 1]);

        let rdc = rdc_rect(&set, &set, Pairing::SelfCollision, min_cluster);
        let brute = brute_force_rect(&set, &set, Pairing::SelfCollision);
        assert_eq!(rdc.len(), 55);
        assert_eq!(unordered(&rdc), unordered(&brute));
    }

    #[test]
    fn test_rdc_with_empty_side_yields_nothing() {
        let set = bodies(&[Rect::new(0.0, 0.0, 10.0, 10.0)]);
        assert!(rdc_rect(&set, &[], Pairing::Cross, 1).is_empty());
        assert!(rdc_rect(&[], &[], Pairing::SelfCollision, 1).is_empty());
    }

    #[test]
    fn test_pairing_defaults_from_names() {
        assert_eq!(Pairing::for_names("guards", "guards"), Pairing::SelfCollision);
        assert_eq!(Pairing::for_names("guards", "walls"), Pairing::Cross);
    }
}
