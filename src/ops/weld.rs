//! Radius-based vertex welding over a k-d tree.

use crate::errors::{MeshError, MeshResult};
use crate::float_types::Real;
use crate::mesh::EditableMesh;
use crate::mesh::shared::{IdAllocator, SharedVertexTable};
use hashbrown::HashMap;
use kiddo::{ImmutableKdTree, SquaredEuclidean};
use nalgebra::{Point3, Vector3};
use std::fmt::Debug;
use std::num::NonZero;

/// Initial neighbour cap for a radial query.
const MAX_NEIGHBORS: usize = 32;

/// Distinct positions, each holding every group found at exactly that spot.
struct Buckets {
    positions: Vec<Point3<Real>>,
    groups: Vec<Vec<usize>>,
}

impl Buckets {
    fn collect(shared: &SharedVertexTable, positions: &[Point3<Real>], groups: impl IntoIterator<Item = usize>) -> Self {
        let mut by_bits: HashMap<[u64; 3], usize> = HashMap::new();
        let mut out = Buckets { positions: Vec::new(), groups: Vec::new() };
        for group in groups {
            let Some(&first) = shared.positions_of(group).and_then(|m| m.first()) else { continue };
            let p = positions[first];
            let bits = [p.x.to_bits() as u64, p.y.to_bits() as u64, p.z.to_bits() as u64];
            let bucket = *by_bits.entry(bits).or_insert_with(|| {
                out.positions.push(p);
                out.groups.push(Vec::new());
                out.positions.len() - 1
            });
            out.groups[bucket].push(group);
        }
        out
    }
}

impl<S: Clone + Send + Sync + Debug> EditableMesh<S> {
    /// **Weld (spatial merge)**
    ///
    /// Every group touched by `indices` that lies within `radius` of an
    /// unprocessed group is fused with it: the cluster gets a fresh group id
    /// and all members move to the average of the cluster's distinct
    /// positions. A group is consumed by the first cluster that reaches it.
    ///
    /// ## **Neighbour search**
    /// Radial queries start capped at 32 neighbours. A query whose every
    /// result lies inside the radius may have been cut short, so it is
    /// repeated uncapped and the cap grows to 1.5x what that query found.
    ///
    /// Returns one representative vertex index per cluster that fused two or
    /// more groups. Triangles collapsed by the weld are left for
    /// [`EditableMesh::ensure_mesh_is_valid`].
    pub fn weld_vertices(&mut self, indices: &[usize], radius: Real) -> MeshResult<Vec<usize>> {
        self.check_vertices(indices)?;
        if !radius.is_finite() || radius < 0.0 {
            return Err(MeshError::InvalidArgument(format!("weld radius must be a non-negative number, got {radius}")));
        }
        let radius = radius.max(Real::EPSILON);
        let r2 = radius * radius;

        let positions: Vec<Point3<Real>> = self.vertices.iter().map(|v| v.position).collect();
        let common = self.shared.common_indices(indices);
        let buckets = Buckets::collect(&self.shared, &positions, common.iter().copied());
        if buckets.positions.is_empty() {
            return Ok(Vec::new());
        }

        // Items are indices into `points`.
        let points: Vec<[Real; 3]> = buckets.positions.iter().map(|p| [p.x, p.y, p.z]).collect();
        let tree: ImmutableKdTree<Real, 3> = ImmutableKdTree::new_from_slice(&points);
        let bucket_of: HashMap<usize, usize> = buckets
            .groups
            .iter()
            .enumerate()
            .flat_map(|(b, groups)| groups.iter().map(move |&g| (g, b)))
            .collect();

        let mut allocator = IdAllocator::starting_at(self.shared.len());
        let mut cap = MAX_NEIGHBORS.min(buckets.positions.len());
        let mut taken: HashMap<usize, usize> = HashMap::new();
        let mut clusters: Vec<(usize, Vec<usize>, Point3<Real>)> = Vec::new();

        for &group in &common {
            if taken.contains_key(&group) {
                continue;
            }
            let Some(&home) = bucket_of.get(&group) else { continue };
            let p = buckets.positions[home];
            let query = [p.x, p.y, p.z];

            let mut hits: Vec<usize> = tree
                .nearest_n::<SquaredEuclidean>(&query, NonZero::new(cap).unwrap_or(NonZero::<usize>::MIN))
                .into_iter()
                .filter(|n| n.distance <= r2)
                .map(|n| n.item as usize)
                .collect();
            if hits.len() >= cap && cap < buckets.positions.len() {
                hits = tree
                    .nearest_n::<SquaredEuclidean>(&query, NonZero::new(buckets.positions.len()).unwrap_or(NonZero::<usize>::MIN))
                    .into_iter()
                    .filter(|n| n.distance <= r2)
                    .map(|n| n.item as usize)
                    .collect();
                cap = (hits.len() + hits.len() / 2).clamp(1, buckets.positions.len());
            }

            let key = allocator.next_id();
            let mut members = Vec::new();
            let mut sum = Vector3::zeros();
            let mut count = 0usize;
            for bucket in hits {
                let mut fresh = false;
                for &g in &buckets.groups[bucket] {
                    if let hashbrown::hash_map::Entry::Vacant(slot) = taken.entry(g) {
                        slot.insert(key);
                        members.push(g);
                        fresh = true;
                    }
                }
                if fresh {
                    sum += buckets.positions[bucket].coords;
                    count += 1;
                }
            }
            if members.len() > 1 && count > 0 {
                clusters.push((key, members, Point3::from(sum / count as Real)));
            }
        }

        if clusters.is_empty() {
            return Ok(Vec::new());
        }

        let mut keys = self.shared.to_lookup();
        let mut welds = Vec::with_capacity(clusters.len());
        for (key, members, average) in &clusters {
            let mut representative = usize::MAX;
            for &g in members {
                for &m in self.shared.positions_of(g).unwrap_or(&[]) {
                    keys[m] = Some(*key);
                    self.vertices[m].position = *average;
                    representative = representative.min(m);
                }
            }
            welds.push(representative);
        }
        self.shared = SharedVertexTable::from_lookup(&keys);
        welds.sort_unstable();
        tracing::debug!(clusters = welds.len(), radius, "welded vertices");
        Ok(welds)
    }
}
