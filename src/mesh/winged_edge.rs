//! **Winged-Edge Adjacency**
//!
//! One record per perimeter edge of every face, linked cyclically around its
//! face (`next`/`previous`) and across faces (`opposite`). Records live in an
//! arena and point at each other by index; the graph is rebuilt from the face
//! list and shared-vertex table whenever topology changes.
//!
//! ## **Non-manifold edges**
//! When three or more perimeter edges share one common edge, occurrences are
//! paired in arrival order (1st with 2nd, 3rd with 4th, ...). `opposite`
//! therefore stays symmetric, an odd occurrence out is treated as open, and
//! the offending common edges are reported by
//! [`WingedEdgeGraph::non_manifold_edges`].

use crate::mesh::edge::{Edge, EdgeLookup};
use crate::mesh::face::Face;
use crate::mesh::shared::SharedVertexTable;
use hashbrown::{HashMap, HashSet};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;
use std::ops::Index;

/// Orders `edges` so each edge's `b` is the next edge's `a`. An edge found
/// pointing the wrong way is flipped; a run that cannot be continued is left
/// where it is.
pub fn sort_edges_by_adjacency(edges: &mut [Edge]) {
    for i in 1..edges.len() {
        let want = edges[i - 1].b;
        let Some(offset) = edges[i..].iter().position(|e| e.a == want || e.b == want) else {
            continue;
        };
        edges.swap(i, i + offset);
        if edges[i].a != want {
            edges[i] = edges[i].reversed();
        }
    }
}

/// An edge of one face, with its neighbours.
#[derive(Debug, Clone, Copy)]
pub struct WingedEdge {
    pub edge: EdgeLookup,
    /// Owning face index
    pub face: usize,
    /// Following edge around the same face
    pub next: usize,
    /// Preceding edge around the same face
    pub previous: usize,
    /// The same common edge on the neighbouring face, if any
    pub opposite: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct WingedEdgeGraph {
    wings: Vec<WingedEdge>,
    /// face index -> first wing of that face
    face_first: BTreeMap<usize, usize>,
    non_manifold: Vec<Edge>,
}

impl Index<usize> for WingedEdgeGraph {
    type Output = WingedEdge;

    fn index(&self, id: usize) -> &WingedEdge {
        &self.wings[id]
    }
}

impl WingedEdgeGraph {
    /// Graph over every face.
    pub fn build<S: Clone + Send + Sync + Debug>(faces: &[Face<S>], shared: &SharedVertexTable) -> Self {
        Self::build_for(faces, 0..faces.len(), shared)
    }

    /// Graph over a subset of faces. `opposite` only links faces inside the
    /// subset; out-of-range face indices are skipped.
    pub fn build_for<S: Clone + Send + Sync + Debug>(
        faces: &[Face<S>],
        face_indices: impl IntoIterator<Item = usize>,
        shared: &SharedVertexTable,
    ) -> Self {
        let mut wings: Vec<WingedEdge> = Vec::new();
        let mut face_first = BTreeMap::new();
        let mut pending: HashMap<Edge, usize> = HashMap::new();
        let mut occurrences: HashMap<Edge, usize> = HashMap::new();

        for f in face_indices {
            let Some(face) = faces.get(f) else { continue };
            if face_first.contains_key(&f) {
                continue;
            }
            let edges = face.sorted_edges();
            let n = edges.len();
            if n == 0 {
                continue;
            }
            let base = wings.len();
            face_first.insert(f, base);

            for (k, local) in edges.iter().enumerate() {
                let common = local.to_common(shared).unwrap_or(*local);
                let id = base + k;
                wings.push(WingedEdge {
                    edge: EdgeLookup::new(common, *local),
                    face: f,
                    next: base + (k + 1) % n,
                    previous: base + (k + n - 1) % n,
                    opposite: None,
                });

                let key = common.normalized();
                *occurrences.entry(key).or_insert(0) += 1;
                // A face folded onto itself never becomes its own neighbour.
                match pending.get(&key).copied() {
                    Some(other) if wings[other].face != f => {
                        pending.remove(&key);
                        wings[other].opposite = Some(id);
                        wings[id].opposite = Some(other);
                    },
                    Some(_) => {},
                    None => {
                        pending.insert(key, id);
                    },
                }
            }
        }

        let mut non_manifold: Vec<Edge> =
            occurrences.into_iter().filter(|&(_, count)| count > 2).map(|(edge, _)| edge).collect();
        non_manifold.sort_unstable();
        if !non_manifold.is_empty() {
            tracing::debug!(count = non_manifold.len(), "non-manifold edges paired in arrival order");
        }

        Self { wings, face_first, non_manifold }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.wings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.wings.is_empty()
    }

    #[inline]
    pub fn edges(&self) -> &[WingedEdge] {
        &self.wings
    }

    #[inline]
    pub fn get(&self, id: usize) -> Option<&WingedEdge> {
        self.wings.get(id)
    }

    /// Common edges shared by more than two faces.
    pub fn non_manifold_edges(&self) -> &[Edge] {
        &self.non_manifold
    }

    /// One representative wing per face, in face order.
    pub fn one_per_face(&self) -> Vec<usize> {
        self.face_first.values().copied().collect()
    }

    /// First wing of `face`, if the face is in the graph.
    pub fn face_wing(&self, face: usize) -> Option<usize> {
        self.face_first.get(&face).copied()
    }

    /// Faces covered by the graph.
    pub fn faces(&self) -> impl Iterator<Item = usize> + '_ {
        self.face_first.keys().copied()
    }

    /// Walks `next` links once around the face of `start`.
    pub fn face_edges(&self, start: usize) -> FaceEdges<'_> {
        FaceEdges { graph: self, start, current: Some(start) }
    }

    /// Number of edges around the face of `id`.
    pub fn count(&self, id: usize) -> usize {
        self.face_edges(id).count()
    }

    /// First wing whose common edge matches `lookup` (undirected).
    pub fn find(&self, lookup: &EdgeLookup) -> Option<usize> {
        self.wings.iter().position(|w| w.edge == *lookup)
    }

    /// The neighbour of `id` around its face that also touches `common`,
    /// trying `next` before `previous`.
    pub fn adjacent_edge_with_common_index(&self, id: usize, common: usize) -> Option<usize> {
        let wing = self.wings.get(id)?;
        if self.wings[wing.next].edge.common.contains(common) {
            Some(wing.next)
        } else if self.wings[wing.previous].edge.common.contains(common) {
            Some(wing.previous)
        } else {
            None
        }
    }

    /// Common index -> every wing that touches it.
    pub fn spokes(&self) -> HashMap<usize, Vec<usize>> {
        let mut spokes: HashMap<usize, Vec<usize>> = HashMap::new();
        for (id, w) in self.wings.iter().enumerate() {
            spokes.entry(w.edge.common.a).or_default().push(id);
            spokes.entry(w.edge.common.b).or_default().push(id);
        }
        spokes
    }

    /// Orders a set of common indices into the loop their edges form. Fails
    /// if the wings with both ends in the set do not form exactly one edge per
    /// index.
    pub fn sort_common_indices_by_adjacency(&self, common: &BTreeSet<usize>) -> Option<Vec<usize>> {
        let mut matches: Vec<Edge> = self
            .wings
            .iter()
            .map(|w| w.edge.common)
            .filter(|e| common.contains(&e.a) && common.contains(&e.b))
            .collect();
        if matches.len() != common.len() {
            return None;
        }
        sort_edges_by_adjacency(&mut matches);
        Some(matches.iter().map(|e| e.a).collect())
    }

    /// The common edge of `id` oriented the way its triangle winds.
    pub fn common_edge_in_winding_order<S: Clone + Send + Sync + Debug>(
        &self,
        faces: &[Face<S>],
        id: usize,
    ) -> Option<Edge> {
        let wing = self.wings.get(id)?;
        let face = faces.get(wing.face)?;
        let (local, common) = (wing.edge.local, wing.edge.common);
        for [a, b, c] in face.triangles() {
            for (x, y) in [(a, b), (b, c), (c, a)] {
                if local.a == x && local.b == y {
                    return Some(common);
                }
                if local.a == y && local.b == x {
                    return Some(common.reversed());
                }
            }
        }
        None
    }

    /// Faces reachable from `start` through `opposite` links for which
    /// `can_cross(from_wing, to_wing)` holds.
    pub fn flood(&self, start: usize, mut can_cross: impl FnMut(usize, usize) -> bool) -> BTreeSet<usize> {
        let mut reached = BTreeSet::new();
        let Some(first) = self.face_wing(start) else {
            return reached;
        };
        reached.insert(start);
        let mut stack = vec![first];
        while let Some(wing) = stack.pop() {
            for id in self.face_edges(wing).collect::<Vec<_>>() {
                let Some(opp) = self.wings[id].opposite else { continue };
                let face = self.wings[opp].face;
                if !reached.contains(&face) && can_cross(id, opp) {
                    reached.insert(face);
                    stack.push(opp);
                }
            }
        }
        reached
    }

    /// Connected components of the graph's faces, joined across shared edges.
    pub fn face_groups(&self) -> Vec<Vec<usize>> {
        let mut seen: HashSet<usize> = HashSet::new();
        let mut groups = Vec::new();
        for face in self.faces() {
            if seen.contains(&face) {
                continue;
            }
            let group = self.flood(face, |_, _| true);
            seen.extend(group.iter().copied());
            groups.push(group.into_iter().collect());
        }
        groups
    }

    /// Rotates around common vertex `common` from `id` until an edge without
    /// an opposite turns up.
    fn next_edge_in_hole(&self, id: usize, common: usize) -> Option<usize> {
        let mut next = self.adjacent_edge_with_common_index(id, common);
        let mut steps = 0;
        while let Some(candidate) = next {
            if candidate == id || steps > self.wings.len() {
                return None;
            }
            match self.wings[candidate].opposite {
                None => return Some(candidate),
                Some(opp) => next = self.adjacent_edge_with_common_index(opp, common),
            }
            steps += 1;
        }
        None
    }

    /// **Hole boundary extraction**
    ///
    /// Chains open edges (no `opposite`) into loops by walking from vertex to
    /// vertex. When the walk revisits a vertex it already passed through, the
    /// edges since that visit form a loop of their own and are split off; this
    /// separates holes that touch at a single vertex.
    ///
    /// With `common` set, only open edges touching one of those common
    /// indices start a walk. Returns loops of wing ids in walk order.
    pub fn find_holes(&self, common: Option<&BTreeSet<usize>>) -> Vec<Vec<usize>> {
        let mut used: HashSet<usize> = HashSet::new();
        let mut holes: Vec<Vec<usize>> = Vec::new();

        for (start, wing) in self.wings.iter().enumerate() {
            if wing.opposite.is_some() || used.contains(&start) {
                continue;
            }
            if let Some(common) = common {
                if !common.contains(&wing.edge.common.a) && !common.contains(&wing.edge.common.b) {
                    continue;
                }
            }

            let mut stack: Vec<usize> = Vec::new();
            let mut visited: HashMap<usize, usize> = HashMap::new();
            let mut at = wing.edge.common.a;
            visited.insert(at, 0);
            let mut it = start;

            loop {
                used.insert(it);
                stack.push(it);
                let e = self.wings[it].edge.common;
                at = if e.a == at { e.b } else { e.a };

                if let Some(&pos) = visited.get(&at) {
                    let ring: Vec<usize> = stack.drain(pos..).collect();
                    for &w in &ring {
                        let e = self.wings[w].edge.common;
                        for v in [e.a, e.b] {
                            if v != at && visited.get(&v).is_some_and(|&p| p >= pos) {
                                visited.remove(&v);
                            }
                        }
                    }
                    holes.push(ring);
                } else {
                    visited.insert(at, stack.len());
                }

                match self.next_edge_in_hole(it, at) {
                    Some(next) if !used.contains(&next) => it = next,
                    _ => break,
                }
            }

            if !stack.is_empty() {
                holes.push(stack);
            }
        }
        holes
    }
}

/// Iterator over the wings around one face.
pub struct FaceEdges<'a> {
    graph: &'a WingedEdgeGraph,
    start: usize,
    current: Option<usize>,
}

impl Iterator for FaceEdges<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.current?;
        let next = self.graph.wings.get(current)?.next;
        self.current = if next == self.start { None } else { Some(next) };
        Some(current)
    }
}
