//! Connecting split points across faces and subdividing edges.

use crate::errors::{MeshError, MeshResult};
use crate::float_types::Real;
use crate::mesh::EditableMesh;
use crate::mesh::edge::Edge;
use crate::mesh::face::{Face, GROUP_NONE};
use crate::mesh::face_normal;
use crate::mesh::rebuild::FaceRebuildData;
use crate::mesh::shared::IdAllocator;
use crate::mesh::vertex::Vertex;
use crate::ops::triangulate::outline_face;
use hashbrown::{HashMap, HashSet};
use nalgebra::Vector3;
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Where a face gets cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplitPoint {
    /// An existing corner (or any of its coincident twins)
    ExistingVertex(usize),
    /// The midpoint of an edge, shared by the faces on both sides
    EdgeMidpoint(Edge),
}

/// One corner of a face outline being rebuilt.
#[derive(Debug, Clone, Copy)]
struct RingVertex {
    vertex: Vertex,
    shared: Option<usize>,
    shared_uv: Option<usize>,
}

/// Triangulates an ordered outline and winds it to agree with `normal`.
fn stage_ring<S: Clone + Send + Sync + Debug>(
    ring: &[RingVertex],
    template: &Face<S>,
    normal: &Vector3<Real>,
) -> MeshResult<FaceRebuildData<S>> {
    let vertices = ring.iter().map(|r| r.vertex).collect();
    Ok(outline_face(vertices, template, normal)?
        .with_shared(ring.iter().map(|r| r.shared).collect())
        .with_shared_uv(ring.iter().map(|r| r.shared_uv).collect()))
}

/// Cuts an outline of `n` corners at ring positions `cuts` (ascending).
/// Two cuts make two pieces; more cuts make one piece per consecutive pair,
/// each closed through the outline's centroid (`true` flag). Cuts that would
/// leave a piece with fewer than three corners leave the outline whole.
fn split_ring(n: usize, cuts: &[usize]) -> Vec<(Vec<usize>, bool)> {
    let span = |from: usize, to: usize| -> Vec<usize> {
        let mut out = vec![from];
        let mut i = from;
        while i != to {
            i = (i + 1) % n;
            out.push(i);
        }
        out
    };
    match cuts.len() {
        2 => {
            let (p, q) = (cuts[0], cuts[1]);
            if q - p >= 2 && n - q + p >= 2 {
                vec![(span(p, q), false), (span(q, p), false)]
            } else {
                vec![((0..n).collect(), false)]
            }
        },
        k if k > 2 => (0..k).map(|i| (span(cuts[i], cuts[(i + 1) % k]), true)).collect(),
        _ => vec![((0..n).collect(), false)],
    }
}

impl<S: Clone + Send + Sync + Debug> EditableMesh<S> {
    fn ring_corner(&self, index: usize) -> RingVertex {
        RingVertex {
            vertex: self.vertices[index],
            shared: self.shared.group(index),
            shared_uv: self.shared_uv.group(index),
        }
    }

    /// Swaps `affected` faces for `staged` ones; returns the new face indices.
    fn replace_faces(&mut self, affected: &[usize], staged: &mut [FaceRebuildData<S>]) -> MeshResult<Vec<usize>> {
        let created = self.append_faces(staged);
        self.delete_faces(affected)?;
        Ok(created.map(|f| f - affected.len()).collect())
    }

    /// **Connect**
    ///
    /// Every face holding two or more split points is cut between them: two
    /// points cut it in two, more points cut it into one piece per point
    /// gathered around the face centroid. Edge midpoints are only created
    /// when some face actually gets cut through them; the face on the other
    /// side of such an edge receives the midpoint too, so no crack opens.
    /// Pieces keep the source face's properties and facing; a source face
    /// without a texture group gets a fresh one shared by its pieces.
    ///
    /// Returns the new face indices.
    pub fn connect_points(&mut self, points: &[SplitPoint]) -> MeshResult<Vec<usize>> {
        if points.is_empty() {
            return Err(MeshError::EmptyInput("split points"));
        }
        let mut vertex_groups: HashSet<usize> = HashSet::new();
        let mut midpoint_edges: HashSet<Edge> = HashSet::new();
        for point in points {
            match *point {
                SplitPoint::ExistingVertex(i) => {
                    self.check_vertices(&[i])?;
                    vertex_groups.extend(self.shared.group(i));
                },
                SplitPoint::EdgeMidpoint(e) => {
                    self.check_vertices(&[e.a, e.b])?;
                    let common = e.to_common(&self.shared).ok_or(MeshError::NotAnEdge(e))?;
                    midpoint_edges.insert(common.normalized());
                },
            }
        }

        // Cut count per face, and which midpoint edges each face holds.
        let lookup = self.shared.lookup();
        let mut found_edges: HashSet<Edge> = HashSet::new();
        let mut cuts_per_face: BTreeMap<usize, usize> = BTreeMap::new();
        let mut midpoints_per_face: BTreeMap<usize, Vec<Edge>> = BTreeMap::new();
        for (f, face) in self.faces.iter().enumerate() {
            let mut cuts = 0;
            for e in face.sorted_edges() {
                if vertex_groups.contains(&lookup[e.a]) {
                    cuts += 1;
                }
                let common = Edge::new(lookup[e.a], lookup[e.b]).normalized();
                if midpoint_edges.contains(&common) {
                    cuts += 1;
                    found_edges.insert(common);
                    midpoints_per_face.entry(f).or_default().push(common);
                }
            }
            if cuts > 0 {
                cuts_per_face.insert(f, cuts);
            }
        }
        if let Some(missing) = midpoint_edges.iter().find(|e| !found_edges.contains(*e)) {
            return Err(MeshError::NotAnEdge(*missing));
        }

        let splitting: Vec<usize> = cuts_per_face.iter().filter(|&(_, &c)| c >= 2).map(|(&f, _)| f).collect();
        let active: HashSet<Edge> =
            splitting.iter().flat_map(|f| midpoints_per_face.get(f).into_iter().flatten().copied()).collect();
        let mut affected: Vec<usize> = splitting.clone();
        for (&f, edges) in &midpoints_per_face {
            if !splitting.contains(&f) && edges.iter().any(|e| active.contains(e)) {
                affected.push(f);
            }
        }
        affected.sort_unstable();
        if affected.is_empty() {
            return Ok(Vec::new());
        }

        let mut shared_keys = IdAllocator::starting_at(self.shared.len());
        let mut uv_keys = IdAllocator::starting_at(self.shared_uv.len());
        let mut texture_groups = IdAllocator::after_signed(self.faces.iter().map(|f| f.texture_group));
        let mut midpoint_keys: HashMap<Edge, usize> = HashMap::new();
        // Keyed by the UV groups of the endpoints, so a UV-continuous edge
        // keeps one UV group for its midpoint on both sides.
        let mut midpoint_uv_keys: HashMap<Edge, usize> = HashMap::new();
        let uv_lookup = self.shared_uv.lookup();
        let mut staged: Vec<FaceRebuildData<S>> = Vec::new();
        let mut replaced: Vec<usize> = Vec::new();

        for &f in &affected {
            let face = &self.faces[f];
            let normal = face_normal(&self.vertices, face);
            let mut ring: Vec<RingVertex> = Vec::new();
            let mut cuts: Vec<usize> = Vec::new();
            let mut inserted = false;

            for e in face.sorted_edges() {
                ring.push(self.ring_corner(e.a));
                if vertex_groups.contains(&lookup[e.a]) {
                    cuts.push(ring.len() - 1);
                }
                let common = Edge::new(lookup[e.a], lookup[e.b]).normalized();
                if active.contains(&common) {
                    let key = *midpoint_keys.entry(common).or_insert_with(|| shared_keys.next_id());
                    let uv_edge = Edge::new(uv_lookup[e.a], uv_lookup[e.b]).normalized();
                    let uv_key = *midpoint_uv_keys.entry(uv_edge).or_insert_with(|| uv_keys.next_id());
                    ring.push(RingVertex {
                        vertex: self.vertices[e.a].mix(&self.vertices[e.b], 0.5),
                        shared: Some(key),
                        shared_uv: Some(uv_key),
                    });
                    cuts.push(ring.len() - 1);
                    inserted = true;
                }
            }

            let pieces = if splitting.contains(&f) { split_ring(ring.len(), &cuts) } else { vec![((0..ring.len()).collect(), false)] };
            if pieces.len() == 1 && !inserted {
                continue;
            }

            let mut template = face.clone();
            if pieces.len() > 1 && template.texture_group == GROUP_NONE {
                template.texture_group = texture_groups.next_signed();
            }
            let center = (pieces.iter().any(|(_, c)| *c)).then(|| RingVertex {
                vertex: Vertex::average(&ring.iter().map(|r| r.vertex).collect::<Vec<_>>(), None),
                shared: Some(shared_keys.next_id()),
                shared_uv: Some(uv_keys.next_id()),
            });

            for (positions, with_center) in pieces {
                let mut outline: Vec<RingVertex> = positions.iter().map(|&p| ring[p]).collect();
                if let (true, Some(c)) = (with_center, center) {
                    outline.push(c);
                }
                staged.push(stage_ring(&outline, &template, &normal)?);
            }
            replaced.push(f);
        }

        if replaced.is_empty() {
            return Ok(Vec::new());
        }
        let created = self.replace_faces(&replaced, &mut staged)?;
        tracing::debug!(replaced = replaced.len(), created = created.len(), "connected split points");
        Ok(created)
    }

    /// Connects the midpoints of `edges` within each face holding two or more
    /// of them.
    pub fn connect_edges(&mut self, edges: &[Edge]) -> MeshResult<Vec<usize>> {
        let points: Vec<SplitPoint> = edges.iter().copied().map(SplitPoint::EdgeMidpoint).collect();
        self.connect_points(&points)
    }

    /// Connects existing vertices that share a face.
    pub fn connect_vertices(&mut self, indices: &[usize]) -> MeshResult<Vec<usize>> {
        let points: Vec<SplitPoint> = indices.iter().copied().map(SplitPoint::ExistingVertex).collect();
        self.connect_points(&points)
    }

    /// **Subdivide edges**
    ///
    /// Inserts `count` evenly spaced points along each edge into every face
    /// bordering it and re-triangulates those faces. Points on one edge are
    /// shared by the faces on both sides. `count` must lie in `1..=512`.
    ///
    /// Returns the new face indices.
    pub fn subdivide_edges(&mut self, edges: &[Edge], count: usize) -> MeshResult<Vec<usize>> {
        if edges.is_empty() {
            return Err(MeshError::EmptyInput("edges"));
        }
        if !(1..=512).contains(&count) {
            return Err(MeshError::InvalidArgument(format!("subdivision count {count} outside 1..=512")));
        }
        let mut targets: HashSet<Edge> = HashSet::new();
        for e in edges {
            self.check_vertices(&[e.a, e.b])?;
            targets.insert(e.to_common(&self.shared).ok_or(MeshError::NotAnEdge(*e))?.normalized());
        }

        let lookup = self.shared.lookup();
        let mut shared_keys = IdAllocator::starting_at(self.shared.len());
        let mut uv_keys = IdAllocator::starting_at(self.shared_uv.len());
        let mut point_keys: HashMap<(Edge, usize), usize> = HashMap::new();
        let uv_lookup = self.shared_uv.lookup();
        let mut point_uv_keys: HashMap<(Edge, usize), usize> = HashMap::new();
        let mut staged: Vec<FaceRebuildData<S>> = Vec::new();
        let mut affected: Vec<usize> = Vec::new();
        let mut found: HashSet<Edge> = HashSet::new();

        for (f, face) in self.faces.iter().enumerate() {
            let perimeter = face.sorted_edges();
            if !perimeter.iter().any(|e| targets.contains(&Edge::new(lookup[e.a], lookup[e.b]).normalized())) {
                continue;
            }
            let normal = face_normal(&self.vertices, face);
            let mut ring: Vec<RingVertex> = Vec::new();
            for e in &perimeter {
                ring.push(self.ring_corner(e.a));
                let walk = Edge::new(lookup[e.a], lookup[e.b]);
                let common = walk.normalized();
                if !targets.contains(&common) {
                    continue;
                }
                found.insert(common);
                let uv_walk = Edge::new(uv_lookup[e.a], uv_lookup[e.b]);
                let uv_common = uv_walk.normalized();
                for j in 0..count {
                    let t = (j + 1) as Real / (count + 1) as Real;
                    // Index along the canonical direction so both sides agree.
                    let canonical = if walk == common { j } else { count - 1 - j };
                    let key = *point_keys.entry((common, canonical)).or_insert_with(|| shared_keys.next_id());
                    let uv_step = if uv_walk == uv_common { j } else { count - 1 - j };
                    let uv_key = *point_uv_keys.entry((uv_common, uv_step)).or_insert_with(|| uv_keys.next_id());
                    ring.push(RingVertex {
                        vertex: self.vertices[e.a].mix(&self.vertices[e.b], t),
                        shared: Some(key),
                        shared_uv: Some(uv_key),
                    });
                }
            }
            staged.push(stage_ring(&ring, face, &normal)?);
            affected.push(f);
        }
        if let Some(missing) = targets.iter().find(|e| !found.contains(*e)) {
            return Err(MeshError::NotAnEdge(*missing));
        }

        let created = self.replace_faces(&affected, &mut staged)?;
        tracing::debug!(edges = targets.len(), count, "subdivided edges");
        Ok(created)
    }
}
