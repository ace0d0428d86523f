//! Edge bevel: offset strips between the faces meeting at an edge, with the
//! corner holes capped.

use crate::errors::{MeshError, MeshResult};
use crate::float_types::{Real, tolerance};
use crate::math::{PlaneBasis, centroid, normalize_or_zero};
use crate::mesh::EditableMesh;
use crate::mesh::edge::{Edge, EdgeLookup};
use crate::mesh::face::{Face, GROUP_NONE, SMOOTHING_GROUP_NONE};
use crate::mesh::face_normal;
use crate::mesh::rebuild::{FaceRebuildData, tent_cap_with_vertices};
use crate::mesh::vertex::Vertex;
use crate::mesh::winged_edge::WingedEdgeGraph;
use crate::ops::triangulate::outline_face;
use hashbrown::{HashMap, HashSet};
use nalgebra::{Point3, Vector3};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt::Debug;

/// Gap kept between two slides running toward each other along one edge.
const SLIDE_MARGIN: Real = 0.001;

/// Unit direction from `from` toward `to`.
fn toward(from: &Point3<Real>, to: &Point3<Real>) -> Vector3<Real> {
    normalize_or_zero(to - from)
}

/// Distinct positions of `points`, first occurrence kept.
fn distinct_positions(points: &[(Point3<Real>, usize)]) -> Vec<(Point3<Real>, usize)> {
    let eps = tolerance();
    let mut out: Vec<(Point3<Real>, usize)> = Vec::new();
    for &(p, owner) in points {
        if !out.iter().any(|(q, _)| (p - q).norm() <= eps) {
            out.push((p, owner));
        }
    }
    out
}

impl<S: Clone + Send + Sync + Debug> EditableMesh<S> {
    /// **Bevel**
    ///
    /// Replaces each edge in `edges` by a strip `amount` wide. The two faces
    /// meeting at the edge give up a band: every corner on a bevelled edge
    /// slides `amount` along the face's other edge at that corner, or along
    /// both when both of the face's edges there are bevelled. A bridge quad
    /// spans the slid edges of the two faces. Any other face corner at a
    /// bevelled vertex is exploded into two vertices, one slid along each of
    /// its edges, and that face is re-triangulated.
    ///
    /// Wherever three or more distinct slid positions surround an original
    /// vertex, the hole between them is capped: one triangle for three
    /// corners, a fan from the centroid for more. Caps are wound to agree with
    /// the bridges they touch.
    ///
    /// `amount` is clamped to `len / 2 - 0.001` over every edge touching a
    /// bevelled vertex. Edges without an opposite face are skipped.
    ///
    /// ## **Errors**
    /// - [`MeshError::OpenEdges`] when no edge has a face on both sides
    /// - [`MeshError::InsufficientSurface`] when the clamped amount is too
    ///   small to use
    ///
    /// Both leave the mesh untouched. Returns the bridge face indices.
    pub fn bevel_edges(&mut self, edges: &[Edge], amount: Real) -> MeshResult<Vec<usize>> {
        if edges.is_empty() {
            return Err(MeshError::EmptyInput("edges"));
        }
        for e in edges {
            self.check_vertices(&[e.a, e.b])?;
        }
        let graph = WingedEdgeGraph::build(&self.faces, &self.shared);

        let mut targets: Vec<(usize, usize)> = Vec::new();
        let mut beveled: HashSet<Edge> = HashSet::new();
        for e in edges {
            let common = e.to_common(&self.shared).ok_or(MeshError::NotAnEdge(*e))?;
            let wing = graph.find(&EdgeLookup::new(common, *e)).ok_or(MeshError::NotAnEdge(*e))?;
            let Some(opposite) = graph[wing].opposite else { continue };
            if beveled.insert(common.normalized()) {
                targets.push((wing, opposite));
            }
        }
        if targets.is_empty() {
            return Err(MeshError::OpenEdges);
        }

        // Global clamp over the spokes of every bevelled vertex.
        let spokes = graph.spokes();
        let mut limit = amount;
        let ends: BTreeSet<usize> = beveled.iter().flat_map(|e| [e.a, e.b]).collect();
        for v in &ends {
            for &id in spokes.get(v).map(Vec::as_slice).unwrap_or(&[]) {
                let local = graph[id].edge.local;
                let len = (self.vertices[local.b].position - self.vertices[local.a].position).norm();
                limit = limit.min(len * 0.5 - SLIDE_MARGIN);
            }
        }
        if limit < SLIDE_MARGIN {
            tracing::debug!(requested = amount, clamped = limit, "bevel amount too small after clamping");
            return Err(MeshError::InsufficientSurface);
        }
        let amount = limit;

        let lookup = self.shared.lookup();
        let is_beveled = |e: &Edge| beveled.contains(&Edge::new(lookup[e.a], lookup[e.b]).normalized());

        // New corners of every face touching a bevelled vertex. A corner on a
        // bevelled edge slides along the face's other edge there (both, when
        // both are bevelled); a corner at a bevelled vertex whose own edges
        // are untouched explodes into one vertex per edge, which changes the
        // face's outline.
        let mut moved: HashMap<usize, Point3<Real>> = HashMap::new();
        let mut outlines: Vec<(usize, Vec<Vertex>)> = Vec::new();
        let mut around: BTreeMap<usize, Vec<(Point3<Real>, usize)>> = BTreeMap::new();
        for (f, face) in self.faces.iter().enumerate() {
            let ring = face.sorted_edges();
            if !ring.iter().any(|e| ends.contains(&lookup[e.a])) {
                continue;
            }
            let n = ring.len();
            let mut outline: Vec<Vertex> = Vec::with_capacity(n + 2);
            let mut exploded = false;
            for i in 0..n {
                let (incoming, outgoing) = (ring[(i + n - 1) % n], ring[i]);
                let corner = outgoing.a;
                let vertex = self.vertices[corner];
                let here = vertex.position;
                let back = toward(&here, &self.vertices[incoming.a].position);
                let ahead = toward(&here, &self.vertices[outgoing.b].position);
                let at_end = ends.contains(&lookup[corner]);

                let slides: Vec<Point3<Real>> = match (is_beveled(&incoming), is_beveled(&outgoing)) {
                    (false, false) if at_end => {
                        exploded = true;
                        vec![here + back * amount, here + ahead * amount]
                    },
                    (false, false) => vec![here],
                    (true, false) => vec![here + ahead * amount],
                    (false, true) => vec![here + back * amount],
                    (true, true) => vec![here + (back + ahead) * amount],
                };
                if slides.len() == 1 && slides[0] != here {
                    moved.insert(corner, slides[0]);
                }
                for p in slides {
                    if at_end {
                        around.entry(lookup[corner]).or_default().push((p, corner));
                    }
                    let mut copy = vertex;
                    copy.position = p;
                    outline.push(copy);
                }
            }
            if exploded {
                outlines.push((f, outline));
            }
        }
        let slid = |v: usize| -> Vertex {
            let mut vertex = self.vertices[v];
            if let Some(p) = moved.get(&v) {
                vertex.position = *p;
            }
            vertex
        };

        // Bridges: the left face's slid edge against the right face's.
        let mut staged: Vec<FaceRebuildData<S>> = Vec::with_capacity(targets.len());
        for &(w, o) in &targets {
            let (left, right) = (graph[w].edge, graph[o].edge);
            let (la, lb) = (left.local.a, left.local.b);
            let (ra, rb) = if right.common.a == left.common.a {
                (right.local.a, right.local.b)
            } else {
                (right.local.b, right.local.a)
            };
            let mut face = Face::with_properties_of(vec![1, 0, 2, 1, 2, 3], &self.faces[graph[w].face]);
            face.smoothing_group = SMOOTHING_GROUP_NONE;
            face.texture_group = GROUP_NONE;
            face.manual_uv = false;
            staged.push(FaceRebuildData::new(face, vec![slid(la), slid(lb), slid(ra), slid(rb)]));
        }
        let bridge_count = staged.len();

        // Faces with exploded corners are rebuilt from their new outlines.
        for (f, outline) in &outlines {
            let source = &self.faces[*f];
            let normal = face_normal(&self.vertices, source);
            let mut rebuilt = outline_face(outline.clone(), source, &normal)?;
            rebuilt.face.manual_uv = false;
            rebuilt.face.texture_group = GROUP_NONE;
            staged.push(rebuilt);
        }
        let rebuilt_count = outlines.len();

        // Caps over holes left around each bevelled vertex.
        let owner: HashMap<usize, usize> = self
            .faces
            .iter()
            .enumerate()
            .flat_map(|(f, face)| face.distinct_indices().into_iter().map(move |v| (v, f)))
            .collect();
        for (v, corners) in &around {
            let ring = distinct_positions(corners);
            if ring.len() < 3 {
                continue;
            }
            let normal = self
                .shared
                .positions_of(*v)
                .unwrap_or(&[])
                .iter()
                .filter_map(|m| owner.get(m))
                .fold(Vector3::zeros(), |acc, &f| acc + face_normal(&self.vertices, &self.faces[f]));
            let points: Vec<Point3<Real>> = ring.iter().map(|(p, _)| *p).collect();
            let basis = PlaneBasis::new(centroid(&points), normal);
            let mut order: Vec<usize> = (0..ring.len()).collect();
            order.sort_by(|&a, &b| {
                let (pa, pb) = (basis.project(&ring[a].0), basis.project(&ring[b].0));
                pa.y.atan2(pa.x).total_cmp(&pb.y.atan2(pb.x))
            });
            let path: Vec<Vertex> = order
                .iter()
                .map(|&i| {
                    let (p, source) = ring[i];
                    let mut vertex = self.vertices[source];
                    vertex.position = p;
                    vertex
                })
                .collect();
            let template = &self.faces[owner[&ring[0].1]];

            let caps = if path.len() == 3 {
                vec![FaceRebuildData::new(Face::new(vec![0, 1, 2]), path)]
            } else {
                tent_cap_with_vertices(&path)
            };
            for mut cap in caps {
                cap.face.submesh_index = template.submesh_index;
                cap.face.uv = template.uv;
                staged.push(cap);
            }
        }

        // Nothing above has written; commit.
        for (&v, &p) in &moved {
            self.vertices[v].position = p;
        }
        for &(w, o) in &targets {
            for f in [graph[w].face, graph[o].face] {
                self.faces[f].manual_uv = false;
                self.faces[f].texture_group = GROUP_NONE;
            }
        }
        let created = self.append_faces(&mut staged);
        let replaced: Vec<usize> = outlines.iter().map(|(f, _)| *f).collect();
        if !replaced.is_empty() {
            self.delete_faces(&replaced)?;
        }
        self.rebuild_shared_from_positions();

        let created: Vec<usize> = created.map(|f| f - replaced.len()).collect();
        let bridges: Vec<usize> = created[..bridge_count].to_vec();
        let caps: HashSet<usize> = created[bridge_count + rebuilt_count..].iter().copied().collect();
        self.conform_caps(&bridges, &caps);
        tracing::debug!(edges = bridges.len(), rebuilt = rebuilt_count, caps = caps.len(), amount, "bevelled edges");
        Ok(bridges)
    }

    /// Walks from the bridges across cap faces, turning each cap to agree
    /// with the face it was reached from.
    fn conform_caps(&mut self, bridges: &[usize], caps: &HashSet<usize>) {
        if caps.is_empty() {
            return;
        }
        let graph = WingedEdgeGraph::build(&self.faces, &self.shared);
        let mut fixed: HashSet<usize> = bridges.iter().copied().collect();
        let mut queue: VecDeque<usize> = bridges.iter().copied().collect();
        while let Some(face) = queue.pop_front() {
            let Some(start) = graph.face_wing(face) else { continue };
            for id in graph.face_edges(start).collect::<Vec<_>>() {
                let Some(opposite) = graph[id].opposite else { continue };
                let neighbor = graph[opposite].face;
                if !caps.contains(&neighbor) || fixed.contains(&neighbor) {
                    continue;
                }
                self.conform_opposite_normal(&graph, id);
                fixed.insert(neighbor);
                queue.push_back(neighbor);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coincident_slides_collapse_to_one_corner() {
        let p = Point3::new(0.0, 0.0, 0.0);
        let q = Point3::new(1.0, 0.0, 0.0);
        let ring = distinct_positions(&[(p, 0), (q, 1), (p, 2)]);
        assert_eq!(ring.len(), 2);
        assert_eq!(ring[0].1, 0);
    }
}
