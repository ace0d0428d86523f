//! Face winding: conformance, reversal and quad diagonal flips.

use crate::errors::{MeshError, MeshResult};
use crate::float_types::Real;
use crate::math::{WindingOrder, winding_order};
use crate::mesh::EditableMesh;
use crate::mesh::edge::Edge;
use crate::mesh::winged_edge::WingedEdgeGraph;
use hashbrown::HashMap;
use nalgebra::{Point2, Vector3};
use std::fmt::Debug;

/// Drops the dominant axis of `normal`, keeping the other two in cyclic
/// (right-handed) order. A contour facing down that axis keeps its sense.
fn axis_projection(normal: &Vector3<Real>) -> impl Fn(&Vector3<Real>) -> Point2<Real> {
    let (x, y, z) = (normal.x.abs(), normal.y.abs(), normal.z.abs());
    let axis = if x >= y && x >= z {
        0
    } else if y >= z {
        1
    } else {
        2
    };
    move |p: &Vector3<Real>| match axis {
        0 => Point2::new(p.y, p.z),
        1 => Point2::new(p.z, p.x),
        _ => Point2::new(p.x, p.y),
    }
}

impl<S: Clone + Send + Sync + Debug> EditableMesh<S> {
    /// Reverses the winding (and with it the normal) of each face.
    pub fn reverse_faces(&mut self, faces: &[usize]) -> MeshResult<()> {
        self.check_faces(faces)?;
        for &f in faces {
            self.faces[f].reverse();
        }
        Ok(())
    }

    /// Rotational sense of a face's perimeter walk, seen down the world axis
    /// its normal is closest to.
    pub fn face_winding_order(&self, face: usize) -> MeshResult<WindingOrder> {
        let normal = self.face_normal(face)?;
        let project = axis_projection(&normal);
        let contour: Vec<Point2<Real>> = self.faces[face]
            .sorted_edges()
            .iter()
            .map(|e| project(&self.vertices[e.a].position.coords))
            .collect();
        Ok(winding_order(&contour))
    }

    /// Point variant: if the face across `wing`'s opposite runs the shared
    /// edge the same way `wing` does, that face is reversed. Returns whether
    /// it was.
    pub(crate) fn conform_opposite_normal(&mut self, graph: &WingedEdgeGraph, wing: usize) -> bool {
        let Some(opposite) = graph.get(wing).and_then(|w| w.opposite) else {
            return false;
        };
        let ours = graph.common_edge_in_winding_order(&self.faces, wing);
        let theirs = graph.common_edge_in_winding_order(&self.faces, opposite);
        match (ours, theirs) {
            (Some(a), Some(b)) if a.a == b.a => {
                self.faces[graph[opposite].face].reverse();
                true
            },
            _ => false,
        }
    }

    /// Makes `face` agree in winding with `neighbor` across their shared
    /// edge. Returns whether `face` was reversed; faces that share no edge
    /// are left alone.
    pub fn conform_to_neighbor(&mut self, face: usize, neighbor: usize) -> MeshResult<bool> {
        self.check_faces(&[face, neighbor])?;
        let graph = WingedEdgeGraph::build_for(&self.faces, [neighbor, face], &self.shared);
        let Some(start) = graph.face_wing(neighbor) else { return Ok(false) };
        let source = graph
            .face_edges(start)
            .find(|&id| graph[id].opposite.is_some_and(|o| graph[o].face == face));
        Ok(source.is_some_and(|id| self.conform_opposite_normal(&graph, id)))
    }

    /// **Normal conformance**
    ///
    /// Flood-fills each connected island of `faces`, flagging every face by
    /// whether it winds with or against the island's first face: crossing a
    /// shared edge that both sides walk in the same direction flips the flag.
    /// Within each island the minority is then reversed (ties keep the first
    /// face's orientation).
    ///
    /// Returns the number of faces reversed.
    pub fn conform_normals(&mut self, faces: &[usize]) -> MeshResult<usize> {
        self.check_faces(faces)?;
        let graph = WingedEdgeGraph::build_for(&self.faces, faces.iter().copied(), &self.shared);

        let mut flags: HashMap<usize, bool> = HashMap::new();
        let mut to_flip: Vec<usize> = Vec::new();

        for start in graph.one_per_face() {
            let start_face = graph[start].face;
            if flags.contains_key(&start_face) {
                continue;
            }
            let mut island = vec![start_face];
            flags.insert(start_face, true);
            let mut stack = vec![(start, true)];

            while let Some((wing, flag)) = stack.pop() {
                for id in graph.face_edges(wing).collect::<Vec<_>>() {
                    let Some(opp) = graph[id].opposite else { continue };
                    let neighbor = graph[opp].face;
                    if flags.contains_key(&neighbor) {
                        continue;
                    }
                    let ours = graph.common_edge_in_winding_order(&self.faces, id);
                    let theirs = graph.common_edge_in_winding_order(&self.faces, opp);
                    let reversed = matches!((ours, theirs), (Some(a), Some(b)) if a.a == b.a);
                    let neighbor_flag = if reversed { !flag } else { flag };
                    flags.insert(neighbor, neighbor_flag);
                    island.push(neighbor);
                    stack.push((opp, neighbor_flag));
                }
            }

            let agree = island.iter().filter(|f| flags[*f]).count();
            let minority = agree * 2 < island.len();
            to_flip.extend(island.into_iter().filter(|f| flags[f] == minority));
        }

        for &f in &to_flip {
            self.faces[f].reverse();
        }
        if !to_flip.is_empty() {
            tracing::debug!(flipped = to_flip.len(), "conformed face winding");
        }
        Ok(to_flip.len())
    }

    /// Reverses `face` if its normal points away from `target`'s.
    pub fn match_normal(&mut self, face: usize, target: usize) -> MeshResult<bool> {
        let (n, t) = (self.face_normal(face)?, self.face_normal(target)?);
        if n.dot(&t) < 0.0 {
            self.faces[face].reverse();
            return Ok(true);
        }
        Ok(false)
    }

    /// Swaps the diagonal of a two-triangle quad face.
    pub fn flip_edge(&mut self, face: usize) -> MeshResult<()> {
        self.check_faces(&[face])?;
        let quad = self.faces[face]
            .to_quad()
            .ok_or_else(|| MeshError::InvalidArgument(format!("face {face} is not a quad")))?;
        let [a, b, c, d] = quad;
        let diagonal = Edge::new(a, c);
        let on_ac = self.faces[face]
            .triangles()
            .any(|[x, y, z]| [Edge::new(x, y), Edge::new(y, z), Edge::new(z, x)].iter().any(|e| e.same(&diagonal)));
        self.faces[face].indices = if on_ac { vec![a, b, d, b, c, d] } else { vec![a, b, c, a, c, d] };
        Ok(())
    }
}
