//! Open-boundary detection and hole patching.

use crate::errors::{MeshError, MeshResult};
use crate::mesh::EditableMesh;
use crate::mesh::edge::Edge;
use crate::mesh::rebuild::FaceRebuildData;
use crate::mesh::vertex::Vertex;
use crate::mesh::winged_edge::WingedEdgeGraph;
use crate::ops::triangulate::face_with_vertices;
use hashbrown::HashSet;
use std::fmt::Debug;

/// Local index of each corner of a hole loop, in walk order.
fn hole_path(graph: &WingedEdgeGraph, ring: &[usize]) -> Vec<usize> {
    let n = ring.len();
    if n < 3 {
        return Vec::new();
    }
    let mut path = Vec::with_capacity(n);
    for i in 0..n {
        let previous = graph[ring[(i + n - 1) % n]].edge.common;
        let wing = graph[ring[i]].edge;
        // The corner shared with the previous edge of the loop.
        let local = if previous.contains(wing.common.a) { wing.local.a } else { wing.local.b };
        path.push(local);
    }
    path
}

impl<S: Clone + Send + Sync + Debug> EditableMesh<S> {
    /// Closed open-edge loops. With `indices`, only loops touching one of
    /// those vertices (or their twins) are reported. Each loop lists local
    /// edges in walk order.
    pub fn find_holes(&self, indices: Option<&[usize]>) -> MeshResult<Vec<Vec<Edge>>> {
        if let Some(indices) = indices {
            self.check_vertices(indices)?;
        }
        let graph = WingedEdgeGraph::build(&self.faces, &self.shared);
        let common = indices.map(|i| self.shared.common_indices(i));
        Ok(graph
            .find_holes(common.as_ref())
            .into_iter()
            .map(|ring| ring.iter().map(|&w| graph[w].edge.local).collect())
            .collect())
    }

    /// **Fill holes**
    ///
    /// Caps every hole (or those touching `indices`) with a new polygon. Each
    /// cap takes the material slot and UV settings of the first original
    /// face it borders and is wound to agree with it. All caps are
    /// triangulated before anything is appended.
    ///
    /// Returns the new face indices.
    pub fn fill_holes(&mut self, indices: Option<&[usize]>) -> MeshResult<Vec<usize>> {
        if let Some(indices) = indices {
            self.check_vertices(indices)?;
        }
        let graph = WingedEdgeGraph::build(&self.faces, &self.shared);
        let common = indices.map(|i| self.shared.common_indices(i));
        let holes = graph.find_holes(common.as_ref());

        let mut staged: Vec<FaceRebuildData<S>> = Vec::new();
        for ring in &holes {
            let path = hole_path(&graph, ring);
            if path.len() < 3 {
                continue;
            }
            let vertices: Vec<Vertex> = path.iter().map(|&i| self.vertices[i]).collect();
            let shared = path.iter().map(|&i| self.shared.group(i)).collect();
            staged.push(face_with_vertices::<S>(vertices, false)?.with_shared(shared));
        }
        if staged.is_empty() {
            tracing::debug!("fill holes: no closed open-edge loop");
            return Err(MeshError::NoHolesFound);
        }

        let created: Vec<usize> = self.append_faces(&mut staged).collect();
        let new_faces: HashSet<usize> = created.iter().copied().collect();
        let graph = WingedEdgeGraph::build(&self.faces, &self.shared);

        for &face in &created {
            let Some(start) = graph.face_wing(face) else { continue };
            let border = graph
                .face_edges(start)
                .find_map(|id| graph[id].opposite.filter(|&o| !new_faces.contains(&graph[o].face)));
            if let Some(neighbor_wing) = border {
                let neighbor = graph[neighbor_wing].face;
                self.faces[face].submesh_index = self.faces[neighbor].submesh_index;
                self.faces[face].uv = self.faces[neighbor].uv;
                self.conform_opposite_normal(&graph, neighbor_wing);
            }
        }
        tracing::debug!(filled = created.len(), "filled holes");
        Ok(created)
    }
}
