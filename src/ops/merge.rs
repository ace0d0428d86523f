//! Collapse an explicit set of vertices into one point.

use crate::errors::MeshResult;
use crate::mesh::EditableMesh;
use crate::mesh::vertex::Vertex;
use std::fmt::Debug;

impl<S: Clone + Send + Sync + Debug> EditableMesh<S> {
    /// **Merge / Collapse**
    ///
    /// Unions the position and UV groups of `indices` and moves them to one
    /// value: the first vertex when `collapse_to_first`, otherwise the
    /// attribute-wise average. The addressed vertices take the full value;
    /// other members of the merged group take only its position so they stay
    /// coincident without losing their own UVs. Ends with a
    /// degenerate-triangle sweep.
    ///
    /// Returns a surviving index of the merged point, or `None` if the sweep
    /// removed every vertex at that point.
    pub fn merge_vertices(&mut self, indices: &[usize], collapse_to_first: bool) -> MeshResult<Option<usize>> {
        self.check_vertices(indices)?;
        let value = if collapse_to_first {
            self.vertices[indices[0]]
        } else {
            Vertex::average(&self.vertices, Some(indices))
        };

        let group = self.shared.merge(indices)?;
        self.shared_uv.merge(indices)?;

        let members: Vec<usize> = self.shared.positions_of(group).map(<[usize]>::to_vec).unwrap_or_default();
        for &m in &members {
            if indices.contains(&m) {
                self.vertices[m] = value;
            } else {
                self.vertices[m].position = value.position;
            }
        }

        let report = self.remove_degenerate_triangles();
        let survivor = members.iter().find_map(|&m| report.vertices.remap(m));
        tracing::debug!(merged = indices.len(), ?survivor, "merged vertices");
        Ok(survivor)
    }
}
