//! Face and vertex deletion with index compaction.

use crate::errors::{MeshError, MeshResult};
use crate::mesh::EditableMesh;
use crate::mesh::edge::Edge;
use hashbrown::HashSet;
use std::collections::BTreeSet;
use std::fmt::Debug;

/// **Index shift map**
///
/// Built once from a sorted removal list: for every old index `i`, the
/// number of removed indices below `i`. Surviving index `i` becomes
/// `i - shift(i)`. Hosts use the same map to carry selections across a
/// deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftMap {
    removed: Vec<usize>,
    offsets: Vec<usize>,
}

impl ShiftMap {
    /// `removed` may be unsorted or hold duplicates; entries `>= count` are
    /// ignored.
    pub fn new(removed: &[usize], count: usize) -> Self {
        let mut removed: Vec<usize> = removed.iter().copied().filter(|&r| r < count).collect();
        removed.sort_unstable();
        removed.dedup();
        let offsets = (0..count).map(|i| removed.partition_point(|&r| r < i)).collect();
        Self { removed, offsets }
    }

    /// Sorted, distinct removed indices.
    #[inline]
    pub fn removed(&self) -> &[usize] {
        &self.removed
    }

    /// Index count before removal.
    #[inline]
    pub fn original_len(&self) -> usize {
        self.offsets.len()
    }

    /// Index count after removal.
    #[inline]
    pub fn remaining_len(&self) -> usize {
        self.offsets.len() - self.removed.len()
    }

    /// Removed indices below `index`.
    #[inline]
    pub fn shift(&self, index: usize) -> usize {
        self.offsets.get(index).copied().unwrap_or(self.removed.len())
    }

    #[inline]
    pub fn is_removed(&self, index: usize) -> bool {
        self.removed.binary_search(&index).is_ok()
    }

    /// New position of `index`, or `None` if it was removed or out of range.
    #[inline]
    pub fn remap(&self, index: usize) -> Option<usize> {
        if index >= self.offsets.len() || self.is_removed(index) {
            None
        } else {
            Some(index - self.offsets[index])
        }
    }

    /// Remaps a selection, dropping removed entries.
    pub fn remap_indices(&self, indices: &[usize]) -> Vec<usize> {
        indices.iter().filter_map(|&i| self.remap(i)).collect()
    }

    /// Remaps an edge selection, dropping edges that lost an endpoint.
    pub fn remap_edges(&self, edges: &[Edge]) -> Vec<Edge> {
        edges.iter().filter_map(|e| Some(Edge::new(self.remap(e.a)?, self.remap(e.b)?))).collect()
    }
}

impl<S: Clone + Send + Sync + Debug> EditableMesh<S> {
    /// Every index some face uses.
    pub(crate) fn referenced_vertices(&self) -> HashSet<usize> {
        self.faces.iter().flat_map(|f| f.indices.iter().copied()).collect()
    }

    /// Splices `removed` out of the vertex buffer and both shared tables and
    /// renumbers face indices. No face may still reference a removed index.
    pub(crate) fn compact_vertices(&mut self, removed: &[usize]) -> ShiftMap {
        let shift = ShiftMap::new(removed, self.vertices.len());
        if shift.removed().is_empty() {
            return shift;
        }

        let mut cursor = 0usize;
        self.vertices.retain(|_| {
            let keep = !shift.is_removed(cursor);
            cursor += 1;
            keep
        });
        for face in &mut self.faces {
            for index in &mut face.indices {
                *index -= shift.shift(*index);
            }
        }
        self.shared = self.shared.remove_and_shift(&shift);
        self.shared_uv = self.shared_uv.remove_and_shift(&shift);
        shift
    }

    /// **Delete faces**
    ///
    /// Removes the faces and every vertex only they referenced, then renumbers
    /// the surviving faces' indices through one [`ShiftMap`]. Winding and
    /// all other attributes of surviving faces are untouched.
    ///
    /// Returns the removed vertex indices (pre-deletion numbering), sorted.
    pub fn delete_faces(&mut self, faces: &[usize]) -> MeshResult<Vec<usize>> {
        self.check_faces(faces)?;
        let doomed: BTreeSet<usize> = faces.iter().copied().collect();

        let survivors: HashSet<usize> = self
            .faces
            .iter()
            .enumerate()
            .filter(|(f, _)| !doomed.contains(f))
            .flat_map(|(_, face)| face.indices.iter().copied())
            .collect();
        let removed: Vec<usize> = doomed
            .iter()
            .flat_map(|&f| self.faces[f].distinct_indices())
            .filter(|i| !survivors.contains(i))
            .collect::<BTreeSet<usize>>()
            .into_iter()
            .collect();

        let mut f = 0usize;
        self.faces.retain(|_| {
            let keep = !doomed.contains(&f);
            f += 1;
            keep
        });
        let shift = self.compact_vertices(&removed);
        tracing::debug!(faces = doomed.len(), vertices = shift.removed().len(), "deleted faces");
        Ok(shift.removed().to_vec())
    }

    /// Deletes vertices no face references. Fails with
    /// [`MeshError::VertexInUse`] if any of them is still referenced.
    pub fn delete_vertices(&mut self, indices: &[usize]) -> MeshResult<ShiftMap> {
        self.check_vertices(indices)?;
        let referenced = self.referenced_vertices();
        if let Some(&used) = indices.iter().find(|i| referenced.contains(*i)) {
            return Err(MeshError::VertexInUse(used));
        }
        Ok(self.compact_vertices(indices))
    }

    /// Deletes every vertex no face references. Returns the removed indices.
    pub fn remove_unused_vertices(&mut self) -> Vec<usize> {
        let referenced = self.referenced_vertices();
        let unused: Vec<usize> = (0..self.vertices.len()).filter(|i| !referenced.contains(i)).collect();
        self.compact_vertices(&unused).removed().to_vec()
    }
}
