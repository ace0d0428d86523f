//! Severing vertices from their coincident twins.

use crate::errors::MeshResult;
use crate::mesh::EditableMesh;
use crate::mesh::edge::Edge;
use std::fmt::Debug;

impl<S: Clone + Send + Sync + Debug> EditableMesh<S> {
    /// Split-common: every group touched by `indices` is atomized, so each
    /// of its members can move on its own.
    pub fn split_common_vertices(&mut self, indices: &[usize]) -> MeshResult<()> {
        self.check_vertices(indices)?;
        self.shared.split_common(indices)
    }

    /// Split-selected: only `indices` leave their groups; the remaining
    /// members stay together.
    pub fn split_vertices(&mut self, indices: &[usize]) -> MeshResult<()> {
        self.check_vertices(indices)?;
        self.shared.split(indices)
    }

    /// Splits both endpoints of each edge from their twins.
    pub fn split_edges(&mut self, edges: &[Edge]) -> MeshResult<()> {
        let indices: Vec<usize> = edges.iter().flat_map(|e| [e.a, e.b]).collect();
        self.split_vertices(&indices)
    }
}
