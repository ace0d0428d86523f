//! Edges in local (vertex index) and common (shared group) form.

use crate::mesh::shared::SharedVertexTable;
use std::hash::{Hash, Hasher};

/// A directed pair of indices. Direction matters for winding; equality as an
/// undirected edge goes through [`Edge::normalized`] or [`Edge::same`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
}

impl Edge {
    #[inline]
    pub const fn new(a: usize, b: usize) -> Self {
        Self { a, b }
    }

    /// Same edge walked the other way.
    #[inline]
    pub const fn reversed(&self) -> Self {
        Self { a: self.b, b: self.a }
    }

    /// Canonical undirected form with `a <= b`.
    #[inline]
    pub const fn normalized(&self) -> Self {
        if self.a <= self.b { *self } else { self.reversed() }
    }

    /// Undirected equality.
    #[inline]
    pub const fn same(&self, other: &Edge) -> bool {
        (self.a == other.a && self.b == other.b) || (self.a == other.b && self.b == other.a)
    }

    #[inline]
    pub const fn contains(&self, index: usize) -> bool {
        self.a == index || self.b == index
    }

    /// True if the two edges share at least one endpoint.
    #[inline]
    pub const fn touches(&self, other: &Edge) -> bool {
        self.contains(other.a) || self.contains(other.b)
    }

    /// Maps both endpoints through the shared-vertex table.
    pub fn to_common(&self, shared: &SharedVertexTable) -> Option<Edge> {
        Some(Edge::new(shared.group(self.a)?, shared.group(self.b)?))
    }
}

impl From<(usize, usize)> for Edge {
    fn from((a, b): (usize, usize)) -> Self {
        Edge::new(a, b)
    }
}

/// An edge in both forms: `local` indexes the vertex buffer, `common` indexes
/// shared-vertex groups. Equality and hashing consider only the undirected
/// common edge, so the two sides of a seam compare equal.
#[derive(Debug, Clone, Copy)]
pub struct EdgeLookup {
    pub local: Edge,
    pub common: Edge,
}

impl EdgeLookup {
    pub const fn new(common: Edge, local: Edge) -> Self {
        Self { local, common }
    }

    /// Builds lookups for `edges` (local form). Edges touching a vertex the
    /// table does not know are skipped.
    pub fn from_edges<'a>(edges: impl IntoIterator<Item = &'a Edge>, shared: &SharedVertexTable) -> Vec<EdgeLookup> {
        edges
            .into_iter()
            .filter_map(|e| e.to_common(shared).map(|common| EdgeLookup::new(common, *e)))
            .collect()
    }
}

impl PartialEq for EdgeLookup {
    fn eq(&self, other: &Self) -> bool {
        self.common.normalized() == other.common.normalized()
    }
}

impl Eq for EdgeLookup {}

impl Hash for EdgeLookup {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.common.normalized().hash(state);
    }
}
