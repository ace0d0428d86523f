//! Faces: triangle index lists plus the material and UV metadata that rides
//! along through every rebuild.

use crate::float_types::Real;
use crate::mesh::edge::Edge;
use crate::mesh::winged_edge::sort_edges_by_adjacency;
use hashbrown::HashMap;
use nalgebra::Vector2;
use std::fmt::Debug;

/// Smoothing group id meaning "hard edges all around".
pub const SMOOTHING_GROUP_NONE: i32 = 0;

/// Texture/element group id meaning "not grouped".
pub const GROUP_NONE: i32 = -1;

/// How an automatic UV projection fills the unit square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UvFill {
    Fit,
    #[default]
    Tile,
    Stretch,
}

/// Automatic UV projection parameters. The kernel never evaluates these; it
/// only carries them from source faces onto the faces built from them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvSettings {
    pub use_world_space: bool,
    pub flip_u: bool,
    pub flip_v: bool,
    pub swap_uv: bool,
    pub fill: UvFill,
    pub scale: Vector2<Real>,
    pub offset: Vector2<Real>,
    /// Degrees
    pub rotation: Real,
}

impl Default for UvSettings {
    fn default() -> Self {
        Self {
            use_world_space: false,
            flip_u: false,
            flip_v: false,
            swap_uv: false,
            fill: UvFill::Tile,
            scale: Vector2::new(1.0, 1.0),
            offset: Vector2::zeros(),
            rotation: 0.0,
        }
    }
}

/// A polygon stored as triangles over the vertex buffer.
/// - `S` is the generic host metadata type, stored as `Option<S>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Face<S: Clone> {
    /// Triangle list; the length is a multiple of 3
    pub indices: Vec<usize>,
    /// Material slot
    pub submesh_index: usize,
    pub uv: UvSettings,
    pub smoothing_group: i32,
    pub texture_group: i32,
    pub element_group: i32,
    /// `true` once UVs were edited by hand and must not be re-projected
    pub manual_uv: bool,
    pub metadata: Option<S>,
}

impl<S: Clone + Send + Sync + Debug> Face<S> {
    pub fn new(indices: Vec<usize>) -> Self {
        Self {
            indices,
            submesh_index: 0,
            uv: UvSettings::default(),
            smoothing_group: SMOOTHING_GROUP_NONE,
            texture_group: GROUP_NONE,
            element_group: GROUP_NONE,
            manual_uv: false,
            metadata: None,
        }
    }

    pub fn with_metadata(indices: Vec<usize>, metadata: Option<S>) -> Self {
        Self { metadata, ..Self::new(indices) }
    }

    /// A new face over `indices` carrying every property of `template`.
    pub fn with_properties_of(indices: Vec<usize>, template: &Face<S>) -> Self {
        Self { indices, ..template.clone() }
    }

    /// Copies material, UV, group and metadata fields; indices are untouched.
    pub fn copy_properties_from(&mut self, other: &Face<S>) {
        self.submesh_index = other.submesh_index;
        self.uv = other.uv;
        self.smoothing_group = other.smoothing_group;
        self.texture_group = other.texture_group;
        self.element_group = other.element_group;
        self.manual_uv = other.manual_uv;
        self.metadata = other.metadata.clone();
    }

    /// Non-empty and made of whole triangles.
    #[inline]
    pub fn is_valid(&self) -> bool {
        !self.indices.is_empty() && self.indices.len() % 3 == 0
    }

    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    /// Deduplicated indices in order of first appearance.
    pub fn distinct_indices(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.indices.len());
        for &i in &self.indices {
            if !out.contains(&i) {
                out.push(i);
            }
        }
        out
    }

    /// **Perimeter edges**
    ///
    /// Triangle edges that occur exactly once (compared undirected) lie on the
    /// boundary. They keep the direction of the triangle they came from, so
    /// they follow the face winding, but come out in triangle order rather
    /// than walk order; see [`Face::sorted_edges`].
    pub fn edges(&self) -> Vec<Edge> {
        let mut count: HashMap<Edge, usize> = HashMap::with_capacity(self.indices.len());
        let directed: Vec<Edge> = self
            .triangles()
            .flat_map(|[a, b, c]| [Edge::new(a, b), Edge::new(b, c), Edge::new(c, a)])
            .collect();
        for e in &directed {
            *count.entry(e.normalized()).or_insert(0) += 1;
        }
        directed.into_iter().filter(|e| count.get(&e.normalized()) == Some(&1)).collect()
    }

    /// Perimeter edges in walk order: `edges[i].b == edges[i + 1].a`.
    pub fn sorted_edges(&self) -> Vec<Edge> {
        let mut edges = self.edges();
        sort_edges_by_adjacency(&mut edges);
        edges
    }

    /// Flips the winding, and with it the normal.
    pub fn reverse(&mut self) {
        self.indices.reverse();
    }

    /// Adds `offset` to every index.
    pub fn shift_indices(&mut self, offset: usize) {
        for i in &mut self.indices {
            *i += offset;
        }
    }

    /// The four corners of a two-triangle quad in perimeter order.
    pub fn to_quad(&self) -> Option<[usize; 4]> {
        if self.indices.len() != 6 {
            return None;
        }
        let edges = self.sorted_edges();
        if edges.len() != 4 {
            return None;
        }
        Some([edges[0].a, edges[1].a, edges[2].a, edges[3].a])
    }
}
