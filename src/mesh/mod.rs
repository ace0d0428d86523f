//! `EditableMesh`: the vertex buffer, its faces and the two shared-vertex
//! tables that every topology operator keeps consistent.

use crate::errors::{MeshError, MeshResult};
use crate::float_types::Real;
use crate::math::{best_fit_normal, normalize_or_zero, triangle_normal};
use crate::traits::MeshSink;
use hashbrown::HashMap;
use nalgebra::{Point3, Vector3};
use std::fmt::Debug;
use std::ops::Range;

pub mod edge;
pub mod face;
pub mod rebuild;
pub mod shared;
pub mod vertex;
pub mod winged_edge;

use face::Face;
use rebuild::FaceRebuildData;
use shared::SharedVertexTable;
use vertex::Vertex;

/// An editable polygon mesh.
///
/// Invariants kept by every operator:
/// - each face holds whole triangles and only in-range indices
/// - a vertex index is used by at most one face
/// - both shared tables cover exactly `vertices.len()` vertices with dense ids
#[derive(Debug, Clone)]
pub struct EditableMesh<S: Clone + Send + Sync + Debug> {
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) faces: Vec<Face<S>>,
    /// Coincident positions
    pub(crate) shared: SharedVertexTable,
    /// Coincident UVs (seams)
    pub(crate) shared_uv: SharedVertexTable,
}

impl<S: Clone + Send + Sync + Debug> Default for EditableMesh<S> {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
            shared: SharedVertexTable::default(),
            shared_uv: SharedVertexTable::default(),
        }
    }
}

/// Read-only view handed to a [`MeshSink`] on commit.
#[derive(Debug, Clone, Copy)]
pub struct MeshSnapshot<'a, S: Clone> {
    pub vertices: &'a [Vertex],
    pub faces: &'a [Face<S>],
    pub shared: &'a SharedVertexTable,
    pub shared_uv: &'a SharedVertexTable,
}

/// Triangle indices of every face using one material slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submesh {
    pub submesh_index: usize,
    pub indices: Vec<usize>,
}

/// Unit normal of a face: the first triangle's normal, or for larger
/// polygons the best-fit plane normal turned to agree with it.
pub fn face_normal<S: Clone + Send + Sync + Debug>(vertices: &[Vertex], face: &Face<S>) -> Vector3<Real> {
    let Some([a, b, c]) = face.triangles().next() else {
        return Vector3::zeros();
    };
    let (Some(a), Some(b), Some(c)) = (vertices.get(a), vertices.get(b), vertices.get(c)) else {
        return Vector3::zeros();
    };
    let first = triangle_normal(&a.position, &b.position, &c.position);
    if face.indices.len() <= 6 {
        return first;
    }
    let points: Vec<Point3<Real>> =
        face.distinct_indices().iter().filter_map(|&i| vertices.get(i)).map(|v| v.position).collect();
    let fit = best_fit_normal(&points);
    if fit.dot(&first) < 0.0 { -fit } else { fit }
}

/// Normalized sum of the triangle normals of a triangle list.
pub fn polygon_normal(vertices: &[Vertex], triangles: &[usize]) -> Vector3<Real> {
    let mut sum = Vector3::zeros();
    for t in triangles.chunks_exact(3) {
        if let (Some(a), Some(b), Some(c)) = (vertices.get(t[0]), vertices.get(t[1]), vertices.get(t[2])) {
            sum += triangle_normal(&a.position, &b.position, &c.position);
        }
    }
    normalize_or_zero(sum)
}

impl<S: Clone + Send + Sync + Debug> EditableMesh<S> {
    /// **Import**
    ///
    /// Takes ownership of a vertex buffer and faces. `shared` is an optional
    /// precomputed position grouping; without it coincident positions are
    /// grouped automatically.
    ///
    /// A vertex referenced by several faces is duplicated so every face owns
    /// its vertices; the copies join the original's position and UV groups.
    pub fn new(mut vertices: Vec<Vertex>, mut faces: Vec<Face<S>>, shared: Option<Vec<Vec<usize>>>) -> MeshResult<Self> {
        let count = vertices.len();
        for (f, face) in faces.iter().enumerate() {
            if !face.is_valid() {
                return Err(MeshError::MalformedFace { face: f, len: face.indices.len() });
            }
            if let Some(&index) = face.indices.iter().find(|&&i| i >= count) {
                return Err(MeshError::IndexOutOfRange { index, count });
            }
        }

        let table = match shared {
            Some(groups) => SharedVertexTable::from_groups(groups, count)?,
            None => SharedVertexTable::from_positions(vertices.iter().map(|v| &v.position)),
        };

        let mut keys = table.to_lookup();
        let mut uv_keys: Vec<Option<usize>> = (0..count).map(Some).collect();
        let mut owner: Vec<Option<usize>> = vec![None; count];
        let mut duplicated = 0usize;

        for (f, face) in faces.iter_mut().enumerate() {
            let mut copies: HashMap<usize, usize> = HashMap::new();
            for index in face.indices.iter_mut() {
                match owner[*index] {
                    None => owner[*index] = Some(f),
                    Some(o) if o == f => {},
                    Some(_) => {
                        let original = *index;
                        *index = *copies.entry(original).or_insert_with(|| {
                            vertices.push(vertices[original]);
                            keys.push(keys[original]);
                            uv_keys.push(uv_keys[original]);
                            owner.push(Some(f));
                            duplicated += 1;
                            vertices.len() - 1
                        });
                    },
                }
            }
        }
        if duplicated > 0 {
            tracing::debug!(duplicated, "split vertices shared between faces on import");
        }

        Ok(Self {
            shared: SharedVertexTable::from_lookup(&keys),
            shared_uv: SharedVertexTable::from_lookup(&uv_keys),
            vertices,
            faces,
        })
    }

    /// Import from bare positions.
    pub fn from_positions(positions: &[Point3<Real>], faces: Vec<Face<S>>) -> MeshResult<Self> {
        Self::new(positions.iter().copied().map(Vertex::new).collect(), faces, None)
    }

    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[inline]
    pub fn faces(&self) -> &[Face<S>] {
        &self.faces
    }

    #[inline]
    pub fn face(&self, index: usize) -> Option<&Face<S>> {
        self.faces.get(index)
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Position groups.
    #[inline]
    pub fn shared_vertices(&self) -> &SharedVertexTable {
        &self.shared
    }

    /// UV groups.
    #[inline]
    pub fn shared_textures(&self) -> &SharedVertexTable {
        &self.shared_uv
    }

    pub fn positions(&self) -> impl Iterator<Item = &Point3<Real>> {
        self.vertices.iter().map(|v| &v.position)
    }

    /// Host metadata of a face; the only face field a host may change in place.
    pub fn set_face_metadata(&mut self, face: usize, metadata: Option<S>) -> MeshResult<()> {
        let count = self.faces.len();
        let f = self.faces.get_mut(face).ok_or(MeshError::FaceOutOfRange { index: face, count })?;
        f.metadata = metadata;
        Ok(())
    }

    pub(crate) fn check_faces(&self, faces: &[usize]) -> MeshResult<()> {
        if faces.is_empty() {
            return Err(MeshError::EmptyInput("faces"));
        }
        match faces.iter().find(|&&f| f >= self.faces.len()) {
            Some(&index) => Err(MeshError::FaceOutOfRange { index, count: self.faces.len() }),
            None => Ok(()),
        }
    }

    pub(crate) fn check_vertices(&self, indices: &[usize]) -> MeshResult<()> {
        if indices.is_empty() {
            return Err(MeshError::EmptyInput("vertex indices"));
        }
        match indices.iter().find(|&&i| i >= self.vertices.len()) {
            Some(&index) => Err(MeshError::IndexOutOfRange { index, count: self.vertices.len() }),
            None => Ok(()),
        }
    }

    /// Checks index consistency and shared-table totality.
    pub fn validate(&self) -> MeshResult<()> {
        let count = self.vertices.len();
        for (f, face) in self.faces.iter().enumerate() {
            if !face.is_valid() {
                return Err(MeshError::MalformedFace { face: f, len: face.indices.len() });
            }
            if let Some(&index) = face.indices.iter().find(|&&i| i >= count) {
                return Err(MeshError::IndexOutOfRange { index, count });
            }
        }
        self.shared.validate(count)?;
        self.shared_uv.validate(count)
    }

    /// Normal of face `face`.
    pub fn face_normal(&self, face: usize) -> MeshResult<Vector3<Real>> {
        let f = self.faces.get(face).ok_or(MeshError::FaceOutOfRange { index: face, count: self.faces.len() })?;
        Ok(face_normal(&self.vertices, f))
    }

    /// Moves every vertex coincident with any of `indices` by `delta`.
    pub fn translate_vertices(&mut self, indices: &[usize], delta: Vector3<Real>) -> MeshResult<()> {
        self.check_vertices(indices)?;
        for group in self.shared.common_indices(indices) {
            for &member in self.shared.positions_of(group).unwrap_or(&[]) {
                self.vertices[member].translate(&delta);
            }
        }
        Ok(())
    }

    /// Places vertex `index` and all its coincident twins at `position`.
    pub fn set_shared_position(&mut self, index: usize, position: Point3<Real>) -> MeshResult<()> {
        self.check_vertices(&[index])?;
        for &member in self.shared.coincident(index) {
            self.vertices[member].position = position;
        }
        Ok(())
    }

    /// Commits staged faces and returns the range of new face indices.
    pub fn append_faces(&mut self, pending: &mut [FaceRebuildData<S>]) -> Range<usize> {
        let (keys, uv_keys) = (self.shared.to_lookup(), self.shared_uv.to_lookup());
        self.append_with_lookups(pending, keys, uv_keys)
    }

    /// Commits staged faces against caller-edited lookups of the current
    /// vertices, so existing vertices can be re-keyed in the same pass.
    /// Fresh keys must not collide with ids the caller did not mean to join.
    pub(crate) fn append_with_lookups(
        &mut self,
        pending: &mut [FaceRebuildData<S>],
        mut keys: Vec<Option<usize>>,
        mut uv_keys: Vec<Option<usize>>,
    ) -> Range<usize> {
        let first = self.faces.len();
        rebuild::apply(pending, &mut self.vertices, &mut self.faces, &mut keys, Some(&mut uv_keys));
        self.shared = SharedVertexTable::from_lookup(&keys);
        self.shared_uv = SharedVertexTable::from_lookup(&uv_keys);
        first..self.faces.len()
    }

    /// Regroups positions from scratch. UV groups are left alone.
    pub(crate) fn rebuild_shared_from_positions(&mut self) {
        self.shared = SharedVertexTable::from_positions(self.vertices.iter().map(|v| &v.position));
    }

    pub fn snapshot(&self) -> MeshSnapshot<'_, S> {
        MeshSnapshot {
            vertices: &self.vertices,
            faces: &self.faces,
            shared: &self.shared,
            shared_uv: &self.shared_uv,
        }
    }

    /// Hands a snapshot to the host's renderable resource.
    pub fn commit<K: MeshSink<S>>(&self, sink: &mut K) -> Result<(), K::Error> {
        sink.upload(self.snapshot())
    }

    /// Triangle indices grouped by material slot, ascending by slot.
    pub fn submeshes(&self) -> Vec<Submesh> {
        let mut by_slot: std::collections::BTreeMap<usize, Vec<usize>> = Default::default();
        for face in &self.faces {
            by_slot.entry(face.submesh_index).or_default().extend_from_slice(&face.indices);
        }
        by_slot.into_iter().map(|(submesh_index, indices)| Submesh { submesh_index, indices }).collect()
    }
}
