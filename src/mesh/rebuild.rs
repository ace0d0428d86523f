//! **Face-Rebuild Transaction**
//!
//! Operators never push vertices or faces straight into a mesh. They stage
//! each new polygon as a [`FaceRebuildData`] holding its own vertex list and
//! face-local indices, then hand the whole batch to [`apply`], which offsets
//! indices, appends vertices and faces, and extends the shared lookups.

use crate::mesh::face::Face;
use crate::mesh::vertex::Vertex;
use std::fmt::Debug;

/// A face that is not yet indexed into the live buffers.
#[derive(Debug, Clone)]
pub struct FaceRebuildData<S: Clone> {
    /// Indices are local to `vertices`
    pub face: Face<S>,
    pub vertices: Vec<Vertex>,
    /// Shared-group key per vertex; `None` (or a missing list) means a new,
    /// ungrouped vertex
    pub shared: Option<Vec<Option<usize>>>,
    /// UV-group key per vertex, same convention
    pub shared_uv: Option<Vec<Option<usize>>>,
    applied_offset: Option<usize>,
}

impl<S: Clone + Send + Sync + Debug> FaceRebuildData<S> {
    pub const fn new(face: Face<S>, vertices: Vec<Vertex>) -> Self {
        Self { face, vertices, shared: None, shared_uv: None, applied_offset: None }
    }

    pub fn with_shared(mut self, shared: Vec<Option<usize>>) -> Self {
        self.shared = Some(shared);
        self
    }

    pub fn with_shared_uv(mut self, shared_uv: Vec<Option<usize>>) -> Self {
        self.shared_uv = Some(shared_uv);
        self
    }

    /// Vertex-buffer offset this record was applied at, once applied.
    #[inline]
    pub const fn offset(&self) -> Option<usize> {
        self.applied_offset
    }

    /// Live index of staged vertex `local`, once applied.
    #[inline]
    pub fn live_index(&self, local: usize) -> Option<usize> {
        self.applied_offset.map(|o| o + local)
    }
}

/// Commits staged faces.
///
/// For each record, in order: the current vertex count becomes its offset,
/// its vertices are appended, one key per appended vertex is pushed onto
/// `shared` (and `shared_uv` when given), and its face, shifted by the
/// offset, is pushed onto `faces`. `shared` must hold one key per existing
/// vertex on entry and does so again on exit.
pub fn apply<S: Clone + Send + Sync + Debug>(
    pending: &mut [FaceRebuildData<S>],
    vertices: &mut Vec<Vertex>,
    faces: &mut Vec<Face<S>>,
    shared: &mut Vec<Option<usize>>,
    mut shared_uv: Option<&mut Vec<Option<usize>>>,
) {
    for data in pending.iter_mut() {
        let offset = vertices.len();
        debug_assert_eq!(shared.len(), offset, "shared lookup out of step with vertex buffer");

        for local in 0..data.vertices.len() {
            let key = data.shared.as_ref().and_then(|s| s.get(local).copied().flatten());
            shared.push(key);
            if let Some(uv) = shared_uv.as_deref_mut() {
                let key = data.shared_uv.as_ref().and_then(|s| s.get(local).copied().flatten());
                uv.push(key);
            }
        }

        vertices.extend_from_slice(&data.vertices);
        let mut face = data.face.clone();
        face.shift_indices(offset);
        faces.push(face);
        data.applied_offset = Some(offset);
    }
}

/// Fans `path` (an ordered outline) around its centroid: one triangle face
/// per outline edge. Every triangle carries the centroid plus the two edge
/// endpoints.
pub fn tent_cap_with_vertices<S: Clone + Send + Sync + Debug>(path: &[Vertex]) -> Vec<FaceRebuildData<S>> {
    let count = path.len();
    if count < 3 {
        return Vec::new();
    }
    let center = Vertex::average(path, None);
    (0..count)
        .map(|i| {
            let vertices = vec![path[i], center, path[(i + 1) % count]];
            FaceRebuildData::new(Face::new(vec![0, 1, 2]), vertices)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn staged(keys: Vec<Option<usize>>) -> FaceRebuildData<()> {
        let vertices = vec![
            Vertex::new(Point3::new(0.0, 0.0, 0.0)),
            Vertex::new(Point3::new(1.0, 0.0, 0.0)),
            Vertex::new(Point3::new(0.0, 1.0, 0.0)),
        ];
        FaceRebuildData::new(Face::new(vec![0, 1, 2]), vertices).with_shared(keys)
    }

    #[test]
    fn offsets_follow_existing_buffer_length() {
        for existing in [0usize, 3, 24] {
            let mut vertices = vec![Vertex::default(); existing];
            let mut faces: Vec<Face<()>> = Vec::new();
            let mut shared: Vec<Option<usize>> = (0..existing).map(Some).collect();

            let mut pending = vec![staged(vec![None, Some(100), None]), staged(vec![Some(100), None, None])];
            apply(&mut pending, &mut vertices, &mut faces, &mut shared, None);

            assert_eq!(pending[0].offset(), Some(existing));
            assert_eq!(pending[1].offset(), Some(existing + 3));
            assert_eq!(faces[0].indices, vec![existing, existing + 1, existing + 2]);
            assert_eq!(faces[1].indices, vec![existing + 3, existing + 4, existing + 5]);
            assert_eq!(vertices.len(), existing + 6);
            assert_eq!(shared.len(), existing + 6);
            assert_eq!(shared[existing + 1], Some(100));
            assert_eq!(shared[existing + 3], Some(100));
            assert_eq!(pending[1].live_index(2), Some(existing + 5));
        }
    }

    #[test]
    fn tent_cap_makes_one_triangle_per_side() {
        let square: Vec<Vertex> = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]
            .iter()
            .map(|&(x, y)| Vertex::new(Point3::new(x, y, 0.0)))
            .collect();
        let cap: Vec<FaceRebuildData<()>> = tent_cap_with_vertices(&square);
        assert_eq!(cap.len(), 4);
        assert!(cap.iter().all(|f| f.vertices[1].position == Point3::new(0.5, 0.5, 0.0)));
    }
}
