//! Degenerate-triangle detection and repair.

use crate::float_types::DEGENERATE_AREA;
use crate::math::triangle_area;
use crate::mesh::EditableMesh;
use crate::mesh::face::Face;
use crate::ops::delete::ShiftMap;
use hashbrown::HashMap;
use std::fmt::Debug;

/// What a repair pass changed. Both maps are identity maps when nothing was
/// removed, so hosts can run their selections through them unconditionally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairReport {
    /// Old vertex index -> new vertex index
    pub vertices: ShiftMap,
    /// Old face index -> new face index
    pub faces: ShiftMap,
}

impl RepairReport {
    fn unchanged(vertex_count: usize, face_count: usize) -> Self {
        Self { vertices: ShiftMap::new(&[], vertex_count), faces: ShiftMap::new(&[], face_count) }
    }

    /// `true` when the mesh needed no repair.
    pub fn was_valid(&self) -> bool {
        self.vertices.removed().is_empty() && self.faces.removed().is_empty()
    }

    pub fn removed_vertex_count(&self) -> usize {
        self.vertices.removed().len()
    }

    pub fn removed_face_count(&self) -> usize {
        self.faces.removed().len()
    }
}

impl<S: Clone + Send + Sync + Debug> EditableMesh<S> {
    fn triangle_is_degenerate(&self, [a, b, c]: [usize; 3]) -> bool {
        let lookup = self.shared.lookup();
        let (ga, gb, gc) = (lookup[a], lookup[b], lookup[c]);
        if ga == gb || gb == gc || ga == gc {
            return true;
        }
        let (pa, pb, pc) = (&self.vertices[a].position, &self.vertices[b].position, &self.vertices[c].position);
        triangle_area(pa, pb, pc) <= DEGENERATE_AREA
    }

    /// True if any triangle of `face` has near-zero area or two corners in
    /// one shared group.
    pub fn face_contains_degenerate_triangles(&self, face: &Face<S>) -> bool {
        face.triangles().any(|t| self.triangle_is_degenerate(t))
    }

    pub fn contains_degenerate_triangles(&self) -> bool {
        self.faces.iter().any(|f| self.face_contains_degenerate_triangles(f))
    }

    /// **Degenerate-triangle sweep**
    ///
    /// 1. Drops every triangle that is degenerate (see
    ///    [`EditableMesh::face_contains_degenerate_triangles`]).
    /// 2. Within a face, corners that share a group collapse onto the first
    ///    index seen for that group.
    /// 3. Faces left without triangles are deleted.
    /// 4. Vertices no surviving triangle references are deleted.
    pub fn remove_degenerate_triangles(&mut self) -> RepairReport {
        let face_count = self.faces.len();
        let mut doomed_faces = Vec::new();
        let mut rebuilt: Vec<Option<Vec<usize>>> = Vec::with_capacity(face_count);

        for (f, face) in self.faces.iter().enumerate() {
            let mut first_of_group: HashMap<usize, usize> = HashMap::new();
            let mut kept = Vec::with_capacity(face.indices.len());
            for tri in face.triangles() {
                if self.triangle_is_degenerate(tri) {
                    continue;
                }
                for index in tri {
                    let group = self.shared.lookup()[index];
                    kept.push(*first_of_group.entry(group).or_insert(index));
                }
            }
            if kept.is_empty() {
                doomed_faces.push(f);
            }
            rebuilt.push(if kept == face.indices { None } else { Some(kept) });
        }

        for (face, indices) in self.faces.iter_mut().zip(rebuilt) {
            if let Some(indices) = indices {
                face.indices = indices;
            }
        }
        let faces = ShiftMap::new(&doomed_faces, face_count);
        let mut f = 0usize;
        self.faces.retain(|_| {
            let keep = !faces.is_removed(f);
            f += 1;
            keep
        });

        let vertex_count = self.vertices.len();
        let removed = self.remove_unused_vertices();
        let report = RepairReport { vertices: ShiftMap::new(&removed, vertex_count), faces };
        if !report.was_valid() {
            tracing::debug!(
                faces = report.removed_face_count(),
                vertices = report.removed_vertex_count(),
                "removed degenerate triangles"
            );
        }
        report
    }

    /// **Degenerate-check hook**
    ///
    /// Repairs the mesh if it holds degenerate triangles. The report carries
    /// the shift maps for carrying externally held vertex, edge and face
    /// selections across the repair.
    pub fn ensure_mesh_is_valid(&mut self) -> RepairReport {
        if !self.contains_degenerate_triangles() {
            return RepairReport::unchanged(self.vertices.len(), self.faces.len());
        }
        let report = self.remove_degenerate_triangles();
        tracing::warn!(
            faces = report.removed_face_count(),
            vertices = report.removed_vertex_count(),
            "mesh contained degenerate triangles and was repaired"
        );
        report
    }
}
