//! Topology queries over face sets: islands, flood selection, perimeters.

use crate::errors::MeshResult;
use crate::float_types::Real;
use crate::math::angle_between;
use crate::mesh::EditableMesh;
use crate::mesh::edge::{Edge, EdgeLookup};
use crate::mesh::face_normal;
use crate::mesh::winged_edge::WingedEdgeGraph;
use hashbrown::HashMap;
use std::collections::BTreeSet;
use std::fmt::Debug;

impl<S: Clone + Send + Sync + Debug> EditableMesh<S> {
    /// Islands of `faces` connected through shared perimeter edges.
    pub fn face_groups(&self, faces: &[usize]) -> MeshResult<Vec<Vec<usize>>> {
        self.check_faces(faces)?;
        Ok(WingedEdgeGraph::build_for(&self.faces, faces.iter().copied(), &self.shared).face_groups())
    }

    /// Grows `faces` across shared edges while the angle between neighbouring
    /// face normals stays at or under `max_angle_degrees`. A negative limit
    /// floods whole connected pieces.
    pub fn flood_selection(&self, faces: &[usize], max_angle_degrees: Real) -> MeshResult<Vec<usize>> {
        self.check_faces(faces)?;
        let graph = WingedEdgeGraph::build(&self.faces, &self.shared);
        let normals: Vec<_> = self.faces.iter().map(|f| face_normal(&self.vertices, f)).collect();
        let limit = max_angle_degrees.to_radians();

        let mut selected: BTreeSet<usize> = faces.iter().copied().collect();
        for &seed in faces {
            let reached = graph.flood(seed, |from, to| {
                max_angle_degrees < 0.0
                    || angle_between(&normals[graph[from].face], &normals[graph[to].face]) <= limit
            });
            selected.extend(reached);
        }
        Ok(selected.into_iter().collect())
    }

    /// Perimeter edges of `faces` with the face each belongs to: edges whose
    /// common form occurs exactly once inside the set. Keeps face order and
    /// the owning face's winding.
    pub(crate) fn perimeter_lookups(&self, faces: &[usize]) -> Vec<(EdgeLookup, usize)> {
        let mut all: Vec<(EdgeLookup, usize)> = Vec::new();
        let mut count: HashMap<EdgeLookup, usize> = HashMap::new();
        for &f in faces.iter().collect::<BTreeSet<_>>() {
            for local in self.faces[f].sorted_edges() {
                let Some(common) = local.to_common(&self.shared) else { continue };
                let lookup = EdgeLookup::new(common, local);
                *count.entry(lookup).or_insert(0) += 1;
                all.push((lookup, f));
            }
        }
        all.retain(|(lookup, _)| count.get(lookup) == Some(&1));
        all
    }

    /// Local perimeter edges of a face set.
    pub fn perimeter_edges(&self, faces: &[usize]) -> MeshResult<Vec<Edge>> {
        self.check_faces(faces)?;
        Ok(self.perimeter_lookups(faces).into_iter().map(|(l, _)| l.local).collect())
    }

    /// Faces whose perimeter holds `edge` (compared through shared groups).
    pub fn neighbor_faces(&self, edge: Edge) -> MeshResult<Vec<usize>> {
        self.check_vertices(&[edge.a, edge.b])?;
        let Some(common) = edge.to_common(&self.shared) else { return Ok(Vec::new()) };
        let wanted = EdgeLookup::new(common, edge);
        Ok(self
            .faces
            .iter()
            .enumerate()
            .filter(|(_, face)| {
                face.edges().iter().any(|e| e.to_common(&self.shared).is_some_and(|c| EdgeLookup::new(c, *e) == wanted))
            })
            .map(|(f, _)| f)
            .collect())
    }
}
