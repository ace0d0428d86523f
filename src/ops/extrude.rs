//! Face and edge extrusion, plus the face copy helpers built on the same
//! staging.

use crate::errors::{MeshError, MeshResult};
use crate::float_types::Real;
use crate::math::{angle_between, normalize_or_zero, secant};
use crate::mesh::EditableMesh;
use crate::mesh::edge::Edge;
use crate::mesh::face::{Face, GROUP_NONE, SMOOTHING_GROUP_NONE};
use crate::mesh::face_normal;
use crate::mesh::rebuild::FaceRebuildData;
use crate::mesh::shared::IdAllocator;
use crate::mesh::vertex::Vertex;
use hashbrown::HashMap;
use nalgebra::{Point3, Vector3};
use std::collections::BTreeSet;
use std::fmt::Debug;

/// How [`EditableMesh::extrude_faces`] moves the extruded surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtrudeMethod {
    /// Each face travels along its own normal, walled on every side
    IndividualFaces,
    /// Connected faces travel together along averaged vertex directions
    VertexNormal,
    /// As `VertexNormal`, with directions lengthened by the secant of their
    /// angle to the faces so flat regions keep the requested distance
    #[default]
    FaceNormal,
}

/// Side wall over `a -> b` rising to `a2 -> b2`; wound so its front faces
/// away from a face with normal `normal` that walks `a -> b`.
fn bridge_indices(a: &Point3<Real>, b: &Point3<Real>, a2: &Point3<Real>, normal: &Vector3<Real>) -> Vec<usize> {
    let along = b - a;
    let outward = along.cross(normal);
    let wall = along.cross(&(a2 - a));
    if wall.dot(&outward) >= 0.0 { vec![0, 1, 2, 1, 3, 2] } else { vec![2, 1, 0, 2, 3, 1] }
}

/// Bridge template: the source face's material slot, UV settings and
/// metadata, with no smoothing or texture group.
fn bridge_face<S: Clone + Send + Sync + Debug>(indices: Vec<usize>, source: &Face<S>) -> Face<S> {
    let mut face = Face::with_properties_of(indices, source);
    face.smoothing_group = SMOOTHING_GROUP_NONE;
    face.texture_group = GROUP_NONE;
    face.element_group = GROUP_NONE;
    face.manual_uv = false;
    face
}

impl<S: Clone + Send + Sync + Debug> EditableMesh<S> {
    /// **Extrude faces**
    ///
    /// Pushes `faces` out by `distance` and walls the gap with quads. With
    /// [`ExtrudeMethod::IndividualFaces`] every face moves along its own
    /// normal and gets a wall on each perimeter edge. The grouped methods
    /// move each connected island as one piece: only the island's outer
    /// perimeter gets walls, and every vertex moves along the average normal
    /// of the island faces around it.
    ///
    /// Moved vertices leave their old position and UV groups, so untouched
    /// neighbours stay where they were. Source faces lose their texture
    /// group; per-face extrusion also clears their smoothing group.
    ///
    /// Returns the indices of the new wall faces.
    pub fn extrude_faces(&mut self, faces: &[usize], method: ExtrudeMethod, distance: Real) -> MeshResult<Vec<usize>> {
        self.check_faces(faces)?;
        let faces: Vec<usize> = faces.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        let created = match method {
            ExtrudeMethod::IndividualFaces => self.extrude_individual(&faces, distance),
            ExtrudeMethod::VertexNormal => self.extrude_grouped(&faces, distance, false)?,
            ExtrudeMethod::FaceNormal => self.extrude_grouped(&faces, distance, true)?,
        };
        tracing::debug!(faces = faces.len(), walls = created.len(), ?method, "extruded faces");
        Ok(created)
    }

    fn extrude_individual(&mut self, faces: &[usize], distance: Real) -> Vec<usize> {
        let mut keys = self.shared.to_lookup();
        let mut uv_keys = self.shared_uv.to_lookup();
        let mut fresh = IdAllocator::starting_at(self.shared.len());
        let mut staged: Vec<FaceRebuildData<S>> = Vec::new();
        let mut moves: Vec<(usize, Vector3<Real>)> = Vec::new();

        for &f in faces {
            let face = &self.faces[f];
            let normal = face_normal(&self.vertices, face);
            let delta = normal * distance;

            let mut moved_keys: HashMap<usize, usize> = HashMap::new();
            for &v in &face.distinct_indices() {
                let group = self.shared.lookup()[v];
                let key = *moved_keys.entry(group).or_insert_with(|| fresh.next_id());
                keys[v] = Some(key);
                uv_keys[v] = None;
                moves.push((v, delta));
            }

            for e in face.sorted_edges() {
                let (x, y) = (self.vertices[e.a], self.vertices[e.b]);
                let (mut x2, mut y2) = (x, y);
                x2.translate(&delta);
                y2.translate(&delta);
                let (ga, gb) = (self.shared.lookup()[e.a], self.shared.lookup()[e.b]);
                let indices = bridge_indices(&x.position, &y.position, &x2.position, &normal);
                staged.push(
                    FaceRebuildData::new(bridge_face(indices, face), vec![x, y, x2, y2])
                        .with_shared(vec![Some(ga), Some(gb), Some(moved_keys[&ga]), Some(moved_keys[&gb])]),
                );
            }
        }

        for (v, delta) in moves {
            self.vertices[v].translate(&delta);
        }
        for &f in faces {
            self.faces[f].smoothing_group = SMOOTHING_GROUP_NONE;
            self.faces[f].texture_group = GROUP_NONE;
        }
        self.append_with_lookups(&mut staged, keys, uv_keys).collect()
    }

    fn extrude_grouped(&mut self, faces: &[usize], distance: Real, compensate: bool) -> MeshResult<Vec<usize>> {
        let islands = self.face_groups(faces)?;
        let normals: HashMap<usize, Vector3<Real>> =
            faces.iter().map(|&f| (f, face_normal(&self.vertices, &self.faces[f]))).collect();
        let lookup = self.shared.lookup();

        let mut keys = self.shared.to_lookup();
        let mut uv_keys = self.shared_uv.to_lookup();
        let mut fresh = IdAllocator::starting_at(self.shared.len());
        let mut staged: Vec<FaceRebuildData<S>> = Vec::new();
        let mut targets: Vec<(usize, Point3<Real>)> = Vec::new();

        for island in &islands {
            // Displacement per position group: averaged face normals, with
            // the largest secant against any adjacent face when compensating.
            let mut sums: HashMap<usize, (Vector3<Real>, usize)> = HashMap::new();
            for f in island {
                for &v in &self.faces[*f].distinct_indices() {
                    let entry = sums.entry(lookup[v]).or_insert((Vector3::zeros(), 0));
                    entry.0 += normals[f];
                    entry.1 += 1;
                }
            }
            let mut displaced: HashMap<usize, Vector3<Real>> = HashMap::new();
            for (&group, &(sum, count)) in &sums {
                let direction = normalize_or_zero(sum / count as Real);
                let mut scale = 1.0;
                if compensate {
                    for f in island {
                        if self.faces[*f].distinct_indices().iter().any(|&v| lookup[v] == group) {
                            let s = secant(angle_between(&direction, &normals[f]));
                            if s.is_finite() {
                                scale = Real::max(scale, s);
                            }
                        }
                    }
                }
                displaced.insert(group, direction * distance * scale);
            }
            let moved_keys: HashMap<usize, usize> = sums.keys().map(|&g| (g, fresh.next_id())).collect();

            for (lookup_edge, f) in self.perimeter_lookups(island) {
                let e = lookup_edge.local;
                let source = &self.faces[f];
                let (x, y) = (self.vertices[e.a], self.vertices[e.b]);
                let (ga, gb) = (lookup[e.a], lookup[e.b]);
                let (mut x2, mut y2) = (x, y);
                x2.translate(&displaced[&ga]);
                y2.translate(&displaced[&gb]);
                let indices = bridge_indices(&x.position, &y.position, &x2.position, &normals[&f]);
                staged.push(
                    FaceRebuildData::new(bridge_face(indices, source), vec![x, y, x2, y2])
                        .with_shared(vec![Some(ga), Some(gb), Some(moved_keys[&ga]), Some(moved_keys[&gb])]),
                );
            }

            for f in island {
                for &v in &self.faces[*f].distinct_indices() {
                    let group = lookup[v];
                    keys[v] = Some(moved_keys[&group]);
                    uv_keys[v] = None;
                    targets.push((v, self.vertices[v].position + displaced[&group]));
                }
            }
        }

        for (v, position) in targets {
            self.vertices[v].position = position;
        }
        for &f in faces {
            self.faces[f].texture_group = GROUP_NONE;
        }
        Ok(self.append_with_lookups(&mut staged, keys, uv_keys).collect())
    }

    /// **Extrude edges**
    ///
    /// Grows a quad out of each edge in `edges`. Only open edges qualify
    /// unless `allow_manifold` is set. Each end moves `distance` along its
    /// vertex normal, or the owning face's normal when the vertex has none.
    /// With `as_group`, edges meeting at a position share the new vertex
    /// there, moved along the averaged direction.
    ///
    /// Returns the new face indices.
    pub fn extrude_edges(
        &mut self,
        edges: &[Edge],
        distance: Real,
        as_group: bool,
        allow_manifold: bool,
    ) -> MeshResult<Vec<usize>> {
        if edges.is_empty() {
            return Err(MeshError::EmptyInput("edges"));
        }
        let lookup = self.shared.lookup();

        // Owning face and use count per common edge.
        let mut owners: HashMap<Edge, usize> = HashMap::new();
        let mut uses: HashMap<Edge, usize> = HashMap::new();
        for (f, face) in self.faces.iter().enumerate() {
            for e in face.sorted_edges() {
                let common = Edge::new(lookup[e.a], lookup[e.b]).normalized();
                *uses.entry(common).or_insert(0) += 1;
                owners.insert(e.normalized(), f);
            }
        }

        let mut selected: Vec<(Edge, usize)> = Vec::new();
        for &e in edges {
            self.check_vertices(&[e.a, e.b])?;
            let &f = owners.get(&e.normalized()).ok_or(MeshError::NotAnEdge(e))?;
            let common = Edge::new(lookup[e.a], lookup[e.b]).normalized();
            if allow_manifold || uses.get(&common) == Some(&1) {
                // Walk direction as the owning face has it.
                let walked = self.faces[f].sorted_edges().into_iter().find(|w| w.same(&e)).unwrap_or(e);
                selected.push((walked, f));
            }
        }
        if selected.is_empty() {
            return Err(MeshError::InvalidArgument("no open edges to extrude".into()));
        }

        let direction_of = |v: usize, f: usize| -> Vector3<Real> {
            match self.vertices[v].normal {
                Some(n) if n.norm_squared() > 0.0 => n.normalize(),
                _ => face_normal(&self.vertices, &self.faces[f]),
            }
        };
        let mut group_dirs: HashMap<usize, Vector3<Real>> = HashMap::new();
        if as_group {
            for &(e, f) in &selected {
                for v in [e.a, e.b] {
                    *group_dirs.entry(lookup[v]).or_insert_with(Vector3::zeros) += direction_of(v, f);
                }
            }
        }

        let mut fresh = IdAllocator::starting_at(self.shared.len());
        let mut group_keys: HashMap<usize, usize> = HashMap::new();
        let mut staged: Vec<FaceRebuildData<S>> = Vec::new();
        for &(e, f) in &selected {
            let (ga, gb) = (lookup[e.a], lookup[e.b]);
            let mut lifted = |v: usize, group: usize| -> (Vertex, usize) {
                let mut copy = self.vertices[v];
                if as_group {
                    copy.translate(&(normalize_or_zero(group_dirs[&group]) * distance));
                    (copy, *group_keys.entry(group).or_insert_with(|| fresh.next_id()))
                } else {
                    copy.translate(&(direction_of(v, f) * distance));
                    (copy, fresh.next_id())
                }
            };
            let (x2, ka) = lifted(e.a, ga);
            let (y2, kb) = lifted(e.b, gb);
            let vertices = vec![self.vertices[e.a], self.vertices[e.b], x2, y2];
            // The new quad walks the edge opposite to its owner.
            let face = Face::with_properties_of(vec![1, 0, 2, 1, 2, 3], &self.faces[f]);
            staged.push(FaceRebuildData::new(face, vertices).with_shared(vec![Some(ga), Some(gb), Some(ka), Some(kb)]));
        }

        let created: Vec<usize> = self.append_faces(&mut staged).collect();
        tracing::debug!(edges = selected.len(), "extruded edges");
        Ok(created)
    }

    /// Copies `faces` onto new vertices that form their own position and UV
    /// groups (shared among the copies only). With `delete_source` the
    /// originals are removed. Returns the indices of the copies.
    pub fn detach_faces(&mut self, faces: &[usize], delete_source: bool) -> MeshResult<Vec<usize>> {
        self.check_faces(faces)?;
        let faces: Vec<usize> = faces.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        let mut fresh = IdAllocator::starting_at(self.shared.len());
        let mut fresh_uv = IdAllocator::starting_at(self.shared_uv.len());
        let mut keys: HashMap<usize, usize> = HashMap::new();
        let mut uv_keys: HashMap<usize, usize> = HashMap::new();

        let mut staged = Vec::with_capacity(faces.len());
        for &f in &faces {
            let (data, corners) = self.stage_copy(f);
            let shared = corners
                .iter()
                .map(|&v| Some(*keys.entry(self.shared.lookup()[v]).or_insert_with(|| fresh.next_id())))
                .collect();
            let shared_uv = corners
                .iter()
                .map(|&v| Some(*uv_keys.entry(self.shared_uv.lookup()[v]).or_insert_with(|| fresh_uv.next_id())))
                .collect();
            staged.push(data.with_shared(shared).with_shared_uv(shared_uv));
        }

        let created = self.append_faces(&mut staged);
        if !delete_source {
            return Ok(created.collect());
        }
        self.delete_faces(&faces)?;
        Ok(created.map(|f| f - faces.len()).collect())
    }

    /// Appends reversed copies of `faces`, coincident with the originals.
    /// Returns the indices of the copies.
    pub fn duplicate_and_flip(&mut self, faces: &[usize]) -> MeshResult<Vec<usize>> {
        self.check_faces(faces)?;
        let mut staged = Vec::with_capacity(faces.len());
        for &f in faces {
            let (mut data, corners) = self.stage_copy(f);
            data.face.reverse();
            let shared = corners.iter().map(|&v| self.shared.group(v)).collect();
            let shared_uv = corners.iter().map(|&v| self.shared_uv.group(v)).collect();
            staged.push(data.with_shared(shared).with_shared_uv(shared_uv));
        }
        Ok(self.append_faces(&mut staged).collect())
    }

    /// Stages face `f` over copies of its vertices; also returns the source
    /// vertex of each copy.
    fn stage_copy(&self, f: usize) -> (FaceRebuildData<S>, Vec<usize>) {
        let face = &self.faces[f];
        let corners = face.distinct_indices();
        let local: HashMap<usize, usize> = corners.iter().enumerate().map(|(i, &v)| (v, i)).collect();
        let indices = face.indices.iter().map(|v| local[v]).collect();
        let vertices = corners.iter().map(|&v| self.vertices[v]).collect();
        (FaceRebuildData::new(Face::with_properties_of(indices, face), vertices), corners)
    }
}
