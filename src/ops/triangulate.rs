//! Polygon triangulation on top of `geo`'s earcut.

use crate::errors::{MeshError, MeshResult};
use crate::float_types::Real;
use crate::math::{WindingOrder, project_to_plane, winding_order};
use crate::mesh::{EditableMesh, polygon_normal};
use crate::mesh::face::Face;
use crate::mesh::rebuild::FaceRebuildData;
use crate::mesh::vertex::Vertex;
use geo::{LineString, Polygon as GeoPolygon, TriangulateEarcut, coord};
use nalgebra::{Point2, Point3, Vector3};
use std::collections::BTreeSet;
use std::fmt::Debug;

/// **Ordered contour triangulation**
///
/// Earcut over the closed contour `points`. The triangulator only ever
/// answers with indices of the input; anything else (an inserted point) is
/// rejected rather than patched. The result is turned around when its first
/// triangle winds against the contour.
pub fn triangulate_contour(points: &[Point2<Real>]) -> MeshResult<Vec<usize>> {
    let n = points.len();
    if n < 3 {
        return Err(MeshError::TooFewPoints(n));
    }
    if n == 3 {
        return Ok(vec![0, 1, 2]);
    }
    let contour = winding_order(points);
    if contour == WindingOrder::Unknown {
        return Err(MeshError::Triangulation(format!("{n}-point contour encloses no area")));
    }

    let coords: Vec<_> = points.iter().map(|p| coord! {x: p.x, y: p.y}).collect();
    let raw = GeoPolygon::new(LineString::new(coords), Vec::new()).earcut_triangles_raw();
    if raw.triangle_indices.is_empty() {
        return Err(MeshError::Triangulation(format!("no triangles for a {n}-point contour")));
    }

    let mut triangles = Vec::with_capacity(raw.triangle_indices.len());
    for &index in &raw.triangle_indices {
        // The ring is closed by repeating the first point at index n.
        let index = if index == n { 0 } else { index };
        if index > n {
            return Err(MeshError::Triangulation(format!("triangulator inserted point {index}")));
        }
        triangles.push(index);
    }

    let first = winding_order(&[points[triangles[0]], points[triangles[1]], points[triangles[2]]]);
    if first != WindingOrder::Unknown && contour != first {
        triangles.reverse();
    }
    Ok(triangles)
}

/// Triangulates points given in no particular order: they are sorted
/// counter-clockwise around their centroid first and the result is mapped
/// back to the caller's indices.
pub fn sort_and_triangulate(points: &[Point2<Real>]) -> MeshResult<Vec<usize>> {
    let n = points.len();
    if n < 3 {
        return Err(MeshError::TooFewPoints(n));
    }
    let cx = points.iter().map(|p| p.x).sum::<Real>() / n as Real;
    let cy = points.iter().map(|p| p.y).sum::<Real>() / n as Real;

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        let ta = (points[a].y - cy).atan2(points[a].x - cx);
        let tb = (points[b].y - cy).atan2(points[b].x - cx);
        ta.total_cmp(&tb)
    });
    let sorted: Vec<Point2<Real>> = order.iter().map(|&i| points[i]).collect();
    let triangles = triangulate_contour(&sorted)?;
    Ok(triangles.into_iter().map(|i| order[i]).collect())
}

/// Triangulates 3-D points after projecting them onto their best-fit plane.
pub fn triangulate_points(points: &[Point3<Real>], unordered: bool) -> MeshResult<Vec<usize>> {
    match points.len() {
        n if n < 3 => Err(MeshError::TooFewPoints(n)),
        3 => Ok(vec![0, 1, 2]),
        _ => {
            let flat = project_to_plane(points);
            if unordered { sort_and_triangulate(&flat) } else { triangulate_contour(&flat) }
        },
    }
}

/// Stages a new polygon over `vertices`.
pub fn face_with_vertices<S: Clone + Send + Sync + Debug>(
    vertices: Vec<Vertex>,
    unordered: bool,
) -> MeshResult<FaceRebuildData<S>> {
    let points: Vec<Point3<Real>> = vertices.iter().map(|v| v.position).collect();
    let triangles = triangulate_points(&points, unordered)?;
    Ok(FaceRebuildData::new(Face::new(triangles), vertices))
}

/// Stages an ordered outline as a face shaped like `template`, wound so its
/// normal agrees with `normal`.
pub(crate) fn outline_face<S: Clone + Send + Sync + Debug>(
    vertices: Vec<Vertex>,
    template: &Face<S>,
    normal: &Vector3<Real>,
) -> MeshResult<FaceRebuildData<S>> {
    let points: Vec<Point3<Real>> = vertices.iter().map(|v| v.position).collect();
    let mut triangles = triangulate_points(&points, false)?;
    if polygon_normal(&vertices, &triangles).dot(normal) < 0.0 {
        triangles.reverse();
    }
    Ok(FaceRebuildData::new(Face::with_properties_of(triangles, template), vertices))
}

impl<S: Clone + Send + Sync + Debug> EditableMesh<S> {
    /// Breaks every addressed face into one face per triangle. New vertices
    /// stay coincident (positions and UVs) with the ones they were copied
    /// from. Returns the new face indices.
    pub fn to_triangles(&mut self, faces: &[usize]) -> MeshResult<Vec<usize>> {
        self.check_faces(faces)?;
        let doomed: BTreeSet<usize> = faces.iter().copied().collect();

        let mut staged = Vec::new();
        for &f in &doomed {
            let face = &self.faces[f];
            for tri in face.triangles() {
                let vertices = tri.iter().map(|&i| self.vertices[i]).collect();
                let shared = tri.iter().map(|&i| self.shared.group(i)).collect();
                let shared_uv = tri.iter().map(|&i| self.shared_uv.group(i)).collect();
                staged.push(
                    FaceRebuildData::new(Face::with_properties_of(vec![0, 1, 2], face), vertices)
                        .with_shared(shared)
                        .with_shared_uv(shared_uv),
                );
            }
        }

        let created = self.append_faces(&mut staged);
        let doomed: Vec<usize> = doomed.into_iter().collect();
        self.delete_faces(&doomed)?;
        Ok(created.map(|f| f - doomed.len()).collect())
    }

    /// Appends a polygon spanning existing vertices. The new face gets its
    /// own vertex copies, kept coincident with the originals. Returns the new
    /// face index.
    pub fn create_polygon(&mut self, indices: &[usize], unordered: bool) -> MeshResult<usize> {
        self.check_vertices(indices)?;
        let vertices: Vec<Vertex> = indices.iter().map(|&i| self.vertices[i]).collect();
        let shared = indices.iter().map(|&i| self.shared.group(i)).collect();
        let mut staged = vec![face_with_vertices::<S>(vertices, unordered)?.with_shared(shared)];
        let created = self.append_faces(&mut staged);
        Ok(created.start)
    }
}
