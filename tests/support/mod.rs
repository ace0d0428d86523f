//! Test support library
//! Provides mesh builders and invariant checks shared by the integration tests.
#![allow(dead_code)]

use nalgebra::Point3;
use polyedit::{
    EditableMesh, Face,
    float_types::Real,
    mesh::winged_edge::WingedEdgeGraph,
};

/// Quick helper to compare floating-point results with an acceptable tolerance.
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

/// Two triangles covering quad `[a, b, c, d]`, same winding.
pub fn quad(a: usize, b: usize, c: usize, d: usize) -> Face<()> {
    Face::new(vec![a, b, c, a, c, d])
}

/// Corner positions of the unit cube `[0, 1]^3`.
pub fn cube_positions() -> Vec<Point3<Real>> {
    vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(1.0, 0.0, 1.0),
        Point3::new(1.0, 1.0, 1.0),
        Point3::new(0.0, 1.0, 1.0),
    ]
}

/// Quads of the unit cube, wound counter-clockwise seen from outside:
/// bottom, top, front (-y), back (+y), left (-x), right (+x).
pub fn cube_quads() -> Vec<Face<()>> {
    vec![
        quad(0, 3, 2, 1),
        quad(4, 5, 6, 7),
        quad(0, 1, 5, 4),
        quad(3, 7, 6, 2),
        quad(0, 4, 7, 3),
        quad(1, 2, 6, 5),
    ]
}

/// Unit cube with 8 shared positions and 6 quads (24 vertices after import).
pub fn unit_cube() -> EditableMesh<()> {
    EditableMesh::from_positions(&cube_positions(), cube_quads()).expect("cube imports")
}

/// Unit cube without its top face.
pub fn open_box() -> EditableMesh<()> {
    let mut faces = cube_quads();
    faces.remove(1);
    EditableMesh::from_positions(&cube_positions(), faces).expect("box imports")
}

/// Flat `n x n` grid of unit quads in the z = 0 plane, facing +z.
pub fn grid(n: usize) -> EditableMesh<()> {
    scaled_grid(n, 1.0)
}

/// Flat `n x n` grid of square quads with side `step`, facing +z.
pub fn scaled_grid(n: usize, step: Real) -> EditableMesh<()> {
    let mut positions = Vec::with_capacity((n + 1) * (n + 1));
    for y in 0..=n {
        for x in 0..=n {
            positions.push(Point3::new(x as Real * step, y as Real * step, 0.0));
        }
    }
    let row = n + 1;
    let mut faces = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            let i = y * row + x;
            faces.push(quad(i, i + 1, i + 1 + row, i + row));
        }
    }
    EditableMesh::from_positions(&positions, faces).expect("grid imports")
}

/// Index of the vertex of `face` sitting at `position`.
pub fn corner_at(mesh: &EditableMesh<()>, face: usize, position: [Real; 3]) -> usize {
    let target = Point3::new(position[0], position[1], position[2]);
    mesh.faces()[face]
        .distinct_indices()
        .into_iter()
        .find(|&i| (mesh.vertices()[i].position - target).norm() < 1e-9)
        .expect("face has a corner at that position")
}

/// Face index whose normal points along `direction` (the first match).
pub fn face_facing(mesh: &EditableMesh<()>, direction: [Real; 3]) -> usize {
    let dir = nalgebra::Vector3::new(direction[0], direction[1], direction[2]);
    (0..mesh.face_count())
        .find(|&f| mesh.face_normal(f).expect("in range").dot(&dir) > 0.99)
        .expect("a face points that way")
}

/// Sum of triangle areas over every face.
pub fn surface_area(mesh: &EditableMesh<()>) -> Real {
    let v = mesh.vertices();
    mesh.faces()
        .iter()
        .flat_map(|f| f.triangles())
        .map(|[a, b, c]| polyedit::math::triangle_area(&v[a].position, &v[b].position, &v[c].position))
        .sum()
}

/// Index consistency, shared-table totality and winged-edge symmetry.
pub fn assert_invariants(mesh: &EditableMesh<()>) {
    mesh.validate().expect("mesh validates");
    let count = mesh.vertex_count();
    assert_eq!(mesh.shared_vertices().vertex_count(), count, "position table covers every vertex");
    assert_eq!(mesh.shared_textures().vertex_count(), count, "uv table covers every vertex");
    for (g, group) in mesh.shared_vertices().groups().iter().enumerate() {
        assert!(!group.is_empty(), "group {g} is empty; ids must stay dense");
    }

    let graph = WingedEdgeGraph::build(mesh.faces(), mesh.shared_vertices());
    for (id, wing) in graph.edges().iter().enumerate() {
        if let Some(opposite) = wing.opposite {
            assert_eq!(graph[opposite].opposite, Some(id), "opposite links are symmetric");
        }
    }
}

/// Number of perimeter edges without a neighbour across them.
pub fn open_edge_count(mesh: &EditableMesh<()>) -> usize {
    let graph = WingedEdgeGraph::build(mesh.faces(), mesh.shared_vertices());
    graph.edges().iter().filter(|w| w.opposite.is_none()).count()
}
