mod support;

use polyedit::{Edge, MeshError, SplitPoint, float_types::Real};
use support::{approx_eq, assert_invariants, corner_at, grid, open_edge_count, surface_area};

fn edge_of(mesh: &polyedit::EditableMesh<()>, face: usize, a: [Real; 3], b: [Real; 3]) -> Edge {
    Edge::new(corner_at(mesh, face, a), corner_at(mesh, face, b))
}

#[test]
fn opposite_edge_midpoints_halve_a_quad() {
    let mut mesh = grid(1);
    let bottom = edge_of(&mesh, 0, [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
    let top = edge_of(&mesh, 0, [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]);
    let created = mesh.connect_edges(&[bottom, top]).expect("connects");
    println!("created faces: {created:?}");

    assert_eq!(created.len(), 2);
    assert_eq!(mesh.face_count(), 2);
    assert_eq!(open_edge_count(&mesh), 6, "both cut edges are now two halves");
    assert!(approx_eq(surface_area(&mesh), 1.0, 1e-9));
    for f in 0..2 {
        assert!(mesh.face_normal(f).expect("in range").z > 0.999, "pieces keep the facing");
    }
    let group = mesh.faces()[0].texture_group;
    assert!(group >= 0, "pieces get a fresh texture group");
    assert_eq!(mesh.faces()[1].texture_group, group);
    assert_invariants(&mesh);
}

#[test]
fn neighbour_receives_the_midpoint_without_splitting() {
    let mut mesh = grid(2);
    let bottom = edge_of(&mesh, 0, [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
    let seam = edge_of(&mesh, 0, [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]);
    mesh.connect_edges(&[bottom, seam]).expect("connects");

    assert_eq!(mesh.face_count(), 5, "face 0 splits, face 1 only gains a corner");
    assert_eq!(open_edge_count(&mesh), 9, "no crack along the shared edge");
    assert!(approx_eq(surface_area(&mesh), 4.0, 1e-9));
    assert_invariants(&mesh);
}

#[test]
fn diagonal_vertices_split_and_adjacent_ones_do_not() {
    let mut mesh = grid(1);
    let a = corner_at(&mesh, 0, [0.0, 0.0, 0.0]);
    let c = corner_at(&mesh, 0, [1.0, 1.0, 0.0]);
    assert_eq!(mesh.connect_vertices(&[a, c]).expect("connects").len(), 2);
    assert_invariants(&mesh);

    let mut mesh = grid(1);
    let a = corner_at(&mesh, 0, [0.0, 0.0, 0.0]);
    let b = corner_at(&mesh, 0, [1.0, 0.0, 0.0]);
    assert!(mesh.connect_vertices(&[a, b]).expect("nothing to cut").is_empty());
    assert_eq!(mesh.face_count(), 1);
}

#[test]
fn diagonal_is_not_an_edge() {
    let mut mesh = grid(1);
    let diagonal = edge_of(&mesh, 0, [0.0, 0.0, 0.0], [1.0, 1.0, 0.0]);
    let err = mesh.connect_points(&[SplitPoint::EdgeMidpoint(diagonal)]).unwrap_err();
    assert!(matches!(err, MeshError::NotAnEdge(_)), "got {err:?}");
    assert!(mesh.connect_points(&[]).is_err());
}

#[test]
fn subdivided_edge_is_shared_by_both_faces() {
    let mut mesh = grid(2);
    let seam = edge_of(&mesh, 0, [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]);
    let created = mesh.subdivide_edges(&[seam], 3).expect("subdivides");

    assert_eq!(created.len(), 2);
    assert_eq!(mesh.face_count(), 4);
    assert_eq!(mesh.vertex_count(), 22, "two heptagons and two quads");
    assert_eq!(open_edge_count(&mesh), 8, "the three new points line up on both sides");
    assert!(approx_eq(surface_area(&mesh), 4.0, 1e-9));
    assert_invariants(&mesh);
}

#[test]
fn subdivision_count_is_bounded() {
    let mut mesh = grid(2);
    let seam = edge_of(&mesh, 0, [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]);
    assert!(matches!(mesh.subdivide_edges(&[seam], 0), Err(MeshError::InvalidArgument(_))));
    assert!(matches!(mesh.subdivide_edges(&[seam], 513), Err(MeshError::InvalidArgument(_))));
    assert_eq!(mesh.face_count(), 4);
}

/// Vertices strictly inside the `x = 1` seam of a grid, between y = 0 and 1.
fn on_seam(mesh: &polyedit::EditableMesh<()>) -> Vec<usize> {
    (0..mesh.vertex_count())
        .filter(|&i| {
            let p = mesh.vertices()[i].position;
            approx_eq(p.x, 1.0, 1e-9) && p.y > 1e-9 && p.y < 1.0 - 1e-9
        })
        .collect()
}

#[test]
fn inserted_points_keep_a_continuous_seam_in_one_uv_group() {
    let mut mesh = grid(2);
    let seam = edge_of(&mesh, 0, [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]);
    mesh.subdivide_edges(&[seam], 3).expect("subdivides");
    let points = on_seam(&mesh);
    assert_eq!(points.len(), 6, "three points on each side");
    for &i in &points {
        assert_eq!(mesh.shared_textures().coincident(i).len(), 2, "vertex {i} lost its twin across the seam");
    }

    let mut mesh = grid(2);
    let bottom = edge_of(&mesh, 0, [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
    let seam = edge_of(&mesh, 0, [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]);
    mesh.connect_edges(&[bottom, seam]).expect("connects");
    let points = on_seam(&mesh);
    assert!(points.len() >= 2);
    for &i in &points {
        assert_eq!(
            mesh.shared_textures().coincident(i).len(),
            mesh.shared_vertices().coincident(i).len(),
            "every copy of the midpoint shares one UV group"
        );
    }
}
