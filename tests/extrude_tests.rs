mod support;

use nalgebra::{Point3, Vector3};
use polyedit::{EditableMesh, Edge, ExtrudeMethod, MeshError, float_types::Real, mesh::face::GROUP_NONE};
use support::{
    approx_eq, assert_invariants, corner_at, cube_positions, cube_quads, face_facing, grid, open_edge_count, unit_cube,
};

/// Centroid of a face's distinct corners.
fn face_center(mesh: &polyedit::EditableMesh<()>, face: usize) -> Point3<Real> {
    let corners = mesh.faces()[face].distinct_indices();
    let sum: Vector3<Real> = corners.iter().map(|&i| mesh.vertices()[i].position.coords).sum();
    Point3::from(sum / corners.len() as Real)
}

#[test]
fn every_cube_face_extruded_on_its_own() {
    let mut cube = unit_cube();
    let walls = cube.extrude_faces(&[0, 1, 2, 3, 4, 5], ExtrudeMethod::IndividualFaces, 1.0).expect("extrudes");
    println!("walls: {}, faces: {}, vertices: {}", walls.len(), cube.face_count(), cube.vertex_count());

    assert_eq!(walls.len(), 24, "four walls per face");
    assert_eq!(cube.face_count(), 30);
    assert_eq!(cube.vertex_count(), 120);
    assert_eq!(cube.shared_vertices().len(), 32, "8 original corners plus 4 lifted corners per face");
    for &i in &cube.faces()[1].distinct_indices() {
        assert!(approx_eq(cube.vertices()[i].position.z, 2.0, 1e-9), "top face moved up by one");
    }
    assert_invariants(&cube);
}

#[test]
fn grouped_extrude_of_one_face_stays_watertight() {
    let mut cube = unit_cube();
    let walls = cube.extrude_faces(&[1], ExtrudeMethod::FaceNormal, 0.5).expect("extrudes");

    assert_eq!(walls.len(), 4);
    assert_eq!(cube.face_count(), 10);
    assert_eq!(open_edge_count(&cube), 0, "walls close the gap on every side");
    for &i in &cube.faces()[1].distinct_indices() {
        assert!(approx_eq(cube.vertices()[i].position.z, 1.5, 1e-9));
    }
    for &w in &walls {
        let normal = cube.face_normal(w).expect("in range");
        let outward = face_center(&cube, w) - Point3::new(0.5, 0.5, 1.25);
        assert!(normal.z.abs() < 1e-9, "walls are vertical");
        assert!(normal.dot(&outward) > 0.0, "wall {w} faces out of the box");
    }
    assert_invariants(&cube);
}

#[test]
fn grouped_extrude_lifts_the_lid_off_its_uv_groups() {
    let mut faces = cube_quads();
    faces[1].smoothing_group = 3;
    faces[1].texture_group = 4;
    let mut cube: EditableMesh<()> = EditableMesh::from_positions(&cube_positions(), faces).expect("imports");
    let corner = corner_at(&cube, 1, [0.0, 0.0, 1.0]);
    assert_eq!(cube.shared_textures().coincident(corner).len(), 3, "lid, front and left meet here");

    cube.extrude_faces(&[1], ExtrudeMethod::FaceNormal, 0.5).expect("extrudes");

    for &i in &cube.faces()[1].distinct_indices() {
        for &twin in cube.shared_textures().coincident(i) {
            let z = cube.vertices()[twin].position.z;
            assert!(approx_eq(z, 1.5, 1e-9), "lid vertex {i} shares UVs with {twin} at z = {z}");
        }
    }
    assert_eq!(cube.faces()[1].smoothing_group, 3, "the lid keeps its smoothing group");
    assert_eq!(cube.faces()[1].texture_group, GROUP_NONE);
    assert_invariants(&cube);
}

#[test]
fn grouped_extrude_walls_only_the_island_perimeter() {
    let mut mesh = grid(2);
    let walls = mesh.extrude_faces(&[0, 1], ExtrudeMethod::VertexNormal, 1.0).expect("extrudes");
    assert_eq!(walls.len(), 6, "the shared edge between the two faces gets no wall");
    assert_eq!(mesh.face_count(), 10);
    assert_invariants(&mesh);
}

#[test]
fn face_normal_extrude_keeps_flat_distance() {
    let mut mesh = grid(2);
    mesh.extrude_faces(&[0, 1, 2, 3], ExtrudeMethod::FaceNormal, 0.25).expect("extrudes");
    for f in 0..4 {
        for &i in &mesh.faces()[f].distinct_indices() {
            assert!(approx_eq(mesh.vertices()[i].position.z, 0.25, 1e-9), "coplanar faces move as a slab");
        }
    }
    assert_eq!(open_edge_count(&mesh), 8, "only the slab's outer rim of walls is open");
}

#[test]
fn extrude_rejects_empty_and_out_of_range() {
    let mut cube = unit_cube();
    assert_eq!(cube.extrude_faces(&[], ExtrudeMethod::FaceNormal, 1.0).unwrap_err(), MeshError::EmptyInput("faces"));
    assert!(matches!(
        cube.extrude_faces(&[9], ExtrudeMethod::FaceNormal, 1.0),
        Err(MeshError::FaceOutOfRange { index: 9, .. })
    ));
    assert_eq!(cube.face_count(), 6);
}

#[test]
fn open_edge_grows_a_quad() {
    let mut mesh = grid(1);
    let edge = Edge::new(corner_at(&mesh, 0, [0.0, 0.0, 0.0]), corner_at(&mesh, 0, [1.0, 0.0, 0.0]));
    let created = mesh.extrude_edges(&[edge], 1.0, false, false).expect("open edge extrudes");

    assert_eq!(created, vec![1]);
    assert_eq!(mesh.vertex_count(), 8);
    assert_eq!(open_edge_count(&mesh), 6, "the new quad is stitched to the source edge");
    let lifted = mesh.faces()[1].distinct_indices();
    assert_eq!(lifted.iter().filter(|&&i| approx_eq(mesh.vertices()[i].position.z, 1.0, 1e-9)).count(), 2);
    assert_invariants(&mesh);
}

#[test]
fn grouped_edge_extrude_shares_the_middle_vertex() {
    let mut mesh = grid(2);
    let left = Edge::new(corner_at(&mesh, 0, [0.0, 0.0, 0.0]), corner_at(&mesh, 0, [1.0, 0.0, 0.0]));
    let right = Edge::new(corner_at(&mesh, 1, [1.0, 0.0, 0.0]), corner_at(&mesh, 1, [2.0, 0.0, 0.0]));
    let created = mesh.extrude_edges(&[left, right], 0.5, true, false).expect("extrudes");

    assert_eq!(created.len(), 2);
    assert_eq!(mesh.shared_vertices().len(), 12, "three lifted positions, not four");
    assert_eq!(open_edge_count(&mesh), 10);
    assert_invariants(&mesh);
}

#[test]
fn interior_edges_need_allow_manifold() {
    let mut mesh = grid(2);
    let interior = Edge::new(corner_at(&mesh, 0, [1.0, 0.0, 0.0]), corner_at(&mesh, 0, [1.0, 1.0, 0.0]));
    let err = mesh.extrude_edges(&[interior], 1.0, false, false).unwrap_err();
    assert!(matches!(err, MeshError::InvalidArgument(_)), "got {err:?}");
    assert_eq!(mesh.face_count(), 4);

    let created = mesh.extrude_edges(&[interior], 1.0, false, true).expect("fin allowed");
    assert_eq!(created.len(), 1);
}

#[test]
fn detach_gives_the_copy_its_own_groups() {
    let mut cube = unit_cube();
    let copies = cube.detach_faces(&[0], false).expect("detaches");
    assert_eq!(copies, vec![6]);
    assert_eq!(cube.face_count(), 7);
    assert_eq!(cube.shared_vertices().len(), 12);
    assert_invariants(&cube);

    let mut cube = unit_cube();
    let copies = cube.detach_faces(&[0], true).expect("detaches");
    assert_eq!(copies, vec![5]);
    assert_eq!(cube.face_count(), 6);
    assert_eq!(open_edge_count(&cube), 8, "a loose quad beside a square hole");
    assert_invariants(&cube);
}

#[test]
fn duplicate_and_flip_faces_the_other_way() {
    let mut mesh = grid(1);
    let copies = mesh.duplicate_and_flip(&[0]).expect("duplicates");
    assert_eq!(copies, vec![1]);
    assert_eq!(mesh.shared_vertices().len(), 4, "the copy is coincident with the original");
    assert_eq!(face_facing(&mesh, [0.0, 0.0, -1.0]), 1);
    assert_invariants(&mesh);
}
