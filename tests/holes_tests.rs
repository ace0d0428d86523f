mod support;

use polyedit::MeshError;
use support::{assert_invariants, corner_at, grid, open_box, open_edge_count};

#[test]
fn open_box_has_one_hole_and_fills_it() {
    let mut mesh = open_box();
    let holes = mesh.find_holes(None).expect("queries");
    assert_eq!(holes.len(), 1);
    assert_eq!(holes[0].len(), 4, "the missing lid is a square");

    let caps = mesh.fill_holes(None).expect("fills");
    println!("caps: {caps:?}");
    assert_eq!(caps, vec![5]);
    assert_eq!(open_edge_count(&mesh), 0);
    assert!(mesh.face_normal(5).expect("in range").z > 0.999, "the lid faces out like its neighbours");
    assert_invariants(&mesh);

    assert_eq!(mesh.fill_holes(None).unwrap_err(), MeshError::NoHolesFound);
}

#[test]
fn holes_can_be_picked_by_vertex() {
    let mut mesh = grid(3);
    mesh.delete_faces(&[4]).expect("in range");
    let holes = mesh.find_holes(None).expect("queries");
    assert_eq!(holes.len(), 2, "the outer rim and the missing middle");

    let inner = corner_at(&mesh, 0, [1.0, 1.0, 0.0]);
    assert_eq!(mesh.find_holes(Some(&[inner])).expect("queries").len(), 1);

    let caps = mesh.fill_holes(Some(&[inner])).expect("fills");
    assert_eq!(caps.len(), 1);
    assert_eq!(mesh.face_count(), 9);
    assert_eq!(open_edge_count(&mesh), 12, "only the outer rim stays open");
    assert!(mesh.face_normal(caps[0]).expect("in range").z > 0.999);
    assert_invariants(&mesh);
}

#[test]
fn holes_touching_at_a_corner_stay_apart() {
    let mut mesh = grid(4);
    // The missing cells meet only at (2, 2).
    mesh.delete_faces(&[5, 10]).expect("in range");
    let mut lengths: Vec<usize> = mesh.find_holes(None).expect("queries").iter().map(Vec::len).collect();
    lengths.sort_unstable();
    assert_eq!(lengths, vec![4, 4, 16], "two squares and the outer rim");

    let lower = corner_at(&mesh, 0, [1.0, 1.0, 0.0]);
    let caps = mesh.fill_holes(Some(&[lower])).expect("fills");
    assert_eq!(caps.len(), 1, "only the hole around the picked corner");
    assert_eq!(mesh.face_count(), 15);
    assert_eq!(open_edge_count(&mesh), 20, "the other square and the rim stay open");
    assert!(mesh.face_normal(caps[0]).expect("in range").z > 0.999);
    assert_eq!(mesh.find_holes(None).expect("queries").len(), 2);
    assert_invariants(&mesh);
}

#[test]
fn closed_mesh_reports_no_holes() {
    let mut cube = support::unit_cube();
    assert!(cube.find_holes(None).expect("queries").is_empty());
    assert_eq!(cube.fill_holes(None).unwrap_err(), MeshError::NoHolesFound);
    assert_eq!(cube.face_count(), 6);
}
