mod support;

use polyedit::{
    EditableMesh, Face, MeshError, MeshSink, MeshSnapshot, Vertex,
    mesh::shared::{IdAllocator, SharedVertexTable},
};
use support::{assert_invariants, corner_at, unit_cube};

#[test]
fn cube_import_duplicates_corners_per_face() {
    let cube = unit_cube();
    println!("cube: {} vertices, {} groups", cube.vertex_count(), cube.shared_vertices().len());

    assert_eq!(cube.face_count(), 6);
    assert_eq!(cube.vertex_count(), 24, "each of 6 quads owns 4 corners");
    assert_eq!(cube.shared_vertices().len(), 8, "one group per cube corner");
    for group in cube.shared_vertices().groups() {
        assert_eq!(group.len(), 3, "three faces meet at every cube corner");
    }
    assert_invariants(&cube);
}

#[test]
fn precomputed_groups_are_validated() {
    let err = SharedVertexTable::from_groups(vec![vec![0, 1], vec![1, 2]], 3).unwrap_err();
    assert_eq!(err, MeshError::DuplicateGroupMember(1));

    let err = SharedVertexTable::from_groups(vec![vec![0, 7]], 3).unwrap_err();
    assert_eq!(err, MeshError::IndexOutOfRange { index: 7, count: 3 });

    let table = SharedVertexTable::from_groups(vec![vec![2, 0]], 4).expect("valid groups");
    assert_eq!(table.len(), 3, "missing indices become singletons");
    assert_eq!(table.group(0), table.group(2));
}

#[test]
fn merge_of_groups_is_transitive() {
    let mut table = SharedVertexTable::singletons(6);
    table.merge(&[0, 1]).expect("merge");
    table.merge(&[1, 2]).expect("merge");
    assert_eq!(table.group(0), table.group(2), "0~1 and 1~2 put 0 with 2");
    assert_eq!(table.len(), 4);
    table.validate(6).expect("dense and total");
}

#[test]
fn split_selected_keeps_the_rest_together() {
    let mut cube = unit_cube();
    let v = corner_at(&cube, 0, [0.0, 0.0, 0.0]);
    let mates: Vec<usize> = cube.shared_vertices().coincident(v).iter().copied().filter(|&m| m != v).collect();

    cube.split_vertices(&[v]).expect("in range");
    assert_eq!(cube.shared_vertices().len(), 9);
    assert_eq!(cube.shared_vertices().coincident(v), &[v]);
    assert_eq!(cube.shared_vertices().group(mates[0]), cube.shared_vertices().group(mates[1]));
    assert_invariants(&cube);
}

#[test]
fn split_common_atomizes_the_group() {
    let mut cube = unit_cube();
    let v = corner_at(&cube, 0, [1.0, 1.0, 0.0]);
    cube.split_common_vertices(&[v]).expect("in range");
    assert_eq!(cube.shared_vertices().len(), 10, "a 3-member group becomes 3 singletons");
    assert_invariants(&cube);
}

#[test]
fn id_allocator_skips_used_ids() {
    let mut ids = IdAllocator::after_signed([-1, 4, 2, -1]);
    assert_eq!(ids.next_signed(), 5);
    assert_eq!(ids.next_signed(), 6);
    let mut fresh = IdAllocator::starting_at(10);
    assert_eq!(fresh.next_id(), 10);
}

#[test]
fn metadata_is_the_only_in_place_face_edit() {
    let positions = [
        nalgebra::Point3::new(0.0, 0.0, 0.0),
        nalgebra::Point3::new(1.0, 0.0, 0.0),
        nalgebra::Point3::new(0.0, 1.0, 0.0),
    ];
    let mut mesh: EditableMesh<&'static str> =
        EditableMesh::from_positions(&positions, vec![Face::with_metadata(vec![0, 1, 2], Some("floor"))])
            .expect("imports");
    assert_eq!(mesh.faces()[0].metadata, Some("floor"));
    mesh.set_face_metadata(0, Some("wall")).expect("in range");
    assert_eq!(mesh.faces()[0].metadata, Some("wall"));
    assert!(mesh.set_face_metadata(3, None).is_err());
}

#[derive(Default)]
struct CountingSink {
    triangles: usize,
    vertices: usize,
}

impl MeshSink<()> for CountingSink {
    type Error = std::convert::Infallible;

    fn upload(&mut self, snapshot: MeshSnapshot<'_, ()>) -> Result<(), Self::Error> {
        self.vertices = snapshot.vertices.len();
        self.triangles = snapshot.faces.iter().map(|f| f.indices.len() / 3).sum();
        Ok(())
    }
}

#[test]
fn commit_hands_a_snapshot_to_the_host() {
    let cube = unit_cube();
    let mut sink = CountingSink::default();
    cube.commit(&mut sink).expect("infallible");
    assert_eq!(sink.vertices, 24);
    assert_eq!(sink.triangles, 12);

    let submeshes = cube.submeshes();
    assert_eq!(submeshes.len(), 1);
    assert_eq!(submeshes[0].indices.len(), 36);
}

#[test]
fn meshes_move_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<EditableMesh<()>>();
    assert_send_sync::<EditableMesh<String>>();
}

#[test]
fn set_coincident_regroups_exactly_the_given_indices() {
    let mut table = SharedVertexTable::from_groups(vec![vec![0, 1, 2], vec![3, 4]], 5).expect("valid groups");
    let group = table.set_coincident(&[2, 3]).expect("in range");
    assert_eq!(table.positions_of(group), Some(&[2, 3][..]));
    assert_eq!(table.group(0), table.group(1), "former mates stay together");
    assert_eq!(table.len(), 3);
    table.validate(5).expect("dense and total");
}

#[test]
fn shared_position_moves_every_twin() {
    let mut cube = unit_cube();
    let v = corner_at(&cube, 1, [1.0, 1.0, 1.0]);
    let target = nalgebra::Point3::new(1.5, 1.5, 1.5);
    cube.set_shared_position(v, target).expect("in range");
    let moved = cube.positions().filter(|p| (*p - target).norm() < 1e-12).count();
    assert_eq!(moved, 3, "all three faces meeting at the corner follow");
}

#[test]
fn attributes_ride_along_on_import() {
    let color = nalgebra::Vector4::new(1.0, 0.0, 0.0, 1.0);
    let vertices = vec![
        Vertex::new(nalgebra::Point3::new(0.0, 0.0, 0.0)).with_color(color),
        Vertex::new(nalgebra::Point3::new(1.0, 0.0, 0.0)),
        Vertex::new(nalgebra::Point3::new(0.0, 1.0, 0.0)),
    ];
    let mut first = Face::new(vec![0, 1, 2]);
    first.submesh_index = 2;
    first.smoothing_group = 7;
    let mut second = Face::new(vec![0, 2, 1]);
    second.copy_properties_from(&first);
    let mesh: EditableMesh<()> = EditableMesh::new(vertices, vec![first, second], None).expect("imports");

    assert_eq!(mesh.vertex_count(), 6, "the second face gets its own copies");
    assert_eq!(mesh.vertices().iter().filter(|v| v.color == Some(color)).count(), 2);
    assert_eq!(mesh.faces()[1].submesh_index, 2);
    assert_eq!(mesh.faces()[1].smoothing_group, 7);
    assert_eq!(mesh.submeshes()[0].submesh_index, 2);
}
