mod support;

use nalgebra::Point3;
use polyedit::{
    float_types::{Real, TAU},
    math::triangle_area,
    ops::triangulate::triangulate_points,
};
use support::{approx_eq, assert_invariants, corner_at, grid, open_edge_count, surface_area, unit_cube};

fn regular_polygon(n: usize, clockwise: bool) -> Vec<Point3<Real>> {
    let step = TAU / n as Real;
    (0..n)
        .map(|i| {
            let t = if clockwise { -(i as Real) * step } else { i as Real * step };
            Point3::new(t.cos(), t.sin(), 0.5)
        })
        .collect()
}

#[test]
fn convex_polygons_fan_into_n_minus_two_triangles() {
    for n in [3, 5, 8, 12] {
        for clockwise in [false, true] {
            let points = regular_polygon(n, clockwise);
            let tris = triangulate_points(&points, false).expect("convex polygon triangulates");
            let expected = n as Real / 2.0 * (TAU / n as Real).sin();
            let area: Real = tris.chunks_exact(3).map(|t| triangle_area(&points[t[0]], &points[t[1]], &points[t[2]])).sum();
            println!("n = {n}, clockwise = {clockwise}: {} triangles, area {area}", tris.len() / 3);

            assert_eq!(tris.len(), (n - 2) * 3);
            assert!(tris.iter().all(|&i| i < n), "only input indices come back");
            assert!(approx_eq(area, expected, 1e-9), "triangles cover the polygon exactly once");
            for t in tris.chunks_exact(3) {
                let turn = (points[t[1]] - points[t[0]]).cross(&(points[t[2]] - points[t[0]])).z;
                assert_eq!(turn < 0.0, clockwise, "triangles wind like the contour");
            }
        }
    }
}

#[test]
fn too_few_points_is_an_error() {
    let points = regular_polygon(3, false);
    assert!(triangulate_points(&points[..2], false).is_err());
}

#[test]
fn cube_breaks_into_twelve_triangles() {
    let mut cube = unit_cube();
    let created = cube.to_triangles(&[0, 1, 2, 3, 4, 5]).expect("triangulates");

    assert_eq!(created, (0..12).collect::<Vec<_>>());
    assert_eq!(cube.face_count(), 12);
    assert_eq!(cube.vertex_count(), 36);
    assert_eq!(cube.shared_vertices().len(), 8, "triangle copies stay on the cube corners");
    assert_eq!(open_edge_count(&cube), 0);
    assert!(approx_eq(surface_area(&cube), 6.0, 1e-9));
    assert_invariants(&cube);
}

#[test]
fn create_polygon_from_scrambled_corners() {
    let mut mesh = grid(1);
    let corners = [
        corner_at(&mesh, 0, [1.0, 1.0, 0.0]),
        corner_at(&mesh, 0, [0.0, 0.0, 0.0]),
        corner_at(&mesh, 0, [0.0, 1.0, 0.0]),
        corner_at(&mesh, 0, [1.0, 0.0, 0.0]),
    ];
    let face = mesh.create_polygon(&corners, true).expect("sorted and triangulated");

    assert_eq!(face, 1);
    assert_eq!(mesh.faces()[face].indices.len(), 6);
    assert_eq!(mesh.shared_vertices().len(), 4, "new corners join the existing positions");
    assert!(approx_eq(surface_area(&mesh), 2.0, 1e-9));
    assert_invariants(&mesh);
}
