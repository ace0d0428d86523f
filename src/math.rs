//! Small geometric kernels shared by the topology operators.
//!
//! Everything here works on bare `nalgebra` points; nothing knows about faces
//! or shared-vertex groups.

use crate::float_types::{Real, tolerance};
use nalgebra::{Matrix3, Point2, Point3, SymmetricEigen, Vector3};

/// Area of the triangle `abc`, half the magnitude of the edge cross product.
#[inline]
pub fn triangle_area(a: &Point3<Real>, b: &Point3<Real>, c: &Point3<Real>) -> Real {
    (b - a).cross(&(c - a)).norm() * 0.5
}

/// Unit normal of the triangle `abc` (counter-clockwise front face), or the
/// zero vector for a degenerate triangle.
#[inline]
pub fn triangle_normal(a: &Point3<Real>, b: &Point3<Real>, c: &Point3<Real>) -> Vector3<Real> {
    normalize_or_zero((b - a).cross(&(c - a)))
}

/// Normalizes `v`, returning zero instead of NaN for vanishing vectors.
#[inline]
pub fn normalize_or_zero(v: Vector3<Real>) -> Vector3<Real> {
    let len = v.norm();
    if len > Real::EPSILON { v / len } else { Vector3::zeros() }
}

/// **Newell's method** for the normal of a (possibly non-planar) closed polygon.
///
/// Sums `(yᵢ - yⱼ)(zᵢ + zⱼ)` style terms over every edge; robust to concave
/// contours and collinear runs. The result is normalized (or zero).
pub fn newell_normal(points: &[Point3<Real>]) -> Vector3<Real> {
    let mut n = Vector3::zeros();
    for (i, current) in points.iter().enumerate() {
        let next = &points[(i + 1) % points.len()];
        n.x += (current.y - next.y) * (current.z + next.z);
        n.y += (current.z - next.z) * (current.x + next.x);
        n.z += (current.x - next.x) * (current.y + next.y);
    }
    normalize_or_zero(n)
}

/// Arithmetic mean of a point set.
pub fn centroid(points: &[Point3<Real>]) -> Point3<Real> {
    if points.is_empty() {
        return Point3::origin();
    }
    let sum = points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Point3::from(sum / points.len() as Real)
}

/// **Mathematical Foundation: Least-Squares Plane Fit**
///
/// The best-fit plane through a point cloud passes through the centroid `c`
/// and has as normal the eigenvector of the covariance matrix
/// `Σ (pᵢ - c)(pᵢ - c)ᵀ` with the smallest eigenvalue.
///
/// ## **Orientation**
/// Eigenvectors carry no sign, so the result is flipped to agree with the
/// Newell normal of the points taken in order. For an ordered contour this
/// makes the projected contour counter-clockwise.
pub fn best_fit_normal(points: &[Point3<Real>]) -> Vector3<Real> {
    if points.len() < 3 {
        return Vector3::z();
    }
    let c = centroid(points);
    let mut cov = Matrix3::zeros();
    for p in points {
        let d = p - c;
        cov += d * d.transpose();
    }

    let eigen = SymmetricEigen::new(cov);
    let smallest = eigen.eigenvalues.imin();
    let mut normal = normalize_or_zero(eigen.eigenvectors.column(smallest).into_owned());
    if normal == Vector3::zeros() {
        normal = Vector3::z();
    }

    let newell = newell_normal(points);
    if normal.dot(&newell) < 0.0 {
        normal = -normal;
    }
    normal
}

/// Orthonormal 2-D frame lying in a plane.
#[derive(Debug, Clone, Copy)]
pub struct PlaneBasis {
    pub origin: Point3<Real>,
    pub u: Vector3<Real>,
    pub v: Vector3<Real>,
    pub normal: Vector3<Real>,
}

impl PlaneBasis {
    /// Right-handed frame `(u, v, normal)`: a contour wound counter-clockwise
    /// around `normal` stays counter-clockwise in `(u, v)`.
    pub fn new(origin: Point3<Real>, normal: Vector3<Real>) -> Self {
        let n = normalize_or_zero(normal);
        let n = if n == Vector3::zeros() { Vector3::z() } else { n };

        // Seed with the world axis least aligned with the normal.
        let seed = if n.x.abs() <= n.y.abs() && n.x.abs() <= n.z.abs() {
            Vector3::x()
        } else if n.y.abs() <= n.z.abs() {
            Vector3::y()
        } else {
            Vector3::z()
        };
        let u = (seed - n * seed.dot(&n)).normalize();
        let v = n.cross(&u);
        Self { origin, u, v, normal: n }
    }

    #[inline]
    pub fn project(&self, p: &Point3<Real>) -> Point2<Real> {
        let d = p - self.origin;
        Point2::new(d.dot(&self.u), d.dot(&self.v))
    }
}

/// Projects points onto their best-fit plane.
pub fn project_to_plane(points: &[Point3<Real>]) -> Vec<Point2<Real>> {
    let basis = PlaneBasis::new(centroid(points), best_fit_normal(points));
    points.iter().map(|p| basis.project(p)).collect()
}

/// Shoelace signed area; positive for counter-clockwise contours.
pub fn signed_area_2d(points: &[Point2<Real>]) -> Real {
    let mut twice = 0.0;
    for (i, a) in points.iter().enumerate() {
        let b = &points[(i + 1) % points.len()];
        twice += a.x * b.y - b.x * a.y;
    }
    twice * 0.5
}

/// Rotational direction of a closed 2-D contour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindingOrder {
    Unknown,
    Clockwise,
    CounterClockwise,
}

/// Winding of a contour; `Unknown` when it encloses no area.
pub fn winding_order(points: &[Point2<Real>]) -> WindingOrder {
    if points.len() < 3 {
        return WindingOrder::Unknown;
    }
    let area = signed_area_2d(points);
    if area.abs() <= tolerance() * tolerance() {
        WindingOrder::Unknown
    } else if area > 0.0 {
        WindingOrder::CounterClockwise
    } else {
        WindingOrder::Clockwise
    }
}

/// `1 / cos(x)`.
#[inline]
pub fn secant(x: Real) -> Real {
    1.0 / x.cos()
}

/// Unsigned angle between two vectors in radians; zero if either vanishes.
pub fn angle_between(a: &Vector3<Real>, b: &Vector3<Real>) -> Real {
    let denom = a.norm() * b.norm();
    if denom <= Real::EPSILON {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos()
}
