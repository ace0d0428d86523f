//! Per-vertex attribute record and its attribute-wise arithmetic.

use crate::float_types::Real;
use nalgebra::{Point3, Vector2, Vector3, Vector4};
use std::ops::{Add, AddAssign, Div, Mul, Sub};

/// A mesh vertex. Only `position` is required; every other attribute may be
/// absent and stays absent through arithmetic unless the left operand has it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<Real>,
    /// RGBA color
    pub color: Option<Vector4<Real>>,
    pub normal: Option<Vector3<Real>>,
    /// xyz tangent with handedness in w
    pub tangent: Option<Vector4<Real>>,
    pub uv0: Option<Vector2<Real>>,
    pub uv1: Option<Vector2<Real>>,
    pub uv2: Option<Vector4<Real>>,
    pub uv3: Option<Vector4<Real>>,
}

impl Default for Vertex {
    fn default() -> Self {
        Self::new(Point3::origin())
    }
}

/// `f(a, b)` when both sides are present, otherwise the left side unchanged.
/// A missing right-hand attribute behaves like zero for `+` and `-`.
#[inline]
fn zip_left<T: Copy>(a: Option<T>, b: Option<T>, f: impl FnOnce(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(f(a, b)),
        (a, _) => a,
    }
}

impl Vertex {
    /// A vertex holding only a position.
    pub const fn new(position: Point3<Real>) -> Self {
        Self {
            position,
            color: None,
            normal: None,
            tangent: None,
            uv0: None,
            uv1: None,
            uv2: None,
            uv3: None,
        }
    }

    pub const fn with_normal(mut self, normal: Vector3<Real>) -> Self {
        self.normal = Some(normal);
        self
    }

    pub const fn with_color(mut self, color: Vector4<Real>) -> Self {
        self.color = Some(color);
        self
    }

    pub const fn with_uv0(mut self, uv: Vector2<Real>) -> Self {
        self.uv0 = Some(uv);
        self
    }

    /// Moves only the position.
    #[inline]
    pub fn translate(&mut self, delta: &Vector3<Real>) {
        self.position += delta;
    }

    /// **Attribute-wise Linear Interpolation**
    ///
    /// `self·(1-t) + other·t` for every attribute present on both vertices;
    /// attributes only `self` carries are kept as they are.
    pub fn mix(&self, other: &Vertex, t: Real) -> Vertex {
        let s = 1.0 - t;
        Vertex {
            position: Point3::from(self.position.coords * s + other.position.coords * t),
            color: zip_left(self.color, other.color, |a, b| a * s + b * t),
            normal: zip_left(self.normal, other.normal, |a, b| a * s + b * t),
            tangent: zip_left(self.tangent, other.tangent, |a, b| a * s + b * t),
            uv0: zip_left(self.uv0, other.uv0, |a, b| a * s + b * t),
            uv1: zip_left(self.uv1, other.uv1, |a, b| a * s + b * t),
            uv2: zip_left(self.uv2, other.uv2, |a, b| a * s + b * t),
            uv3: zip_left(self.uv3, other.uv3, |a, b| a * s + b * t),
        }
    }

    /// Average of the addressed vertices (all of them when `indices` is
    /// `None`). Each attribute is averaged over the vertices that carry it, and
    /// is present in the result if any of them does.
    pub fn average(vertices: &[Vertex], indices: Option<&[usize]>) -> Vertex {
        let picked: Vec<&Vertex> = match indices {
            Some(indices) => indices.iter().filter_map(|&i| vertices.get(i)).collect(),
            None => vertices.iter().collect(),
        };
        if picked.is_empty() {
            return Vertex::default();
        }

        fn mean<T, I>(items: I) -> Option<T>
        where
            T: Copy + Add<Output = T> + Div<Real, Output = T>,
            I: Iterator<Item = T>,
        {
            let mut count = 0usize;
            let mut sum: Option<T> = None;
            for item in items {
                count += 1;
                sum = Some(match sum {
                    Some(s) => s + item,
                    None => item,
                });
            }
            sum.map(|s| s / count as Real)
        }

        let position = mean(picked.iter().map(|v| v.position.coords)).unwrap_or_else(Vector3::zeros);
        Vertex {
            position: Point3::from(position),
            color: mean(picked.iter().filter_map(|v| v.color)),
            normal: mean(picked.iter().filter_map(|v| v.normal)),
            tangent: mean(picked.iter().filter_map(|v| v.tangent)),
            uv0: mean(picked.iter().filter_map(|v| v.uv0)),
            uv1: mean(picked.iter().filter_map(|v| v.uv1)),
            uv2: mean(picked.iter().filter_map(|v| v.uv2)),
            uv3: mean(picked.iter().filter_map(|v| v.uv3)),
        }
    }

    /// Normalizes every attribute as an independent vector. Used on
    /// difference vertices that act as a direction across all channels.
    pub fn normalized(&self) -> Vertex {
        Vertex {
            position: Point3::from(self.position.coords.try_normalize(Real::EPSILON).unwrap_or_else(Vector3::zeros)),
            color: self.color.map(|c| c.try_normalize(Real::EPSILON).unwrap_or(c)),
            normal: self.normal.map(|n| n.try_normalize(Real::EPSILON).unwrap_or(n)),
            tangent: self.tangent.map(|t| t.try_normalize(Real::EPSILON).unwrap_or(t)),
            uv0: self.uv0.map(|u| u.try_normalize(Real::EPSILON).unwrap_or(u)),
            uv1: self.uv1.map(|u| u.try_normalize(Real::EPSILON).unwrap_or(u)),
            uv2: self.uv2.map(|u| u.try_normalize(Real::EPSILON).unwrap_or(u)),
            uv3: self.uv3.map(|u| u.try_normalize(Real::EPSILON).unwrap_or(u)),
        }
    }
}

impl Add for Vertex {
    type Output = Vertex;

    fn add(self, rhs: Vertex) -> Vertex {
        Vertex {
            position: Point3::from(self.position.coords + rhs.position.coords),
            color: zip_left(self.color, rhs.color, |a, b| a + b),
            normal: zip_left(self.normal, rhs.normal, |a, b| a + b),
            tangent: zip_left(self.tangent, rhs.tangent, |a, b| a + b),
            uv0: zip_left(self.uv0, rhs.uv0, |a, b| a + b),
            uv1: zip_left(self.uv1, rhs.uv1, |a, b| a + b),
            uv2: zip_left(self.uv2, rhs.uv2, |a, b| a + b),
            uv3: zip_left(self.uv3, rhs.uv3, |a, b| a + b),
        }
    }
}

impl AddAssign for Vertex {
    fn add_assign(&mut self, rhs: Vertex) {
        *self = *self + rhs;
    }
}

impl Sub for Vertex {
    type Output = Vertex;

    fn sub(self, rhs: Vertex) -> Vertex {
        Vertex {
            position: Point3::from(self.position.coords - rhs.position.coords),
            color: zip_left(self.color, rhs.color, |a, b| a - b),
            normal: zip_left(self.normal, rhs.normal, |a, b| a - b),
            tangent: zip_left(self.tangent, rhs.tangent, |a, b| a - b),
            uv0: zip_left(self.uv0, rhs.uv0, |a, b| a - b),
            uv1: zip_left(self.uv1, rhs.uv1, |a, b| a - b),
            uv2: zip_left(self.uv2, rhs.uv2, |a, b| a - b),
            uv3: zip_left(self.uv3, rhs.uv3, |a, b| a - b),
        }
    }
}

impl Mul<Real> for Vertex {
    type Output = Vertex;

    fn mul(self, rhs: Real) -> Vertex {
        Vertex {
            position: Point3::from(self.position.coords * rhs),
            color: self.color.map(|c| c * rhs),
            normal: self.normal.map(|n| n * rhs),
            tangent: self.tangent.map(|t| t * rhs),
            uv0: self.uv0.map(|u| u * rhs),
            uv1: self.uv1.map(|u| u * rhs),
            uv2: self.uv2.map(|u| u * rhs),
            uv3: self.uv3.map(|u| u * rhs),
        }
    }
}

impl Div<Real> for Vertex {
    type Output = Vertex;

    fn div(self, rhs: Real) -> Vertex {
        self * (1.0 / rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_respects_attribute_presence() {
        let a = Vertex::new(Point3::new(1.0, 2.0, 3.0)).with_uv0(Vector2::new(1.0, 1.0));
        let b = Vertex::new(Point3::new(1.0, 0.0, 0.0)).with_normal(Vector3::z());

        let sum = a + b;
        assert_eq!(sum.position, Point3::new(2.0, 2.0, 3.0));
        assert_eq!(sum.uv0, Some(Vector2::new(1.0, 1.0)));
        assert_eq!(sum.normal, None, "presence follows the left operand");

        let diff = b - a;
        assert_eq!(diff.normal, Some(Vector3::z()));
        assert_eq!(diff.uv0, None);
    }

    #[test]
    fn average_only_counts_carriers() {
        let vertices = [
            Vertex::new(Point3::new(0.0, 0.0, 0.0)).with_uv0(Vector2::new(0.0, 2.0)),
            Vertex::new(Point3::new(2.0, 0.0, 0.0)),
            Vertex::new(Point3::new(4.0, 0.0, 0.0)).with_uv0(Vector2::new(2.0, 0.0)),
        ];
        let avg = Vertex::average(&vertices, None);
        assert_eq!(avg.position, Point3::new(2.0, 0.0, 0.0));
        assert_eq!(avg.uv0, Some(Vector2::new(1.0, 1.0)));

        let picked = Vertex::average(&vertices, Some(&[1, 2]));
        assert_eq!(picked.position, Point3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn mix_and_normalize() {
        let a = Vertex::new(Point3::new(0.0, 0.0, 0.0));
        let b = Vertex::new(Point3::new(4.0, 0.0, 0.0));
        assert_eq!(a.mix(&b, 0.25).position, Point3::new(1.0, 0.0, 0.0));
        assert_eq!((b - a).normalized().position, Point3::new(1.0, 0.0, 0.0));
    }
}
