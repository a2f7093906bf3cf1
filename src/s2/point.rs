// Copyright 2023 Google Inc. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::f64::consts::PI;
use std::ops::{Add, Mul, Neg, Sub};

use cgmath::{Matrix3, Vector3};

use crate::r3::vector::Vector;
use crate::s1::Angle;
use crate::s2::predicates::{robust_sign, Direction};

/// Point represents a point on the unit sphere as a normalized 3-vector.
///
/// Fields should be treated as read-only. Use one of the factory methods for
/// creation.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
#[repr(transparent)]
pub struct Point(pub Vector);

impl Point {
    /// Creates a new normalized point from coordinates.
    pub fn from_coords(x: f64, y: f64, z: f64) -> Point {
        Point(Vector::new(x, y, z).normalize())
    }

    /// Returns a unique "origin" on the sphere for operations that need a
    /// fixed reference point. In particular, this is the "point at infinity"
    /// used for point-in-polygon testing (by counting the number of edge
    /// crossings).
    ///
    /// It should *not* be a point that is commonly used in edge tests in
    /// order to avoid triggering code to handle degenerate cases (this rules
    /// out the north and south poles). It should also not be on the boundary
    /// of any low-level cell for the same reason.
    pub fn origin() -> Point {
        Point(Vector::new(
            -0.0099994664350250197,
            0.0025924542609324121,
            0.99994664350250195,
        ))
    }

    /// Returns the vector this point represents.
    pub fn vector(&self) -> Vector {
        self.0
    }

    /// Returns a Point that is orthogonal to both this point and the other.
    /// This is the preferred (numerically stable) way of computing the cross
    /// product of two points: unlike the plain cross product, its norm stays
    /// well away from zero even when the points are nearly (anti)parallel.
    pub fn point_cross(&self, op: &Point) -> Point {
        // The direction is (self + op) x (op - self) == 2 * (self x op),
        // but this formula is numerically stable.
        Point((self.0 + op.0).cross(&(op.0 - self.0)))
    }

    /// Returns a unit-length vector orthogonal to this point, chosen
    /// deterministically. ortho(-p) = -ortho(p).
    pub fn ortho(&self) -> Point {
        Point(self.0.ortho())
    }

    /// Returns the reference direction used to define an ordering of edges
    /// around a shared vertex. This must be consistent between the vertex
    /// crossing rule and the containment convention for loop vertices.
    pub fn reference_dir(&self) -> Point {
        self.ortho()
    }

    /// Returns the angle between this point and the other.
    pub fn distance(&self, op: &Point) -> Angle {
        Angle(self.0.angle(&op.0))
    }

    /// Normalizes this point.
    pub fn normalize(&self) -> Point {
        Point(self.0.normalize())
    }

    /// Reports whether the two points are within the given angular distance.
    pub fn approx_equal(&self, op: &Point, max_error: Angle) -> bool {
        self.0.angle(&op.0) <= max_error.rad()
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, op: Point) -> Point {
        Point(self.0 + op.0)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, op: Point) -> Point {
        Point(self.0 - op.0)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, m: f64) -> Point {
        Point(self.0 * m)
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point(-self.0)
    }
}

/// Reports whether the edges OA, OB, and OC are encountered in that order
/// while sweeping CCW around the point O.
///
/// You can think of this as testing whether A <= B <= C with respect to the
/// CCW ordering around O that starts at A, or equivalently, whether B is
/// contained in the range of angles (inclusive) that starts at A and extends
/// CCW to C. Properties:
///
///	(1) If ordered_ccw(a,b,c,o) && ordered_ccw(b,a,c,o), then a == b
///	(2) If ordered_ccw(a,b,c,o) && ordered_ccw(a,c,b,o), then b == c
///	(3) If ordered_ccw(a,b,c,o) && ordered_ccw(c,b,a,o), then a == b == c
///	(4) If a == b or b == c, then ordered_ccw(a,b,c,o) is true
///	(5) Otherwise if a == c, then ordered_ccw(a,b,c,o) is false
pub fn ordered_ccw(a: &Point, b: &Point, c: &Point, o: &Point) -> bool {
    let mut sum = 0;
    if robust_sign(b, o, a) != Direction::Clockwise {
        sum += 1;
    }
    if robust_sign(c, o, b) != Direction::Clockwise {
        sum += 1;
    }
    if robust_sign(a, o, c) == Direction::CounterClockwise {
        sum += 1;
    }
    sum >= 2
}

/// Returns the area of triangle ABC. This method combines two different
/// algorithms to get accurate results for both large and very small
/// triangles.
pub fn point_area(a: &Point, b: &Point, c: &Point) -> f64 {
    let sa = b.0.angle(&c.0);
    let sb = c.0.angle(&a.0);
    let sc = a.0.angle(&b.0);
    let s = 0.5 * (sa + sb + sc);
    if s >= 3e-4 {
        // Consistency check: for triangles this large, l'Huilier's formula
        // loses too much precision unless the triangle is well-conditioned.
        let dmin = s - sa.max(sb.max(sc));
        if dmin < 1e-2 * s * s * s * s * s {
            // This triangle is skinny enough to use Girard's formula.
            let area = girard_area(a, b, c);
            if dmin < s * 0.1 * (area + 5e-15) {
                return area;
            }
        }
    }

    // Use l'Huilier's formula.
    4.0 * ((0.5 * s).tan()
        * (0.5 * (s - sa)).tan()
        * (0.5 * (s - sb)).tan()
        * (0.5 * (s - sc)).tan())
    .max(0.0)
    .sqrt()
    .atan()
}

/// Returns the area of the triangle computed using Girard's formula. This is
/// slightly faster than point_area but has poor relative accuracy for small
/// triangles.
pub fn girard_area(a: &Point, b: &Point, c: &Point) -> f64 {
    // This is equivalent to the usual Girard's formula but is slightly more
    // accurate, faster to compute, and handles a == b == c without a special
    // case.
    let ab = a.point_cross(b);
    let bc = b.point_cross(c);
    let ac = a.point_cross(c);
    let area = ab.0.angle(&ac.0) - ab.0.angle(&bc.0) + bc.0.angle(&ac.0);
    area.max(0.0)
}

/// Returns a positive value for counterclockwise triangles and a negative
/// value otherwise (with the magnitude equal to the triangle area).
pub fn signed_area(a: &Point, b: &Point, c: &Point) -> f64 {
    let dir: i32 = robust_sign(a, b, c).into();
    f64::from(dir) * point_area(a, b, c)
}

/// Returns the exterior angle at vertex B in the triangle ABC. The return
/// value is positive if ABC is counterclockwise and negative otherwise. If
/// you imagine an ant walking from A to B to C, this is the angle that the
/// ant turns at vertex B (positive = left = CCW, negative = right = CW).
/// The result is in the range (-π, π].
///
/// This quantity is also called the "geodesic curvature" at B.
pub fn turn_angle(a: &Point, b: &Point, c: &Point) -> f64 {
    // We use point_cross to get good accuracy when two points are very
    // close together, and robust_sign to ensure that the sign is correct for
    // turns that are close to 180 degrees.
    let angle = a.point_cross(b).0.angle(&b.point_cross(c).0);

    // Don't return 0 if the angle is exactly 180 degrees.
    if robust_sign(a, b, c) == Direction::CounterClockwise {
        angle
    } else {
        -angle
    }
}

/// Returns the true centroid of the spherical triangle ABC multiplied by the
/// signed area of spherical triangle ABC. The result is not normalized.
///
/// The reasons for multiplying by the signed area are (1) this is the quantity
/// that needs to be summed to compute the centroid of a union or difference
/// of triangles, and (2) it's actually easier to calculate this way. All
/// points must have unit length.
pub fn true_centroid(a: &Point, b: &Point, c: &Point) -> Point {
    // Use distance() to get accurate results for small triangles.
    let angle_a = b.0.angle(&c.0);
    let angle_b = c.0.angle(&a.0);
    let angle_c = a.0.angle(&b.0);
    let ra = if angle_a == 0.0 {
        1.0
    } else {
        angle_a / angle_a.sin()
    };
    let rb = if angle_b == 0.0 {
        1.0
    } else {
        angle_b / angle_b.sin()
    };
    let rc = if angle_c == 0.0 {
        1.0
    } else {
        angle_c / angle_c.sin()
    };

    // Now compute a point M such that:
    //
    //  [Ax Ay Az] [Mx]                       [ra]
    //  [Bx By Bz] [My]  = 0.5 * det(A,B,C) * [rb]
    //  [Cx Cy Cz] [Mz]                       [rc]
    //
    // To improve the numerical stability we subtract the first vertex A from
    // the other two vertices. This reduces cancellation error when A, B, and
    // C are very close together. Then we solve it using Cramer's rule.
    let x = Vector::new(a.0.x, b.0.x - a.0.x, c.0.x - a.0.x);
    let y = Vector::new(a.0.y, b.0.y - a.0.y, c.0.y - a.0.y);
    let z = Vector::new(a.0.z, b.0.z - a.0.z, c.0.z - a.0.z);
    let r = Vector::new(ra, rb - ra, rc - ra);
    Point(
        Vector::new(
            y.cross(&z).dot(&r),
            z.cross(&x).dot(&r),
            x.cross(&y).dot(&r),
        ) * 0.5,
    )
}

/// Returns the orthonormal frame for the given point on the unit sphere:
/// the point itself is the z-axis, and the x- and y-axes complete a
/// right-handed coordinate system.
pub fn get_frame(p: &Point) -> Matrix3<f64> {
    // Given the point p on the sphere, extend that into a coordinate frame:
    // z = p, x and y perpendicular to p and each other.
    let z = p.0;
    let y = p.ortho().0;
    let x = y.cross(&z);
    Matrix3::from_cols(
        Vector3::new(x.x, x.y, x.z),
        Vector3::new(y.x, y.y, y.z),
        Vector3::new(z.x, z.y, z.z),
    )
}

/// Returns the coordinates of the given point with respect to the standard
/// axes, assuming its current coordinates are expressed in the given frame.
pub fn from_frame(m: &Matrix3<f64>, q: &Point) -> Point {
    let v = m * Vector3::new(q.0.x, q.0.y, q.0.z);
    Point(Vector::new(v.x, v.y, v.z))
}

/// Generates a slice of points shaped as a regular polygon with the given
/// number of vertices, all located on a circle of the specified angular
/// radius around the z-axis of the given coordinate frame. The radius is the
/// actual distance from the center to each vertex.
pub fn regular_points_for_frame(
    frame: &Matrix3<f64>,
    radius: Angle,
    num_vertices: usize,
) -> Vec<Point> {
    // We construct the loop in the tangent plane at the frame center, where
    // a spherical radius r maps to a planar radius tan(r).
    let planar_radius = radius.rad().tan();
    let radian_step = 2.0 * PI / (num_vertices as f64);
    let mut vertices = Vec::with_capacity(num_vertices);
    for vi in 0..num_vertices {
        let angle = (vi as f64) * radian_step;
        let p = Point(Vector::new(
            planar_radius * angle.cos(),
            planar_radius * angle.sin(),
            1.0,
        ));
        vertices.push(from_frame(frame, &p).normalize());
    }
    vertices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_f64_eq;

    #[test]
    fn origin_is_unit_and_unremarkable() {
        let o = Point::origin();
        assert!(o.0.is_unit());
        assert!(o.0.z < 1.0 && o.0.z > 0.99);
    }

    #[test]
    fn point_cross_is_orthogonal() {
        let a = Point::from_coords(1.0, 0.1, -0.2);
        let b = Point::from_coords(0.3, 1.0, 0.4);
        let c = a.point_cross(&b);
        assert_f64_eq!(0.0, c.0.dot(&a.0), 1e-14);
        assert_f64_eq!(0.0, c.0.dot(&b.0), 1e-14);
    }

    #[test]
    fn octant_area() {
        let a = Point::from_coords(1.0, 0.0, 0.0);
        let b = Point::from_coords(0.0, 1.0, 0.0);
        let c = Point::from_coords(0.0, 0.0, 1.0);
        assert_f64_eq!(PI / 2.0, point_area(&a, &b, &c));
        assert_f64_eq!(PI / 2.0, signed_area(&a, &b, &c));
        assert_f64_eq!(-PI / 2.0, signed_area(&a, &c, &b));
    }

    #[test]
    fn small_triangle_area_has_relative_accuracy() {
        // A tiny right triangle near (1,0,0) with legs of 1e-6 radians.
        let eps = 1e-6;
        let a = Point::from_coords(1.0, 0.0, 0.0);
        let b = Point::from_coords(1.0, eps, 0.0);
        let c = Point::from_coords(1.0, 0.0, eps);
        let expected = 0.5 * eps * eps;
        let got = point_area(&a, &b, &c);
        assert!((got / expected - 1.0).abs() < 1e-4, "area {}", got);
    }

    #[test]
    fn ordered_ccw_axes() {
        let x = Point::from_coords(1.0, 0.0, 0.0);
        let y = Point::from_coords(0.0, 1.0, 0.0);
        let m = Point::from_coords(1.0, 1.0, 0.0);
        let o = Point::from_coords(0.0, 0.0, 1.0);
        assert!(ordered_ccw(&x, &m, &y, &o));
        assert!(!ordered_ccw(&y, &m, &x, &o));
        // Degenerate: a == b.
        assert!(ordered_ccw(&x, &x, &y, &o));
    }

    #[test]
    fn turn_angle_square_corner() {
        // Walking along the equator and turning up a meridian turns by π/2.
        let a = Point::from_coords(0.0, -1.0, 0.0);
        let b = Point::from_coords(1.0, 0.0, 0.0);
        let c = Point::from_coords(0.0, 0.0, 1.0);
        assert_f64_eq!(PI / 2.0, turn_angle(&a, &b, &c));
        assert_f64_eq!(-PI / 2.0, turn_angle(&c, &b, &a));
    }

    #[test]
    fn regular_points_radius() {
        let center = Point::from_coords(0.2, 0.5, 0.8);
        let frame = get_frame(&center);
        let radius = Angle::from(crate::s1::Deg(10.0));
        let pts = regular_points_for_frame(&frame, radius, 16);
        assert_eq!(16, pts.len());
        for p in &pts {
            assert!(p.0.is_unit());
            assert_f64_eq!(radius.rad(), center.distance(p).rad(), 1e-13);
        }
    }
}
