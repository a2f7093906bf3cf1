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

// This file contains the functions for clipping geodesic edges to cube
// faces and to rectangles in (u,v)-space, together with the provable error
// bounds of each operation.

use crate::consts::DBL_EPSILON;
use crate::r2;
use crate::r3::vector::Vector;
use crate::s2::point::Point;
use crate::s2::stuv::{face, face_xyz_to_uvw, valid_face_xyz_to_uv};

/// The maximum error in a u- or v-coordinate of a clipped edge endpoint
/// compared to the exact result, assuming that the points A and B are in the
/// rectangle [-1,1]x[-1,1] or slightly outside it (by 1e-10 or less).
pub const EDGE_CLIP_ERROR_UV_COORD: f64 = 2.25 * DBL_EPSILON;

/// The maximum distance from a clipped point to the corresponding exact
/// result in (u,v)-space.
pub const EDGE_CLIP_ERROR_UV_DIST: f64 = 2.25 * DBL_EPSILON;

/// The maximum angle between a returned vertex and the nearest point on the
/// exact edge AB, expressed as the maximum error in an individual u- or
/// v-coordinate. In other words, for each returned vertex there is a point
/// on the exact edge AB whose u- and v-coordinates differ from the vertex by
/// at most this amount.
pub const FACE_CLIP_ERROR_UV_COORD: f64 = 9.0 * (1.0 / std::f64::consts::SQRT_2) * DBL_EPSILON;

/// The maximum distance from a clipped point to the corresponding exact
/// result in (u,v)-space.
pub const FACE_CLIP_ERROR_UV_DIST: f64 = 9.0 * DBL_EPSILON;

/// The maximum error in edge_intersects_rect when deciding whether an edge
/// intersects a rectangle in (u,v)-space.
pub const INTERSECTS_RECT_ERROR_UV_DIST: f64 = 3.0 * std::f64::consts::SQRT_2 * DBL_EPSILON;

// A direction vector expressed in the (u,v,w) coordinate frame of a face.
#[derive(Debug, Copy, Clone)]
struct PointUvw(Vector);

impl PointUvw {
    // Reports whether a line through this normal vector (of the great
    // circle AB) intersects the face. This is true exactly when
    // |Nu| + |Nv| >= |Nw|, evaluated exactly.
    fn intersects_face(&self) -> bool {
        let u = self.0.x.abs();
        let v = self.0.y.abs();
        let w = self.0.z.abs();
        // We only need to consider the cases where u or v is the smallest
        // value, since if w is the smallest then both expressions below will
        // have a positive LHS and a negative RHS.
        v >= w - u && u >= w - v
    }

    // Reports whether the great circle with this normal intersects two
    // opposite edges of the cube face (i.e. it enters through one u-edge and
    // exits through the other, or similarly for v).
    fn intersects_opposite_edges(&self) -> bool {
        let u = self.0.x.abs();
        let v = self.0.y.abs();
        let w = self.0.z.abs();

        // The line L intersects opposite edges of the [-1,1]x[-1,1] (u,v)
        // square if and only if ||Nu| - |Nv|| >= |Nw|.
        if (u - v).abs() != w {
            return (u - v).abs() >= w;
        }
        // Otherwise u - v = w exactly, or w is not the smallest value. In
        // either case the following returns the correct result.
        if u >= v {
            u - w >= v
        } else {
            v - w >= u
        }
    }

    // Returns the axis (0 = u, 1 = v) on which the line with this normal
    // exits the face.
    fn exit_axis(&self) -> usize {
        if self.intersects_opposite_edges() {
            // The line passes through opposite edges of the face. It exits
            // through the v=+1 or v=-1 edge if the u-component of N is
            // larger.
            if self.0.x.abs() >= self.0.y.abs() {
                return 1;
            }
            return 0;
        }
        // The line passes through two adjacent edges of the face. It exits
        // through the v=+1 or v=-1 edge if an even number of the components
        // of N are negative. We test this using sign bits rather than
        // multiplication to avoid the possibility of underflow.
        let x = self.0.x.is_sign_negative() as u8;
        let y = self.0.y.is_sign_negative() as u8;
        let z = self.0.z.is_sign_negative() as u8;
        if x ^ y ^ z == 0 {
            1
        } else {
            0
        }
    }

    // Returns the (u,v) coordinates of the point where the great circle
    // with this normal exits the face along the given axis.
    fn exit_point(&self, axis: usize) -> r2::Point {
        if axis == 0 {
            let u = if self.0.y > 0.0 { 1.0 } else { -1.0 };
            r2::Point::new(u, (-u * self.0.x - self.0.z) / self.0.y)
        } else {
            let v = if self.0.x < 0.0 { 1.0 } else { -1.0 };
            r2::Point::new((-v * self.0.y - self.0.z) / self.0.x, v)
        }
    }
}

// Returns the score and the (u,v) coordinates for the portion of the edge
// AB which is closest to B on the given face, where A and B are expressed
// in the (u,v,w) coordinates of that face. The score is 0 if the returned
// point is inside the face, and positive otherwise; if the total score of
// both endpoints is 3 or more then the edge does not intersect the face.
fn clip_destination(
    a: &PointUvw,
    b: &PointUvw,
    scaled_n: &PointUvw,
    a_tan: &PointUvw,
    b_tan: &PointUvw,
    scale_uv: f64,
) -> (r2::Point, i32) {
    let max_safe_uv_coord = 1.0 - FACE_CLIP_ERROR_UV_COORD;

    // If the destination may be in the face, use it.
    if b.0.z > 0.0 {
        let uv = r2::Point::new(b.0.x / b.0.z, b.0.y / b.0.z);
        if uv.x.abs().max(uv.y.abs()) <= max_safe_uv_coord {
            return (uv, 0);
        }
    }

    // Otherwise find the point B' where the line AB exits the face.
    let exit = scaled_n.exit_point(scaled_n.exit_axis());
    let mut uv = r2::Point::new(exit.x * scale_uv, exit.y * scale_uv);
    let p = Vector::new(uv.x, uv.y, 1.0);

    // Determine if the exit point B' is contained within the segment. We do
    // this by computing the dot products with two inward-facing tangent
    // vectors at A and B. If either dot product is negative, we say that B'
    // is on the "wrong side" of that point. As the point B' moves around the
    // great circle AB past the segment endpoint B, it is initially on the
    // wrong side of B only; as it moves further it is on the wrong side of
    // both endpoints; and then it is on the wrong side of A only.
    let mut score = 0;
    if (p - a.0).dot(&a_tan.0) < 0.0 {
        score = 2; // B' is on wrong side of A.
    } else if (p - b.0).dot(&b_tan.0) < 0.0 {
        score = 1; // B' is on wrong side of B.
    }

    if score > 0 {
        // B' is not in the interior of AB.
        if b.0.z <= 0.0 {
            score = 3; // B cannot be projected onto this face.
        } else {
            uv = r2::Point::new(b.0.x / b.0.z, b.0.y / b.0.z);
        }
    }

    (uv, score)
}

/// Returns the (u,v) coordinates for the portion of the edge AB that
/// intersects the given face, or None if the edge AB does not intersect.
/// The result is padded on each side: given a padding distance of zero, the
/// clipped coordinates are guaranteed to be within FACE_CLIP_ERROR_UV_DIST
/// of the exact result.
pub fn clip_to_padded_face(
    a: &Point,
    b: &Point,
    f: u8,
    padding: f64,
) -> Option<(r2::Point, r2::Point)> {
    // Fast path: both endpoints are on the given face.
    if face(&a.0) == f && face(&b.0) == f {
        let (au, av) = valid_face_xyz_to_uv(f, &a.0);
        let (bu, bv) = valid_face_xyz_to_uv(f, &b.0);
        return Some((r2::Point::new(au, av), r2::Point::new(bu, bv)));
    }

    // Convert everything into the (u,v,w) coordinates of the given face.
    // Note that the cross product *must* be computed in the original (x,y,z)
    // coordinate system because point_cross (unlike the mathematical cross
    // product) can produce different results in different coordinate systems
    // when one argument is a linear multiple of the other, due to the use of
    // symbolic perturbations.
    let norm_uvw = PointUvw(face_xyz_to_uvw(f, &a.point_cross(b)).0);
    let a_uvw = PointUvw(face_xyz_to_uvw(f, a).0);
    let b_uvw = PointUvw(face_xyz_to_uvw(f, b).0);

    // Padding is handled by scaling the u- and v-components of the normal.
    // Letting R=1+padding, this means that when we compute the dot product
    // of the normal with a cube face vertex (such as (-1,-1,1)), we will
    // actually compute the dot product with the scaled vertex (-R,-R,1).
    // This allows methods such as intersects_face, exit_axis, etc, to handle
    // padding with no further modifications.
    let scale_uv = 1.0 + padding;
    let scaled_n = PointUvw(Vector::new(
        scale_uv * norm_uvw.0.x,
        scale_uv * norm_uvw.0.y,
        norm_uvw.0.z,
    ));
    if !scaled_n.intersects_face() {
        return None;
    }

    // A version of the normal that is scaled up when its components are all
    // tiny, to avoid loss of precision in the normalization below.
    let norm_uvw = if norm_uvw.0.x.abs().max(norm_uvw.0.y.abs().max(norm_uvw.0.z.abs()))
        < f64::powi(2.0, -511)
    {
        PointUvw(norm_uvw.0 * f64::powi(2.0, 563))
    } else {
        norm_uvw
    };
    let norm_uvw = PointUvw(norm_uvw.0.normalize());

    let a_tan = PointUvw(norm_uvw.0.cross(&a_uvw.0));
    let b_tan = PointUvw(b_uvw.0.cross(&norm_uvw.0));

    // As described in clip_destination, if the sum of the scores from
    // clipping the two endpoints is 3 or more, then the segment does not
    // intersect this face.
    let neg_n = PointUvw(-scaled_n.0);
    let (a_uv, a_score) = clip_destination(&b_uvw, &a_uvw, &neg_n, &b_tan, &a_tan, scale_uv);
    let (b_uv, b_score) = clip_destination(&a_uvw, &b_uvw, &scaled_n, &a_tan, &b_tan, scale_uv);
    if a_score + b_score < 3 {
        Some((a_uv, b_uv))
    } else {
        None
    }
}

/// Returns the (u,v) coordinates for the portion of the edge AB that
/// intersects the given face with no padding.
pub fn clip_to_face(a: &Point, b: &Point, f: u8) -> Option<(r2::Point, r2::Point)> {
    clip_to_padded_face(a, b, f, 0.0)
}

/// Reports whether the edge defined by AB intersects the given closed
/// rectangle, within the error bound INTERSECTS_RECT_ERROR_UV_DIST.
pub fn edge_intersects_rect(a: &r2::Point, b: &r2::Point, r: &r2::Rect) -> bool {
    // First check whether the bound of AB intersects the rectangle.
    if !r.intersects(&r2::Rect::from_points(&[*a, *b])) {
        return false;
    }

    // Otherwise AB intersects the rect if and only if all four vertices of
    // the rect are not on the same side of the line AB. We test this by
    // finding the two vertices of the rect with minimum and maximum
    // projections onto the normal of AB, and computing their dot products
    // with the edge normal.
    let n = (*b - *a).ortho();
    let i = usize::from(n.x >= 0.0);
    let j = usize::from(n.y >= 0.0);

    let max = n.dot(&(r.vertex_ij(i, j) - *a));
    let min = n.dot(&(r.vertex_ij(1 - i, 1 - j) - *a));
    max >= 0.0 && min <= 0.0
}

/// Returns the value of the linear interpolation of (a1, b1) at the point x
/// on the axis spanned by (a, b). It is an error to call with a == b. The
/// endpoint whose distance from x is larger is used as the interpolation
/// origin in order to minimize cancellation error.
pub fn interpolate_f64(x: f64, a: f64, b: f64, a1: f64, b1: f64) -> f64 {
    if (a - x).abs() > (b - x).abs() {
        b1 + (a1 - b1) * (x - b) / (a - b)
    } else {
        a1 + (b1 - a1) * (x - a) / (a - b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_f64_eq;
    use crate::s2::stuv::face_uv_to_xyz;

    #[test]
    fn clip_same_face_is_exact() {
        let a = Point(face_uv_to_xyz(3, 0.2, -0.6).normalize());
        let b = Point(face_uv_to_xyz(3, -0.1, 0.4).normalize());
        let (auv, buv) = clip_to_face(&a, &b, 3).unwrap();
        assert_f64_eq!(0.2, auv.x, 1e-14);
        assert_f64_eq!(-0.6, auv.y, 1e-14);
        assert_f64_eq!(-0.1, buv.x, 1e-14);
        assert_f64_eq!(0.4, buv.y, 1e-14);
    }

    #[test]
    fn clip_edge_crossing_faces() {
        // An edge from the center of face 0 to the center of face 1 clips to
        // both faces but not to the back face 3.
        let a = Point::from_coords(1.0, 0.0, 0.0);
        let b = Point::from_coords(0.0, 1.0, 0.0);
        let c0 = clip_to_face(&a, &b, 0);
        let c1 = clip_to_face(&a, &b, 1);
        assert!(c0.is_some());
        assert!(c1.is_some());
        assert!(clip_to_face(&a, &b, 3).is_none());
        // The clipped segment on face 0 runs from the center to the u=1 edge.
        let (a0, b0) = c0.unwrap();
        assert_f64_eq!(0.0, a0.x);
        assert_f64_eq!(0.0, a0.y);
        assert_f64_eq!(1.0, b0.x, 1e-12);
    }

    #[test]
    fn clip_with_padding_widens() {
        // An edge that barely misses face 2 is accepted with padding.
        let a = Point(face_uv_to_xyz(2, 1.0001, 0.0).normalize());
        let b = Point(face_uv_to_xyz(2, 1.0001, 0.5).normalize());
        assert!(clip_to_padded_face(&a, &b, 2, 0.01).is_some());
    }

    #[test]
    fn intersects_rect_cases() {
        let r = r2::Rect::from_points(&[r2::Point::new(0.0, 0.0), r2::Point::new(1.0, 1.0)]);
        // Diagonal through the rect.
        assert!(edge_intersects_rect(
            &r2::Point::new(-0.5, -0.5),
            &r2::Point::new(1.5, 1.5),
            &r
        ));
        // A segment passing fully to one side.
        assert!(!edge_intersects_rect(
            &r2::Point::new(-1.0, 2.0),
            &r2::Point::new(2.0, 2.0),
            &r
        ));
        // A segment ending inside the rect.
        assert!(edge_intersects_rect(
            &r2::Point::new(0.5, 0.5),
            &r2::Point::new(2.0, 2.0),
            &r
        ));
    }

    #[test]
    fn interpolate_endpoints() {
        assert_f64_eq!(3.0, interpolate_f64(0.0, 0.0, 1.0, 3.0, 5.0));
        assert_f64_eq!(5.0, interpolate_f64(1.0, 0.0, 1.0, 3.0, 5.0));
        assert_f64_eq!(4.0, interpolate_f64(0.5, 0.0, 1.0, 3.0, 5.0));
    }
}
