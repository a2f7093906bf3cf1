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

// This file implements the coordinate systems used to project points from
// the unit sphere onto the six faces of the unit cube, and the discrete
// (i,j) and (si,ti) grids on each face:
//
//	(x, y, z) - points on the unit sphere
//	(face, u, v) - cube-space coordinates in the range [-1, 1]
//	(face, s, t) - cell-space coordinates in the range [0, 1]
//	(face, si, ti) - discrete cell-space coordinates, double resolution
//	(face, i, j) - leaf-cell coordinates

use crate::r3::vector::{Axis, Vector};
use crate::s2::cellid::MAX_LEVEL;
use crate::s2::point::Point;

/// The number of leaf cells along one edge of a face.
pub const MAX_SIZE: i64 = 1 << MAX_LEVEL;

/// The maximum value of an si- or ti-coordinate. The range of valid (si,ti)
/// values is [0..MAX_SITI].
pub const MAX_SITI: u64 = (MAX_SIZE as u64) << 1;

/// Converts an s- or t-value to the corresponding u- or v-value. This is a
/// non-linear transformation from [0,1] to [-1,1], chosen so that the cells
/// at each level have approximately equal area.
pub fn st_to_uv(s: f64) -> f64 {
    if s >= 0.5 {
        (1.0 / 3.0) * (4.0 * s * s - 1.0)
    } else {
        (1.0 / 3.0) * (1.0 - 4.0 * (1.0 - s) * (1.0 - s))
    }
}

/// The inverse of st_to_uv. Note that it is not always true that
/// uv_to_st(st_to_uv(x)) == x due to numerical errors.
pub fn uv_to_st(u: f64) -> f64 {
    if u >= 0.0 {
        0.5 * (1.0 + 3.0 * u).sqrt()
    } else {
        1.0 - 0.5 * (1.0 - 3.0 * u).sqrt()
    }
}

/// Converts an si- or ti-value to the corresponding s- or t-value.
pub fn siti_to_st(si: u64) -> f64 {
    if si > MAX_SITI {
        return 1.0;
    }
    (si as f64) / (MAX_SITI as f64)
}

/// Converts the s- or t-value to the nearest si- or ti-coordinate. The
/// result may be outside the range of valid (si,ti)-values.
pub fn st_to_siti(s: f64) -> u64 {
    if s < 0.0 {
        (s * MAX_SITI as f64 - 0.5) as i64 as u64
    } else {
        (s * MAX_SITI as f64 + 0.5) as i64 as u64
    }
}

/// Converts value in ST coordinates to a value in IJ coordinates.
pub fn st_to_ij(s: f64) -> i32 {
    ((MAX_SIZE as f64 * s).floor() as i64).clamp(0, MAX_SIZE - 1) as i32
}

/// Returns the face containing the given direction vector. At most one of
/// the faces contains the direction; points along face boundaries are
/// assigned deterministically.
pub fn face(r: &Vector) -> u8 {
    let f = r.largest_component();
    match f {
        Axis::X if r.x < 0.0 => 3,
        Axis::X => 0,
        Axis::Y if r.y < 0.0 => 4,
        Axis::Y => 1,
        Axis::Z if r.z < 0.0 => 5,
        Axis::Z => 2,
    }
}

/// Turns face and UV coordinates into an unnormalized 3-vector.
pub fn face_uv_to_xyz(face: u8, u: f64, v: f64) -> Vector {
    match face {
        0 => Vector::new(1.0, u, v),
        1 => Vector::new(-u, 1.0, v),
        2 => Vector::new(-u, -v, 1.0),
        3 => Vector::new(-1.0, -v, -u),
        4 => Vector::new(v, -1.0, -u),
        _ => Vector::new(v, u, -1.0),
    }
}

/// Given a valid face for the given point r (meaning that dot product of r
/// with the face normal is positive), returns the corresponding u and v
/// values, which may lie outside the range [-1,1].
pub fn valid_face_xyz_to_uv(face: u8, r: &Vector) -> (f64, f64) {
    match face {
        0 => (r.y / r.x, r.z / r.x),
        1 => (-r.x / r.y, r.z / r.y),
        2 => (-r.x / r.z, -r.y / r.z),
        3 => (r.z / r.x, r.y / r.x),
        4 => (r.z / r.y, -r.x / r.y),
        _ => (-r.y / r.z, -r.x / r.z),
    }
}

/// Converts a direction vector (not necessarily unit length) to
/// (face, u, v) coordinates.
pub fn xyz_to_face_uv(r: &Vector) -> (u8, f64, f64) {
    let f = face(r);
    let (u, v) = valid_face_xyz_to_uv(f, r);
    (f, u, v)
}

/// Transforms the given point P to the (u,v,w) coordinate frame of the given
/// face where the w-axis represents the face normal.
pub fn face_xyz_to_uvw(face: u8, p: &Point) -> Point {
    // The result coordinates are simply the dot products of P with the (u,v,w)
    // axes for the given face.
    let v = p.0;
    match face {
        0 => Point(Vector::new(v.y, v.z, v.x)),
        1 => Point(Vector::new(-v.x, v.z, v.y)),
        2 => Point(Vector::new(-v.x, -v.y, v.z)),
        3 => Point(Vector::new(-v.z, -v.y, -v.x)),
        4 => Point(Vector::new(-v.z, v.x, -v.y)),
        _ => Point(Vector::new(v.y, v.x, -v.z)),
    }
}

/// Converts a cell-space (face, si, ti) coordinate to a point on the unit
/// sphere (not normalized).
pub fn face_siti_to_xyz(face: u8, si: u64, ti: u64) -> Point {
    Point(face_uv_to_xyz(
        face,
        st_to_uv(siti_to_st(si)),
        st_to_uv(siti_to_st(ti)),
    ))
}

/// Converts a point to (face, si, ti) coordinates, and the level the given
/// point would be snapped at if it were a cell center. Returns level -1 if
/// the point is not a cell center at any level.
pub fn xyz_to_face_si_ti(p: &Point) -> (u8, u64, u64, i32) {
    let (face, u, v) = xyz_to_face_uv(&p.0);
    let si = st_to_siti(uv_to_st(u));
    let ti = st_to_siti(uv_to_st(v));

    // If the levels corresponding to si,ti are not equal, then p is not a cell
    // center. The si,ti values 0 and MAX_SITI need to be handled specially
    // because they do not correspond to cell centers at any valid level; they
    // are mapped to level -1 by the code below.
    let level = MAX_LEVEL - (si | MAX_SITI).trailing_zeros() as i32;
    if level < 0 || level != MAX_LEVEL - (ti | MAX_SITI).trailing_zeros() as i32 {
        return (face, si, ti, -1);
    }

    // In infinite precision, this test could be changed to ST == SiTi.
    // However, due to rounding errors, uv_to_st(xyz_to_face_uv(face_uv_to_xyz(
    // st_to_uv(...)))) is not idempotent. On the other hand, the center is
    // computed exactly the same way p was originally computed (if it is the
    // center of a cell): the comparison can be exact.
    let center = face_siti_to_xyz(face, si, ti).normalize();
    if *p == center {
        (face, si, ti, level)
    } else {
        (face, si, ti, -1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_f64_eq;
    use crate::s2::cellid::CellId;

    #[test]
    fn st_uv_roundtrip() {
        for i in 0..=100 {
            let s = i as f64 / 100.0;
            assert_f64_eq!(s, uv_to_st(st_to_uv(s)), 1e-14);
        }
        assert_f64_eq!(-1.0, st_to_uv(0.0));
        assert_f64_eq!(1.0, st_to_uv(1.0));
        assert_f64_eq!(0.0, st_to_uv(0.5));
    }

    #[test]
    fn face_uv_roundtrip() {
        for f in 0u8..6 {
            let p = face_uv_to_xyz(f, 0.25, -0.5);
            let (f2, u, v) = xyz_to_face_uv(&p);
            assert_eq!(f, f2);
            assert_f64_eq!(0.25, u);
            assert_f64_eq!(-0.5, v);
        }
    }

    #[test]
    fn face_centers() {
        assert_eq!(0, face(&Vector::new(1.0, 0.0, 0.0)));
        assert_eq!(3, face(&Vector::new(-1.0, 0.0, 0.0)));
        assert_eq!(1, face(&Vector::new(0.0, 1.0, 0.0)));
        assert_eq!(4, face(&Vector::new(0.0, -1.0, 0.0)));
        assert_eq!(2, face(&Vector::new(0.0, 0.0, 1.0)));
        assert_eq!(5, face(&Vector::new(0.0, 0.0, -1.0)));
    }

    #[test]
    fn uvw_frame_is_rotation() {
        for f in 0u8..6 {
            let w = face_xyz_to_uvw(f, &Point(face_uv_to_xyz(f, 0.0, 0.0).normalize()));
            assert_f64_eq!(0.0, w.0.x);
            assert_f64_eq!(0.0, w.0.y);
            assert_f64_eq!(1.0, w.0.z);
        }
    }

    #[test]
    fn si_ti_of_cell_center() {
        let id = CellId::from_face(2).child_begin_at_level(10).next();
        let center = id.point();
        let (face, _si, _ti, level) = xyz_to_face_si_ti(&center);
        assert_eq!(id.face(), face);
        assert_eq!(10, level);
        // A nudged point is not a cell center at any level.
        let off = Point::from_coords(center.0.x + 1e-9, center.0.y, center.0.z);
        let (_, _, _, level2) = xyz_to_face_si_ti(&off);
        assert_eq!(-1, level2);
    }
}
