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

use crate::error::{Error, Result};
use crate::s2::cellid::{CellId, MAX_LEVEL};
use crate::s2::coder::{Decoder, Encoder};
use crate::s2::point::Point;
use crate::s2::stuv::xyz_to_face_si_ti;

/// XyzFaceSiTi represents the (face, si, ti) coordinates of a point
/// together with the point itself, and the level at which the point is a
/// cell center (-1 if it is not a cell center at any level).
#[derive(Debug, Copy, Clone)]
pub struct XyzFaceSiTi {
    pub xyz: Point,
    pub face: u8,
    pub si: u64,
    pub ti: u64,
    pub cell_level: i32,
}

impl XyzFaceSiTi {
    /// Computes the cell-space coordinates of the given point.
    pub fn from_point(p: &Point) -> XyzFaceSiTi {
        let (face, si, ti, cell_level) = xyz_to_face_si_ti(p);
        XyzFaceSiTi {
            xyz: *p,
            face,
            si,
            ti,
            cell_level,
        }
    }
}

/// Encodes a list of points into the compressed point block. Points that
/// are centers of cells at the given snap level are stored as the delta
/// between consecutive cell ids (zigzag varint); all other points are
/// recorded in an exception block with their full coordinates, so the
/// round trip is lossless for them as well.
pub fn encode_points_compressed(vertices: &[XyzFaceSiTi], level: i32, e: &mut Encoder) {
    debug_assert!(level >= 0 && level <= MAX_LEVEL);

    let mut prev: i64 = 0;
    for v in vertices {
        let id = CellId::from_point(&v.xyz).parent(level);
        let cur = id.0 as i64;
        e.put_zigzag64(cur.wrapping_sub(prev));
        prev = cur;
    }

    // Exceptions: points that are not cell centers at the snap level are
    // stored verbatim.
    let exceptions: Vec<(u32, &XyzFaceSiTi)> = vertices
        .iter()
        .enumerate()
        .filter(|(_, v)| v.cell_level != level)
        .map(|(i, v)| (i as u32, v))
        .collect();
    e.put_varint32(exceptions.len() as u32);
    for (i, v) in exceptions {
        e.put_varint32(i);
        e.put_f64(v.xyz.0.x);
        e.put_f64(v.xyz.0.y);
        e.put_f64(v.xyz.0.z);
    }
}

/// Decodes a point block written by encode_points_compressed.
pub fn decode_points_compressed(d: &mut Decoder<'_>, n: usize, level: i32) -> Result<Vec<Point>> {
    let mut points = Vec::with_capacity(n);
    let mut prev: i64 = 0;
    for _ in 0..n {
        let delta = d.get_zigzag64()?;
        let cur = prev.wrapping_add(delta);
        prev = cur;
        let id = CellId(cur as u64);
        if !id.is_valid() || id.level() != level {
            return Err(Error::Decode("invalid snapped cell id"));
        }
        points.push(id.point());
    }

    let num_exceptions = d.get_varint32()? as usize;
    for _ in 0..num_exceptions {
        let i = d.get_varint32()? as usize;
        if i >= n {
            return Err(Error::Decode("exception index out of range"));
        }
        let x = d.get_f64()?;
        let y = d.get_f64()?;
        let z = d.get_f64()?;
        points[i] = Point(crate::r3::vector::Vector::new(x, y, z));
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::s1::{Angle, Deg};
    use crate::s2::point::{get_frame, regular_points_for_frame};

    fn snapped(points: &[Point], level: i32) -> Vec<Point> {
        points
            .iter()
            .map(|p| CellId::from_point(p).parent(level).point())
            .collect()
    }

    fn face_si_ti(points: &[Point]) -> Vec<XyzFaceSiTi> {
        points.iter().map(XyzFaceSiTi::from_point).collect()
    }

    #[test]
    fn snapped_points_roundtrip_exact() {
        let center = Point::from_coords(0.3, 0.9, -0.2);
        let frame = get_frame(&center);
        let raw = regular_points_for_frame(&frame, Angle::from(Deg(2.0)), 17);
        let level = 20;
        let pts = snapped(&raw, level);
        let cells = face_si_ti(&pts);
        // Snapping must be recognized.
        assert!(cells.iter().all(|c| c.cell_level == level));

        let mut e = Encoder::new();
        encode_points_compressed(&cells, level, &mut e);
        let bytes = e.into_bytes();
        let mut d = Decoder::new(&bytes);
        let got = decode_points_compressed(&mut d, pts.len(), level).unwrap();
        assert_eq!(pts, got);
    }

    #[test]
    fn unsnapped_points_stored_as_exceptions() {
        let center = Point::from_coords(-0.4, 0.2, 0.7);
        let frame = get_frame(&center);
        let raw = regular_points_for_frame(&frame, Angle::from(Deg(1.0)), 9);
        let cells = face_si_ti(&raw);
        assert!(cells.iter().all(|c| c.cell_level == -1));

        let mut e = Encoder::new();
        encode_points_compressed(&cells, 12, &mut e);
        let bytes = e.into_bytes();
        let mut d = Decoder::new(&bytes);
        let got = decode_points_compressed(&mut d, raw.len(), 12).unwrap();
        // Exceptions round-trip bit-for-bit.
        assert_eq!(raw, got);
    }

    #[test]
    fn mixed_points_roundtrip() {
        let center = Point::from_coords(1.0, 1.0, 1.0);
        let frame = get_frame(&center);
        let raw = regular_points_for_frame(&frame, Angle::from(Deg(5.0)), 8);
        let level = 17;
        let mut pts = snapped(&raw, level);
        pts[3] = raw[3];
        pts[6] = raw[6];
        let cells = face_si_ti(&pts);

        let mut e = Encoder::new();
        encode_points_compressed(&cells, level, &mut e);
        let bytes = e.into_bytes();
        let got = decode_points_compressed(&mut Decoder::new(&bytes), pts.len(), level).unwrap();
        assert_eq!(pts, got);
    }

    #[test]
    fn truncated_block_fails() {
        let center = Point::from_coords(0.3, 0.9, -0.2);
        let frame = get_frame(&center);
        let raw = regular_points_for_frame(&frame, Angle::from(Deg(2.0)), 4);
        let cells = face_si_ti(&snapped(&raw, 10));
        let mut e = Encoder::new();
        encode_points_compressed(&cells, 10, &mut e);
        let bytes = e.into_bytes();
        let mut d = Decoder::new(&bytes[..bytes.len() / 2]);
        assert!(decode_points_compressed(&mut d, 4, 10).is_err());
    }
}
