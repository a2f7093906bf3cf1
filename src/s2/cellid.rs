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

use lazy_static::lazy_static;

use crate::r3::vector::Vector;
use crate::s2::point::Point;
use crate::s2::stuv::{face_uv_to_xyz, siti_to_st, st_to_ij, st_to_uv, uv_to_st, xyz_to_face_uv};

/// The number of bits used to encode the face number.
pub const FACE_BITS: u64 = 3;

/// The number of faces of the cube.
pub const NUM_FACES: u8 = 6;

/// The deepest subdivision level of the cell hierarchy.
pub const MAX_LEVEL: i32 = 30;

/// The number of bits used to encode the position along the Hilbert curve.
pub const POS_BITS: u64 = 2 * (MAX_LEVEL as u64) + 1;

pub(crate) const LOOKUP_BITS: u64 = 4;
pub(crate) const SWAP_MASK: u8 = 0x01;
pub(crate) const INVERT_MASK: u8 = 0x02;

// The following lookup tables map 4 bits of the (i,j) coordinates and the
// current Hilbert curve orientation to 8 bits of curve position, and back.
//
// posToIJ[orientation][pos] gives the (i,j) index packed as (i << 1) | j of
// the child at position pos, and posToOrientation[pos] gives the orientation
// delta to add for that child.
pub(crate) static POS_TO_IJ: [[u8; 4]; 4] = [
    [0, 1, 3, 2], // canonical order:    (0,0), (0,1), (1,1), (1,0)
    [0, 2, 3, 1], // axes swapped:       (0,0), (1,0), (1,1), (0,1)
    [3, 2, 0, 1], // bits inverted:      (1,1), (1,0), (0,0), (0,1)
    [3, 1, 0, 2], // swapped & inverted: (1,1), (0,1), (0,0), (1,0)
];

// The inverse of POS_TO_IJ, for each orientation.
pub(crate) static IJ_TO_POS: [[u8; 4]; 4] = [
    [0, 1, 3, 2], // canonical order
    [0, 3, 1, 2], // axes swapped
    [2, 3, 1, 0], // bits inverted
    [2, 1, 3, 0], // swapped & inverted
];

pub(crate) static POS_TO_ORIENTATION: [u8; 4] = [SWAP_MASK, 0, 0, INVERT_MASK | SWAP_MASK];

struct Lookup {
    pos: Vec<u16>,
    ij: Vec<u16>,
}

fn init_lookup_cell(
    lookup: &mut Lookup,
    level: u64,
    i: u64,
    j: u64,
    orig_orientation: u8,
    orientation: u8,
    pos: u64,
) {
    if level == LOOKUP_BITS {
        let ij = (i << LOOKUP_BITS) + j;
        lookup.pos[((ij << 2) + orig_orientation as u64) as usize] =
            ((pos << 2) + orientation as u64) as u16;
        lookup.ij[((pos << 2) + orig_orientation as u64) as usize] =
            ((ij << 2) + orientation as u64) as u16;
        return;
    }

    let level = level + 1;
    let i = i << 1;
    let j = j << 1;
    let pos = pos << 2;
    let r = &POS_TO_IJ[orientation as usize];
    for index in 0..4u64 {
        let ij = r[index as usize] as u64;
        init_lookup_cell(
            lookup,
            level,
            i + (ij >> 1),
            j + (ij & 1),
            orig_orientation,
            orientation ^ POS_TO_ORIENTATION[index as usize],
            pos + index,
        );
    }
}

lazy_static! {
    static ref LOOKUP: Lookup = {
        let size = 1usize << (2 * LOOKUP_BITS + 2);
        let mut lookup = Lookup {
            pos: vec![0; size],
            ij: vec![0; size],
        };
        init_lookup_cell(&mut lookup, 0, 0, 0, 0, 0, 0);
        init_lookup_cell(&mut lookup, 0, 0, 0, SWAP_MASK, SWAP_MASK, 0);
        init_lookup_cell(&mut lookup, 0, 0, 0, INVERT_MASK, INVERT_MASK, 0);
        init_lookup_cell(
            &mut lookup,
            0,
            0,
            0,
            SWAP_MASK | INVERT_MASK,
            SWAP_MASK | INVERT_MASK,
            0,
        );
        lookup
    };
}

/// CellId uniquely identifies a cell in the cell decomposition of the
/// sphere. The most significant 3 bits encode the face number, followed by
/// the Hilbert curve position on that face (2 bits per level), followed by a
/// trailing "1" marker bit that identifies the level.
///
/// Sequentially increasing cell ids follow a continuous space-filling curve
/// over the entire sphere. They have the following properties:
///
///   - The id of a cell at level k consists of a 3-bit face number followed
///     by k bit pairs that recursively select one of the four children of
///     each cell.
///   - cells are ordered such that the range of leaf cells spanned by any
///     cell is contiguous.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId(pub u64);

impl CellId {
    /// Returns the cell corresponding to a given face in the range [0, 5].
    pub fn from_face(face: u8) -> CellId {
        CellId(((face as u64) << POS_BITS) + lsb_for_level(0))
    }

    /// Constructs a leaf cell containing the given point.
    pub fn from_point(p: &Point) -> CellId {
        let (f, u, v) = xyz_to_face_uv(&p.0);
        let i = st_to_ij(uv_to_st(u));
        let j = st_to_ij(uv_to_st(v));
        CellId::from_face_ij(f, i, j)
    }

    /// Returns a cell given its face, leaf (i,j) coordinates within that
    /// face and the leaf level.
    pub fn from_face_ij(f: u8, i: i32, j: i32) -> CellId {
        // Note that this value gets shifted one bit to the left at the end
        // of the function.
        let mut n = (f as u64) << (POS_BITS - 1);
        // Alternating faces have opposite Hilbert curve orientations; this
        // is necessary in order for all faces to have a right-handed
        // coordinate system.
        let mut bits = (f & SWAP_MASK) as u64;

        // Each iteration maps 4 bits of "i" and "j" into 8 bits of the
        // Hilbert curve position. The lookup table transforms a 10-bit key
        // consisting of 4 bits of i, 4 bits of j, and 2 orientation bits to
        // 8 bits of curve position plus 2 new orientation bits.
        let mask = (1u64 << LOOKUP_BITS) - 1;
        for k in (0..8u64).rev() {
            bits += (((i as u64) >> (k * LOOKUP_BITS)) & mask) << (LOOKUP_BITS + 2);
            bits += (((j as u64) >> (k * LOOKUP_BITS)) & mask) << 2;
            bits = LOOKUP.pos[bits as usize] as u64;
            n |= (bits >> 2) << (k * 2 * LOOKUP_BITS);
            bits &= (SWAP_MASK | INVERT_MASK) as u64;
        }
        CellId(n * 2 + 1)
    }

    /// An invalid cell id guaranteed to be larger than any valid cell id.
    /// Useful for creating indexes.
    pub fn sentinel() -> CellId {
        CellId(u64::MAX)
    }

    /// Returns the cube face for this cell id, in the range [0, 5].
    pub fn face(&self) -> u8 {
        (self.0 >> POS_BITS) as u8
    }

    /// Returns the least significant bit of the id, which determines its
    /// level. Larger cells have a larger lsb.
    pub fn lsb(&self) -> u64 {
        self.0 & self.0.wrapping_neg()
    }

    /// Returns the subdivision level of this cell id, in the range
    /// [0, MAX_LEVEL].
    pub fn level(&self) -> i32 {
        MAX_LEVEL - (self.0.trailing_zeros() as i32 >> 1)
    }

    /// Reports whether this cell id is at the deepest level.
    pub fn is_leaf(&self) -> bool {
        self.0 & 1 != 0
    }

    /// Reports whether this is a top-level (face) cell.
    pub fn is_face(&self) -> bool {
        self.0 & (lsb_for_level(0) - 1) == 0
    }

    /// Reports whether the id represents a valid cell.
    pub fn is_valid(&self) -> bool {
        self.face() < NUM_FACES && (self.lsb() & 0x1555555555555555) != 0
    }

    /// Returns the minimum leaf cell id contained within this cell.
    pub fn range_min(&self) -> CellId {
        CellId(self.0 - (self.lsb() - 1))
    }

    /// Returns the maximum leaf cell id contained within this cell.
    pub fn range_max(&self) -> CellId {
        CellId(self.0 + (self.lsb() - 1))
    }

    /// Reports whether this cell contains the other.
    pub fn contains(&self, other: &CellId) -> bool {
        self.range_min() <= *other && *other <= self.range_max()
    }

    /// Returns the cell at the given level, which must be no greater than
    /// the current level.
    pub fn parent(&self, level: i32) -> CellId {
        let lsb = lsb_for_level(level);
        CellId((self.0 & lsb.wrapping_neg()) | lsb)
    }

    /// Returns the four immediate children of this cell. If the cell is a
    /// leaf cell, it returns four identical cells that are not children.
    pub fn children(&self) -> [CellId; 4] {
        let mut lsb = self.lsb();
        let ch0 = self.0 - lsb + (lsb >> 2);
        lsb >>= 1;
        [
            CellId(ch0),
            CellId(ch0 + lsb),
            CellId(ch0 + 2 * lsb),
            CellId(ch0 + 3 * lsb),
        ]
    }

    /// Returns the first child in a traversal of the children of this cell,
    /// in Hilbert curve order, at the given (deeper) level.
    pub fn child_begin_at_level(&self, level: i32) -> CellId {
        CellId(self.0 - self.lsb() + lsb_for_level(level))
    }

    /// Returns the next cell along the Hilbert curve at the same level.
    pub fn next(&self) -> CellId {
        CellId(self.0.wrapping_add(self.lsb() << 1))
    }

    /// Returns the (face, i, j) coordinates for the leaf cell corresponding
    /// to this cell id, and the orientation of the Hilbert curve within the
    /// cell.
    pub fn face_ij_orientation(&self) -> (u8, i32, i32, u8) {
        let f = self.face();
        let mut orientation = (f & SWAP_MASK) as u64;
        let mut i: u64 = 0;
        let mut j: u64 = 0;
        let mut nbits = (MAX_LEVEL as u64) - 7 * LOOKUP_BITS; // first iteration

        // Each iteration maps 8 bits of the Hilbert curve position into
        // 4 bits of "i" and "j".
        for k in (0..8u64).rev() {
            orientation +=
                ((self.0 >> (k * 2 * LOOKUP_BITS + 1)) & ((1u64 << (2 * nbits)) - 1)) << 2;
            orientation = LOOKUP.ij[orientation as usize] as u64;
            i += (orientation >> (LOOKUP_BITS + 2)) << (k * LOOKUP_BITS);
            j += ((orientation >> 2) & ((1u64 << LOOKUP_BITS) - 1)) << (k * LOOKUP_BITS);
            orientation &= (SWAP_MASK | INVERT_MASK) as u64;
            nbits = LOOKUP_BITS;
        }

        // The position of a non-leaf cell at level "n" consists of a prefix
        // of 2*n bits that identifies the cell, followed by a suffix of
        // 2*(MAX_LEVEL-n)+1 bits of the form 10...0. If n < MAX_LEVEL, the
        // orientation of the cell is determined by the Hilbert curve
        // orientation at the center of the cell, which requires the swap
        // adjustment below.
        if self.lsb() & 0x1111111111111110 != 0 {
            orientation ^= SWAP_MASK as u64;
        }

        (f, i as i32, j as i32, orientation as u8)
    }

    /// Returns the (face, si, ti) coordinates of the center of the cell.
    pub fn face_siti(&self) -> (u8, u64, u64) {
        let (face, i, j, _) = self.face_ij_orientation();
        let delta: u64 = if self.is_leaf() {
            1
        } else if ((i as i64) ^ ((self.0 as i64) >> 2)) & 1 != 0 {
            2
        } else {
            0
        };
        (face, 2 * (i as u64) + delta, 2 * (j as u64) + delta)
    }

    /// Returns the center of the cell as an unnormalized vector.
    pub fn raw_point(&self) -> Vector {
        let (face, si, ti) = self.face_siti();
        face_uv_to_xyz(face, st_to_uv(siti_to_st(si)), st_to_uv(siti_to_st(ti)))
    }

    /// Returns the center of the cell on the sphere.
    pub fn point(&self) -> Point {
        Point(self.raw_point().normalize())
    }
}

impl From<&Point> for CellId {
    fn from(p: &Point) -> CellId {
        CellId::from_point(p)
    }
}

/// Returns the lowest-numbered bit that is on for cells at the given level.
pub fn lsb_for_level(level: i32) -> u64 {
    1u64 << (2 * (MAX_LEVEL - level))
}

/// Returns the s- or t-value corresponding to the lower edge of the leaf
/// cell with the given i- or j-coordinate.
pub(crate) fn ij_to_st_min(i: i32) -> f64 {
    (i as f64) / ((1i64 << MAX_LEVEL) as f64)
}

/// Returns the bound in (u,v)-space for the cell at the given level
/// containing the leaf cell with coordinates (i,j).
pub fn ij_level_to_bound_uv(i: i32, j: i32, level: i32) -> crate::r2::Rect {
    let cell_size = 1i32 << (MAX_LEVEL - level);
    let x_lo = i & -cell_size;
    let y_lo = j & -cell_size;
    crate::r2::Rect {
        x: crate::r1::Interval::new(
            st_to_uv(ij_to_st_min(x_lo)),
            st_to_uv(ij_to_st_min(x_lo + cell_size)),
        ),
        y: crate::r1::Interval::new(
            st_to_uv(ij_to_st_min(y_lo)),
            st_to_uv(ij_to_st_min(y_lo + cell_size)),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_cells() {
        for f in 0u8..6 {
            let id = CellId::from_face(f);
            assert!(id.is_valid());
            assert!(id.is_face());
            assert_eq!(f, id.face());
            assert_eq!(0, id.level());
            assert!(!id.is_leaf());
        }
        assert_eq!(CellId::from_face(0).next(), CellId::from_face(1));
    }

    #[test]
    fn parent_child_relationships() {
        let id = CellId::from_face_ij(3, 0x12345678, 0x23456789).parent(14);
        assert!(id.is_valid());
        assert_eq!(14, id.level());
        for child in id.children() {
            assert_eq!(15, child.level());
            assert_eq!(id, child.parent(14));
            assert!(id.contains(&child));
        }
        assert_eq!(id.range_min(), id.children()[0].range_min());
        assert_eq!(id.range_max(), id.children()[3].range_max());
    }

    #[test]
    fn from_point_roundtrip() {
        // The leaf cell containing a cell center must be a descendant of it.
        for f in 0u8..6 {
            let id = CellId::from_face(f).child_begin_at_level(12);
            let leaf = CellId::from_point(&id.point());
            assert_eq!(id, leaf.parent(12));
        }
    }

    #[test]
    fn ij_roundtrip() {
        for &(f, i, j) in &[(0u8, 0, 0), (2, 100_000, 5), (5, (1 << 30) - 1, 77)] {
            let id = CellId::from_face_ij(f, i, j);
            let (f2, i2, j2, _) = id.face_ij_orientation();
            assert_eq!((f, i, j), (f2, i2, j2));
            assert!(id.is_leaf());
        }
    }

    #[test]
    fn ordering_follows_curve() {
        let id = CellId::from_face(2).child_begin_at_level(5);
        let mut prev = id;
        let mut n = 0;
        let mut cur = id.next();
        while n < 100 {
            assert!(prev < cur);
            prev = cur;
            cur = cur.next();
            n += 1;
        }
    }

    #[test]
    fn containment_ranges() {
        let a = CellId::from_face(1).child_begin_at_level(3).next();
        assert!(a.contains(&a.children()[2]));
        assert!(!a.contains(&a.next()));
        assert!(CellId::from_face(1).contains(&a));
    }
}
