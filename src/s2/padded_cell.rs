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

use crate::consts::DBL_EPSILON;
use crate::r1;
use crate::r2;
use crate::s2::cellid::{
    CellId, IJ_TO_POS, INVERT_MASK, MAX_LEVEL, POS_TO_IJ, POS_TO_ORIENTATION, SWAP_MASK,
};
use crate::s2::point::Point;
use crate::s2::stuv::{face_siti_to_xyz, siti_to_st, st_to_ij, st_to_uv, uv_to_st};

/// PaddedCell represents a cell whose (u,v)-range has been expanded on all
/// sides by a given amount of "padding". Unlike Cell, its methods and
/// representation are optimized for clipping edges against cell boundaries
/// to determine which cells are intersected by a given set of edges.
#[derive(Debug, Clone)]
pub struct PaddedCell {
    pub id: CellId,
    padding: f64,
    bound: r2::Rect,
    middle: Option<r2::Rect>, // A rect belonging to all four children.
    i_lo: i32,                // Minimum i-coordinate of this cell before padding.
    j_lo: i32,                // Minimum j-coordinate of this cell before padding.
    orientation: u8,          // Hilbert curve orientation of this cell.
    level: i32,
}

impl PaddedCell {
    /// Constructs a padded cell with the given padding.
    pub fn from_cell_id(id: CellId, padding: f64) -> PaddedCell {
        // Fast path for constructing a top-level face (the most common
        // case).
        if id.is_face() {
            let limit = 1.0 + padding;
            return PaddedCell {
                id,
                padding,
                bound: r2::Rect::from_intervals(
                    r1::Interval::new(-limit, limit),
                    r1::Interval::new(-limit, limit),
                ),
                middle: Some(r2::Rect::from_intervals(
                    r1::Interval::new(-padding, padding),
                    r1::Interval::new(-padding, padding),
                )),
                i_lo: 0,
                j_lo: 0,
                orientation: id.face() & 1,
                level: 0,
            };
        }

        let (_, i, j, orientation) = id.face_ij_orientation();
        let level = id.level();
        let ij_size = 1i32 << (MAX_LEVEL - level);
        let i_lo = i & -ij_size;
        let j_lo = j & -ij_size;
        let bound =
            crate::s2::cellid::ij_level_to_bound_uv(i, j, level).expanded_by_margin(padding);

        PaddedCell {
            id,
            padding,
            bound,
            middle: None,
            i_lo,
            j_lo,
            orientation,
            level,
        }
    }

    /// Constructs the child of parent with the given (i,j) index. The four
    /// child cells have indices of (0,0), (0,1), (1,0), (1,1), where the i
    /// and j indices correspond to increasing u- and v-values respectively.
    pub fn from_parent_ij(parent: &PaddedCell, i: usize, j: usize) -> PaddedCell {
        // Compute the position and orientation of the child incrementally
        // from the orientation of the parent.
        let pos = IJ_TO_POS[parent.orientation as usize][(i << 1) + j];

        let mut cell = PaddedCell {
            id: parent.id.children()[pos as usize],
            padding: parent.padding,
            bound: parent.bound,
            middle: None,
            orientation: parent.orientation ^ POS_TO_ORIENTATION[pos as usize],
            level: parent.level + 1,
            i_lo: 0,
            j_lo: 0,
        };

        let ij_size = 1i32 << (MAX_LEVEL - cell.level);
        cell.i_lo = parent.i_lo + (i as i32) * ij_size;
        cell.j_lo = parent.j_lo + (j as i32) * ij_size;

        // For each child, one corner of the bound is taken directly from the
        // parent while the diagonally opposite corner is taken from
        // middle().
        let middle = parent.middle();
        if i == 1 {
            cell.bound.x.lo = middle.x.lo;
        } else {
            cell.bound.x.hi = middle.x.hi;
        }
        if j == 1 {
            cell.bound.y.lo = middle.y.lo;
        } else {
            cell.bound.y.hi = middle.y.hi;
        }

        cell
    }

    /// Returns the level this cell is at.
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Returns the bound for this cell in (u,v)-space including padding.
    pub fn bound(&self) -> &r2::Rect {
        &self.bound
    }

    /// Returns the rectangle in the middle of this cell that belongs to all
    /// four of its children in (u,v)-space.
    pub fn middle(&self) -> r2::Rect {
        // The middle is computed lazily because it is not needed the
        // majority of the time (i.e., for cells where the recursion
        // terminates).
        if let Some(middle) = self.middle {
            return middle;
        }
        let ij_size = 1i32 << (MAX_LEVEL - self.level);
        let u = st_to_uv(siti_to_st((2 * self.i_lo + ij_size) as u64));
        let v = st_to_uv(siti_to_st((2 * self.j_lo + ij_size) as u64));
        r2::Rect::from_intervals(
            r1::Interval::new(u - self.padding, u + self.padding),
            r1::Interval::new(v - self.padding, v + self.padding),
        )
    }

    /// Returns the center of this cell.
    pub fn center(&self) -> Point {
        let ij_size = 1i32 << (MAX_LEVEL - self.level);
        let si = (2 * self.i_lo + ij_size) as u64;
        let ti = (2 * self.j_lo + ij_size) as u64;
        face_siti_to_xyz(self.id.face(), si, ti).normalize()
    }

    /// Returns the (i,j) coordinates for the child cell at the given
    /// traversal position. The traversal position corresponds to the order
    /// in which child cells are visited by the Hilbert curve.
    pub fn child_ij(&self, pos: usize) -> (usize, usize) {
        let ij = POS_TO_IJ[self.orientation as usize][pos];
        ((ij >> 1) as usize, (ij & 1) as usize)
    }

    /// Returns the vertex where the space-filling curve enters this cell.
    pub fn entry_vertex(&self) -> Point {
        // The curve enters at the (0,0) vertex unless the axis directions
        // are reversed, in which case it enters at the (1,1) vertex.
        let mut i = self.i_lo;
        let mut j = self.j_lo;
        if self.orientation & INVERT_MASK != 0 {
            let ij_size = 1i32 << (MAX_LEVEL - self.level);
            i += ij_size;
            j += ij_size;
        }
        face_siti_to_xyz(self.id.face(), (2 * i) as u64, (2 * j) as u64).normalize()
    }

    /// Returns the vertex where the space-filling curve exits this cell.
    pub fn exit_vertex(&self) -> Point {
        // The curve exits at the (1,0) vertex unless the axes are swapped or
        // inverted but not both, in which case it exits at the (0,1) vertex.
        let mut i = self.i_lo;
        let mut j = self.j_lo;
        let ij_size = 1i32 << (MAX_LEVEL - self.level);
        if self.orientation == 0 || self.orientation == SWAP_MASK + INVERT_MASK {
            i += ij_size;
        } else {
            j += ij_size;
        }
        face_siti_to_xyz(self.id.face(), (2 * i) as u64, (2 * j) as u64).normalize()
    }

    /// Returns the smallest CellId that contains all descendants of this
    /// padded cell whose bounds intersect the given rect. For algorithms
    /// that use recursive subdivision to find the cells that intersect a
    /// particular object, this method can be used to skip all of the initial
    /// subdivision steps where only one child needs to be expanded.
    ///
    /// Note that this method is not the same as returning the smallest cell
    /// that contains the intersection of this cell with rect. Because of the
    /// padding, even if one child completely contains rect it is still
    /// possible that a neighboring child may also intersect the given rect.
    ///
    /// The provided rect must intersect the bounds of this cell.
    pub fn shrink_to_fit(&self, rect: &r2::Rect) -> CellId {
        // Quick rejection test: if rect contains the center of this cell
        // along either axis, then no further shrinking is possible.
        if self.level == 0 {
            // Fast path (most calls to this function start with a face
            // cell).
            if rect.x.contains(0.0) || rect.y.contains(0.0) {
                return self.id;
            }
        }

        let ij_size = 1i32 << (MAX_LEVEL - self.level);
        if rect
            .x
            .contains(st_to_uv(siti_to_st((2 * self.i_lo + ij_size) as u64)))
            || rect
                .y
                .contains(st_to_uv(siti_to_st((2 * self.j_lo + ij_size) as u64)))
        {
            return self.id;
        }

        // Otherwise we expand rect by the given padding on all sides and
        // find the range of coordinates that it spans along the i- and
        // j-axes. We then compute the highest bit position at which the min
        // and max coordinates differ. This corresponds to the first cell
        // level at which at least two children intersect rect.

        // Increase the padding to compensate for the error in uv_to_st.
        // (The constant below is a provable upper bound on the additional
        // error.)
        let padded = rect.expanded_by_margin(self.padding + 1.5 * DBL_EPSILON);
        let mut i_min = self.i_lo; // Min i- or j-coordinate spanned by padded.
        let mut j_min = self.j_lo;

        i_min = i_min.max(st_to_ij(uv_to_st(padded.x.lo)));
        let i_max = (self.i_lo + ij_size - 1).min(st_to_ij(uv_to_st(padded.x.hi)));
        let i_xor = i_min ^ i_max;

        j_min = j_min.max(st_to_ij(uv_to_st(padded.y.lo)));
        let j_max = (self.j_lo + ij_size - 1).min(st_to_ij(uv_to_st(padded.y.hi)));
        let j_xor = j_min ^ j_max;

        // Compute the highest bit position at which the two i- or
        // j-endpoints differ, and then choose the cell level that includes
        // both of these endpoints.
        let level_msb = (((i_xor | j_xor) as i64) << 1) + 1;
        let level = MAX_LEVEL - (63 - (level_msb as u64).leading_zeros() as i32);
        if level <= self.level {
            return self.id;
        }

        CellId::from_face_ij(self.id.face(), i_min, j_min).parent(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::s2::cell::Cell;

    #[test]
    fn face_cell_bounds() {
        for f in 0u8..6 {
            let p = PaddedCell::from_cell_id(CellId::from_face(f), 0.1);
            assert_eq!(0, p.level());
            assert_eq!(1.1, p.bound().x.hi);
            assert_eq!(-0.1, p.middle().x.lo);
        }
    }

    #[test]
    fn children_cover_parent() {
        let parent = PaddedCell::from_cell_id(CellId::from_face(2).child_begin_at_level(3), 0.01);
        let mut seen = Vec::new();
        for pos in 0..4 {
            let (i, j) = parent.child_ij(pos);
            let child = PaddedCell::from_parent_ij(&parent, i, j);
            assert_eq!(parent.level() + 1, child.level());
            assert!(parent.id.contains(&child.id));
            assert!(parent.bound().intersects(child.bound()));
            seen.push(child.id);
        }
        // All four distinct children are visited.
        seen.sort();
        seen.dedup();
        assert_eq!(4, seen.len());
    }

    #[test]
    fn entry_exit_vertices_on_cell() {
        // Entry and exit vertices are cell corners, so the parent cell of
        // the corner leaf must contain them.
        for f in 0u8..6 {
            let id = CellId::from_face(f).child_begin_at_level(2).next();
            let p = PaddedCell::from_cell_id(id, 0.0);
            let cell = Cell::from(id);
            let mut matched = 0;
            for k in 0..4 {
                let v = cell.vertex(k);
                if v.approx_equal(&p.entry_vertex(), crate::s1::Angle(1e-14))
                    || v.approx_equal(&p.exit_vertex(), crate::s1::Angle(1e-14))
                {
                    matched += 1;
                }
            }
            assert!(matched >= 2, "face {}", f);
        }
    }

    #[test]
    fn shrink_to_fit_small_rect() {
        // A tiny rect away from the center shrinks to a deep cell that
        // still contains it.
        let face = PaddedCell::from_cell_id(CellId::from_face(1), 0.0);
        let rect = r2::Rect::from_points(&[
            r2::Point::new(0.3, 0.4),
            r2::Point::new(0.300001, 0.400001),
        ]);
        let shrunk = face.shrink_to_fit(&rect);
        assert!(shrunk.level() > 10);
        assert_eq!(1, shrunk.face());
    }
}
