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

use crate::r2;
use crate::s2::cellid::{ij_level_to_bound_uv, CellId};
use crate::s2::point::Point;
use crate::s2::stuv::face_uv_to_xyz;

/// Cell is a spherical quadrilateral corresponding to a cell of the sphere
/// decomposition. Cells support efficient containment and intersection
/// tests; they are the unit of work for the spatial index.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Cell {
    face: u8,
    level: i32,
    orientation: u8,
    pub id: CellId,
    uv: r2::Rect,
}

impl From<CellId> for Cell {
    fn from(id: CellId) -> Cell {
        let (f, i, j, o) = id.face_ij_orientation();
        let level = id.level();
        Cell {
            face: f,
            level,
            orientation: o,
            id,
            uv: ij_level_to_bound_uv(i, j, level),
        }
    }
}

impl Cell {
    /// Constructs the cell containing the given point.
    pub fn from_point(p: &Point) -> Cell {
        Cell::from(CellId::from_point(p))
    }

    /// Returns the cube face this cell lives on, in the range [0, 5].
    pub fn face(&self) -> u8 {
        self.face
    }

    /// Returns the level of this cell.
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Returns the k-th vertex of the cell (k in [0, 3]), in CCW order. The
    /// vertices are returned in lower-left, lower-right, upper-right,
    /// upper-left order in the cell's (u,v)-space.
    pub fn vertex(&self, k: usize) -> Point {
        let (u, v) = match k {
            0 => (self.uv.x.lo, self.uv.y.lo),
            1 => (self.uv.x.hi, self.uv.y.lo),
            2 => (self.uv.x.hi, self.uv.y.hi),
            _ => (self.uv.x.lo, self.uv.y.hi),
        };
        Point(face_uv_to_xyz(self.face, u, v).normalize())
    }

    /// Returns the direction vector corresponding to the center of the cell.
    pub fn center(&self) -> Point {
        self.id.point()
    }

    /// Returns the bound of this cell in (u,v)-space.
    pub fn bound_uv(&self) -> r2::Rect {
        self.uv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::s2::predicates::sign;

    #[test]
    fn cell_vertices_are_ccw_around_center() {
        for f in 0u8..6 {
            let cell = Cell::from(CellId::from_face(f).child_begin_at_level(4).next());
            let c = cell.center();
            for k in 0..4 {
                let a = cell.vertex(k);
                let b = cell.vertex((k + 1) % 4);
                assert!(sign(&a, &b, &c), "face {} vertex {}", f, k);
            }
        }
    }

    #[test]
    fn cell_center_inside_uv_bound() {
        let cell = Cell::from(CellId::from_face(2).child_begin_at_level(7));
        let (_, u, v) = crate::s2::stuv::xyz_to_face_uv(&cell.center().0);
        assert!(cell.bound_uv().contains_point(&crate::r2::Point::new(u, v)));
    }
}
