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
use crate::s2::edge_clipping::{clip_to_face, interpolate_f64};
use crate::s2::padded_cell::PaddedCell;
use crate::s2::point::Point;
use crate::s2::shape_index::{IndexCell, IndexSnapshot};

/// CrossingEdgeQuery is used to find the index cells of a shape index that
/// are crossed by a given edge. Note that if you need to query many edges,
/// it is more efficient to declare a single query instance and reuse it.
pub struct CrossingEdgeQuery<'a> {
    snap: &'a IndexSnapshot,

    // Temporary values used while processing a query.
    a: r2::Point,
    b: r2::Point,

    // Candidate cells generated when finding crossings.
    cells: Vec<&'a IndexCell>,
}

impl<'a> CrossingEdgeQuery<'a> {
    /// Creates a query against the given index snapshot.
    pub fn new(snap: &'a IndexSnapshot) -> CrossingEdgeQuery<'a> {
        CrossingEdgeQuery {
            snap,
            a: r2::Point::default(),
            b: r2::Point::default(),
            cells: Vec::new(),
        }
    }

    /// Returns the set of index cells that may contain edges crossing the
    /// edge AB, restricted to cells that are descendants of the given root
    /// cell. Returns an empty slice if the edge does not intersect the root
    /// cell's face region.
    pub fn get_cells(&mut self, a: &Point, b: &Point, root: &PaddedCell) -> &[&'a IndexCell] {
        self.cells.clear();
        if let Some((a_uv, b_uv)) = clip_to_face(a, b, root.id.face()) {
            self.a = a_uv;
            self.b = b_uv;
            let edge_bound = r2::Rect::from_points(&[self.a, self.b]);
            if root.bound().intersects(&edge_bound) {
                self.compute_cells_intersected(root, edge_bound);
            }
        }
        &self.cells
    }

    // Computes the index cells intersected by the current edge that are
    // descendants of pcell and adds them to the candidate set.
    fn compute_cells_intersected(&mut self, pcell: &PaddedCell, edge_bound: r2::Rect) {
        let mut it = self.snap.iter();
        it.seek(pcell.id.range_min());
        if it.done() || it.cell_id() > pcell.id.range_max() {
            // The index does not contain pcell or any of its descendants.
            return;
        }

        if it.cell_id() == pcell.id {
            // The index contains this cell exactly.
            self.cells.push(it.cell().unwrap());
            return;
        }

        // Otherwise, split the edge among the four children of pcell.
        let center = pcell.middle().lo();

        if edge_bound.x.hi < center.x {
            // Edge is entirely contained in the two left children.
            self.clip_v_axis(edge_bound, center.y, 0, pcell);
            return;
        } else if edge_bound.x.lo >= center.x {
            // Edge is entirely contained in the two right children.
            self.clip_v_axis(edge_bound, center.y, 1, pcell);
            return;
        }

        let child_bounds = self.split_u_bound(&edge_bound, center.x);
        if edge_bound.y.hi < center.y {
            // Edge is entirely contained in the two lower children.
            self.compute_cells_intersected(
                &PaddedCell::from_parent_ij(pcell, 0, 0),
                child_bounds[0],
            );
            self.compute_cells_intersected(
                &PaddedCell::from_parent_ij(pcell, 1, 0),
                child_bounds[1],
            );
        } else if edge_bound.y.lo >= center.y {
            // Edge is entirely contained in the two upper children.
            self.compute_cells_intersected(
                &PaddedCell::from_parent_ij(pcell, 0, 1),
                child_bounds[0],
            );
            self.compute_cells_intersected(
                &PaddedCell::from_parent_ij(pcell, 1, 1),
                child_bounds[1],
            );
        } else {
            // The edge bound spans all four children. The edge itself
            // intersects at most three children (since no padding is being
            // used).
            self.clip_v_axis(child_bounds[0], center.y, 0, pcell);
            self.clip_v_axis(child_bounds[1], center.y, 1, pcell);
        }
    }

    // Given either the left (i=0) or right (i=1) side of the padded cell,
    // determines whether the current edge intersects the lower child, upper
    // child, or both, and recurses on those children.
    fn clip_v_axis(&mut self, edge_bound: r2::Rect, center: f64, i: usize, pcell: &PaddedCell) {
        if edge_bound.y.hi < center {
            // Edge is entirely contained in the lower child.
            self.compute_cells_intersected(&PaddedCell::from_parent_ij(pcell, i, 0), edge_bound);
        } else if edge_bound.y.lo >= center {
            // Edge is entirely contained in the upper child.
            self.compute_cells_intersected(&PaddedCell::from_parent_ij(pcell, i, 1), edge_bound);
        } else {
            // The edge intersects both children.
            let child_bounds = self.split_v_bound(&edge_bound, center);
            self.compute_cells_intersected(
                &PaddedCell::from_parent_ij(pcell, i, 0),
                child_bounds[0],
            );
            self.compute_cells_intersected(
                &PaddedCell::from_parent_ij(pcell, i, 1),
                child_bounds[1],
            );
        }
    }

    // Returns the bounds for the two children resulting from splitting the
    // current edge at the given u-value.
    fn split_u_bound(&self, edge_bound: &r2::Rect, u: f64) -> [r2::Rect; 2] {
        let v = edge_bound
            .y
            .clamp_point(interpolate_f64(u, self.a.x, self.b.x, self.a.y, self.b.y));

        // diag indicates which diagonal of the bounding box is spanned by
        // AB: it is 0 if AB has positive slope, and 1 if AB has negative
        // slope.
        let diag = usize::from((self.a.x > self.b.x) != (self.a.y > self.b.y));
        split_bound(edge_bound, 0, diag, u, v)
    }

    // Returns the bounds for the two children resulting from splitting the
    // current edge at the given v-value.
    fn split_v_bound(&self, edge_bound: &r2::Rect, v: f64) -> [r2::Rect; 2] {
        let u = edge_bound
            .x
            .clamp_point(interpolate_f64(v, self.a.y, self.b.y, self.a.x, self.b.x));
        let diag = usize::from((self.a.x > self.b.x) != (self.a.y > self.b.y));
        split_bound(edge_bound, diag, 0, u, v)
    }
}

// Returns the bounds for the two children as a result of splitting the
// current edge into two child edges at the given point (u,v). u_end and
// v_end indicate which bound endpoints of the first child will be updated.
fn split_bound(edge_bound: &r2::Rect, u_end: usize, v_end: usize, u: f64, v: f64) -> [r2::Rect; 2] {
    let mut child_bounds = [*edge_bound, *edge_bound];
    if u_end == 1 {
        child_bounds[0].x.lo = u;
        child_bounds[1].x.hi = u;
    } else {
        child_bounds[0].x.hi = u;
        child_bounds[1].x.lo = u;
    }
    if v_end == 1 {
        child_bounds[0].y.lo = v;
        child_bounds[1].y.hi = v;
    } else {
        child_bounds[0].y.hi = v;
        child_bounds[1].y.lo = v;
    }
    child_bounds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::s2::cellid::CellId;

    fn face_root(face: u8) -> PaddedCell {
        PaddedCell::from_cell_id(CellId::from_face(face), 0.0)
    }
    use crate::s1::{Angle, Deg};
    use crate::s2::point::{get_frame, regular_points_for_frame};
    use crate::s2::shape::{Chain, Edge, ReferencePoint, Shape};
    use crate::s2::shape_index::ShapeIndex;

    struct RingShape {
        vertices: Vec<Point>,
    }

    impl Shape for RingShape {
        fn num_edges(&self) -> i32 {
            self.vertices.len() as i32
        }
        fn edge(&self, i: i32) -> Edge {
            let n = self.vertices.len();
            Edge {
                v0: self.vertices[i as usize % n],
                v1: self.vertices[(i as usize + 1) % n],
            }
        }
        fn reference_point(&self) -> ReferencePoint {
            ReferencePoint::origin(false)
        }
        fn num_chains(&self) -> i32 {
            1
        }
        fn chain(&self, _chain_id: i32) -> Chain {
            Chain {
                start: 0,
                length: self.vertices.len() as i32,
            }
        }
        fn dimension(&self) -> i32 {
            2
        }
    }

    #[test]
    fn get_cells_finds_crossed_edges() {
        let center = Point::from_coords(1.0, 0.1, 0.1);
        let frame = get_frame(&center);
        let shape = RingShape {
            vertices: regular_points_for_frame(&frame, Angle::from(Deg(4.0)), 128),
        };
        let index = ShapeIndex::new();
        index.add();
        let snap = index.snapshot(&shape);

        // An edge passing through the ring center must produce candidate
        // cells containing at least one loop edge.
        let a = Point::from_coords(1.0, 0.0, 0.0);
        let b = Point::from_coords(1.0, 0.2, 0.2);
        let mut query = CrossingEdgeQuery::new(&snap);
        let cells = query.get_cells(&a, &b, &face_root(0));
        assert!(!cells.is_empty());
        let total_edges: usize = cells.iter().map(|c| c.num_edges()).sum();
        assert!(total_edges > 0);
    }

    #[test]
    fn get_cells_empty_for_disjoint_face() {
        let center = Point::from_coords(1.0, 0.1, 0.1);
        let frame = get_frame(&center);
        let shape = RingShape {
            vertices: regular_points_for_frame(&frame, Angle::from(Deg(4.0)), 32),
        };
        let index = ShapeIndex::new();
        index.add();
        let snap = index.snapshot(&shape);

        // The ring is on face 0; a query rooted at the opposite face finds
        // nothing.
        let a = Point::from_coords(-1.0, 0.0, 0.0);
        let b = Point::from_coords(-1.0, 0.2, 0.2);
        let mut query = CrossingEdgeQuery::new(&snap);
        assert!(query.get_cells(&a, &b, &face_root(3)).is_empty());
    }
}
