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

use std::cmp::Ordering as CmpOrdering;
use std::collections::HashSet;
use std::f64::consts::PI;
use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicI32, Ordering};

use cgmath::Matrix3;

use crate::consts::DBL_EPSILON;
use crate::error::{Error, Result};
use crate::options::{DebugOverride, Options};
use crate::r3::vector::Vector;
use crate::s1::Angle;
use crate::s2::cap::Cap;
use crate::s2::cell::Cell;
use crate::s2::cellid::CellId;
use crate::s2::closest_edge_query::ClosestEdgeQuery;
use crate::s2::coder::{Decoder, Encoder};
use crate::s2::crossing_edge_query::CrossingEdgeQuery;
use crate::s2::edge_clipping::{
    clip_to_padded_face, edge_intersects_rect, FACE_CLIP_ERROR_UV_COORD,
    INTERSECTS_RECT_ERROR_UV_DIST,
};
use crate::s2::edge_crosser::EdgeCrosser;
use crate::s2::edge_crossings::{crossing_sign, Crossing};
use crate::s2::padded_cell::PaddedCell;
use crate::s2::point::{
    get_frame, ordered_ccw, regular_points_for_frame, signed_area, true_centroid, turn_angle,
    Point,
};
use crate::s2::point_compression::{
    decode_points_compressed, encode_points_compressed, XyzFaceSiTi,
};
use crate::s2::rect::Rect;
use crate::s2::rect_bounder::{expand_for_subregions, RectBounder};
use crate::s2::region::Region;
use crate::s2::shape::{Chain, Edge, ReferencePoint, Shape};
use crate::s2::shape_index::{
    CellRelation, IndexCell, IndexSnapshot, ShapeIndex, ShapeIndexIterator,
};

// These two points are used for the special empty and full loops.
const EMPTY_LOOP_POINT: Point = Point(Vector {
    x: 0.0,
    y: 0.0,
    z: 1.0,
});
const FULL_LOOP_POINT: Point = Point(Vector {
    x: 0.0,
    y: 0.0,
    z: -1.0,
});

/// Returns the canonical vertex of the empty loop.
pub fn empty_vertex() -> Point {
    EMPTY_LOOP_POINT
}

/// Returns the canonical vertex of the full loop.
pub fn full_vertex() -> Point {
    FULL_LOOP_POINT
}

// For small loops it is faster to just check all the crossings.
const MAX_BRUTE_FORCE_VERTICES: usize = 32;

// The maximum number of unindexed contains_point calls before the spatial
// index is built. Building the index costs roughly 50x as much as a single
// brute-force containment test, so the textbook competitive threshold would
// be 50; we build somewhat earlier because an index build may be forced
// anyway by other API calls.
const MAX_UNINDEXED_CONTAINS_CALLS: i32 = 20;

// If an index cell of A intersects at least this many edges of B, it is
// faster to use CrossingEdgeQuery to narrow down the candidates than to
// test all the crossings directly. Tuned using benchmarks.
const EDGE_QUERY_MIN_EDGES: usize = 20;

const CURRENT_LOSSLESS_ENCODING_VERSION: u8 = 1;

// Boolean properties for compressed loops.
const COMPRESSED_ORIGIN_INSIDE: u32 = 1 << 0;
const COMPRESSED_BOUND_ENCODED: u32 = 1 << 1;

// Whether to write the bound in the compressed encoding. Recomputing the
// bound multiplies the decode time per vertex by a factor of about 3.5, and
// at roughly 3.5 bytes per vertex the bound increases the size by less than
// 15% once there are this many vertices.
const MIN_VERTICES_FOR_BOUND: usize = 64;

/// Vertices is the backing storage of a loop: either an owned vector, or a
/// slice borrowed from an external buffer (as produced by zero-copy
/// decoding). Mutating operations require owned storage.
#[derive(Debug, Clone)]
pub enum Vertices<'a> {
    Owned(Vec<Point>),
    Borrowed(&'a [Point]),
}

impl<'a> Vertices<'a> {
    fn as_slice(&self) -> &[Point] {
        match self {
            Vertices::Owned(v) => v,
            Vertices::Borrowed(s) => s,
        }
    }
}

/// Loop represents a simple spherical polygon. It consists of a sequence of
/// vertices where the first vertex is implicitly connected to the last. All
/// loops are defined to have a CCW orientation, i.e. the interior of the
/// loop is on the left side of the edges. This implies that a clockwise loop
/// enclosing a small area is interpreted to be a CCW loop enclosing a very
/// large area.
///
/// Loops are not allowed to have any duplicate vertices (whether adjacent or
/// not). Non-adjacent edges are not allowed to intersect, and furthermore
/// edges of length 180 degrees are not allowed (i.e., adjacent vertices
/// cannot be antipodal). Loops must have at least 3 vertices (except for the
/// "empty" and "full" loops discussed below).
///
/// There are two special loops: the "empty" loop contains no points and the
/// "full" loop contains all points. These loops do not have any edges, but
/// to preserve the invariant that every loop can be represented as a vertex
/// chain, they are defined as having exactly one vertex each.
///
/// Point containment of loops is defined such that if the sphere is
/// subdivided into faces (loops), every point is contained by exactly one
/// face. This implies that loops do not necessarily contain their vertices.
pub struct Loop<'a> {
    /// The vertices of the loop, ordered counterclockwise around the
    /// interior. Either owned or borrowed from a decoder buffer.
    vertices: Vertices<'a>,

    /// A precomputed value of whether this loop contains the fixed
    /// reference origin, so that crossing counts can start from a known
    /// state.
    origin_inside: bool,

    /// The nesting depth of this loop if it is contained by a polygon or
    /// other structure; used to determine whether the loop represents a
    /// hole. Opaque to the loop itself.
    depth: i32,

    /// Per-instance override of construction-time validation.
    debug_override: DebugOverride,

    /// The number of contains_point calls made without the benefit of the
    /// spatial index. Scheduling state for the lazy index build.
    unindexed_contains_calls: AtomicI32,

    /// A conservative bound on all points contained by this loop. If
    /// contains_point(p), then bound.contains_point(p).
    bound: Rect,

    /// Since bound is not exact, it is possible that a loop A contains
    /// another loop B whose bounds are slightly larger. subregion_bound has
    /// been expanded sufficiently to account for this error: if
    /// A.contains(B), then A.subregion_bound.contains(B.bound).
    subregion_bound: Rect,

    /// The spatial index for this loop.
    index: ShapeIndex,
}

impl<'a> Loop<'a> {
    /// Creates a new loop from the given vertices. Interior is on the left
    /// of the vertex chain.
    pub fn from_points(pts: Vec<Point>) -> Loop<'static> {
        Loop::from_points_with_override(pts, DebugOverride::Allow)
    }

    /// Like from_points but with an explicit validation override.
    pub fn from_points_with_override(pts: Vec<Point>, o: DebugOverride) -> Loop<'static> {
        let mut l = Loop {
            vertices: Vertices::Owned(pts),
            origin_inside: false,
            depth: 0,
            debug_override: o,
            unindexed_contains_calls: AtomicI32::new(0),
            bound: Rect::empty(),
            subregion_bound: Rect::empty(),
            index: ShapeIndex::new(),
        };
        l.init_origin_and_bound();
        l
    }

    /// Creates a loop corresponding to the given cell.
    ///
    /// Note that the loop and cell *do not* contain exactly the same set of
    /// points, because Loop and Cell have slightly different definitions of
    /// point containment. For example, a Cell vertex is contained by all
    /// four neighboring Cells, but it is contained by exactly one of four
    /// Loops constructed from those cells.
    pub fn from_cell(c: &Cell) -> Loop<'static> {
        Loop::from_points(vec![c.vertex(0), c.vertex(1), c.vertex(2), c.vertex(3)])
    }

    /// Returns the special "empty" loop.
    pub fn empty() -> Loop<'static> {
        Loop::from_points(vec![EMPTY_LOOP_POINT])
    }

    /// Returns the special "full" loop.
    pub fn full() -> Loop<'static> {
        Loop::from_points(vec![FULL_LOOP_POINT])
    }

    /// Creates a loop with the given number of vertices, all located on a
    /// circle of the specified angular radius around the given center.
    pub fn make_regular(center: Point, radius: Angle, num_vertices: usize) -> Loop<'static> {
        Loop::make_regular_for_frame(&get_frame(&center), radius, num_vertices)
    }

    /// Like make_regular, but with an explicit coordinate frame: the loop is
    /// centered around the z-axis of the frame.
    pub fn make_regular_for_frame(
        frame: &Matrix3<f64>,
        radius: Angle,
        num_vertices: usize,
    ) -> Loop<'static> {
        Loop::from_points(regular_points_for_frame(frame, radius, num_vertices))
    }

    // Resets the fields that are changed by queries (the lazy-index
    // scheduling state) and unregisters the edge shape.
    fn reset_mutable_fields(&mut self) {
        self.unindexed_contains_calls.store(0, Ordering::Relaxed);
        self.index.reset();
    }

    // Sets the origin containment for the loop and then initializes the
    // bounds and the spatial index. The order of the steps is fixed: the
    // origin state must be known before any containment test, and the bound
    // must be computed before the index is registered because
    // contains_point does a bounds check whenever the index is not fresh.
    fn init_origin_and_bound(&mut self) {
        if self.num_vertices() < 3 {
            // Check for the special empty and full loops (which have one
            // vertex).
            if !self.is_empty_or_full() {
                self.origin_inside = false;
                return; // Bail out without accessing non-existent vertices.
            }
            // The origin depends on whether the single vertex is in the
            // southern hemisphere or not.
            self.origin_inside = self.vertex(0).0.z < 0.0;
        } else {
            // Point containment testing is done by counting edge crossings
            // starting at a fixed reference point. We initialize the origin
            // state by first guessing that it is outside, and then seeing
            // whether we get the correct containment result for vertex 1.
            // If the result is incorrect, the origin must be inside the
            // loop instead.
            //
            // A loop with consecutive vertices A,B,C contains vertex B if
            // and only if the fixed vector R = ortho(B) is contained by the
            // wedge ABC. The wedge is closed at A and open at C, i.e. the
            // point B is inside the loop if A == R but not if C == R. This
            // convention is required for compatibility with the vertex
            // crossing rule used by the edge crosser.
            self.origin_inside = false; // Initialize before calling contains_point.
            let v1_inside = self.vertex(0) != self.vertex(1)
                && self.vertex(2) != self.vertex(1)
                && ordered_ccw(
                    &self.vertex(1).ortho(),
                    &self.vertex(0),
                    &self.vertex(2),
                    &self.vertex(1),
                );
            // Note that contains_point only does a bounds check once the
            // index has been registered, so it doesn't matter that bound is
            // undefined here.
            if v1_inside != self.contains_point(&self.vertex(1)) {
                self.origin_inside = true;
            }
        }
        self.init_bound();
        self.init_index();
    }

    // Sets up the approximate bounding rects for this loop.
    fn init_bound(&mut self) {
        // Check for the special empty and full loops.
        if self.is_empty_or_full() {
            if self.is_empty() {
                self.bound = Rect::empty();
            } else {
                self.bound = Rect::full();
            }
            self.subregion_bound = self.bound;
            return;
        }

        // The bounding rectangle of a loop is not necessarily the same as
        // the bounding rectangle of its vertices. First, the maximal
        // latitude may be attained along the interior of an edge. Second,
        // the loop may wrap entirely around the sphere (e.g. a loop that
        // defines two revolutions of a candy-cane stripe). Third, the loop
        // may include one or both poles. Note that a small clockwise loop
        // near the equator contains both poles.
        let mut bounder = RectBounder::new();
        for i in 0..=self.num_vertices() {
            bounder.add_point(&self.vertex(i)); // add vertex 0 twice
        }
        let mut b = bounder.get_bound();

        if self.contains_point(&Point::from_coords(0.0, 0.0, 1.0)) {
            b = Rect::new(
                crate::r1::Interval::new(b.lat.lo, PI / 2.0),
                crate::s1::Interval::full(),
            );
        }
        // If a loop contains the south pole, then either it wraps entirely
        // around the sphere (full longitude range), or it also contains the
        // north pole in which case b.lng is full due to the test above.
        // Either way, we only need to do the south pole containment test if
        // b.lng is full.
        if b.lng.is_full() && self.contains_point(&Point::from_coords(0.0, 0.0, -1.0)) {
            b.lat.lo = -PI / 2.0;
        }
        self.bound = b;
        self.subregion_bound = expand_for_subregions(&self.bound);
    }

    // Registers the loop's edge shape with the index, forcing an immediate
    // build if lazy indexing is disabled.
    fn init_index(&mut self) {
        self.index.add();
        if !Options::global().lazy_indexing {
            self.index.snapshot(self); // Force index construction now.
        }
        if Options::global().debug_validation && self.debug_override == DebugOverride::Allow {
            assert!(self.is_valid());
        }
    }

    /// Returns the vertices of the loop.
    pub fn vertices(&self) -> &[Point] {
        self.vertices.as_slice()
    }

    /// Returns the number of vertices in this loop.
    pub fn num_vertices(&self) -> usize {
        self.vertices.as_slice().len()
    }

    /// Returns the vertex for the given index. For convenience, the vertex
    /// indices wrap automatically for methods that do index math: the valid
    /// range is [0, 2 * num_vertices() - 1] and vertex(num_vertices() + i)
    /// is the same as vertex(i).
    pub fn vertex(&self, i: usize) -> Point {
        let v = self.vertices.as_slice();
        if i < v.len() {
            v[i]
        } else {
            v[i - v.len()]
        }
    }

    /// Returns the vertex in reverse order if the loop represents a polygon
    /// hole. For example, arguments 0, 1, 2 are mapped to vertices n-1,
    /// n-2, n-3, where n is the number of vertices. This ensures that the
    /// interior of the polygon is always to the left of the vertex chain.
    ///
    /// This requires: 0 <= i < 2 * num_vertices()
    pub fn oriented_vertex(&self, i: usize) -> Point {
        let n = self.num_vertices();
        let mut j = if i >= n { i - n } else { i };
        if self.is_hole() {
            j = n - 1 - j;
        }
        self.vertex(j)
    }

    /// Reports whether this loop owns its vertex storage. Loops produced by
    /// zero-copy decoding borrow their vertices and cannot be mutated.
    pub fn owns_vertices(&self) -> bool {
        matches!(self.vertices, Vertices::Owned(_))
    }

    /// Returns the nesting depth of this loop within its enclosing polygon.
    pub fn depth(&self) -> i32 {
        self.depth
    }

    /// Sets the nesting depth.
    pub fn set_depth(&mut self, depth: i32) {
        self.depth = depth;
    }

    /// Reports whether this loop represents a hole in its containing
    /// polygon.
    pub fn is_hole(&self) -> bool {
        self.depth & 1 != 0
    }

    /// Returns -1 if this loop represents a hole in its containing polygon,
    /// and +1 otherwise.
    pub fn sign(&self) -> i32 {
        if self.is_hole() {
            -1
        } else {
            1
        }
    }

    /// Reports whether this is the special empty loop that contains no
    /// points.
    pub fn is_empty(&self) -> bool {
        self.is_empty_or_full() && !self.contains_origin()
    }

    /// Reports whether this is the special full loop that contains all
    /// points.
    pub fn is_full(&self) -> bool {
        self.is_empty_or_full() && self.contains_origin()
    }

    /// Reports whether this loop is either the empty or full special loop.
    pub fn is_empty_or_full(&self) -> bool {
        self.num_vertices() == 1
    }

    /// Reports whether this loop contains the fixed reference origin.
    pub fn contains_origin(&self) -> bool {
        self.origin_inside
    }

    /// Returns a tight bounding rectangle: if the loop contains point P,
    /// then the bound contains P as well.
    pub fn rect_bound(&self) -> Rect {
        self.bound
    }

    /// Returns the expanded bound that is guaranteed to contain the bound
    /// of any loop contained by this one.
    pub fn subregion_bound(&self) -> Rect {
        self.subregion_bound
    }

    /// Returns a bounding spherical cap. It may have more padding than the
    /// corresponding rect_bound, but is conservative in the same way.
    pub fn cap_bound(&self) -> Cap {
        self.bound.cap_bound()
    }

    // ---------------------------------------------------------------------
    // Point containment
    // ---------------------------------------------------------------------

    /// Reports whether the loop contains the given point. Point containment
    /// is defined such that if the sphere is subdivided into loops, every
    /// point is contained by exactly one loop.
    pub fn contains_point(&self, p: &Point) -> bool {
        // A bounds check slows this function down by about 50%. It is
        // worthwhile only while it might allow us to delay building the
        // index, i.e. while the index is not fresh.
        if !self.index.is_fresh() && !self.bound.contains_point(p) {
            return false;
        }

        // For small loops it is faster to just check all the crossings. We
        // also use this method during loop initialization because
        // init_origin_and_bound calls contains_point before init_index.
        // Otherwise, we keep track of the number of calls and only build
        // the index when enough calls have been made that we think it is
        // worth the effort. The code below is structured so that if many
        // calls are made in parallel only one thread builds the index,
        // while the rest continue using brute force until the index is
        // actually available.
        if !self.index.has_shape()
            || self.num_vertices() <= MAX_BRUTE_FORCE_VERTICES
            || (!self.index.is_fresh()
                && self.unindexed_contains_calls.fetch_add(1, Ordering::AcqRel) + 1
                    != MAX_UNINDEXED_CONTAINS_CALLS)
        {
            return self.brute_force_contains_point(p);
        }

        // Otherwise we look up the point in the index. If another thread is
        // in the middle of building it, fall back to brute force.
        let snap = match self.index.try_snapshot(self) {
            Some(snap) => snap,
            None => return self.brute_force_contains_point(p),
        };
        let mut it = snap.iter();
        if !it.locate_point(p) {
            return false;
        }
        self.iterator_contains_point(&it, p)
    }

    /// Reports whether the loop contains the point, testing all edge
    /// crossings from the reference origin directly. Preferable below a
    /// certain loop size, and used during initialization.
    pub fn brute_force_contains_point(&self, p: &Point) -> bool {
        // Empty and full loops don't need a special case, but invalid loops
        // with zero vertices do, so we might as well handle them all at
        // once.
        if self.num_vertices() < 3 {
            return self.origin_inside;
        }

        let origin = Point::origin();
        let mut inside = self.origin_inside;
        let mut crosser = EdgeCrosser::new_chain_edge_crosser(&origin, p, &self.vertex(0));
        for i in 1..=self.num_vertices() {
            // add vertex 0 twice
            inside = inside != crosser.edge_or_vertex_chain_crossing(&self.vertex(i));
        }
        inside
    }

    // Reports whether the iterator, positioned at an index cell that may
    // contain p, contains the point p. Containment is tested by drawing a
    // line segment from the cell center to the given point and counting
    // edge crossings.
    fn iterator_contains_point(&self, it: &ShapeIndexIterator<'_>, p: &Point) -> bool {
        let a_clipped = it.cell().expect("iterator must be positioned at a cell");
        let mut inside = a_clipped.contains_center;

        if a_clipped.num_edges() > 0 {
            let center = it.center();
            let mut crosser = EdgeCrosser::new(&center, p);
            let mut ai_prev: i64 = -2;
            for &ai in &a_clipped.edges {
                if i64::from(ai) != ai_prev + 1 {
                    crosser.restart_at(&self.vertex(ai as usize));
                }
                ai_prev = i64::from(ai);
                inside = inside != crosser.edge_or_vertex_chain_crossing(&self.vertex(ai as usize + 1));
            }
        }
        inside
    }

    // ---------------------------------------------------------------------
    // Cell region predicates
    // ---------------------------------------------------------------------

    /// Reports whether the loop contains the given cell. This may trigger
    /// construction of the spatial index.
    pub fn contains_cell(&self, target: &Cell) -> bool {
        let snap = self.index.snapshot(self);
        let mut it = snap.iter();
        let relation = it.locate_cell_id(target.id);

        // If "target" is disjoint from all index cells, it is not
        // contained. Similarly, if "target" is subdivided into one or more
        // index cells then it is not contained, since index cells are
        // subdivided only if they (nearly) intersect a sufficient number of
        // edges. (But note that if "target" itself is an index cell then it
        // may be contained, since it could be a cell with no edges in the
        // loop interior.)
        if relation != CellRelation::Indexed {
            return false;
        }

        // Otherwise check if any edges intersect "target".
        if self.boundary_approx_intersects(&it, target) {
            return false;
        }

        // Otherwise check if the loop contains the center of "target".
        self.iterator_contains_point(&it, &target.center())
    }

    /// Reports whether the loop may intersect the given cell: returns false
    /// only when the loop definitely does not intersect it.
    pub fn may_intersect_cell(&self, target: &Cell) -> bool {
        let snap = self.index.snapshot(self);
        let mut it = snap.iter();
        let relation = it.locate_cell_id(target.id);

        // If "target" does not overlap any index cell, there is no
        // intersection.
        if relation == CellRelation::Disjoint {
            return false;
        }
        // If "target" is subdivided into one or more index cells, there is
        // an intersection to within the index error bound.
        if relation == CellRelation::Subdivided {
            return true;
        }
        // If "target" is an index cell, there is an intersection because
        // index cells are created only if they have at least one edge or
        // they are entirely contained by the loop.
        if it.cell_id() == target.id {
            return true;
        }
        // Otherwise check if any edges intersect "target".
        if self.boundary_approx_intersects(&it, target) {
            return true;
        }
        // Otherwise check if the loop contains the center of "target".
        self.iterator_contains_point(&it, &target.center())
    }

    // Reports whether the loop's boundary intersects "target". It may also
    // return true when the loop boundary does not intersect "target" but
    // some edge comes within the worst-case error tolerance.
    //
    // This requires that it.locate_cell_id(target.id) returned Indexed.
    fn boundary_approx_intersects(&self, it: &ShapeIndexIterator<'_>, target: &Cell) -> bool {
        let a_clipped = it.cell().expect("iterator must be positioned at a cell");

        // If there are no edges, there is no intersection.
        if a_clipped.num_edges() == 0 {
            return false;
        }

        // We can save some work if "target" is the index cell itself.
        if it.cell_id() == target.id {
            return true;
        }

        // Otherwise check whether any of the edges intersect "target".
        let max_error = FACE_CLIP_ERROR_UV_COORD + INTERSECTS_RECT_ERROR_UV_DIST;
        let bound = target.bound_uv().expanded_by_margin(max_error);
        for &ai in &a_clipped.edges {
            let ai = ai as usize;
            if let Some((v0, v1)) = clip_to_padded_face(
                &self.vertex(ai),
                &self.vertex(ai + 1),
                target.face(),
                max_error,
            ) {
                if edge_intersects_rect(&v0, &v1, &bound) {
                    return true;
                }
            }
        }
        false
    }

    // ---------------------------------------------------------------------
    // Distance and projection
    // ---------------------------------------------------------------------

    /// Returns the distance from the given point to the loop interior. The
    /// result is zero if the point is contained by the loop.
    pub fn distance(&self, x: &Point) -> Angle {
        if self.contains_point(x) {
            return Angle::zero();
        }
        ClosestEdgeQuery::new(self).distance(x)
    }

    /// Returns the distance from the given point to the loop boundary.
    pub fn distance_to_boundary(&self, x: &Point) -> Angle {
        ClosestEdgeQuery::new(self).distance(x)
    }

    /// Returns the closest point in the loop to the given point. If the
    /// point is contained by the loop it is returned unchanged.
    pub fn project(&self, x: &Point) -> Point {
        if self.contains_point(x) {
            return *x;
        }
        ClosestEdgeQuery::new(self).project(x)
    }

    /// Returns the closest point on the loop boundary to the given point.
    pub fn project_to_boundary(&self, x: &Point) -> Point {
        ClosestEdgeQuery::new(self).project(x)
    }

    // ---------------------------------------------------------------------
    // Area, centroid, turning angle
    // ---------------------------------------------------------------------

    // Returns a first index and a direction (either +1 or -1) such that the
    // vertex sequence (first, first+dir, ..., first+(n-1)*dir) does not
    // change when the loop vertex order is rotated or inverted. This allows
    // the loop vertices to be traversed in a canonical order. The return
    // values are chosen such that (first, ..., first+n*dir) are all in the
    // range [0, 2*n-1] as expected by vertex().
    fn canonical_first_vertex(&self) -> (usize, i64) {
        let mut first = 0;
        let n = self.num_vertices();
        for i in 1..n {
            if self.vertex(i).0.cmp(&self.vertex(first).0) == CmpOrdering::Less {
                first = i;
            }
        }

        // 0 <= first <= n-1, so (first+n*dir) <= 2*n-1.
        if self.vertex(first + 1).0.cmp(&self.vertex(first + n - 1).0) == CmpOrdering::Less {
            return (first, 1);
        }
        // n <= first <= 2*n-1, so (first+n*dir) >= 0.
        (first + n, -1)
    }

    /// Returns the sum of the turning angles at each vertex: positive if
    /// the loop is counterclockwise, negative if it is clockwise, and zero
    /// if the loop is a great circle. Degenerate and nearly-degenerate
    /// loops are handled consistently with the sign predicate: so if a loop
    /// is considered CCW by the symbolic perturbations, its turning angle
    /// will be close to 2π.
    ///
    /// This quantity is also called the "geodesic curvature" of the loop.
    pub fn turning_angle(&self) -> f64 {
        // For empty and full loops, we return the limit value as the loop
        // area approaches 0 or 4π respectively.
        if self.is_empty_or_full() {
            if self.contains_origin() {
                return -2.0 * PI;
            }
            return 2.0 * PI;
        }
        // Don't crash even if the loop is not well-defined.
        if self.num_vertices() < 3 {
            return 0.0;
        }

        // To ensure that we get the same result when the vertex order is
        // rotated, and that the result is negated when the vertex order is
        // reversed, we need to add up the individual turn angles in a
        // consistent order. (In general, adding up a set of numbers in a
        // different order can change the sum due to rounding errors.)
        //
        // Furthermore, if we just accumulate an ordinary sum then the
        // worst-case error is quadratic in the number of vertices. (This
        // can happen with spiral shapes, where the partial sum of the
        // turning angles can be linear in the number of vertices.) To avoid
        // this we use the Kahan summation algorithm.
        let n = self.num_vertices();
        let ni = n as i64;
        let (first, dir) = self.canonical_first_vertex();
        let mut i = first as i64;
        let mut sum = turn_angle(
            &self.vertex(((i + ni - dir) % ni) as usize),
            &self.vertex(i as usize),
            &self.vertex(((i + dir) % ni) as usize),
        );
        let mut compensation = 0.0;
        let mut remaining = n - 1;
        while remaining > 0 {
            i += dir;
            let mut angle = turn_angle(
                &self.vertex((i - dir) as usize),
                &self.vertex(i as usize),
                &self.vertex((i + dir) as usize),
            );
            let old_sum = sum;
            angle += compensation;
            sum += angle;
            compensation = (old_sum - sum) + angle;
            remaining -= 1;
        }
        (dir as f64) * (sum + compensation)
    }

    /// Returns the maximum error in turning_angle. The value is not
    /// constant; it depends on the number of vertices.
    pub fn turning_angle_max_error(&self) -> f64 {
        // The maximum error can be bounded as follows:
        //   2.24 * dblEpsilon    for the stable cross product at B
        //   2.24 * dblEpsilon    for the stable cross product at C
        //   3.25 * dblEpsilon    for the angle
        //   2.00 * dblEpsilon    for each addition in the Kahan summation
        //   ------------------
        //   9.73 * dblEpsilon
        let max_error_per_vertex = 9.73 * DBL_EPSILON;
        max_error_per_vertex * self.num_vertices() as f64
    }

    /// Returns the area of the loop interior, i.e. the region on the left
    /// side of the loop. The result is between 0 and 4π and is not affected
    /// by whether the loop is a "hole" or a "shell".
    pub fn area(&self) -> f64 {
        // It is surprisingly difficult to compute the area of a loop
        // robustly. The main issues are (1) whether degenerate loops are
        // considered to be CCW or not (i.e., whether their area is close to
        // 0 or 4π), and (2) computing the areas of small loops with good
        // relative accuracy.
        //
        // The strategy combines two methods. First we compute the area
        // using the "signed sum over triangles" approach, which has good
        // relative accuracy. If the result is so close to zero or 4π that
        // the loop orientation is ambiguous, we resolve the orientation
        // with the Gauss-Bonnet-based is_normalized check instead, since
        // the turning angle handles degeneracies consistently with the sign
        // predicate.
        if self.is_empty_or_full() {
            if self.contains_origin() {
                return 4.0 * PI;
            }
            return 0.0;
        }
        let mut area = self.surface_integral_f64(|a, b, c| signed_area(a, b, c));

        // The signed area should be between approximately -4π and 4π.
        if area < 0.0 {
            // We have computed the negative of the area of the loop
            // exterior.
            area += 4.0 * PI;
        }
        area = area.clamp(0.0, 4.0 * PI);

        // If the area is close enough to zero or 4π so that the loop
        // orientation is ambiguous, then we compute the loop orientation
        // explicitly.
        let max_error = self.turning_angle_max_error();
        if area < max_error && !self.is_normalized() {
            return 4.0 * PI;
        } else if area > 4.0 * PI - max_error && self.is_normalized() {
            return 0.0;
        }
        area
    }

    /// Returns the true centroid of the loop multiplied by the area of the
    /// loop. The result is not unit length and may not be contained by the
    /// loop.
    ///
    /// We prescale by the loop area for two reasons: (1) it is cheaper to
    /// compute this way, and (2) it makes it easier to compute the centroid
    /// of more complicated shapes (by splitting them into disjoint regions
    /// and adding their centroids).
    pub fn centroid(&self) -> Point {
        // surface_integral_point returns either the integral of position
        // over the loop interior, or the negative of the integral of
        // position over the loop exterior. But these two values are the
        // same (!), because the integral of position over the entire sphere
        // is (0, 0, 0).
        self.surface_integral_point(|a, b, c| true_centroid(a, b, c))
    }

    // Computes the oriented surface integral of some scalar quantity over
    // the loop interior, given a function f(A,B,C) that returns the
    // corresponding integral over the spherical triangle ABC. The loop may
    // be decomposed into overlapping triangles fanned from a moving origin;
    // the f values of CCW triangles are added and those of CW triangles are
    // subtracted, so the overlaps cancel.
    fn surface_integral_f64<F>(&self, f: F) -> f64
    where
        F: Fn(&Point, &Point, &Point) -> f64,
    {
        // We sum f over a collection of oriented triangles, possibly
        // overlapping. Let the sign of a triangle be +1 if it is CCW and -1
        // otherwise, and denote the sign of a triangle T by s(T). Then the
        // collection of triangles is chosen such that either:
        //
        //  (1) Each point in the loop interior is in the interior of an odd
        //      number of positive triangles and an even number of negative
        //      triangles, with the opposite for exterior points; or
        //  (2) the reverse of (1).
        //
        // The triangles basically consist of a "fan" from a moving origin
        // to every loop edge, where the origin is changed only when an edge
        // of the fan would be too long for good numerical accuracy.

        // The maximum length of an edge for it to be considered numerically
        // stable.
        const MAX_LENGTH: f64 = PI - 1e-5;

        let mut sum = 0.0;
        let mut origin = self.vertex(0);
        for i in 1..self.num_vertices() - 1 {
            // Let V_i be vertex(i), let O be the current origin, and let
            // length(A,B) be the length of edge (A,B). At the start of each
            // iteration, the "leading edge" of the triangle fan is (O,V_i),
            // and we want to extend the fan so that the leading edge is
            // (O,V_i+1).
            if self.vertex(i + 1).0.angle(&origin.0) > MAX_LENGTH {
                // We are about to create an unstable edge, so choose a new
                // origin O' for the triangle fan.
                let old_origin = origin;
                if origin == self.vertex(0) {
                    // The following point is well-separated from V_i and
                    // V_0 (and therefore V_i+1 as well).
                    origin = Point(self.vertex(0).0.cross(&self.vertex(i).0).normalize());
                } else if self.vertex(i).0.angle(&self.vertex(0).0) < MAX_LENGTH {
                    // All edges of the triangle (O, V_0, V_i) are stable,
                    // so we can revert to using V_0 as the origin.
                    origin = self.vertex(0);
                } else {
                    // (O, V_i+1) and (V_0, V_i) are antipodal pairs, and O
                    // and V_0 are perpendicular. Therefore V_0 x O is
                    // approximately perpendicular to all of {O, V_0, V_i,
                    // V_i+1}, and we can choose this point O' as the new
                    // origin.
                    origin = Point(self.vertex(0).0.cross(&old_origin.0));
                    // Advance the edge (V_0,O) to (V_0,O').
                    sum += f(&self.vertex(0), &old_origin, &origin);
                }
                // Advance the edge (O,V_i) to (O',V_i).
                sum += f(&old_origin, &self.vertex(i), &origin);
            }
            // Advance the edge (O,V_i) to (O,V_i+1).
            sum += f(&origin, &self.vertex(i), &self.vertex(i + 1));
        }
        // If the origin is not V_0, we need to sum one more triangle.
        if origin != self.vertex(0) {
            // Advance the edge (O,V_n-1) to (O,V_0).
            sum += f(&origin, &self.vertex(self.num_vertices() - 1), &self.vertex(0));
        }
        sum
    }

    // The vector-valued analog of surface_integral_f64.
    fn surface_integral_point<F>(&self, f: F) -> Point
    where
        F: Fn(&Point, &Point, &Point) -> Point,
    {
        const MAX_LENGTH: f64 = PI - 1e-5;

        let mut sum = Vector::default();
        let mut origin = self.vertex(0);
        for i in 1..self.num_vertices() - 1 {
            if self.vertex(i + 1).0.angle(&origin.0) > MAX_LENGTH {
                let old_origin = origin;
                if origin == self.vertex(0) {
                    origin = Point(self.vertex(0).0.cross(&self.vertex(i).0).normalize());
                } else if self.vertex(i).0.angle(&self.vertex(0).0) < MAX_LENGTH {
                    origin = self.vertex(0);
                } else {
                    origin = Point(self.vertex(0).0.cross(&old_origin.0));
                    sum = sum + f(&self.vertex(0), &old_origin, &origin).0;
                }
                sum = sum + f(&old_origin, &self.vertex(i), &origin).0;
            }
            sum = sum + f(&origin, &self.vertex(i), &self.vertex(i + 1)).0;
        }
        if origin != self.vertex(0) {
            sum = sum + f(&origin, &self.vertex(self.num_vertices() - 1), &self.vertex(0)).0;
        }
        Point(sum)
    }

    /// Reports whether the loop area is at most 2π: that is, whether the
    /// loop encloses at most half of the sphere. Degenerate loops are
    /// handled consistently with the sign predicate: a loop that can be
    /// expressed as a union of degenerate or nearly-degenerate CCW
    /// triangles is always considered normalized.
    pub fn is_normalized(&self) -> bool {
        // Optimization: if the longitude span is less than 180 degrees,
        // then the loop covers less than half the sphere and is therefore
        // normalized.
        if self.bound.lng.length() < PI {
            return true;
        }
        // We allow some error so that hemispheres are always considered
        // normalized. The turning angle evaluates exactly to -2π for
        // hemispheres, with no error.
        self.turning_angle() >= -self.turning_angle_max_error()
    }

    // ---------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------

    /// Normalizes the loop if necessary so that the area enclosed by the
    /// loop is at most 2π. This may invert the loop. Requires owned vertex
    /// storage.
    pub fn normalize(&mut self) {
        if !self.is_normalized() {
            self.invert();
        }
    }

    /// Reverses the order of the loop vertices, effectively complementing
    /// the region represented by the loop. For example, the loop ABCD (with
    /// edges AB, BC, CD, DA) becomes the loop DCBA (with edges DC, CB, BA,
    /// AD). Requires owned vertex storage.
    pub fn invert(&mut self) {
        assert!(
            self.owns_vertices(),
            "invert requires owned vertex storage"
        );
        self.reset_mutable_fields();
        if self.is_empty_or_full() {
            let v = if self.is_full() {
                EMPTY_LOOP_POINT
            } else {
                FULL_LOOP_POINT
            };
            if let Vertices::Owned(vec) = &mut self.vertices {
                vec[0] = v;
            }
        } else if let Vertices::Owned(vec) = &mut self.vertices {
            vec.reverse();
        }

        // origin_inside must be set correctly before re-registering with
        // the index.
        self.origin_inside = !self.origin_inside;
        if self.bound.lat.lo > -PI / 2.0 && self.bound.lat.hi < PI / 2.0 {
            // The complement of this loop contains both poles.
            self.bound = Rect::full();
            self.subregion_bound = self.bound;
        } else {
            self.init_bound();
        }
        self.init_index();
    }

    // ---------------------------------------------------------------------
    // Validation
    // ---------------------------------------------------------------------

    /// Reports whether this is a valid loop, logging the validation error
    /// if not.
    pub fn is_valid(&self) -> bool {
        match self.find_validation_error() {
            Ok(()) => true,
            Err(err) => {
                log::error!("invalid loop: {}", err);
                false
            }
        }
    }

    /// Checks whether this is a valid loop, reporting the first problem
    /// found.
    pub fn find_validation_error(&self) -> Result<()> {
        // subregion_bound must be at least as large as bound. (This is an
        // internal consistency check rather than a test of client data.)
        debug_assert!(self.subregion_bound.contains(&self.bound));

        self.find_validation_error_no_index()?;
        self.find_self_intersection()
    }

    /// Like find_validation_error, but skips the check that requires the
    /// spatial index to be built. Useful for containers that do their own
    /// intersection testing and do not want to trigger index construction.
    pub fn find_validation_error_no_index(&self) -> Result<()> {
        // All vertices must be unit length.
        for (i, v) in self.vertices().iter().enumerate() {
            if !v.0.is_unit() {
                return Err(Error::NotUnitLength(i));
            }
        }

        // Loops must have at least 3 vertices (except for empty and full).
        if self.num_vertices() < 3 {
            if self.is_empty_or_full() {
                return Ok(()); // Skip remaining tests.
            }
            return Err(Error::NotEnoughVertices);
        }

        // Loops are not allowed to have any duplicate vertices or edge
        // crossings. We split this check into two parts. First we check
        // that no edge is degenerate (identical endpoints). Then we check
        // that there are no intersections between non-adjacent edges
        // (including at vertices). The second check needs the spatial
        // index, so it does not fall within the scope of this method.
        for i in 0..self.num_vertices() {
            if self.vertex(i) == self.vertex(i + 1) {
                return Err(Error::DuplicateVertices(i));
            }
        }
        Ok(())
    }

    // Scans the spatial index for crossings between non-adjacent edges,
    // including crossings at shared vertices (which indicate duplicate
    // vertices in a loop). Edge pairs only need to be tested within each
    // index cell, since any two edges that cross or touch must land in a
    // common cell.
    fn find_self_intersection(&self) -> Result<()> {
        if self.is_empty_or_full() || self.num_vertices() < 3 {
            return Ok(());
        }
        let n = self.num_vertices();
        let snap = self.index.snapshot(self);
        let mut it = snap.iter();
        while !it.done() {
            let cell = it.cell().expect("positioned");
            let edges = &cell.edges;
            for i in 0..edges.len() {
                for j in (i + 1)..edges.len() {
                    let ai = edges[i] as usize;
                    let aj = edges[j] as usize;
                    // Skip adjacent edges (including the wrap-around pair).
                    if aj == ai + 1 || (ai == 0 && aj == n - 1) {
                        continue;
                    }
                    match crossing_sign(
                        &self.vertex(ai),
                        &self.vertex(ai + 1),
                        &self.vertex(aj),
                        &self.vertex(aj + 1),
                    ) {
                        Crossing::Cross => return Err(Error::SelfIntersection(ai, aj)),
                        // Non-adjacent edges sharing a vertex means the
                        // loop has a duplicate vertex.
                        Crossing::Maybe => return Err(Error::SelfIntersection(ai, aj)),
                        Crossing::DoNotCross => {}
                    }
                }
            }
            it.next();
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Boundary comparisons
    // ---------------------------------------------------------------------

    /// Reports whether two loops have the same vertices in the same linear
    /// order (i.e., cyclic rotations are not allowed).
    pub fn equal(&self, b: &Loop<'_>) -> bool {
        if self.num_vertices() != b.num_vertices() {
            return false;
        }
        for i in 0..self.num_vertices() {
            if self.vertex(i) != b.vertex(i) {
                return false;
            }
        }
        true
    }

    /// Reports whether the two loops have the same boundary. This is true
    /// if and only if the loops have the same vertices in the same cyclic
    /// order (i.e., the vertices may be cyclically rotated). The empty and
    /// full loops are considered to have different boundaries.
    pub fn boundary_equal(&self, b: &Loop<'_>) -> bool {
        if self.num_vertices() != b.num_vertices() {
            return false;
        }

        // Special case to handle empty or full loops. Since they have the
        // same number of vertices, if one loop is empty/full then so is the
        // other.
        if self.is_empty_or_full() {
            return self.is_empty() == b.is_empty();
        }

        for offset in 0..self.num_vertices() {
            if self.vertex(offset) == b.vertex(0) {
                // There is at most one starting offset since loop vertices
                // are unique.
                for i in 0..self.num_vertices() {
                    if self.vertex(i + offset) != b.vertex(i) {
                        return false;
                    }
                }
                return true;
            }
        }
        false
    }

    /// Reports whether the two loops have the same boundary except for
    /// vertex perturbations: the vertices in the two loops must be in the
    /// same cyclic order, and each vertex within the given angular distance
    /// (in radians) of the corresponding vertex in the other loop.
    pub fn boundary_approx_equal(&self, b: &Loop<'_>, max_error: f64) -> bool {
        if self.num_vertices() != b.num_vertices() {
            return false;
        }
        if self.is_empty_or_full() {
            return self.is_empty() == b.is_empty();
        }

        for offset in 0..self.num_vertices() {
            if self
                .vertex(offset)
                .approx_equal(&b.vertex(0), Angle(max_error))
            {
                let mut success = true;
                for i in 0..self.num_vertices() {
                    if !self
                        .vertex(i + offset)
                        .approx_equal(&b.vertex(i), Angle(max_error))
                    {
                        success = false;
                        break;
                    }
                }
                if success {
                    return true;
                }
                // Otherwise continue looping. There may be more than one
                // candidate starting offset since vertices are only matched
                // approximately.
            }
        }
        false
    }

    /// Reports whether the two loop boundaries are within the given
    /// distance (in radians) of each other along their entire lengths: each
    /// point on one boundary must be matched by a point on the other
    /// boundary while advancing around both loops in the same direction.
    /// Unlike boundary_approx_equal, the two loops may have different
    /// numbers of vertices.
    pub fn boundary_near(&self, b: &Loop<'_>, max_error: f64) -> bool {
        // Special case to handle empty or full loops.
        if self.is_empty_or_full() || b.is_empty_or_full() {
            return (self.is_empty() && b.is_empty()) || (self.is_full() && b.is_full());
        }

        for a_offset in 0..self.num_vertices() {
            if match_boundaries(self, b, a_offset, max_error) {
                return true;
            }
        }
        false
    }

    // ---------------------------------------------------------------------
    // Pairwise loop relations
    // ---------------------------------------------------------------------

    /// Reports whether the region contained by this loop is a superset of
    /// the region contained by the other loop.
    pub fn contains(&self, b: &Loop<'_>) -> bool {
        // For this loop A to contain the given loop B, all of the following
        // must be true:
        //
        //  (1) There are no edge crossings between A and B except at
        //      vertices.
        //
        //  (2) At every vertex that is shared between A and B, the local
        //      edge ordering implies that A contains B.
        //
        //  (3) If there are no shared vertices, then A must contain a
        //      vertex of B and B must not contain a vertex of A. (An
        //      arbitrary vertex may be chosen in each case.)
        //
        // The second part of (3) is necessary to detect the case of two
        // loops whose union is the entire sphere, i.e. two loops that
        // contain each other's boundaries but not each other's interiors.
        if !self.subregion_bound.contains(&b.bound) {
            return false;
        }

        // Special cases to handle either loop being empty or full.
        if self.is_empty_or_full() || b.is_empty_or_full() {
            return self.is_full() || b.is_empty();
        }

        // Check whether there are any edge crossings, and also check the
        // loop relationship at any shared vertices.
        let mut relation = ContainsRelation::new();
        if has_crossing_relation(self, b, &mut relation) {
            return false;
        }

        // There are no crossings, and if there are any shared vertices then
        // A contains B locally at each shared vertex.
        if relation.found_shared_vertex {
            return true;
        }

        // Since there are no edge intersections or shared vertices, we just
        // need to test condition (3) above. We can skip this test if we
        // discovered that A contains at least one point of B while checking
        // for edge crossings.
        if !self.contains_point(&b.vertex(0)) {
            return false;
        }

        // We still need to check whether (A union B) is the entire sphere.
        // Normally this check is very cheap due to the bounding box
        // precondition.
        if (b.subregion_bound.contains(&self.bound) || b.bound.union(&self.bound).is_full())
            && b.contains_point(&self.vertex(0))
        {
            return false;
        }
        true
    }

    /// Reports whether the region contained by this loop intersects the
    /// region contained by the other loop.
    pub fn intersects(&self, b: &Loop<'_>) -> bool {
        // A.intersects(B) if and only if !A.complement().contains(B).
        // This code is similar to contains, but is optimized for the case
        // where both loops enclose less than half of the sphere.
        if !self.bound.intersects(&b.bound) {
            return false;
        }

        // Check whether there are any edge crossings, and also check the
        // loop relationship at any shared vertices.
        let mut relation = IntersectsRelation::new();
        if has_crossing_relation(self, b, &mut relation) {
            return true;
        }
        if relation.found_shared_vertex {
            return false;
        }

        // Since there are no edge intersections or shared vertices, the
        // loops intersect only if A contains B, B contains A, or the two
        // loops contain each other's boundaries. These checks are usually
        // cheap because of the bounding box preconditions. Note that
        // neither loop is empty (because of the bounding box check above),
        // so it is safe to access vertex(0).

        // Check whether A contains B, or A and B contain each other's
        // boundaries. (Note that A contains all the vertices of B in either
        // case.)
        if (self.subregion_bound.contains(&b.bound) || self.bound.union(&b.bound).is_full())
            && self.contains_point(&b.vertex(0))
        {
            return true;
        }
        // Check whether B contains A.
        if b.subregion_bound.contains(&self.bound) && b.contains_point(&self.vertex(0)) {
            return true;
        }
        false
    }

    /// Returns +1 if this loop contains the boundary of B, -1 if it
    /// excludes the boundary of B, and 0 if the boundaries of A and B
    /// cross. Shared edges are handled as follows: if XY is a shared edge,
    /// define reversed(XY) to be true if XY appears in opposite directions
    /// in A and B. Then A contains XY if and only if reversed(XY) ==
    /// B.is_hole(). (Intuitively, this checks whether A contains a
    /// vanishingly small region extending from the boundary of B toward the
    /// interior of the polygon to which loop B belongs.)
    ///
    /// This function is used for testing containment and intersection of
    /// multi-loop polygons. Note that this method is not symmetric, since
    /// the result depends on the direction of this loop but not on the
    /// direction of B's loop (in the absence of shared edges).
    ///
    /// Requires that neither loop is empty, and that if B is full, then
    /// !B.is_hole().
    pub fn compare_boundary(&self, b: &Loop<'_>) -> i32 {
        debug_assert!(!self.is_empty() && !b.is_empty());
        debug_assert!(!b.is_full() || !b.is_hole());

        // The bounds must intersect for containment or crossing.
        if !self.bound.intersects(&b.bound) {
            return -1;
        }

        // Full loops are handled as though the loop surrounded the entire
        // sphere.
        if self.is_full() {
            return 1;
        }
        if b.is_full() {
            return -1;
        }

        // Check whether there are any edge crossings, and also check the
        // loop relationship at any shared vertices.
        let mut relation = CompareBoundaryRelation::new(b.is_hole());
        if has_crossing_relation(self, b, &mut relation) {
            return 0;
        }
        if relation.found_shared_vertex {
            if relation.contains_edge {
                return 1;
            }
            return -1;
        }

        // There are no edge intersections or shared vertices, so we can
        // check whether A contains an arbitrary vertex of B.
        if self.contains_point(&b.vertex(0)) {
            return 1;
        }
        -1
    }

    /// Reports whether the given loop is contained within this loop, for
    /// loops that have already been verified not to cross. The two loops
    /// must meet all of the polygon requirements; for example this implies
    /// that their boundaries may not cross or have any shared edges
    /// (although they may have shared vertices).
    pub fn contains_nested(&self, b: &Loop<'_>) -> bool {
        if !self.subregion_bound.contains(&b.bound) {
            return false;
        }

        // Special cases to handle either loop being empty or full. Also
        // bail out when B has no vertices to avoid an out-of-range
        // vertex(1) call below. (This method is called during polygon
        // initialization before the client has an opportunity to call
        // is_valid.)
        if self.is_empty_or_full() || b.num_vertices() < 2 {
            return self.is_full() || b.is_empty();
        }

        // We are given that A and B do not share any edges, and that either
        // one loop contains the other or they do not intersect.
        match self.find_vertex(&b.vertex(1)) {
            None => {
                // Since b.vertex(1) is not shared, we can check whether A
                // contains it.
                self.contains_point(&b.vertex(1))
            }
            Some(m) => {
                // Check whether the edge order around b.vertex(1) is
                // compatible with A containing B.
                wedge_contains(
                    &self.vertex(m - 1),
                    &self.vertex(m),
                    &self.vertex(m + 1),
                    &b.vertex(0),
                    &b.vertex(2),
                )
            }
        }
    }

    /// Reports, for two loops whose boundaries do not cross (see
    /// compare_boundary), whether this loop contains the boundary of the
    /// other loop. If reverse_b is true, the boundary of B is reversed
    /// first (which only affects the result when there are shared edges).
    /// This method is cheaper than compare_boundary because it does not
    /// test for edge intersections.
    ///
    /// Requires that neither loop is empty, and that if B is full then
    /// reverse_b == false.
    pub fn contains_non_crossing_boundary(&self, b: &Loop<'_>, reverse_b: bool) -> bool {
        debug_assert!(!self.is_empty() && !b.is_empty());
        debug_assert!(!b.is_full() || !reverse_b);

        // The bounds must intersect for containment.
        if !self.bound.intersects(&b.bound) {
            return false;
        }

        // Full loops are handled as though the loop surrounded the entire
        // sphere.
        if self.is_full() {
            return true;
        }
        if b.is_full() {
            return false;
        }

        match self.find_vertex(&b.vertex(0)) {
            None => {
                // Since vertex b0 is not shared, we can check whether A
                // contains it.
                self.contains_point(&b.vertex(0))
            }
            Some(m) => {
                // Otherwise check whether the edge (b0, b1) is contained by
                // A.
                wedge_contains_semiwedge(
                    &self.vertex(m - 1),
                    &self.vertex(m),
                    &self.vertex(m + 1),
                    &b.vertex(1),
                    reverse_b,
                )
            }
        }
    }

    /// Returns the index of the vertex at the given point, in the range
    /// [1..num_vertices], or None if no matching vertex is found. (The
    /// index zero is returned as num_vertices, so that the result can
    /// always be used for vertex(m-1), vertex(m), vertex(m+1) index math.)
    pub fn find_vertex(&self, p: &Point) -> Option<usize> {
        let n = self.num_vertices();
        if n < 10 {
            // Exhaustive search for loops below a small threshold.
            for i in 1..=n {
                if self.vertex(i) == *p {
                    return Some(i);
                }
            }
            return None;
        }
        let snap = self.index.snapshot(self);
        let mut it = snap.iter();
        if !it.locate_point(p) {
            return None;
        }
        let a_clipped = it.cell()?;
        for i in (0..a_clipped.num_edges()).rev() {
            let ai = a_clipped.edges[i] as usize;
            if self.vertex(ai) == *p {
                return Some(if ai == 0 { n } else { ai });
            }
            if self.vertex(ai + 1) == *p {
                return Some(ai + 1);
            }
        }
        None
    }

    // ---------------------------------------------------------------------
    // Codec
    // ---------------------------------------------------------------------

    /// Appends the loop to the encoder in the lossless format: a version
    /// byte, the number of vertices, the raw 24-byte vertices, the
    /// origin-inside flag, the depth, and the bound.
    pub fn encode(&self, e: &mut Encoder) {
        e.put8(CURRENT_LOSSLESS_ENCODING_VERSION);
        e.put32(self.num_vertices() as u32);
        for v in self.vertices() {
            e.put_f64(v.0.x);
            e.put_f64(v.0.y);
            e.put_f64(v.0.z);
        }
        e.put8(u8::from(self.origin_inside));
        e.put32(self.depth as u32);
        self.bound.encode(e);
    }

    /// Decodes a loop encoded by encode, copying the vertices out of the
    /// buffer. A zero-vertex loop decodes successfully but is left
    /// uninitialized (not registered with an index).
    pub fn decode(d: &mut Decoder<'_>) -> Result<Loop<'static>> {
        let l = Loop::decode_internal(d, false)?;
        // The storage is always owned in this mode, so the borrowed
        // lifetime can be promoted.
        match l.vertices {
            Vertices::Owned(v) => Ok(Loop {
                vertices: Vertices::Owned(v),
                origin_inside: l.origin_inside,
                depth: l.depth,
                debug_override: l.debug_override,
                unindexed_contains_calls: AtomicI32::new(0),
                bound: l.bound,
                subregion_bound: l.subregion_bound,
                index: l.index,
            }),
            Vertices::Borrowed(_) => unreachable!("copying decode produced borrowed storage"),
        }
    }

    /// Like decode, but if the encoded vertex array is suitably aligned the
    /// returned loop borrows it directly from the decoder's buffer instead
    /// of copying. The loop is then tied to the buffer's lifetime and does
    /// not own its vertices.
    pub fn decode_within_scope<'b>(d: &mut Decoder<'b>) -> Result<Loop<'b>> {
        Loop::decode_internal(d, true)
    }

    fn decode_internal<'b>(d: &mut Decoder<'b>, within_scope: bool) -> Result<Loop<'b>> {
        let version = d.get8()?;
        if version != CURRENT_LOSSLESS_ENCODING_VERSION {
            return Err(Error::Decode("unknown loop encoding version"));
        }

        // Perform all checks before constructing vertex state. Empty loops
        // are explicitly allowed here: a newly created loop has zero
        // vertices, and such loops encode and decode properly.
        let num_vertices = d.get32()?;
        if num_vertices > Options::global().decode_max_num_vertices {
            return Err(Error::Decode("too many vertices"));
        }
        let n = num_vertices as usize;
        let byte_len = n
            .checked_mul(3 * mem::size_of::<f64>())
            .ok_or(Error::Decode("vertex count overflow"))?;
        if d.remaining() < byte_len + 1 + 4 {
            return Err(Error::Decode("buffer truncated"));
        }

        // Many platforms can not do unaligned double loads; use the
        // zero-copy path only when the vertex bytes are properly aligned.
        let aligned = d.current_addr() % mem::align_of::<f64>() == 0;
        let vertices = if within_scope && aligned {
            let bytes = d.get_bytes(byte_len)?;
            // SAFETY: Point is a repr(transparent) wrapper of a repr(C)
            // triple of f64, so it has size 24 and alignment 8. The slice
            // is exactly n * 24 bytes, its address is 8-byte aligned
            // (checked above), it outlives the returned loop by the 'b
            // lifetime bound, and every bit pattern is a valid f64.
            let pts = unsafe { std::slice::from_raw_parts(bytes.as_ptr() as *const Point, n) };
            Vertices::Borrowed(pts)
        } else {
            let mut v = Vec::with_capacity(n);
            for _ in 0..n {
                let x = d.get_f64()?;
                let y = d.get_f64()?;
                let z = d.get_f64()?;
                v.push(Point(Vector::new(x, y, z)));
            }
            Vertices::Owned(v)
        };

        let origin_inside = d.get8()? != 0;
        let depth = d.get32()? as i32;
        let bound = Rect::decode(d)?;
        let subregion_bound = expand_for_subregions(&bound);

        let mut l = Loop {
            vertices,
            origin_inside,
            depth,
            debug_override: DebugOverride::Allow,
            unindexed_contains_calls: AtomicI32::new(0),
            bound,
            subregion_bound,
            index: ShapeIndex::new(),
        };

        // An initialized loop will have some non-zero count of vertices. A
        // default (uninitialized) loop has zero vertices. This code
        // supports encoding and decoding of uninitialized loops, but the
        // index is only set up for initialized ones.
        if n > 0 {
            l.init_index();
        }
        Ok(l)
    }

    /// Computes the cell-space coordinates of every vertex, as required by
    /// encode_compressed.
    pub fn get_xyz_face_si_ti_vertices(&self) -> Vec<XyzFaceSiTi> {
        self.vertices().iter().map(XyzFaceSiTi::from_point).collect()
    }

    /// Appends the loop to the encoder in the compressed format: the vertex
    /// count and vertices (snapped to the given level where possible), a
    /// properties bitmap, the depth, and the bound when the loop is large
    /// enough that recomputing it on decode would dominate.
    pub fn encode_compressed(&self, e: &mut Encoder, vertices: &[XyzFaceSiTi], snap_level: i32) {
        assert_eq!(vertices.len(), self.num_vertices());
        e.put_varint32(self.num_vertices() as u32);
        encode_points_compressed(vertices, snap_level, e);

        let mut properties = 0u32;
        if self.origin_inside {
            properties |= COMPRESSED_ORIGIN_INSIDE;
        }
        let bound_encoded = self.num_vertices() >= MIN_VERTICES_FOR_BOUND;
        if bound_encoded {
            properties |= COMPRESSED_BOUND_ENCODED;
        }
        e.put_varint32(properties);
        e.put_varint32(self.depth as u32);
        if bound_encoded {
            self.bound.encode(e);
        }
    }

    /// Decodes a loop encoded by encode_compressed at the same snap level.
    /// Unlike the lossless decoder this rejects zero-vertex loops, since
    /// compressed encodings are only produced for initialized loops.
    pub fn decode_compressed(d: &mut Decoder<'_>, snap_level: i32) -> Result<Loop<'static>> {
        let num_vertices = d.get_varint32()?;
        if num_vertices == 0 {
            return Err(Error::Decode("compressed loop has no vertices"));
        }
        if num_vertices > Options::global().decode_max_num_vertices {
            return Err(Error::Decode("too many vertices"));
        }
        let n = num_vertices as usize;
        let points = decode_points_compressed(d, n, snap_level)?;

        let properties = d.get_varint32()?;
        let origin_inside = properties & COMPRESSED_ORIGIN_INSIDE != 0;
        let depth = d.get_varint32()? as i32;

        let mut l = Loop {
            vertices: Vertices::Owned(points),
            origin_inside,
            depth,
            debug_override: DebugOverride::Allow,
            unindexed_contains_calls: AtomicI32::new(0),
            bound: Rect::empty(),
            subregion_bound: Rect::empty(),
            index: ShapeIndex::new(),
        };
        if properties & COMPRESSED_BOUND_ENCODED != 0 {
            l.bound = Rect::decode(d)?;
            l.subregion_bound = expand_for_subregions(&l.bound);
        } else {
            l.init_bound();
        }
        l.init_index();
        Ok(l)
    }
}

impl<'a> Clone for Loop<'a> {
    /// Cloning always produces owned vertex storage. The bounds are reused
    /// rather than recomputed.
    fn clone(&self) -> Loop<'a> {
        let mut l = Loop {
            vertices: Vertices::Owned(self.vertices().to_vec()),
            origin_inside: self.origin_inside,
            depth: self.depth,
            debug_override: self.debug_override,
            unindexed_contains_calls: AtomicI32::new(0),
            bound: self.bound,
            subregion_bound: self.subregion_bound,
            index: ShapeIndex::new(),
        };
        l.init_index();
        l
    }
}

impl<'a, 'b> PartialEq<Loop<'b>> for Loop<'a> {
    fn eq(&self, other: &Loop<'b>) -> bool {
        self.equal(other)
    }
}

impl<'a> fmt::Debug for Loop<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loop")
            .field("num_vertices", &self.num_vertices())
            .field("depth", &self.depth)
            .field("origin_inside", &self.origin_inside)
            .finish()
    }
}

impl<'a> Shape for Loop<'a> {
    fn num_edges(&self) -> i32 {
        if self.is_empty_or_full() {
            0
        } else {
            self.num_vertices() as i32
        }
    }

    fn edge(&self, i: i32) -> Edge {
        Edge {
            v0: self.vertex(i as usize),
            v1: self.vertex(i as usize + 1),
        }
    }

    fn reference_point(&self) -> ReferencePoint {
        ReferencePoint::origin(self.origin_inside)
    }

    fn num_chains(&self) -> i32 {
        if self.is_empty() {
            0
        } else {
            1
        }
    }

    fn chain(&self, _chain_id: i32) -> Chain {
        Chain {
            start: 0,
            length: self.num_edges(),
        }
    }

    fn dimension(&self) -> i32 {
        2
    }
}

impl<'a> Region for Loop<'a> {
    fn cap_bound(&self) -> Cap {
        self.bound.cap_bound()
    }

    fn rect_bound(&self) -> Rect {
        self.bound
    }

    fn contains_cell(&self, cell: &Cell) -> bool {
        Loop::contains_cell(self, cell)
    }

    fn may_intersect_cell(&self, cell: &Cell) -> bool {
        Loop::may_intersect_cell(self, cell)
    }

    fn contains_point(&self, p: &Point) -> bool {
        Loop::contains_point(self, p)
    }
}

// ---------------------------------------------------------------------
// Wedge relations
// ---------------------------------------------------------------------

// Reports whether the wedge (a0, ab1, a2) contains the wedge (b0, ab1, b2).
// Equivalently, reports whether the interior of A at the shared vertex ab1
// contains the interior of B there.
fn wedge_contains(a0: &Point, ab1: &Point, a2: &Point, b0: &Point, b2: &Point) -> bool {
    // For A to contain B (where each loop interior is defined to be its
    // left side), the CCW edge order around ab1 must be a2 b2 b0 a0. We
    // split this test into two parts that test three vertices each.
    ordered_ccw(a2, b2, b0, ab1) && ordered_ccw(b0, a0, a2, ab1)
}

// Reports whether the wedges (a0, ab1, a2) and (b0, ab1, b2) intersect.
fn wedge_intersects(a0: &Point, ab1: &Point, a2: &Point, b0: &Point, b2: &Point) -> bool {
    // For A not to intersect B (where each loop interior is defined to be
    // its left side), the CCW edge order around ab1 must be a0 b2 b0 a2.
    // Note that it's important to write these conditions as negatives
    // (!ordered_ccw(a,b,c,o) rather than ordered_ccw(c,b,a,o)) to get
    // correct results when two vertices are the same.
    !(ordered_ccw(a0, b2, b0, ab1) && ordered_ccw(b0, a2, a0, ab1))
}

// Reports whether the wedge (a0, ab1, a2) contains the "semiwedge" defined
// as any non-empty open set of rays immediately CCW from the edge
// (ab1, b2). If reverse is true, then substitute clockwise for CCW; this
// simulates what would happen if the direction of the other loop was
// reversed.
fn wedge_contains_semiwedge(
    a0: &Point,
    ab1: &Point,
    a2: &Point,
    b2: &Point,
    reverse: bool,
) -> bool {
    if b2 == a0 || b2 == a2 {
        // We have a shared or reversed edge.
        return (b2 == a0) == reverse;
    }
    ordered_ccw(a0, a2, b2, ab1)
}

// ---------------------------------------------------------------------
// Relation machinery
// ---------------------------------------------------------------------

// CrossingTarget represents the containment value that, when observed for
// a cell center on one side of a relation, contributes to an early exit
// equivalent to finding an edge crossing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum CrossingTarget {
    // The relation has no useful early-exit condition on this side.
    DontCare,
    // An early exit requires contains(P) == false on this side.
    DontCross,
    // An early exit requires contains(P) == true on this side.
    Cross,
}

impl CrossingTarget {
    fn matches(self, contains: bool) -> bool {
        match self {
            CrossingTarget::DontCare => false,
            CrossingTarget::DontCross => !contains,
            CrossingTarget::Cross => contains,
        }
    }
}

// LoopRelation defines the interface for checking a type of relationship
// between two loops: each relation supplies its early-exit crossing targets
// and its policy for shared vertices.
trait LoopRelation {
    // Optionally, the two crossing targets can specify an early-exit
    // condition for the relation: if any point P is found such that
    //
    //   A.contains(P) == a_crossing_target() &&
    //   B.contains(P) == b_crossing_target()
    //
    // then the relation is assumed to be the same as if a pair of crossing
    // edges were found. For example, the contains relation has targets
    // (false, true): if A does not contain some point that B does, then A
    // cannot contain B, which is also what an edge crossing implies.
    fn a_crossing_target(&self) -> CrossingTarget;
    fn b_crossing_target(&self) -> CrossingTarget;

    // Given a vertex ab1 that is shared between the two loops, reports
    // whether the two associated wedges (a0, ab1, a2) and (b0, ab1, b2) are
    // equivalent to an edge crossing. The relation is also allowed to
    // maintain its own internal state, and can return true if it observes
    // any sequence of wedges that are equivalent to an edge crossing.
    fn wedges_cross(
        &mut self,
        a0: &Point,
        ab1: &Point,
        a2: &Point,
        b0: &Point,
        b2: &Point,
    ) -> bool;
}

// Loop relation for contains().
struct ContainsRelation {
    found_shared_vertex: bool,
}

impl ContainsRelation {
    fn new() -> Self {
        ContainsRelation {
            found_shared_vertex: false,
        }
    }
}

impl LoopRelation for ContainsRelation {
    fn a_crossing_target(&self) -> CrossingTarget {
        CrossingTarget::DontCross
    }

    fn b_crossing_target(&self) -> CrossingTarget {
        CrossingTarget::Cross
    }

    fn wedges_cross(
        &mut self,
        a0: &Point,
        ab1: &Point,
        a2: &Point,
        b0: &Point,
        b2: &Point,
    ) -> bool {
        self.found_shared_vertex = true;
        !wedge_contains(a0, ab1, a2, b0, b2)
    }
}

// Loop relation for intersects().
struct IntersectsRelation {
    found_shared_vertex: bool,
}

impl IntersectsRelation {
    fn new() -> Self {
        IntersectsRelation {
            found_shared_vertex: false,
        }
    }
}

impl LoopRelation for IntersectsRelation {
    fn a_crossing_target(&self) -> CrossingTarget {
        CrossingTarget::Cross
    }

    fn b_crossing_target(&self) -> CrossingTarget {
        CrossingTarget::Cross
    }

    fn wedges_cross(
        &mut self,
        a0: &Point,
        ab1: &Point,
        a2: &Point,
        b0: &Point,
        b2: &Point,
    ) -> bool {
        self.found_shared_vertex = true;
        wedge_intersects(a0, ab1, a2, b0, b2)
    }
}

// Loop relation for compare_boundary().
//
// The compare-boundary relation does not have a useful early-exit
// condition, so both crossing targets are DontCare.
//
// Aside: a possible early exit condition could be based on the following:
// if A contains a point of both B and ~B, then A intersects boundary(B);
// similarly for ~A. So if the intersections of {A, ~A} with {B, ~B} are all
// non-empty, the boundaries cross. Unfortunately it isn't worth detecting
// this situation, because by the time we have seen a point in all four
// intersection regions, we are also guaranteed to have seen at least one
// pair of crossing edges.
struct CompareBoundaryRelation {
    reverse_b: bool,           // True if loop B should be reversed.
    found_shared_vertex: bool, // True if any wedge was processed.
    contains_edge: bool,       // True if any edge of B is contained by A.
    excludes_edge: bool,       // True if any edge of B is excluded by A.
}

impl CompareBoundaryRelation {
    fn new(reverse_b: bool) -> Self {
        CompareBoundaryRelation {
            reverse_b,
            found_shared_vertex: false,
            contains_edge: false,
            excludes_edge: false,
        }
    }
}

impl LoopRelation for CompareBoundaryRelation {
    fn a_crossing_target(&self) -> CrossingTarget {
        CrossingTarget::DontCare
    }

    fn b_crossing_target(&self) -> CrossingTarget {
        CrossingTarget::DontCare
    }

    fn wedges_cross(
        &mut self,
        a0: &Point,
        ab1: &Point,
        a2: &Point,
        _b0: &Point,
        b2: &Point,
    ) -> bool {
        // Because we don't care about the interior of B, only its boundary,
        // it is sufficient to check whether A contains the semiwedge
        // (ab1, b2).
        self.found_shared_vertex = true;
        if wedge_contains_semiwedge(a0, ab1, a2, b2, self.reverse_b) {
            self.contains_edge = true;
        } else {
            self.excludes_edge = true;
        }
        self.contains_edge && self.excludes_edge
    }
}

// RangeIterator is a wrapper over the index iterator with extra methods
// that are useful for merging the contents of two indexes in lockstep.
struct RangeIterator<'r> {
    it: ShapeIndexIterator<'r>,
    id: CellId,
    range_min: CellId,
    range_max: CellId,
    clipped: Option<&'r IndexCell>,
}

impl<'r> RangeIterator<'r> {
    // Constructs a new iterator positioned at the first cell of the index.
    fn new(snap: &'r IndexSnapshot) -> RangeIterator<'r> {
        let mut r = RangeIterator {
            it: snap.iter(),
            id: CellId::sentinel(),
            range_min: CellId::sentinel(),
            range_max: CellId::sentinel(),
            clipped: None,
        };
        r.refresh();
        r
    }

    fn id(&self) -> CellId {
        self.id
    }

    // The min and max leaf cell ids covered by the current cell. If done is
    // true, these methods return a value larger than any valid cell id.
    fn range_min(&self) -> CellId {
        self.range_min
    }

    fn range_max(&self) -> CellId {
        self.range_max
    }

    fn clipped(&self) -> &'r IndexCell {
        self.clipped.expect("iterator not positioned at a cell")
    }

    fn num_edges(&self) -> usize {
        self.clipped.map_or(0, |c| c.num_edges())
    }

    fn contains_center(&self) -> bool {
        self.clipped.map_or(false, |c| c.contains_center)
    }

    fn next(&mut self) {
        self.it.next();
        self.refresh();
    }

    fn done(&self) -> bool {
        self.id == CellId::sentinel()
    }

    // Positions the iterator at the first cell that overlaps or follows
    // "target", i.e. such that range_max >= target.range_min.
    fn seek_to(&mut self, target: &RangeIterator<'_>) {
        self.it.seek(target.range_min());
        // If the current cell does not overlap "target", it is possible
        // that the previous cell is the one we are looking for. This can
        // only happen when the previous cell contains "target" but has a
        // smaller cell id.
        if self.it.done() || self.it.cell_id().range_min() > target.range_max() {
            if self.it.prev() && self.it.cell_id().range_max() < target.id() {
                self.it.next();
            }
        }
        self.refresh();
    }

    // Positions the iterator at the first cell that follows "target", i.e.
    // the first cell such that range_min > target.range_max.
    fn seek_beyond(&mut self, target: &RangeIterator<'_>) {
        self.it.seek(target.range_max().next());
        if !self.it.done() && self.it.cell_id().range_min() <= target.range_max() {
            self.it.next();
        }
        self.refresh();
    }

    // Updates the iterator state after the position has changed.
    fn refresh(&mut self) {
        if self.it.done() {
            self.id = CellId::sentinel();
            self.clipped = None;
        } else {
            self.id = self.it.cell_id();
            self.clipped = self.it.cell();
        }
        self.range_min = self.id.range_min();
        self.range_max = self.id.range_max();
    }
}

// LoopCrosser is a helper for determining whether two loops cross. It is
// instantiated twice for each pair of loops to be tested, once for the pair
// (A,B) and once for the pair (B,A), in order to be able to process edges
// in either loop nesting order.
struct LoopCrosser<'r> {
    a: &'r Loop<'r>,
    b: &'r Loop<'r>,
    // If true, the loops A and B have been swapped. This affects how the
    // arguments are passed to the relation, since for example A.contains(B)
    // is not the same as B.contains(A).
    swapped: bool,
    // The crossing targets, taking the swap into account.
    a_crossing_target: CrossingTarget,
    b_crossing_target: CrossingTarget,

    // State maintained by start_edge and edge_crosses_cell.
    crosser: Option<EdgeCrosser>,
    aj: usize,
    bj_prev: i64,

    // The index snapshot of B, for edge queries.
    b_snap: &'r IndexSnapshot,
}

impl<'r> LoopCrosser<'r> {
    fn new(
        a: &'r Loop<'r>,
        b: &'r Loop<'r>,
        b_snap: &'r IndexSnapshot,
        a_target: CrossingTarget,
        b_target: CrossingTarget,
        swapped: bool,
    ) -> LoopCrosser<'r> {
        let (a_crossing_target, b_crossing_target) = if swapped {
            (b_target, a_target)
        } else {
            (a_target, b_target)
        };
        LoopCrosser {
            a,
            b,
            swapped,
            a_crossing_target,
            b_crossing_target,
            crosser: None,
            aj: 0,
            bj_prev: -2,
            b_snap,
        }
    }

    // Prepares to check the given edge of loop A for crossings.
    fn start_edge(&mut self, aj: usize) {
        self.crosser = Some(EdgeCrosser::new(&self.a.vertex(aj), &self.a.vertex(aj + 1)));
        self.aj = aj;
        self.bj_prev = -2;
    }

    // Checks the current edge of loop A for crossings with all edges of the
    // given index cell of loop B.
    fn edge_crosses_cell(
        &mut self,
        b_clipped: &IndexCell,
        relation: &mut dyn LoopRelation,
    ) -> bool {
        let mut crosser = self.crosser.take().expect("start_edge not called");
        let mut result = false;
        for &bj_raw in &b_clipped.edges {
            let bj = bj_raw as usize;
            if bj as i64 != self.bj_prev + 1 {
                crosser.restart_at(&self.b.vertex(bj));
            }
            self.bj_prev = bj as i64;
            let crossing = crosser.chain_crossing_sign(&self.b.vertex(bj + 1));
            match crossing {
                Crossing::DoNotCross => continue,
                Crossing::Cross => {
                    result = true;
                    break;
                }
                Crossing::Maybe => {}
            }
            // We only need to check each shared vertex once, so we only
            // consider the case where a.vertex(aj+1) == b.vertex(bj+1).
            if self.a.vertex(self.aj + 1) == self.b.vertex(bj + 1) {
                let crossed = if self.swapped {
                    relation.wedges_cross(
                        &self.b.vertex(bj),
                        &self.b.vertex(bj + 1),
                        &self.b.vertex(bj + 2),
                        &self.a.vertex(self.aj),
                        &self.a.vertex(self.aj + 2),
                    )
                } else {
                    relation.wedges_cross(
                        &self.a.vertex(self.aj),
                        &self.a.vertex(self.aj + 1),
                        &self.a.vertex(self.aj + 2),
                        &self.b.vertex(bj),
                        &self.b.vertex(bj + 2),
                    )
                };
                if crossed {
                    result = true;
                    break;
                }
            }
        }
        self.crosser = Some(crosser);
        result
    }

    // Tests all edges of the index cell of A against all edges of the index
    // cell of B.
    fn cell_crosses_cell(
        &mut self,
        a_clipped: &IndexCell,
        b_clipped: &IndexCell,
        relation: &mut dyn LoopRelation,
    ) -> bool {
        for &ai in &a_clipped.edges {
            self.start_edge(ai as usize);
            if self.edge_crosses_cell(b_clipped, relation) {
                return true;
            }
        }
        false
    }

    // Tests all edges of the index cell of A against all edges of B that
    // are contained within the cell b_id. The relevant B edges are
    // guaranteed to be children of b_id, which lets us find the correct
    // index cells more efficiently.
    fn cell_crosses_any_subcell(
        &mut self,
        a_clipped: &IndexCell,
        b_id: CellId,
        relation: &mut dyn LoopRelation,
    ) -> bool {
        let b_root = PaddedCell::from_cell_id(b_id, 0.0);
        for &ai in &a_clipped.edges {
            let aj = ai as usize;
            // Use an edge query starting at b_root to find the index cells
            // of B that might contain crossing edges.
            let mut query = CrossingEdgeQuery::new(self.b_snap);
            let cells: Vec<&IndexCell> = query
                .get_cells(&self.a.vertex(aj), &self.a.vertex(aj + 1), &b_root)
                .to_vec();
            if cells.is_empty() {
                continue;
            }
            self.start_edge(aj);
            for cell in cells {
                if self.edge_crosses_cell(cell, relation) {
                    return true;
                }
            }
        }
        false
    }

    // Given two iterators positioned such that ai.id() contains bi.id(),
    // reports whether there is an edge crossing or wedge crossing anywhere
    // within ai.id(). Advances bi (only) past ai.id().
    fn has_crossing(
        &mut self,
        ai: &mut RangeIterator<'r>,
        bi: &mut RangeIterator<'r>,
        relation: &mut dyn LoopRelation,
    ) -> bool {
        debug_assert!(ai.id().contains(&bi.id()));

        // If ai.id() intersects many edges of B, then it is faster to use
        // the edge query to narrow down the candidates. But if it
        // intersects only a few edges, it is faster to check all the
        // crossings directly. We handle this by advancing bi and keeping
        // track of how many edges we would need to test.
        let mut total_edges = 0;
        let mut b_cells: Vec<&'r IndexCell> = Vec::new();
        loop {
            if bi.num_edges() > 0 {
                total_edges += bi.num_edges();
                if total_edges >= EDGE_QUERY_MIN_EDGES {
                    // There are too many edges to test them directly, so
                    // use the edge query instead.
                    if self.cell_crosses_any_subcell(ai.clipped(), ai.id(), relation) {
                        return true;
                    }
                    bi.seek_beyond(ai);
                    return false;
                }
                b_cells.push(bi.clipped());
            }
            bi.next();
            if bi.id() > ai.range_max() {
                break;
            }
        }

        // Test all the edge crossings directly.
        for b_cell in b_cells {
            if self.cell_crosses_cell(ai.clipped(), b_cell, relation) {
                return true;
            }
        }
        false
    }

    // Given two iterators positioned such that ai.id() contains bi.id(),
    // reports whether there is a crossing relationship anywhere within
    // ai.id(): an edge crossing, a wedge crossing, or a point P that
    // matches both crossing targets. Advances both iterators past ai.id().
    fn has_crossing_relation(
        &mut self,
        ai: &mut RangeIterator<'r>,
        bi: &mut RangeIterator<'r>,
        relation: &mut dyn LoopRelation,
    ) -> bool {
        debug_assert!(ai.id().contains(&bi.id()));
        if ai.num_edges() == 0 {
            if self.a_crossing_target.matches(ai.contains_center()) {
                // All points within ai.id() satisfy the crossing target for
                // A, so it's worth iterating through the cells of B to see
                // whether any cell centers also satisfy the crossing target
                // for B.
                loop {
                    if self.b_crossing_target.matches(bi.contains_center()) {
                        return true;
                    }
                    bi.next();
                    if bi.id() > ai.range_max() {
                        break;
                    }
                }
            } else {
                // The crossing target for A is not satisfied, so we skip
                // over the cells of B using binary search.
                bi.seek_beyond(ai);
            }
        } else {
            // The current cell of A has at least one edge, so check for
            // crossings.
            if self.has_crossing(ai, bi, relation) {
                return true;
            }
        }
        ai.next();
        false
    }
}

// Checks all edges of loop A for intersection against all edges of loop B
// and reports whether there are any that satisfy the given relation. If
// there is any shared vertex, the wedges centered at this vertex are tested
// to see if they satisfy the relation.
//
// If the two loop boundaries cross, this method is guaranteed to return
// true. It also returns true in certain cases if the loop relationship is
// equivalent to crossing. For example, if the relation is "contains" and a
// point P is found such that B contains P but A does not contain P, this
// method will return true to indicate that the result is the same as though
// a pair of crossing edges were found (since contains returns false in
// both cases).
fn has_crossing_relation(a: &Loop<'_>, b: &Loop<'_>, relation: &mut dyn LoopRelation) -> bool {
    let a_snap = a.index.snapshot(a);
    let b_snap = b.index.snapshot(b);

    // We look for cell id ranges where the indexes of A and B overlap, and
    // then test those edges for crossings.
    let mut ai = RangeIterator::new(&a_snap);
    let mut bi = RangeIterator::new(&b_snap);

    let a_target = relation.a_crossing_target();
    let b_target = relation.b_crossing_target();
    // ab tests edges of A against B; ba tests edges of B against A.
    let mut ab = LoopCrosser::new(a, b, &b_snap, a_target, b_target, false);
    let mut ba = LoopCrosser::new(b, a, &a_snap, a_target, b_target, true);

    while !ai.done() || !bi.done() {
        if ai.range_max() < bi.range_min() {
            // The A and B cells don't overlap, and A precedes B.
            ai.seek_to(&bi);
        } else if bi.range_max() < ai.range_min() {
            // The A and B cells don't overlap, and B precedes A.
            bi.seek_to(&ai);
        } else {
            // One cell contains the other. Determine which cell is larger.
            let ab_relation = ai.id().lsb() as i64 - bi.id().lsb() as i64;
            match ab_relation.cmp(&0) {
                CmpOrdering::Greater => {
                    // A's index cell is larger.
                    if ab.has_crossing_relation(&mut ai, &mut bi, relation) {
                        return true;
                    }
                }
                CmpOrdering::Less => {
                    // B's index cell is larger.
                    if ba.has_crossing_relation(&mut bi, &mut ai, relation) {
                        return true;
                    }
                }
                CmpOrdering::Equal => {
                    // The A and B cells are the same. Since the two cells
                    // have the same center point P, check whether P
                    // satisfies the crossing targets.
                    if ab.a_crossing_target.matches(ai.contains_center())
                        && ab.b_crossing_target.matches(bi.contains_center())
                    {
                        return true;
                    }
                    // Otherwise test all the edge crossings directly.
                    if ai.num_edges() > 0
                        && bi.num_edges() > 0
                        && ab.cell_crosses_cell(ai.clipped(), bi.clipped(), relation)
                    {
                        return true;
                    }
                    ai.next();
                    bi.next();
                }
            }
        }
    }
    false
}

// The state machine for boundary_near: a pair (i, j) of indices into the
// two vertex sequences, where a transition to (i+1, j) is allowed if
// a.vertex(i+1+a_offset) is within max_error of the edge from b.vertex(j)
// to b.vertex(j+1), and symmetrically for (i, j+1). Both choices sometimes
// need to be explored, so the search uses an explicit stack and a visited
// set.
fn match_boundaries(a: &Loop<'_>, b: &Loop<'_>, a_offset: usize, max_error: f64) -> bool {
    use crate::s2::edge_distance::distance_from_segment;

    let na = a.num_vertices();
    let nb = b.num_vertices();
    let mut pending: Vec<(usize, usize)> = vec![(0, 0)];
    let mut done: HashSet<(usize, usize)> = HashSet::new();
    while let Some((i, j)) = pending.pop() {
        if i == na && j == nb {
            return true;
        }
        done.insert((i, j));

        // If (i == na && a_offset == na-1), then (i+1+a_offset) overflows
        // the [0, 2*na-1] range allowed by vertex(), so we reduce the range
        // if necessary.
        let mut io = i + a_offset;
        if io >= na {
            io -= na;
        }

        if i < na
            && !done.contains(&(i + 1, j))
            && distance_from_segment(&a.vertex(io + 1), &b.vertex(j), &b.vertex(j + 1)).rad()
                <= max_error
        {
            pending.push((i + 1, j));
        }
        if j < nb
            && !done.contains(&(i, j + 1))
            && distance_from_segment(&b.vertex(j + 1), &a.vertex(io), &a.vertex(io + 1)).rad()
                <= max_error
        {
            pending.push((i, j + 1));
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_f64_eq;
    use crate::s1::Deg;
    use crate::s2::latlng::LatLng;
    use std::sync::Arc;

    // Constructs a loop from a list of (lat, lng) pairs in degrees.
    fn loop_from_degrees(coords: &[(f64, f64)]) -> Loop<'static> {
        let vertices: Vec<Point> = coords
            .iter()
            .map(|&(lat, lng)| Point::from(&LatLng::from_degrees(lat, lng)))
            .collect();
        Loop::from_points(vertices)
    }

    fn make_loop(coords: &[(f64, f64, f64)]) -> Loop<'static> {
        let vertices: Vec<Point> = coords
            .iter()
            .map(|&(x, y, z)| Point::from_coords(x, y, z))
            .collect();
        Loop::from_points(vertices)
    }

    // The northern hemisphere, bounded by the equator traversed eastward.
    fn north_hemi() -> Loop<'static> {
        make_loop(&[
            (1.0, 0.0, 0.0),
            (0.0, 1.0, 0.0),
            (-1.0, 0.0, 0.0),
            (0.0, -1.0, 0.0),
        ])
    }

    fn south_hemi() -> Loop<'static> {
        make_loop(&[
            (0.0, -1.0, 0.0),
            (-1.0, 0.0, 0.0),
            (0.0, 1.0, 0.0),
            (1.0, 0.0, 0.0),
        ])
    }

    // The octant x, y, z > 0.
    fn octant() -> Loop<'static> {
        make_loop(&[(1.0, 0.0, 0.0), (0.0, 1.0, 0.0), (0.0, 0.0, 1.0)])
    }

    fn arctic_80() -> Loop<'static> {
        loop_from_degrees(&[(80.0, 0.0), (80.0, 90.0), (80.0, 180.0), (80.0, -90.0)])
    }

    fn antarctic_80() -> Loop<'static> {
        loop_from_degrees(&[(-80.0, 0.0), (-80.0, -90.0), (-80.0, 180.0), (-80.0, 90.0)])
    }

    // A diamond-shaped loop around (0, 0).
    fn loop_a() -> Loop<'static> {
        loop_from_degrees(&[(0.0, 0.0), (0.0, 10.0), (10.0, 0.0), (0.0, -10.0)])
    }

    // loop_a shifted east, overlapping loop_a.
    fn loop_b() -> Loop<'static> {
        loop_from_degrees(&[(0.0, 5.0), (0.0, 15.0), (10.0, 5.0), (0.0, -5.0)])
    }

    // A square that contains loop_a.
    fn loop_c() -> Loop<'static> {
        loop_from_degrees(&[(-15.0, -15.0), (-15.0, 15.0), (15.0, 15.0), (15.0, -15.0)])
    }

    // A small diamond inside loop_a, sharing the vertex (0, 0) with it.
    fn loop_d() -> Loop<'static> {
        loop_from_degrees(&[(0.0, 0.0), (1.0, 2.0), (2.0, 0.0), (1.0, -2.0)])
    }

    // A diamond on the opposite side of the sphere from loop_a.
    fn loop_e() -> Loop<'static> {
        loop_from_degrees(&[(0.0, 170.0), (0.0, -180.0), (10.0, 175.0)])
    }

    #[test]
    fn empty_loop_properties() {
        let empty = Loop::empty();
        assert!(empty.is_empty());
        assert!(!empty.is_full());
        assert!(empty.is_empty_or_full());
        assert_eq!(1, empty.num_vertices());
        assert_eq!(0, empty.num_edges());
        assert!(empty.rect_bound().is_empty());
        assert_f64_eq!(0.0, empty.area());
        assert_f64_eq!(2.0 * PI, empty.turning_angle());
        assert!(!empty.contains_point(&Point::from_coords(0.3, 0.4, 0.5)));
        assert!(empty.find_validation_error().is_ok());
    }

    #[test]
    fn full_loop_properties() {
        let full = Loop::full();
        assert!(full.is_full());
        assert!(!full.is_empty());
        assert_eq!(1, full.num_vertices());
        assert_eq!(0, full.num_edges());
        assert!(full.rect_bound().is_full());
        assert_f64_eq!(4.0 * PI, full.area());
        assert_f64_eq!(-2.0 * PI, full.turning_angle());
        assert!(full.contains_point(&Point::from_coords(0.3, 0.4, 0.5)));
        assert!(full.contains_point(&Point::from_coords(-0.3, -0.4, -0.5)));
        assert!(full.find_validation_error().is_ok());
    }

    #[test]
    fn vertex_wraps_cyclically() {
        let l = octant();
        assert_eq!(l.vertex(0), l.vertex(3));
        assert_eq!(l.vertex(2), l.vertex(5));
        for i in 0..l.num_edges() {
            let e = l.edge(i);
            assert_eq!(e.v0, l.vertex(i as usize));
            assert_eq!(e.v1, l.vertex(i as usize + 1));
        }
    }

    #[test]
    fn hole_and_sign() {
        let mut l = octant();
        assert!(!l.is_hole());
        assert_eq!(1, l.sign());
        l.set_depth(3);
        assert!(l.is_hole());
        assert_eq!(-1, l.sign());
        assert_eq!(l.oriented_vertex(0), l.vertex(l.num_vertices() - 1));
        l.set_depth(2);
        assert!(!l.is_hole());
        assert_eq!(l.oriented_vertex(0), l.vertex(0));
    }

    #[test]
    fn hemisphere_bounds() {
        let north = north_hemi();
        let b = north.rect_bound();
        assert!(b.lng.is_full());
        assert_f64_eq!(PI / 2.0, b.lat.hi);
        assert!(b.lat.lo <= 1e-14);
        assert!(north.contains_point(&Point::from_coords(0.0, 0.0, 1.0)));
        assert!(!north.contains_point(&Point::from_coords(0.0, 0.0, -1.0)));

        let south = south_hemi();
        let b = south.rect_bound();
        assert!(b.lng.is_full());
        assert_f64_eq!(-PI / 2.0, b.lat.lo);
        assert!(south.contains_point(&Point::from_coords(0.0, 0.0, -1.0)));
    }

    #[test]
    fn arctic_bounds_widen_to_pole() {
        let arctic = arctic_80();
        assert!(arctic.contains_point(&Point::from_coords(0.0, 0.0, 1.0)));
        let b = arctic.rect_bound();
        assert_f64_eq!(PI / 2.0, b.lat.hi);
        assert!(b.lng.is_full());

        let antarctic = antarctic_80();
        assert!(antarctic.contains_point(&Point::from_coords(0.0, 0.0, -1.0)));
        let b = antarctic.rect_bound();
        assert_f64_eq!(-PI / 2.0, b.lat.lo);
        assert!(b.lng.is_full());
    }

    #[test]
    fn subregion_bound_contains_bound() {
        for l in [north_hemi(), octant(), arctic_80(), loop_a(), loop_c()] {
            assert!(l.subregion_bound().contains(&l.rect_bound()));
        }
    }

    #[test]
    fn octant_area_and_turning_angle() {
        let l = octant();
        assert_f64_eq!(PI / 2.0, l.area(), 1e-13);
        // Three right-angle turns.
        assert_f64_eq!(3.0 * PI / 2.0, l.turning_angle(), 1e-13);
        assert!(l.is_normalized());

        let mut inv = l.clone();
        inv.invert();
        assert_f64_eq!(4.0 * PI - PI / 2.0, inv.area(), 1e-13);
        assert_f64_eq!(-3.0 * PI / 2.0, inv.turning_angle(), 1e-13);
        assert!(!inv.is_normalized());
    }

    #[test]
    fn hemisphere_area_and_turning_angle() {
        let l = north_hemi();
        assert_f64_eq!(2.0 * PI, l.area(), 1e-12);
        assert_f64_eq!(0.0, l.turning_angle(), 1e-13);
        assert!(l.is_normalized());
    }

    #[test]
    fn turning_angle_invariant_under_rotation() {
        let base = loop_from_degrees(&[(0.0, 0.0), (5.0, 10.0), (10.0, 0.0), (5.0, -10.0)]);
        let expected = base.turning_angle();
        let mut vertices = base.vertices().to_vec();
        for _ in 0..vertices.len() {
            vertices.rotate_left(1);
            let rotated = Loop::from_points(vertices.clone());
            assert_f64_eq!(expected, rotated.turning_angle(), 1e-14);
        }
    }

    #[test]
    fn area_of_inverse_sums_to_sphere() {
        for l in [octant(), loop_a(), arctic_80(), north_hemi()] {
            let mut inv = l.clone();
            inv.invert();
            assert_f64_eq!(4.0 * PI, l.area() + inv.area(), 1e-12);
            // Inverting twice restores the loop.
            inv.invert();
            assert!(l.equal(&inv));
        }
    }

    #[test]
    fn normalize_inverts_when_needed() {
        let mut l = octant();
        l.invert();
        assert!(!l.is_normalized());
        l.normalize();
        assert!(l.is_normalized());
        assert!(l.equal(&octant()));
    }

    #[test]
    fn is_normalized_flips_under_inversion() {
        for l in [octant(), loop_a(), arctic_80()] {
            let mut inv = l.clone();
            inv.invert();
            assert_ne!(l.is_normalized(), inv.is_normalized());
        }
    }

    #[test]
    fn centroid_of_symmetric_loop_points_at_center() {
        let l = Loop::make_regular(
            Point::from_coords(0.0, 0.0, 1.0),
            Angle::from(Deg(20.0)),
            64,
        );
        let c = l.centroid();
        assert!(c.0.z > 0.0);
        assert!(c.0.x.abs() < 1e-10 && c.0.y.abs() < 1e-10);
    }

    #[test]
    fn equatorial_square_area_and_containment() {
        // A roughly 1-degree square loop at the equator.
        let d = 1f64.to_radians();
        let l = make_loop(&[
            (1.0, 0.0, 0.0),
            (d.cos(), d.sin(), 0.0),
            (d.cos(), d.sin(), d.sin()),
            (1.0, 0.0, d.sin()),
        ]);
        let expected = d * d;
        assert!((l.area() / expected - 1.0).abs() < 1e-2, "area {}", l.area());
        let center = Point::from_coords(1.0, 0.5 * d.sin(), 0.5 * d.sin());
        assert!(l.contains_point(&center));
        assert!(!l.contains_point(&Point::from_coords(0.0, 0.0, 1.0)));
    }

    #[test]
    fn brute_force_and_indexed_containment_agree() {
        // Large enough to use the index once built.
        let l = Loop::make_regular(
            Point::from_coords(1.0, 0.5, 0.5),
            Angle::from(Deg(10.0)),
            256,
        );
        let inside = Point::from_coords(1.0, 0.5, 0.5);
        let outside = Point::from_coords(-1.0, 0.0, 0.0);
        let near_boundary = Point::from_coords(1.0, 0.62, 0.5);
        // Query repeatedly so the unindexed-calls threshold is crossed and
        // the index comes into play.
        for _ in 0..50 {
            assert_eq!(
                l.brute_force_contains_point(&inside),
                l.contains_point(&inside)
            );
            assert_eq!(
                l.brute_force_contains_point(&outside),
                l.contains_point(&outside)
            );
            assert_eq!(
                l.brute_force_contains_point(&near_boundary),
                l.contains_point(&near_boundary)
            );
        }
    }

    #[test]
    fn random_points_brute_matches_indexed() {
        use rand::{Rng, SeedableRng};
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let l = Loop::make_regular(
            Point::from_coords(0.4, -0.6, 0.7),
            Angle::from(Deg(25.0)),
            200,
        );
        // Force the index to exist so the indexed path is taken below.
        let _ = l.find_validation_error();
        for _ in 0..200 {
            let p = Point::from_coords(
                rng.gen::<f64>() - 0.5,
                rng.gen::<f64>() - 0.5,
                rng.gen::<f64>() - 0.5,
            );
            assert_eq!(
                l.brute_force_contains_point(&p),
                l.contains_point(&p),
                "disagreement at {:?}",
                p
            );
        }
    }

    #[test]
    fn boundary_vertex_containment_is_one_sided() {
        // Every point is contained by exactly one of the loops subdividing
        // the sphere; spot-check with a loop and its complement.
        let l = loop_a();
        let mut inv = l.clone();
        inv.invert();
        for i in 0..l.num_vertices() {
            let v = l.vertex(i);
            assert_ne!(l.contains_point(&v), inv.contains_point(&v));
        }
    }

    #[test]
    fn relations_nested_and_disjoint() {
        let a = loop_a();
        let c = loop_c();
        let d = loop_d();
        let e = loop_e();

        assert!(c.contains(&a));
        assert!(c.intersects(&a));
        assert!(!a.contains(&c));

        // d shares a vertex with a.
        assert!(a.contains(&d));
        assert!(a.intersects(&d));
        assert!(!d.contains(&a));

        // e is on the other side of the sphere.
        assert!(!a.contains(&e));
        assert!(!a.intersects(&e));
        assert_eq!(-1, a.compare_boundary(&e));
    }

    #[test]
    fn relations_crossing_loops() {
        let a = loop_a();
        let b = loop_b();
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.contains(&b));
        assert!(!b.contains(&a));
        assert_eq!(0, a.compare_boundary(&b));
        assert_eq!(0, b.compare_boundary(&a));
    }

    #[test]
    fn relations_identical_loops() {
        let l = loop_a();
        let m = loop_a();
        assert!(l.contains(&m));
        assert!(l.intersects(&m));
        assert_eq!(1, l.compare_boundary(&m));
        assert!(l.boundary_equal(&m));
        assert!(l.equal(&m));
    }

    #[test]
    fn relations_with_empty_and_full() {
        let full = Loop::full();
        let empty = Loop::empty();
        let a = loop_a();

        assert!(full.contains(&a));
        assert!(full.contains(&empty));
        assert!(full.contains(&full));
        assert!(!empty.contains(&a));
        assert!(empty.contains(&empty));
        assert!(a.contains(&empty));
        assert!(!a.contains(&full));

        assert!(full.intersects(&a));
        assert!(!empty.intersects(&a));
        assert!(!empty.intersects(&empty));
    }

    #[test]
    fn loop_and_complement_relations() {
        let l = loop_a();
        let mut inv = l.clone();
        inv.invert();
        assert!(!l.contains(&inv));
        // Every point is contained by exactly one of a loop and its
        // complement, so the two regions are disjoint even though they
        // share a boundary.
        assert!(!l.intersects(&inv));
        // Their boundaries coincide with opposite directions, so A excludes
        // the boundary of its complement (the semiwedges point outward).
        assert_eq!(-1, l.compare_boundary(&inv));
    }

    #[test]
    fn contains_implies_intersects() {
        let cases = [
            (loop_c(), loop_a()),
            (loop_a(), loop_d()),
            (loop_c(), loop_d()),
        ];
        for (outer, inner) in cases {
            assert!(outer.contains(&inner));
            assert!(outer.intersects(&inner));
        }
    }

    #[test]
    fn contains_nested_variants() {
        let a = loop_a();
        let c = loop_c();
        let d = loop_d();
        assert!(c.contains_nested(&a));
        assert!(a.contains_nested(&d));
        assert!(!d.contains_nested(&a));
        assert!(Loop::full().contains_nested(&a));
        assert!(a.contains_nested(&Loop::empty()));
    }

    #[test]
    fn contains_non_crossing_boundary_variants() {
        let a = loop_a();
        let c = loop_c();
        let e = loop_e();
        assert!(c.contains_non_crossing_boundary(&a, false));
        assert!(!a.contains_non_crossing_boundary(&c, false));
        assert!(!a.contains_non_crossing_boundary(&e, false));
        assert!(Loop::full().contains_non_crossing_boundary(&a, false));
    }

    #[test]
    fn compare_boundary_nested() {
        let a = loop_a();
        let c = loop_c();
        assert_eq!(1, c.compare_boundary(&a));
        assert_eq!(-1, a.compare_boundary(&c));
    }

    #[test]
    fn boundary_equal_is_rotation_invariant() {
        let l = loop_a();
        let mut vertices = l.vertices().to_vec();
        vertices.rotate_left(2);
        let rotated = Loop::from_points(vertices);
        assert!(l.boundary_equal(&rotated));
        assert!(rotated.boundary_equal(&l));
        assert!(!l.equal(&rotated));
        assert!(!l.boundary_equal(&loop_b()));
        assert!(!Loop::empty().boundary_equal(&Loop::full()));
    }

    #[test]
    fn boundary_approx_equal_tolerates_perturbation() {
        let l = loop_a();
        let perturbed: Vec<Point> = l
            .vertices()
            .iter()
            .map(|p| Point::from_coords(p.0.x + 1e-13, p.0.y - 1e-13, p.0.z))
            .collect();
        let m = Loop::from_points(perturbed);
        assert!(l.boundary_approx_equal(&m, 1e-10));
        assert!(!l.boundary_approx_equal(&m, 1e-16));
        assert!(!l.boundary_equal(&m));
    }

    #[test]
    fn boundary_near_handles_different_vertex_counts() {
        let l = loop_a();
        // Insert the midpoint of edge 0 as an extra vertex.
        let mut vertices = l.vertices().to_vec();
        let mid = Point((vertices[0].0 + vertices[1].0).normalize());
        vertices.insert(1, mid);
        let m = Loop::from_points(vertices);
        assert_ne!(l.num_vertices(), m.num_vertices());
        assert!(l.boundary_near(&m, 1e-10));
        assert!(m.boundary_near(&l, 1e-10));
        assert!(!l.boundary_near(&loop_b(), 1e-3));
        assert!(Loop::empty().boundary_near(&Loop::empty(), 1e-3));
        assert!(!Loop::empty().boundary_near(&Loop::full(), 1e-3));
    }

    #[test]
    fn find_vertex_uses_index_for_large_loops() {
        let l = Loop::make_regular(
            Point::from_coords(0.3, 0.8, 0.5),
            Angle::from(Deg(5.0)),
            16,
        );
        assert_eq!(Some(5), l.find_vertex(&l.vertex(5)));
        assert_eq!(Some(l.num_vertices()), l.find_vertex(&l.vertex(0)));
        assert_eq!(None, l.find_vertex(&Point::from_coords(1.0, 0.0, 0.0)));
    }

    #[test]
    fn validation_rejects_bad_loops() {
        // Too few vertices.
        let l = loop_from_degrees(&[(0.0, 0.0), (0.0, 10.0)]);
        assert_eq!(Err(Error::NotEnoughVertices), l.find_validation_error());
        assert!(!l.is_valid());

        // Adjacent duplicate vertices.
        let p = Point::from_coords(1.0, 0.0, 0.0);
        let q = Point::from_coords(0.0, 1.0, 0.0);
        let r = Point::from_coords(0.0, 0.0, 1.0);
        let dup = Loop::from_points(vec![p, p, q, r]);
        assert_eq!(Err(Error::DuplicateVertices(0)), dup.find_validation_error());

        // Non-unit-length vertex.
        let bad = Loop::from_points(vec![Point(Vector::new(2.0, 0.0, 0.0)), q, r]);
        assert_eq!(Err(Error::NotUnitLength(0)), bad.find_validation_error());
    }

    #[test]
    fn validation_rejects_self_intersection() {
        // A bowtie: edges 0 and 2 cross near (0, 0).
        let l = loop_from_degrees(&[(-5.0, -5.0), (5.0, 5.0), (-5.0, 5.0), (5.0, -5.0)]);
        match l.find_validation_error() {
            Err(Error::SelfIntersection(_, _)) => {}
            other => panic!("expected self intersection, got {:?}", other),
        }
        assert!(!l.is_valid());

        // All the well-formed test loops pass.
        for l in [octant(), north_hemi(), loop_a(), loop_c(), arctic_80()] {
            assert!(l.find_validation_error().is_ok());
        }
    }

    #[test]
    fn cell_ops_on_cell_loop() {
        let cell_id = CellId::from_face(0).child_begin_at_level(2);
        let cell = Cell::from(cell_id);
        let l = Loop::from_cell(&cell);
        assert_eq!(4, l.num_vertices());
        assert!(l.contains_point(&cell.center()));

        // Every subcell may intersect the loop built from the parent cell.
        for child_id in cell_id.children() {
            assert!(l.may_intersect_cell(&Cell::from(child_id)));
        }

        // A small cell deep inside is fully contained; a cell on the far
        // side of the sphere is not.
        let inner = Cell::from(CellId::from_point(&cell.center()).parent(6));
        assert!(l.contains_cell(&inner));
        assert!(l.may_intersect_cell(&inner));
        let far = Cell::from(CellId::from_point(&Point::from_coords(-1.0, 0.0, 0.0)).parent(6));
        assert!(!l.contains_cell(&far));
        assert!(!l.may_intersect_cell(&far));
    }

    #[test]
    fn cap_bound_contains_loop_points() {
        let l = loop_a();
        let cap = l.cap_bound();
        for i in 0..l.num_vertices() {
            assert!(cap.contains_point(&l.vertex(i)));
        }
    }

    #[test]
    fn distance_and_projection() {
        let l = octant();
        let inside = Point::from_coords(1.0, 1.0, 1.0);
        let outside = Point::from_coords(-1.0, -1.0, -1.0);
        assert_f64_eq!(0.0, l.distance(&inside).rad());
        assert_eq!(inside, l.project(&inside));
        assert!(l.distance(&outside).rad() > 0.0);

        // The boundary projection of any point lies on the boundary.
        let proj = l.project_to_boundary(&inside);
        assert!(l.distance_to_boundary(&proj).rad() < 1e-12);
        assert!(l.distance_to_boundary(&inside).rad() > 0.0);
    }

    #[test]
    fn lossless_encode_decode_roundtrip() {
        for l in [octant(), loop_a(), arctic_80(), Loop::empty(), Loop::full()] {
            let mut e = Encoder::new();
            l.encode(&mut e);
            let bytes = e.into_bytes();
            let mut d = Decoder::new(&bytes);
            let got = Loop::decode(&mut d).unwrap();
            assert!(l.equal(&got));
            assert_eq!(l.contains_origin(), got.contains_origin());
            assert_eq!(l.depth(), got.depth());
            assert_eq!(l.rect_bound(), got.rect_bound());
            assert!(got.owns_vertices());
        }
    }

    #[test]
    fn decode_rejects_malformed_buffers() {
        let mut e = Encoder::new();
        octant().encode(&mut e);
        let bytes = e.into_bytes();

        // Unknown version.
        let mut bad = bytes.clone();
        bad[0] = 99;
        assert!(Loop::decode(&mut Decoder::new(&bad)).is_err());

        // Truncated buffer.
        assert!(Loop::decode(&mut Decoder::new(&bytes[..10])).is_err());

        // Vertex count over the limit.
        let mut huge = Encoder::new();
        huge.put8(1);
        huge.put32(u32::MAX);
        let huge = huge.into_bytes();
        assert!(Loop::decode(&mut Decoder::new(&huge)).is_err());
    }

    #[test]
    fn decode_accepts_zero_vertices() {
        // An uninitialized loop: version, N = 0, origin byte, depth, bound.
        let mut e = Encoder::new();
        e.put8(1);
        e.put32(0);
        e.put8(0);
        e.put32(0);
        Rect::empty().encode(&mut e);
        let bytes = e.into_bytes();
        let l = Loop::decode(&mut Decoder::new(&bytes)).unwrap();
        assert_eq!(0, l.num_vertices());
        // The loop stays unindexed and is reported invalid.
        assert_eq!(Err(Error::NotEnoughVertices), l.find_validation_error_no_index());
        // Re-encoding reproduces the input bytes.
        let mut e2 = Encoder::new();
        l.encode(&mut e2);
        assert_eq!(bytes, e2.into_bytes());
    }

    #[test]
    fn decode_within_scope_borrows_aligned_vertices() {
        let l = Loop::make_regular(
            Point::from_coords(0.2, 0.5, -0.8),
            Angle::from(Deg(3.0)),
            1000,
        );
        let mut e = Encoder::new();
        l.encode(&mut e);
        let encoded = e.into_bytes();

        // Copy the encoded bytes into an 8-byte-aligned backing store with
        // a 3-byte offset so the vertex array (which starts 5 bytes into
        // the encoding) lands on an 8-byte boundary.
        let mut backing = vec![0u64; encoded.len() / 8 + 2];
        let buf: &mut [u8] = unsafe {
            std::slice::from_raw_parts_mut(backing.as_mut_ptr() as *mut u8, backing.len() * 8)
        };
        buf[3..3 + encoded.len()].copy_from_slice(&encoded);
        let window = &buf[3..3 + encoded.len()];

        let mut d = Decoder::new(window);
        let got = Loop::decode_within_scope(&mut d).unwrap();
        assert!(!got.owns_vertices());
        assert_eq!(l.vertices(), got.vertices());
        assert!(got.find_validation_error().is_ok());
        assert!(l.equal(&got));

        // A buffer whose vertex bytes are not aligned silently falls back
        // to copying; the decoded loop is the same either way.
        let shifted = encoded.clone();
        let mut d2 = Decoder::new(&shifted[..]);
        let got2 = Loop::decode_within_scope(&mut d2).unwrap();
        assert!(l.equal(&got2));
    }

    #[test]
    fn compressed_roundtrip_snapped() {
        let level = 20;
        let raw = Loop::make_regular(
            Point::from_coords(0.1, -0.7, 0.7),
            Angle::from(Deg(1.0)),
            20,
        );
        let snapped: Vec<Point> = raw
            .vertices()
            .iter()
            .map(|p| CellId::from_point(p).parent(level).point())
            .collect();
        let mut l = Loop::from_points(snapped);
        l.set_depth(3);

        let mut e = Encoder::new();
        let cell_vertices = l.get_xyz_face_si_ti_vertices();
        l.encode_compressed(&mut e, &cell_vertices, level);
        let bytes = e.into_bytes();

        let got = Loop::decode_compressed(&mut Decoder::new(&bytes), level).unwrap();
        assert_eq!(l.vertices(), got.vertices());
        assert_eq!(l.contains_origin(), got.contains_origin());
        assert_eq!(l.depth(), got.depth());
    }

    #[test]
    fn compressed_roundtrip_unsnapped_and_bound() {
        // 100 vertices (>= the bound-encoding threshold), none snapped.
        let l = Loop::make_regular(
            Point::from_coords(-0.2, 0.9, 0.4),
            Angle::from(Deg(4.0)),
            100,
        );
        let mut e = Encoder::new();
        let cell_vertices = l.get_xyz_face_si_ti_vertices();
        l.encode_compressed(&mut e, &cell_vertices, 16);
        let bytes = e.into_bytes();

        let got = Loop::decode_compressed(&mut Decoder::new(&bytes), 16).unwrap();
        // Unsnapped points travel through the exception block unchanged.
        assert_eq!(l.vertices(), got.vertices());
        assert_eq!(l.rect_bound(), got.rect_bound());
    }

    #[test]
    fn compressed_decode_rejects_zero_vertices() {
        let mut e = Encoder::new();
        e.put_varint32(0);
        let bytes = e.into_bytes();
        assert!(Loop::decode_compressed(&mut Decoder::new(&bytes), 10).is_err());
    }

    #[test]
    fn regular_loop_shape() {
        let center = Point::from_coords(0.0, 0.0, 1.0);
        let radius = Angle::from(Deg(10.0));
        for &n in &[3usize, 4, 7, 64] {
            let l = Loop::make_regular(center, radius, n);
            assert_eq!(n, l.num_vertices());
            for i in 0..n {
                assert_f64_eq!(radius.rad(), center.distance(&l.vertex(i)).rad(), 1e-13);
            }
            assert!(l.contains_point(&center));
            assert!(l.find_validation_error().is_ok());
        }
    }

    #[test]
    fn clone_produces_owned_equal_loop() {
        let l = loop_a();
        let c = l.clone();
        assert!(c.owns_vertices());
        assert!(l.equal(&c));
        assert_eq!(l.rect_bound(), c.rect_bound());
        assert_eq!(l.contains_origin(), c.contains_origin());
    }

    #[test]
    fn concurrent_contains_is_consistent() {
        // A loop big enough that the index build threshold matters.
        let l = Arc::new(Loop::make_regular(
            Point::from_coords(0.9, 0.2, 0.4),
            Angle::from(Deg(8.0)),
            128,
        ));
        let inside = Point::from_coords(0.9, 0.2, 0.4);
        let outside = Point::from_coords(-0.9, -0.2, -0.4);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let l = Arc::clone(&l);
            handles.push(std::thread::spawn(move || {
                for _ in 0..30 {
                    assert!(l.contains_point(&inside));
                    assert!(!l.contains_point(&outside));
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        // After the dust settles the index is fresh and gives the same
        // answers.
        assert!(l.contains_point(&inside));
        assert!(!l.contains_point(&outside));
    }

    #[test]
    fn large_loop_relations_use_index_paths() {
        // Loops with hundreds of edges exercise the synchronized index
        // traversal and the edge-query acceleration threshold.
        let center_a = Point::from_coords(1.0, 0.1, 0.1);
        let center_b = Point::from_coords(1.0, 0.12, 0.1);
        let big = Loop::make_regular(center_a, Angle::from(Deg(10.0)), 300);
        let small = Loop::make_regular(center_a, Angle::from(Deg(2.0)), 250);
        let crossing = Loop::make_regular(center_b, Angle::from(Deg(10.0)), 300);

        assert!(big.contains(&small));
        assert!(big.intersects(&small));
        assert!(!small.contains(&big));
        assert_eq!(1, big.compare_boundary(&small));

        assert!(big.intersects(&crossing));
        assert!(!big.contains(&crossing));
        assert_eq!(0, big.compare_boundary(&crossing));

        let far = Loop::make_regular(
            Point::from_coords(-1.0, 0.0, 0.0),
            Angle::from(Deg(10.0)),
            300,
        );
        assert!(!big.intersects(&far));
        assert_eq!(-1, big.compare_boundary(&far));
    }
}
