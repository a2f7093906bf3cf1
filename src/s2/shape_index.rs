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

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use crate::r1;
use crate::r2;
use crate::s2::cellid::CellId;
use crate::s2::edge_clipping::{
    clip_to_padded_face, interpolate_f64, EDGE_CLIP_ERROR_UV_COORD, FACE_CLIP_ERROR_UV_COORD,
};
use crate::s2::edge_crosser::EdgeCrosser;
use crate::s2::metric::AVG_EDGE_METRIC;
use crate::s2::padded_cell::PaddedCell;
use crate::s2::point::Point;
use crate::s2::shape::{Edge, Shape};
use crate::s2::stuv::{face, valid_face_xyz_to_uv};

/// The total error when clipping an edge, which comes from two sources:
/// (1) clipping the original spherical edge to a cube face (the face edge),
/// with a maximum error of FACE_CLIP_ERROR_UV_COORD, and (2) clipping the
/// face edge to the u- or v-coordinate of a cell boundary, with a maximum
/// error of EDGE_CLIP_ERROR_UV_COORD. We also encounter the same errors when
/// clipping query edges, so the total error is doubled so that edges only
/// need to be padded during indexing and not at query time.
pub const CELL_PADDING: f64 = 2.0 * (FACE_CLIP_ERROR_UV_COORD + EDGE_CLIP_ERROR_UV_COORD);

/// The cell size relative to the length of an edge at which it is first
/// considered to be "long". Long edges do not contribute toward the decision
/// to subdivide a cell further: such edges typically need to be propagated
/// to several children, which increases time and memory costs without much
/// benefit, and in pathological cases many long edges close together could
/// force subdivision to continue all the way to the leaf cell level.
pub const CELL_SIZE_TO_LONG_EDGE_RATIO: f64 = 1.0;

// The default maximum number of (short) edges per index cell.
const MAX_EDGES_PER_CELL: usize = 10;

// Index status values, stored in the atomic status word.
const STALE: u8 = 0; // There are pending updates.
const FRESH: u8 = 1; // The snapshot matches the registered shape.

/// CellRelation describes the possible relationships between a target cell
/// and the cells of the index. If the target is an index cell or is
/// contained by an index cell, it is Indexed. If the target is subdivided
/// into one or more index cells, it is Subdivided. Otherwise it is Disjoint.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CellRelation {
    Indexed,
    Subdivided,
    Disjoint,
}

/// IndexCell stores the index contents for a particular CellId: the ids of
/// the shape edges that intersect that cell, in increasing order, and
/// whether the center of the cell is inside the shape.
///
/// Note that the edges themselves are not clipped; the index always stores
/// original edge ids so that query results are exact.
#[derive(Debug, Clone, Default)]
pub struct IndexCell {
    /// Whether the center of the CellId is inside the shape.
    pub contains_center: bool,
    /// The ordered set of original edge ids that intersect the cell.
    pub edges: Vec<i32>,
}

impl IndexCell {
    /// The number of edges that intersect this cell.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }
}

/// IndexSnapshot is the immutable result of building the index for a shape:
/// a set of non-overlapping cells covering the shape, ordered by CellId.
/// Snapshots are shared behind an Arc so that concurrent readers can keep
/// iterating even if the owning index is reset.
#[derive(Debug, Default)]
pub struct IndexSnapshot {
    ids: Vec<CellId>,
    cells: Vec<IndexCell>,
}

impl IndexSnapshot {
    /// The number of cells in the snapshot.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Reports whether the snapshot contains no cells.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns an iterator positioned at the first cell.
    pub fn iter(&self) -> ShapeIndexIterator<'_> {
        ShapeIndexIterator { snap: self, pos: 0 }
    }
}

/// ShapeIndexIterator provides low-level access to the cells of a snapshot.
/// Cells are returned in increasing order of CellId.
#[derive(Debug, Clone)]
pub struct ShapeIndexIterator<'a> {
    snap: &'a IndexSnapshot,
    pos: usize,
}

impl<'a> ShapeIndexIterator<'a> {
    /// Returns the CellId of the current index cell. If done is true, a
    /// value larger than any valid CellId is returned.
    pub fn cell_id(&self) -> CellId {
        if self.pos < self.snap.ids.len() {
            self.snap.ids[self.pos]
        } else {
            CellId::sentinel()
        }
    }

    /// Returns the current index cell.
    pub fn cell(&self) -> Option<&'a IndexCell> {
        self.snap.cells.get(self.pos)
    }

    /// Returns the point at the center of the current index cell.
    pub fn center(&self) -> Point {
        self.cell_id().point()
    }

    /// Positions the iterator at the first cell.
    pub fn begin(&mut self) {
        self.pos = 0;
    }

    /// Reports whether the iterator is past the last index cell.
    pub fn done(&self) -> bool {
        self.pos >= self.snap.ids.len()
    }

    /// Positions the iterator at the next index cell.
    pub fn next(&mut self) {
        self.pos += 1;
    }

    /// Advances the iterator to the previous cell and returns true, or
    /// does nothing and returns false if it is already at the first cell.
    pub fn prev(&mut self) -> bool {
        if self.pos == 0 {
            return false;
        }
        self.pos -= 1;
        true
    }

    /// Positions the iterator at the first cell with cell_id() >= target,
    /// or at the end of the index if no such cell exists.
    pub fn seek(&mut self, target: CellId) {
        self.pos = self
            .snap
            .ids
            .binary_search(&target)
            .unwrap_or_else(|pos| pos);
    }

    /// Positions the iterator at the cell containing the given point, and
    /// returns true. If no such cell exists, returns false and the iterator
    /// position is unspecified.
    pub fn locate_point(&mut self, p: &Point) -> bool {
        // Let I = the first cell with id >= T, where T is the leaf cell
        // containing p. Then if T is contained by an index cell, the
        // containing cell is either I or I'. We test for containment by
        // comparing the ranges of leaf cells spanned by T, I, and I'.
        let target = CellId::from_point(p);
        self.seek(target);
        if !self.done() && self.cell_id().range_min() <= target {
            return true;
        }
        if self.prev() && self.cell_id().range_max() >= target {
            return true;
        }
        false
    }

    /// Attempts to position the iterator at the first matching index cell
    /// in the index that has some relation to the given CellId, and returns
    /// the relation found.
    pub fn locate_cell_id(&mut self, target: CellId) -> CellRelation {
        // Let T be the target and I = the first cell with id >=
        // T.range_min(), and let I' be the predecessor of I. If T contains
        // any index cells, then T contains I. Similarly, if T is contained
        // by an index cell, then the containing cell is either I or I'. We
        // test for containment by comparing the ranges of leaf cells spanned
        // by T, I, and I'.
        self.seek(target.range_min());
        if !self.done() {
            if self.cell_id() >= target && self.cell_id().range_min() <= target {
                return CellRelation::Indexed;
            }
            if self.cell_id() <= target.range_max() {
                return CellRelation::Subdivided;
            }
        }
        if self.prev() && self.cell_id().range_max() >= target {
            return CellRelation::Indexed;
        }
        CellRelation::Disjoint
    }
}

/// ShapeIndex is a lazily-built spatial index over the edges of a single
/// shape. It supports fast point containment, edge crossing, and cell
/// relation queries.
///
/// The index itself never stores the shape; every entry point that may need
/// to build the index takes the shape as an argument. This keeps the owning
/// object free of self-references and means that zero-copy (borrowed) shapes
/// pay the vertex-copy cost only if the index is actually built.
///
/// Updates are applied on first use. For concurrent callers the contract is:
/// at most one thread builds the index (the one holding the internal lock);
/// with `try_snapshot`, losing threads observe a not-fresh index and are
/// expected to fall back to brute-force query paths until the build
/// completes.
#[derive(Debug)]
pub struct ShapeIndex {
    // The current status of the index, accessed atomically.
    status: AtomicU8,
    // Whether a shape has been registered with the index.
    registered: AtomicBool,
    // The current snapshot, guarded for the single-builder discipline.
    snap: Mutex<Arc<IndexSnapshot>>,
}

impl Default for ShapeIndex {
    fn default() -> Self {
        ShapeIndex::new()
    }
}

impl ShapeIndex {
    pub fn new() -> ShapeIndex {
        ShapeIndex {
            status: AtomicU8::new(FRESH),
            registered: AtomicBool::new(false),
            snap: Mutex::new(Arc::new(IndexSnapshot::default())),
        }
    }

    /// Registers the shape's edges with the index. The actual build is
    /// deferred until the first query.
    pub fn add(&self) {
        self.registered.store(true, Ordering::Release);
        self.status.store(STALE, Ordering::Release);
    }

    /// Resets the index to its original empty state.
    pub fn reset(&self) {
        let mut guard = self.snap.lock().unwrap();
        *guard = Arc::new(IndexSnapshot::default());
        self.registered.store(false, Ordering::Release);
        self.status.store(FRESH, Ordering::Release);
    }

    /// Reports whether there are no pending updates that need to be applied.
    /// This can be useful to avoid building the index unnecessarily, or for
    /// choosing between two different algorithms depending on whether the
    /// index is available.
    pub fn is_fresh(&self) -> bool {
        self.status.load(Ordering::Acquire) == FRESH
    }

    /// Reports whether a shape has been registered.
    pub fn has_shape(&self) -> bool {
        self.registered.load(Ordering::Acquire)
    }

    /// Returns the current snapshot, building it from the given shape first
    /// if there are pending updates. Blocks while another thread builds.
    pub fn snapshot(&self, shape: &dyn Shape) -> Arc<IndexSnapshot> {
        if self.is_fresh() {
            return self.snap.lock().unwrap().clone();
        }
        let mut guard = self.snap.lock().unwrap();
        if !self.is_fresh() {
            *guard = Arc::new(build_index(shape));
            self.status.store(FRESH, Ordering::Release);
        }
        guard.clone()
    }

    /// Like snapshot, but never blocks: if another thread is currently
    /// building the index, returns None and the caller should fall back to
    /// a brute-force code path.
    pub fn try_snapshot(&self, shape: &dyn Shape) -> Option<Arc<IndexSnapshot>> {
        if self.is_fresh() {
            return Some(self.snap.lock().unwrap().clone());
        }
        match self.snap.try_lock() {
            Ok(mut guard) => {
                if !self.is_fresh() {
                    *guard = Arc::new(build_index(shape));
                    self.status.store(FRESH, Ordering::Release);
                }
                Some(guard.clone())
            }
            Err(_) => None,
        }
    }
}

// faceEdge stores an edge of the shape projected onto a single face.
#[derive(Debug, Clone)]
struct FaceEdge {
    edge_id: i32,    // The edge id within the shape.
    max_level: i32,  // Not desirable to subdivide this edge beyond this level.
    a: r2::Point,    // The edge endpoints, clipped to a given face.
    b: r2::Point,
    edge: Edge,      // The original edge.
}

// clippedEdge represents the portion of a face edge that has been clipped
// to a given cell, as a bound in (u,v)-space. The edge itself is referenced
// by index into the per-face edge list.
#[derive(Debug, Copy, Clone)]
struct ClippedEdge {
    fe: usize,
    bound: r2::Rect,
}

// tracker keeps track of whether the shape interior contains the current
// focus point. It provides an efficient way to move the focus from one point
// to another and incrementally update the containment state. We use this to
// compute which cell centers are inside the shape, by advancing the focus
// from one cell center to the next in Hilbert curve order.
//
// Initially the focus is at the start of the CellId space-filling curve. We
// then visit each cell of the new index in curve order. For each cell we
// draw two edges: one from the entry vertex to the center, and another from
// the center to the exit vertex. By counting edge crossings we incrementally
// compute whether the shape contains the cell center. Note that the shape
// always relates identically to the exit point of one cell and the entry
// point of the next cell in the index: either these two points are the same,
// or the intervening cells in curve order are all empty of edges.
#[derive(Debug)]
struct Tracker {
    is_active: bool,
    inside: bool,
    b: Point,
    next_cell_id: CellId,
    crosser: Option<EdgeCrosser>,
}

impl Tracker {
    fn new() -> Tracker {
        Tracker {
            is_active: false,
            inside: false,
            b: tracker_origin(),
            next_cell_id: CellId::from_face(0).child_begin_at_level(crate::s2::cellid::MAX_LEVEL),
            crosser: None,
        }
    }

    // Starts tracking the interior of the given shape.
    fn add_shape(&mut self, shape: &dyn Shape) {
        self.is_active = shape.has_interior();
        if self.is_active {
            self.inside = contains_brute_force(shape, &self.b);
        }
    }

    // Moves the focus to the given point. This method should only be used
    // when it is known that there are no edge crossings between the old and
    // new focus locations.
    fn move_to(&mut self, b: Point) {
        self.b = b;
    }

    // Moves the focus to the given point. After this method is called,
    // test_edge must be called with all edges that may cross the line
    // segment between the old and new focus locations.
    fn draw_to(&mut self, b: Point) {
        let a = self.b;
        self.b = b;
        self.crosser = Some(EdgeCrosser::new(&a, &b));
    }

    // Checks whether the given edge crosses the current focus segment, and
    // if so toggles the inside state.
    fn test_edge(&mut self, edge: &Edge) {
        if let Some(crosser) = self.crosser.as_mut() {
            if crosser.edge_or_vertex_crossing(&edge.v0, &edge.v1) {
                self.inside = !self.inside;
            }
        }
    }

    // Indicates that the last argument to move_to or draw_to was the entry
    // vertex of the given CellId, i.e. the tracker is positioned at the
    // start of this cell.
    fn set_next_cell_id(&mut self, next: CellId) {
        self.next_cell_id = next.range_min();
    }

    // Reports whether the focus is already at the entry vertex of the given
    // CellId (provided that the caller calls set_next_cell_id as each cell
    // is processed).
    fn at_cell_id(&self, id: CellId) -> bool {
        id.range_min() == self.next_cell_id
    }
}

// The start of the CellId space-filling curve.
fn tracker_origin() -> Point {
    Point(crate::s2::stuv::face_uv_to_xyz(0, -1.0, -1.0).normalize())
}

/// Reports whether the given shape contains the given point, by counting
/// crossings of the segment from the shape's reference point. This does not
/// use an index and is intended for points that are queried only once.
pub fn contains_brute_force(shape: &dyn Shape, point: &Point) -> bool {
    if !shape.has_interior() {
        return false;
    }
    let reference = shape.reference_point();
    if reference.point == *point {
        return reference.contained;
    }
    let mut crosser = EdgeCrosser::new(&reference.point, point);
    let mut inside = reference.contained;
    for e in 0..shape.num_edges() {
        let edge = shape.edge(e);
        inside = inside != crosser.edge_or_vertex_crossing(&edge.v0, &edge.v1);
    }
    inside
}

// Returns the first level for which the given edge is considered "long",
// i.e. it is not desirable to subdivide it further.
fn max_level_for_edge(edge: &Edge) -> i32 {
    let cell_size = (edge.v0.0 - edge.v1.0).norm() * CELL_SIZE_TO_LONG_EDGE_RATIO;
    AVG_EDGE_METRIC.min_level(cell_size)
}

// Builder state shared across the recursive subdivision of one face.
struct FaceBuilder<'a> {
    face_edges: &'a [FaceEdge],
    out: Vec<(CellId, IndexCell)>,
}

/// Builds the index cells for the given shape.
fn build_index(shape: &dyn Shape) -> IndexSnapshot {
    log::debug!("building spatial index for {} edges", shape.num_edges());

    let mut tracker = Tracker::new();
    tracker.add_shape(shape);

    // Clip each edge of the shape to the six cube faces.
    let mut all_edges: [Vec<FaceEdge>; 6] = Default::default();
    for e in 0..shape.num_edges() {
        let edge = shape.edge(e);
        add_face_edge(e, edge, &mut all_edges);
    }

    let mut ids = Vec::new();
    let mut cells = Vec::new();
    for f in 0u8..6 {
        let face_edges = &all_edges[f as usize];
        if face_edges.is_empty() && !tracker.inside {
            continue;
        }
        let clipped: Vec<ClippedEdge> = face_edges
            .iter()
            .enumerate()
            .map(|(i, fe)| ClippedEdge {
                fe: i,
                bound: r2::Rect::from_points(&[fe.a, fe.b]),
            })
            .collect();
        let mut builder = FaceBuilder {
            face_edges,
            out: Vec::new(),
        };
        let pcell = PaddedCell::from_cell_id(CellId::from_face(f), CELL_PADDING);
        update_edges(&mut builder, &pcell, &clipped, &mut tracker);
        for (id, cell) in builder.out {
            ids.push(id);
            cells.push(cell);
        }
    }
    IndexSnapshot { ids, cells }
}

// Adds the given edge to the set of per-face edges, clipping it to each
// cube face it intersects.
fn add_face_edge(edge_id: i32, edge: Edge, all_edges: &mut [Vec<FaceEdge>; 6]) {
    let max_level = max_level_for_edge(&edge);

    // Fast path: both endpoints are on the same face, and are far enough
    // from the edge of the face that they don't intersect any (padded)
    // adjacent face.
    let a_face = face(&edge.v0.0);
    if a_face == face(&edge.v1.0) {
        let (ax, ay) = valid_face_xyz_to_uv(a_face, &edge.v0.0);
        let (bx, by) = valid_face_xyz_to_uv(a_face, &edge.v1.0);
        let max_uv = 1.0 - CELL_PADDING;
        if ax.abs() <= max_uv && ay.abs() <= max_uv && bx.abs() <= max_uv && by.abs() <= max_uv {
            all_edges[a_face as usize].push(FaceEdge {
                edge_id,
                max_level,
                a: r2::Point::new(ax, ay),
                b: r2::Point::new(bx, by),
                edge,
            });
            return;
        }
    }

    // Otherwise, we simply clip the edge to all six faces.
    for f in 0u8..6 {
        if let Some((a_clip, b_clip)) = clip_to_padded_face(&edge.v0, &edge.v1, f, CELL_PADDING) {
            all_edges[f as usize].push(FaceEdge {
                edge_id,
                max_level,
                a: a_clip,
                b: b_clip,
                edge,
            });
        }
    }
}

// Adds an index cell for the given padded cell if permitted, or subdivides
// into the four children, distributing the clipped edges among them.
fn update_edges(
    builder: &mut FaceBuilder<'_>,
    pcell: &PaddedCell,
    edges: &[ClippedEdge],
    tracker: &mut Tracker,
) {
    if make_index_cell(builder, pcell, edges, tracker) {
        return;
    }

    // Reserve space for the edges that will be passed to each child. We
    // clip each edge against the "middle" of the cell: everything below or
    // left goes to the low children, everything above or right to the high
    // children, and edges spanning the middle are clipped into both.
    let mut child_edges: [[Vec<ClippedEdge>; 2]; 2] = Default::default();
    let middle = pcell.middle();
    for &edge in edges {
        if edge.bound.x.hi <= middle.x.lo {
            // This edge is entirely in the two left children.
            clip_v_axis(builder, edge, &middle.y, &mut child_edges[0]);
        } else if edge.bound.x.lo >= middle.x.hi {
            // This edge is entirely in the two right children.
            clip_v_axis(builder, edge, &middle.y, &mut child_edges[1]);
        } else {
            // The edge bound spans both sides of the u-axis split.
            let left = clip_u_bound(builder, edge, 1, middle.x.hi);
            clip_v_axis(builder, left, &middle.y, &mut child_edges[0]);
            let right = clip_u_bound(builder, edge, 0, middle.x.lo);
            clip_v_axis(builder, right, &middle.y, &mut child_edges[1]);
        }
    }

    // Now recursively update the edges in each child, visiting the children
    // in Hilbert curve order so that the interior tracker state stays
    // consistent.
    for pos in 0..4 {
        let (i, j) = pcell.child_ij(pos);
        if !child_edges[i][j].is_empty() || tracker.inside {
            let child = PaddedCell::from_parent_ij(pcell, i, j);
            update_edges(builder, &child, &child_edges[i][j], tracker);
        }
    }
}

// Builds an index cell if the cell is small enough, returning false if the
// cell must be subdivided instead.
fn make_index_cell(
    builder: &mut FaceBuilder<'_>,
    pcell: &PaddedCell,
    edges: &[ClippedEdge],
    tracker: &mut Tracker,
) -> bool {
    if edges.is_empty() && !tracker.inside {
        // No index cell is needed. In most cases this situation is detected
        // before we get to this point, but this can happen when all shapes
        // in a cell are removed or clipped away.
        return true;
    }

    // Count the number of edges that have not reached their maximum level
    // yet. Return false if there are too many such edges.
    let mut count = 0;
    for ce in edges {
        if pcell.level() < builder.face_edges[ce.fe].max_level {
            count += 1;
            if count > MAX_EDGES_PER_CELL {
                return false;
            }
        }
    }

    // Shift the interior tracker focus to the center of this cell, testing
    // the cell's own edges for crossings along the way.
    if tracker.is_active && !edges.is_empty() {
        if !tracker.at_cell_id(pcell.id) {
            tracker.move_to(pcell.entry_vertex());
        }
        tracker.draw_to(pcell.center());
        for ce in edges {
            let fe = &builder.face_edges[ce.fe];
            tracker.test_edge(&fe.edge);
        }
    }

    let cell_edges: Vec<i32> = edges
        .iter()
        .map(|ce| builder.face_edges[ce.fe].edge_id)
        .collect();
    builder.out.push((
        pcell.id,
        IndexCell {
            contains_center: tracker.inside,
            edges: cell_edges,
        },
    ));

    // Advance the tracker past this cell.
    if tracker.is_active && !edges.is_empty() {
        tracker.draw_to(pcell.exit_vertex());
        for ce in edges {
            let fe = &builder.face_edges[ce.fe];
            tracker.test_edge(&fe.edge);
        }
        tracker.set_next_cell_id(pcell.id.next());
    }
    true
}

// Constructs a new clipped edge with the given endpoints of the uv bound
// replaced.
fn update_bound(edge: ClippedEdge, u_end: usize, u: f64, v_end: usize, v: f64) -> ClippedEdge {
    let mut bound = edge.bound;
    if u_end == 0 {
        bound.x.lo = u;
    } else {
        bound.x.hi = u;
    }
    if v_end == 0 {
        bound.y.lo = v;
    } else {
        bound.y.hi = v;
    }
    ClippedEdge { fe: edge.fe, bound }
}

// Clips the given endpoint (lo=0, hi=1) of the u-axis to the given value.
fn clip_u_bound(
    builder: &FaceBuilder<'_>,
    edge: ClippedEdge,
    u_end: usize,
    u: f64,
) -> ClippedEdge {
    // Early exit if the edge does not need to be clipped.
    if u_end == 0 {
        if edge.bound.x.lo >= u {
            return edge;
        }
    } else if edge.bound.x.hi <= u {
        return edge;
    }

    // We interpolate the new v-value and then construct the clipped edge.
    let fe = &builder.face_edges[edge.fe];
    let v = edge
        .bound
        .y
        .clamp_point(interpolate_f64(u, fe.a.x, fe.b.x, fe.a.y, fe.b.y));

    // Determine which endpoint of the v-axis bound to update. If the edge
    // slope is positive we update the same endpoint, otherwise we update
    // the opposite endpoint.
    let positive_slope = (fe.a.x > fe.b.x) == (fe.a.y > fe.b.y);
    if (u_end == 1) == positive_slope {
        update_bound(edge, u_end, u, 1, v)
    } else {
        update_bound(edge, u_end, u, 0, v)
    }
}

// Clips the given endpoint (lo=0, hi=1) of the v-axis to the given value.
fn clip_v_bound(
    builder: &FaceBuilder<'_>,
    edge: ClippedEdge,
    v_end: usize,
    v: f64,
) -> ClippedEdge {
    if v_end == 0 {
        if edge.bound.y.lo >= v {
            return edge;
        }
    } else if edge.bound.y.hi <= v {
        return edge;
    }

    let fe = &builder.face_edges[edge.fe];
    let u = edge
        .bound
        .x
        .clamp_point(interpolate_f64(v, fe.a.y, fe.b.y, fe.a.x, fe.b.x));

    let positive_slope = (fe.a.x > fe.b.x) == (fe.a.y > fe.b.y);
    if (v_end == 1) == positive_slope {
        update_bound(edge, 1, u, v_end, v)
    } else {
        update_bound(edge, 0, u, v_end, v)
    }
}

// Distributes the edge into the two vertical children of the current cell,
// clipping as needed.
fn clip_v_axis(
    builder: &FaceBuilder<'_>,
    edge: ClippedEdge,
    middle: &r1::Interval,
    child_edges: &mut [Vec<ClippedEdge>; 2],
) {
    if edge.bound.y.hi <= middle.lo {
        // The edge is entirely in the lower child.
        child_edges[0].push(edge);
    } else if edge.bound.y.lo >= middle.hi {
        // The edge is entirely in the upper child.
        child_edges[1].push(edge);
    } else {
        // The edge bound spans both children.
        child_edges[0].push(clip_v_bound(builder, edge, 1, middle.hi));
        child_edges[1].push(clip_v_bound(builder, edge, 0, middle.lo));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::s2::point::regular_points_for_frame;
    use crate::s2::shape::{Chain, ReferencePoint};
    use crate::s1::{Angle, Deg};

    // A simple polygon shape over an explicit vertex list, closed
    // implicitly, with the origin-containment computed by brute force
    // against a precomputed flag.
    struct RingShape {
        vertices: Vec<Point>,
        origin_inside: bool,
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
            ReferencePoint::origin(self.origin_inside)
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

    fn ring_around(center: Point, radius_deg: f64, n: usize) -> RingShape {
        let frame = crate::s2::point::get_frame(&center);
        let vertices = regular_points_for_frame(&frame, Angle::from(Deg(radius_deg)), n);
        RingShape {
            vertices,
            origin_inside: false,
        }
    }

    #[test]
    fn build_and_locate_center() {
        let center = Point::from_coords(1.0, 0.5, 0.3);
        let shape = ring_around(center, 5.0, 64);
        let snap = build_index(&shape);
        assert!(!snap.is_empty());

        // The cell containing the ring center must report
        // contains_center consistent with brute force from its own center.
        let mut it = snap.iter();
        assert!(it.locate_point(&center));
        let cell = it.cell().unwrap();
        let cell_center = it.center();
        assert_eq!(
            contains_brute_force(&shape, &cell_center),
            cell.contains_center
        );
    }

    #[test]
    fn cells_are_sorted_and_disjoint() {
        let shape = ring_around(Point::from_coords(0.2, -0.8, 0.4), 20.0, 48);
        let snap = build_index(&shape);
        for w in snap.ids.windows(2) {
            assert!(w[0] < w[1]);
            assert!(w[0].range_max() < w[1].range_min());
        }
    }

    #[test]
    fn every_edge_is_indexed() {
        let shape = ring_around(Point::from_coords(-0.3, 0.1, 1.0), 11.0, 30);
        let snap = build_index(&shape);
        let mut seen = vec![false; shape.num_edges() as usize];
        for cell in &snap.cells {
            for &e in &cell.edges {
                seen[e as usize] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn locate_cell_id_relations() {
        let shape = ring_around(Point::from_coords(1.0, 0.0, 0.0), 15.0, 40);
        let snap = build_index(&shape);
        let some_id = snap.ids[snap.len() / 2];
        let mut it = snap.iter();
        assert_eq!(CellRelation::Indexed, it.locate_cell_id(some_id));
        if !some_id.is_leaf() {
            let mut it2 = snap.iter();
            // A child of an index cell is still Indexed.
            assert_eq!(
                CellRelation::Indexed,
                it2.locate_cell_id(some_id.children()[1])
            );
        }
        // A face on the far side of the sphere is disjoint.
        let mut it3 = snap.iter();
        let far = CellId::from_point(&Point::from_coords(-1.0, 0.0, 0.0));
        assert_eq!(CellRelation::Disjoint, it3.locate_cell_id(far));
    }

    #[test]
    fn try_snapshot_builds_once() {
        let shape = ring_around(Point::from_coords(0.0, 1.0, 0.2), 8.0, 16);
        let index = ShapeIndex::new();
        assert!(index.is_fresh());
        index.add();
        assert!(!index.is_fresh());
        let snap = index.try_snapshot(&shape).expect("uncontended build");
        assert!(index.is_fresh());
        assert!(!snap.is_empty());
        // Subsequent calls return the same snapshot.
        let snap2 = index.snapshot(&shape);
        assert!(Arc::ptr_eq(&snap, &snap2));
        index.reset();
        assert!(index.is_fresh());
        assert!(!index.has_shape());
    }
}
