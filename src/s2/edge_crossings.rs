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

use crate::s2::edge_crosser::EdgeCrosser;
use crate::s2::point::{ordered_ccw, Point};

/// A Crossing indicates how edges cross.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Crossing {
    /// The edges cross at a point interior to both.
    Cross,
    /// Two vertices from different edges are the same.
    Maybe,
    /// The edges do not cross.
    DoNotCross,
}

/// Reports whether the edge AB intersects the edge CD. If AB crosses CD at
/// a point that is interior to both edges, Cross is returned. If any two
/// vertices from different edges are the same it returns Maybe. Otherwise
/// it returns DoNotCross. If either edge is degenerate (A == B or C == D),
/// the return value is Maybe if two vertices from different edges are the
/// same and DoNotCross otherwise.
///
/// Properties of crossing_sign:
///
///	(1) crossing_sign(b,a,c,d) == crossing_sign(a,b,c,d)
///	(2) crossing_sign(c,d,a,b) == crossing_sign(a,b,c,d)
///	(3) crossing_sign(a,b,c,d) == Maybe if a==c, a==d, b==c, b==d
///	(3) crossing_sign(a,b,c,d) == DoNotCross or Maybe if a==b or c==d
///
/// This method implements an exact, consistent perturbation model such that
/// no three points are ever considered to be collinear. This means that even
/// if you have 4 points A, B, C, D that lie exactly in a line (say, around
/// the equator), C and D will be treated as being slightly to one side or
/// the other of AB. This is done in a way such that the results are always
/// consistent (see predicates::robust_sign).
pub fn crossing_sign(a: &Point, b: &Point, c: &Point, d: &Point) -> Crossing {
    let mut crosser = EdgeCrosser::new_chain_edge_crosser(a, b, c);
    crosser.chain_crossing_sign(d)
}

/// Reports whether two edges "cross" in a way that point-in-polygon
/// containment tests can be implemented by counting the number of edge
/// crossings. The basic rule is that a "crossing" occurs if AB is
/// encountered after CD during a CCW sweep around the shared vertex starting
/// from a fixed reference point.
///
/// Note that according to this rule, if AB crosses CD then in general CD
/// does not cross AB. However, this leads to the correct result when
/// counting polygon edge crossings. For example, suppose that A,B,C are
/// three consecutive vertices of a CCW polygon. If we now consider the edge
/// crossings of a segment BP as P sweeps around B, the crossing number
/// changes parity exactly when BP crosses BA or BC.
///
/// Useful properties of vertex_crossing (VC):
///
///	(1) VC(a,a,c,d) == VC(a,b,c,c) == false
///	(2) VC(a,b,a,b) == VC(a,b,b,a) == true
///	(3) VC(a,b,c,d) == VC(a,b,d,c) == VC(b,a,c,d) == VC(b,a,d,c)
///	(3) If exactly one of a,b equals one of c,d, then exactly one of
///	    VC(a,b,c,d) and VC(c,d,a,b) is true
///
/// It is an error to call this method with 4 distinct vertices.
pub fn vertex_crossing(a: &Point, b: &Point, c: &Point, d: &Point) -> bool {
    // If A == B or C == D there is no intersection. We need to check this
    // case first in case 3 or more input points are identical.
    if a == b || c == d {
        return false;
    }

    // If any other pair of vertices is equal, there is a crossing if and
    // only if ordered_ccw indicates that the edge AB is further CCW around
    // the shared vertex O (either A or B) than the edge CD, starting from an
    // arbitrary fixed reference point.
    if a == c {
        return (b == d) || ordered_ccw(&a.reference_dir(), d, b, a);
    }
    if b == d {
        return ordered_ccw(&b.reference_dir(), c, a, b);
    }
    if a == d {
        return (b == c) || ordered_ccw(&a.reference_dir(), c, b, a);
    }
    if b == c {
        return ordered_ccw(&b.reference_dir(), d, a, b);
    }
    false
}

/// A convenience function that calls crossing_sign to handle cases where all
/// four vertices are distinct, and vertex_crossing to handle cases where two
/// or more vertices are the same. This defines a crossing function such that
/// point-in-polygon containment tests can be implemented by simply counting
/// edge crossings.
pub fn edge_or_vertex_crossing(a: &Point, b: &Point, c: &Point, d: &Point) -> bool {
    match crossing_sign(a, b, c, d) {
        Crossing::DoNotCross => false,
        Crossing::Cross => true,
        Crossing::Maybe => vertex_crossing(a, b, c, d),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::r3::vector::Vector;

    fn p(x: f64, y: f64, z: f64) -> Point {
        Point(Vector::new(x, y, z).normalize())
    }

    struct CrossingCase {
        msg: &'static str,
        a: Point,
        b: Point,
        c: Point,
        d: Point,
        robust: Crossing,
        edge_or_vertex: bool,
    }

    fn cases() -> Vec<CrossingCase> {
        // A few representative cases; the full permutation sweep below
        // exercises the symmetry properties.
        vec![
            CrossingCase {
                msg: "two regular edges that cross",
                a: p(1.0, 2.0, 1.0),
                b: p(1.0, -3.0, 0.5),
                c: p(1.0, -0.5, -3.0),
                d: p(0.1, 0.5, 3.0),
                robust: Crossing::Cross,
                edge_or_vertex: true,
            },
            CrossingCase {
                msg: "two regular edges that intersect antipodal points",
                a: p(1.0, 2.0, 1.0),
                b: p(1.0, -3.0, 0.5),
                c: p(-1.0, 0.5, 3.0),
                d: p(-0.1, -0.5, -3.0),
                robust: Crossing::DoNotCross,
                edge_or_vertex: false,
            },
            CrossingCase {
                msg: "two edges on the same great circle starting at antipodal points",
                a: p(0.0, 0.0, -1.0),
                b: p(0.0, 1.0, 0.0),
                c: p(0.0, 0.0, 1.0),
                d: p(0.0, 1.0, 1.0),
                robust: Crossing::DoNotCross,
                edge_or_vertex: false,
            },
            CrossingCase {
                msg: "two edges that share an endpoint",
                a: p(2.0, 3.0, 4.0),
                b: p(-1.0, 2.0, 5.0),
                c: p(7.0, -2.0, 3.0),
                d: p(2.0, 3.0, 4.0),
                robust: Crossing::Maybe,
                edge_or_vertex: false,
            },
            CrossingCase {
                msg: "two edges that barely cross near the middle of one edge",
                a: p(1.0, 1.0, 1.0),
                b: p(1.0, f64::from_bits(0x3fefffffffffffff), -1.0),
                c: p(11.0, -12.0, -1.0),
                d: p(10.0, 10.0, 1.0),
                robust: Crossing::Cross,
                edge_or_vertex: true,
            },
            CrossingCase {
                msg: "two edges that barely miss near the middle of one edge",
                a: p(1.0, 1.0, 1.0),
                b: p(1.0, f64::from_bits(0x3ff0000000000001), -1.0),
                c: p(1.0, -1.0, 0.0),
                d: p(1.0, 1.0, 0.0),
                robust: Crossing::DoNotCross,
                edge_or_vertex: false,
            },
        ]
    }

    fn check_one(msg: &str, a: Point, b: Point, c: Point, d: Point, robust: Crossing, eov: bool) {
        // Modify the expected result if two vertices from different edges
        // match, since that always produces Maybe.
        let robust = if a == c || a == d || b == c || b == d {
            Crossing::Maybe
        } else {
            robust
        };
        assert_eq!(robust, crossing_sign(&a, &b, &c, &d), "{}", msg);
        assert_eq!(eov, edge_or_vertex_crossing(&a, &b, &c, &d), "{}", msg);
    }

    #[test]
    fn crossing_sign_permutations() {
        for t in cases() {
            let (a, b, c, d) = (t.a, t.b, t.c, t.d);
            check_one(t.msg, a, b, c, d, t.robust, t.edge_or_vertex);
            check_one(t.msg, b, a, c, d, t.robust, t.edge_or_vertex);
            check_one(t.msg, a, b, d, c, t.robust, t.edge_or_vertex);
            check_one(t.msg, b, a, d, c, t.robust, t.edge_or_vertex);

            // Degenerate cases.
            assert_eq!(Crossing::DoNotCross, crossing_sign(&a, &a, &c, &d), "{}", t.msg);
            assert_eq!(Crossing::DoNotCross, crossing_sign(&a, &b, &c, &c), "{}", t.msg);
            assert_eq!(Crossing::Maybe, crossing_sign(&a, &b, &a, &b), "{}", t.msg);
        }
    }

    #[test]
    fn vertex_crossing_shared_edges() {
        let a = p(1.0, 2.0, 3.0);
        let b = p(3.0, 2.0, 1.0);
        let c = p(1.0, 0.0, 1.0);
        assert!(vertex_crossing(&a, &b, &a, &b));
        assert!(vertex_crossing(&a, &b, &b, &a));
        assert!(!vertex_crossing(&a, &a, &a, &b));
        // Exactly one of VC(a,b,c,d), VC(c,d,a,b) when one vertex is shared.
        let x = vertex_crossing(&a, &b, &a, &c);
        let y = vertex_crossing(&a, &c, &a, &b);
        assert!(x != y);
    }
}
