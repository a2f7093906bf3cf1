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
use crate::s2::edge_crossings::{vertex_crossing, Crossing};
use crate::s2::point::Point;
use crate::s2::predicates::{expensive_sign, robust_sign, triage_sign, Direction};

/// EdgeCrosser allows edges to be efficiently tested for intersection with
/// a given fixed edge AB. It is especially efficient when testing for
/// intersection with an edge chain connecting vertices v0, v1, v2, ...
///
/// Example usage:
///
///	fn count_intersections(a: &Point, b: &Point, edges: &[Edge]) -> usize {
///	    let mut count = 0;
///	    let mut crosser = EdgeCrosser::new(a, b);
///	    for edge in edges {
///	        if crosser.crossing_sign(&edge.v0, &edge.v1) != Crossing::DoNotCross {
///	            count += 1;
///	        }
///	    }
///	    count
///	}
#[derive(Debug, Clone)]
pub struct EdgeCrosser {
    a: Point,
    b: Point,

    // To reduce the number of calls to expensive_sign, we compute an
    // outward-facing tangent at A and B if necessary. If the plane
    // perpendicular to one of these tangents separates AB from CD (i.e., one
    // edge on each side) then there is no intersection.
    a_tangent: Point, // Outward-facing tangent at A.
    b_tangent: Point, // Outward-facing tangent at B.

    // The fields below are updated for each vertex in the chain.
    c: Point,       // Previous vertex in the vertex chain.
    acb: Direction, // The orientation of triangle ACB.
}

impl EdgeCrosser {
    /// Returns an EdgeCrosser with the fixed edge AB.
    pub fn new(a: &Point, b: &Point) -> EdgeCrosser {
        let norm = a.point_cross(b);
        EdgeCrosser {
            a: *a,
            b: *b,
            a_tangent: Point(a.0.cross(&norm.0)),
            b_tangent: Point(norm.0.cross(&b.0)),
            c: Point::default(),
            acb: Direction::Indeterminate,
        }
    }

    /// A convenience constructor that uses AB as the fixed edge, and C as
    /// the first vertex of the vertex chain (equivalent to calling
    /// restart_at(c)).
    pub fn new_chain_edge_crosser(a: &Point, b: &Point, c: &Point) -> EdgeCrosser {
        let mut e = EdgeCrosser::new(a, b);
        e.restart_at(c);
        e
    }

    /// Sets the current point of the edge crosser to be c. Call this method
    /// when your chain 'jumps' to a new place.
    pub fn restart_at(&mut self, c: &Point) {
        self.c = *c;
        self.acb = -triage_sign(&self.a, &self.b, &self.c);
    }

    /// Reports whether the edge AB intersects the edge CD. If any two
    /// vertices from different edges are the same, returns Maybe. If either
    /// edge is degenerate (A == B or C == D), returns either DoNotCross or
    /// Maybe.
    pub fn crossing_sign(&mut self, c: &Point, d: &Point) -> Crossing {
        if *c != self.c {
            self.restart_at(c);
        }
        self.chain_crossing_sign(d)
    }

    /// Reports whether crossing_sign(c, d) > 0, or AB and CD share a vertex
    /// and vertex_crossing(a, b, c, d) is true. This defines a crossing
    /// function such that point-in-polygon containment tests can be
    /// implemented by counting edge crossings.
    pub fn edge_or_vertex_crossing(&mut self, c: &Point, d: &Point) -> bool {
        if *c != self.c {
            self.restart_at(c);
        }
        self.edge_or_vertex_chain_crossing(d)
    }

    /// Like crossing_sign, but uses the last vertex passed to one of the
    /// crossing methods (or restart_at) as the first vertex of the current
    /// edge.
    pub fn chain_crossing_sign(&mut self, d: &Point) -> Crossing {
        // For there to be an edge crossing, the triangles ACB, CBD, BDA, DAC
        // must all be oriented the same way (CW or CCW). We keep the
        // orientation of ACB as part of our state. When each new point D
        // arrives, we compute the orientation of BDA and check whether it
        // matches ACB. This checks whether the points C and D are on
        // opposite sides of the great circle through AB.

        // Recall that triage_sign is invariant with respect to rotating its
        // arguments, i.e. ABD has the same orientation as BDA.
        let bda = triage_sign(&self.a, &self.b, d);
        if self.acb == -bda && bda != Direction::Indeterminate {
            // The most common case: triangles have opposite orientations.
            // Save the current vertex D as the next vertex C, and also save
            // the orientation of the new triangle ACB (which is opposite to
            // the current triangle BDA).
            self.c = *d;
            self.acb = -bda;
            return Crossing::DoNotCross;
        }
        self.crossing_sign_internal(d, bda)
    }

    /// Like edge_or_vertex_crossing, but uses the last vertex passed to one
    /// of the crossing methods (or restart_at) as the first vertex of the
    /// current edge.
    pub fn edge_or_vertex_chain_crossing(&mut self, d: &Point) -> bool {
        // We need to copy self.c since it is clobbered by
        // chain_crossing_sign.
        let c = self.c;
        match self.chain_crossing_sign(d) {
            Crossing::DoNotCross => false,
            Crossing::Cross => true,
            Crossing::Maybe => vertex_crossing(&self.a, &self.b, &c, d),
        }
    }

    // Handles the slow path of crossing_sign.
    fn crossing_sign_internal(&mut self, d: &Point, mut bda: Direction) -> Crossing {
        let result = self.crossing_sign_slow(d, &mut bda);
        self.c = *d;
        self.acb = -bda;
        result
    }

    fn crossing_sign_slow(&mut self, d: &Point, bda: &mut Direction) -> Crossing {
        // At this point, a very common situation is that A,B,C,D are four
        // points on a line such that AB does not overlap CD. (For example,
        // this happens when a line or curve is sampled finely, or when
        // geometry is constructed by computing the union of cells.) Most of
        // the time, we can determine that AB and CD do not intersect using
        // the two outward-facing tangents at A and B (parallel to AB) and
        // testing whether AB and CD are on opposite sides of the plane
        // perpendicular to one of these tangents. This is moderately
        // expensive but still much cheaper than expensive_sign.

        // The error in point_cross is insignificant. The maximum error in
        // the call to cross (i.e., the maximum norm of the error vector) is
        // (0.5 + 1/sqrt(3)) * dblEpsilon. The maximum error in each call to
        // dot below is dblEpsilon. (There is also a small relative error
        // term that is insignificant because we are comparing the result
        // against a constant that is very close to zero.)
        let max_error = (1.5 + 1.0 / 3f64.sqrt()) * DBL_EPSILON;
        if (self.c.0.dot(&self.a_tangent.0) > max_error && d.0.dot(&self.a_tangent.0) > max_error)
            || (self.c.0.dot(&self.b_tangent.0) > max_error
                && d.0.dot(&self.b_tangent.0) > max_error)
        {
            return Crossing::DoNotCross;
        }

        // Otherwise, eliminate the cases where two vertices from different
        // edges are equal. (These cases could be handled in the code below,
        // but we would rather avoid calling expensive_sign if possible.)
        if self.a == self.c || self.a == *d || self.b == self.c || self.b == *d {
            return Crossing::Maybe;
        }

        // Eliminate the cases where an input edge is degenerate. (Note that
        // in most cases, if CD is degenerate then this method is not even
        // called because acb and bda have different signs.)
        if self.a == self.b || self.c == *d {
            return Crossing::DoNotCross;
        }

        // Otherwise it's time to break out the big guns.
        if self.acb == Direction::Indeterminate {
            self.acb = -expensive_sign(&self.a, &self.b, &self.c);
        }
        if *bda == Direction::Indeterminate {
            *bda = expensive_sign(&self.a, &self.b, d);
        }

        if *bda != self.acb {
            return Crossing::DoNotCross;
        }

        let cbd = -robust_sign(&self.c, d, &self.b);
        if cbd != self.acb {
            return Crossing::DoNotCross;
        }
        let dac = robust_sign(&self.c, d, &self.a);
        if dac != self.acb {
            return Crossing::DoNotCross;
        }
        Crossing::Cross
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::r3::vector::Vector;

    fn p(x: f64, y: f64, z: f64) -> Point {
        Point(Vector::new(x, y, z).normalize())
    }

    #[test]
    fn chain_crossings_match_single_calls() {
        let a = p(1.0, 0.0, 0.0);
        let b = p(0.0, 1.0, 0.0);
        // Edges through the midpoint of AB; alternate between crossing and
        // non-crossing.
        let up = p(1.0, 1.0, 1.0);
        let down = p(1.0, 1.0, -1.0);

        let mut crosser = EdgeCrosser::new_chain_edge_crosser(&a, &b, &up);
        assert_eq!(Crossing::Cross, crosser.chain_crossing_sign(&down));
        assert_eq!(Crossing::Cross, crosser.crossing_sign(&down, &up));
        // An edge that stays on one side of the great circle through AB
        // cannot cross it.
        let pole = p(0.0, 0.0, 1.0);
        assert_eq!(Crossing::DoNotCross, crosser.crossing_sign(&up, &pole));
    }

    #[test]
    fn chain_state_reset_between_chains() {
        let a = p(1.0, 0.0, 0.0);
        let b = p(0.0, 1.0, 0.0);
        let c = p(1.0, 1.0, 1.0);
        let d = p(1.0, 1.0, -1.0);
        let mut crosser = EdgeCrosser::new(&a, &b);
        assert!(crosser.edge_or_vertex_crossing(&c, &d));
        // Restarting at an unrelated chain gives the same answers as fresh
        // construction.
        let e = p(0.1, 0.2, 1.0);
        let f = p(0.3, 0.1, 1.0);
        let mut fresh = EdgeCrosser::new(&a, &b);
        assert_eq!(
            fresh.crossing_sign(&e, &f),
            crosser.crossing_sign(&e, &f)
        );
    }

    #[test]
    fn shared_vertex_gives_maybe() {
        let a = p(1.0, 2.0, 1.0);
        let b = p(1.0, -3.0, 0.5);
        let c = p(0.0, 1.0, 1.0);
        let mut crosser = EdgeCrosser::new(&a, &b);
        assert_eq!(Crossing::Maybe, crosser.crossing_sign(&c, &a));
        assert_eq!(Crossing::Maybe, crosser.crossing_sign(&b, &c));
    }
}
