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

use std::f64::consts::PI;

use crate::consts::DBL_EPSILON;
use crate::r1;
use crate::r3::vector::Vector;
use crate::s1::{self, Angle};
use crate::s2::latlng::LatLng;
use crate::s2::point::Point;
use crate::s2::rect::Rect;

/// RectBounder computes a conservative bounding rectangle for a sequence of
/// connected points, taking into account that the bound of an edge is not
/// simply the bound of its endpoints: the maximum latitude may be attained
/// in the interior of an edge.
///
/// The bound satisfies the following property: if the sequence of points is
/// a loop boundary, then the bound contains the computed LatLng of every
/// point on the boundary, to within the documented error tolerances.
#[derive(Debug)]
pub struct RectBounder {
    // The previous vertex in the chain.
    a: Point,
    // The previous vertex latitude longitude.
    a_ll: LatLng,
    bound: Rect,
}

impl Default for RectBounder {
    fn default() -> Self {
        RectBounder::new()
    }
}

impl RectBounder {
    pub fn new() -> RectBounder {
        RectBounder {
            a: Point::default(),
            a_ll: LatLng::default(),
            bound: Rect::empty(),
        }
    }

    /// Adds the given point to the chain. The Point must be unit length.
    pub fn add_point(&mut self, b: &Point) {
        let b_ll = LatLng::from(b);

        if self.bound.is_empty() {
            self.a = *b;
            self.a_ll = b_ll;
            self.bound = self.bound.add_point(&b_ll);
            return;
        }

        // First compute the cross product N = A x B robustly. This is the
        // normal to the great circle through A and B. We don't use
        // robust_sign since that method returns an arbitrary vector
        // orthogonal to A if the two vectors are proportional, and we want
        // the zero vector in that case.
        let n = (self.a.0 - b.0).cross(&(self.a.0 + b.0)); // N = 2 * (A x B)

        // The relative error in N gets large as its norm gets very small
        // (i.e., when the two points are nearly identical or antipodal). We
        // handle this by choosing a maximum allowable error, and if the
        // error is greater than this we fall back to a different technique.
        // Since it turns out that the other sources of error in converting
        // the normal to a maximum latitude add up to at most 1.16 *
        // dblEpsilon, and it is desirable to have the total error be a
        // multiple of dblEpsilon, we have chosen to limit the maximum error
        // in the normal to 3.84 * dblEpsilon. It is possible to show that
        // the error is less than this when
        //
        //	n.Norm() >= 8 * sqrt(3) / (3.84 - 0.5 - sqrt(3)) * dblEpsilon
        //	         = 1.91346e-15 (about 8.618 * dblEpsilon)
        let n_norm = n.norm();
        if n_norm < 1.91346e-15 {
            // A and B are either nearly identical or nearly antipodal (to
            // within 4.309 * dblEpsilon, or about 6 nanometers on the
            // earth's surface).
            if self.a.0.dot(&b.0) < 0.0 {
                // The two points are nearly antipodal. The easiest solution
                // is to assume that the edge between A and B could go in any
                // direction around the sphere.
                self.bound = Rect::full();
            } else {
                // The two points are nearly identical (to within 4.309 *
                // dblEpsilon). In this case we can just use the bounding
                // rectangle of the points, since after the expansion done by
                // get_bound this rect will include the (lat,lng) values of
                // all points along AB.
                self.bound = self
                    .bound
                    .union(&Rect::from_latlng(self.a_ll).add_point(&b_ll));
            }
            self.a = *b;
            self.a_ll = b_ll;
            return;
        }

        // Compute the longitude range spanned by AB.
        let mut lng_ab = s1::Interval::empty()
            .add_point(self.a_ll.lng.rad())
            .add_point(b_ll.lng.rad());
        if lng_ab.length() >= PI - 2.0 * DBL_EPSILON {
            // The points lie on nearly opposite lines of longitude to within
            // the maximum error of the calculation. The easiest solution is
            // to assume that AB could go on either side of the pole.
            lng_ab = s1::Interval::full();
        }

        // Next we compute the latitude range spanned by the edge AB. We
        // start with the range spanning the two endpoints of the edge.
        let mut lat_ab = r1::Interval::from_point(self.a_ll.lat.rad()).add_point(b_ll.lat.rad());

        // This is the desired range unless the edge AB crosses the plane
        // through N and the Z-axis (which is where the great circle through
        // A and B attains its minimum and maximum latitudes). To test
        // whether AB crosses this plane, we compute a vector M perpendicular
        // to this plane and then project A and B onto it.
        let m = n.cross(&Vector::new(0.0, 0.0, 1.0));
        let m_a = m.dot(&self.a.0);
        let m_b = m.dot(&b.0);

        // We want to test the signs of mA and mB, so we need to bound the
        // error in these calculations. It is possible to show that the total
        // error is bounded by
        //
        //	(1 + sqrt(3)) * dblEpsilon * nNorm + 8 * sqrt(3) * (dblEpsilon**2)
        //	  = 6.06638e-16 * nNorm + 6.83174e-31
        let m_error = 6.06638e-16 * n_norm + 6.83174e-31;
        if m_a * m_b < 0.0 || m_a.abs() <= m_error || m_b.abs() <= m_error {
            // Minimum/maximum latitude *may* occur in the edge interior.
            //
            // The maximum latitude is 90 degrees minus the latitude of N. We
            // compute this directly using atan2 in order to get maximum
            // accuracy near the poles.
            //
            // There are three sources of error to consider: the directional
            // error in N (at most 3.84 * dblEpsilon), converting N to a
            // maximum latitude, and computing the latitude of the test point
            // P. The latter two add up to at most 1.16 * dblEpsilon, for a
            // total of 5 * dblEpsilon. We add 3 * dblEpsilon here, and
            // get_bound pads the bound by another 2 * dblEpsilon.
            let max_lat = ((n.x * n.x + n.y * n.y).sqrt().atan2(n.z.abs()) + 3.0 * DBL_EPSILON)
                .min(PI / 2.0);

            // In order to get tight bounds when the two points are close
            // together, we also bound the min/max latitude relative to the
            // latitudes of the endpoints A and B. First we compute the
            // distance between A and B, and then the maximum change in
            // latitude between any two points along the great circle that
            // are separated by this distance. This gives us a latitude
            // change "budget". Some of this budget must be spent getting
            // from A to B; the remainder bounds the round-trip distance (in
            // latitude) from A or B to the min or max latitude attained
            // along the edge AB.
            let lat_budget = 2.0 * (0.5 * (self.a.0 - b.0).norm() * max_lat.sin()).asin();
            let max_delta = 0.5 * (lat_budget - lat_ab.length()) + DBL_EPSILON;

            // Test whether AB passes through the point of maximum latitude
            // or minimum latitude. If the dot product(s) are small enough
            // then the result may be ambiguous.
            if m_a <= m_error && m_b >= -m_error {
                lat_ab.hi = max_lat.min(lat_ab.hi + max_delta);
            }
            if m_b <= m_error && m_a >= -m_error {
                lat_ab.lo = (-max_lat).max(lat_ab.lo - max_delta);
            }
        }

        self.a = *b;
        self.a_ll = b_ll;
        self.bound = self.bound.union(&Rect::new(lat_ab, lng_ab));
    }

    /// Returns the bounding rectangle of the edge chain that connects the
    /// vertices defined so far. This bound satisfies the guarantee that for
    /// any contained point P, the computed LatLng of P is contained in the
    /// bound.
    pub fn get_bound(&self) -> Rect {
        // To save time, we ignore numerical errors in the computed LatLngs
        // while accumulating the bounds and then account for them here. The
        // maximum latitude error is 0.955 * dblEpsilon; in the worst case we
        // might have rounded "inwards" when computing the bound and
        // "outwards" when computing the latitude of a contained point P,
        // therefore we expand by 2 * dblEpsilon in each direction.
        self.bound
            .expanded(&LatLng::new(Angle(2.0 * DBL_EPSILON), Angle(0.0)))
            .polar_closure()
    }
}

/// Expands a bound computed for a region so that it is guaranteed to contain
/// the bounds of any subregion. A subregion's bound is computed from a
/// subset of the original vertices plus edge midpoints, and its computation
/// incurs its own rounding errors; this function accounts for the worst
/// case of both.
pub fn expand_for_subregions(bound: &Rect) -> Rect {
    // Empty bounds don't need expansion.
    if bound.is_empty() {
        return *bound;
    }

    // First we need to check whether the bound B contains any
    // nearly-antipodal points (to within 4.309 * dblEpsilon). If so then we
    // need to return a full bound, since the subregion might have an edge
    // between two such points, and add_point returns full for such edges.
    // Note that this can happen even if B is not full; for example, B could
    // just contain two points slightly rotated from opposite ends of a
    // diameter.
    let lng_gap = (PI - bound.lng.length() - 2.5 * DBL_EPSILON).max(0.0);
    let min_abs_lat = bound.lat.lo.max(-bound.lat.hi);

    // The unit-length corresponding to the angular gaps above and below the
    // latitude band.
    let lat_gap_south = PI / 2.0 + bound.lat.lo;
    let lat_gap_north = PI / 2.0 - bound.lat.hi;

    if min_abs_lat >= 0.0 {
        // The bound doesn't straddle the equator. The closest pair of
        // nearly-antipodal points is then bounded below by the distance
        // across the equator plus the longitude gap.
        if 2.0 * min_abs_lat + lng_gap < 1.354e-15 {
            return Rect::full();
        }
    } else if lng_gap >= PI / 2.0 {
        // The bound straddles the equator and spans at most 90 degrees of
        // longitude. The closest pair of antipodal points is bounded by the
        // latitude gaps.
        if lat_gap_south + lat_gap_north < 1.687e-15 {
            return Rect::full();
        }
    } else {
        // The bound straddles the equator and spans more than 90 degrees of
        // longitude. The minimum distance between antipodal points is
        // proportional to the product of the remaining gaps.
        if lat_gap_south.max(lat_gap_north) * lng_gap < 1.765e-15 {
            return Rect::full();
        }
    }

    // Next we need to check whether the subregion might contain any edges
    // that span nearly 180 degrees in longitude, since add_point sets the
    // longitude bound to full in that case. This corresponds to testing
    // whether lng_gap <= 0 below.
    //
    // Otherwise, the maximum latitude error in add_point is 4.8 *
    // dblEpsilon. In the worst case, the errors when computing the latitude
    // bound for a subregion could go in the opposite direction as the errors
    // when computing the bound for the original region, so we need to double
    // this value.
    let lat_expansion = 9.0 * DBL_EPSILON;
    let lng_expansion = if lng_gap <= 0.0 { PI } else { 0.0 };
    bound
        .expanded(&LatLng::new(Angle(lat_expansion), Angle(lng_expansion)))
        .polar_closure()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound_for(points: &[(f64, f64, f64)]) -> Rect {
        let mut b = RectBounder::new();
        for &(x, y, z) in points {
            b.add_point(&Point::from_coords(x, y, z));
        }
        b.get_bound()
    }

    #[test]
    fn edge_interior_latitude_maximum() {
        // The edge from (1,1,1) to (1,-1,1) (normalized) passes north of
        // both endpoints: its interior maximum latitude exceeds the endpoint
        // latitudes.
        let b = bound_for(&[(1.0, 1.0, 1.0), (1.0, -1.0, 1.0)]);
        let endpoint_lat = LatLng::from(&Point::from_coords(1.0, 1.0, 1.0))
            .lat
            .rad();
        assert!(b.lat.hi > endpoint_lat + 1e-6);
        // The interior maximum is at (1,0,1): latitude 45 degrees.
        assert!(b.lat.hi + 1e-10 >= PI / 4.0);
    }

    #[test]
    fn nearly_antipodal_points_give_full_bound() {
        let eps = 1e-20;
        let mut b = RectBounder::new();
        b.add_point(&Point::from_coords(1.0, 0.0, 0.0));
        b.add_point(&Point::from_coords(-1.0, eps, 0.0));
        assert!(b.get_bound().is_full());
    }

    #[test]
    fn bound_contains_vertices() {
        let pts = [(1.0, 0.2, 0.3), (0.1, 1.0, -0.4), (-0.5, 0.5, 0.5)];
        let b = bound_for(&pts);
        for &(x, y, z) in &pts {
            assert!(b.contains_point(&Point::from_coords(x, y, z)));
        }
    }

    #[test]
    fn subregion_expansion_is_superset() {
        let b = bound_for(&[(1.0, 0.2, 0.3), (0.1, 1.0, -0.4)]);
        let expanded = expand_for_subregions(&b);
        assert!(expanded.contains(&b));
    }

    #[test]
    fn subregion_expansion_nearly_full() {
        // A bound containing nearly-antipodal points must expand to full.
        let b = Rect::new(
            r1::Interval::new(-1e-16, 1e-16),
            s1::Interval::new(-PI + 1e-16, PI - 1e-16),
        );
        assert!(expand_for_subregions(&b).is_full());
    }
}
