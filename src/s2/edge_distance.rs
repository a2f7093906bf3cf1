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

use crate::r3::vector::Vector;
use crate::s1::Angle;
use crate::s2::point::Point;

// Reports whether the points are strictly counterclockwise without any
// symbolic perturbation; used only to decide whether the projection of a
// point falls within an edge.
fn simple_ccw(a: &Vector, b: &Vector, c: &Vector) -> bool {
    c.cross(a).dot(b) > 0.0
}

/// Returns the point along the edge AB that is closest to X. A and B must
/// be distinct, non-antipodal unit vectors.
pub fn closest_point_on_edge(x: &Point, a: &Point, b: &Point) -> Point {
    let a_cross_b = a.point_cross(b);
    // Find the closest point to X along the great circle through AB, by
    // subtracting the component of X along the circle normal.
    let p = x.0 - a_cross_b.0 * (x.0.dot(&a_cross_b.0) / a_cross_b.0.norm2());

    // If this point is on the edge AB, then it's the closest point.
    if simple_ccw(&a_cross_b.0, &a.0, &p) && simple_ccw(&p, &b.0, &a_cross_b.0) {
        return Point(p.normalize());
    }

    // Otherwise, the closest point is either A or B.
    if (x.0 - a.0).norm2() <= (x.0 - b.0).norm2() {
        *a
    } else {
        *b
    }
}

/// Returns the distance of X from the edge AB, i.e. the angle between X and
/// the closest point on the edge.
pub fn distance_from_segment(x: &Point, a: &Point, b: &Point) -> Angle {
    x.distance(&closest_point_on_edge(x, a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_f64_eq;
    use std::f64::consts::PI;

    #[test]
    fn distance_interior_projection() {
        // X directly "above" the midpoint of an equatorial edge.
        let a = Point::from_coords(1.0, 0.0, 0.0);
        let b = Point::from_coords(0.0, 1.0, 0.0);
        let x = Point::from_coords(1.0, 1.0, 1.0);
        // The closest point is (1,1,0)/sqrt(2), at distance atan(1/sqrt(2))
        // from x... computed directly:
        let cp = closest_point_on_edge(&x, &a, &b);
        assert_f64_eq!(1.0 / 2f64.sqrt(), cp.0.x, 1e-14);
        assert_f64_eq!(1.0 / 2f64.sqrt(), cp.0.y, 1e-14);
        assert_f64_eq!(0.0, cp.0.z, 1e-14);
        assert_f64_eq!(
            x.distance(&cp).rad(),
            distance_from_segment(&x, &a, &b).rad()
        );
    }

    #[test]
    fn distance_clamps_to_endpoints() {
        let a = Point::from_coords(1.0, 0.0, 0.0);
        let b = Point::from_coords(0.0, 1.0, 0.0);
        // X beyond endpoint A.
        let x = Point::from_coords(1.0, -1.0, 0.0);
        assert_eq!(a, closest_point_on_edge(&x, &a, &b));
        assert_f64_eq!(PI / 4.0, distance_from_segment(&x, &a, &b).rad());
    }

    #[test]
    fn distance_zero_on_edge() {
        let a = Point::from_coords(1.0, 0.0, 0.0);
        let b = Point::from_coords(0.0, 1.0, 0.0);
        let x = Point::from_coords(1.0, 1.0, 0.0);
        assert!(distance_from_segment(&x, &a, &b).rad() < 1e-15);
    }
}
