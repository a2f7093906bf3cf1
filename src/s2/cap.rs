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

use crate::s1::Angle;
use crate::s2::point::Point;

/// Cap represents a disc-shaped region defined by a center and a radius.
/// Technically this shape is called a "spherical cap" (rather than disc)
/// because it is not planar; the cap represents a portion of the sphere that
/// has been cut off by a plane.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Cap {
    pub center: Point,
    radius: Angle,
}

impl Cap {
    /// Constructs a cap containing a single point.
    pub fn from_point(p: &Point) -> Cap {
        Cap {
            center: *p,
            radius: Angle::zero(),
        }
    }

    /// Constructs a cap with the given center and angular radius.
    pub fn from_center_angle(center: &Point, radius: Angle) -> Cap {
        Cap {
            center: *center,
            radius,
        }
    }

    /// Returns the empty cap, which contains no points.
    pub fn empty() -> Cap {
        Cap {
            center: Point::from_coords(1.0, 0.0, 0.0),
            radius: Angle(-1.0),
        }
    }

    /// Returns the full cap, which contains all points.
    pub fn full() -> Cap {
        Cap {
            center: Point::from_coords(1.0, 0.0, 0.0),
            radius: Angle(PI),
        }
    }

    /// Returns the cap's angular radius.
    pub fn radius(&self) -> Angle {
        self.radius
    }

    /// Reports whether the cap is empty, i.e. it contains no points.
    pub fn is_empty(&self) -> bool {
        self.radius.rad() < 0.0
    }

    /// Reports whether the cap is full, i.e. it contains all points.
    pub fn is_full(&self) -> bool {
        self.radius.rad() >= PI
    }

    /// Reports whether the cap contains the given point.
    pub fn contains_point(&self, p: &Point) -> bool {
        !self.is_empty() && self.center.distance(p) <= self.radius
    }

    /// Reports whether the cap contains the other cap.
    pub fn contains(&self, other: &Cap) -> bool {
        if self.is_full() || other.is_empty() {
            return true;
        }
        self.radius.rad() >= self.center.distance(&other.center).rad() + other.radius.rad()
    }

    /// Reports whether the caps have any points in common.
    pub fn intersects(&self, other: &Cap) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.radius.rad() + other.radius.rad() >= self.center.distance(&other.center).rad()
    }

    /// Returns the cap expanded so that it contains the given point.
    pub fn add_point(&self, p: &Point) -> Cap {
        if self.is_empty() {
            return Cap::from_point(p);
        }
        let d = self.center.distance(p);
        if d <= self.radius {
            return *self;
        }
        Cap {
            center: self.center,
            radius: d,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::s1::Deg;

    #[test]
    fn cap_basics() {
        assert!(Cap::empty().is_empty());
        assert!(Cap::full().is_full());
        let p = Point::from_coords(0.0, 0.0, 1.0);
        assert!(Cap::full().contains_point(&p));
        assert!(!Cap::empty().contains_point(&p));
        assert!(Cap::from_point(&p).contains_point(&p));
    }

    #[test]
    fn cap_contains_and_intersects() {
        let pole = Point::from_coords(0.0, 0.0, 1.0);
        let big = Cap::from_center_angle(&pole, Angle::from(Deg(40.0)));
        let small = Cap::from_center_angle(
            &Point::from(&crate::s2::latlng::LatLng::from_degrees(80.0, 10.0)),
            Angle::from(Deg(5.0)),
        );
        assert!(big.contains(&small));
        assert!(big.intersects(&small));
        let far = Cap::from_center_angle(&-pole, Angle::from(Deg(20.0)));
        assert!(!big.intersects(&far));
    }

    #[test]
    fn cap_add_point_grows() {
        let pole = Point::from_coords(0.0, 0.0, 1.0);
        let q = Point::from_coords(1.0, 0.0, 1.0);
        let cap = Cap::from_point(&pole).add_point(&q);
        assert!(cap.contains_point(&q));
        assert!(cap.contains_point(&pole));
    }
}
