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

use crate::r3::vector::Vector;
use crate::s1::{Angle, Deg};
use crate::s2::point::Point;

/// LatLng represents a point on the unit sphere as a pair of angles.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct LatLng {
    pub lat: Angle,
    pub lng: Angle,
}

impl LatLng {
    /// Constructs a LatLng from angles.
    pub fn new(lat: Angle, lng: Angle) -> LatLng {
        LatLng { lat, lng }
    }

    /// Constructs a LatLng from degrees.
    pub fn from_degrees(lat: f64, lng: f64) -> LatLng {
        LatLng {
            lat: Angle::from(Deg(lat)),
            lng: Angle::from(Deg(lng)),
        }
    }

    /// Reports whether the LatLng is normalized, with lat ∈ [-π/2, π/2] and
    /// lng ∈ [-π, π].
    pub fn is_valid(&self) -> bool {
        self.lat.rad().abs() <= PI / 2.0 && self.lng.rad().abs() <= PI
    }
}

/// Returns the latitude of the given point.
pub fn latitude(p: &Point) -> Angle {
    let v = p.0;
    Angle(v.z.atan2((v.x * v.x + v.y * v.y).sqrt()))
}

/// Returns the longitude of the given point.
pub fn longitude(p: &Point) -> Angle {
    Angle(p.0.y.atan2(p.0.x))
}

impl From<&Point> for LatLng {
    fn from(p: &Point) -> LatLng {
        LatLng {
            lat: latitude(p),
            lng: longitude(p),
        }
    }
}

impl From<&LatLng> for Point {
    fn from(ll: &LatLng) -> Point {
        let phi = ll.lat.rad();
        let theta = ll.lng.rad();
        let cosphi = phi.cos();
        Point(Vector::new(
            theta.cos() * cosphi,
            theta.sin() * cosphi,
            phi.sin(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_f64_eq;

    #[test]
    fn latlng_point_roundtrip() {
        for &(lat, lng) in &[(0.0, 0.0), (45.0, 45.0), (-60.0, 170.0), (90.0, 0.0)] {
            let ll = LatLng::from_degrees(lat, lng);
            let p = Point::from(&ll);
            assert!(p.0.is_unit());
            let back = LatLng::from(&p);
            assert_f64_eq!(ll.lat.rad(), back.lat.rad(), 1e-13);
            if lat.abs() != 90.0 {
                assert_f64_eq!(ll.lng.rad(), back.lng.rad(), 1e-13);
            }
        }
    }

    #[test]
    fn latitude_poles() {
        assert_f64_eq!(PI / 2.0, latitude(&Point::from_coords(0.0, 0.0, 1.0)).rad());
        assert_f64_eq!(
            -PI / 2.0,
            latitude(&Point::from_coords(0.0, 0.0, -1.0)).rad()
        );
    }
}
