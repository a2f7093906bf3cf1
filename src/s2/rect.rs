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

use crate::error::{Error, Result};
use crate::r1;
use crate::s1::{self, Angle};
use crate::s2::cap::Cap;
use crate::s2::coder::{Decoder, Encoder};
use crate::s2::latlng::LatLng;
use crate::s2::point::Point;

const RECT_ENCODING_VERSION: u8 = 1;

/// Rect represents a closed latitude-longitude rectangle. It can represent
/// the empty and full rectangles as well as single points. It is capable of
/// representing rectangles that span the international dateline.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rect {
    pub lat: r1::Interval,
    pub lng: s1::Interval,
}

fn valid_rect_lat_range() -> r1::Interval {
    r1::Interval::new(-PI / 2.0, PI / 2.0)
}

impl Rect {
    /// Constructs a rect from the given lat/lng intervals.
    pub fn new(lat: r1::Interval, lng: s1::Interval) -> Rect {
        Rect { lat, lng }
    }

    /// Returns the empty rectangle.
    pub fn empty() -> Rect {
        Rect {
            lat: r1::Interval::empty(),
            lng: s1::Interval::empty(),
        }
    }

    /// Returns the full rectangle.
    pub fn full() -> Rect {
        Rect {
            lat: valid_rect_lat_range(),
            lng: s1::Interval::full(),
        }
    }

    /// Constructs a rect containing the single point.
    pub fn from_latlng(ll: LatLng) -> Rect {
        Rect {
            lat: r1::Interval::from_point(ll.lat.rad()),
            lng: s1::Interval::from_point_pair(ll.lng.rad(), ll.lng.rad()),
        }
    }

    /// Reports whether the rectangle is valid: the latitude bounds lie
    /// within [-π/2, π/2] and the longitude is a valid circular interval.
    pub fn is_valid(&self) -> bool {
        self.lat.lo.abs() <= PI / 2.0
            && self.lat.hi.abs() <= PI / 2.0
            && self.lng.is_valid()
            && self.lat.is_empty() == self.lng.is_empty()
    }

    /// Reports whether the rectangle is empty.
    pub fn is_empty(&self) -> bool {
        self.lat.is_empty()
    }

    /// Reports whether the rectangle is full.
    pub fn is_full(&self) -> bool {
        self.lat == valid_rect_lat_range() && self.lng.is_full()
    }

    /// Returns the center of the rectangle.
    pub fn center(&self) -> LatLng {
        LatLng::new(Angle(self.lat.center()), Angle(self.lng.center()))
    }

    /// Returns the k-th vertex of the rectangle (k in [0, 3]), in CCW order
    /// (lower-left, lower-right, upper-right, upper-left).
    pub fn vertex(&self, k: usize) -> LatLng {
        let (lat, lng) = match k {
            0 => (self.lat.lo, self.lng.lo),
            1 => (self.lat.lo, self.lng.hi),
            2 => (self.lat.hi, self.lng.hi),
            _ => (self.lat.hi, self.lng.lo),
        };
        LatLng::new(Angle(lat), Angle(lng))
    }

    /// Reports whether the rectangle contains the given lat/lng point.
    pub fn contains_latlng(&self, ll: &LatLng) -> bool {
        if !ll.is_valid() {
            return false;
        }
        self.lat.contains(ll.lat.rad()) && self.lng.contains(ll.lng.rad())
    }

    /// Reports whether the rectangle contains the given point.
    pub fn contains_point(&self, p: &Point) -> bool {
        self.contains_latlng(&LatLng::from(p))
    }

    /// Reports whether this rectangle contains the other.
    pub fn contains(&self, other: &Rect) -> bool {
        self.lat.contains_interval(&other.lat) && self.lng.contains_interval(&other.lng)
    }

    /// Reports whether this rectangle and the other have any points in
    /// common.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.lat.intersects(&other.lat) && self.lng.intersects(&other.lng)
    }

    /// Returns the smallest rectangle containing both rectangles.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            lat: self.lat.union(&other.lat),
            lng: self.lng.union(&other.lng),
        }
    }

    /// Returns the rectangle expanded to include the given point.
    pub fn add_point(&self, ll: &LatLng) -> Rect {
        if !ll.is_valid() {
            return *self;
        }
        Rect {
            lat: self.lat.add_point(ll.lat.rad()),
            lng: self.lng.add_point(ll.lng.rad()),
        }
    }

    /// Returns a rectangle that has been expanded by margin.lat on each side
    /// in the latitude direction, and by margin.lng on each side in the
    /// longitude direction. The resulting latitudes are clamped to the valid
    /// range.
    pub fn expanded(&self, margin: &LatLng) -> Rect {
        let lat = self.lat.expanded(margin.lat.rad());
        let lng = self.lng.expanded(margin.lng.rad());
        if lat.is_empty() || lng.is_empty() {
            return Rect::empty();
        }
        Rect {
            lat: lat.intersection(&valid_rect_lat_range()),
            lng,
        }
    }

    /// Returns the rectangle unmodified if it does not include either pole,
    /// and the full longitude range otherwise.
    pub fn polar_closure(&self) -> Rect {
        if self.lat.lo == -PI / 2.0 || self.lat.hi == PI / 2.0 {
            return Rect {
                lat: self.lat,
                lng: s1::Interval::full(),
            };
        }
        *self
    }

    /// Returns a cap that contains the rectangle.
    pub fn cap_bound(&self) -> Cap {
        // We consider two possible bounding caps, one whose axis passes
        // through the center of the lat-lng rectangle and one whose axis is
        // the north or south pole. We return the smaller of the two caps.
        if self.is_empty() {
            return Cap::empty();
        }

        let (pole_z, pole_angle) = if self.lat.hi + self.lat.lo < 0.0 {
            // South pole axis yields the smaller cap.
            (-1.0, PI / 2.0 + self.lat.hi)
        } else {
            (1.0, PI / 2.0 - self.lat.lo)
        };
        let pole_cap = Cap::from_center_angle(
            &Point::from_coords(0.0, 0.0, pole_z),
            Angle(pole_angle),
        );

        // For bounding rectangles that span 180 degrees or less in longitude,
        // the maximum cap size is achieved at one of the rectangle vertices.
        // For rectangles that wrap all the way around, only a polar cap is a
        // valid bound.
        if self.lng.length() < 2.0 * PI {
            let mut mid_cap = Cap::from_point(&Point::from(&self.center()));
            for k in 0..4 {
                mid_cap = mid_cap.add_point(&Point::from(&self.vertex(k)));
            }
            if mid_cap.radius() < pole_cap.radius() {
                return mid_cap;
            }
        }
        pole_cap
    }

    /// Appends the rectangle to the encoder in the fixed wire layout: a
    /// version byte followed by the four bounds as little-endian doubles.
    pub fn encode(&self, e: &mut Encoder) {
        e.put8(RECT_ENCODING_VERSION);
        e.put_f64(self.lat.lo);
        e.put_f64(self.lat.hi);
        e.put_f64(self.lng.lo);
        e.put_f64(self.lng.hi);
    }

    /// Decodes a rectangle encoded by encode.
    pub fn decode(d: &mut Decoder<'_>) -> Result<Rect> {
        let version = d.get8()?;
        if version != RECT_ENCODING_VERSION {
            return Err(Error::Decode("unknown rect encoding version"));
        }
        let lat_lo = d.get_f64()?;
        let lat_hi = d.get_f64()?;
        let lng_lo = d.get_f64()?;
        let lng_hi = d.get_f64()?;
        let r = Rect {
            lat: r1::Interval::new(lat_lo, lat_hi),
            lng: s1::Interval { lo: lng_lo, hi: lng_hi },
        };
        if !r.is_valid() && !r.is_empty() {
            return Err(Error::Decode("invalid rect bounds"));
        }
        Ok(r)
    }
}
