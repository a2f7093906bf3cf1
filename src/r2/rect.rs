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

use crate::r1::Interval;
use crate::r2::point::Point;

/// Rect represents a closed axis-aligned rectangle in the (x,y) plane.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rect {
    pub x: Interval,
    pub y: Interval,
}

impl Rect {
    /// Constructs a rect that contains the given points.
    pub fn from_points(pts: &[Point]) -> Rect {
        let mut r = Rect::empty();
        for p in pts {
            r = r.add_point(p);
        }
        r
    }

    /// Constructs a rect from the given intervals.
    pub fn from_intervals(x: Interval, y: Interval) -> Rect {
        Rect { x, y }
    }

    /// Constructs a canonical empty rect.
    pub fn empty() -> Rect {
        Rect {
            x: Interval::empty(),
            y: Interval::empty(),
        }
    }

    /// Reports whether the rect is empty.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Returns the low corner of the rect.
    pub fn lo(&self) -> Point {
        Point::new(self.x.lo, self.y.lo)
    }

    /// Returns the high corner of the rect.
    pub fn hi(&self) -> Point {
        Point::new(self.x.hi, self.y.hi)
    }

    /// Returns the center of the rect.
    pub fn center(&self) -> Point {
        Point::new(self.x.center(), self.y.center())
    }

    /// Reports whether the rect contains the given point.
    pub fn contains_point(&self, p: &Point) -> bool {
        self.x.contains(p.x) && self.y.contains(p.y)
    }

    /// Reports whether this rect and the other have any points in common.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x.intersects(&other.x) && self.y.intersects(&other.y)
    }

    /// Returns the rect expanded to include the given point.
    pub fn add_point(&self, p: &Point) -> Rect {
        Rect {
            x: self.x.add_point(p.x),
            y: self.y.add_point(p.y),
        }
    }

    /// Returns the smallest rect containing both rects.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x: self.x.union(&other.x),
            y: self.y.union(&other.y),
        }
    }

    /// Returns a rect that has been expanded in the x-direction by margin.x
    /// and in the y-direction by margin.y. An empty rect stays empty.
    pub fn expanded(&self, margin: Point) -> Rect {
        let xx = self.x.expanded(margin.x);
        let yy = self.y.expanded(margin.y);
        if xx.is_empty() || yy.is_empty() {
            return Rect::empty();
        }
        Rect { x: xx, y: yy }
    }

    /// Returns a rect expanded by the same margin on all sides.
    pub fn expanded_by_margin(&self, margin: f64) -> Rect {
        self.expanded(Point::new(margin, margin))
    }

    /// Returns the closest point in the rect to the given point.
    pub fn clamp_point(&self, p: &Point) -> Point {
        Point::new(self.x.clamp_point(p.x), self.y.clamp_point(p.y))
    }

    /// Returns the vertex in direction i along the x-axis (0=lo, 1=hi) and
    /// direction j along the y-axis.
    pub fn vertex_ij(&self, i: usize, j: usize) -> Point {
        let x = if i == 1 { self.x.hi } else { self.x.lo };
        let y = if j == 1 { self.y.hi } else { self.y.lo };
        Point::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_from_points() {
        let r = Rect::from_points(&[Point::new(0.5, 0.25), Point::new(-0.5, 0.75)]);
        assert_eq!(r.x, Interval::new(-0.5, 0.5));
        assert_eq!(r.y, Interval::new(0.25, 0.75));
        assert!(r.contains_point(&Point::new(0.0, 0.5)));
        assert!(!r.contains_point(&Point::new(0.0, 1.0)));
    }

    #[test]
    fn rect_expand_intersect() {
        let a = Rect::from_points(&[Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
        let b = Rect::from_points(&[Point::new(2.0, 2.0), Point::new(3.0, 3.0)]);
        assert!(!a.intersects(&b));
        assert!(a.expanded_by_margin(1.0).intersects(&b));
        assert!(Rect::empty().expanded_by_margin(1.0).is_empty());
    }
}
