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

/// Interval represents a closed interval on a unit circle, measured in
/// radians in the range [-π, π]. The interval may be "inverted" (lo > hi),
/// in which case it wraps around through the point ±π. An inverted interval
/// represents the set of points on the circle *outside* the non-inverted
/// interval with the same endpoints.
///
/// The point -π is converted internally to π, except for the full and empty
/// intervals which are represented as [-π, π] and [π, -π] respectively.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Interval {
    pub lo: f64,
    pub hi: f64,
}

/// IEEE remainder: x - q*y where q is x/y rounded to the nearest integer,
/// with ties rounded to even. The tie behavior matters: it keeps the
/// endpoint π fixed under remainder(π, 2π).
pub(crate) fn remainder(x: f64, y: f64) -> f64 {
    let q = x / y;
    let mut rounded = q.round();
    if (q - q.trunc()).abs() == 0.5 {
        rounded = 2.0 * (q / 2.0).round();
    }
    x - rounded * y
}

impl Interval {
    /// Constructs a new interval from endpoints. Both arguments must be in
    /// the range [-π, π]. An interval with lo == -π and hi == π is full.
    pub fn new(lo: f64, hi: f64) -> Interval {
        let mut i = Interval { lo, hi };
        if lo == -PI && hi != PI {
            i.lo = PI;
        }
        if hi == -PI && lo != PI {
            i.hi = PI;
        }
        i
    }

    /// Constructs the minimal interval containing the two given points.
    /// Both arguments must be in [-π, π].
    pub fn from_point_pair(mut a: f64, mut b: f64) -> Interval {
        if a == -PI {
            a = PI;
        }
        if b == -PI {
            b = PI;
        }
        if positive_distance(a, b) <= PI {
            Interval { lo: a, hi: b }
        } else {
            Interval { lo: b, hi: a }
        }
    }

    /// Returns the empty interval.
    pub fn empty() -> Interval {
        Interval { lo: PI, hi: -PI }
    }

    /// Returns the full interval.
    pub fn full() -> Interval {
        Interval { lo: -PI, hi: PI }
    }

    /// Reports whether the interval is valid.
    pub fn is_valid(&self) -> bool {
        self.lo.abs() <= PI
            && self.hi.abs() <= PI
            && !(self.lo == -PI && self.hi != PI)
            && !(self.hi == -PI && self.lo != PI)
    }

    /// Reports whether the interval is full.
    pub fn is_full(&self) -> bool {
        self.lo == -PI && self.hi == PI
    }

    /// Reports whether the interval is empty.
    pub fn is_empty(&self) -> bool {
        self.lo == PI && self.hi == -PI
    }

    /// Reports whether the interval is inverted; that is, whether lo > hi.
    pub fn is_inverted(&self) -> bool {
        self.lo > self.hi
    }

    /// Returns the midpoint of the interval. It is undefined for full and
    /// empty intervals.
    pub fn center(&self) -> f64 {
        let c = 0.5 * (self.lo + self.hi);
        if !self.is_inverted() {
            return c;
        }
        if c <= 0.0 {
            c + PI
        } else {
            c - PI
        }
    }

    /// Returns the length of the interval. The length of an empty interval
    /// is negative.
    pub fn length(&self) -> f64 {
        let mut l = self.hi - self.lo;
        if l >= 0.0 {
            return l;
        }
        l += 2.0 * PI;
        if l > 0.0 {
            l
        } else {
            -1.0
        }
    }

    /// Contains assuming p ≠ -π.
    pub(crate) fn fast_contains(&self, p: f64) -> bool {
        if self.is_inverted() {
            (p >= self.lo || p <= self.hi) && !self.is_empty()
        } else {
            p >= self.lo && p <= self.hi
        }
    }

    /// Reports whether the interval contains the point. p must be in [-π, π].
    pub fn contains(&self, mut p: f64) -> bool {
        if p == -PI {
            p = PI;
        }
        self.fast_contains(p)
    }

    /// Reports whether the interior of the interval contains the point.
    pub fn interior_contains(&self, mut p: f64) -> bool {
        if p == -PI {
            p = PI;
        }
        if self.is_inverted() {
            p > self.lo || p < self.hi
        } else {
            (p > self.lo && p < self.hi) || self.is_full()
        }
    }

    /// Reports whether the interval contains the other interval.
    pub fn contains_interval(&self, oi: &Interval) -> bool {
        if self.is_inverted() {
            if oi.is_inverted() {
                return oi.lo >= self.lo && oi.hi <= self.hi;
            }
            return (oi.lo >= self.lo || oi.hi <= self.hi) && !self.is_empty();
        }
        if oi.is_inverted() {
            return self.is_full() || oi.is_empty();
        }
        oi.lo >= self.lo && oi.hi <= self.hi
    }

    /// Reports whether the two intervals contain any points in common.
    pub fn intersects(&self, oi: &Interval) -> bool {
        if self.is_empty() || oi.is_empty() {
            return false;
        }
        if self.is_inverted() {
            return oi.is_inverted() || oi.lo <= self.hi || oi.hi >= self.lo;
        }
        if oi.is_inverted() {
            return oi.lo <= self.hi || oi.hi >= self.lo;
        }
        oi.lo <= self.hi && oi.hi >= self.lo
    }

    /// Returns the interval expanded to include the given point. p must be
    /// in [-π, π].
    pub fn add_point(&self, mut p: f64) -> Interval {
        if p.abs() > PI {
            return *self;
        }
        if p == -PI {
            p = PI;
        }
        if self.fast_contains(p) {
            return *self;
        }
        if self.is_empty() {
            return Interval { lo: p, hi: p };
        }
        if positive_distance(p, self.lo) < positive_distance(self.hi, p) {
            Interval { lo: p, hi: self.hi }
        } else {
            Interval { lo: self.lo, hi: p }
        }
    }

    /// Returns an interval that has been expanded on each side by margin.
    /// If margin is negative, then the function shrinks the interval on each
    /// side by margin instead.
    pub fn expanded(&self, margin: f64) -> Interval {
        if margin >= 0.0 {
            if self.is_empty() {
                return *self;
            }
            // Check whether this interval will be full after expansion,
            // allowing for a rounding error when computing each endpoint.
            if self.length() + 2.0 * margin + 2.0 * DBL_EPSILON >= 2.0 * PI {
                return Interval::full();
            }
        } else {
            if self.is_full() {
                return *self;
            }
            if self.length() + 2.0 * margin - 2.0 * DBL_EPSILON <= 0.0 {
                return Interval::empty();
            }
        }
        let mut result = Interval {
            lo: remainder(self.lo - margin, 2.0 * PI),
            hi: remainder(self.hi + margin, 2.0 * PI),
        };
        if result.lo <= -PI {
            result.lo = PI;
        }
        result
    }

    /// Returns the smallest interval that contains both intervals.
    pub fn union(&self, oi: &Interval) -> Interval {
        if oi.is_empty() {
            return *self;
        }
        if self.fast_contains(oi.lo) {
            if self.fast_contains(oi.hi) {
                // Either oi ⊂ self, or self ∪ oi is the full interval.
                if self.contains_interval(oi) {
                    return *self;
                }
                return Interval::full();
            }
            return Interval {
                lo: self.lo,
                hi: oi.hi,
            };
        }
        if self.fast_contains(oi.hi) {
            return Interval {
                lo: oi.lo,
                hi: self.hi,
            };
        }
        // Neither endpoint of oi is in self. Either self ⊂ oi, or self and
        // oi are disjoint.
        if self.is_empty() || oi.fast_contains(self.lo) {
            return *oi;
        }
        // The intervals are disjoint; bridge the smaller gap.
        if positive_distance(oi.hi, self.lo) < positive_distance(self.hi, oi.lo) {
            Interval {
                lo: oi.lo,
                hi: self.hi,
            }
        } else {
            Interval {
                lo: self.lo,
                hi: oi.hi,
            }
        }
    }
}

// positive_distance computes the distance from a to b in the range [0, 2π),
// i.e. the length of the counterclockwise arc from a to b.
fn positive_distance(a: f64, b: f64) -> f64 {
    let d = b - a;
    if d >= 0.0 {
        return d;
    }
    (b + PI) - (a - PI)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_f64_eq;

    fn quad12() -> Interval {
        Interval::new(0.0, PI)
    }

    fn quad34() -> Interval {
        Interval::new(PI, 0.0)
    }

    #[test]
    fn interval_basic() {
        assert!(Interval::empty().is_empty());
        assert!(Interval::full().is_full());
        assert!(!Interval::full().is_empty());
        assert!(quad34().is_inverted());
        assert_f64_eq!(PI, quad12().length());
        assert_f64_eq!(PI, quad34().length());
        assert_f64_eq!(2.0 * PI, Interval::full().length());
        assert!(Interval::empty().length() < 0.0);
    }

    #[test]
    fn interval_contains() {
        assert!(quad12().contains(0.0));
        assert!(quad12().contains(PI));
        assert!(quad12().contains(-PI));
        assert!(!quad12().contains(-PI / 2.0));
        assert!(quad34().contains(-PI / 2.0));
        assert!(quad34().contains(PI));
        assert!(!quad34().interior_contains(0.0));
        assert!(Interval::full().contains(1.2));
        assert!(!Interval::empty().contains(0.0));
    }

    #[test]
    fn interval_union_intersects() {
        let a = Interval::new(-0.5, 0.5);
        let b = Interval::new(1.0, 2.0);
        assert!(!a.intersects(&b));
        let u = a.union(&b);
        assert!(u.contains(0.0) && u.contains(1.5));
        assert_eq!(Interval::full(), quad12().union(&quad34()));
        assert!(quad12().intersects(&quad34()));
    }

    #[test]
    fn remainder_ties_to_even() {
        assert_eq!(PI, remainder(PI, 2.0 * PI));
        assert_eq!(-PI, remainder(-PI, 2.0 * PI));
        assert_f64_eq!(0.0, remainder(2.0 * PI, 2.0 * PI));
        assert_f64_eq!(-0.5, remainder(1.5, 2.0));
    }

    #[test]
    fn interval_add_point_expand() {
        let mut i = Interval::empty();
        i = i.add_point(0.0);
        assert!(i.contains(0.0));
        i = i.add_point(1.0);
        assert!(i.contains(0.5));
        assert!(i.expanded(0.1).contains(-0.05));
        assert!(Interval::new(-3.0, 3.0).expanded(0.2).is_full());
    }
}
