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

/// Interval represents a closed interval on the real line, [lo, hi].
/// The interval is considered empty if lo > hi.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Interval {
    pub lo: f64,
    pub hi: f64,
}

impl Interval {
    /// Constructs the interval [lo, hi].
    pub fn new(lo: f64, hi: f64) -> Self {
        Interval { lo, hi }
    }

    /// Returns an empty interval.
    pub fn empty() -> Self {
        Interval { lo: 1.0, hi: 0.0 }
    }

    /// Constructs an interval containing the single point.
    pub fn from_point(p: f64) -> Self {
        Interval { lo: p, hi: p }
    }

    /// Reports whether the interval is empty.
    pub fn is_empty(&self) -> bool {
        self.lo > self.hi
    }

    /// Returns the midpoint of the interval. Undefined for empty intervals.
    pub fn center(&self) -> f64 {
        0.5 * (self.lo + self.hi)
    }

    /// Returns the length of the interval. Negative for empty intervals.
    pub fn length(&self) -> f64 {
        self.hi - self.lo
    }

    /// Reports whether the interval contains the point.
    pub fn contains(&self, p: f64) -> bool {
        self.lo <= p && p <= self.hi
    }

    /// Reports whether the interior of the interval contains the point.
    pub fn interior_contains(&self, p: f64) -> bool {
        self.lo < p && p < self.hi
    }

    /// Reports whether the interval contains the other interval.
    pub fn contains_interval(&self, oi: &Interval) -> bool {
        if oi.is_empty() {
            return true;
        }
        self.lo <= oi.lo && oi.hi <= self.hi
    }

    /// Reports whether the interval contains any points in common with the
    /// other interval.
    pub fn intersects(&self, oi: &Interval) -> bool {
        if self.lo <= oi.lo {
            // oi.lo ∈ self and oi is not empty
            oi.lo <= self.hi && oi.lo <= oi.hi
        } else {
            self.lo <= oi.hi && self.lo <= self.hi
        }
    }

    /// Reports whether the interior of this interval intersects the other.
    pub fn interior_intersects(&self, oi: &Interval) -> bool {
        oi.lo < self.hi && self.lo < oi.hi && self.lo < self.hi && oi.lo <= oi.hi
    }

    /// Returns the interval expanded so that it contains the given point.
    pub fn add_point(&self, p: f64) -> Interval {
        if self.is_empty() {
            return Interval::from_point(p);
        }
        Interval {
            lo: self.lo.min(p),
            hi: self.hi.max(p),
        }
    }

    /// Returns the closest point in the interval to the given point. The
    /// interval must be non-empty.
    pub fn clamp_point(&self, p: f64) -> f64 {
        self.lo.max(self.hi.min(p))
    }

    /// Returns an interval expanded on each side by the given margin. Any
    /// expansion of an empty interval remains empty.
    pub fn expanded(&self, margin: f64) -> Interval {
        if self.is_empty() {
            return *self;
        }
        Interval {
            lo: self.lo - margin,
            hi: self.hi + margin,
        }
    }

    /// Returns the smallest interval containing both input intervals.
    pub fn union(&self, oi: &Interval) -> Interval {
        if self.is_empty() {
            return *oi;
        }
        if oi.is_empty() {
            return *self;
        }
        Interval {
            lo: self.lo.min(oi.lo),
            hi: self.hi.max(oi.hi),
        }
    }

    /// Returns the intersection of the two intervals.
    pub fn intersection(&self, oi: &Interval) -> Interval {
        Interval {
            lo: self.lo.max(oi.lo),
            hi: self.hi.min(oi.hi),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_basics() {
        let unit = Interval::new(0.0, 1.0);
        let empty = Interval::empty();
        assert!(!unit.is_empty());
        assert!(empty.is_empty());
        assert_eq!(0.5, unit.center());
        assert_eq!(1.0, unit.length());
        assert!(unit.contains(0.0) && unit.contains(1.0));
        assert!(!unit.interior_contains(0.0));
        assert!(unit.interior_contains(0.5));
    }

    #[test]
    fn interval_set_ops() {
        let a = Interval::new(0.0, 1.0);
        let b = Interval::new(0.5, 2.0);
        assert!(a.intersects(&b));
        assert!(!a.contains_interval(&b));
        assert_eq!(Interval::new(0.0, 2.0), a.union(&b));
        assert_eq!(Interval::new(0.5, 1.0), a.intersection(&b));
        assert!(a.contains_interval(&Interval::empty()));
        assert!(!a.intersects(&Interval::empty()));
    }

    #[test]
    fn interval_expand_clamp() {
        let a = Interval::new(0.2, 0.4);
        assert_eq!(Interval::new(0.1, 0.5), a.expanded(0.1));
        assert!(Interval::empty().expanded(1.0).is_empty());
        assert_eq!(0.2, a.clamp_point(0.0));
        assert_eq!(0.4, a.clamp_point(1.0));
        assert_eq!(0.3, a.clamp_point(0.3));
        assert_eq!(Interval::new(0.2, 0.7), a.add_point(0.7));
    }
}
