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

use std::cmp::Ordering;
use std::f64::consts::PI;
use std::ops::{Add, Mul, Neg, Sub};

/// Angle represents a 1D angle in radians.
#[derive(Debug, Copy, Clone, Default, PartialEq, PartialOrd)]
pub struct Angle(pub f64);

/// Deg is a wrapper for constructing angles from degrees.
#[derive(Debug, Copy, Clone, Default, PartialEq, PartialOrd)]
pub struct Deg(pub f64);

impl Angle {
    /// Returns the zero angle.
    pub fn zero() -> Angle {
        Angle(0.0)
    }

    /// Returns the angle in radians.
    pub fn rad(&self) -> f64 {
        self.0
    }

    /// Returns the angle in degrees.
    pub fn deg(&self) -> f64 {
        self.0 * 180.0 / PI
    }

    /// Returns the absolute value of the angle.
    pub fn abs(&self) -> Angle {
        Angle(self.0.abs())
    }

    /// Compares two angles, treating NaN as equal (angles here are finite).
    pub fn cmp(&self, other: &Angle) -> Ordering {
        self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
    }
}

impl From<Deg> for Angle {
    fn from(d: Deg) -> Angle {
        Angle(d.0 * PI / 180.0)
    }
}

impl From<f64> for Angle {
    fn from(r: f64) -> Angle {
        Angle(r)
    }
}

impl Add for Angle {
    type Output = Angle;
    fn add(self, o: Angle) -> Angle {
        Angle(self.0 + o.0)
    }
}

impl Sub for Angle {
    type Output = Angle;
    fn sub(self, o: Angle) -> Angle {
        Angle(self.0 - o.0)
    }
}

impl Mul<f64> for Angle {
    type Output = Angle;
    fn mul(self, m: f64) -> Angle {
        Angle(self.0 * m)
    }
}

impl Neg for Angle {
    type Output = Angle;
    fn neg(self) -> Angle {
        Angle(-self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_f64_eq;

    #[test]
    fn angle_conversions() {
        assert_f64_eq!(PI, Angle::from(Deg(180.0)).rad());
        assert_f64_eq!(90.0, Angle(PI / 2.0).deg());
        assert_f64_eq!(-PI, (-Angle(PI)).rad());
    }
}
