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
use std::ops::{Add, Mul, Neg, Sub};

/// Vector represents a point in ℝ³.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
#[repr(C)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Vector { x, y, z }
    }

    /// Returns the vector's norm.
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Returns the square of the norm.
    pub fn norm2(&self) -> f64 {
        self.dot(self)
    }

    /// Returns a unit vector in the same direction.
    pub fn normalize(&self) -> Vector {
        let n = self.norm();
        if n == 0.0 {
            return *self;
        }
        self.mul(1.0 / n)
    }

    /// Reports whether this vector is of approximately unit length.
    pub fn is_unit(&self) -> bool {
        const EPSILON: f64 = 5e-14;
        (self.norm2() - 1.0).abs() <= EPSILON
    }

    /// Returns the standard dot product.
    pub fn dot(&self, ov: &Vector) -> f64 {
        self.x * ov.x + self.y * ov.y + self.z * ov.z
    }

    /// Returns the standard cross product.
    pub fn cross(&self, ov: &Vector) -> Vector {
        Vector {
            x: self.y * ov.z - self.z * ov.y,
            y: self.z * ov.x - self.x * ov.z,
            z: self.x * ov.y - self.y * ov.x,
        }
    }

    /// Returns the angle between this vector and the other, in radians.
    pub fn angle(&self, ov: &Vector) -> f64 {
        self.cross(ov).norm().atan2(self.dot(ov))
    }

    /// Returns a unit vector that is orthogonal to this one.
    /// ortho(-v) = -ortho(v) for all v.
    pub fn ortho(&self) -> Vector {
        // Grow a component other than the largest in the vector, to guarantee
        // that they aren't parallel (which would make the cross product zero).
        let mut ov = Vector::new(0.012, 0.0053, 0.00457);
        match self.largest_component() {
            Axis::X => ov.z = 1.0,
            Axis::Y => ov.x = 1.0,
            Axis::Z => ov.y = 1.0,
        }
        self.cross(&ov).normalize()
    }

    /// Returns the axis that represents the largest component in this vector.
    pub fn largest_component(&self) -> Axis {
        let t = self.abs();
        if t.x > t.y {
            if t.x > t.z {
                Axis::X
            } else {
                Axis::Z
            }
        } else if t.y > t.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    /// Returns the vector with nonnegative components.
    pub fn abs(&self) -> Vector {
        Vector {
            x: self.x.abs(),
            y: self.y.abs(),
            z: self.z.abs(),
        }
    }

    /// Compares two vectors lexicographically.
    pub fn cmp(&self, ov: &Vector) -> Ordering {
        if self.x < ov.x {
            return Ordering::Less;
        }
        if self.x > ov.x {
            return Ordering::Greater;
        }
        if self.y < ov.y {
            return Ordering::Less;
        }
        if self.y > ov.y {
            return Ordering::Greater;
        }
        if self.z < ov.z {
            return Ordering::Less;
        }
        if self.z > ov.z {
            return Ordering::Greater;
        }
        Ordering::Equal
    }
}

/// Axis enumerates the 3 axes of ℝ³.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Axis {
    X = 0,
    Y,
    Z,
}

impl Add for Vector {
    type Output = Vector;
    fn add(self, ov: Vector) -> Vector {
        Vector::new(self.x + ov.x, self.y + ov.y, self.z + ov.z)
    }
}

impl Sub for Vector {
    type Output = Vector;
    fn sub(self, ov: Vector) -> Vector {
        Vector::new(self.x - ov.x, self.y - ov.y, self.z - ov.z)
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;
    fn mul(self, m: f64) -> Vector {
        Vector::new(self.x * m, self.y * m, self.z * m)
    }
}

impl Neg for Vector {
    type Output = Vector;
    fn neg(self) -> Vector {
        Vector::new(-self.x, -self.y, -self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_f64_eq;
    use std::f64::consts::PI;

    #[test]
    fn vector_norms() {
        let v = Vector::new(3.0, 4.0, 12.0);
        assert_f64_eq!(13.0, v.norm());
        assert_f64_eq!(169.0, v.norm2());
        assert!(v.normalize().is_unit());
    }

    #[test]
    fn vector_angle() {
        let x = Vector::new(1.0, 0.0, 0.0);
        let y = Vector::new(0.0, 1.0, 0.0);
        assert_f64_eq!(PI / 2.0, x.angle(&y));
        assert_f64_eq!(PI, x.angle(&-x));
        assert_f64_eq!(0.0, x.angle(&x));
    }

    #[test]
    fn vector_ortho() {
        for v in [
            Vector::new(1.0, 0.0, 0.0),
            Vector::new(0.0, 1.0, 0.0),
            Vector::new(0.012, 0.3, -0.99),
        ] {
            let o = v.ortho();
            assert!(o.is_unit());
            assert_f64_eq!(0.0, v.dot(&o));
        }
    }

    #[test]
    fn vector_cmp() {
        let a = Vector::new(1.0, 2.0, 3.0);
        let b = Vector::new(1.0, 2.0, 4.0);
        assert_eq!(Ordering::Less, a.cmp(&b));
        assert_eq!(Ordering::Greater, b.cmp(&a));
        assert_eq!(Ordering::Equal, a.cmp(&a));
    }
}
