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

use std::ops::{Add, Mul, Neg, Sub};

/// Point represents a point in ℝ².
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Returns a counterclockwise-rotated 90 degree copy of this point.
    pub fn ortho(&self) -> Point {
        Point {
            x: -self.y,
            y: self.x,
        }
    }

    /// Returns the dot product with the other point.
    pub fn dot(&self, op: &Point) -> f64 {
        self.x * op.x + self.y * op.y
    }

    /// Returns the cross product of this and the other point.
    pub fn cross(&self, op: &Point) -> f64 {
        self.x * op.y - self.y * op.x
    }

    /// Returns the vector's norm.
    pub fn norm(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, op: Point) -> Point {
        Point::new(self.x + op.x, self.y + op.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, op: Point) -> Point {
        Point::new(self.x - op.x, self.y - op.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, m: f64) -> Point {
        Point::new(self.x * m, self.y * m)
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}
