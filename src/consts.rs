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

/// The smallest representable difference from 1.0, i.e. the unit of least
/// precision of an f64 near 1.
pub const DBL_EPSILON: f64 = 2.220446049250313e-16;

/// Default tolerance for approximate point comparisons.
pub const EPSILON: f64 = 1e-15;

/// Reports whether the two values are within the given absolute tolerance.
pub fn float64_near(x: f64, y: f64, eps: f64) -> bool {
    (x - y).abs() <= eps
}

/// Reports whether the two values are within the default tolerance.
pub fn float64_eq(x: f64, y: f64) -> bool {
    float64_near(x, y, EPSILON)
}

/// Asserts two f64 values are equal within the default tolerance.
#[macro_export]
macro_rules! assert_f64_eq {
    ($x:expr, $y:expr) => {
        assert!(
            $crate::consts::float64_eq($x, $y),
            "assert_f64_eq failed: {} vs {}",
            $x,
            $y
        )
    };
    ($x:expr, $y:expr, $eps:expr) => {
        assert!(
            $crate::consts::float64_near($x, $y, $eps),
            "assert_f64_eq failed: {} vs {} (eps {})",
            $x,
            $y,
            $eps
        )
    };
}
