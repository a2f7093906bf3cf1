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

use crate::s2::cellid::MAX_LEVEL;

/// Metric is a measure for cells, relating cell levels to distances or
/// areas on the sphere. The maximum, minimum and average values of a
/// quantity at a given level scale as deriv * 2^(-dim * level).
#[derive(Debug, Copy, Clone)]
pub struct Metric {
    /// Dim is either 1 or 2, for a 1D or 2D metric respectively.
    pub dim: u8,
    /// Deriv is the scaling factor for the metric.
    pub deriv: f64,
}

/// Each cell is bounded by four planes passing through its four edges and
/// the center of the sphere. These metrics relate to the angle between each
/// pair of opposite bounding planes.
pub const MIN_WIDTH_METRIC: Metric = Metric {
    dim: 1,
    deriv: 2.0 * std::f64::consts::SQRT_2 / 3.0,
};

/// Average angular span of a cell edge at a given level (quadratic
/// projection).
pub const AVG_EDGE_METRIC: Metric = Metric {
    dim: 1,
    deriv: 1.459213746386106,
};

// ilogb extracts the binary exponent of x, i.e. the unique integer e such
// that 2^e <= |x| < 2^(e+1). Zero and subnormal inputs are clamped to the
// minimum exponent.
fn ilogb(x: f64) -> i32 {
    let bits = x.abs().to_bits();
    let exp = ((bits >> 52) & 0x7ff) as i32;
    if exp == 0 {
        // Zero or subnormal; a very small exponent keeps callers clamping to
        // the deepest level.
        return -1075;
    }
    exp - 1023
}

impl Metric {
    /// Returns the value of the metric at the given level.
    pub fn value(&self, level: i32) -> f64 {
        let scale = (-(self.dim as i32) * level) as f64;
        self.deriv * 2f64.powf(scale)
    }

    /// Returns the minimum level such that the metric is at most the given
    /// value, or MAX_LEVEL if there is no such level.
    pub fn min_level(&self, val: f64) -> i32 {
        if val <= 0.0 {
            return MAX_LEVEL;
        }
        let level = -(ilogb(val / self.deriv) >> (self.dim - 1));
        level.clamp(0, MAX_LEVEL)
    }

    /// Returns the maximum level such that the metric is at least the given
    /// value, or 0 if there is no such level.
    pub fn max_level(&self, val: f64) -> i32 {
        if val <= 0.0 {
            return MAX_LEVEL;
        }
        let level = ilogb(self.deriv / val) >> (self.dim - 1);
        level.clamp(0, MAX_LEVEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_level_monotone() {
        let m = AVG_EDGE_METRIC;
        assert_eq!(0, m.min_level(10.0));
        assert_eq!(MAX_LEVEL, m.min_level(0.0));
        let mut prev = 0;
        for i in 1..30 {
            let lvl = m.min_level(1.0 / f64::powi(2.0, i));
            assert!(lvl >= prev);
            prev = lvl;
        }
    }

    #[test]
    fn min_level_bounds_value() {
        let m = AVG_EDGE_METRIC;
        for i in 1..25 {
            let val = 1.0 / f64::powi(2.0, i);
            let lvl = m.min_level(val);
            // At the chosen level the metric is at most val (unless clamped).
            if lvl < MAX_LEVEL && lvl > 0 {
                assert!(m.value(lvl) <= val * 2.0);
            }
        }
    }
}
