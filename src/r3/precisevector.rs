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

use num_rational::BigRational;
use num_traits::Signed;

use crate::r3::vector::Vector;

/// PreciseVector represents a point in ℝ³ using exact rational arithmetic.
/// Every finite f64 is a dyadic rational, so conversions from Vector are
/// exact, and so are the products and sums below. This is used only by the
/// exact orientation predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct PreciseVector {
    pub x: BigRational,
    pub y: BigRational,
    pub z: BigRational,
}

fn big(f: f64) -> BigRational {
    // Finite by construction: all callers pass components of unit-ish vectors.
    BigRational::from_float(f).expect("non-finite coordinate")
}

/// Returns the sign of an exact rational as -1, 0 or +1.
pub fn sign_of(r: &BigRational) -> i32 {
    if r.is_positive() {
        1
    } else if r.is_negative() {
        -1
    } else {
        0
    }
}

impl PreciseVector {
    /// Converts a Vector to its exact rational representation.
    pub fn from_vector(v: Vector) -> PreciseVector {
        PreciseVector {
            x: big(v.x),
            y: big(v.y),
            z: big(v.z),
        }
    }

    /// Returns the exact dot product.
    pub fn dot(&self, ov: &PreciseVector) -> BigRational {
        &self.x * &ov.x + &self.y * &ov.y + &self.z * &ov.z
    }

    /// Returns the exact cross product.
    pub fn cross(&self, ov: &PreciseVector) -> PreciseVector {
        PreciseVector {
            x: &self.y * &ov.z - &self.z * &ov.y,
            y: &self.z * &ov.x - &self.x * &ov.z,
            z: &self.x * &ov.y - &self.y * &ov.x,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::Zero;

    #[test]
    fn precise_roundtrip_exact() {
        let v = Vector::new(0.1, -0.25, 1.0 / 3.0);
        let p = PreciseVector::from_vector(v);
        // 0.25 is dyadic; the rational equals it exactly.
        assert_eq!(p.y, big(-0.25));
    }

    #[test]
    fn precise_cross_dot() {
        let x = PreciseVector::from_vector(Vector::new(1.0, 0.0, 0.0));
        let y = PreciseVector::from_vector(Vector::new(0.0, 1.0, 0.0));
        let z = x.cross(&y);
        assert!(z.x.is_zero() && z.y.is_zero());
        assert_eq!(1, sign_of(&z.z));
        assert!(x.dot(&y).is_zero());
    }
}
