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

// This file contains the orientation predicate and the tiered strategies
// used to make it exact: a cheap floating-point test, a more stable
// floating-point test on translated coordinates, exact rational arithmetic,
// and finally symbolic perturbation for inputs whose determinant is exactly
// zero.

use std::cmp::Ordering;
use std::ops::Neg;

use num_rational::BigRational;

use crate::consts::DBL_EPSILON;
use crate::r3::precisevector::{sign_of, PreciseVector};
use crate::s2::point::Point;

// maxDeterminantError is the maximum error in computing (AxB).C where all
// vectors are unit length. Using standard inequalities, it can be shown that
//
//	fl(AxB) = AxB + D where |D| <= maxDeterminantError,
//
// and similarly,
//
//	fl((AxB).C) = (AxB).C + d where |d| <= maxDeterminantError.
const MAX_DETERMINANT_ERROR: f64 = 1.8274 * DBL_EPSILON;

// detErrorMultiplier is the factor to scale the magnitudes by when checking
// for the determinant. Using similar bounds as above,
//
//	fl((A-C)x(B-C)).C = ((A-C)x(B-C)).C + d where |d| <= detErrorMultiplier * M,
//
// where M is the maximum magnitude of the three products above.
const DET_ERROR_MULTIPLIER: f64 = 3.2321 * DBL_EPSILON;

/// Direction is an indication of the ordering of a set of points.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Clockwise,
    Indeterminate,
    CounterClockwise,
}

impl From<Direction> for i32 {
    fn from(d: Direction) -> i32 {
        match d {
            Direction::Clockwise => -1,
            Direction::Indeterminate => 0,
            Direction::CounterClockwise => 1,
        }
    }
}

impl From<i32> for Direction {
    fn from(i: i32) -> Direction {
        match i.cmp(&0) {
            Ordering::Less => Direction::Clockwise,
            Ordering::Equal => Direction::Indeterminate,
            Ordering::Greater => Direction::CounterClockwise,
        }
    }
}

impl Neg for Direction {
    type Output = Direction;
    fn neg(self) -> Direction {
        match self {
            Direction::Clockwise => Direction::CounterClockwise,
            Direction::Indeterminate => Direction::Indeterminate,
            Direction::CounterClockwise => Direction::Clockwise,
        }
    }
}

/// Reports whether the points A, B, C are strictly counterclockwise, and
/// returns false if the points are clockwise or collinear (i.e. if they are
/// all contained on some great circle).
///
/// Due to numerical errors, situations may arise that are mathematically
/// impossible, e.g. ABC may be considered strictly CCW while BCA is not.
/// However, the implementation guarantees the following:
///
/// If sign(a,b,c), then !sign(c,b,a) for all a,b,c.
pub fn sign(a: &Point, b: &Point, c: &Point) -> bool {
    robust_sign(a, b, c) == Direction::CounterClockwise
}

/// Returns a Direction representing the ordering of the points.
/// CounterClockwise is returned if the points are in counter-clockwise order,
/// Clockwise for clockwise, and Indeterminate if any two points are the same
/// (collinear), or the sign could not completely be determined.
///
/// This function is essentially like a robust version of the sign of the
/// determinant of a,b,c, except that it has additional logic to make sure
/// that the above properties hold even when the three points are coplanar,
/// and to deal with the limitations of floating-point arithmetic.
///
/// robust_sign satisfies the following conditions:
///
///	(1) robust_sign(a,b,c) == Indeterminate if and only if a == b, b == c, or c == a
///	(2) robust_sign(b,c,a) == robust_sign(a,b,c) for all a,b,c
///	(3) robust_sign(c,b,a) == -robust_sign(a,b,c) for all a,b,c
pub fn robust_sign(a: &Point, b: &Point, c: &Point) -> Direction {
    let sign = triage_sign(a, b, c);
    if sign == Direction::Indeterminate {
        return expensive_sign(a, b, c);
    }
    sign
}

/// Returns the direction sign of the points. It returns Indeterminate if two
/// points are identical or the result is uncertain. Uncertain cases can be
/// resolved, if desired, by calling expensive_sign.
///
/// The purpose of this method is to allow additional cheap tests to be done
/// without calling expensive_sign.
pub fn triage_sign(a: &Point, b: &Point, c: &Point) -> Direction {
    let det = a.0.cross(&b.0).dot(&c.0);
    if det > MAX_DETERMINANT_ERROR {
        return Direction::CounterClockwise;
    }
    if det < -MAX_DETERMINANT_ERROR {
        return Direction::Clockwise;
    }
    Direction::Indeterminate
}

/// Reports the direction sign of the points in a numerically stable way.
/// Unlike triage_sign, this method can usually compute the correct
/// determinant sign even when all three points are as collinear as possible.
/// For example if three points are spaced 1km apart along a random line on
/// the Earth's surface using the nearest representable points, there is only
/// a 0.4% chance that this method will not be able to find the determinant
/// sign. The probability of failure decreases as the points get closer
/// together; if the collinear points are 1 meter apart, the failure rate
/// drops to 0.0004%.
pub fn stable_sign(a: &Point, b: &Point, c: &Point) -> Direction {
    let ab = b.0 - a.0;
    let ab2 = ab.norm2();
    let bc = c.0 - b.0;
    let bc2 = bc.norm2();
    let ca = a.0 - c.0;
    let ca2 = ca.norm2();

    // Now compute the determinant ((A-C)x(B-C)).C, where the vertices have
    // been cyclically permuted if necessary so that AB is the longest edge.
    // (This minimizes the magnitude of cross product.) At the same time we
    // also compute the maximum error in the determinant.

    // The two shortest edges, pointing away from their common point.
    let (e1, e2, det) = if ab2 >= bc2 && ab2 >= ca2 {
        // AB is the longest edge.
        (ca, bc, -ca.cross(&bc).dot(&c.0))
    } else if bc2 >= ca2 {
        // BC is the longest edge.
        (ab, ca, -ab.cross(&ca).dot(&a.0))
    } else {
        // CA is the longest edge.
        (bc, ab, -bc.cross(&ab).dot(&b.0))
    };

    let max_error = DET_ERROR_MULTIPLIER * (e1.norm2() * e2.norm2()).sqrt();
    if det > max_error {
        return Direction::CounterClockwise;
    }
    if det < -max_error {
        return Direction::Clockwise;
    }
    Direction::Indeterminate
}

/// Reports the direction sign of the points, using more precise (and
/// expensive) techniques when triage_sign could not determine it. This
/// never returns Indeterminate unless two of the points are the same.
pub fn expensive_sign(a: &Point, b: &Point, c: &Point) -> Direction {
    // Return Indeterminate if and only if two points are the same.
    // This ensures robust_sign(a,b,c) == Indeterminate iff a == b, b == c, or c == a.
    // The only reason to explicitly check for this is that the expensive
    // computations below are guaranteed to return a non-zero result.
    if a == b || b == c || c == a {
        return Direction::Indeterminate;
    }

    // Next we try recomputing the determinant still using floating-point
    // arithmetic but in a more precise way. This is more expensive than the
    // simple calculation done by triage_sign, but it is still *much* cheaper
    // than using arbitrary-precision arithmetic.
    let det_sign = stable_sign(a, b, c);
    if det_sign != Direction::Indeterminate {
        return det_sign;
    }

    // Otherwise fall back to exact arithmetic and symbolic permutations.
    exact_sign(a, b, c, true)
}

/// Reports the direction sign of the points computed using high-precision
/// arithmetic and/or symbolic perturbations.
pub fn exact_sign(a: &Point, b: &Point, c: &Point, perturb: bool) -> Direction {
    // Sort the three points in lexicographic order, keeping track of the sign
    // of the permutation. (Each exchange inverts the sign of the determinant.)
    let mut perm_sign = Direction::CounterClockwise;
    let mut pa = a;
    let mut pb = b;
    let mut pc = c;
    if pa.0.cmp(&pb.0) == Ordering::Greater {
        std::mem::swap(&mut pa, &mut pb);
        perm_sign = -perm_sign;
    }
    if pb.0.cmp(&pc.0) == Ordering::Greater {
        std::mem::swap(&mut pb, &mut pc);
        perm_sign = -perm_sign;
    }
    if pa.0.cmp(&pb.0) == Ordering::Greater {
        std::mem::swap(&mut pa, &mut pb);
        perm_sign = -perm_sign;
    }

    // Construct multiple-precision versions of the sorted points and compute
    // their precise 3x3 determinant.
    let xa = PreciseVector::from_vector(pa.0);
    let xb = PreciseVector::from_vector(pb.0);
    let xc = PreciseVector::from_vector(pc.0);
    let xb_cross_xc = xb.cross(&xc);
    let det = xa.dot(&xb_cross_xc);

    let mut det_sign = Direction::from(sign_of(&det));
    if det_sign == Direction::Indeterminate && perturb {
        // The product of the determinant signs of the permutation and the
        // perturbed determinant gives the result.
        det_sign = symbolically_perturbed_sign(&xa, &xb, &xc, &xb_cross_xc);
    }
    match perm_sign {
        Direction::CounterClockwise => det_sign,
        _ => -det_sign,
    }
}

// symbolically_perturbed_sign computes the determinant sign of the given
// points using the method of symbolic perturbations from "Simulation of
// Simplicity" (Edelsbrunner and Mücke). Each input coordinate is perturbed
// by an infinitesimal amount chosen so that no three perturbed points are
// ever exactly coplanar, while preserving all prior orderings. The points
// must be sorted in lexicographically increasing order, and no two points
// may be equal.
//
// Since the perturbations decrease in magnitude extremely fast, the sign of
// the perturbed determinant is given by the first non-zero term in a fixed
// sequence of sub-determinants below.
fn symbolically_perturbed_sign(
    a: &PreciseVector,
    b: &PreciseVector,
    c: &PreciseVector,
    b_cross_c: &PreciseVector,
) -> Direction {
    fn mul_sub(p: &BigRational, q: &BigRational, r: &BigRational, s: &BigRational) -> i32 {
        sign_of(&(p * q - r * s))
    }

    let mut det_sign = sign_of(&b_cross_c.z); // da[2]
    if det_sign != 0 {
        return det_sign.into();
    }
    det_sign = sign_of(&b_cross_c.y); // da[1]
    if det_sign != 0 {
        return det_sign.into();
    }
    det_sign = sign_of(&b_cross_c.x); // da[0]
    if det_sign != 0 {
        return det_sign.into();
    }

    det_sign = mul_sub(&c.x, &a.y, &c.y, &a.x); // db[2]
    if det_sign != 0 {
        return det_sign.into();
    }
    det_sign = sign_of(&c.x); // db[1]
    if det_sign != 0 {
        return det_sign.into();
    }
    det_sign = -sign_of(&c.y); // db[0]
    if det_sign != 0 {
        return det_sign.into();
    }

    det_sign = mul_sub(&c.z, &a.x, &c.x, &a.z); // dc[1]
    if det_sign != 0 {
        return det_sign.into();
    }
    det_sign = sign_of(&c.z); // dc[0]
    if det_sign != 0 {
        return det_sign.into();
    }

    // The following cases from the paper are redundant here: given the
    // lexicographic ordering, the first non-zero coordinate tests above
    // already cover them whenever c is non-degenerate.

    det_sign = mul_sub(&a.x, &b.y, &a.y, &b.x); // dd[2]
    if det_sign != 0 {
        return det_sign.into();
    }
    det_sign = -sign_of(&b.x);
    if det_sign != 0 {
        return det_sign.into();
    }
    det_sign = sign_of(&b.y);
    if det_sign != 0 {
        return det_sign.into();
    }
    det_sign = sign_of(&a.x);
    if det_sign != 0 {
        return det_sign.into();
    }
    Direction::CounterClockwise
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::r3::vector::Vector;

    fn p(x: f64, y: f64, z: f64) -> Point {
        Point(Vector::new(x, y, z).normalize())
    }

    #[test]
    fn sign_basic() {
        let a = p(1.0, 0.0, 0.0);
        let b = p(0.0, 1.0, 0.0);
        let c = p(0.0, 0.0, 1.0);
        assert!(sign(&a, &b, &c));
        assert!(!sign(&c, &b, &a));
        assert_eq!(Direction::CounterClockwise, robust_sign(&a, &b, &c));
        assert_eq!(Direction::Clockwise, robust_sign(&a, &c, &b));
        assert_eq!(Direction::Indeterminate, robust_sign(&a, &a, &b));
    }

    #[test]
    fn sign_cyclic_and_antisymmetric() {
        // Nearly collinear points along the equator.
        let a = p(1.0, 1e-10, 0.0);
        let b = p(1.0, 2e-10, 1e-14);
        let c = p(1.0, 3e-10, -1e-14);
        let d1 = robust_sign(&a, &b, &c);
        assert_ne!(Direction::Indeterminate, d1);
        assert_eq!(d1, robust_sign(&b, &c, &a));
        assert_eq!(d1, robust_sign(&c, &a, &b));
        assert_eq!(-d1, robust_sign(&c, &b, &a));
    }

    #[test]
    fn sign_collinear_resolved_symbolically() {
        // Exactly collinear (all on the z=0 great circle); the determinant
        // is exactly zero so the symbolic perturbation decides.
        let a = Point(Vector::new(1.0, 0.0, 0.0));
        let b = Point(Vector::new(0.0, 1.0, 0.0));
        let c = Point(Vector::new(-1.0 / 2f64.sqrt(), 1.0 / 2f64.sqrt(), 0.0));
        let d1 = robust_sign(&a, &b, &c);
        assert_ne!(Direction::Indeterminate, d1);
        assert_eq!(-d1, robust_sign(&c, &b, &a));
        assert_eq!(d1, robust_sign(&b, &c, &a));
    }

    #[test]
    fn stable_sign_wide_triangles() {
        let a = p(1.0, 0.1, 0.0);
        let b = p(0.0, 1.0, 0.1);
        let c = p(0.1, 0.0, 1.0);
        assert_eq!(stable_sign(&a, &b, &c), robust_sign(&a, &b, &c));
    }

    #[test]
    fn sign_random_triples_consistent() {
        use rand::{Rng, SeedableRng};
        let mut rng = rand::rngs::StdRng::seed_from_u64(17);
        for _ in 0..250 {
            let a = p(
                rng.gen::<f64>() - 0.5,
                rng.gen::<f64>() - 0.5,
                rng.gen::<f64>() - 0.5,
            );
            let b = p(
                rng.gen::<f64>() - 0.5,
                rng.gen::<f64>() - 0.5,
                rng.gen::<f64>() - 0.5,
            );
            let c = p(
                rng.gen::<f64>() - 0.5,
                rng.gen::<f64>() - 0.5,
                rng.gen::<f64>() - 0.5,
            );
            let d = robust_sign(&a, &b, &c);
            assert_ne!(Direction::Indeterminate, d);
            assert_eq!(d, robust_sign(&b, &c, &a));
            assert_eq!(d, robust_sign(&c, &a, &b));
            assert_eq!(-d, robust_sign(&c, &b, &a));
            assert_eq!(-d, robust_sign(&a, &c, &b));
        }
    }
}
