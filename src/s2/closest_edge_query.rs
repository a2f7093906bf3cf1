use crate::s1::Angle;
use crate::s2::edge_distance::{closest_point_on_edge, distance_from_segment};
use crate::s2::point::Point;
use crate::s2::shape::Shape;

/// ClosestEdgeQuery computes the distance from a point to the edges of a
/// shape, and the closest point on those edges. Distances are exact; the
/// query walks every edge, which is the right trade-off for shapes queried
/// a handful of times.
pub struct ClosestEdgeQuery<'a> {
    shape: &'a dyn Shape,
}

impl<'a> ClosestEdgeQuery<'a> {
    pub fn new(shape: &'a dyn Shape) -> ClosestEdgeQuery<'a> {
        ClosestEdgeQuery { shape }
    }

    /// Returns the angular distance from x to the nearest edge of the
    /// shape. Returns π for shapes with no edges.
    pub fn distance(&self, x: &Point) -> Angle {
        let mut min = Angle(std::f64::consts::PI);
        for e in 0..self.shape.num_edges() {
            let edge = self.shape.edge(e);
            let d = distance_from_segment(x, &edge.v0, &edge.v1);
            if d < min {
                min = d;
            }
        }
        min
    }

    /// Returns the closest point on any edge of the shape to x. The shape
    /// must have at least one edge.
    pub fn project(&self, x: &Point) -> Point {
        let mut best = self.shape.edge(0).v0;
        let mut min = Angle(f64::INFINITY);
        for e in 0..self.shape.num_edges() {
            let edge = self.shape.edge(e);
            let candidate = closest_point_on_edge(x, &edge.v0, &edge.v1);
            let d = x.distance(&candidate);
            if d < min {
                min = d;
                best = candidate;
            }
        }
        best
    }
}
