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

use crate::s2::point::Point;

/// Edge represents a geodesic edge consisting of two vertices. Zero-length
/// edges are allowed, and can be used to represent points.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Edge {
    pub v0: Point,
    pub v1: Point,
}

/// Chain represents a range of edge ids corresponding to a chain of
/// connected edges.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Chain {
    pub start: i32,
    pub length: i32,
}

/// ChainPosition represents the position of an edge within a given edge
/// chain.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ChainPosition {
    pub chain_id: i32,
    pub offset: i32,
}

/// ReferencePoint consists of a point and a boolean indicating whether the
/// point is contained by a particular shape.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ReferencePoint {
    pub point: Point,
    pub contained: bool,
}

impl ReferencePoint {
    /// Returns a ReferencePoint with the canonical origin point and the
    /// given containment.
    pub fn origin(contained: bool) -> ReferencePoint {
        ReferencePoint {
            point: Point::origin(),
            contained,
        }
    }
}

/// Shape represents polygonal geometry in a flexible way: as a collection of
/// edges that optionally defines an interior. All edges of a given shape
/// must have the same dimension.
pub trait Shape {
    /// Returns the number of edges in this shape.
    fn num_edges(&self) -> i32;

    /// Returns the edge for the given edge index.
    fn edge(&self, i: i32) -> Edge;

    /// Returns an arbitrary reference point for the shape, along with
    /// whether that point is contained by the shape. (The containment
    /// information lets point-in-shape tests start from a known state.)
    fn reference_point(&self) -> ReferencePoint;

    /// Returns the number of contiguous edge chains in the shape.
    fn num_chains(&self) -> i32;

    /// Returns the range of edge ids corresponding to the given chain.
    fn chain(&self, chain_id: i32) -> Chain;

    /// Returns the dimension of the geometry represented by this shape:
    /// 0 for points, 1 for polylines, 2 for polygons.
    fn dimension(&self) -> i32;

    /// Reports whether the shape defines an interior.
    fn has_interior(&self) -> bool {
        self.dimension() == 2
    }
}
