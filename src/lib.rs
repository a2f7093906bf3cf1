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

//! Spherical geometry on the unit sphere.
//!
//! The central type is [`s2::loops::Loop`], a simple spherical polygon: a
//! closed chain of geodesic edges bounding a region of the sphere. Loops
//! support robust point containment, pairwise set relations (containment,
//! intersection, boundary comparison), area/centroid/curvature queries, and
//! lossless as well as compressed wire encodings.
//!
//! The supporting module tree mirrors the coordinate spaces involved:
//! `r1`/`r2`/`r3` are one-, two- and three-dimensional Cartesian helpers,
//! `s1` is the circle (angles and longitude intervals), and `s2` is the
//! sphere itself (points, cells, rectangles, edges, and the spatial index).

pub mod consts;
pub mod error;
pub mod options;

pub mod r1;
pub mod r2;
pub mod r3;
pub mod s1;
pub mod s2;

pub use crate::error::Error;
pub use crate::options::Options;
pub use crate::s2::loops::Loop;
