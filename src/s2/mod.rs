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

mod stuv;

pub mod cap;
pub mod cell;
pub mod cellid;

pub mod latlng;
pub mod point;
pub mod rect;
pub mod rect_bounder;

pub mod metric;
pub mod predicates;
pub mod region;

pub mod shape;

pub mod coder;
pub mod crossing_edge_query;
pub mod edge_clipping;
pub mod edge_crosser;
pub mod edge_crossings;
pub mod edge_distance;
pub mod padded_cell;
pub mod point_compression;
pub mod shape_index;

pub mod closest_edge_query;
pub mod loops;

pub use cap::Cap;
pub use cell::Cell;
pub use cellid::CellId;
pub use latlng::LatLng;
pub use loops::Loop;
pub use point::Point;
pub use rect::Rect;
