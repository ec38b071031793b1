// Copyright (c) 2020-2021 Thomas Kramer.
// SPDX-FileCopyrightText: 2022 Thomas Kramer
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The `prelude` helps to import most commonly used modules.

pub use super::cell::Cell;
pub use super::cell_instance::CellInstance;
pub use super::cell_mapping::CellMapping;
pub use super::errors::LayoutError;
pub use super::geometry::{Edge, EdgePair, Geometry, Polygon, Text};
pub use super::layout::{Layout, LayoutLocker, LayerInfo};
pub use super::repository::{
    PropertiesRepository, PropertyName, PropertyNameId, PropertySet, ShapeRepository,
};
pub use super::shape_collection::{Shape, Shapes};
pub use super::transform::CplxTrans;
pub use super::types::{
    AreaCoord, CellIndex, Coord, LayerIndex, PropertiesId, ShapeIndex, SInt, UInt,
};
pub use super::util::copy_shapes;

pub use iron_shapes::point::Point;
pub use iron_shapes::rect::Rect;
pub use iron_shapes::traits::TryBoundingBox;
pub use iron_shapes::vector::Vector;
