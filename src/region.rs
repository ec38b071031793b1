/*
 * Copyright (c) 2021-2022 Thomas Kramer.
 *
 * This file is part of LibrEDA
 * (see https://codeberg.org/libreda).
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */
//! A `Region` is a polygon set facade. It either owns its polygons directly
//! (*flat* region) or delegates to a refcounted layer of a working layout
//! (*deep* region). Deep regions are the handles operators pass around; flat
//! regions are used for materialized per-cluster geometry.

use iron_shapes::rect::Rect;
use iron_shapes::traits::TryBoundingBox;

use crate::deep::errors::DeepStoreError;
use crate::deep::layer::DeepLayer;
use crate::layout::geometry::rect_union;
use crate::layout::prelude::{CellIndex, Coord, CplxTrans, Layout, Polygon};

use std::rc::Rc;

enum RegionDelegate {
    Flat(Vec<Rc<Polygon>>),
    Deep(DeepLayer),
}

/// A set of polygons, either owned (flat) or backed by a deep layer.
pub struct Region {
    delegate: RegionDelegate,
}

impl Default for Region {
    fn default() -> Self {
        Self::new()
    }
}

impl Region {
    /// Create an empty flat region.
    pub fn new() -> Self {
        Region {
            delegate: RegionDelegate::Flat(Vec::new()),
        }
    }

    /// Create a region backed by a deep layer.
    pub fn from_deep_layer(deep_layer: DeepLayer) -> Self {
        Region {
            delegate: RegionDelegate::Deep(deep_layer),
        }
    }

    /// Tell if the region delegates to a deep layer.
    pub fn is_deep(&self) -> bool {
        matches!(self.delegate, RegionDelegate::Deep(_))
    }

    /// Get the backing deep layer, if any.
    pub fn deep_layer(&self) -> Option<&DeepLayer> {
        match &self.delegate {
            RegionDelegate::Deep(dl) => Some(dl),
            RegionDelegate::Flat(_) => None,
        }
    }

    /// Insert a polygon into a flat region.
    ///
    /// # Panics
    /// Panics when called on a deep region; deep regions are populated through
    /// the store, not shape by shape.
    pub fn insert<P: Into<Polygon>>(&mut self, polygon: P) {
        match &mut self.delegate {
            RegionDelegate::Flat(polygons) => polygons.push(Rc::new(polygon.into())),
            RegionDelegate::Deep(_) => {
                panic!("Cannot insert single shapes into a deep region.")
            }
        }
    }

    /// Get the polygons of the region. Deep regions are flattened on the fly.
    ///
    /// # Panics
    /// Panics if a deep region's store was dropped.
    pub fn polygons(&self) -> Vec<Rc<Polygon>> {
        match &self.delegate {
            RegionDelegate::Flat(polygons) => polygons.clone(),
            RegionDelegate::Deep(dl) => {
                let layout = dl
                    .layout()
                    .expect("store lost: cannot flatten a deep region");
                let mut out = Vec::new();
                if let Ok(top) = dl.initial_cell() {
                    collect_flat(&layout, top, dl, &CplxTrans::identity(), &mut out);
                }
                out
            }
        }
    }

    /// Iterate over the polygons of the region.
    pub fn each_polygon(&self) -> impl Iterator<Item = Rc<Polygon>> {
        self.polygons().into_iter()
    }

    /// Number of polygons (flattened count for deep regions).
    pub fn len(&self) -> usize {
        match &self.delegate {
            RegionDelegate::Flat(polygons) => polygons.len(),
            RegionDelegate::Deep(_) => self.polygons().len(),
        }
    }

    /// Tell if the region holds no polygons.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn collect_flat(
    layout: &Layout,
    cell_index: CellIndex,
    deep_layer: &DeepLayer,
    trans: &CplxTrans,
    out: &mut Vec<Rc<Polygon>>,
) {
    if let Some(cell) = layout.cell_by_index(cell_index) {
        if let Some(shapes) = cell.shapes(deep_layer.layer()) {
            shapes.for_each_shape(|s| {
                if let Some(p) = s.geometry.to_polygon() {
                    out.push(Rc::new(p.transformed(trans)));
                }
            });
        }
        for inst in cell.each_inst() {
            let t = trans.concat(&inst.get_transform());
            collect_flat(layout, inst.cell(), deep_layer, &t, out);
        }
    }
}

impl TryBoundingBox<Coord> for Region {
    fn try_bounding_box(&self) -> Option<Rect<Coord>> {
        self.polygons()
            .iter()
            .filter_map(|p| p.try_bounding_box())
            .reduce(|a, b| rect_union(&a, &b))
    }
}

impl From<DeepLayer> for Region {
    fn from(deep_layer: DeepLayer) -> Self {
        Region::from_deep_layer(deep_layer)
    }
}

impl TryFrom<&Region> for DeepLayer {
    type Error = DeepStoreError;

    /// Get a copy of the deep layer backing a region.
    /// Fails with `NotDeep` for flat regions.
    fn try_from(region: &Region) -> Result<Self, Self::Error> {
        region.deep_layer().cloned().ok_or(DeepStoreError::NotDeep)
    }
}

impl FromIterator<Polygon> for Region {
    fn from_iter<I: IntoIterator<Item = Polygon>>(iter: I) -> Self {
        let mut region = Region::new();
        for p in iter {
            region.insert(p);
        }
        region
    }
}
