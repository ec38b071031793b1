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
//! The recursive shape iterator describes *what* to pull out of a source layout:
//! a top cell, a layer, an optional clip region and an optional hierarchy depth
//! limit. Its fingerprint keys the store's layout map, so two iterators with the
//! same parameters share one working layout.

use iron_shapes::rect::Rect;

use super::builder::HierarchyBuilder;
use super::errors::DeepStoreError;
use super::receivers::HierarchyBuilderShapeReceiver;
use crate::layout::prelude::{CellIndex, Coord, LayerIndex, Layout};

/// Recursive iterator configuration over the shapes of one layer of a source layout.
#[derive(Clone, Copy)]
pub struct RecursiveShapeIterator<'a> {
    layout: &'a Layout,
    top_cell: CellIndex,
    layer: LayerIndex,
    region: Option<Rect<Coord>>,
    max_depth: Option<usize>,
}

impl<'a> RecursiveShapeIterator<'a> {
    /// Create an iterator over all shapes of `layer` below `top_cell`.
    pub fn new(layout: &'a Layout, top_cell: CellIndex, layer: LayerIndex) -> Self {
        RecursiveShapeIterator {
            layout,
            top_cell,
            layer,
            region: None,
            max_depth: None,
        }
    }

    /// Restrict the iterator to a clip region (in top cell coordinates).
    pub fn with_region(mut self, region: Rect<Coord>) -> Self {
        self.region = Some(region);
        self
    }

    /// Limit the number of hierarchy levels below the top cell that are entered.
    /// `0` iterates only the shapes of the top cell itself.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Get the source layout.
    pub fn layout(&self) -> &'a Layout {
        self.layout
    }

    /// Get the top cell.
    pub fn top_cell(&self) -> CellIndex {
        self.top_cell
    }

    /// Get the iterated layer.
    pub fn layer(&self) -> LayerIndex {
        self.layer
    }

    /// Get the clip region, if any.
    pub fn region(&self) -> Option<Rect<Coord>> {
        self.region
    }

    /// Get the hierarchy depth limit, if any.
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// The fingerprint captures every distinguishing parameter of the iterator,
    /// including the identity of the source layout.
    pub fn fingerprint(&self) -> IterFingerprint {
        IterFingerprint {
            layout_id: self.layout.layout_id(),
            top_cell: self.top_cell,
            layer: self.layer,
            region: self.region.map(|r| {
                let (ll, ur) = (r.lower_left(), r.upper_right());
                (ll.x, ll.y, ur.x, ur.y)
            }),
            max_depth: self.max_depth,
        }
    }

    /// Drive a hierarchy builder with the shapes of this iterator. Every shape
    /// passes through the given receiver chain.
    pub fn push(
        &self,
        builder: &mut HierarchyBuilder,
        working: &Layout,
        receiver: &mut dyn HierarchyBuilderShapeReceiver,
    ) -> Result<(), DeepStoreError> {
        builder.build_from_iter(working, self, receiver)
    }
}

/// Hashable, orderable identity of a `RecursiveShapeIterator` configuration.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IterFingerprint {
    layout_id: u64,
    top_cell: CellIndex,
    layer: LayerIndex,
    region: Option<(Coord, Coord, Coord, Coord)>,
    max_depth: Option<usize>,
}
