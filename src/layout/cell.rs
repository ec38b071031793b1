/*
 * Copyright (c) 2020-2021 Thomas Kramer.
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
//! A cell is a container for geometric shapes and cell instances.

use fnv::FnvHashMap;
use genawaiter::rc::Gen;

use super::cell_instance::CellInstance;
use super::shape_collection::{Shape, Shapes};
use super::types::{CellIndex, LayerIndex};
use crate::rc_string::RcString;

use std::cell::RefCell;
use std::rc::Rc;

/// A `Cell` is a container for geometrical shapes organized on different layers.
/// Additionally to the geometrical shapes a cell can also contain instances of other cells.
#[derive(Debug)]
pub struct Cell {
    /// The index of this cell inside the layout.
    index: CellIndex,
    /// Cell name.
    name: RefCell<Option<RcString>>,
    /// Child cell instances, in insertion order.
    instances: RefCell<Vec<CellInstance>>,
    /// Mapping from layer indices to geometry data.
    shapes_map: RefCell<FnvHashMap<LayerIndex, Rc<Shapes>>>,
}

impl Cell {
    /// Create a new and empty cell.
    pub(crate) fn new(name: Option<RcString>, index: CellIndex) -> Self {
        Cell {
            index,
            name: RefCell::new(name),
            instances: Default::default(),
            shapes_map: Default::default(),
        }
    }

    /// Get the index of this cell.
    pub fn index(&self) -> CellIndex {
        self.index
    }

    /// Return the cell name if it is defined.
    pub fn name(&self) -> Option<RcString> {
        self.name.borrow().clone()
    }

    /// Set a new cell name and return the old name.
    /// This does not update the lookup table in the layout object.
    pub(crate) fn set_name(&self, name: Option<RcString>) -> Option<RcString> {
        self.name.replace(name)
    }

    /// Insert a child cell instance. Recursion checks are done by the layout.
    pub(crate) fn insert_instance(&self, cell_inst: CellInstance) {
        self.instances.borrow_mut().push(cell_inst);
    }

    /// Get the number of child instances.
    pub fn num_instances(&self) -> usize {
        self.instances.borrow().len()
    }

    /// Returns an iterator over all child instances, in insertion order.
    pub fn each_inst(&self) -> impl Iterator<Item = CellInstance> + '_ {
        // Using a generator makes it possible to return an iterator over a value
        // borrowed from a `RefCell`.
        let generator = Gen::new(|co| async move {
            for i in self.instances.borrow().iter().copied() {
                co.yield_(i).await;
            }
        });
        generator.into_iter()
    }

    /// Returns true if this cell does not contain any other cell instances.
    pub fn is_leaf(&self) -> bool {
        self.instances.borrow().is_empty()
    }

    /// Get the shapes object for the given layer.
    pub fn shapes(&self, layer_index: LayerIndex) -> Option<Rc<Shapes>> {
        self.shapes_map.borrow().get(&layer_index).cloned()
    }

    /// Get the shapes object for the given layer or create a new one when none exists
    /// for this index.
    pub fn shapes_get_or_create(&self, layer_index: LayerIndex) -> Rc<Shapes> {
        if let Some(shapes) = self.shapes(layer_index) {
            shapes
        } else {
            let shapes = Rc::new(Shapes::new());
            self.shapes_map
                .borrow_mut()
                .insert(layer_index, shapes.clone());
            shapes
        }
    }

    /// Returns an iterator over all shapes of a given layer.
    pub fn each_shape(&self, layer_index: LayerIndex) -> impl Iterator<Item = Rc<Shape>> + '_ {
        let generator = Gen::new(|co| async move {
            if let Some(shapes) = self.shapes(layer_index) {
                for s in shapes.each_shape() {
                    co.yield_(s).await;
                }
            }
        });
        generator.into_iter()
    }

    /// Remove all shapes from the given layer.
    pub fn clear_layer(&self, layer_index: LayerIndex) {
        self.shapes_map.borrow_mut().remove(&layer_index);
    }

    /// Return a `Vec` of all layers that contain at least one shape.
    pub fn each_used_layer(&self) -> Vec<LayerIndex> {
        let mut layers: Vec<_> = self
            .shapes_map
            .borrow()
            .iter()
            .filter(|(_idx, s)| !s.is_empty())
            .map(|(&i, _)| i)
            .collect();
        layers.sort();
        layers
    }
}
