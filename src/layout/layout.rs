/*
 * Copyright (c) 2020-2022 Thomas Kramer.
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
//! A layout data structure represents chip geometries. It consists of a hierarchical
//! arrangement of `Cell`s. Each cell contains geometric primitives that are grouped
//! on layers.
//!
//! The layout is interior-mutable: shapes, cells and instances can be created through
//! a shared reference. This is what allows the deep shape store to hand out read
//! handles while privileged clients (the hierarchy builder, the device extractor)
//! keep annotating the same container.

use fnv::{FnvHashMap, FnvHashSet};
use iron_shapes::rect::Rect;
use iron_shapes::traits::TryBoundingBox;

use super::cell::Cell;
use super::cell_instance::CellInstance;
use super::errors::LayoutError;
use super::geometry::rect_union;
use super::repository::{PropertiesRepository, ShapeRepository};
use super::transform::CplxTrans;
use super::types::{
    CellIndex, CellIndexGenerator, Coord, LayerIndex, LayerIndexGenerator, UInt,
};
use crate::rc_string::RcString;

use std::cell::{Cell as StdCell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for process-wide unique layout identities.
static LAYOUT_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Meta-data of a layer.
#[derive(Clone, Hash, PartialEq, Eq, Debug)]
pub struct LayerInfo {
    /// Layer number.
    pub index: UInt,
    /// Data type number.
    pub datatype: UInt,
    /// Name of the layer.
    pub name: Option<RcString>,
}

/// Data structure which holds cells and cell instances.
///
/// # Examples
///
/// ```rust
/// use libreda_dss::prelude::*;
/// let layout = Layout::new();
/// ```
#[derive(Debug)]
pub struct Layout {
    /// Process-wide unique identity of this layout object.
    id: u64,
    /// Data-base unit. Size of a coordinate step in micrometers.
    dbu: StdCell<f64>,
    cells: RefCell<BTreeMap<CellIndex, Rc<Cell>>>,
    /// Counter for generating the next cell index.
    cell_index_generator: RefCell<CellIndexGenerator>,
    /// Lookup table for finding cells by name.
    cells_by_name: RefCell<HashMap<RcString, CellIndex>>,
    /// All layers present in this layout.
    layers: RefCell<BTreeSet<LayerIndex>>,
    /// Counter for generating the next layer index.
    layer_index_generator: RefCell<LayerIndexGenerator>,
    /// Lookup table for finding layers by index/datatype numbers.
    layers_by_index_datatype: RefCell<HashMap<(UInt, UInt), LayerIndex>>,
    layer_info: RefCell<FnvHashMap<LayerIndex, LayerInfo>>,
    /// Interned polygon bodies.
    shape_repository: ShapeRepository,
    /// Interned property names and property sets.
    properties: PropertiesRepository,
    /// Incremented on every change of the cell hierarchy (new cells, new instances).
    hier_generation: StdCell<u64>,
    /// Nesting depth of `LayoutLocker` guards.
    lock_depth: StdCell<u32>,
}

impl Default for Layout {
    fn default() -> Self {
        Self::new()
    }
}

impl Layout {
    /// Create a new and empty layout with a database unit of 0.001 (1 nm).
    pub fn new() -> Self {
        Layout {
            id: LAYOUT_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
            dbu: StdCell::new(0.001),
            cells: Default::default(),
            cell_index_generator: Default::default(),
            cells_by_name: Default::default(),
            layers: Default::default(),
            layer_index_generator: Default::default(),
            layers_by_index_datatype: Default::default(),
            layer_info: Default::default(),
            shape_repository: ShapeRepository::new(),
            properties: PropertiesRepository::new(),
            hier_generation: StdCell::new(0),
            lock_depth: StdCell::new(0),
        }
    }

    /// Get the process-wide unique identity of this layout object.
    pub fn layout_id(&self) -> u64 {
        self.id
    }

    /// Get the database unit in micrometers.
    pub fn dbu(&self) -> f64 {
        self.dbu.get()
    }

    /// Set the database unit in micrometers.
    pub fn set_dbu(&self, dbu: f64) {
        debug_assert!(dbu > 0.0, "Database unit must be positive.");
        self.dbu.set(dbu);
    }

    /// Get the polygon repository of this layout.
    pub fn shape_repository(&self) -> &ShapeRepository {
        &self.shape_repository
    }

    /// Get the property repository of this layout.
    pub fn properties_repository(&self) -> &PropertiesRepository {
        &self.properties
    }

    /// Current hierarchy generation. The value changes whenever a cell or a cell
    /// instance is created. Observers use it to detect stale cached cell mappings.
    pub fn hier_generation(&self) -> u64 {
        self.hier_generation.get()
    }

    fn touch_hierarchy(&self) {
        self.hier_generation.set(self.hier_generation.get() + 1);
    }

    // == Cells == //

    /// Create a new cell in this layout.
    /// Returns a handle to this cell.
    ///
    /// # Panics
    /// Panics if a cell with this name already exists.
    pub fn create_cell(&self, cell_name: Option<RcString>) -> CellIndex {
        if let Some(cell_name) = &cell_name {
            if self.cells_by_name.borrow().contains_key(cell_name) {
                panic!("Cell with this name already exists: {}", cell_name);
            }
        }

        let cell_index = self.cell_index_generator.borrow_mut().next();
        let cell = Rc::new(Cell::new(cell_name.clone(), cell_index));
        self.cells.borrow_mut().insert(cell_index, cell);
        if let Some(cell_name) = cell_name {
            self.cells_by_name.borrow_mut().insert(cell_name, cell_index);
        }
        self.touch_hierarchy();
        cell_index
    }

    /// Create a cell with a name derived from `base_name`, appending a counter
    /// if the name is taken.
    pub fn create_cell_with_unique_name(&self, base_name: &str) -> CellIndex {
        if !self.has_cell(base_name) {
            return self.create_cell(Some(base_name.into()));
        }
        let mut n = 1;
        loop {
            let candidate = format!("{}${}", base_name, n);
            if !self.has_cell(&candidate) {
                return self.create_cell(Some(candidate.into()));
            }
            n += 1;
        }
    }

    /// Find a cell by its index.
    pub fn cell_by_index(&self, cell_index: CellIndex) -> Option<Rc<Cell>> {
        self.cells.borrow().get(&cell_index).cloned()
    }

    /// Find a cell index by the cell name.
    /// Returns `None` if the cell name does not exist.
    pub fn cell_index_by_name(&self, cell_name: &str) -> Option<CellIndex> {
        self.cells_by_name.borrow().get(cell_name).copied()
    }

    /// Find a cell by its name.
    pub fn cell_by_name(&self, cell_name: &str) -> Option<Rc<Cell>> {
        self.cell_index_by_name(cell_name)
            // This `unwrap` should not fail if the indices are kept consistent.
            .map(|i| self.cell_by_index(i).unwrap())
    }

    /// Returns true iff a cell with this name exists.
    pub fn has_cell(&self, cell_name: &str) -> bool {
        self.cells_by_name.borrow().contains_key(cell_name)
    }

    /// Get the total number of cells in this layout.
    pub fn num_cells(&self) -> usize {
        self.cells.borrow().len()
    }

    /// Get the name of a cell, or a synthesized name based on the index if the
    /// cell is anonymous.
    pub fn cell_name_or_default(&self, cell_index: CellIndex) -> RcString {
        self.cell_by_index(cell_index)
            .and_then(|c| c.name())
            .unwrap_or_else(|| format!("CELL{}", cell_index).into())
    }

    /// Get all cell indices, ascending.
    pub fn each_cell(&self) -> Vec<CellIndex> {
        self.cells.borrow().keys().copied().collect()
    }

    /// Get the indices of all cells that are not instantiated by any other cell,
    /// ascending.
    pub fn top_cells(&self) -> Vec<CellIndex> {
        let cells = self.cells.borrow();
        let mut has_parent: FnvHashSet<CellIndex> = Default::default();
        for cell in cells.values() {
            for inst in cell.each_inst() {
                has_parent.insert(inst.cell());
            }
        }
        cells
            .keys()
            .copied()
            .filter(|c| !has_parent.contains(c))
            .collect()
    }

    /// Get all cell indices in deterministic top-down order: every cell comes
    /// before all cells it instantiates, ties are broken by ascending index.
    pub fn each_cell_top_down(&self) -> Vec<CellIndex> {
        let cells = self.cells.borrow();

        // Number of distinct parents per cell.
        let mut num_parents: BTreeMap<CellIndex, usize> =
            cells.keys().map(|&c| (c, 0)).collect();
        let mut children: BTreeMap<CellIndex, BTreeSet<CellIndex>> = Default::default();
        for (&parent, cell) in cells.iter() {
            let mut seen: BTreeSet<CellIndex> = Default::default();
            for inst in cell.each_inst() {
                if seen.insert(inst.cell()) {
                    *num_parents.get_mut(&inst.cell()).unwrap() += 1;
                    children.entry(parent).or_default().insert(inst.cell());
                }
            }
        }

        let mut ready: BTreeSet<CellIndex> = num_parents
            .iter()
            .filter(|(_, &n)| n == 0)
            .map(|(&c, _)| c)
            .collect();
        let mut order = Vec::with_capacity(cells.len());
        while let Some(&next) = ready.iter().next() {
            ready.remove(&next);
            order.push(next);
            if let Some(ch) = children.get(&next) {
                for &c in ch {
                    let n = num_parents.get_mut(&c).unwrap();
                    *n -= 1;
                    if *n == 0 {
                        ready.insert(c);
                    }
                }
            }
        }
        order
    }

    /// Collect the set of all cells reachable from `cell`, including `cell` itself.
    pub fn collect_called_cells(&self, cell: CellIndex) -> BTreeSet<CellIndex> {
        let mut result = BTreeSet::new();
        let mut stack = vec![cell];
        while let Some(c) = stack.pop() {
            if result.insert(c) {
                if let Some(cell) = self.cell_by_index(c) {
                    for inst in cell.each_inst() {
                        stack.push(inst.cell());
                    }
                }
            }
        }
        result
    }

    /// Insert a child cell instance into `parent`.
    ///
    /// # Panics
    /// Panics if the instance would create a cycle in the cell hierarchy or if
    /// one of the indices is invalid.
    pub fn insert_cell_instance(&self, parent: CellIndex, child: CellIndex, transform: CplxTrans) {
        assert!(
            self.cell_by_index(child).is_some(),
            "Child cell index is invalid."
        );
        assert!(
            !self.collect_called_cells(child).contains(&parent),
            "Cannot create recursive instances."
        );
        let parent_cell = self
            .cell_by_index(parent)
            .expect("Parent cell index is invalid.");
        parent_cell.insert_instance(CellInstance::new(child, transform));
        self.touch_hierarchy();
    }

    /// Compute the bounding box of a cell including all child instances.
    pub fn cell_bounding_box(&self, cell: CellIndex) -> Option<Rect<Coord>> {
        let mut memo: FnvHashMap<CellIndex, Option<Rect<Coord>>> = Default::default();
        self.cell_bounding_box_memo(cell, &mut memo)
    }

    fn cell_bounding_box_memo(
        &self,
        cell_index: CellIndex,
        memo: &mut FnvHashMap<CellIndex, Option<Rect<Coord>>>,
    ) -> Option<Rect<Coord>> {
        if let Some(bbox) = memo.get(&cell_index) {
            return *bbox;
        }
        let cell = self.cell_by_index(cell_index)?;

        let mut bbox: Option<Rect<Coord>> = None;
        for layer in cell.each_used_layer() {
            if let Some(shapes) = cell.shapes(layer) {
                if let Some(b) = shapes.try_bounding_box() {
                    bbox = Some(bbox.map(|a| rect_union(&a, &b)).unwrap_or(b));
                }
            }
        }
        for inst in cell.each_inst() {
            if let Some(child_bbox) = self.cell_bounding_box_memo(inst.cell(), memo) {
                let b = inst.get_transform().transform_rect(&child_bbox);
                bbox = Some(bbox.map(|a| rect_union(&a, &b)).unwrap_or(b));
            }
        }

        memo.insert(cell_index, bbox);
        bbox
    }

    // == Layers == //

    /// Create a new anonymous layer and return its index.
    pub fn insert_layer(&self) -> LayerIndex {
        let layer_index = self.layer_index_generator.borrow_mut().next();
        self.layers.borrow_mut().insert(layer_index);
        layer_index
    }

    /// Delete a layer: the layer index becomes invalid and all shapes stored on
    /// the layer are dropped.
    pub fn delete_layer(&self, layer_index: LayerIndex) {
        self.layers.borrow_mut().remove(&layer_index);
        if let Some(info) = self.layer_info.borrow_mut().remove(&layer_index) {
            self.layers_by_index_datatype
                .borrow_mut()
                .remove(&(info.index, info.datatype));
        }
        for cell in self.cells.borrow().values() {
            cell.clear_layer(layer_index);
        }
    }

    /// Copy all shapes of layer `from` on top of layer `to`, cell by cell.
    pub fn copy_layer(&self, from: LayerIndex, to: LayerIndex) {
        if from == to {
            return;
        }
        for cell in self.cells.borrow().values() {
            if let Some(source) = cell.shapes(from) {
                if source.is_empty() {
                    continue;
                }
                let target = cell.shapes_get_or_create(to);
                source.for_each_shape(|s| {
                    match s.properties_id() {
                        Some(pid) => target.insert_with_properties(s.geometry.clone(), pid),
                        None => target.insert(s.geometry.clone()),
                    };
                });
            }
        }
    }

    /// Tell if the layer index is valid.
    pub fn is_valid_layer(&self, layer_index: LayerIndex) -> bool {
        self.layers.borrow().contains(&layer_index)
    }

    /// Get all layer indices, ascending.
    pub fn each_layer(&self) -> Vec<LayerIndex> {
        self.layers.borrow().iter().copied().collect()
    }

    /// Find layer index by the (index, data type) tuple.
    pub fn find_layer(&self, index: UInt, datatype: UInt) -> Option<LayerIndex> {
        self.layers_by_index_datatype
            .borrow()
            .get(&(index, datatype))
            .copied()
    }

    /// Find layer index by the (index, data type) tuple or create a new layer
    /// if nothing can be found.
    pub fn find_or_create_layer(&self, index: UInt, datatype: UInt) -> LayerIndex {
        if let Some(layer) = self.find_layer(index, datatype) {
            return layer;
        }
        let layer_index = self.insert_layer();
        self.layers_by_index_datatype
            .borrow_mut()
            .insert((index, datatype), layer_index);
        let info = LayerInfo {
            index,
            datatype,
            name: None,
        };
        self.layer_info.borrow_mut().insert(layer_index, info);
        layer_index
    }

    /// Get the read-only layer info datastructure for the given layer.
    pub fn get_layer_info(&self, layer_index: LayerIndex) -> Option<LayerInfo> {
        self.layer_info.borrow().get(&layer_index).cloned()
    }

    /// Set the name of a layer. `None` indicates that the layer has no name.
    pub fn set_layer_name(&self, layer_index: LayerIndex, name: Option<RcString>) {
        if let Some(i) = self.layer_info.borrow_mut().get_mut(&layer_index) {
            i.name = name
        }
    }

    /// Rename a cell. Returns an error if the new name collides with an existing name
    /// or the cell index is invalid.
    pub fn rename_cell(
        &self,
        cell_index: CellIndex,
        new_name: Option<RcString>,
    ) -> Result<(), LayoutError> {
        let cell = self
            .cell_by_index(cell_index)
            .ok_or(LayoutError::CellIndexNotFound)?;
        let old_name = cell.name();
        if new_name == old_name {
            return Ok(());
        }
        if let Some(new_name) = &new_name {
            if self.cells_by_name.borrow().contains_key(new_name) {
                return Err(LayoutError::CellNameAlreadyExists(new_name.clone()));
            }
        }
        cell.set_name(new_name.clone());
        if let Some(old_name) = old_name {
            self.cells_by_name.borrow_mut().remove(&old_name);
        }
        if let Some(new_name) = new_name {
            self.cells_by_name.borrow_mut().insert(new_name, cell_index);
        }
        Ok(())
    }

}

/// Scoped lock marking a layout as under hierarchical mutation. The lock nests;
/// it is released when the guard is dropped, on all exit paths.
pub struct LayoutLocker<'a> {
    layout: &'a Layout,
}

impl<'a> LayoutLocker<'a> {
    /// Lock the layout for hierarchical mutation.
    pub fn new(layout: &'a Layout) -> Self {
        layout.lock_depth.set(layout.lock_depth.get() + 1);
        LayoutLocker { layout }
    }
}

impl<'a> Drop for LayoutLocker<'a> {
    fn drop(&mut self) {
        self.layout.lock_depth.set(self.layout.lock_depth.get() - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iron_shapes::point::Point;

    #[test]
    fn test_create_cells_and_find_by_name() {
        let layout = Layout::new();
        let top = layout.create_cell(Some("TOP".into()));
        assert_eq!(layout.cell_index_by_name("TOP"), Some(top));
        assert!(layout.has_cell("TOP"));
        assert_eq!(layout.num_cells(), 1);
        assert_eq!(layout.cell_by_index(top).unwrap().name(), Some("TOP".into()));
    }

    #[test]
    #[should_panic(expected = "Cannot create recursive instances.")]
    fn test_no_recursive_instances() {
        let layout = Layout::new();
        let top = layout.create_cell(Some("TOP".into()));
        let sub = layout.create_cell(Some("SUB".into()));
        layout.insert_cell_instance(top, sub, CplxTrans::identity());
        layout.insert_cell_instance(sub, top, CplxTrans::identity());
    }

    #[test]
    fn test_top_down_order() {
        let layout = Layout::new();
        let top = layout.create_cell(Some("TOP".into()));
        let a = layout.create_cell(Some("A".into()));
        let b = layout.create_cell(Some("B".into()));
        layout.insert_cell_instance(top, a, CplxTrans::identity());
        layout.insert_cell_instance(a, b, CplxTrans::identity());
        assert_eq!(layout.each_cell_top_down(), vec![top, a, b]);
        assert_eq!(layout.top_cells(), vec![top]);
    }

    #[test]
    fn test_hier_generation_changes() {
        let layout = Layout::new();
        let g0 = layout.hier_generation();
        let top = layout.create_cell(Some("TOP".into()));
        assert_ne!(layout.hier_generation(), g0);
        let sub = layout.create_cell(Some("SUB".into()));
        let g1 = layout.hier_generation();
        layout.insert_cell_instance(top, sub, CplxTrans::identity());
        assert_ne!(layout.hier_generation(), g1);
    }

    #[test]
    fn test_copy_layer_and_delete_layer() {
        let layout = Layout::new();
        let top = layout.create_cell(Some("TOP".into()));
        let l1 = layout.insert_layer();
        let l2 = layout.insert_layer();
        let cell = layout.cell_by_index(top).unwrap();
        cell.shapes_get_or_create(l1)
            .insert(Rect::new(Point::new(0, 0), Point::new(10, 10)));
        layout.copy_layer(l1, l2);
        assert_eq!(cell.shapes(l2).unwrap().len(), 1);
        layout.delete_layer(l1);
        assert!(!layout.is_valid_layer(l1));
        assert!(cell.shapes(l1).is_none());
        assert_eq!(cell.shapes(l2).unwrap().len(), 1);
    }

    #[test]
    fn test_cell_bounding_box_with_instances() {
        let layout = Layout::new();
        let top = layout.create_cell(Some("TOP".into()));
        let sub = layout.create_cell(Some("SUB".into()));
        let layer = layout.insert_layer();
        layout
            .cell_by_index(sub)
            .unwrap()
            .shapes_get_or_create(layer)
            .insert(Rect::new(Point::new(0, 0), Point::new(10, 10)));
        layout.insert_cell_instance(
            top,
            sub,
            CplxTrans::translation(iron_shapes::vector::Vector::new(100, 0)),
        );
        let bbox = layout.cell_bounding_box(top).unwrap();
        assert_eq!(bbox, Rect::new(Point::new(100, 0), Point::new(110, 10)));
    }
}
