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
//! A `CellMapping` maps cells of a source layout onto cells of a target layout.
//! It is the backbone of shape delivery: shapes of a mapped source cell land in
//! the corresponding target cell.
//!
//! Mappings can be built three ways: as a trivial single-cell alignment, by
//! geometric matching (hashing cell contents and the instance graph), or cell by
//! cell through `map`. `create_missing_mapping` completes any mapping by
//! synthesizing fresh target cells, including their instantiation.

use fnv::FnvHashMap;
use iron_shapes::traits::TryBoundingBox;

use super::layout::Layout;
use super::types::CellIndex;

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

/// Mapping from cells of one layout to cells of another layout.
#[derive(Debug, Clone, Default)]
pub struct CellMapping {
    table: FnvHashMap<CellIndex, CellIndex>,
}

impl CellMapping {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Default::default()
    }

    /// Record that source cell `from` maps to target cell `to`.
    pub fn map(&mut self, from: CellIndex, to: CellIndex) {
        self.table.insert(from, to);
    }

    /// Get the target cell for a source cell.
    pub fn target_for(&self, source: CellIndex) -> Option<CellIndex> {
        self.table.get(&source).copied()
    }

    /// Get the full mapping table.
    pub fn table(&self) -> &FnvHashMap<CellIndex, CellIndex> {
        &self.table
    }

    /// Tell if no cell is mapped.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Align the source top cell with the given target cell. Subcells are not
    /// mapped; they are created on demand by `create_missing_mapping`.
    pub fn create_single_mapping(
        &mut self,
        _target: &Layout,
        target_cell: CellIndex,
        _source: &Layout,
        source_top: CellIndex,
    ) {
        self.map(source_top, target_cell);
    }

    /// Map cells by geometric matching: cells whose content signature (shape
    /// bounding boxes and instance graph, hashed bottom-up) is unique on both
    /// sides and identical are paired. The tops are always paired.
    pub fn create_from_geometry(
        &mut self,
        target: &Layout,
        target_cell: CellIndex,
        source: &Layout,
        source_top: CellIndex,
    ) {
        self.map(source_top, target_cell);

        let source_sigs = cell_signatures(source, source_top);
        let target_sigs = cell_signatures(target, target_cell);

        let mut source_by_sig: BTreeMap<u64, Vec<CellIndex>> = BTreeMap::new();
        for (&cell, &sig) in &source_sigs {
            source_by_sig.entry(sig).or_default().push(cell);
        }
        let mut target_by_sig: BTreeMap<u64, Vec<CellIndex>> = BTreeMap::new();
        for (&cell, &sig) in &target_sigs {
            target_by_sig.entry(sig).or_default().push(cell);
        }

        for (sig, source_cells) in &source_by_sig {
            if source_cells.len() != 1 || source_cells[0] == source_top {
                continue;
            }
            if let Some(target_cells) = target_by_sig.get(sig) {
                if target_cells.len() == 1 {
                    self.map(source_cells[0], target_cells[0]);
                }
            }
        }
    }

    /// Geometric matching followed by creation of all cells that could not be
    /// matched.
    pub fn create_from_geometry_full(
        &mut self,
        target: &Layout,
        target_cell: CellIndex,
        source: &Layout,
        source_top: CellIndex,
    ) {
        self.create_from_geometry(target, target_cell, source, source_top);
        self.create_missing_mapping(target, target_cell, source, source_top, None);
    }

    /// Create fresh target cells for all source cells reachable from `source_top`
    /// which are not mapped yet (and not excluded). The new cells are instantiated
    /// in the images of their source parents, so delivered shapes stay connected
    /// to the target hierarchy.
    pub fn create_missing_mapping(
        &mut self,
        target: &Layout,
        _target_cell: CellIndex,
        source: &Layout,
        source_top: CellIndex,
        excluded_cells: Option<&BTreeSet<CellIndex>>,
    ) {
        let reachable = source.collect_called_cells(source_top);

        let mut new_cells: BTreeSet<CellIndex> = BTreeSet::new();
        for &sc in &reachable {
            if self.table.contains_key(&sc) {
                continue;
            }
            if excluded_cells.map(|e| e.contains(&sc)).unwrap_or(false) {
                continue;
            }
            let name = source.cell_name_or_default(sc);
            let tc = target.create_cell_with_unique_name(&name);
            self.map(sc, tc);
            new_cells.insert(sc);
        }

        // Replicate the instantiation of the new cells in the images of their
        // source parents.
        for &parent in &reachable {
            let parent_image = match self.target_for(parent) {
                Some(p) => p,
                None => continue,
            };
            if let Some(parent_cell) = source.cell_by_index(parent) {
                for inst in parent_cell.each_inst() {
                    if new_cells.contains(&inst.cell()) {
                        if let Some(child_image) = self.target_for(inst.cell()) {
                            target.insert_cell_instance(
                                parent_image,
                                child_image,
                                inst.get_transform(),
                            );
                        }
                    }
                }
            }
        }
    }
}

/// Compute a content signature for every cell reachable from `top`.
///
/// The signature of a cell hashes the sorted bounding boxes of its shapes on all
/// layers together with the sorted signatures and transformations of its child
/// instances. Layer identities do not enter the signature since they are not
/// comparable across layouts.
fn cell_signatures(layout: &Layout, top: CellIndex) -> FnvHashMap<CellIndex, u64> {
    let reachable = layout.collect_called_cells(top);
    let mut signatures: FnvHashMap<CellIndex, u64> = Default::default();

    // Bottom-up: children first.
    let order: Vec<_> = layout
        .each_cell_top_down()
        .into_iter()
        .filter(|c| reachable.contains(c))
        .rev()
        .collect();

    for cell_index in order {
        let cell = match layout.cell_by_index(cell_index) {
            Some(c) => c,
            None => continue,
        };

        let mut boxes: Vec<(i32, i32, i32, i32)> = Vec::new();
        for layer in cell.each_used_layer() {
            if let Some(shapes) = cell.shapes(layer) {
                shapes.for_each_shape(|s| {
                    if let Some(b) = s.try_bounding_box() {
                        let (ll, ur) = (b.lower_left(), b.upper_right());
                        boxes.push((ll.x, ll.y, ur.x, ur.y));
                    }
                });
            }
        }
        boxes.sort();

        let mut children: Vec<(u64, i32, i32, u8, bool)> = cell
            .each_inst()
            .map(|inst| {
                let sig = signatures.get(&inst.cell()).copied().unwrap_or(0);
                let t = inst.get_transform();
                (
                    sig,
                    t.displacement().x,
                    t.displacement().y,
                    t.rotation(),
                    t.is_mirror(),
                )
            })
            .collect();
        children.sort();

        let mut hasher = DefaultHasher::new();
        boxes.hash(&mut hasher);
        children.hash(&mut hasher);
        signatures.insert(cell_index, hasher.finish());
    }

    signatures
}
