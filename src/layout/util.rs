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
//! Utility functions for copying shapes between layouts.

use fnv::FnvHashMap;
use log::debug;

use super::cell_mapping::CellMapping;
use super::geometry::Geometry;
use super::layout::Layout;
use super::repository::PropertySet;
use super::transform::CplxTrans;
use super::types::{CellIndex, LayerIndex, PropertiesId};

use std::collections::BTreeSet;

/// Re-intern a geometry payload into the repositories of the target layout.
/// Polygon references get shared bodies in the target's shape repository.
pub fn import_geometry(target: &Layout, geometry: &Geometry, trans: &CplxTrans) -> Geometry {
    let transformed = if trans.is_identity() {
        geometry.clone()
    } else {
        geometry.transformed(trans)
    };
    match transformed {
        Geometry::PolygonRef(p) => {
            let interned = target.shape_repository().intern(p.as_ref().clone());
            Geometry::PolygonRef(interned)
        }
        other => other,
    }
}

/// Translate an interned property set from one layout's repository into another's.
pub fn import_properties(
    source: &Layout,
    target: &Layout,
    properties_id: PropertiesId,
) -> Option<PropertiesId> {
    let set = source.properties_repository().properties(properties_id)?;
    let mut imported = PropertySet::new();
    for (name_id, value) in set.each_property() {
        let name = source.properties_repository().property_name(name_id)?;
        let target_name_id = target.properties_repository().property_name_id(name);
        imported.insert(target_name_id, value.clone());
    }
    Some(target.properties_repository().properties_id(imported))
}

/// Copy shapes of the given source cells (and all cells below them) into the
/// target layout.
///
/// `trans` is applied to every shape (cell-locally; instance transformations are
/// assumed compatible). `mapping` decides which target cell receives the shapes
/// of a source cell; unmapped source cells are skipped. `layer_map` lists the
/// source layers to copy and their target layers.
pub fn copy_shapes(
    target: &Layout,
    source: &Layout,
    trans: &CplxTrans,
    source_cells: &[CellIndex],
    mapping: &CellMapping,
    layer_map: &FnvHashMap<LayerIndex, LayerIndex>,
) {
    let mut all_cells: BTreeSet<CellIndex> = BTreeSet::new();
    for &sc in source_cells {
        all_cells.extend(source.collect_called_cells(sc));
    }

    debug!(
        "copy_shapes: {} cells, {} layers",
        all_cells.len(),
        layer_map.len()
    );

    for &sc in &all_cells {
        let target_cell_index = match mapping.target_for(sc) {
            Some(tc) => tc,
            None => continue,
        };
        let source_cell = match source.cell_by_index(sc) {
            Some(c) => c,
            None => continue,
        };
        let target_cell = target
            .cell_by_index(target_cell_index)
            .expect("Cell mapping points to an invalid target cell.");

        let mut layers: Vec<_> = layer_map.iter().collect();
        layers.sort();
        for (&source_layer, &target_layer) in layers {
            let shapes = match source_cell.shapes(source_layer) {
                Some(s) => s,
                None => continue,
            };
            if shapes.is_empty() {
                continue;
            }
            let target_shapes = target_cell.shapes_get_or_create(target_layer);
            shapes.for_each_shape(|s| {
                let geometry = import_geometry(target, &s.geometry, trans);
                match s
                    .properties_id()
                    .and_then(|pid| import_properties(source, target, pid))
                {
                    Some(pid) => target_shapes.insert_with_properties(geometry, pid),
                    None => target_shapes.insert(geometry),
                };
            });
        }
    }
}
