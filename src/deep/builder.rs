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
//! The hierarchy builder mirrors the reachable part of a source hierarchy into a
//! working layout. It owns the (multi-valued) source-to-working cell map and the
//! variant flags; the shapes themselves flow through a receiver chain.
//!
//! Cells that are only partially covered by a clip region are synthesized as
//! *clip variants*: separate working cells that are not back-mappable to a unique
//! source cell.

use fnv::{FnvHashMap, FnvHashSet};
use iron_shapes::rect::Rect;
use log::debug;

use super::errors::DeepStoreError;
use super::iter::RecursiveShapeIterator;
use super::receivers::{CellContext, HierarchyBuilderShapeReceiver};
use crate::layout::geometry::{rect_contains_rect, rect_intersection, rects_interact};
use crate::layout::prelude::{CellIndex, Coord, CplxTrans, LayerIndex, Layout, TryBoundingBox};

use std::collections::BTreeMap;

/// Key of the source-to-working cell map. A source cell can have several images:
/// the plain copy (`clip = None, slot = 0`), clip variants (distinct clip boxes)
/// and externally registered variants (distinct slots).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct CellMapKey {
    source: CellIndex,
    clip: Option<(Coord, Coord, Coord, Coord)>,
    slot: u32,
}

fn clip_key(clip: Option<Rect<Coord>>) -> Option<(Coord, Coord, Coord, Coord)> {
    clip.map(|r| {
        let (ll, ur) = (r.lower_left(), r.upper_right());
        (ll.x, ll.y, ur.x, ur.y)
    })
}

/// Mirrors a source hierarchy into a working layout under the control of a
/// receiver chain.
#[derive(Debug)]
pub struct HierarchyBuilder {
    /// Global transformation applied to the ingested geometry.
    trans: CplxTrans,
    /// Identity of the source layout, set on the first drive.
    source_layout_id: Option<u64>,
    /// Top cell of the source layout, set on the first drive.
    source_top_cell: Option<CellIndex>,
    /// Source cell (+ variant discriminator) to working cell.
    cell_map: BTreeMap<CellMapKey, CellIndex>,
    /// Working cells that were synthesized as variants.
    variants: FnvHashSet<CellIndex>,
    /// Next free slot per source cell for externally registered variants.
    variant_slots: FnvHashMap<CellIndex, u32>,
    /// Layer of the working layout currently receiving shapes.
    target_layer: Option<LayerIndex>,
    /// Cells already handled by the current drive. Working cells persist across
    /// drives, but every drive pushes shapes into a fresh target layer.
    visited: FnvHashSet<CellMapKey>,
}

impl HierarchyBuilder {
    /// Create a builder applying the given global transformation.
    pub fn new(trans: CplxTrans) -> Self {
        HierarchyBuilder {
            trans,
            source_layout_id: None,
            source_top_cell: None,
            cell_map: BTreeMap::new(),
            variants: Default::default(),
            variant_slots: Default::default(),
            target_layer: None,
            visited: Default::default(),
        }
    }

    /// Set the layer of the working layout that receives the shapes of the next drive.
    pub fn set_target_layer(&mut self, layer: Option<LayerIndex>) {
        self.target_layer = layer;
    }

    /// Identity of the source layout this builder mirrors, if it was driven already.
    pub fn source_layout_id(&self) -> Option<u64> {
        self.source_layout_id
    }

    /// Top cell of the source layout this builder mirrors, if it was driven already.
    pub fn source_top_cell(&self) -> Option<CellIndex> {
        self.source_top_cell
    }

    /// Tell whether a working cell was synthesized as a variant and hence cannot
    /// be mapped back to a unique source cell.
    pub fn is_variant(&self, working_cell: CellIndex) -> bool {
        self.variants.contains(&working_cell)
    }

    /// Register an externally created variant image of a source cell.
    /// Back-mapping will skip the variant and the source cell's other images.
    pub fn register_variant(&mut self, source_cell: CellIndex, variant_cell: CellIndex) {
        let slot = self.variant_slots.entry(source_cell).or_insert(1);
        self.cell_map.insert(
            CellMapKey {
                source: source_cell,
                clip: None,
                slot: *slot,
            },
            variant_cell,
        );
        *slot += 1;
        self.variants.insert(variant_cell);
    }

    /// Iterate over all `(source cell, working cell)` pairs, ordered by source cell.
    pub fn each_cell_map_entry(&self) -> impl Iterator<Item = (CellIndex, CellIndex)> + '_ {
        self.cell_map.iter().map(|(k, &w)| (k.source, w))
    }

    /// Drive the builder with the shapes of the given iterator. Every shape of
    /// the iterated layer passes through `receiver` into the working layout.
    pub fn build_from_iter(
        &mut self,
        working: &Layout,
        iter: &RecursiveShapeIterator<'_>,
        receiver: &mut dyn HierarchyBuilderShapeReceiver,
    ) -> Result<(), DeepStoreError> {
        let source = iter.layout();

        match self.source_layout_id {
            None => {
                self.source_layout_id = Some(source.layout_id());
                self.source_top_cell = Some(iter.top_cell());
            }
            Some(id) => {
                // One working layout mirrors exactly one source; the store keys
                // its layout map accordingly.
                debug_assert_eq!(id, source.layout_id());
            }
        }

        let target_layer = self.target_layer.ok_or_else(|| {
            DeepStoreError::BuilderFailure("no target layer set".to_string())
        })?;

        debug!(
            "building working hierarchy from cell {} of layout {}",
            iter.top_cell(),
            source.layout_id()
        );

        self.visited.clear();
        self.build_cell(
            working,
            source,
            iter,
            receiver,
            target_layer,
            iter.top_cell(),
            iter.region(),
            0,
        )
        .map(|_| ())
    }

    /// Build (or look up) the working image of a source cell and return its index.
    #[allow(clippy::too_many_arguments)]
    fn build_cell(
        &mut self,
        working: &Layout,
        source: &Layout,
        iter: &RecursiveShapeIterator<'_>,
        receiver: &mut dyn HierarchyBuilderShapeReceiver,
        target_layer: LayerIndex,
        source_cell: CellIndex,
        clip: Option<Rect<Coord>>,
        depth: usize,
    ) -> Result<CellIndex, DeepStoreError> {
        let key = CellMapKey {
            source: source_cell,
            clip: clip_key(clip),
            slot: 0,
        };
        // A working cell persists across drives; every drive fills a fresh
        // target layer, so shapes must be pushed once per drive and cell.
        let (working_cell_index, fresh_cell) = match self.cell_map.get(&key) {
            Some(&wc) => (wc, false),
            None => {
                let base_name = source.cell_name_or_default(source_cell);
                let wc = if clip.is_some() {
                    working.create_cell_with_unique_name(&format!("{}$CLIP_VAR", base_name))
                } else {
                    working.create_cell_with_unique_name(&base_name)
                };
                if clip.is_some() {
                    self.variants.insert(wc);
                }
                self.cell_map.insert(key, wc);
                (wc, true)
            }
        };
        if !self.visited.insert(key) {
            return Ok(working_cell_index);
        }

        let source_cell_ref = source
            .cell_by_index(source_cell)
            .ok_or(DeepStoreError::IndexOutOfRange)?;
        let working_cell = working
            .cell_by_index(working_cell_index)
            .expect("freshly created cell must exist");

        // The magnification and orientation part applies to every cell; the
        // displacement applies at the top level only.
        let shape_trans = if depth == 0 {
            self.trans
        } else {
            self.trans.without_displacement()
        };

        let ctx = CellContext {
            layout: working,
            cell: working_cell.clone(),
            target_layer,
            clip,
            shape_trans,
        };

        receiver.begin_cell(&ctx);
        if let Some(shapes) = source_cell_ref.shapes(iter.layer()) {
            shapes.for_each_shape(|s| {
                if let Some(clip) = clip {
                    let keep = s
                        .geometry
                        .try_bounding_box()
                        .map(|b| rects_interact(&b, &clip, true))
                        .unwrap_or(false);
                    if !keep {
                        return;
                    }
                }
                receiver.push(&s.geometry, &ctx);
            });
        }
        receiver.end_cell(&ctx);

        // Descend into instances.
        let descend = iter.max_depth().map(|d| depth < d).unwrap_or(true);
        if descend {
            for inst in source_cell_ref.each_inst() {
                let t = inst.get_transform();

                let child_clip = match clip {
                    None => None,
                    Some(clip) => {
                        let child_bbox = match source.cell_bounding_box(inst.cell()) {
                            Some(b) => b,
                            // Nothing to show below this instance.
                            None => continue,
                        };
                        let bbox_in_parent = t.transform_rect(&child_bbox);
                        if !rects_interact(&bbox_in_parent, &clip, true) {
                            continue;
                        }
                        if rect_contains_rect(&clip, &bbox_in_parent) {
                            None
                        } else {
                            let local_clip = t.inverted().transform_rect(&clip);
                            match rect_intersection(&local_clip, &child_bbox) {
                                Some(c) => Some(c),
                                None => continue,
                            }
                        }
                    }
                };

                let child = self.build_cell(
                    working,
                    source,
                    iter,
                    receiver,
                    target_layer,
                    inst.cell(),
                    child_clip,
                    depth + 1,
                )?;
                // Instances exist already when the cell was built by an earlier drive.
                if fresh_cell {
                    working.insert_cell_instance(
                        working_cell_index,
                        child,
                        self.map_instance_trans(&t, depth == 0),
                    );
                }
            }
        }

        Ok(working_cell_index)
    }

    /// Map a source instance transformation into working layout coordinates.
    ///
    /// Cell-local content is stored transformed by the orientation part `S` of
    /// the global transformation, so instances must be conjugated: `S t S^-1`.
    /// Top-level instances additionally receive the global displacement.
    fn map_instance_trans(&self, t: &CplxTrans, at_top: bool) -> CplxTrans {
        let s = self.trans.without_displacement();
        let conjugated = s.concat(t).concat(&s.inverted());
        if at_top {
            CplxTrans::translation(self.trans.displacement()).concat(&conjugated)
        } else {
            conjugated
        }
    }
}
