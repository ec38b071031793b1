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
//! The deep shape store owns a family of working layouts and manages layer
//! lifetimes inside them by reference counting. Geometry enters through
//! `create_*_layer` factories driven by a recursive shape iterator, lives on
//! refcounted layers addressed by `DeepLayer` handles and leaves again through
//! `insert`/`insert_as_polygons` into arbitrary target layouts.

use fnv::FnvHashMap;
use log::debug;

use super::builder::HierarchyBuilder;
use super::errors::DeepStoreError;
use super::iter::{IterFingerprint, RecursiveShapeIterator};
use super::layer::DeepLayer;
use super::receivers::{
    ClippingReceiver, EdgeBuildingReceiver, EdgePairBuildingReceiver,
    PolygonRefBuildingReceiver, ReducingReceiver,
};
use crate::layout::prelude::{
    copy_shapes, CellIndex, CellMapping, Coord, CplxTrans, Geometry, LayerIndex, Layout,
    LayoutLocker,
};
use crate::rc_string::RcString;

use std::cell::{Cell as StdCell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Deref;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Process-wide count of live `DeepShapeStore` instances. Used by leak tests only.
static INSTANCE_COUNT: AtomicUsize = AtomicUsize::new(0);

/// One working layout together with its hierarchy builder and the per-layer
/// reference counts.
pub(crate) struct LayoutHolder {
    pub(crate) layout: Layout,
    pub(crate) builder: RefCell<HierarchyBuilder>,
    refs: StdCell<u32>,
    layer_refs: RefCell<FnvHashMap<LayerIndex, u32>>,
}

impl LayoutHolder {
    fn new(trans: &CplxTrans) -> Self {
        LayoutHolder {
            layout: Layout::new(),
            builder: RefCell::new(HierarchyBuilder::new(*trans)),
            refs: StdCell::new(0),
            layer_refs: RefCell::new(Default::default()),
        }
    }

    pub(crate) fn refs(&self) -> u32 {
        self.refs.get()
    }

    pub(crate) fn layer_ref_count(&self, layer: LayerIndex) -> u32 {
        self.layer_refs.borrow().get(&layer).copied().unwrap_or(0)
    }

    pub(crate) fn sum_layer_refs(&self) -> u32 {
        self.layer_refs.borrow().values().sum()
    }

    fn add_layer_ref(&self, layer: LayerIndex) {
        *self.layer_refs.borrow_mut().entry(layer).or_insert(0) += 1;
    }

    /// Returns `true` when the layer reached refcount zero and was deleted.
    fn remove_layer_ref(&self, layer: LayerIndex) -> bool {
        let mut layer_refs = self.layer_refs.borrow_mut();
        let count = layer_refs
            .get_mut(&layer)
            .expect("removing a reference from an unreferenced layer");
        assert!(*count > 0, "layer reference count underflow");
        *count -= 1;
        if *count == 0 {
            layer_refs.remove(&layer);
            drop(layer_refs);
            self.layout.delete_layer(layer);
            true
        } else {
            false
        }
    }
}

/// Shared read handle to a working layout of the store.
/// Dereferences to the `Layout`.
pub struct LayoutRef {
    holder: Rc<LayoutHolder>,
}

impl LayoutRef {
    pub(crate) fn from_holder(holder: Rc<LayoutHolder>) -> Self {
        LayoutRef { holder }
    }
}

impl Deref for LayoutRef {
    type Target = Layout;

    fn deref(&self) -> &Layout {
        &self.holder.layout
    }
}

/// Key of the delivery mapping cache: one entry per working layout and target
/// `(layout identity, cell)` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct DeliveryMappingCacheKey {
    layout_index: usize,
    target_layout_id: u64,
    target_cell: CellIndex,
}

#[derive(Default)]
struct DeliveryCache {
    mappings: HashMap<DeliveryMappingCacheKey, CellMapping>,
    /// Sum of the hierarchy generations of all live working layouts at the time
    /// the cache content was built.
    hier_snapshot: u64,
}

struct StoreState {
    /// Working layout slots. Destroyed slots are nulled, never reused, so layout
    /// indices stay stable for the life of the store.
    layouts: Vec<Option<Rc<LayoutHolder>>>,
    /// Iterator/transformation to layout index.
    layout_map: BTreeMap<(IterFingerprint, CplxTrans), usize>,
}

struct StoreConfig {
    threads: usize,
    max_area_ratio: f64,
    max_vertex_count: usize,
    text_enlargement: i32,
    text_property_name: Option<RcString>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            threads: 1,
            max_area_ratio: 3.0,
            max_vertex_count: 16,
            text_enlargement: -1,
            text_property_name: None,
        }
    }
}

/// Shared state behind a `DeepShapeStore`. `DeepLayer` handles keep a weak
/// back-reference to this; dropping the store invalidates all handles.
pub(crate) struct DssInner {
    state: RefCell<StoreState>,
    config: RefCell<StoreConfig>,
    delivery_cache: RefCell<DeliveryCache>,
    /// Guards the reference counting protocol of `add_ref`/`remove_ref`.
    lock: Mutex<()>,
}

impl DssInner {
    pub(crate) fn holder(&self, layout_index: usize) -> Result<Rc<LayoutHolder>, DeepStoreError> {
        self.state
            .borrow()
            .layouts
            .get(layout_index)
            .and_then(|slot| slot.clone())
            .ok_or(DeepStoreError::IndexOutOfRange)
    }

    pub(crate) fn add_ref(&self, layout_index: usize, layer: LayerIndex) {
        let _guard = self.lock.lock().expect("store lock poisoned");
        let holder = self
            .holder(layout_index)
            .expect("add_ref on an invalid layout slot");
        holder.refs.set(holder.refs.get() + 1);
        holder.add_layer_ref(layer);
    }

    pub(crate) fn remove_ref(&self, layout_index: usize, layer: LayerIndex) {
        let _guard = self.lock.lock().expect("store lock poisoned");
        let holder = self
            .holder(layout_index)
            .expect("remove_ref on an invalid layout slot");
        holder.remove_layer_ref(layer);
        assert!(holder.refs.get() > 0, "layout reference count underflow");
        holder.refs.set(holder.refs.get() - 1);
        if holder.refs.get() == 0 {
            // Null the slot; the index is not reused.
            drop(holder);
            self.state.borrow_mut().layouts[layout_index] = None;
        }
    }

    /// Build or look up the delivery mapping for `(layout_index, target, target_cell)`.
    pub(crate) fn cell_mapping_to_original_impl(
        &self,
        layout_index: usize,
        target: &Layout,
        target_cell: CellIndex,
        excluded_cells: Option<&BTreeSet<CellIndex>>,
    ) -> Result<CellMapping, DeepStoreError> {
        let holder = self.holder(layout_index)?;
        let source_layout = &holder.layout;

        if source_layout.num_cells() == 0 {
            // Empty source: nothing to map.
            return Ok(CellMapping::new());
        }
        let source_top = initial_cell_of(source_layout)?;

        // Drop stale cache content.
        let snapshot = self.hier_snapshot();
        {
            let mut cache = self.delivery_cache.borrow_mut();
            if cache.hier_snapshot != snapshot {
                cache.mappings.clear();
                cache.hier_snapshot = snapshot;
            }
            let key = DeliveryMappingCacheKey {
                layout_index,
                target_layout_id: target.layout_id(),
                target_cell,
            };
            if let Some(cm) = cache.mappings.get(&key) {
                return Ok(cm.clone());
            }
        }

        let builder = holder.builder.borrow();
        let mut cm = CellMapping::new();

        if builder.source_layout_id() == Some(target.layout_id())
            && builder.source_top_cell() == Some(target_cell)
        {
            // Delivery back into the original layout: use the builder's cell map.
            // Source cells with several working images or variant images cannot
            // be mapped and fall through to the missing mapping pass.
            let entries: Vec<_> = builder.each_cell_map_entry().collect();
            let mut i = 0;
            while i < entries.len() {
                let (source_cell, working_cell) = entries[i];
                let mut j = i + 1;
                while j < entries.len() && entries[j].0 == source_cell {
                    j += 1;
                }
                let unique = j - i == 1;
                if unique && !builder.is_variant(working_cell) {
                    cm.map(working_cell, source_cell);
                }
                i = j;
            }
        } else if target.num_cells() == 1 {
            cm.create_single_mapping(target, target_cell, source_layout, source_top);
        } else {
            cm.create_from_geometry(target, target_cell, source_layout, source_top);
        }

        // Create target cells for variants and for cells added after the build,
        // e.g. by device extraction.
        cm.create_missing_mapping(target, target_cell, source_layout, source_top, excluded_cells);
        drop(builder);

        let key = DeliveryMappingCacheKey {
            layout_index,
            target_layout_id: target.layout_id(),
            target_cell,
        };
        // The missing-mapping pass may have created cells in the target; the
        // snapshot only tracks working layouts, so the cache entry stays valid.
        self.delivery_cache
            .borrow_mut()
            .mappings
            .insert(key, cm.clone());
        Ok(cm)
    }

    /// Deliver the shapes of `(layout_index, layer)` into the target layout.
    pub(crate) fn insert_impl(
        &self,
        layout_index: usize,
        layer: LayerIndex,
        target: &Layout,
        target_cell: CellIndex,
        target_layer: LayerIndex,
    ) -> Result<(), DeepStoreError> {
        let _locker = LayoutLocker::new(target);

        let holder = self.holder(layout_index)?;
        if holder.layout.num_cells() == 0 {
            return Ok(());
        }
        let source_top = initial_cell_of(&holder.layout)?;

        let trans = CplxTrans::magnifying(holder.layout.dbu() / target.dbu());

        let cm = self.cell_mapping_to_original_impl(layout_index, target, target_cell, None)?;

        let mut layer_map = FnvHashMap::default();
        layer_map.insert(layer, target_layer);

        copy_shapes(
            target,
            &holder.layout,
            &trans,
            &[source_top],
            &cm,
            &layer_map,
        );
        Ok(())
    }

    /// Deliver `(layout_index, layer)` converted to polygons: edge pairs become
    /// marker polygons, boxes and polygons pass as polygons, the rest is dropped.
    pub(crate) fn insert_as_polygons_impl(
        self: &Rc<Self>,
        deep_layer: &DeepLayer,
        target: &Layout,
        target_cell: CellIndex,
        target_layer: LayerIndex,
        enlargement: Coord,
    ) -> Result<(), DeepStoreError> {
        // Prepare a temporary layer with the polygon rendition.
        let tmp = deep_layer.derived()?;
        {
            let holder = self.holder(deep_layer.layout_index())?;
            let layout = &holder.layout;
            for cell_index in layout.each_cell() {
                let cell = match layout.cell_by_index(cell_index) {
                    Some(c) => c,
                    None => continue,
                };
                let source_shapes = match cell.shapes(deep_layer.layer()) {
                    Some(s) => s,
                    None => continue,
                };
                if source_shapes.is_empty() {
                    continue;
                }
                let out = cell.shapes_get_or_create(tmp.layer());
                source_shapes.for_each_shape(|s| {
                    let polygon = match &s.geometry {
                        Geometry::EdgePair(ep) => Some(ep.to_polygon(enlargement)),
                        other => other.to_polygon(),
                    };
                    if let Some(polygon) = polygon {
                        let interned = layout.shape_repository().intern(polygon);
                        out.insert(Geometry::PolygonRef(interned));
                    }
                });
            }
        }

        self.insert_impl(
            tmp.layout_index(),
            tmp.layer(),
            target,
            target_cell,
            target_layer,
        )
    }

    /// Combined hierarchy generation of all live working layouts. Changes
    /// whenever any working hierarchy changes (or a layout dies), which
    /// invalidates cached delivery mappings.
    fn hier_snapshot(&self) -> u64 {
        self.state
            .borrow()
            .layouts
            .iter()
            .enumerate()
            .map(|(i, slot)| match slot {
                Some(h) => (i as u64 + 1).wrapping_mul(h.layout.hier_generation() + 1),
                None => 0,
            })
            .fold(0u64, |acc, v| acc.wrapping_mul(31).wrapping_add(v))
    }

    fn invalidate_hier(&self) {
        let mut cache = self.delivery_cache.borrow_mut();
        cache.mappings.clear();
        cache.hier_snapshot = self.hier_snapshot();
    }
}

/// The deep shape store: a reference-counted family of working layouts.
///
/// Handle construction and destruction (`DeepLayer` clone/drop) are guarded by a
/// store-wide mutex; all other operations must be serialized by the caller.
pub struct DeepShapeStore {
    inner: Rc<DssInner>,
}

impl Default for DeepShapeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DeepShapeStore {
    fn drop(&mut self) {
        INSTANCE_COUNT.fetch_sub(1, Ordering::Relaxed);
    }
}

impl DeepShapeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        INSTANCE_COUNT.fetch_add(1, Ordering::Relaxed);
        DeepShapeStore {
            inner: Rc::new(DssInner {
                state: RefCell::new(StoreState {
                    layouts: Vec::new(),
                    layout_map: BTreeMap::new(),
                }),
                config: RefCell::new(Default::default()),
                delivery_cache: RefCell::new(Default::default()),
                lock: Mutex::new(()),
            }),
        }
    }

    /// Number of live `DeepShapeStore` instances in the process (for leak tests).
    pub fn instance_count() -> usize {
        INSTANCE_COUNT.load(Ordering::Relaxed)
    }

    // == Configuration == //

    /// Set the number of worker threads for downstream operators.
    pub fn set_threads(&mut self, threads: usize) {
        self.inner.config.borrow_mut().threads = threads;
    }

    /// Number of worker threads for downstream operators.
    pub fn threads(&self) -> usize {
        self.inner.config.borrow().threads
    }

    /// Set the default bounding box area to polygon area ratio above which
    /// polygons are decomposed.
    pub fn set_max_area_ratio(&mut self, max_area_ratio: f64) {
        self.inner.config.borrow_mut().max_area_ratio = max_area_ratio;
    }

    /// Default area ratio threshold.
    pub fn max_area_ratio(&self) -> f64 {
        self.inner.config.borrow().max_area_ratio
    }

    /// Set the default vertex count above which polygons are decomposed.
    pub fn set_max_vertex_count(&mut self, max_vertex_count: usize) {
        self.inner.config.borrow_mut().max_vertex_count = max_vertex_count;
    }

    /// Default vertex count threshold.
    pub fn max_vertex_count(&self) -> usize {
        self.inner.config.borrow().max_vertex_count
    }

    /// Set the text expansion. Texts become boxes spanning `enlargement`
    /// database units around their anchor; a negative value drops texts.
    pub fn set_text_enlargement(&mut self, enlargement: i32) {
        self.inner.config.borrow_mut().text_enlargement = enlargement;
    }

    /// Current text enlargement.
    pub fn text_enlargement(&self) -> i32 {
        self.inner.config.borrow().text_enlargement
    }

    /// Set the property name under which the original string is kept on
    /// text-expanded boxes. `None` drops the string.
    pub fn set_text_property_name(&mut self, name: Option<RcString>) {
        self.inner.config.borrow_mut().text_property_name = name;
    }

    /// Current text property name.
    pub fn text_property_name(&self) -> Option<RcString> {
        self.inner.config.borrow().text_property_name.clone()
    }

    // == Layout access == //

    /// Tell if the store holds exactly one working layout slot.
    pub fn is_singular(&self) -> bool {
        self.inner.state.borrow().layouts.len() == 1
    }

    /// Fail with `NotSingular` unless exactly one working layout slot exists.
    /// Operators that need a single common hierarchy call this first.
    pub fn require_singular(&self) -> Result<(), DeepStoreError> {
        if self.is_singular() {
            Ok(())
        } else {
            Err(DeepStoreError::NotSingular)
        }
    }

    /// Tell if `n` is the index of a live working layout.
    pub fn is_valid_layout_index(&self, n: usize) -> bool {
        self.inner
            .state
            .borrow()
            .layouts
            .get(n)
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    /// Number of working layout slots (live and nulled).
    pub fn num_layout_slots(&self) -> usize {
        self.inner.state.borrow().layouts.len()
    }

    /// Number of live working layouts.
    pub fn num_live_layouts(&self) -> usize {
        self.inner
            .state
            .borrow()
            .layouts
            .iter()
            .filter(|slot| slot.is_some())
            .count()
    }

    /// Get a read handle to working layout `n`.
    pub fn layout(&self, n: usize) -> Result<LayoutRef, DeepStoreError> {
        Ok(LayoutRef {
            holder: self.inner.holder(n)?,
        })
    }

    /// Get the initial (first top-down) cell of working layout `n`.
    /// Fails with `EmptyLayout` if the layout has no cells.
    pub fn initial_cell(&self, n: usize) -> Result<CellIndex, DeepStoreError> {
        let holder = self.inner.holder(n)?;
        initial_cell_of(&holder.layout)
    }

    /// Number of live `DeepLayer` handles into working layout `n`.
    pub fn layout_ref_count(&self, n: usize) -> Result<u32, DeepStoreError> {
        Ok(self.inner.holder(n)?.refs())
    }

    /// Sum of the per-layer reference counts of working layout `n`. Equals
    /// [`layout_ref_count`](Self::layout_ref_count) as long as the layout is alive.
    pub fn sum_layer_ref_counts(&self, n: usize) -> Result<u32, DeepStoreError> {
        Ok(self.inner.holder(n)?.sum_layer_refs())
    }

    // == Factories == //

    /// Resolve (or create) the working layout for an iterator/transformation pair.
    /// Equal pairs return the same index; indices of destroyed layouts are not reused.
    pub fn layout_for_iter(
        &mut self,
        iter: &RecursiveShapeIterator<'_>,
        trans: &CplxTrans,
    ) -> usize {
        let key = (iter.fingerprint(), *trans);
        let mut state = self.inner.state.borrow_mut();
        if let Some(&index) = state.layout_map.get(&key) {
            return index;
        }
        let layout_index = state.layouts.len();
        let holder = LayoutHolder::new(trans);
        holder
            .layout
            .set_dbu(iter.layout().dbu() / trans.mag());
        state.layouts.push(Some(Rc::new(holder)));
        state.layout_map.insert(key, layout_index);
        debug!("new working layout {}", layout_index);
        layout_index
    }

    /// Create a polygon layer from the iterated shapes. Shapes are clipped to
    /// the iterator region, oversized polygons are decomposed and the fragments
    /// are interned as polygon references.
    ///
    /// Zero-valued `max_area_ratio`/`max_vertex_count` default to the store settings.
    pub fn create_polygon_layer(
        &mut self,
        iter: &RecursiveShapeIterator<'_>,
        max_area_ratio: f64,
        max_vertex_count: usize,
        trans: &CplxTrans,
    ) -> Result<DeepLayer, DeepStoreError> {
        let (max_area_ratio, max_vertex_count) = {
            let config = self.inner.config.borrow();
            (
                if max_area_ratio == 0.0 {
                    config.max_area_ratio
                } else {
                    max_area_ratio
                },
                if max_vertex_count == 0 {
                    config.max_vertex_count
                } else {
                    max_vertex_count
                },
            )
        };
        let (text_enlargement, text_property_name) = {
            let config = self.inner.config.borrow();
            (config.text_enlargement, config.text_property_name.clone())
        };

        self.create_layer_with(iter, trans, move |builder, layout, it| {
            let mut refs = PolygonRefBuildingReceiver::new(text_enlargement, text_property_name);
            let mut red = ReducingReceiver::new(&mut refs, max_area_ratio, max_vertex_count);
            let mut clip = ClippingReceiver::new(&mut red);
            it.push(builder, layout, &mut clip)
        })
    }

    /// Create an edge layer from the iterated shapes. With `as_edges` the source
    /// shapes are taken as edges, otherwise polygon outlines are decomposed into
    /// their boundary edges.
    pub fn create_edge_layer(
        &mut self,
        iter: &RecursiveShapeIterator<'_>,
        as_edges: bool,
        trans: &CplxTrans,
    ) -> Result<DeepLayer, DeepStoreError> {
        self.create_layer_with(iter, trans, move |builder, layout, it| {
            let mut refs = EdgeBuildingReceiver::new(as_edges);
            it.push(builder, layout, &mut refs)
        })
    }

    /// Create an edge pair layer from the iterated shapes (used for pre-existing
    /// check results).
    pub fn create_edge_pair_layer(
        &mut self,
        iter: &RecursiveShapeIterator<'_>,
        trans: &CplxTrans,
    ) -> Result<DeepLayer, DeepStoreError> {
        self.create_layer_with(iter, trans, move |builder, layout, it| {
            let mut refs = EdgePairBuildingReceiver::new();
            it.push(builder, layout, &mut refs)
        })
    }

    fn create_layer_with<F>(
        &mut self,
        iter: &RecursiveShapeIterator<'_>,
        trans: &CplxTrans,
        drive: F,
    ) -> Result<DeepLayer, DeepStoreError>
    where
        F: FnOnce(
            &mut HierarchyBuilder,
            &Layout,
            &RecursiveShapeIterator<'_>,
        ) -> Result<(), DeepStoreError>,
    {
        let layout_index = self.layout_for_iter(iter, trans);
        let holder = self.inner.holder(layout_index)?;

        let layer_index = holder.layout.insert_layer();
        let mut builder = holder.builder.borrow_mut();
        builder.set_target_layer(Some(layer_index));

        let result = drive(&mut builder, &holder.layout, iter);

        // Unhook the receiver chain on all exit paths.
        builder.set_target_layer(None);
        drop(builder);

        match result {
            Ok(()) => Ok(DeepLayer::new(&self.inner, layout_index, layer_index)),
            Err(e) => {
                holder.layout.delete_layer(layer_index);
                Err(e)
            }
        }
    }

    // == Variants == //

    /// Register externally created cell variants: for each
    /// `original cell -> {transformation -> variant cell}` entry the variant is
    /// made known to the builder (so back-mapping skips it) and the delivery
    /// mapping cache is invalidated.
    pub fn issue_variants(
        &mut self,
        layout_index: usize,
        var_map: &BTreeMap<CellIndex, BTreeMap<CplxTrans, CellIndex>>,
    ) -> Result<(), DeepStoreError> {
        self.inner.invalidate_hier();
        let holder = self.inner.holder(layout_index)?;
        let mut builder = holder.builder.borrow_mut();
        for (&original, variants) in var_map {
            for (_trans, &variant) in variants {
                builder.register_variant(original, variant);
            }
        }
        Ok(())
    }

    // == Delivery == //

    /// Get the cell mapping used to deliver shapes of working layout
    /// `layout_index` into `(target, target_cell)`. Mappings are memoized;
    /// the memo is dropped whenever a working hierarchy changes.
    pub fn cell_mapping_to_original(
        &mut self,
        layout_index: usize,
        target: &Layout,
        target_cell: CellIndex,
        excluded_cells: Option<&BTreeSet<CellIndex>>,
    ) -> Result<CellMapping, DeepStoreError> {
        self.inner
            .cell_mapping_to_original_impl(layout_index, target, target_cell, excluded_cells)
    }

    /// Deliver the shapes of a deep layer into a target layout.
    ///
    /// The target is locked for hierarchical mutation for the duration of the
    /// call. Coordinates are rescaled by the database unit ratio. An empty
    /// working layout makes this a no-op.
    pub fn insert(
        &mut self,
        deep_layer: &DeepLayer,
        target: &Layout,
        target_cell: CellIndex,
        target_layer: LayerIndex,
    ) -> Result<(), DeepStoreError> {
        self.inner.insert_impl(
            deep_layer.layout_index(),
            deep_layer.layer(),
            target,
            target_cell,
            target_layer,
        )
    }

    /// Deliver the shapes of a deep layer as polygons: edge pairs become marker
    /// polygons (grown by `enlargement`), boxes and polygons pass as polygons,
    /// everything else is dropped.
    pub fn insert_as_polygons(
        &mut self,
        deep_layer: &DeepLayer,
        target: &Layout,
        target_cell: CellIndex,
        target_layer: LayerIndex,
        enlargement: Coord,
    ) -> Result<(), DeepStoreError> {
        self.inner
            .insert_as_polygons_impl(deep_layer, target, target_cell, target_layer, enlargement)
    }

}

pub(crate) fn initial_cell_of(layout: &Layout) -> Result<CellIndex, DeepStoreError> {
    layout
        .each_cell_top_down()
        .first()
        .copied()
        .ok_or(DeepStoreError::EmptyLayout)
}
