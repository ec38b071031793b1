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
//! `DeepLayer` is the value-typed handle naming one layer inside one working
//! layout of a deep shape store. Handles share ownership: cloning increments the
//! layout- and layer-level reference counts, dropping decrements them. When the
//! last handle into a working layout goes away the layout is destroyed and its
//! slot nulled.

use fnv::FnvHashMap;

use super::errors::DeepStoreError;
use super::store::{initial_cell_of, DssInner, LayoutRef};
use crate::layout::prelude::{
    copy_shapes, CellIndex, CellMapping, CplxTrans, LayerIndex,
};

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

/// Handle to one layer of one working layout inside a deep shape store.
///
/// The handle keeps a weak back-reference to the store; using a handle whose
/// store was dropped fails with [`DeepStoreError::StoreLost`].
pub struct DeepLayer {
    store: Weak<DssInner>,
    layout_index: usize,
    layer: LayerIndex,
}

impl DeepLayer {
    pub(crate) fn new(store: &Rc<DssInner>, layout_index: usize, layer: LayerIndex) -> Self {
        store.add_ref(layout_index, layer);
        DeepLayer {
            store: Rc::downgrade(store),
            layout_index,
            layer,
        }
    }

    /// Index of the working layout inside the store.
    pub fn layout_index(&self) -> usize {
        self.layout_index
    }

    /// Index of the layer inside the working layout.
    pub fn layer(&self) -> LayerIndex {
        self.layer
    }

    fn inner(&self) -> Result<Rc<DssInner>, DeepStoreError> {
        self.store.upgrade().ok_or(DeepStoreError::StoreLost)
    }

    /// Get a read handle to the working layout this layer lives in.
    pub fn layout(&self) -> Result<LayoutRef, DeepStoreError> {
        let inner = self.inner()?;
        let holder = inner.holder(self.layout_index)?;
        Ok(LayoutRef::from_holder(holder))
    }

    /// Get the initial (first top-down) cell of the working layout.
    pub fn initial_cell(&self) -> Result<CellIndex, DeepStoreError> {
        let inner = self.inner()?;
        let holder = inner.holder(self.layout_index)?;
        initial_cell_of(&holder.layout)
    }

    /// Derive a new, empty layer inside the same working layout. Operators use
    /// this to produce results in the same hierarchy.
    pub fn derived(&self) -> Result<DeepLayer, DeepStoreError> {
        let inner = self.inner()?;
        let holder = inner.holder(self.layout_index)?;
        let new_layer = holder.layout.insert_layer();
        Ok(DeepLayer::new(&inner, self.layout_index, new_layer))
    }

    /// Derive a new layer and fill it with a copy of all shapes of this layer.
    pub fn copy(&self) -> Result<DeepLayer, DeepStoreError> {
        let new_layer = self.derived()?;
        let inner = self.inner()?;
        let holder = inner.holder(self.layout_index)?;
        holder.layout.copy_layer(self.layer, new_layer.layer);
        Ok(new_layer)
    }

    /// Add the shapes of another deep layer to this layer.
    ///
    /// Within the same working layout this is a bulk layer copy. Across working
    /// layouts a cell mapping is built by geometric matching (creating missing
    /// cells) and the shapes are copied through it.
    pub fn add_from(&self, other: &DeepLayer) -> Result<(), DeepStoreError> {
        let inner = self.inner()?;
        let other_inner = other.inner()?;

        let same_store = Rc::ptr_eq(&inner, &other_inner);
        if same_store && self.layout_index == other.layout_index {
            // Intra-layout merge.
            let holder = inner.holder(self.layout_index)?;
            holder.layout.copy_layer(other.layer, self.layer);
            return Ok(());
        }

        // Inter-layout merge.
        let into_holder = inner.holder(self.layout_index)?;
        let source_holder = other_inner.holder(other.layout_index)?;
        let into_cell = initial_cell_of(&into_holder.layout)?;
        let source_cell = initial_cell_of(&source_holder.layout)?;

        let mut cm = CellMapping::new();
        cm.create_from_geometry_full(
            &into_holder.layout,
            into_cell,
            &source_holder.layout,
            source_cell,
        );

        let mut layer_map = FnvHashMap::default();
        layer_map.insert(other.layer, self.layer);

        let trans = CplxTrans::magnifying(source_holder.layout.dbu() / into_holder.layout.dbu());
        copy_shapes(
            &into_holder.layout,
            &source_holder.layout,
            &trans,
            &[source_cell],
            &cm,
            &layer_map,
        );
        Ok(())
    }

    /// Deliver the shapes of this layer into a target layout (see
    /// [`DeepShapeStore::insert`](super::store::DeepShapeStore::insert)).
    ///
    /// Like all store operations, calls must be serialized by the caller.
    pub fn insert_into(
        &self,
        target: &crate::layout::prelude::Layout,
        target_cell: CellIndex,
        target_layer: LayerIndex,
    ) -> Result<(), DeepStoreError> {
        let inner = self.inner()?;
        inner.insert_impl(self.layout_index, self.layer, target, target_cell, target_layer)
    }

    /// Deliver the shapes of this layer as polygons (see
    /// [`DeepShapeStore::insert_as_polygons`](super::store::DeepShapeStore::insert_as_polygons)).
    pub fn insert_into_as_polygons(
        &self,
        target: &crate::layout::prelude::Layout,
        target_cell: CellIndex,
        target_layer: LayerIndex,
        enlargement: crate::layout::prelude::Coord,
    ) -> Result<(), DeepStoreError> {
        let inner = self.inner()?;
        inner.insert_as_polygons_impl(self, target, target_cell, target_layer, enlargement)
    }

    /// Number of references the store holds for this layer (for tests and debugging).
    pub fn layer_ref_count(&self) -> Result<u32, DeepStoreError> {
        let inner = self.inner()?;
        let holder = inner.holder(self.layout_index)?;
        Ok(holder.layer_ref_count(self.layer))
    }
}

impl Clone for DeepLayer {
    fn clone(&self) -> Self {
        if let Some(inner) = self.store.upgrade() {
            inner.add_ref(self.layout_index, self.layer);
        }
        DeepLayer {
            store: self.store.clone(),
            layout_index: self.layout_index,
            layer: self.layer,
        }
    }
}

impl Drop for DeepLayer {
    fn drop(&mut self) {
        if let Some(inner) = self.store.upgrade() {
            inner.remove_ref(self.layout_index, self.layer);
        }
    }
}

impl std::fmt::Debug for DeepLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepLayer")
            .field("layout_index", &self.layout_index)
            .field("layer", &self.layer)
            .finish()
    }
}

impl PartialEq for DeepLayer {
    fn eq(&self, other: &Self) -> bool {
        self.store.ptr_eq(&other.store)
            && self.layout_index == other.layout_index
            && self.layer == other.layer
    }
}

impl Eq for DeepLayer {}

impl Ord for DeepLayer {
    fn cmp(&self, other: &Self) -> Ordering {
        let key = (
            Weak::as_ptr(&self.store) as usize,
            self.layout_index,
            self.layer,
        );
        let other_key = (
            Weak::as_ptr(&other.store) as usize,
            other.layout_index,
            other.layer,
        );
        key.cmp(&other_key)
    }
}

impl PartialOrd for DeepLayer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for DeepLayer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Weak::as_ptr(&self.store) as usize).hash(state);
        self.layout_index.hash(state);
        self.layer.hash(state);
    }
}
