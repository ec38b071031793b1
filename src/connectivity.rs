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
//! Layer-pair adjacency driving the formation of connected clusters: shapes on
//! connected layers that touch each other belong to the same cluster.

use crate::layout::prelude::LayerIndex;

use std::collections::BTreeSet;

/// Symmetric layer-pair adjacency.
#[derive(Debug, Clone, Default)]
pub struct Connectivity {
    connections: BTreeSet<(LayerIndex, LayerIndex)>,
}

impl Connectivity {
    /// Create an empty connectivity (no layer connects to anything).
    pub fn new() -> Self {
        Default::default()
    }

    /// Declare a layer self-connected: shapes on this layer connect to each other.
    pub fn connect(&mut self, layer: LayerIndex) {
        self.connections.insert((layer, layer));
    }

    /// Declare two layers connected: shapes on `a` connect to shapes on `b`.
    /// The relation is symmetric; both layers also become part of the layer set.
    pub fn connect_layers(&mut self, a: LayerIndex, b: LayerIndex) {
        self.connections.insert((a.min(b), a.max(b)));
    }

    /// Tell whether shapes on layers `a` and `b` connect.
    pub fn connects(&self, a: LayerIndex, b: LayerIndex) -> bool {
        self.connections.contains(&(a.min(b), a.max(b)))
    }

    /// All layers participating in any connection, ascending.
    pub fn each_layer(&self) -> Vec<LayerIndex> {
        let mut layers = BTreeSet::new();
        for &(a, b) in &self.connections {
            layers.insert(a);
            layers.insert(b);
        }
        layers.into_iter().collect()
    }

    /// Tell if no connection was declared.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
