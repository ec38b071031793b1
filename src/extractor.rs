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
//! The hierarchical device extraction driver.
//!
//! The driver walks a working hierarchy cell by cell, forms connected clusters of
//! the device-defining shapes and hands the materialized per-cluster geometry to
//! a pluggable recognizer (the [`DeviceExtractorDelegate`]). Recognized devices
//! land in a [`Netlist`]; their terminals are written back into the working
//! layout as polygon references tagged with a `(device id, terminal id)`
//! property.
//!
//! The working layout is interior-mutable and the extractor is one of its
//! privileged clients: terminal annotation happens through the same shared
//! layout reference the rest of the store uses.

use fnv::FnvHashMap;
use iron_shapes::point::Point;
use iron_shapes::rect::Rect;
use log::debug;

use crate::clusters::HierClusters;
use crate::connectivity::Connectivity;
use crate::deep::errors::DeepStoreError;
use crate::deep::layer::DeepLayer;
use crate::deep::store::LayoutRef;
use crate::layout::prelude::{
    Cell, CellIndex, Coord, Geometry, LayerIndex, Layout, Polygon, PropertyName, PropertySet,
};
use crate::layout::repository::PropertyNameId;
use crate::netlist::prelude::{CircuitId, DeviceClass, DeviceClassId, DeviceId, Netlist};
use crate::region::Region;

use std::rc::Rc;

/// Geometry accepted by [`ExtractorCore::define_terminal`].
pub enum TerminalGeometry {
    /// A point. It is replaced by a 2x2 database unit square so that the
    /// terminal does not vanish after rasterization.
    Point(Point<Coord>),
    /// An axis-aligned box.
    Box(Rect<Coord>),
    /// A polygon.
    Polygon(Polygon),
}

impl From<Point<Coord>> for TerminalGeometry {
    fn from(p: Point<Coord>) -> Self {
        TerminalGeometry::Point(p)
    }
}

impl From<Rect<Coord>> for TerminalGeometry {
    fn from(r: Rect<Coord>) -> Self {
        TerminalGeometry::Box(r)
    }
}

impl From<Polygon> for TerminalGeometry {
    fn from(p: Polygon) -> Self {
        TerminalGeometry::Polygon(p)
    }
}

/// Extension points of the device extraction driver. Implementations recognize
/// one family of devices.
pub trait DeviceExtractorDelegate {
    /// Publish the device classes of this extractor through
    /// [`ExtractorCore::register_device_class`]. The default publishes nothing.
    fn create_device_classes(&mut self, _core: &mut ExtractorCore) {}

    /// Declare which of the input layers connect. The default connectivity is
    /// empty, producing no clusters.
    fn get_connectivity(&self, _layout: &Layout, _layers: &[LayerIndex]) -> Connectivity {
        Connectivity::new()
    }

    /// Recognize devices in the materialized geometry of one root cluster.
    /// `layer_geometry` holds one region per input layer. The default recognizes
    /// nothing.
    fn extract_devices(
        &mut self,
        _core: &mut ExtractorCore,
        _layout: &Layout,
        _layer_geometry: &[Region],
    ) {
    }
}

/// State shared between the driver and the delegate: the netlist under
/// construction, the registered device classes and the current extraction
/// position (cell and circuit).
pub struct ExtractorCore {
    netlist: Netlist,
    device_classes: Vec<DeviceClassId>,
    device_name_index: u64,
    propname_id: Option<PropertyNameId>,
    layers: Vec<LayerIndex>,
    current_circuit: Option<CircuitId>,
    current_cell: Option<Rc<Cell>>,
}

impl ExtractorCore {
    fn new(netlist: Netlist) -> Self {
        ExtractorCore {
            netlist,
            device_classes: Vec::new(),
            device_name_index: 0,
            propname_id: None,
            layers: Vec::new(),
            current_circuit: None,
            current_cell: None,
        }
    }

    /// The netlist under construction.
    pub fn netlist(&self) -> &Netlist {
        &self.netlist
    }

    /// Mutable access to the netlist under construction.
    pub fn netlist_mut(&mut self) -> &mut Netlist {
        &mut self.netlist
    }

    /// Publish a device class and index it for `create_device`.
    pub fn register_device_class(&mut self, device_class: DeviceClass) -> DeviceClassId {
        let id = self.netlist.add_device_class(device_class);
        self.device_classes.push(id);
        id
    }

    /// Create a device of the `class_index`-th registered class in the circuit
    /// of the cell currently being extracted. Device names are sequential
    /// numbers ("1", "2", ...).
    ///
    /// # Panics
    /// Panics when called outside an extraction run or with an invalid class index.
    pub fn create_device(&mut self, class_index: usize) -> DeviceId {
        let circuit = self
            .current_circuit
            .expect("create_device called outside of extraction");
        let class = *self
            .device_classes
            .get(class_index)
            .expect("invalid device class index");
        self.device_name_index += 1;
        self.netlist
            .add_device(circuit, class, self.device_name_index.to_string())
    }

    /// Attach a terminal to a device: the geometry is inserted into the working
    /// layout (on the `geometry_index`-th input layer of the current cell) as a
    /// polygon reference carrying a `(device id, terminal id)` property under
    /// the reserved terminal property name. Downstream network extraction
    /// recognizes terminals geometrically through this annotation.
    pub fn define_terminal<G: Into<TerminalGeometry>>(
        &mut self,
        layout: &Layout,
        device: DeviceId,
        terminal_id: usize,
        geometry_index: usize,
        geometry: G,
    ) {
        let polygon = match geometry.into() {
            TerminalGeometry::Point(p) => {
                // One database unit in every direction, to keep the terminal visible.
                Polygon::from_rect(&Rect::new(
                    Point::new(p.x - 1, p.y - 1),
                    Point::new(p.x + 1, p.y + 1),
                ))
            }
            TerminalGeometry::Box(b) => Polygon::from_rect(&b),
            TerminalGeometry::Polygon(p) => p,
        };

        let layer = *self
            .layers
            .get(geometry_index)
            .expect("invalid geometry index");
        let cell = self
            .current_cell
            .as_ref()
            .expect("define_terminal called outside of extraction");
        let propname_id = self
            .propname_id
            .expect("terminal property name not reserved");

        let mut set = PropertySet::new();
        set.insert(propname_id, (device.value(), terminal_id as u64));
        let pid = layout.properties_repository().properties_id(set);

        let interned = layout.shape_repository().intern(polygon);
        cell.shapes_get_or_create(layer)
            .insert_with_properties(Geometry::PolygonRef(interned), pid);
    }
}

/// The device extraction driver. `D` provides the device recognition.
pub struct NetlistDeviceExtractor<D: DeviceExtractorDelegate> {
    delegate: D,
    core: ExtractorCore,
}

impl<D: DeviceExtractorDelegate> NetlistDeviceExtractor<D> {
    /// Create a driver around a delegate.
    pub fn new(delegate: D) -> Self {
        NetlistDeviceExtractor {
            delegate,
            core: ExtractorCore::new(Netlist::new()),
        }
    }

    /// Access the delegate.
    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    /// The netlist filled by extraction.
    pub fn netlist(&self) -> &Netlist {
        &self.core.netlist
    }

    /// Consume the driver and return the netlist.
    pub fn into_netlist(self) -> Netlist {
        self.core.netlist
    }

    /// Start an extraction session: clears local state, takes the netlist and
    /// lets the delegate publish its device classes.
    pub fn initialize(&mut self, netlist: Netlist) {
        self.core = ExtractorCore::new(netlist);
        self.delegate.create_device_classes(&mut self.core);
    }

    /// Extract devices from deep regions. All regions must be deep, share the
    /// same working layout and the same initial cell; their layers become the
    /// input layers of the extraction.
    pub fn extract(&mut self, regions: &[Region]) -> Result<(), DeepStoreError> {
        assert!(!regions.is_empty(), "no input regions");

        let mut layers = Vec::with_capacity(regions.len());
        let mut layout: Option<LayoutRef> = None;
        let mut cell = None;

        for region in regions {
            let dl = DeepLayer::try_from(region)?;
            let layout_ref = dl.layout()?;
            let initial_cell = dl.initial_cell()?;

            if let Some(existing) = &layout {
                assert_eq!(
                    existing.layout_id(),
                    layout_ref.layout_id(),
                    "all input regions must share one working layout"
                );
            } else {
                layout = Some(layout_ref);
            }
            if let Some(existing) = cell {
                assert_eq!(
                    existing, initial_cell,
                    "all input regions must share one initial cell"
                );
            } else {
                cell = Some(initial_cell);
            }
            layers.push(dl.layer());
        }

        let layout = layout.expect("at least one region");
        let cell = cell.expect("at least one region");
        self.extract_in_layout(&layout, cell, layers)
    }

    /// Extract devices from the given layers of a layout, starting at `cell`.
    pub fn extract_in_layout(
        &mut self,
        layout: &Layout,
        cell: CellIndex,
        layers: Vec<LayerIndex>,
    ) -> Result<(), DeepStoreError> {
        self.core.layers = layers;

        // Terminal properties are kept under the numeric property name 0.
        self.core.propname_id = Some(
            layout
                .properties_repository()
                .property_name_id(PropertyName::Number(0)),
        );

        // Cell to circuit lookup for reusing circuits of a pre-seeded netlist.
        let mut circuits_by_cell: FnvHashMap<CellIndex, CircuitId> = Default::default();
        for c in self.core.netlist.each_circuit() {
            if let Some(ci) = c.cell_index() {
                circuits_by_cell.insert(ci, c.id());
            }
        }

        let called_cells = layout.collect_called_cells(cell);

        let conn = self.delegate.get_connectivity(layout, &self.core.layers);
        let clusters = HierClusters::build(layout, cell, &conn);

        for &ci in &called_cells {
            let circuit = match circuits_by_cell.get(&ci) {
                Some(&c) => c,
                None => {
                    let c = self
                        .core
                        .netlist
                        .create_circuit(layout.cell_name_or_default(ci));
                    self.core.netlist.set_cell_index(c, ci);
                    circuits_by_cell.insert(ci, c);
                    c
                }
            };
            self.core.current_circuit = Some(circuit);
            self.core.current_cell = layout.cell_by_index(ci);

            let cc = clusters.clusters_per_cell(ci);
            for cluster in cc.each_cluster() {
                // Only root clusters are whole; the others have upward connections.
                if !cc.is_root(cluster) {
                    continue;
                }

                let layer_geometry: Vec<Region> = self
                    .core
                    .layers
                    .iter()
                    .map(|&layer| {
                        let mut region = Region::new();
                        clusters.for_each_cluster_shape(ci, cluster, layer, &mut |p, t| {
                            region.insert(p.transformed(t));
                        });
                        region
                    })
                    .collect();

                debug!(
                    "extracting devices in cell {} cluster {}",
                    ci, cluster
                );
                self.delegate
                    .extract_devices(&mut self.core, layout, &layer_geometry);
            }
        }

        self.core.current_circuit = None;
        self.core.current_cell = None;
        Ok(())
    }
}
