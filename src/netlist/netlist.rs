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
//! Data structures for representation of extracted netlists: circuits holding
//! devices, indexed by the layout cell they were extracted from.

use itertools::Itertools;
use log::debug;

use super::device::{Device, DeviceClass, DeviceClassId, DeviceId};
use crate::layout::prelude::CellIndex;
use crate::rc_string::RcString;

use std::collections::HashMap;
use std::fmt;

/// Data type used for identifying a circuit.
#[derive(Copy, Clone, Debug, Hash, PartialOrd, PartialEq, Ord, Eq)]
pub struct CircuitId {
    pub(super) index: usize,
}

impl CircuitId {
    /// Get the integer value of this id.
    pub fn value(&self) -> usize {
        self.index
    }
}

/// A circuit: the netlist image of one layout cell, holding the devices
/// extracted from that cell.
#[derive(Debug, Clone)]
pub struct Circuit {
    id: CircuitId,
    name: RcString,
    cell_index: Option<CellIndex>,
    devices: Vec<Device>,
}

impl Circuit {
    /// Id of this circuit.
    pub fn id(&self) -> CircuitId {
        self.id
    }

    /// Name of this circuit.
    pub fn name(&self) -> &RcString {
        &self.name
    }

    /// Index of the layout cell this circuit represents.
    pub fn cell_index(&self) -> Option<CellIndex> {
        self.cell_index
    }

    /// Iterate over the devices of this circuit.
    pub fn each_device(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }

    /// Number of devices in this circuit.
    pub fn num_devices(&self) -> usize {
        self.devices.len()
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, ".circuit {}", self.name)?;
        for d in &self.devices {
            writeln!(f, "  device {} {}", d.class().value(), d.name())?;
        }
        writeln!(f, ".end")
    }
}

/// Collection of circuits and device classes.
#[derive(Debug, Clone, Default)]
pub struct Netlist {
    circuits: Vec<Circuit>,
    circuits_by_name: HashMap<RcString, CircuitId>,
    device_classes: Vec<DeviceClass>,
    device_id_counter: u64,
}

impl Netlist {
    /// Create an empty netlist.
    pub fn new() -> Self {
        Default::default()
    }

    /// Create a new and empty circuit.
    ///
    /// # Panics
    /// Panics if a circuit with this name already exists.
    pub fn create_circuit<S: Into<RcString>>(&mut self, name: S) -> CircuitId {
        let name = name.into();
        if self.circuits_by_name.contains_key(&name) {
            panic!("Circuit '{}' already exists!", &name);
        }
        let id = CircuitId {
            index: self.circuits.len(),
        };
        debug!("create circuit '{}'", name);
        self.circuits.push(Circuit {
            id,
            name: name.clone(),
            cell_index: None,
            devices: Vec::new(),
        });
        self.circuits_by_name.insert(name, id);
        id
    }

    /// Get a circuit by its id.
    pub fn circuit(&self, id: CircuitId) -> &Circuit {
        &self.circuits[id.index]
    }

    /// Find a circuit by its name.
    pub fn circuit_by_name(&self, name: &str) -> Option<&Circuit> {
        self.circuits_by_name
            .get(name)
            .map(|id| self.circuit(*id))
    }

    /// Iterate over all circuits.
    pub fn each_circuit(&self) -> impl Iterator<Item = &Circuit> {
        self.circuits.iter()
    }

    /// Number of circuits.
    pub fn num_circuits(&self) -> usize {
        self.circuits.len()
    }

    /// Associate a circuit with a layout cell.
    pub fn set_cell_index(&mut self, circuit: CircuitId, cell_index: CellIndex) {
        self.circuits[circuit.index].cell_index = Some(cell_index);
    }

    /// Rename a circuit.
    pub fn set_name<S: Into<RcString>>(&mut self, circuit: CircuitId, name: S) {
        let name = name.into();
        let old = self.circuits[circuit.index].name.clone();
        self.circuits_by_name.remove(&old);
        self.circuits_by_name.insert(name.clone(), circuit);
        self.circuits[circuit.index].name = name;
    }

    /// Publish a device class. Returns its id.
    pub fn add_device_class(&mut self, device_class: DeviceClass) -> DeviceClassId {
        let id = DeviceClassId {
            index: self.device_classes.len(),
        };
        self.device_classes.push(device_class);
        id
    }

    /// Get a device class by its id.
    pub fn device_class(&self, id: DeviceClassId) -> &DeviceClass {
        &self.device_classes[id.index]
    }

    /// Iterate over all device classes.
    pub fn each_device_class(&self) -> impl Iterator<Item = &DeviceClass> {
        self.device_classes.iter()
    }

    /// Add a device to a circuit. Returns the netlist-wide unique device id.
    pub fn add_device<S: Into<RcString>>(
        &mut self,
        circuit: CircuitId,
        class: DeviceClassId,
        name: S,
    ) -> DeviceId {
        self.device_id_counter += 1;
        let id = DeviceId {
            id: self.device_id_counter,
        };
        self.circuits[circuit.index].devices.push(Device {
            id,
            name: name.into(),
            class,
        });
        id
    }

    /// Find the circuit extracted for a given layout cell.
    pub fn circuit_by_cell_index(&self, cell_index: CellIndex) -> Option<CircuitId> {
        self.circuits
            .iter()
            .find(|c| c.cell_index == Some(cell_index))
            .map(|c| c.id)
    }
}

impl fmt::Display for Netlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.circuits.iter().sorted_by_key(|c| c.id()) {
            fmt::Display::fmt(c, f)?;
        }
        fmt::Result::Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_circuit_and_devices() {
        let mut netlist = Netlist::new();
        let top = netlist.create_circuit("TOP");
        let class = netlist.add_device_class(DeviceClass::new("RES", vec!["A".into(), "B".into()]));
        let d1 = netlist.add_device(top, class, "1");
        let d2 = netlist.add_device(top, class, "2");
        assert_ne!(d1, d2);
        assert_eq!(netlist.circuit(top).num_devices(), 2);
        assert_eq!(netlist.device_class(class).num_terminals(), 2);
        assert_eq!(netlist.device_class(class).terminal_id("B"), Some(1));
    }

    #[test]
    #[should_panic(expected = "already exists")]
    fn test_duplicate_circuit_name_panics() {
        let mut netlist = Netlist::new();
        netlist.create_circuit("TOP");
        netlist.create_circuit("TOP");
    }
}
