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
//! Device classes and devices of the extracted netlist.

use crate::rc_string::RcString;

/// Data type used for identifying a device class.
#[derive(Copy, Clone, Debug, Hash, PartialOrd, PartialEq, Ord, Eq)]
pub struct DeviceClassId {
    pub(super) index: usize,
}

impl DeviceClassId {
    /// Get the integer value of this id.
    pub fn value(&self) -> usize {
        self.index
    }
}

/// Data type used for identifying a device. Device ids are unique within one netlist.
#[derive(Copy, Clone, Debug, Hash, PartialOrd, PartialEq, Ord, Eq)]
pub struct DeviceId {
    pub(super) id: u64,
}

impl DeviceId {
    /// Get the integer value of this id.
    pub fn value(&self) -> u64 {
        self.id
    }
}

/// A device class: the "type" of an extracted device, with its named terminals.
#[derive(Debug, Clone)]
pub struct DeviceClass {
    name: RcString,
    terminals: Vec<RcString>,
}

impl DeviceClass {
    /// Create a device class with the given name and terminal names.
    pub fn new<S: Into<RcString>>(name: S, terminals: Vec<RcString>) -> Self {
        DeviceClass {
            name: name.into(),
            terminals,
        }
    }

    /// Name of the device class.
    pub fn name(&self) -> &RcString {
        &self.name
    }

    /// Number of terminals of this class.
    pub fn num_terminals(&self) -> usize {
        self.terminals.len()
    }

    /// Name of a terminal.
    pub fn terminal_name(&self, terminal_id: usize) -> Option<&RcString> {
        self.terminals.get(terminal_id)
    }

    /// Find the id of a terminal by its name.
    pub fn terminal_id(&self, name: &str) -> Option<usize> {
        self.terminals.iter().position(|t| t.as_str() == name)
    }
}

/// An extracted device: an instance of a device class inside a circuit.
#[derive(Debug, Clone)]
pub struct Device {
    pub(super) id: DeviceId,
    pub(super) name: RcString,
    pub(super) class: DeviceClassId,
}

impl Device {
    /// Netlist-wide unique id of this device.
    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// Name of this device.
    pub fn name(&self) -> &RcString {
        &self.name
    }

    /// Class of this device.
    pub fn class(&self) -> DeviceClassId {
        self.class
    }
}
