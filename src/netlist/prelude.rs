// SPDX-FileCopyrightText: 2022 Thomas Kramer
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The `prelude` helps to import most commonly used modules.

pub use super::device::{Device, DeviceClass, DeviceClassId, DeviceId};
pub use super::netlist::{Circuit, CircuitId, Netlist};
