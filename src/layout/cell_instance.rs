/*
 * Copyright (c) 2020-2020 Thomas Kramer.
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
//! Placement of one cell inside another.

use super::transform::CplxTrans;
use super::types::CellIndex;

/// An instance of a cell inside another cell, together with the transformation
/// that puts the instantiated cell into place.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellInstance {
    /// Index of the instantiated (template) cell.
    cell: CellIndex,
    /// Transformation describing location, orientation and magnification of this instance.
    transform: CplxTrans,
}

impl CellInstance {
    /// Create a new cell instance.
    pub fn new(cell: CellIndex, transform: CplxTrans) -> Self {
        CellInstance { cell, transform }
    }

    /// Get the index of the instantiated cell.
    pub fn cell(&self) -> CellIndex {
        self.cell
    }

    /// Get the transformation of this instance.
    pub fn get_transform(&self) -> CplxTrans {
        self.transform
    }
}
