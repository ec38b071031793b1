/*
 * Copyright (c) 2020-2021 Thomas Kramer.
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
//! The working layout container and its building blocks: cells, cell instances,
//! shape collections, geometry payloads, repositories and cell mappings.

pub mod algorithms;
pub mod cell;
pub mod cell_instance;
pub mod cell_mapping;
pub mod errors;
pub mod geometry;
pub mod layout;
pub mod prelude;
pub mod repository;
pub mod shape_collection;
pub mod transform;
pub mod types;
pub mod util;
