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

//! User defined property values. Shapes carry properties as interned sets of
//! `(name, value)` pairs; the repositories doing the interning live in
//! [`layout::repository`](crate::layout::repository).

use std::rc::Rc;

/// Property value type.
/// Properties can hold different types that are encapsulated in this enum.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Property is a string.
    String(Rc<String>),
    /// Property is a byte string.
    Bytes(Vec<u8>),
    /// Property is a signed integer.
    SInt(i32),
    /// Property is an unsigned integer.
    UInt(u32),
    /// Property is a float.
    Float(f64),
    /// Property is a pair of identifiers. Used for annotations that point into
    /// another data structure, such as device terminal markers.
    IdPair(u64, u64),
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::String(Rc::new(v))
    }
}

impl From<Rc<String>> for PropertyValue {
    fn from(v: Rc<String>) -> Self {
        PropertyValue::String(v)
    }
}

impl From<&Rc<String>> for PropertyValue {
    fn from(v: &Rc<String>) -> Self {
        PropertyValue::String(v.clone())
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::String(Rc::new(v.to_string()))
    }
}

impl From<Vec<u8>> for PropertyValue {
    fn from(v: Vec<u8>) -> Self {
        PropertyValue::Bytes(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        PropertyValue::SInt(v)
    }
}

impl From<u32> for PropertyValue {
    fn from(v: u32) -> Self {
        PropertyValue::UInt(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Float(v)
    }
}

impl From<(u64, u64)> for PropertyValue {
    fn from(v: (u64, u64)) -> Self {
        PropertyValue::IdPair(v.0, v.1)
    }
}

impl<'a> TryInto<&'a str> for &'a PropertyValue {
    type Error = ();

    fn try_into(self) -> Result<&'a str, Self::Error> {
        if let PropertyValue::String(s) = self {
            Ok(s.as_str())
        } else {
            Err(())
        }
    }
}

impl TryInto<i32> for &PropertyValue {
    type Error = ();

    fn try_into(self) -> Result<i32, Self::Error> {
        if let PropertyValue::SInt(v) = self {
            Ok(*v)
        } else {
            Err(())
        }
    }
}

impl TryInto<(u64, u64)> for &PropertyValue {
    type Error = ();

    fn try_into(self) -> Result<(u64, u64), Self::Error> {
        if let PropertyValue::IdPair(a, b) = self {
            Ok((*a, *b))
        } else {
            Err(())
        }
    }
}
