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
//! Per-layout repositories: interning of polygon bodies (so equal polygons are
//! pointer-shared between cells) and interning of property names and property sets.

use fnv::FnvHashMap;

use super::geometry::Polygon;
use super::types::PropertiesId;
use crate::index::{Index, IndexGenerator};
use crate::property_storage::PropertyValue;
use crate::rc_string::RcString;

use std::cell::RefCell;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Repository of interned polygon bodies.
///
/// Polygons are canonicalized before interning, so logically equal polygons
/// (same vertex cycle, arbitrary starting vertex) map to the same `Rc`.
#[derive(Debug, Default)]
pub struct ShapeRepository {
    buckets: RefCell<FnvHashMap<u64, Vec<Rc<Polygon>>>>,
}

impl ShapeRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Default::default()
    }

    /// Intern a polygon. Returns a shared reference to the canonical body.
    pub fn intern(&self, polygon: Polygon) -> Rc<Polygon> {
        let canonical = polygon.canonicalized();
        let mut hasher = DefaultHasher::new();
        canonical.hash(&mut hasher);
        let key = hasher.finish();

        let mut buckets = self.buckets.borrow_mut();
        let bucket = buckets.entry(key).or_default();
        if let Some(existing) = bucket.iter().find(|p| ***p == canonical) {
            return existing.clone();
        }
        let fresh = Rc::new(canonical);
        bucket.push(fresh.clone());
        fresh
    }

    /// Number of distinct polygon bodies stored.
    pub fn len(&self) -> usize {
        self.buckets.borrow().values().map(|b| b.len()).sum()
    }

    /// Tell if no polygon body is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Key under which a property is stored. Property names can be human readable
/// strings or plain numbers (numbers are used for internal annotations such as
/// device terminal markers).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyName {
    /// A string name.
    Text(RcString),
    /// A numeric name.
    Number(u32),
}

impl From<&str> for PropertyName {
    fn from(s: &str) -> Self {
        PropertyName::Text(s.into())
    }
}

impl From<RcString> for PropertyName {
    fn from(s: RcString) -> Self {
        PropertyName::Text(s)
    }
}

impl From<u32> for PropertyName {
    fn from(n: u32) -> Self {
        PropertyName::Number(n)
    }
}

/// Identifier of an interned property name.
pub type PropertyNameId = Index<PropertyName>;

/// An interned set of properties, sorted by name id.
#[derive(Clone, Debug, Default)]
pub struct PropertySet {
    content: Vec<(PropertyNameId, PropertyValue)>,
}

impl PropertySet {
    /// Create an empty property set.
    pub fn new() -> Self {
        Default::default()
    }

    /// Add a property to the set, replacing an existing value stored under the same name.
    pub fn insert<V: Into<PropertyValue>>(&mut self, name: PropertyNameId, value: V) {
        match self.content.binary_search_by_key(&name, |(n, _)| *n) {
            Ok(pos) => self.content[pos].1 = value.into(),
            Err(pos) => self.content.insert(pos, (name, value.into())),
        }
    }

    /// Get a property value by its name id.
    pub fn get(&self, name: PropertyNameId) -> Option<&PropertyValue> {
        self.content
            .binary_search_by_key(&name, |(n, _)| *n)
            .ok()
            .map(|pos| &self.content[pos].1)
    }

    /// Iterate over all `(name id, value)` pairs.
    pub fn each_property(&self) -> impl Iterator<Item = (PropertyNameId, &PropertyValue)> {
        self.content.iter().map(|(n, v)| (*n, v))
    }

    /// Tell if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Repository of property names and property sets of a layout.
#[derive(Debug, Default)]
pub struct PropertiesRepository {
    names: RefCell<FnvHashMap<PropertyName, PropertyNameId>>,
    names_by_id: RefCell<Vec<PropertyName>>,
    name_id_generator: RefCell<IndexGenerator<PropertyName>>,
    sets: RefCell<Vec<Rc<PropertySet>>>,
}

impl PropertiesRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Default::default()
    }

    /// Get the id of a property name, interning the name on first use.
    pub fn property_name_id<N: Into<PropertyName>>(&self, name: N) -> PropertyNameId {
        let name = name.into();
        if let Some(id) = self.names.borrow().get(&name) {
            return *id;
        }
        let id = self.name_id_generator.borrow_mut().next();
        self.names.borrow_mut().insert(name.clone(), id);
        self.names_by_id.borrow_mut().push(name);
        id
    }

    /// Look up a property name by its id.
    pub fn property_name(&self, id: PropertyNameId) -> Option<PropertyName> {
        self.names_by_id.borrow().get(id.value()).cloned()
    }

    /// Store a property set and return its id.
    pub fn properties_id(&self, set: PropertySet) -> PropertiesId {
        let mut sets = self.sets.borrow_mut();
        let id = PropertiesId::new(sets.len());
        sets.push(Rc::new(set));
        id
    }

    /// Get a property set by its id.
    pub fn properties(&self, id: PropertiesId) -> Option<Rc<PropertySet>> {
        self.sets.borrow().get(id.value()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iron_shapes::point::Point;
    use iron_shapes::rect::Rect;

    #[test]
    fn test_polygon_interning_shares_bodies() {
        let repo = ShapeRepository::new();
        let a = Polygon::from_rect(&Rect::new(Point::new(0, 0), Point::new(10, 10)));
        let mut rotated_points = a.points().to_vec();
        rotated_points.rotate_left(2);
        let b = Polygon::new(rotated_points);

        let ra = repo.intern(a);
        let rb = repo.intern(b);
        assert!(Rc::ptr_eq(&ra, &rb));
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_property_name_interning() {
        let repo = PropertiesRepository::new();
        let a = repo.property_name_id("label");
        let b = repo.property_name_id("label");
        let c = repo.property_name_id(0u32);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(repo.property_name(a), Some(PropertyName::Text("label".into())));
    }

    #[test]
    fn test_property_sets() {
        let repo = PropertiesRepository::new();
        let name = repo.property_name_id("label");
        let mut set = PropertySet::new();
        set.insert(name, "N1");
        let id = repo.properties_id(set);
        let stored = repo.properties(id).unwrap();
        assert_eq!(
            stored.get(name),
            Some(&PropertyValue::String(std::rc::Rc::new("N1".to_string())))
        );
    }
}
