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
//! Complex transformations: magnification, mirroring, rotation by multiples of 90 degrees
//! and an integer displacement. This is the transformation type used when pulling geometry
//! out of a source layout and when delivering results back.

use iron_shapes::point::Point;
use iron_shapes::rect::Rect;
use iron_shapes::vector::Vector;

use super::types::Coord;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Similarity transformation on integer coordinates.
///
/// The transformation is applied to a point `p` as
/// `p -> mag * R(rotation) * M(mirror) * p + displacement`
/// where `M` mirrors at the x-axis (applied first) and `R` rotates counter-clockwise
/// by `rotation` quarter turns.
#[derive(Clone, Copy, Debug)]
pub struct CplxTrans {
    mag: f64,
    /// Counter-clockwise rotation in quarter turns (`0..=3`).
    rotation: u8,
    /// Mirror at the x-axis, applied before the rotation.
    mirror: bool,
    displacement: Vector<Coord>,
}

impl Default for CplxTrans {
    fn default() -> Self {
        Self::identity()
    }
}

impl CplxTrans {
    /// The identity transformation.
    pub fn identity() -> Self {
        CplxTrans {
            mag: 1.0,
            rotation: 0,
            mirror: false,
            displacement: Vector::new(0, 0),
        }
    }

    /// Create a transformation from all components.
    /// `rotation` is given in quarter turns and taken modulo 4.
    pub fn new(mag: f64, rotation: u8, mirror: bool, displacement: Vector<Coord>) -> Self {
        debug_assert!(mag > 0.0, "Magnification must be positive.");
        CplxTrans {
            mag,
            rotation: rotation % 4,
            mirror,
            displacement,
        }
    }

    /// Pure magnification.
    pub fn magnifying(mag: f64) -> Self {
        Self::new(mag, 0, false, Vector::new(0, 0))
    }

    /// Pure translation.
    pub fn translation(displacement: Vector<Coord>) -> Self {
        Self::new(1.0, 0, false, displacement)
    }

    /// Pure rotation by `rotation` quarter turns.
    pub fn rotating(rotation: u8) -> Self {
        Self::new(1.0, rotation, false, Vector::new(0, 0))
    }

    /// Get the magnification.
    pub fn mag(&self) -> f64 {
        self.mag
    }

    /// Get the rotation in quarter turns.
    pub fn rotation(&self) -> u8 {
        self.rotation
    }

    /// Tell if the transformation mirrors at the x-axis.
    pub fn is_mirror(&self) -> bool {
        self.mirror
    }

    /// Get the displacement vector.
    pub fn displacement(&self) -> Vector<Coord> {
        self.displacement
    }

    /// Tell if this is the identity transformation.
    pub fn is_identity(&self) -> bool {
        self.mag == 1.0
            && self.rotation == 0
            && !self.mirror
            && self.displacement.x == 0
            && self.displacement.y == 0
    }

    /// Tell if the magnification is `1.0`.
    pub fn is_unity_mag(&self) -> bool {
        self.mag == 1.0
    }

    /// The same transformation without its displacement part.
    pub fn without_displacement(&self) -> Self {
        CplxTrans {
            displacement: Vector::new(0, 0),
            ..*self
        }
    }

    fn rotate90(rotation: u8, x: f64, y: f64) -> (f64, f64) {
        match rotation % 4 {
            0 => (x, y),
            1 => (-y, x),
            2 => (-x, -y),
            _ => (y, -x),
        }
    }

    fn apply(&self, x: Coord, y: Coord, with_displacement: bool) -> (Coord, Coord) {
        let (x, y) = (x as f64, y as f64);
        let y = if self.mirror { -y } else { y };
        let (x, y) = Self::rotate90(self.rotation, x, y);
        let (mut x, mut y) = (x * self.mag, y * self.mag);
        if with_displacement {
            x += self.displacement.x as f64;
            y += self.displacement.y as f64;
        }
        (x.round() as Coord, y.round() as Coord)
    }

    /// Apply the transformation to a point.
    pub fn transform_point(&self, p: Point<Coord>) -> Point<Coord> {
        let (x, y) = self.apply(p.x, p.y, true);
        Point::new(x, y)
    }

    /// Apply the linear part of the transformation to a vector (no displacement).
    pub fn transform_vector(&self, v: Vector<Coord>) -> Vector<Coord> {
        let (x, y) = self.apply(v.x, v.y, false);
        Vector::new(x, y)
    }

    /// Apply the transformation to a rectangle. The result is the bounding box
    /// of the transformed corners.
    pub fn transform_rect(&self, r: &Rect<Coord>) -> Rect<Coord> {
        let p1 = self.transform_point(r.lower_left());
        let p2 = self.transform_point(r.upper_right());
        Rect::new(p1, p2)
    }

    /// Concatenate two transformations. The result applies `other` first, then `self`.
    pub fn concat(&self, other: &CplxTrans) -> CplxTrans {
        // M(f) * R(r) = R(-r) * M(f) for the mirror at the x-axis.
        let rotation = if self.mirror {
            (4 + self.rotation + 4 - (other.rotation % 4)) % 4
        } else {
            (self.rotation + other.rotation) % 4
        };
        let d2 = self.transform_vector(other.displacement);
        CplxTrans {
            mag: self.mag * other.mag,
            rotation,
            mirror: self.mirror ^ other.mirror,
            displacement: Vector::new(d2.x + self.displacement.x, d2.y + self.displacement.y),
        }
    }

    /// Invert the transformation.
    ///
    /// With integer coordinates the inverse is exact only for unit magnification;
    /// otherwise the displacement is rounded.
    pub fn inverted(&self) -> CplxTrans {
        let inv = CplxTrans {
            mag: 1.0 / self.mag,
            rotation: if self.mirror {
                self.rotation
            } else {
                (4 - self.rotation) % 4
            },
            mirror: self.mirror,
            displacement: Vector::new(0, 0),
        };
        let d = inv.transform_vector(self.displacement);
        CplxTrans {
            displacement: Vector::new(-d.x, -d.y),
            ..inv
        }
    }
}

impl PartialEq for CplxTrans {
    fn eq(&self, other: &Self) -> bool {
        self.mag.to_bits() == other.mag.to_bits()
            && self.rotation == other.rotation
            && self.mirror == other.mirror
            && self.displacement == other.displacement
    }
}

impl Eq for CplxTrans {}

impl Hash for CplxTrans {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.mag.to_bits().hash(state);
        self.rotation.hash(state);
        self.mirror.hash(state);
        self.displacement.x.hash(state);
        self.displacement.y.hash(state);
    }
}

impl Ord for CplxTrans {
    fn cmp(&self, other: &Self) -> Ordering {
        (
            self.mag.to_bits(),
            self.rotation,
            self.mirror,
            self.displacement.x,
            self.displacement.y,
        )
            .cmp(&(
                other.mag.to_bits(),
                other.rotation,
                other.mirror,
                other.displacement.x,
                other.displacement.y,
            ))
    }
}

impl PartialOrd for CplxTrans {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let t = CplxTrans::identity();
        assert!(t.is_identity());
        assert_eq!(t.transform_point(Point::new(17, -4)), Point::new(17, -4));
    }

    #[test]
    fn test_rotation() {
        let t = CplxTrans::rotating(1);
        assert_eq!(t.transform_point(Point::new(10, 0)), Point::new(0, 10));
        assert_eq!(t.transform_point(Point::new(0, 10)), Point::new(-10, 0));
    }

    #[test]
    fn test_magnification() {
        let t = CplxTrans::magnifying(2.0);
        assert_eq!(t.transform_point(Point::new(3, -5)), Point::new(6, -10));
    }

    #[test]
    fn test_concat_is_application_order() {
        let a = CplxTrans::translation(Vector::new(5, 0));
        let b = CplxTrans::rotating(1);
        let p = Point::new(1, 0);
        // (a ∘ b)(p) == a(b(p))
        assert_eq!(
            a.concat(&b).transform_point(p),
            a.transform_point(b.transform_point(p))
        );
    }

    #[test]
    fn test_inverted() {
        let t = CplxTrans::new(1.0, 3, true, Vector::new(7, -2));
        let inv = t.inverted();
        let p = Point::new(13, 42);
        assert_eq!(inv.transform_point(t.transform_point(p)), p);
        assert_eq!(t.transform_point(inv.transform_point(p)), p);
    }

    #[test]
    fn test_mirror_composition() {
        let m = CplxTrans::new(1.0, 0, true, Vector::new(0, 0));
        let r = CplxTrans::rotating(1);
        let p = Point::new(3, 4);
        assert_eq!(
            m.concat(&r).transform_point(p),
            m.transform_point(r.transform_point(p))
        );
        assert_eq!(
            r.concat(&m).transform_point(p),
            r.transform_point(m.transform_point(p))
        );
    }
}
