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
//! Geometric payload types of layer shapes: polygons, edges, edge pairs and texts,
//! together with the `Geometry` enum that wraps them for storage on a layer.
//!
//! Polygons stored on layers are reference counted (`Rc<Polygon>`) so that the
//! shape repository of a layout can share one polygon body between many cells.

use iron_shapes::point::Point;
use iron_shapes::rect::Rect;
use iron_shapes::traits::TryBoundingBox;

use super::transform::CplxTrans;
use super::types::{AreaCoord, Coord};
use crate::rc_string::RcString;

use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Union of two rectangles: the smallest rectangle containing both.
pub fn rect_union(a: &Rect<Coord>, b: &Rect<Coord>) -> Rect<Coord> {
    let (all, aur) = (a.lower_left(), a.upper_right());
    let (bll, bur) = (b.lower_left(), b.upper_right());
    Rect::new(
        Point::new(all.x.min(bll.x), all.y.min(bll.y)),
        Point::new(aur.x.max(bur.x), aur.y.max(bur.y)),
    )
}

/// Intersection of two rectangles, `None` if they do not overlap.
/// Touching rectangles produce a degenerate (zero width or height) result.
pub fn rect_intersection(a: &Rect<Coord>, b: &Rect<Coord>) -> Option<Rect<Coord>> {
    let (all, aur) = (a.lower_left(), a.upper_right());
    let (bll, bur) = (b.lower_left(), b.upper_right());
    let ll = Point::new(all.x.max(bll.x), all.y.max(bll.y));
    let ur = Point::new(aur.x.min(bur.x), aur.y.min(bur.y));
    if ll.x <= ur.x && ll.y <= ur.y {
        Some(Rect::new(ll, ur))
    } else {
        None
    }
}

/// Tell whether two rectangles interact. With `touching` a shared boundary counts
/// as interaction, otherwise a proper overlap is required.
pub fn rects_interact(a: &Rect<Coord>, b: &Rect<Coord>, touching: bool) -> bool {
    let (all, aur) = (a.lower_left(), a.upper_right());
    let (bll, bur) = (b.lower_left(), b.upper_right());
    if touching {
        all.x <= bur.x && bll.x <= aur.x && all.y <= bur.y && bll.y <= aur.y
    } else {
        all.x < bur.x && bll.x < aur.x && all.y < bur.y && bll.y < aur.y
    }
}

/// Tell whether rectangle `outer` fully contains rectangle `inner`.
pub fn rect_contains_rect(outer: &Rect<Coord>, inner: &Rect<Coord>) -> bool {
    let (oll, our) = (outer.lower_left(), outer.upper_right());
    let (ill, iur) = (inner.lower_left(), inner.upper_right());
    oll.x <= ill.x && oll.y <= ill.y && our.x >= iur.x && our.y >= iur.y
}

/// Tell whether a rectangle contains a point (boundary included).
pub fn rect_contains_point(r: &Rect<Coord>, p: Point<Coord>) -> bool {
    let (ll, ur) = (r.lower_left(), r.upper_right());
    ll.x <= p.x && p.x <= ur.x && ll.y <= p.y && p.y <= ur.y
}

/// A polygon without holes, defined by its hull vertices.
#[derive(Clone, Debug)]
pub struct Polygon {
    points: Vec<Point<Coord>>,
}

impl Polygon {
    /// Create a polygon from its hull points.
    /// Consecutive duplicate points are dropped.
    pub fn new(points: Vec<Point<Coord>>) -> Self {
        let mut hull: Vec<Point<Coord>> = Vec::with_capacity(points.len());
        for p in points {
            if hull.last() != Some(&p) {
                hull.push(p);
            }
        }
        if hull.len() > 1 && hull.first() == hull.last() {
            hull.pop();
        }
        Polygon { points: hull }
    }

    /// Create a rectangle polygon.
    pub fn from_rect(rect: &Rect<Coord>) -> Self {
        let (ll, ur) = (rect.lower_left(), rect.upper_right());
        Polygon::new(vec![
            Point::new(ll.x, ll.y),
            Point::new(ur.x, ll.y),
            Point::new(ur.x, ur.y),
            Point::new(ll.x, ur.y),
        ])
    }

    /// Get the hull points.
    pub fn points(&self) -> &[Point<Coord>] {
        &self.points
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    /// Twice the signed area of the polygon (counter-clockwise positive).
    pub fn area_doubled_oriented(&self) -> AreaCoord {
        let n = self.points.len();
        if n < 3 {
            return 0;
        }
        let mut acc: AreaCoord = 0;
        for i in 0..n {
            let p = self.points[i];
            let q = self.points[(i + 1) % n];
            acc += p.x as AreaCoord * q.y as AreaCoord - q.x as AreaCoord * p.y as AreaCoord;
        }
        acc
    }

    /// Twice the absolute area of the polygon.
    pub fn area_doubled(&self) -> AreaCoord {
        self.area_doubled_oriented().abs()
    }

    /// Iterate over the boundary edges, including the closing edge.
    /// Degenerate (zero length) edges are skipped.
    pub fn each_edge(&self) -> impl Iterator<Item = Edge> + '_ {
        let n = self.points.len();
        (0..n).filter_map(move |i| {
            let p = self.points[i];
            let q = self.points[(i + 1) % n];
            if p == q {
                None
            } else {
                Some(Edge::new(p, q))
            }
        })
    }

    /// Apply a transformation to all hull points.
    pub fn transformed(&self, t: &CplxTrans) -> Polygon {
        Polygon::new(self.points.iter().map(|&p| t.transform_point(p)).collect())
    }

    /// Test whether a point lies inside the polygon or on its boundary.
    /// Uses the non-zero winding rule.
    pub fn contains_point(&self, p: Point<Coord>) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let mut winding: i32 = 0;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            // Boundary test.
            let cross = (b.x - a.x) as AreaCoord * (p.y - a.y) as AreaCoord
                - (p.x - a.x) as AreaCoord * (b.y - a.y) as AreaCoord;
            if cross == 0
                && p.x >= a.x.min(b.x)
                && p.x <= a.x.max(b.x)
                && p.y >= a.y.min(b.y)
                && p.y <= a.y.max(b.y)
            {
                return true;
            }
            if a.y <= p.y {
                if b.y > p.y && cross > 0 {
                    winding += 1;
                }
            } else if b.y <= p.y && cross < 0 {
                winding -= 1;
            }
        }
        winding != 0
    }

    /// Bring the hull into a canonical rotation: the lexicographically smallest
    /// vertex comes first. Two polygons describing the same point sequence modulo
    /// rotation become equal. Used by the shape repository for interning.
    pub fn canonicalized(mut self) -> Polygon {
        if self.points.is_empty() {
            return self;
        }
        let min_pos = (0..self.points.len())
            .min_by_key(|&i| {
                let p = self.points[i];
                (p.x, p.y)
            })
            .unwrap();
        self.points.rotate_left(min_pos);
        Polygon { points: self.points }
    }
}

impl PartialEq for Polygon {
    fn eq(&self, other: &Self) -> bool {
        self.points.len() == other.points.len()
            && self
                .points
                .iter()
                .zip(other.points.iter())
                .all(|(p, q)| p.x == q.x && p.y == q.y)
    }
}

impl Eq for Polygon {}

impl Hash for Polygon {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for p in &self.points {
            p.x.hash(state);
            p.y.hash(state);
        }
    }
}

impl TryBoundingBox<Coord> for Polygon {
    fn try_bounding_box(&self) -> Option<Rect<Coord>> {
        if self.points.is_empty() {
            return None;
        }
        let mut min = self.points[0];
        let mut max = self.points[0];
        for p in &self.points[1..] {
            min = Point::new(min.x.min(p.x), min.y.min(p.y));
            max = Point::new(max.x.max(p.x), max.y.max(p.y));
        }
        Some(Rect::new(min, max))
    }
}

impl From<Rect<Coord>> for Polygon {
    fn from(r: Rect<Coord>) -> Self {
        Polygon::from_rect(&r)
    }
}

/// A directed edge between two points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    /// Start point.
    pub p1: Point<Coord>,
    /// End point.
    pub p2: Point<Coord>,
}

impl Edge {
    /// Create a new edge.
    pub fn new(p1: Point<Coord>, p2: Point<Coord>) -> Self {
        Edge { p1, p2 }
    }

    /// Apply a transformation to both end points.
    pub fn transformed(&self, t: &CplxTrans) -> Edge {
        Edge::new(t.transform_point(self.p1), t.transform_point(self.p2))
    }

    /// Bounding box of the edge.
    pub fn bounding_box(&self) -> Rect<Coord> {
        Rect::new(self.p1, self.p2)
    }

    /// Squared length of the edge.
    pub fn length_sq(&self) -> AreaCoord {
        let dx = (self.p2.x - self.p1.x) as AreaCoord;
        let dy = (self.p2.y - self.p1.y) as AreaCoord;
        dx * dx + dy * dy
    }
}

/// A pair of edges, the result type of geometric checks (spacing, width, enclosure).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EdgePair {
    /// First edge of the pair.
    pub first: Edge,
    /// Second edge of the pair.
    pub second: Edge,
}

impl EdgePair {
    /// Create a new edge pair.
    pub fn new(first: Edge, second: Edge) -> Self {
        EdgePair { first, second }
    }

    /// Apply a transformation to both edges.
    pub fn transformed(&self, t: &CplxTrans) -> EdgePair {
        EdgePair::new(self.first.transformed(t), self.second.transformed(t))
    }

    /// Bounding box of both edges.
    pub fn bounding_box(&self) -> Rect<Coord> {
        rect_union(&self.first.bounding_box(), &self.second.bounding_box())
    }

    /// Convert the edge pair into a marker polygon connecting both edges.
    ///
    /// `enlargement` grows the polygon outward from its center so that degenerate
    /// pairs (coincident or collinear edges) remain visible after conversion.
    pub fn to_polygon(&self, enlargement: Coord) -> Polygon {
        // The winding of the second edge is not fixed; take the vertex order
        // that produces the proper (non self-intersecting) quadrilateral.
        let a = [self.first.p1, self.first.p2, self.second.p1, self.second.p2];
        let b = [self.first.p1, self.first.p2, self.second.p2, self.second.p1];
        let pts = if Polygon::new(a.to_vec()).area_doubled()
            >= Polygon::new(b.to_vec()).area_doubled()
        {
            a
        } else {
            b
        };
        if enlargement == 0 {
            return Polygon::new(pts.to_vec());
        }
        let bbox = rect_union(&Rect::new(pts[0], pts[1]), &Rect::new(pts[2], pts[3]));
        let cx2 = bbox.lower_left().x as AreaCoord + bbox.upper_right().x as AreaCoord;
        let cy2 = bbox.lower_left().y as AreaCoord + bbox.upper_right().y as AreaCoord;
        let enlarged = pts
            .iter()
            .map(|p| {
                let dx = match (2 * p.x as AreaCoord).cmp(&cx2) {
                    std::cmp::Ordering::Less => -enlargement,
                    std::cmp::Ordering::Equal => 0,
                    std::cmp::Ordering::Greater => enlargement,
                };
                let dy = match (2 * p.y as AreaCoord).cmp(&cy2) {
                    std::cmp::Ordering::Less => -enlargement,
                    std::cmp::Ordering::Equal => 0,
                    std::cmp::Ordering::Greater => enlargement,
                };
                Point::new(p.x + dx, p.y + dy)
            })
            .collect();
        let poly = Polygon::new(enlarged);
        if poly.vertex_count() >= 3 && poly.area_doubled() > 0 {
            poly
        } else {
            // Degenerate pair: fall back to the enlarged bounding box.
            let ll = bbox.lower_left();
            let ur = bbox.upper_right();
            Polygon::from_rect(&Rect::new(
                Point::new(ll.x - enlargement, ll.y - enlargement),
                Point::new(ur.x + enlargement, ur.y + enlargement),
            ))
        }
    }
}

/// A text object: a string anchored at a point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Text {
    /// The text string.
    pub text: RcString,
    /// Anchor point of the text.
    pub position: Point<Coord>,
}

impl Text {
    /// Create a new text object.
    pub fn new<S: Into<RcString>>(text: S, position: Point<Coord>) -> Self {
        Text {
            text: text.into(),
            position,
        }
    }

    /// Apply a transformation to the anchor point.
    pub fn transformed(&self, t: &CplxTrans) -> Text {
        Text {
            text: self.text.clone(),
            position: t.transform_point(self.position),
        }
    }
}

/// Geometric payload of a shape stored on a layer.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    /// An axis-aligned rectangle.
    Rect(Rect<Coord>),
    /// A reference to an interned polygon.
    PolygonRef(Rc<Polygon>),
    /// A directed edge.
    Edge(Edge),
    /// A pair of edges (check result marker).
    EdgePair(EdgePair),
    /// A text object.
    Text(Text),
}

impl Geometry {
    /// Apply a transformation to the payload.
    ///
    /// Transformed polygon references point to fresh polygon bodies; the caller
    /// is responsible for re-interning them into a shape repository if sharing
    /// is wanted.
    pub fn transformed(&self, t: &CplxTrans) -> Geometry {
        match self {
            Geometry::Rect(r) => Geometry::Rect(t.transform_rect(r)),
            Geometry::PolygonRef(p) => Geometry::PolygonRef(Rc::new(p.transformed(t))),
            Geometry::Edge(e) => Geometry::Edge(e.transformed(t)),
            Geometry::EdgePair(ep) => Geometry::EdgePair(ep.transformed(t)),
            Geometry::Text(x) => Geometry::Text(x.transformed(t)),
        }
    }

    /// Convert the payload into a polygon if it has a polygon representation.
    /// Edges, edge pairs and texts return `None`.
    pub fn to_polygon(&self) -> Option<Polygon> {
        match self {
            Geometry::Rect(r) => Some(Polygon::from_rect(r)),
            Geometry::PolygonRef(p) => Some(p.as_ref().clone()),
            _ => None,
        }
    }
}

impl TryBoundingBox<Coord> for Geometry {
    fn try_bounding_box(&self) -> Option<Rect<Coord>> {
        match self {
            Geometry::Rect(r) => Some(*r),
            Geometry::PolygonRef(p) => p.try_bounding_box(),
            Geometry::Edge(e) => Some(e.bounding_box()),
            Geometry::EdgePair(ep) => Some(ep.bounding_box()),
            Geometry::Text(x) => Some(Rect::new(x.position, x.position)),
        }
    }
}

impl From<Rect<Coord>> for Geometry {
    fn from(r: Rect<Coord>) -> Self {
        Geometry::Rect(r)
    }
}

impl From<Rc<Polygon>> for Geometry {
    fn from(p: Rc<Polygon>) -> Self {
        Geometry::PolygonRef(p)
    }
}

impl From<Polygon> for Geometry {
    fn from(p: Polygon) -> Self {
        Geometry::PolygonRef(Rc::new(p))
    }
}

impl From<Edge> for Geometry {
    fn from(e: Edge) -> Self {
        Geometry::Edge(e)
    }
}

impl From<EdgePair> for Geometry {
    fn from(ep: EdgePair) -> Self {
        Geometry::EdgePair(ep)
    }
}

impl From<Text> for Geometry {
    fn from(t: Text) -> Self {
        Geometry::Text(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_area() {
        let p = Polygon::from_rect(&Rect::new(Point::new(0, 0), Point::new(10, 10)));
        assert_eq!(p.area_doubled(), 200);
        assert_eq!(p.vertex_count(), 4);
    }

    #[test]
    fn test_polygon_contains_point() {
        let p = Polygon::from_rect(&Rect::new(Point::new(0, 0), Point::new(10, 10)));
        assert!(p.contains_point(Point::new(5, 5)));
        assert!(p.contains_point(Point::new(0, 0)));
        assert!(p.contains_point(Point::new(10, 5)));
        assert!(!p.contains_point(Point::new(11, 5)));
        assert!(!p.contains_point(Point::new(-1, -1)));
    }

    #[test]
    fn test_polygon_canonical_rotation() {
        let a = Polygon::new(vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
        ]);
        let b = Polygon::new(vec![
            Point::new(10, 10),
            Point::new(0, 0),
            Point::new(10, 0),
        ]);
        assert_eq!(a.canonicalized(), b.canonicalized());
    }

    #[test]
    fn test_edge_pair_to_polygon() {
        let ep = EdgePair::new(
            Edge::new(Point::new(0, 0), Point::new(10, 0)),
            Edge::new(Point::new(10, 5), Point::new(0, 5)),
        );
        let poly = ep.to_polygon(0);
        assert_eq!(poly.area_doubled(), 100);

        // A degenerate pair becomes visible through the enlargement.
        let degenerate = EdgePair::new(
            Edge::new(Point::new(0, 0), Point::new(10, 0)),
            Edge::new(Point::new(0, 0), Point::new(10, 0)),
        );
        let marker = degenerate.to_polygon(1);
        assert!(marker.area_doubled() > 0);
    }
}
