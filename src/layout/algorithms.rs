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

//! Collection of geometric algorithms used by the shape staging pipeline:
//! clipping of polygons against rectangles, splitting of oversized polygons
//! and interaction tests between polygons, edges and points.

use iron_shapes::point::Point;
use iron_shapes::rect::Rect;
use iron_shapes::traits::TryBoundingBox;

use super::geometry::{rect_contains_rect, rects_interact, Edge, Polygon};
use super::types::{AreaCoord, Coord};

/// Clip a polygon against an axis-aligned rectangle (Sutherland-Hodgman).
///
/// Intersection points with the clip boundary are rounded to integer coordinates.
/// Returns `None` if nothing of the polygon remains inside the rectangle.
pub fn clip_polygon_to_rect(polygon: &Polygon, clip: &Rect<Coord>) -> Option<Polygon> {
    if polygon.vertex_count() < 3 {
        return None;
    }
    if let Some(bbox) = polygon.try_bounding_box() {
        if rect_contains_rect(clip, &bbox) {
            return Some(polygon.clone());
        }
        if !rects_interact(&bbox, clip, true) {
            return None;
        }
    }

    let (ll, ur) = (clip.lower_left(), clip.upper_right());

    // Clip against one half plane. `inside` decides whether a point is kept,
    // `cross` computes the (rounded) intersection of an edge with the boundary.
    fn clip_half_plane<FI, FX>(points: Vec<Point<Coord>>, inside: FI, cross: FX) -> Vec<Point<Coord>>
    where
        FI: Fn(Point<Coord>) -> bool,
        FX: Fn(Point<Coord>, Point<Coord>) -> Point<Coord>,
    {
        let n = points.len();
        let mut out = Vec::with_capacity(n + 4);
        for i in 0..n {
            let p = points[i];
            let q = points[(i + 1) % n];
            match (inside(p), inside(q)) {
                (true, true) => out.push(q),
                (true, false) => out.push(cross(p, q)),
                (false, true) => {
                    out.push(cross(p, q));
                    out.push(q);
                }
                (false, false) => {}
            }
        }
        out
    }

    // Intersection of segment (p, q) with a vertical line x = c.
    fn cross_x(p: Point<Coord>, q: Point<Coord>, c: Coord) -> Point<Coord> {
        let t = (c - p.x) as f64 / (q.x - p.x) as f64;
        let y = p.y as f64 + (q.y - p.y) as f64 * t;
        Point::new(c, y.round() as Coord)
    }

    // Intersection of segment (p, q) with a horizontal line y = c.
    fn cross_y(p: Point<Coord>, q: Point<Coord>, c: Coord) -> Point<Coord> {
        let t = (c - p.y) as f64 / (q.y - p.y) as f64;
        let x = p.x as f64 + (q.x - p.x) as f64 * t;
        Point::new(x.round() as Coord, c)
    }

    let mut points = polygon.points().to_vec();
    points = clip_half_plane(points, |p| p.x >= ll.x, |p, q| cross_x(p, q, ll.x));
    points = clip_half_plane(points, |p| p.x <= ur.x, |p, q| cross_x(p, q, ur.x));
    points = clip_half_plane(points, |p| p.y >= ll.y, |p, q| cross_y(p, q, ll.y));
    points = clip_half_plane(points, |p| p.y <= ur.y, |p, q| cross_y(p, q, ur.y));

    let clipped = Polygon::new(points);
    if clipped.vertex_count() < 3 || clipped.area_doubled() == 0 {
        None
    } else {
        Some(clipped)
    }
}

/// Split a polygon into two parts along the middle of the longer axis of its
/// bounding box. Both parts share the (identically rounded) cut vertices, so no
/// gaps or overlaps are introduced along the cut.
///
/// Returns the input polygon unchanged if it cannot be split any further.
pub fn split_polygon(polygon: &Polygon) -> Vec<Polygon> {
    let bbox = match polygon.try_bounding_box() {
        Some(b) => b,
        None => return vec![polygon.clone()],
    };
    let (ll, ur) = (bbox.lower_left(), bbox.upper_right());
    let width = ur.x as AreaCoord - ll.x as AreaCoord;
    let height = ur.y as AreaCoord - ll.y as AreaCoord;
    if width < 2 && height < 2 {
        return vec![polygon.clone()];
    }

    let (clip_a, clip_b) = if width >= height {
        let mid = ll.x + ((ur.x as AreaCoord - ll.x as AreaCoord) / 2) as Coord;
        (
            Rect::new(ll, Point::new(mid, ur.y)),
            Rect::new(Point::new(mid, ll.y), ur),
        )
    } else {
        let mid = ll.y + ((ur.y as AreaCoord - ll.y as AreaCoord) / 2) as Coord;
        (
            Rect::new(ll, Point::new(ur.x, mid)),
            Rect::new(Point::new(ll.x, mid), ur),
        )
    };

    let parts: Vec<_> = [clip_a, clip_b]
        .iter()
        .filter_map(|c| clip_polygon_to_rect(polygon, c))
        .collect();
    if parts.is_empty() {
        vec![polygon.clone()]
    } else {
        parts
    }
}

fn orientation(a: Point<Coord>, b: Point<Coord>, c: Point<Coord>) -> AreaCoord {
    (b.x - a.x) as AreaCoord * (c.y - a.y) as AreaCoord
        - (c.x - a.x) as AreaCoord * (b.y - a.y) as AreaCoord
}

fn on_segment(a: Point<Coord>, b: Point<Coord>, p: Point<Coord>) -> bool {
    orientation(a, b, p) == 0
        && p.x >= a.x.min(b.x)
        && p.x <= a.x.max(b.x)
        && p.y >= a.y.min(b.y)
        && p.y <= a.y.max(b.y)
}

/// Tell whether two segments intersect. With `proper_only` only transversal
/// crossings count; otherwise touching end points and collinear overlap count too.
pub fn segments_intersect(e1: &Edge, e2: &Edge, proper_only: bool) -> bool {
    let o1 = orientation(e1.p1, e1.p2, e2.p1);
    let o2 = orientation(e1.p1, e1.p2, e2.p2);
    let o3 = orientation(e2.p1, e2.p2, e1.p1);
    let o4 = orientation(e2.p1, e2.p2, e1.p2);

    if ((o1 > 0 && o2 < 0) || (o1 < 0 && o2 > 0)) && ((o3 > 0 && o4 < 0) || (o3 < 0 && o4 > 0)) {
        return true;
    }
    if proper_only {
        return false;
    }
    (o1 == 0 && on_segment(e1.p1, e1.p2, e2.p1))
        || (o2 == 0 && on_segment(e1.p1, e1.p2, e2.p2))
        || (o3 == 0 && on_segment(e2.p1, e2.p2, e1.p1))
        || (o4 == 0 && on_segment(e2.p1, e2.p2, e1.p2))
}

/// Tell whether two polygons interact.
///
/// With `touching`, shared boundary points count as interaction. Without, the
/// interiors must overlap.
pub fn polygons_interact(a: &Polygon, b: &Polygon, touching: bool) -> bool {
    match (a.try_bounding_box(), b.try_bounding_box()) {
        (Some(ba), Some(bb)) => {
            if !rects_interact(&ba, &bb, touching) {
                return false;
            }
        }
        _ => return false,
    }

    // Transversal edge crossings imply overlapping interiors.
    for ea in a.each_edge() {
        for eb in b.each_edge() {
            if segments_intersect(&ea, &eb, true) {
                return true;
            }
        }
    }

    // Full containment of one polygon in the other.
    if let Some(&p) = a.points().first() {
        if b.contains_point(p) && (touching || interior_point_inside(a, b)) {
            return true;
        }
    }
    if let Some(&p) = b.points().first() {
        if a.contains_point(p) && (touching || interior_point_inside(b, a)) {
            return true;
        }
    }

    if touching {
        // Boundary contact without crossing.
        for ea in a.each_edge() {
            for eb in b.each_edge() {
                if segments_intersect(&ea, &eb, false) {
                    return true;
                }
            }
        }
    }
    false
}

// Check that some midpoint of an edge of `inner` lies strictly inside `outer`.
// Used to distinguish containment from pure boundary contact.
fn interior_point_inside(inner: &Polygon, outer: &Polygon) -> bool {
    inner.each_edge().any(|e| {
        let mid = Point::new((e.p1.x + e.p2.x) / 2, (e.p1.y + e.p2.y) / 2);
        outer.contains_point(mid) && !on_polygon_boundary(outer, mid)
    })
}

fn on_polygon_boundary(polygon: &Polygon, p: Point<Coord>) -> bool {
    polygon.each_edge().any(|e| on_segment(e.p1, e.p2, p))
}

/// Tell whether an edge interacts with a polygon (crosses its boundary or runs
/// inside it). With `touching`, boundary contact counts.
pub fn edge_interacts_with_polygon(edge: &Edge, polygon: &Polygon, touching: bool) -> bool {
    for pe in polygon.each_edge() {
        if segments_intersect(edge, &pe, !touching) {
            return true;
        }
    }
    polygon.contains_point(edge.p1) || polygon.contains_point(edge.p2)
}

/// Minimal squared distance between two segments.
pub fn segments_distance_sq(e1: &Edge, e2: &Edge) -> f64 {
    if segments_intersect(e1, e2, false) {
        return 0.0;
    }
    let d1 = point_segment_distance_sq(e1.p1, e2);
    let d2 = point_segment_distance_sq(e1.p2, e2);
    let d3 = point_segment_distance_sq(e2.p1, e1);
    let d4 = point_segment_distance_sq(e2.p2, e1);
    d1.min(d2).min(d3).min(d4)
}

/// Squared distance between a point and a segment.
pub fn point_segment_distance_sq(p: Point<Coord>, e: &Edge) -> f64 {
    let (ax, ay) = (e.p1.x as f64, e.p1.y as f64);
    let (bx, by) = (e.p2.x as f64, e.p2.y as f64);
    let (px, py) = (p.x as f64, p.y as f64);
    let (dx, dy) = (bx - ax, by - ay);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq > 0.0 {
        (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (cx, cy) = (ax + t * dx, ay + t * dy);
    (px - cx) * (px - cx) + (py - cy) * (py - cy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_poly(x1: Coord, y1: Coord, x2: Coord, y2: Coord) -> Polygon {
        Polygon::from_rect(&Rect::new(Point::new(x1, y1), Point::new(x2, y2)))
    }

    #[test]
    fn test_clip_fully_inside_and_outside() {
        let poly = rect_poly(0, 0, 10, 10);
        let inside = clip_polygon_to_rect(&poly, &Rect::new(Point::new(-5, -5), Point::new(20, 20)));
        assert_eq!(inside, Some(poly.clone()));
        let outside = clip_polygon_to_rect(&poly, &Rect::new(Point::new(20, 20), Point::new(30, 30)));
        assert_eq!(outside, None);
    }

    #[test]
    fn test_clip_partial() {
        let poly = rect_poly(0, 0, 10, 10);
        let clipped = clip_polygon_to_rect(&poly, &Rect::new(Point::new(5, -5), Point::new(20, 20)))
            .unwrap();
        assert_eq!(clipped.area_doubled(), 2 * 5 * 10);
    }

    #[test]
    fn test_split_preserves_area() {
        let poly = rect_poly(0, 0, 10, 4);
        let parts = split_polygon(&poly);
        assert_eq!(parts.len(), 2);
        let total: i64 = parts.iter().map(|p| p.area_doubled()).sum();
        assert_eq!(total, poly.area_doubled());
    }

    #[test]
    fn test_split_of_tiny_polygon_is_identity() {
        let poly = rect_poly(0, 0, 1, 1);
        let parts = split_polygon(&poly);
        assert_eq!(parts, vec![poly]);
    }

    #[test]
    fn test_polygons_interact() {
        let a = rect_poly(0, 0, 10, 10);
        let overlap = rect_poly(5, 5, 15, 15);
        let touch = rect_poly(10, 0, 20, 10);
        let apart = rect_poly(20, 20, 30, 30);
        let contained = rect_poly(2, 2, 8, 8);

        assert!(polygons_interact(&a, &overlap, false));
        assert!(polygons_interact(&a, &overlap, true));
        assert!(!polygons_interact(&a, &touch, false));
        assert!(polygons_interact(&a, &touch, true));
        assert!(!polygons_interact(&a, &apart, true));
        assert!(polygons_interact(&a, &contained, false));
        assert!(polygons_interact(&contained, &a, false));
    }

    #[test]
    fn test_segments_intersect() {
        let e1 = Edge::new(Point::new(0, 0), Point::new(10, 10));
        let e2 = Edge::new(Point::new(0, 10), Point::new(10, 0));
        let e3 = Edge::new(Point::new(10, 10), Point::new(20, 10));
        assert!(segments_intersect(&e1, &e2, true));
        assert!(!segments_intersect(&e1, &e3, true));
        assert!(segments_intersect(&e1, &e3, false));
    }

    #[test]
    fn test_repeated_split_bounds_vertex_count() {
        // A comb-shaped polygon with many vertices; repeated splitting must
        // terminate and preserve the area exactly (all cuts are at integer
        // coordinates on axis-parallel edges).
        let teeth = 50;
        let mut points = Vec::new();
        points.push(Point::new(0, 0));
        points.push(Point::new(4 * teeth, 0));
        for i in (0..teeth).rev() {
            points.push(Point::new(4 * i + 4, 10));
            points.push(Point::new(4 * i + 2, 10));
            points.push(Point::new(4 * i + 2, 2));
            points.push(Point::new(4 * i, 2));
        }
        let comb = Polygon::new(points);
        let original_area = comb.area_doubled();

        let mut queue = vec![comb];
        let mut done = Vec::new();
        while let Some(p) = queue.pop() {
            if p.vertex_count() <= 16 {
                done.push(p);
            } else {
                let parts = split_polygon(&p);
                assert!(parts.len() > 1, "Splitting must make progress.");
                queue.extend(parts);
            }
        }
        assert!(done.iter().all(|p| p.vertex_count() <= 16));
        let total: i64 = done.iter().map(|p| p.area_doubled()).sum();
        assert_eq!(total, original_area);
        assert!(done.len() > 1);
    }
}
