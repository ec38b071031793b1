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
//! Shape receivers are the composable filter stages through which every ingested
//! shape passes on its way into a working layout: clipping, reduction of oversized
//! polygons, interning of polygon references (with text expansion), and edge or
//! edge pair emission.
//!
//! Stages chain through `&mut` borrows held by the driving call, so a failing
//! drive unhooks the chain structurally.

use iron_shapes::point::Point;
use iron_shapes::rect::Rect;
use iron_shapes::traits::TryBoundingBox;

use crate::layout::algorithms::{clip_polygon_to_rect, split_polygon};
use crate::layout::geometry::{
    rect_contains_point, rect_contains_rect, rect_intersection, rects_interact, Geometry,
};
use crate::layout::prelude::{
    Cell, Coord, CplxTrans, LayerIndex, Layout, Polygon, PropertySet,
};
use crate::rc_string::RcString;

use std::rc::Rc;

/// Per-cell context handed to the receiver stages: the working cell under
/// construction, the target layer, the local clip region (in source cell
/// coordinates) and the transformation to apply to emitted shapes.
pub struct CellContext<'a> {
    /// The working layout under construction.
    pub layout: &'a Layout,
    /// The working cell under construction.
    pub cell: Rc<Cell>,
    /// The layer receiving the shapes.
    pub target_layer: LayerIndex,
    /// Clip region in source cell coordinates, if the cell is only partially covered.
    pub clip: Option<Rect<Coord>>,
    /// Transformation from source cell coordinates to working cell coordinates.
    pub shape_trans: CplxTrans,
}

/// A stage of the shape receiver chain.
pub trait HierarchyBuilderShapeReceiver {
    /// Called when the builder enters a fresh working cell.
    fn begin_cell(&mut self, _ctx: &CellContext) {}
    /// Called when the builder leaves the working cell.
    fn end_cell(&mut self, _ctx: &CellContext) {}
    /// Process one shape (in source cell coordinates).
    fn push(&mut self, shape: &Geometry, ctx: &CellContext);
}

/// Clips incoming shapes against the local clip region of the cell.
/// Shapes fully outside are dropped, shapes fully inside pass unchanged.
pub struct ClippingReceiver<'a> {
    next: &'a mut dyn HierarchyBuilderShapeReceiver,
}

impl<'a> ClippingReceiver<'a> {
    /// Create a clipping stage in front of `next`.
    pub fn new(next: &'a mut dyn HierarchyBuilderShapeReceiver) -> Self {
        ClippingReceiver { next }
    }
}

impl<'a> HierarchyBuilderShapeReceiver for ClippingReceiver<'a> {
    fn begin_cell(&mut self, ctx: &CellContext) {
        self.next.begin_cell(ctx)
    }

    fn end_cell(&mut self, ctx: &CellContext) {
        self.next.end_cell(ctx)
    }

    fn push(&mut self, shape: &Geometry, ctx: &CellContext) {
        let clip = match ctx.clip {
            None => return self.next.push(shape, ctx),
            Some(clip) => clip,
        };

        match shape {
            Geometry::Rect(r) => {
                if rect_contains_rect(&clip, r) {
                    self.next.push(shape, ctx);
                } else if let Some(clipped) = rect_intersection(r, &clip) {
                    self.next.push(&Geometry::Rect(clipped), ctx);
                }
            }
            Geometry::PolygonRef(p) => {
                let bbox = p.try_bounding_box();
                if bbox.map(|b| rect_contains_rect(&clip, &b)).unwrap_or(false) {
                    self.next.push(shape, ctx);
                } else if let Some(clipped) = clip_polygon_to_rect(p, &clip) {
                    self.next.push(&Geometry::PolygonRef(Rc::new(clipped)), ctx);
                }
            }
            Geometry::Text(t) => {
                if rect_contains_point(&clip, t.position) {
                    self.next.push(shape, ctx);
                }
            }
            other => {
                // Edges and edge pairs do not normally flow through the polygon
                // chain; pass them when their extent touches the clip region.
                if other
                    .try_bounding_box()
                    .map(|b| rects_interact(&b, &clip, true))
                    .unwrap_or(false)
                {
                    self.next.push(other, ctx);
                }
            }
        }
    }
}

/// Decomposes polygons into smaller fragments whenever the bounding box area
/// exceeds `max_area_ratio` times the polygon area or the vertex count exceeds
/// `max_vertex_count`. The decomposition is deterministic: equal inputs produce
/// equal fragment sets.
pub struct ReducingReceiver<'a> {
    next: &'a mut dyn HierarchyBuilderShapeReceiver,
    max_area_ratio: f64,
    max_vertex_count: usize,
}

impl<'a> ReducingReceiver<'a> {
    /// Create a reducing stage in front of `next`.
    /// Zero values disable the respective criterion.
    pub fn new(
        next: &'a mut dyn HierarchyBuilderShapeReceiver,
        max_area_ratio: f64,
        max_vertex_count: usize,
    ) -> Self {
        ReducingReceiver {
            next,
            max_area_ratio,
            max_vertex_count,
        }
    }

    fn needs_reduction(&self, polygon: &Polygon) -> bool {
        if self.max_vertex_count > 0 && polygon.vertex_count() > self.max_vertex_count {
            return true;
        }
        if self.max_area_ratio > 0.0 {
            let area = polygon.area_doubled();
            if area == 0 {
                return false;
            }
            if let Some(bbox) = polygon.try_bounding_box() {
                let (ll, ur) = (bbox.lower_left(), bbox.upper_right());
                let bbox_area_doubled =
                    2.0 * (ur.x as f64 - ll.x as f64) * (ur.y as f64 - ll.y as f64);
                if bbox_area_doubled > self.max_area_ratio * area as f64 {
                    return true;
                }
            }
        }
        false
    }

    fn reduce(&mut self, polygon: &Polygon, ctx: &CellContext) {
        let mut queue = vec![polygon.clone()];
        while let Some(p) = queue.pop() {
            if !self.needs_reduction(&p) {
                self.next.push(&Geometry::PolygonRef(Rc::new(p)), ctx);
                continue;
            }
            let parts = split_polygon(&p);
            if parts.len() <= 1 {
                // The polygon cannot be split any further.
                self.next.push(&Geometry::PolygonRef(Rc::new(p)), ctx);
            } else {
                queue.extend(parts);
            }
        }
    }
}

impl<'a> HierarchyBuilderShapeReceiver for ReducingReceiver<'a> {
    fn begin_cell(&mut self, ctx: &CellContext) {
        self.next.begin_cell(ctx)
    }

    fn end_cell(&mut self, ctx: &CellContext) {
        self.next.end_cell(ctx)
    }

    fn push(&mut self, shape: &Geometry, ctx: &CellContext) {
        match shape {
            Geometry::PolygonRef(p) => {
                if self.needs_reduction(p) {
                    self.reduce(p, ctx)
                } else {
                    self.next.push(shape, ctx)
                }
            }
            other => self.next.push(other, ctx),
        }
    }
}

/// Terminal stage of the polygon chain: inserts polygons as interned polygon
/// references, keeps boxes as boxes and expands texts into small boxes.
pub struct PolygonRefBuildingReceiver {
    text_enlargement: i32,
    text_property_name: Option<RcString>,
}

impl PolygonRefBuildingReceiver {
    /// Create the terminal polygon stage.
    ///
    /// A negative `text_enlargement` drops all texts. Otherwise texts become
    /// boxes spanning `text_enlargement` database units around the anchor. If
    /// `text_property_name` is given, the original string is attached to the box
    /// as a property under that name.
    pub fn new(text_enlargement: i32, text_property_name: Option<RcString>) -> Self {
        PolygonRefBuildingReceiver {
            text_enlargement,
            text_property_name,
        }
    }
}

impl HierarchyBuilderShapeReceiver for PolygonRefBuildingReceiver {
    fn push(&mut self, shape: &Geometry, ctx: &CellContext) {
        let shapes = ctx.cell.shapes_get_or_create(ctx.target_layer);
        match shape {
            Geometry::Rect(r) => {
                shapes.insert(Geometry::Rect(ctx.shape_trans.transform_rect(r)));
            }
            Geometry::PolygonRef(p) => {
                let transformed = p.transformed(&ctx.shape_trans);
                let interned = ctx.layout.shape_repository().intern(transformed);
                shapes.insert(Geometry::PolygonRef(interned));
            }
            Geometry::Text(t) => {
                if self.text_enlargement < 0 {
                    return;
                }
                let enl = self.text_enlargement;
                let anchor = ctx.shape_trans.transform_point(t.position);
                let bx = Rect::new(
                    Point::new(anchor.x - enl, anchor.y - enl),
                    Point::new(anchor.x + enl, anchor.y + enl),
                );
                match &self.text_property_name {
                    Some(name) => {
                        let props = ctx.layout.properties_repository();
                        let name_id = props.property_name_id(name.clone());
                        let mut set = PropertySet::new();
                        set.insert(name_id, t.text.to_string());
                        let pid = props.properties_id(set);
                        shapes.insert_with_properties(Geometry::Rect(bx), pid);
                    }
                    None => {
                        shapes.insert(Geometry::Rect(bx));
                    }
                }
            }
            // Edges and edge pairs have no place on a polygon layer.
            Geometry::Edge(_) | Geometry::EdgePair(_) => {}
        }
    }
}

/// Terminal stage of the edge chain. With `as_edges` the source is taken as
/// edges and passed through; otherwise polygon and box outlines are decomposed
/// into their boundary edges.
pub struct EdgeBuildingReceiver {
    as_edges: bool,
}

impl EdgeBuildingReceiver {
    /// Create the terminal edge stage.
    pub fn new(as_edges: bool) -> Self {
        EdgeBuildingReceiver { as_edges }
    }
}

impl HierarchyBuilderShapeReceiver for EdgeBuildingReceiver {
    fn push(&mut self, shape: &Geometry, ctx: &CellContext) {
        let shapes = ctx.cell.shapes_get_or_create(ctx.target_layer);
        match shape {
            Geometry::Edge(e) => {
                shapes.insert(Geometry::Edge(e.transformed(&ctx.shape_trans)));
            }
            Geometry::EdgePair(ep) if self.as_edges => {
                let t = ep.transformed(&ctx.shape_trans);
                shapes.insert(Geometry::Edge(t.first));
                shapes.insert(Geometry::Edge(t.second));
            }
            Geometry::Rect(r) if !self.as_edges => {
                let poly = Polygon::from_rect(r);
                for e in poly.each_edge() {
                    shapes.insert(Geometry::Edge(e.transformed(&ctx.shape_trans)));
                }
            }
            Geometry::PolygonRef(p) if !self.as_edges => {
                for e in p.each_edge() {
                    shapes.insert(Geometry::Edge(e.transformed(&ctx.shape_trans)));
                }
            }
            _ => {}
        }
    }
}

/// Terminal stage of the edge pair chain: passes edge pairs through, everything
/// else is dropped.
pub struct EdgePairBuildingReceiver;

impl EdgePairBuildingReceiver {
    /// Create the terminal edge pair stage.
    pub fn new() -> Self {
        EdgePairBuildingReceiver
    }
}

impl Default for EdgePairBuildingReceiver {
    fn default() -> Self {
        Self::new()
    }
}

impl HierarchyBuilderShapeReceiver for EdgePairBuildingReceiver {
    fn push(&mut self, shape: &Geometry, ctx: &CellContext) {
        if let Geometry::EdgePair(ep) = shape {
            ctx.cell
                .shapes_get_or_create(ctx.target_layer)
                .insert(Geometry::EdgePair(ep.transformed(&ctx.shape_trans)));
        }
    }
}
