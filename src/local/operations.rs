// SPDX-FileCopyrightText: 2022 Thomas Kramer
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The local operation family. A local operation computes its result from a
//! subject shape and the intruder shapes found within its interaction radius;
//! hierarchical drivers built on the deep shape store run them cluster by
//! cluster.
//!
//! Every operation declares its interaction radius (`dist`) for candidate
//! pre-filtering and a hint telling the driver how to shortcut cells whose
//! intruder set is empty.

use crate::layout::algorithms::{edge_interacts_with_polygon, polygons_interact};
use crate::layout::prelude::{Coord, Edge, EdgePair, Layout, Polygon, Text};
use crate::local::edge_relations::EdgeRelationFilter;
use crate::local::interactions::ShapeInteractions;

use iron_shapes::point::Point;
use std::rc::Rc;

/// How a driver may shortcut a cell whose intruder set is empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OnEmptyIntruderHint {
    /// The result is empty; drop the subjects.
    Drop,
    /// The result equals the subjects; copy them through.
    CopySelf,
    /// No shortcut; the operation must run anyway.
    Skip,
}

/// Interaction mode for selection operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InteractionMode {
    /// The subject lies completely inside the counterpart.
    Inside,
    /// The subject does not interact with the counterpart at all.
    Outside,
    /// Subject and counterpart overlap (or touch, when touching is enabled).
    Overlap,
}

/// A local geometric operation over subjects `S`, intruders `I` and results `R`.
pub trait LocalOperation<S, I, R> {
    /// Compute the results for all subjects of the interaction container.
    fn compute_local(
        &self,
        layout: &Layout,
        interactions: &ShapeInteractions<S, I>,
        results: &mut Vec<R>,
    );

    /// Interaction radius in database units. Drivers use it to pre-filter
    /// intruder candidates.
    fn dist(&self) -> Coord;

    /// How to shortcut when the intruder set of a cell is empty.
    fn on_empty_intruder_hint(&self) -> OnEmptyIntruderHint;

    /// Human readable description for logs.
    fn description(&self) -> String;
}

// Tell whether polygon `inner` lies completely inside polygon `outer`.
fn polygon_inside(inner: &Polygon, outer: &Polygon) -> bool {
    inner.points().iter().all(|&p| outer.contains_point(p))
        && !inner.each_edge().any(|ea| {
            outer
                .each_edge()
                .any(|eb| crate::layout::algorithms::segments_intersect(&ea, &eb, true))
        })
}

fn interacts(mode: InteractionMode, touching: bool, subject: &Polygon, other: &Polygon) -> bool {
    match mode {
        InteractionMode::Inside => polygon_inside(subject, other),
        InteractionMode::Outside => !polygons_interact(subject, other, touching),
        InteractionMode::Overlap => polygons_interact(subject, other, touching),
    }
}

/// Emits edge pairs violating an edge relation (spacing, width, enclosure).
pub struct CheckLocalOperation {
    check: EdgeRelationFilter,
    different_polygons: bool,
    has_other: bool,
    shielded: bool,
}

impl CheckLocalOperation {
    /// Create a check operation.
    ///
    /// `different_polygons` excludes pairs of edges of the same polygon,
    /// `has_other` checks against a second input (the intruders), `shielded`
    /// suppresses pairs occluded by intervening geometry.
    pub fn new(
        check: EdgeRelationFilter,
        different_polygons: bool,
        has_other: bool,
        shielded: bool,
    ) -> Self {
        CheckLocalOperation {
            check,
            different_polygons,
            has_other,
            shielded,
        }
    }

    fn is_shielded(
        &self,
        pair: &EdgePair,
        subject: &Rc<Polygon>,
        partner: Option<&Rc<Polygon>>,
        all: &[Rc<Polygon>],
    ) -> bool {
        let mid = |e: &Edge| {
            Point::new(
                (e.p1.x + e.p2.x) / 2,
                (e.p1.y + e.p2.y) / 2,
            )
        };
        let (m1, m2) = (mid(&pair.first), mid(&pair.second));
        let center = Point::new((m1.x + m2.x) / 2, (m1.y + m2.y) / 2);
        all.iter().any(|p| {
            !Rc::ptr_eq(p, subject)
                && partner.map(|q| !Rc::ptr_eq(p, q)).unwrap_or(true)
                && p.contains_point(center)
        })
    }
}

impl LocalOperation<Rc<Polygon>, Rc<Polygon>, EdgePair> for CheckLocalOperation {
    fn compute_local(
        &self,
        _layout: &Layout,
        interactions: &ShapeInteractions<Rc<Polygon>, Rc<Polygon>>,
        results: &mut Vec<EdgePair>,
    ) {
        for (i, subject) in interactions.each_subject() {
            let intruders = interactions.intruders_for(i);

            // Edge pairs within the subject itself (width-style checks).
            if !self.has_other && !self.different_polygons {
                let edges: Vec<_> = subject.each_edge().collect();
                for a in 0..edges.len() {
                    for b in (a + 1)..edges.len() {
                        if let Some(pair) = self.check.check(&edges[a], &edges[b]) {
                            if !self.shielded
                                || !self.is_shielded(&pair, subject, None, intruders)
                            {
                                results.push(pair);
                            }
                        }
                    }
                }
            }

            // Edge pairs between the subject and the intruders.
            for intruder in intruders {
                if Rc::ptr_eq(subject, intruder) && self.different_polygons {
                    continue;
                }
                if Rc::ptr_eq(subject, intruder) && !self.has_other {
                    // Same polygon pairs were handled above.
                    continue;
                }
                for ea in subject.each_edge() {
                    for eb in intruder.each_edge() {
                        if let Some(pair) = self.check.check(&ea, &eb) {
                            if !self.shielded
                                || !self.is_shielded(&pair, subject, Some(intruder), intruders)
                            {
                                results.push(pair);
                            }
                        }
                    }
                }
            }
        }
    }

    fn dist(&self) -> Coord {
        self.check.distance()
    }

    fn on_empty_intruder_hint(&self) -> OnEmptyIntruderHint {
        if self.has_other || self.different_polygons {
            OnEmptyIntruderHint::Drop
        } else {
            // Same-polygon pairs exist even without intruders.
            OnEmptyIntruderHint::Skip
        }
    }

    fn description(&self) -> String {
        format!("check (distance {})", self.check.distance())
    }
}

/// Selects subject polygons by their interaction with the intruders.
pub struct InteractingLocalOperation {
    mode: InteractionMode,
    touching: bool,
    inverse: bool,
    min_count: usize,
    max_count: usize,
}

impl InteractingLocalOperation {
    /// Create a selection operation. A subject is selected when the number of
    /// intruders it interacts with (per `mode`/`touching`) lies in
    /// `[min_count, max_count]`; `inverse` selects the complement.
    pub fn new(
        mode: InteractionMode,
        touching: bool,
        inverse: bool,
        min_count: usize,
        max_count: usize,
    ) -> Self {
        InteractingLocalOperation {
            mode,
            touching,
            inverse,
            min_count,
            max_count,
        }
    }
}

impl LocalOperation<Rc<Polygon>, Rc<Polygon>, Rc<Polygon>> for InteractingLocalOperation {
    fn compute_local(
        &self,
        _layout: &Layout,
        interactions: &ShapeInteractions<Rc<Polygon>, Rc<Polygon>>,
        results: &mut Vec<Rc<Polygon>>,
    ) {
        for (i, subject) in interactions.each_subject() {
            let count = interactions
                .intruders_for(i)
                .iter()
                .filter(|intruder| !Rc::ptr_eq(subject, intruder))
                .filter(|intruder| interacts(self.mode, self.touching, subject, intruder))
                .count();
            let selected = count >= self.min_count && count <= self.max_count;
            if selected != self.inverse {
                results.push(subject.clone());
            }
        }
    }

    fn dist(&self) -> Coord {
        if self.touching {
            1
        } else {
            0
        }
    }

    fn on_empty_intruder_hint(&self) -> OnEmptyIntruderHint {
        let selected_on_empty = (self.min_count == 0) != self.inverse;
        if selected_on_empty {
            OnEmptyIntruderHint::CopySelf
        } else {
            OnEmptyIntruderHint::Drop
        }
    }

    fn description(&self) -> String {
        format!("interacting ({:?})", self.mode)
    }
}

/// Pulls the *other* polygons interacting with the subjects.
pub struct PullLocalOperation {
    mode: InteractionMode,
    touching: bool,
}

impl PullLocalOperation {
    /// Create a pull operation.
    pub fn new(mode: InteractionMode, touching: bool) -> Self {
        PullLocalOperation { mode, touching }
    }
}

impl LocalOperation<Rc<Polygon>, Rc<Polygon>, Rc<Polygon>> for PullLocalOperation {
    fn compute_local(
        &self,
        _layout: &Layout,
        interactions: &ShapeInteractions<Rc<Polygon>, Rc<Polygon>>,
        results: &mut Vec<Rc<Polygon>>,
    ) {
        for (i, subject) in interactions.each_subject() {
            for intruder in interactions.intruders_for(i) {
                if Rc::ptr_eq(subject, intruder) {
                    continue;
                }
                if interacts(self.mode, self.touching, subject, intruder)
                    && !results.iter().any(|r| Rc::ptr_eq(r, intruder))
                {
                    results.push(intruder.clone());
                }
            }
        }
    }

    fn dist(&self) -> Coord {
        if self.touching {
            1
        } else {
            0
        }
    }

    fn on_empty_intruder_hint(&self) -> OnEmptyIntruderHint {
        OnEmptyIntruderHint::Drop
    }

    fn description(&self) -> String {
        format!("pull ({:?})", self.mode)
    }
}

/// Selects subject polygons by their interaction with intruding edges.
pub struct InteractingWithEdgeLocalOperation {
    inverse: bool,
    min_count: usize,
    max_count: usize,
}

impl InteractingWithEdgeLocalOperation {
    /// Create a selection operation over edge intruders.
    pub fn new(inverse: bool, min_count: usize, max_count: usize) -> Self {
        InteractingWithEdgeLocalOperation {
            inverse,
            min_count,
            max_count,
        }
    }
}

impl LocalOperation<Rc<Polygon>, Edge, Rc<Polygon>> for InteractingWithEdgeLocalOperation {
    fn compute_local(
        &self,
        _layout: &Layout,
        interactions: &ShapeInteractions<Rc<Polygon>, Edge>,
        results: &mut Vec<Rc<Polygon>>,
    ) {
        for (i, subject) in interactions.each_subject() {
            let count = interactions
                .intruders_for(i)
                .iter()
                .filter(|e| edge_interacts_with_polygon(e, subject, true))
                .count();
            let selected = count >= self.min_count && count <= self.max_count;
            if selected != self.inverse {
                results.push(subject.clone());
            }
        }
    }

    fn dist(&self) -> Coord {
        1
    }

    fn on_empty_intruder_hint(&self) -> OnEmptyIntruderHint {
        let selected_on_empty = (self.min_count == 0) != self.inverse;
        if selected_on_empty {
            OnEmptyIntruderHint::CopySelf
        } else {
            OnEmptyIntruderHint::Drop
        }
    }

    fn description(&self) -> String {
        "interacting with edges".to_string()
    }
}

/// Pulls the edges interacting with the subjects.
pub struct PullWithEdgeLocalOperation;

impl PullWithEdgeLocalOperation {
    /// Create a pull operation over edge intruders.
    pub fn new() -> Self {
        PullWithEdgeLocalOperation
    }
}

impl Default for PullWithEdgeLocalOperation {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalOperation<Rc<Polygon>, Edge, Edge> for PullWithEdgeLocalOperation {
    fn compute_local(
        &self,
        _layout: &Layout,
        interactions: &ShapeInteractions<Rc<Polygon>, Edge>,
        results: &mut Vec<Edge>,
    ) {
        for (i, subject) in interactions.each_subject() {
            for e in interactions.intruders_for(i) {
                if edge_interacts_with_polygon(e, subject, true) && !results.contains(e) {
                    results.push(*e);
                }
            }
        }
    }

    fn dist(&self) -> Coord {
        1
    }

    fn on_empty_intruder_hint(&self) -> OnEmptyIntruderHint {
        OnEmptyIntruderHint::Drop
    }

    fn description(&self) -> String {
        "pull edges".to_string()
    }
}

/// Selects subject polygons by the texts they cover.
pub struct InteractingWithTextLocalOperation {
    inverse: bool,
    min_count: usize,
    max_count: usize,
}

impl InteractingWithTextLocalOperation {
    /// Create a selection operation over text intruders.
    pub fn new(inverse: bool, min_count: usize, max_count: usize) -> Self {
        InteractingWithTextLocalOperation {
            inverse,
            min_count,
            max_count,
        }
    }
}

impl LocalOperation<Rc<Polygon>, Text, Rc<Polygon>> for InteractingWithTextLocalOperation {
    fn compute_local(
        &self,
        _layout: &Layout,
        interactions: &ShapeInteractions<Rc<Polygon>, Text>,
        results: &mut Vec<Rc<Polygon>>,
    ) {
        for (i, subject) in interactions.each_subject() {
            let count = interactions
                .intruders_for(i)
                .iter()
                .filter(|t| subject.contains_point(t.position))
                .count();
            let selected = count >= self.min_count && count <= self.max_count;
            if selected != self.inverse {
                results.push(subject.clone());
            }
        }
    }

    fn dist(&self) -> Coord {
        1
    }

    fn on_empty_intruder_hint(&self) -> OnEmptyIntruderHint {
        let selected_on_empty = (self.min_count == 0) != self.inverse;
        if selected_on_empty {
            OnEmptyIntruderHint::CopySelf
        } else {
            OnEmptyIntruderHint::Drop
        }
    }

    fn description(&self) -> String {
        "interacting with texts".to_string()
    }
}

/// Pulls the texts covered by the subjects.
pub struct PullWithTextLocalOperation;

impl PullWithTextLocalOperation {
    /// Create a pull operation over text intruders.
    pub fn new() -> Self {
        PullWithTextLocalOperation
    }
}

impl Default for PullWithTextLocalOperation {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalOperation<Rc<Polygon>, Text, Text> for PullWithTextLocalOperation {
    fn compute_local(
        &self,
        _layout: &Layout,
        interactions: &ShapeInteractions<Rc<Polygon>, Text>,
        results: &mut Vec<Text>,
    ) {
        for (i, subject) in interactions.each_subject() {
            for t in interactions.intruders_for(i) {
                if subject.contains_point(t.position) && !results.contains(t) {
                    results.push(t.clone());
                }
            }
        }
    }

    fn dist(&self) -> Coord {
        1
    }

    fn on_empty_intruder_hint(&self) -> OnEmptyIntruderHint {
        OnEmptyIntruderHint::Drop
    }

    fn description(&self) -> String {
        "pull texts".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::edge_relations::Metrics;
    use crate::local::interactions::scan_interactions;
    use iron_shapes::rect::Rect;
    use iron_shapes::traits::TryBoundingBox;

    fn rect_poly(x1: Coord, y1: Coord, x2: Coord, y2: Coord) -> Rc<Polygon> {
        Rc::new(Polygon::from_rect(&Rect::new(
            Point::new(x1, y1),
            Point::new(x2, y2),
        )))
    }

    fn poly_interactions(
        subjects: &[Rc<Polygon>],
        intruders: &[Rc<Polygon>],
        dist: Coord,
    ) -> ShapeInteractions<Rc<Polygon>, Rc<Polygon>> {
        scan_interactions(
            subjects,
            intruders,
            dist,
            |s| s.try_bounding_box(),
            |i| i.try_bounding_box(),
        )
    }

    #[test]
    fn test_spacing_check_reports_close_pairs() {
        let layout = Layout::new();
        let a = rect_poly(0, 0, 100, 10);
        let b = rect_poly(0, 15, 100, 25);
        let c = rect_poly(0, 200, 100, 210);

        let op = CheckLocalOperation::new(
            EdgeRelationFilter::new(10, Metrics::Euclidean),
            true,
            true,
            false,
        );
        let interactions = poly_interactions(
            &[a.clone()],
            &[b.clone(), c.clone()],
            op.dist(),
        );
        let mut results = Vec::new();
        op.compute_local(&layout, &interactions, &mut results);
        assert!(!results.is_empty());
        // All reported pairs involve the close intruder only.
        assert!(results
            .iter()
            .all(|ep| ep.bounding_box().upper_right().y <= 25));
    }

    #[test]
    fn test_interacting_selects_overlapping() {
        let layout = Layout::new();
        let a = rect_poly(0, 0, 10, 10);
        let b = rect_poly(100, 100, 110, 110);
        let intruder = rect_poly(5, 5, 15, 15);

        let op = InteractingLocalOperation::new(InteractionMode::Overlap, true, false, 1, usize::MAX);
        let interactions =
            poly_interactions(&[a.clone(), b.clone()], &[intruder], op.dist());
        let mut results = Vec::new();
        op.compute_local(&layout, &interactions, &mut results);
        assert_eq!(results.len(), 1);
        assert!(Rc::ptr_eq(&results[0], &a));

        // The inverse returns the complement.
        let op_inv = InteractingLocalOperation::new(InteractionMode::Overlap, true, true, 1, usize::MAX);
        let intruder = rect_poly(5, 5, 15, 15);
        let interactions = poly_interactions(&[a.clone(), b.clone()], &[intruder], op_inv.dist());
        let mut results = Vec::new();
        op_inv.compute_local(&layout, &interactions, &mut results);
        assert_eq!(results.len(), 1);
        assert!(Rc::ptr_eq(&results[0], &b));
    }

    #[test]
    fn test_pull_returns_intruders() {
        let layout = Layout::new();
        let subject = rect_poly(0, 0, 10, 10);
        let touching = rect_poly(10, 0, 20, 10);
        let apart = rect_poly(100, 0, 110, 10);

        let op = PullLocalOperation::new(InteractionMode::Overlap, true);
        let interactions = poly_interactions(
            &[subject],
            &[touching.clone(), apart],
            op.dist(),
        );
        let mut results = Vec::new();
        op.compute_local(&layout, &interactions, &mut results);
        assert_eq!(results.len(), 1);
        assert!(Rc::ptr_eq(&results[0], &touching));
    }

    #[test]
    fn test_interacting_with_text() {
        let layout = Layout::new();
        let covering = rect_poly(0, 0, 100, 100);
        let elsewhere = rect_poly(500, 500, 600, 600);
        let label = Text::new("N1", Point::new(50, 50));

        let op = InteractingWithTextLocalOperation::new(false, 1, usize::MAX);
        let interactions = scan_interactions(
            &[covering.clone(), elsewhere],
            &[label],
            op.dist(),
            |s| s.try_bounding_box(),
            |t| Some(Rect::new(t.position, t.position)),
        );
        let mut results = Vec::new();
        op.compute_local(&layout, &interactions, &mut results);
        assert_eq!(results.len(), 1);
        assert!(Rc::ptr_eq(&results[0], &covering));
    }
}
