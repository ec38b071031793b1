// SPDX-FileCopyrightText: 2022 Thomas Kramer
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Edge relation filters: the distance predicates behind spacing, width and
//! enclosure checks. A filter inspects a pair of edges and produces an edge pair
//! marker when the relation is violated.

use crate::layout::algorithms::segments_distance_sq;
use crate::layout::prelude::{Coord, Edge, EdgePair};

/// How the distance between two edges is measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Metrics {
    /// Shortest distance between any two points of the edges.
    Euclidean,
    /// Perpendicular distance, counted only where the edges overlap in
    /// projection. Non-parallel edges never violate a projection relation.
    Projection,
}

/// Distance relation between edge pairs.
#[derive(Clone, Copy, Debug)]
pub struct EdgeRelationFilter {
    distance: Coord,
    metrics: Metrics,
}

impl EdgeRelationFilter {
    /// Create a filter flagging edge pairs closer than `distance`.
    pub fn new(distance: Coord, metrics: Metrics) -> Self {
        EdgeRelationFilter { distance, metrics }
    }

    /// The check distance. Drives candidate pre-filtering in hierarchical drivers.
    pub fn distance(&self) -> Coord {
        self.distance
    }

    /// The distance metrics.
    pub fn metrics(&self) -> Metrics {
        self.metrics
    }

    /// Check a pair of edges. Returns the violation marker if the edges are
    /// closer than the check distance (and, for projection metrics, overlap in
    /// projection).
    pub fn check(&self, a: &Edge, b: &Edge) -> Option<EdgePair> {
        if self.distance <= 0 {
            return None;
        }
        match self.metrics {
            Metrics::Euclidean => {
                let limit = self.distance as f64;
                if segments_distance_sq(a, b) < limit * limit {
                    Some(EdgePair::new(*a, *b))
                } else {
                    None
                }
            }
            Metrics::Projection => self.check_projection(a, b),
        }
    }

    fn check_projection(&self, a: &Edge, b: &Edge) -> Option<EdgePair> {
        let (dax, day) = (
            (a.p2.x - a.p1.x) as f64,
            (a.p2.y - a.p1.y) as f64,
        );
        let (dbx, dby) = (
            (b.p2.x - b.p1.x) as f64,
            (b.p2.y - b.p1.y) as f64,
        );
        let cross = dax * dby - day * dbx;
        if cross.abs() > 1e-9 {
            return None;
        }
        let len = (dax * dax + day * day).sqrt();
        if len == 0.0 {
            return None;
        }
        let (ux, uy) = (dax / len, day / len);

        // Perpendicular separation of the two carrier lines.
        let (wx, wy) = (
            (b.p1.x - a.p1.x) as f64,
            (b.p1.y - a.p1.y) as f64,
        );
        let separation = (wx * uy - wy * ux).abs();
        if separation >= self.distance as f64 {
            return None;
        }

        // Overlap of the projections onto the common direction.
        let project = |x: Coord, y: Coord| (x - a.p1.x) as f64 * ux + (y - a.p1.y) as f64 * uy;
        let (a0, a1) = (0.0, len);
        let (b0, b1) = (project(b.p1.x, b.p1.y), project(b.p2.x, b.p2.y));
        let (b_lo, b_hi) = (b0.min(b1), b0.max(b1));
        if b_hi.min(a1) - b_lo.max(a0) > 0.0 {
            Some(EdgePair::new(*a, *b))
        } else {
            None
        }
    }
}
