// SPDX-FileCopyrightText: 2022 Thomas Kramer
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The interaction container handed to local operations: every subject shape
//! together with the intruder shapes found within the operation's interaction
//! radius. Candidate search runs over an R-tree of intruder bounding boxes.

use num_traits::{PrimInt, Signed};
use rstar::{RTree, RTreeObject};

use iron_shapes::rect::Rect;

use crate::layout::prelude::Coord;

/// Wrapper making an indexed bounding box usable within R-trees.
#[derive(Debug, Clone, PartialEq)]
struct BoxEntry<C> {
    bounding_box: Rect<C>,
    index: usize,
}

impl<C> RTreeObject for BoxEntry<C>
where
    C: PrimInt + Signed + std::fmt::Debug,
{
    type Envelope = rstar::AABB<[C; 2]>;

    fn envelope(&self) -> Self::Envelope {
        let ll = self.bounding_box.lower_left();
        let ur = self.bounding_box.upper_right();
        rstar::AABB::from_corners([ll.x, ll.y], [ur.x, ur.y])
    }
}

/// Subjects together with their intruders within the interaction radius.
pub struct ShapeInteractions<S, I> {
    subjects: Vec<S>,
    intruders: Vec<Vec<I>>,
}

impl<S, I> Default for ShapeInteractions<S, I> {
    fn default() -> Self {
        ShapeInteractions {
            subjects: Vec::new(),
            intruders: Vec::new(),
        }
    }
}

impl<S, I> ShapeInteractions<S, I> {
    /// Create an empty container.
    pub fn new() -> Self {
        Default::default()
    }

    /// Add a subject together with its intruders.
    pub fn add_subject(&mut self, subject: S, intruders: Vec<I>) {
        self.subjects.push(subject);
        self.intruders.push(intruders);
    }

    /// Number of subjects.
    pub fn num_subjects(&self) -> usize {
        self.subjects.len()
    }

    /// Get a subject by its position.
    pub fn subject(&self, i: usize) -> &S {
        &self.subjects[i]
    }

    /// Get the intruders of the `i`-th subject.
    pub fn intruders_for(&self, i: usize) -> &[I] {
        &self.intruders[i]
    }

    /// Iterate over `(position, subject)` pairs.
    pub fn each_subject(&self) -> impl Iterator<Item = (usize, &S)> {
        self.subjects.iter().enumerate()
    }
}

/// Build the interaction container for a set of subjects and intruders.
///
/// `dist` inflates the subject bounding boxes; intruders whose bounding box
/// intersects the inflated box become candidates. Shapes without a bounding box
/// do not participate.
pub fn scan_interactions<S, I, FS, FI>(
    subjects: &[S],
    intruders: &[I],
    dist: Coord,
    subject_bbox: FS,
    intruder_bbox: FI,
) -> ShapeInteractions<S, I>
where
    S: Clone,
    I: Clone,
    FS: Fn(&S) -> Option<Rect<Coord>>,
    FI: Fn(&I) -> Option<Rect<Coord>>,
{
    let entries: Vec<_> = intruders
        .iter()
        .enumerate()
        .filter_map(|(index, i)| {
            intruder_bbox(i).map(|bounding_box| BoxEntry {
                bounding_box,
                index,
            })
        })
        .collect();
    let rtree = RTree::bulk_load(entries);

    let mut interactions = ShapeInteractions::new();
    for subject in subjects {
        let bbox = match subject_bbox(subject) {
            Some(b) => b,
            None => continue,
        };
        let (ll, ur) = (bbox.lower_left(), bbox.upper_right());
        let query = rstar::AABB::from_corners(
            [ll.x.saturating_sub(dist), ll.y.saturating_sub(dist)],
            [ur.x.saturating_add(dist), ur.y.saturating_add(dist)],
        );
        let mut candidates: Vec<usize> = rtree
            .locate_in_envelope_intersecting(&query)
            .map(|e| e.index)
            .collect();
        candidates.sort_unstable();
        interactions.add_subject(
            subject.clone(),
            candidates.iter().map(|&i| intruders[i].clone()).collect(),
        );
    }
    interactions
}
