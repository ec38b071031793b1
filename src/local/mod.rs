// SPDX-FileCopyrightText: 2022 Thomas Kramer
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Local geometric operations: the parameterized kernels of Boolean/DRC-style
//! algorithms acting on clusters of interacting shapes.

pub mod edge_relations;
pub mod interactions;
pub mod operations;

pub use edge_relations::{EdgeRelationFilter, Metrics};
pub use interactions::{scan_interactions, ShapeInteractions};
pub use operations::{
    CheckLocalOperation, InteractingLocalOperation, InteractingWithEdgeLocalOperation,
    InteractingWithTextLocalOperation, InteractionMode, LocalOperation, OnEmptyIntruderHint,
    PullLocalOperation, PullWithEdgeLocalOperation, PullWithTextLocalOperation,
};
