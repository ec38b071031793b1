// Copyright (c) 2020-2021 Thomas Kramer.
// SPDX-FileCopyrightText: 2022 Thomas Kramer
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The `prelude` helps to import most commonly used modules.

pub use crate::clusters::{ClusterId, ClusterShape, ConnectedClusters, HierClusters};
pub use crate::connectivity::Connectivity;
pub use crate::deep::errors::DeepStoreError;
pub use crate::deep::iter::{IterFingerprint, RecursiveShapeIterator};
pub use crate::deep::layer::DeepLayer;
pub use crate::deep::store::{DeepShapeStore, LayoutRef};
pub use crate::extractor::{
    DeviceExtractorDelegate, ExtractorCore, NetlistDeviceExtractor, TerminalGeometry,
};
pub use crate::layout::prelude::*;
pub use crate::local::*;
pub use crate::netlist::prelude::*;
pub use crate::property_storage::PropertyValue;
pub use crate::rc_string::RcString;
pub use crate::region::Region;
