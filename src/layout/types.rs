//! Basic type aliases of the layout model: coordinates and typed indices.

use super::cell::Cell;
use super::layout::LayerInfo;
use super::repository::PropertySet;
use super::shape_collection::Shape;
use crate::index::{Index, IndexGenerator};

/// Default unsigned integer type.
pub type UInt = u32;
/// Default signed integer type.
pub type SInt = i32;

/// Integer coordinate type.
pub type Coord = i32;

/// Coordinate type for areas and other products of two coordinates.
pub type AreaCoord = i64;

/// Data type used for identifying a layer.
pub type LayerIndex = Index<LayerInfo>;
pub(crate) type LayerIndexGenerator = IndexGenerator<LayerInfo>;

/// Data type used for identifying a cell.
pub type CellIndex = Index<Cell>;
pub(crate) type CellIndexGenerator = IndexGenerator<Cell>;

/// Data type used for identifying a shape inside a shape collection.
pub type ShapeIndex = Index<Shape>;

/// Data type used for identifying an interned property set.
pub type PropertiesId = Index<PropertySet>;
