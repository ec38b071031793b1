//! Error types of the layout container.

use crate::rc_string::RcString;

/// Errors of layout container operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// A cell with this name already exists.
    CellNameAlreadyExists(RcString),
    /// A cell with this name was not found.
    CellNameNotFound(RcString),
    /// The cell index is invalid.
    CellIndexNotFound,
}

impl std::fmt::Display for LayoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutError::CellNameAlreadyExists(n) => {
                write!(f, "cell name already exists: {}", n)
            }
            LayoutError::CellNameNotFound(n) => write!(f, "cell name not found: {}", n),
            LayoutError::CellIndexNotFound => write!(f, "cell index not found"),
        }
    }
}

impl std::error::Error for LayoutError {}
