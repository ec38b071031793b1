//! Error type of the deep shape store.

use std::fmt;

/// Errors surfaced by the deep shape store and its handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeepStoreError {
    /// A `DeepLayer` handle was used after its store was dropped.
    StoreLost,
    /// A region without a deep delegate was passed where a deep region is required.
    NotDeep,
    /// The store holds more than one working layout but a single common
    /// hierarchy is required. This happens when hierarchical layers from
    /// different sources are mixed or when clipping is used.
    NotSingular,
    /// The operation needs a top cell but the layout has no cells.
    EmptyLayout,
    /// An invalid layout or layer index was passed.
    IndexOutOfRange,
    /// Building the working hierarchy failed.
    BuilderFailure(String),
}

impl fmt::Display for DeepStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeepStoreError::StoreLost => {
                write!(f, "store lost: the deep shape store no longer exists")
            }
            DeepStoreError::NotDeep => write!(f, "region is not backed by a deep layer"),
            DeepStoreError::NotSingular => write!(
                f,
                "deep shape store isn't singular; hierarchical layers come from different sources"
            ),
            DeepStoreError::EmptyLayout => write!(f, "layout does not have any cells"),
            DeepStoreError::IndexOutOfRange => write!(f, "invalid layout or layer index"),
            DeepStoreError::BuilderFailure(msg) => write!(f, "hierarchy building failed: {}", msg),
        }
    }
}

impl std::error::Error for DeepStoreError {}
