//! Error types for layout activation and renderer entry points.

use thiserror::Error;

use crate::config::ConfigError;
use crate::model::{NodeId, ViewType};

/// Errors raised while activating or driving a layout.
///
/// Construction-time variants describe a malformed model tree and are never
/// retried: the layout cannot be activated.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Form without a submit behavior and no enclosing form
    #[error("Child form '{form}' requires a parent form")]
    MissingParentForm { form: String },

    /// Pager enable behaviors declared outside of any pager
    #[error("'{identifier}' declares pager enable behaviors but has no pager state")]
    MissingPagerState { identifier: String },

    #[error("Pager '{pager}' has no pages")]
    EmptyPager { pager: String },

    #[error("Node {node} of type {view_type:?} cannot have children")]
    UnexpectedChildren { node: NodeId, view_type: ViewType },

    #[error("Node {0} does not exist in this layout")]
    UnknownNode(NodeId),

    #[error("Node {node} is not a {expected}")]
    WrongNodeKind { node: NodeId, expected: &'static str },

    /// Value of the wrong kind handed to an input
    #[error("Input '{identifier}' expects a {expected} value, got {found}")]
    ValueMismatch {
        identifier: String,
        expected: &'static str,
        found: &'static str,
    },
}
