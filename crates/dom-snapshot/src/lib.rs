pub mod html;
pub mod tree;

use thiserror::Error;

pub use html::{extract_text, fragment, is_ignored_tag, outer_html};
pub use tree::{DomTree, NodeId, NodeKind};

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum DomError {
    #[error("node is no longer part of the tree")]
    InvalidNode,
    #[error("operation requires an element node")]
    NotAnElement,
    #[error("cannot detach the tree root")]
    CannotDetachRoot,
}

pub type DomResult<T> = Result<T, DomError>;
