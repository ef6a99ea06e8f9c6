//! tpo DOM - Minimal document model
//!
//! Element arena, selector matching and viewport geometry for the
//! script-deferral engine. The document only models what the optimizer
//! consumes: elements discovered by selector, script elements appended
//! to the head, and element bounds for visibility checks.

mod document;
mod element;
mod geometry;
mod selector;

pub use document::{Document, ReadyState, Section};
pub use element::Element;
pub use geometry::{Rect, Viewport};
pub use selector::SelectorList;

/// Node identifier (index into the document arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Arena index
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// DOM error
#[derive(Debug, thiserror::Error)]
pub enum DomError {
    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    #[error("unknown node: {0:?}")]
    UnknownNode(NodeId),
}
