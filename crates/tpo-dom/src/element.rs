//! Element
//!
//! A single element: tag name, id, classes, attributes and layout
//! bounds. Built with a builder API, immutable once in the document
//! except for attribute updates.

use crate::Rect;
use std::collections::HashMap;

/// A document element
#[derive(Debug, Clone, Default)]
pub struct Element {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attributes: HashMap<String, String>,
    bounds: Rect,
}

impl Element {
    /// Create a new element with the given tag name.
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        }
    }

    /// Set the element id.
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Add a class.
    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    /// Set an attribute.
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    /// Set layout bounds in document coordinates.
    ///
    /// Elements default to a zero-size rect, which never intersects a
    /// viewport. Hosts that want visibility triggers to fire must give
    /// their targets real bounds.
    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = bounds;
        self
    }

    /// Tag name (lowercase).
    #[inline]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Element id, if any.
    #[inline]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Check for a class.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Get an attribute value.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|v| v.as_str())
    }

    /// Check for an attribute.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Set an attribute in place.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        self.attributes.insert(name.to_string(), value.to_string());
    }

    /// Layout bounds.
    #[inline]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }
}
