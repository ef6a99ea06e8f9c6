//! Script resources
//!
//! A URI plus the attributes to stamp onto the injected script
//! element. Immutable once constructed.

/// A deferrable script resource
#[derive(Debug, Clone)]
pub struct ScriptResource {
    uri: String,
    attributes: Vec<(String, String)>,
}

impl ScriptResource {
    /// Create a resource for a script URI.
    pub fn new(uri: &str) -> Self {
        Self {
            uri: uri.to_string(),
            attributes: Vec::new(),
        }
    }

    /// Add an attribute for the injected element.
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    /// Script URI.
    #[inline]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Attributes in insertion order.
    #[inline]
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }
}
