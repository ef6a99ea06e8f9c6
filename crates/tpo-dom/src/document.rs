//! Document - High-level document API
//!
//! Element arena split into head and body sections, selector queries
//! and ready-state tracking.

use crate::{DomError, Element, NodeId, SelectorList};

/// Document section an element lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Head,
    Body,
}

/// Document ready state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadyState {
    /// Document is still being parsed.
    Loading,
    /// DOM is parsed, load event not yet fired.
    #[default]
    Interactive,
    /// Load event has fired.
    Complete,
}

struct Slot {
    element: Element,
    section: Section,
    detached: bool,
}

/// An in-memory document
#[derive(Default)]
pub struct Document {
    nodes: Vec<Slot>,
    ready_state: ReadyState,
}

impl Document {
    /// Create a new document (ready state `Interactive`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Current ready state.
    #[inline]
    pub fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    /// Update the ready state.
    pub fn set_ready_state(&mut self, state: ReadyState) {
        self.ready_state = state;
    }

    /// Append an element to a section.
    pub fn append(&mut self, section: Section, element: Element) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        tracing::debug!("append <{}> to {:?}", element.tag(), section);
        self.nodes.push(Slot {
            element,
            section,
            detached: false,
        });
        id
    }

    /// Append an element to the body.
    pub fn append_to_body(&mut self, element: Element) -> NodeId {
        self.append(Section::Body, element)
    }

    /// Append an element to the head.
    pub fn append_to_head(&mut self, element: Element) -> NodeId {
        self.append(Section::Head, element)
    }

    /// Get an element.
    pub fn get(&self, id: NodeId) -> Option<&Element> {
        self.nodes
            .get(id.index())
            .filter(|s| !s.detached)
            .map(|s| &s.element)
    }

    /// Get an element mutably.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.nodes
            .get_mut(id.index())
            .filter(|s| !s.detached)
            .map(|s| &mut s.element)
    }

    /// Detach an element from the document.
    pub fn remove(&mut self, id: NodeId) -> Result<(), DomError> {
        let slot = self
            .nodes
            .get_mut(id.index())
            .filter(|s| !s.detached)
            .ok_or(DomError::UnknownNode(id))?;
        slot.detached = true;
        Ok(())
    }

    /// All attached elements matching a selector list, in document order.
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, DomError> {
        let list = SelectorList::parse(selector)?;
        Ok(self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.detached && list.matches(&s.element))
            .map(|(i, _)| NodeId(i as u32))
            .collect())
    }

    /// `src` values of attached head scripts, in insertion order.
    pub fn script_srcs(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|s| !s.detached && s.section == Section::Head && s.element.tag() == "script")
            .filter_map(|s| s.element.attribute("src").map(|v| v.to_string()))
            .collect()
    }

    /// Number of attached elements.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|s| !s.detached).count()
    }

    /// True when no elements are attached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rect;

    #[test]
    fn test_append_and_query() {
        let mut doc = Document::new();
        let a = doc.append_to_body(Element::new("div").with_class("rc-widget"));
        let _b = doc.append_to_body(Element::new("div").with_class("other"));
        let c = doc.append_to_body(Element::new("span").with_attr("data-recharge", "1"));

        let hits = doc.query_selector_all("[data-recharge], .rc-widget").unwrap();
        assert_eq!(hits, vec![a, c]);
    }

    #[test]
    fn test_remove_detaches() {
        let mut doc = Document::new();
        let id = doc.append_to_body(Element::new("div").with_class("rc-widget"));
        assert_eq!(doc.len(), 1);

        doc.remove(id).unwrap();
        assert!(doc.get(id).is_none());
        assert!(doc.query_selector_all(".rc-widget").unwrap().is_empty());
        assert!(doc.remove(id).is_err());
    }

    #[test]
    fn test_script_srcs_head_only() {
        let mut doc = Document::new();
        doc.append_to_head(Element::new("script").with_attr("src", "https://a.example/a.js"));
        doc.append_to_body(Element::new("script").with_attr("src", "https://b.example/b.js"));
        doc.append_to_head(
            Element::new("script")
                .with_attr("src", "https://c.example/c.js")
                .with_bounds(Rect::new(0.0, 0.0, 0.0, 0.0)),
        );

        assert_eq!(
            doc.script_srcs(),
            vec!["https://a.example/a.js", "https://c.example/c.js"]
        );
    }

    #[test]
    fn test_ready_state_default() {
        let doc = Document::new();
        assert_eq!(doc.ready_state(), ReadyState::Interactive);
    }
}
