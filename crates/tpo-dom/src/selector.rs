//! Selector matching
//!
//! The CSS subset the optimizer configs actually use: tag, `#id`,
//! `.class`, `[attr]`, `[attr="value"]`, compounds of those, and
//! comma-separated lists. No combinators.

use crate::{DomError, Element};

/// A parsed comma-separated selector list.
#[derive(Debug, Clone)]
pub struct SelectorList {
    compounds: Vec<Compound>,
}

/// One compound selector, e.g. `script[data-unused="true"]`.
#[derive(Debug, Clone)]
struct Compound {
    parts: Vec<SimpleSelector>,
}

#[derive(Debug, Clone, PartialEq)]
enum SimpleSelector {
    Tag(String),
    Id(String),
    Class(String),
    AttrPresent(String),
    AttrEquals(String, String),
}

impl SelectorList {
    /// Parse a selector list.
    pub fn parse(input: &str) -> Result<Self, DomError> {
        let mut compounds = Vec::new();
        for part in input.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(DomError::InvalidSelector(input.to_string()));
            }
            compounds.push(Compound::parse(part)?);
        }
        if compounds.is_empty() {
            return Err(DomError::InvalidSelector(input.to_string()));
        }
        Ok(Self { compounds })
    }

    /// Check whether any compound in the list matches the element.
    pub fn matches(&self, element: &Element) -> bool {
        self.compounds.iter().any(|c| c.matches(element))
    }
}

impl Compound {
    fn parse(input: &str) -> Result<Self, DomError> {
        let mut parts = Vec::new();
        let chars: Vec<char> = input.chars().collect();
        let mut i = 0;

        // Leading tag name
        if i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '-' || chars[i] == '*') {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '-') {
                i += 1;
            }
            if chars[start] == '*' {
                i = start + 1; // universal selector matches everything
            } else {
                let tag: String = chars[start..i].iter().collect();
                parts.push(SimpleSelector::Tag(tag.to_ascii_lowercase()));
            }
        }

        while i < chars.len() {
            match chars[i] {
                '#' | '.' => {
                    let kind = chars[i];
                    i += 1;
                    let start = i;
                    while i < chars.len()
                        && (chars[i].is_ascii_alphanumeric() || chars[i] == '-' || chars[i] == '_')
                    {
                        i += 1;
                    }
                    if i == start {
                        return Err(DomError::InvalidSelector(input.to_string()));
                    }
                    let name: String = chars[start..i].iter().collect();
                    parts.push(if kind == '#' {
                        SimpleSelector::Id(name)
                    } else {
                        SimpleSelector::Class(name)
                    });
                }
                '[' => {
                    i += 1;
                    let close = chars[i..]
                        .iter()
                        .position(|&c| c == ']')
                        .ok_or_else(|| DomError::InvalidSelector(input.to_string()))?;
                    let body: String = chars[i..i + close].iter().collect();
                    i += close + 1;
                    parts.push(Self::parse_attr(&body, input)?);
                }
                _ => return Err(DomError::InvalidSelector(input.to_string())),
            }
        }

        if parts.is_empty() && !input.starts_with('*') {
            return Err(DomError::InvalidSelector(input.to_string()));
        }
        Ok(Self { parts })
    }

    fn parse_attr(body: &str, input: &str) -> Result<SimpleSelector, DomError> {
        match body.split_once('=') {
            None => {
                let name = body.trim();
                if name.is_empty() {
                    return Err(DomError::InvalidSelector(input.to_string()));
                }
                Ok(SimpleSelector::AttrPresent(name.to_string()))
            }
            Some((name, value)) => {
                let name = name.trim();
                let value = value.trim().trim_matches('"').trim_matches('\'');
                if name.is_empty() {
                    return Err(DomError::InvalidSelector(input.to_string()));
                }
                Ok(SimpleSelector::AttrEquals(name.to_string(), value.to_string()))
            }
        }
    }

    fn matches(&self, element: &Element) -> bool {
        self.parts.iter().all(|p| match p {
            SimpleSelector::Tag(tag) => element.tag() == tag,
            SimpleSelector::Id(id) => element.id() == Some(id.as_str()),
            SimpleSelector::Class(class) => element.has_class(class),
            SimpleSelector::AttrPresent(name) => element.has_attribute(name),
            SimpleSelector::AttrEquals(name, value) => {
                element.attribute(name) == Some(value.as_str())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_selector() {
        let sel = SelectorList::parse(".rc-widget").unwrap();
        assert!(sel.matches(&Element::new("div").with_class("rc-widget")));
        assert!(!sel.matches(&Element::new("div").with_class("rc-other")));
    }

    #[test]
    fn test_attr_selectors() {
        let sel = SelectorList::parse("[data-recharge]").unwrap();
        assert!(sel.matches(&Element::new("div").with_attr("data-recharge", "")));
        assert!(!sel.matches(&Element::new("div")));

        let sel = SelectorList::parse(r#"script[data-unused="true"]"#).unwrap();
        let script = Element::new("script").with_attr("data-unused", "true");
        assert!(sel.matches(&script));
        assert!(!sel.matches(&Element::new("script").with_attr("data-unused", "false")));
        assert!(!sel.matches(&Element::new("div").with_attr("data-unused", "true")));
    }

    #[test]
    fn test_selector_list() {
        let sel = SelectorList::parse("[data-reviews-io], .reviews-io, #r-widget").unwrap();
        assert!(sel.matches(&Element::new("div").with_class("reviews-io")));
        assert!(sel.matches(&Element::new("div").with_id("r-widget")));
        assert!(sel.matches(&Element::new("section").with_attr("data-reviews-io", "1")));
        assert!(!sel.matches(&Element::new("div").with_class("unrelated")));
    }

    #[test]
    fn test_compound_selector() {
        let sel = SelectorList::parse("div.rc-widget#main").unwrap();
        let el = Element::new("div").with_id("main").with_class("rc-widget");
        assert!(sel.matches(&el));
        assert!(!sel.matches(&Element::new("span").with_id("main").with_class("rc-widget")));
    }

    #[test]
    fn test_invalid_selectors() {
        assert!(SelectorList::parse("").is_err());
        assert!(SelectorList::parse(".widget,").is_err());
        assert!(SelectorList::parse("[unclosed").is_err());
        assert!(SelectorList::parse("div > span").is_err());
    }
}
