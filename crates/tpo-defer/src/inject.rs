//! Resource injector
//!
//! Creates one async script element per resource and appends it to the
//! document head. The injector returns `Result` so the best-effort
//! contract stays auditable; every caller in the core swallows the
//! error deliberately, because a missing enhancement must never break
//! a page.

use crate::ScriptResource;
use tpo_dom::{Element, NodeId};
use tpo_page::Page;

/// Injection error
#[derive(Debug, thiserror::Error)]
pub enum InjectError {
    #[error("empty script URI")]
    EmptyUri,

    #[error("empty attribute name for script {0}")]
    EmptyAttributeName(String),
}

/// Inject one script element into the document head.
pub fn inject(page: &Page, resource: &ScriptResource) -> Result<NodeId, InjectError> {
    if resource.uri().is_empty() {
        return Err(InjectError::EmptyUri);
    }

    let mut element = Element::new("script")
        .with_attr("src", resource.uri())
        .with_attr("async", "true");
    for (name, value) in resource.attributes() {
        if name.is_empty() {
            return Err(InjectError::EmptyAttributeName(resource.uri().to_string()));
        }
        element = element.with_attr(name, value);
    }

    tracing::debug!("inject script {}", resource.uri());
    Ok(page.append_to_head(element))
}

/// Inject a group of resources, swallowing per-resource failures.
pub(crate) fn inject_group(page: &Page, resources: &[ScriptResource]) {
    for resource in resources {
        if let Err(e) = inject(page, resource) {
            tracing::debug!("script injection skipped: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_appends_async_script() {
        let page = Page::new();
        let res = ScriptResource::new("https://cdn.example/a.js").with_attr("defer", "true");

        let node = inject(&page, &res).unwrap();
        assert_eq!(page.attribute(node, "src").as_deref(), Some("https://cdn.example/a.js"));
        assert_eq!(page.attribute(node, "async").as_deref(), Some("true"));
        assert_eq!(page.attribute(node, "defer").as_deref(), Some("true"));
        assert_eq!(page.injected_scripts(), vec!["https://cdn.example/a.js"]);
    }

    #[test]
    fn test_inject_rejects_empty_uri() {
        let page = Page::new();
        assert!(matches!(
            inject(&page, &ScriptResource::new("")),
            Err(InjectError::EmptyUri)
        ));
        assert!(page.injected_scripts().is_empty());
    }

    #[test]
    fn test_inject_group_skips_failures() {
        let page = Page::new();
        let group = vec![
            ScriptResource::new("https://cdn.example/a.js"),
            ScriptResource::new(""),
            ScriptResource::new("https://cdn.example/b.js"),
        ];

        inject_group(&page, &group);
        assert_eq!(
            page.injected_scripts(),
            vec!["https://cdn.example/a.js", "https://cdn.example/b.js"]
        );
    }
}
