//! Page globals
//!
//! The well-known global slots vendor scripts read by convention:
//! buffering queues (`dataLayer`, `uetq`, ...) and plain values
//! (`_linkedin_partner_id`). Written once per page load by the vendor
//! loaders, read by the injected scripts.

use serde_json::Value;

/// A page-global slot
#[derive(Debug, Clone, PartialEq)]
pub enum Global {
    /// A buffering queue (calls issued before the real script arrives).
    Queue(Vec<Value>),
    /// A plain value.
    Value(Value),
}

impl Global {
    /// The queue contents, if this slot is a queue.
    pub fn as_queue(&self) -> Option<&[Value]> {
        match self {
            Global::Queue(q) => Some(q),
            Global::Value(_) => None,
        }
    }

    /// The plain value, if this slot is one.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Global::Queue(_) => None,
            Global::Value(v) => Some(v),
        }
    }
}
