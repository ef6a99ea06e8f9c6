//! Pre-load buffers
//!
//! Each vendor loader owns the global queue its real script reads on
//! arrival. The names are a wire contract with the vendor scripts;
//! they must stay bit-exact.

use serde_json::Value;
use tpo_page::Page;

/// A vendor's buffering global, known by name
#[derive(Debug, Clone, Copy)]
pub struct PreLoadBuffer {
    name: &'static str,
}

impl PreLoadBuffer {
    /// Bind a buffer to its well-known global name.
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    /// The global name vendor scripts read.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Create the queue global if it does not exist yet.
    pub fn ensure(&self, page: &Page) {
        page.ensure_queue(self.name);
    }

    /// Buffer a call for the vendor script to replay.
    pub fn push(&self, page: &Page, value: Value) {
        page.push_global(self.name, value);
    }
}
