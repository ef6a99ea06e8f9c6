//! tpo Defer - Deferred third-party script loading
//!
//! The trigger engine: arms a fire-once callback behind one of three
//! strategies (idle, first interaction, visibility) and injects script
//! resources when it fires. Capability absence degrades along the
//! chain visibility -> interaction -> timer; nothing here ever fails a
//! page.

mod engine;
mod inject;
mod resource;

pub use engine::{DeferLib, TriggerConfig};
pub use inject::{inject, InjectError};
pub use resource::ScriptResource;
