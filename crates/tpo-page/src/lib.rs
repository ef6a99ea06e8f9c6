//! tpo Page - Cooperative page event loop
//!
//! Models the host environment the optimizer runs in: a virtual
//! millisecond clock, one-shot timers, idle callbacks with deadline
//! budgets, window/element event listeners, an intersection-observer
//! emulation and page globals (vendor pre-load buffers).
//!
//! The loop is single-threaded and driven explicitly: `advance(ms)`
//! moves the clock and fires due timers and idle deadlines in order,
//! `run_idle()` drains pending idle callbacks, `dispatch(..)` delivers
//! events and `scroll_to(y)` moves the viewport and re-checks
//! observers. One `Page` instance corresponds to one page load, so the
//! whole core is constructible fresh per test case.

mod events;
mod globals;
mod observer;
mod page;
mod timers;

pub use events::{EventTarget, EventType, ListenerId};
pub use globals::Global;
pub use observer::ObserverId;
pub use page::{Capabilities, Page};
pub use timers::TimerId;
pub use tpo_dom::ReadyState;
