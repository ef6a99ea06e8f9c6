//! Trigger engine
//!
//! Three arming strategies over a fire-once callback. Each arming call
//! is fire-and-forget: listeners and timers race, the first to resolve
//! wins, and a local fired flag keeps the callback single-shot.

use crate::inject::inject_group;
use crate::ScriptResource;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tpo_page::{EventTarget, EventType, ListenerId, ObserverId, Page};

/// Idle-callback wait budget.
const IDLE_BUDGET_MS: u64 = 3000;
/// Plain-timer delay when the host has no idle facility.
const IDLE_FALLBACK_DELAY_MS: u64 = 2000;
/// Interaction arm fires anyway after this long.
const INTERACTION_CEILING_MS: u64 = 5000;
/// Proximity margin for visibility loading.
const VISIBILITY_MARGIN_PX: f32 = 200.0;
/// Visibility arm safety timer.
const VISIBILITY_SAFETY_MS: u64 = 10_000;

const INTERACTION_EVENTS: [EventType; 4] = [
    EventType::Scroll,
    EventType::MouseMove,
    EventType::TouchStart,
    EventType::KeyDown,
];

/// When a resource group loads
#[derive(Debug, Clone)]
pub enum TriggerConfig {
    /// Load when the host goes idle, or after the wait budget.
    Idle { timeout_ms: u64 },
    /// Load on the first user interaction, or after the ceiling.
    Interaction { fallback_ms: u64 },
    /// Load when a selector target nears the viewport, falling back to
    /// the interaction arm when observation is unavailable and to the
    /// idle arm after the safety timer.
    Visibility {
        selector: String,
        root_margin: f32,
        fallback_ms: u64,
    },
}

impl TriggerConfig {
    /// Idle trigger with the default wait budget.
    pub fn idle() -> Self {
        TriggerConfig::Idle {
            timeout_ms: IDLE_BUDGET_MS,
        }
    }

    /// Interaction trigger with the default ceiling.
    pub fn interaction() -> Self {
        TriggerConfig::Interaction {
            fallback_ms: INTERACTION_CEILING_MS,
        }
    }

    /// Visibility trigger with the default margin and safety timer.
    pub fn visibility(selector: impl Into<String>) -> Self {
        TriggerConfig::Visibility {
            selector: selector.into(),
            root_margin: VISIBILITY_MARGIN_PX,
            fallback_ms: VISIBILITY_SAFETY_MS,
        }
    }
}

/// The defer library: arms resource groups behind trigger strategies
#[derive(Clone)]
pub struct DeferLib {
    page: Page,
}

impl DeferLib {
    /// Create a defer library bound to a page.
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// The page this library injects into.
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Arm a resource group behind a trigger.
    pub fn load_group(&self, trigger: TriggerConfig, resources: Vec<ScriptResource>) {
        match trigger {
            TriggerConfig::Idle { timeout_ms } => {
                let page = self.page.clone();
                self.schedule_with_budget(timeout_ms, move || inject_group(&page, &resources));
            }
            TriggerConfig::Interaction { fallback_ms } => {
                let page = self.page.clone();
                self.on_first_interaction_with(fallback_ms, move || {
                    inject_group(&page, &resources)
                });
            }
            TriggerConfig::Visibility {
                selector,
                root_margin,
                fallback_ms,
            } => self.when_visible(&selector, root_margin, fallback_ms, resources),
        }
    }

    /// Load a group when the host goes idle.
    pub fn load_group_when_idle(&self, resources: Vec<ScriptResource>) {
        self.load_group(TriggerConfig::idle(), resources);
    }

    /// Load a group on the first user interaction.
    pub fn load_group_on_interaction(&self, resources: Vec<ScriptResource>) {
        self.load_group(TriggerConfig::interaction(), resources);
    }

    /// Load a group when a selector target nears the viewport.
    pub fn load_when_visible(&self, selector: &str, resources: Vec<ScriptResource>) {
        self.load_group(TriggerConfig::visibility(selector), resources);
    }

    /// Idle arm: run a callback when the host goes idle, with the
    /// default wait budget; plain timer when the facility is missing.
    pub fn schedule(&self, callback: impl FnOnce() + 'static) {
        self.schedule_with_budget(IDLE_BUDGET_MS, callback);
    }

    fn schedule_with_budget(&self, budget_ms: u64, callback: impl FnOnce() + 'static) {
        if self.page.capabilities().request_idle_callback {
            self.page.request_idle(budget_ms, callback);
        } else {
            self.page.set_timeout(IDLE_FALLBACK_DELAY_MS, callback);
        }
    }

    /// Interaction arm: run a callback on the first of scroll,
    /// mousemove, touchstart or keydown, or after the default ceiling.
    pub fn on_first_interaction(&self, callback: impl FnOnce() + 'static) {
        self.on_first_interaction_with(INTERACTION_CEILING_MS, callback);
    }

    fn on_first_interaction_with(&self, ceiling_ms: u64, callback: impl FnOnce() + 'static) {
        let fired = Rc::new(Cell::new(false));
        let pending: Rc<RefCell<Option<Box<dyn FnOnce()>>>> =
            Rc::new(RefCell::new(Some(Box::new(callback))));
        let listeners: Rc<RefCell<Vec<ListenerId>>> = Rc::new(RefCell::new(Vec::new()));

        // Shared by the four listeners and the ceiling timer; the flag
        // check and the callback run in the same event-loop turn.
        let fire: Rc<dyn Fn()> = {
            let page = self.page.clone();
            let fired = fired.clone();
            let pending = pending.clone();
            let listeners = listeners.clone();
            Rc::new(move || {
                if fired.replace(true) {
                    return;
                }
                for id in listeners.borrow_mut().drain(..) {
                    page.remove_listener(id);
                }
                if let Some(cb) = pending.borrow_mut().take() {
                    cb();
                }
            })
        };

        for event in INTERACTION_EVENTS {
            let fire = fire.clone();
            let id = self
                .page
                .add_listener(EventTarget::Window, event, true, move || fire());
            listeners.borrow_mut().push(id);
        }

        let fire = fire.clone();
        self.page.set_timeout(ceiling_ms, move || fire());
    }

    fn when_visible(
        &self,
        selector: &str,
        root_margin: f32,
        fallback_ms: u64,
        resources: Vec<ScriptResource>,
    ) {
        let targets = match self.page.query_selector_all(selector) {
            Ok(targets) => targets,
            Err(e) => {
                tracing::debug!("visibility selector rejected ({e}), using interaction");
                Vec::new()
            }
        };
        if !self.page.capabilities().intersection_observer || targets.is_empty() {
            tracing::debug!("no observable targets for {selector:?}, arming interaction");
            self.load_group_on_interaction(resources);
            return;
        }

        let loaded = Rc::new(Cell::new(false));
        let observer: Rc<Cell<Option<ObserverId>>> = Rc::new(Cell::new(None));
        let resources = Rc::new(resources);

        let load_all: Rc<dyn Fn()> = {
            let page = self.page.clone();
            let loaded = loaded.clone();
            let observer = observer.clone();
            Rc::new(move || {
                if loaded.replace(true) {
                    return;
                }
                inject_group(&page, &resources);
                if let Some(id) = observer.get() {
                    page.disconnect(id);
                }
            })
        };

        let id = {
            let load_all = load_all.clone();
            self.page
                .observe(&targets, root_margin, move |_| load_all())
        };
        observer.set(Some(id));

        // Safety: load on idle if never viewed
        let lib = self.clone();
        let loaded = loaded.clone();
        self.page.set_timeout(fallback_ms, move || {
            if !loaded.get() {
                lib.schedule(move || load_all());
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tpo_dom::{Element, Rect};
    use tpo_page::Capabilities;

    fn resources(uris: &[&str]) -> Vec<ScriptResource> {
        uris.iter().map(|u| ScriptResource::new(u)).collect()
    }

    #[test]
    fn test_idle_arm_fires_on_run_idle() {
        let page = Page::new();
        let lib = DeferLib::new(page.clone());

        lib.load_group_when_idle(resources(&["https://cdn.example/a.js"]));
        assert!(page.injected_scripts().is_empty());

        page.run_idle();
        assert_eq!(page.injected_scripts(), vec!["https://cdn.example/a.js"]);
    }

    #[test]
    fn test_idle_arm_fires_at_budget_deadline() {
        let page = Page::new();
        let lib = DeferLib::new(page.clone());

        lib.load_group_when_idle(resources(&["https://cdn.example/a.js"]));
        page.advance(2999);
        assert!(page.injected_scripts().is_empty());
        page.advance(1);
        assert_eq!(page.injected_scripts().len(), 1);
    }

    #[test]
    fn test_idle_arm_degrades_to_timer() {
        let page = Page::with_capabilities(Capabilities {
            request_idle_callback: false,
            intersection_observer: true,
        });
        let lib = DeferLib::new(page.clone());

        lib.load_group_when_idle(resources(&["https://cdn.example/a.js"]));
        page.run_idle();
        assert!(page.injected_scripts().is_empty(), "no idle facility");

        page.advance(2000);
        assert_eq!(page.injected_scripts().len(), 1);
    }

    #[test]
    fn test_interaction_arm_single_fire() {
        let page = Page::new();
        let lib = DeferLib::new(page.clone());

        lib.load_group_on_interaction(resources(&["https://cdn.example/a.js"]));

        page.dispatch(EventTarget::Window, EventType::KeyDown);
        assert_eq!(page.injected_scripts().len(), 1);

        // Second interaction of any kind is a no-op
        page.dispatch(EventTarget::Window, EventType::KeyDown);
        page.dispatch(EventTarget::Window, EventType::MouseMove);
        page.advance(10_000);
        assert_eq!(page.injected_scripts().len(), 1);
    }

    #[test]
    fn test_interaction_arm_ceiling() {
        let page = Page::new();
        let lib = DeferLib::new(page.clone());

        lib.load_group_on_interaction(resources(&["https://cdn.example/a.js"]));
        page.advance(4999);
        assert!(page.injected_scripts().is_empty());
        page.advance(1);
        assert_eq!(page.injected_scripts().len(), 1);

        // The ceiling fire also cleared the listeners
        page.dispatch(EventTarget::Window, EventType::TouchStart);
        assert_eq!(page.injected_scripts().len(), 1);
    }

    #[test]
    fn test_visibility_zero_targets_falls_back_to_interaction() {
        let page = Page::new();
        let lib = DeferLib::new(page.clone());

        lib.load_when_visible(".reviews-io", resources(&["https://cdn.example/r.js"]));
        assert!(page.injected_scripts().is_empty());

        page.dispatch(EventTarget::Window, EventType::MouseMove);
        assert_eq!(page.injected_scripts().len(), 1);
    }

    #[test]
    fn test_visibility_without_observer_falls_back_to_interaction() {
        let page = Page::with_capabilities(Capabilities {
            request_idle_callback: true,
            intersection_observer: false,
        });
        page.append_to_body(
            Element::new("div")
                .with_class("reviews-io")
                .with_bounds(Rect::new(0.0, 100.0, 400.0, 50.0)),
        );
        let lib = DeferLib::new(page.clone());

        lib.load_when_visible(".reviews-io", resources(&["https://cdn.example/r.js"]));
        page.dispatch(EventTarget::Window, EventType::Scroll);
        assert_eq!(page.injected_scripts().len(), 1);
    }

    #[test]
    fn test_visibility_fires_once_for_visible_target() {
        let page = Page::new();
        page.append_to_body(
            Element::new("div")
                .with_class("tolstoy-widget")
                .with_bounds(Rect::new(0.0, 100.0, 400.0, 300.0)),
        );
        let lib = DeferLib::new(page.clone());

        lib.load_when_visible(".tolstoy-widget", resources(&["https://cdn.example/t.js"]));
        page.advance(0); // initial observer delivery
        assert_eq!(page.injected_scripts().len(), 1);

        // Scrolling afterwards must not re-fire a disconnected observer
        page.scroll_to(10.0);
        page.advance(20_000);
        page.run_idle();
        assert_eq!(page.injected_scripts().len(), 1);
    }

    #[test]
    fn test_visibility_proximity_margin() {
        let page = Page::new();
        // 150px below the fold: inside the 200px margin
        page.append_to_body(
            Element::new("div")
                .with_class("near")
                .with_bounds(Rect::new(0.0, 950.0, 400.0, 50.0)),
        );
        let lib = DeferLib::new(page.clone());

        lib.load_when_visible(".near", resources(&["https://cdn.example/n.js"]));
        page.advance(0);
        assert_eq!(page.injected_scripts().len(), 1);
    }

    #[test]
    fn test_visibility_safety_timer_uses_idle_path() {
        let page = Page::new();
        page.append_to_body(
            Element::new("div")
                .with_class("below-fold")
                .with_bounds(Rect::new(0.0, 5000.0, 400.0, 50.0)),
        );
        let lib = DeferLib::new(page.clone());

        lib.load_when_visible(".below-fold", resources(&["https://cdn.example/b.js"]));
        page.advance(9999);
        assert!(page.injected_scripts().is_empty());

        // Safety timer hands the load to the idle arm
        page.advance(1);
        assert!(page.injected_scripts().is_empty());
        page.run_idle();
        assert_eq!(page.injected_scripts().len(), 1);

        // Observer was disconnected by the forced fire
        page.scroll_to(4800.0);
        assert_eq!(page.injected_scripts().len(), 1);
    }
}
