//! Widget front door
//!
//! Merges configuration, waits for the document to be ready, then runs
//! one facade pass: each enabled widget whose target elements exist on
//! the page gets its trigger armed. Widgets with no matching elements
//! cost nothing. A late cleanup sweep removes scripts marked unused.

use crate::config::{CustomWidget, WidgetConfig, WidgetOverrides};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tpo_defer::{inject, DeferLib, ScriptResource, TriggerConfig};
use tpo_dom::NodeId;
use tpo_page::{EventTarget, EventType, Page, ReadyState};

/// Well-known page global holding caller configuration.
pub const WIDGET_CONFIG_GLOBAL: &str = "WIDGET_CONFIG";

/// Settle delay before the facade pass runs.
const INIT_DELAY_MS: u64 = 100;
/// Delay after window load before unused scripts are swept.
const CLEANUP_DELAY_MS: u64 = 30_000;
/// Root margin for the reviews pre-visibility observer.
const REVIEWS_MARGIN_PX: f32 = 200.0;

const UNUSED_SCRIPT_SELECTOR: &str = r#"script[data-unused="true"]"#;

#[derive(Default)]
struct FacadeState {
    pass_done: bool,
    recharge_loaded: bool,
    reviews_loaded: bool,
    yotpo_loaded: bool,
}

struct Inner {
    page: Page,
    defer: DeferLib,
    config: WidgetConfig,
    state: RefCell<FacadeState>,
}

/// The deferred widget loader
#[derive(Clone)]
pub struct WidgetOptimizer {
    inner: Rc<Inner>,
}

impl WidgetOptimizer {
    /// Merge configuration and schedule the facade pass.
    pub fn init(page: &Page, overrides: &WidgetOverrides) -> Self {
        let this = Self {
            inner: Rc::new(Inner {
                page: page.clone(),
                defer: DeferLib::new(page.clone()),
                config: WidgetConfig::merged(overrides),
                state: RefCell::new(FacadeState::default()),
            }),
        };

        if page.ready_state() == ReadyState::Loading {
            let t = this.clone();
            page.add_listener(EventTarget::Window, EventType::DomContentLoaded, true, move || {
                t.schedule_pass();
            });
        } else {
            this.schedule_pass();
        }

        let t = this.clone();
        page.add_listener(EventTarget::Window, EventType::Load, true, move || {
            let again = t.clone();
            t.inner.page.set_timeout(CLEANUP_DELAY_MS, move || {
                again.cleanup_unused_scripts();
            });
        });

        this
    }

    /// Initialize from the `WIDGET_CONFIG` page global, if present.
    pub fn auto_init(page: &Page) -> Option<Self> {
        let value = page.global(WIDGET_CONFIG_GLOBAL)?.as_value()?.clone();
        match serde_json::from_value::<WidgetOverrides>(value) {
            Ok(overrides) => Some(Self::init(page, &overrides)),
            Err(e) => {
                tracing::warn!("malformed {WIDGET_CONFIG_GLOBAL}: {e}");
                None
            }
        }
    }

    /// Merged configuration (read-only after init).
    pub fn config(&self) -> &WidgetConfig {
        &self.inner.config
    }

    fn schedule_pass(&self) {
        let this = self.clone();
        self.inner.page.set_timeout(INIT_DELAY_MS, move || this.run_pass());
    }

    /// Run the facade pass. Repeated calls are no-ops.
    pub fn run_pass(&self) {
        if !self.claim(|s| &mut s.pass_done) {
            return;
        }
        tracing::info!("arming widget facades");
        self.recharge_facade();
        self.reviews_io_facade();
        self.yotpo_facade();
        self.tolstoy_facade();
        self.klaviyo_facade();
        self.custom_widgets();
    }

    /// Click-to-load: the subscription widget only matters once the
    /// visitor engages with a subscription element.
    fn recharge_facade(&self) {
        let cfg = &self.inner.config.recharge;
        if !cfg.enabled {
            return;
        }
        let elements = self.query(&cfg.selectors);
        if elements.is_empty() {
            return;
        }
        for element in elements {
            let this = self.clone();
            let url = cfg.script_url.clone();
            self.inner.page.add_listener(
                EventTarget::Node(element),
                EventType::Click,
                true,
                move || {
                    if !this.claim(|s| &mut s.recharge_loaded) {
                        return;
                    }
                    if let Err(e) = inject(&this.inner.page, &ScriptResource::new(&url)) {
                        tracing::debug!("recharge injection skipped: {e}");
                    }
                },
            );
        }
    }

    /// Pre-visibility observer hands off to the defer engine once any
    /// review element approaches the viewport.
    fn reviews_io_facade(&self) {
        let cfg = &self.inner.config.reviews_io;
        if !cfg.enabled {
            return;
        }
        let elements = self.query(&cfg.selectors);
        if elements.is_empty() {
            return;
        }
        if !self.inner.page.capabilities().intersection_observer {
            tracing::debug!("reviews facade skipped: no intersection observer");
            return;
        }

        let this = self.clone();
        let selector = cfg.selectors.join(", ");
        let scripts = cfg.scripts.clone();
        let observer = Rc::new(Cell::new(None));
        let handle = observer.clone();
        let id = self.inner.page.observe(&elements, REVIEWS_MARGIN_PX, move |_| {
            if !this.claim(|s| &mut s.reviews_loaded) {
                return;
            }
            let resources = scripts.iter().map(|s| ScriptResource::new(s)).collect();
            this.inner.defer.load_when_visible(&selector, resources);
            if let Some(id) = handle.get() {
                this.inner.page.disconnect(id);
            }
        });
        observer.set(Some(id));
    }

    /// Hover-to-load: reviews rarely matter before the pointer reaches
    /// them, and the loader URL is keyed by account.
    fn yotpo_facade(&self) {
        let cfg = &self.inner.config.yotpo;
        if !cfg.enabled || cfg.app_key.is_empty() {
            return;
        }
        let elements = self.query(&cfg.selectors);
        if elements.is_empty() {
            return;
        }
        let url = format!("{}{}", cfg.script_url, cfg.app_key);
        let selector = cfg.selectors.join(", ");
        for element in elements {
            for event in [EventType::MouseEnter, EventType::TouchStart, EventType::Click] {
                let this = self.clone();
                let url = url.clone();
                let selector = selector.clone();
                self.inner.page.add_listener(
                    EventTarget::Node(element),
                    event,
                    true,
                    move || {
                        if !this.claim(|s| &mut s.yotpo_loaded) {
                            return;
                        }
                        this.inner.defer.load_when_visible(
                            &selector,
                            vec![ScriptResource::new(&url).with_attr("defer", "true")],
                        );
                    },
                );
            }
        }
    }

    fn tolstoy_facade(&self) {
        let cfg = &self.inner.config.tolstoy;
        if !cfg.enabled {
            return;
        }
        if self.query(&cfg.selectors).is_empty() {
            return;
        }
        if !self.inner.page.capabilities().intersection_observer {
            tracing::debug!("tolstoy facade skipped: no intersection observer");
            return;
        }
        self.inner.defer.load_when_visible(
            &cfg.selectors.join(", "),
            vec![ScriptResource::new(&cfg.script_url).with_attr("defer", "true")],
        );
    }

    fn klaviyo_facade(&self) {
        let cfg = &self.inner.config.klaviyo;
        if !cfg.enabled || cfg.company_id.is_empty() {
            return;
        }
        if self.query(&cfg.selectors).is_empty() {
            return;
        }
        if !self.inner.page.capabilities().intersection_observer {
            tracing::debug!("klaviyo facade skipped: no intersection observer");
            return;
        }
        let url = format!("{}?company_id={}", cfg.script_url, cfg.company_id);
        self.inner.defer.load_when_visible(
            &cfg.selectors.join(", "),
            vec![ScriptResource::new(&url).with_attr("async", "true")],
        );
    }

    fn custom_widgets(&self) {
        for widget in &self.inner.config.custom {
            if !widget.enabled || widget.selectors.is_empty() || widget.script_url.is_empty() {
                continue;
            }
            if self.query(&widget.selectors).is_empty() {
                continue;
            }
            let mut resource = ScriptResource::new(&widget.script_url);
            for (name, value) in &widget.attrs {
                resource = resource.with_attr(name, value);
            }
            match custom_trigger(widget) {
                Some(trigger) => self.inner.defer.load_group(trigger, vec![resource]),
                None => tracing::warn!(
                    "unrecognized load strategy {:?} for {}",
                    widget.load_strategy,
                    widget.script_url
                ),
            }
        }
    }

    /// Remove scripts the page has flagged as unused.
    fn cleanup_unused_scripts(&self) {
        let nodes = match self.inner.page.query_selector_all(UNUSED_SCRIPT_SELECTOR) {
            Ok(nodes) => nodes,
            Err(_) => return,
        };
        if nodes.is_empty() {
            return;
        }
        tracing::debug!("removing {} unused scripts", nodes.len());
        for node in nodes {
            let _ = self.inner.page.remove_node(node);
        }
    }

    fn query(&self, selectors: &[String]) -> Vec<NodeId> {
        if selectors.is_empty() {
            return Vec::new();
        }
        match self.inner.page.query_selector_all(&selectors.join(", ")) {
            Ok(nodes) => nodes,
            Err(e) => {
                tracing::debug!("widget selector rejected: {e}");
                Vec::new()
            }
        }
    }

    /// Test-and-set on a guard flag; true when this call claimed it.
    fn claim(&self, flag: impl FnOnce(&mut FacadeState) -> &mut bool) -> bool {
        let mut state = self.inner.state.borrow_mut();
        let flag = flag(&mut state);
        if *flag {
            false
        } else {
            *flag = true;
            true
        }
    }
}

fn custom_trigger(widget: &CustomWidget) -> Option<TriggerConfig> {
    let strategy = if widget.load_strategy.is_empty() {
        "visibility"
    } else {
        widget.load_strategy.as_str()
    };
    match strategy {
        "visibility" => Some(TriggerConfig::visibility(widget.selectors.join(", "))),
        "interaction" => Some(TriggerConfig::interaction()),
        "idle" => Some(TriggerConfig::idle()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        KlaviyoOverrides, RechargeOverrides, ReviewsIoOverrides, TolstoyOverrides, YotpoOverrides,
    };
    use serde_json::json;
    use tpo_dom::{Element, Rect};
    use tpo_page::Capabilities;

    fn visible(tag: &str) -> Element {
        Element::new(tag).with_bounds(Rect::new(0.0, 100.0, 300.0, 100.0))
    }

    #[test]
    fn test_yotpo_hover_loads_once() {
        let page = Page::new();
        let node = page.append_to_body(visible("div").with_class("yotpo-widget-instance"));

        let overrides = WidgetOverrides {
            yotpo: Some(YotpoOverrides {
                enabled: Some(true),
                app_key: Some("yk-1".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        WidgetOptimizer::init(&page, &overrides);
        page.advance(INIT_DELAY_MS);
        assert!(page.injected_scripts().is_empty());

        page.dispatch(EventTarget::Node(node), EventType::MouseEnter);
        page.advance(0);
        let scripts = page.injected_scripts();
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].ends_with("yk-1"));

        // Remaining armed events must not load a second copy
        page.dispatch(EventTarget::Node(node), EventType::Click);
        page.dispatch(EventTarget::Node(node), EventType::TouchStart);
        page.advance(0);
        assert_eq!(page.injected_scripts().len(), 1);
    }

    #[test]
    fn test_yotpo_without_app_key_is_inert() {
        let page = Page::new();
        let node = page.append_to_body(visible("div").with_class("yotpo-main-widget"));

        let overrides = WidgetOverrides {
            yotpo: Some(YotpoOverrides {
                enabled: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        WidgetOptimizer::init(&page, &overrides);
        page.advance(INIT_DELAY_MS);
        page.dispatch(EventTarget::Node(node), EventType::MouseEnter);
        page.advance(0);
        assert!(page.injected_scripts().is_empty());
    }

    #[test]
    fn test_recharge_click_loads_once_across_elements() {
        let page = Page::new();
        let first = page.append_to_body(visible("div").with_class("rc-widget"));
        let second = page.append_to_body(visible("div").with_class("rc-subscription"));

        let overrides = WidgetOverrides {
            recharge: Some(RechargeOverrides {
                enabled: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        WidgetOptimizer::init(&page, &overrides);
        page.advance(INIT_DELAY_MS);

        page.dispatch(EventTarget::Node(first), EventType::Click);
        assert_eq!(page.injected_scripts().len(), 1);

        page.dispatch(EventTarget::Node(second), EventType::Click);
        assert_eq!(page.injected_scripts().len(), 1);
    }

    #[test]
    fn test_reviews_observer_hands_off_to_defer() {
        let page = Page::new();
        page.append_to_body(visible("div").with_class("reviews-io"));

        let overrides = WidgetOverrides {
            reviews_io: Some(ReviewsIoOverrides {
                enabled: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        WidgetOptimizer::init(&page, &overrides);
        page.advance(INIT_DELAY_MS);
        page.advance(0);

        let scripts = page.injected_scripts();
        assert_eq!(scripts.len(), 3);
        assert!(scripts.iter().all(|s| s.contains("widget.reviews.io")));
    }

    #[test]
    fn test_tolstoy_skipped_without_observer_facility() {
        let caps = Capabilities {
            request_idle_callback: true,
            intersection_observer: false,
        };
        let page = Page::with_capabilities(caps);
        page.append_to_body(visible("div").with_class("tolstoy-widget"));

        let overrides = WidgetOverrides {
            tolstoy: Some(TolstoyOverrides {
                enabled: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        WidgetOptimizer::init(&page, &overrides);
        page.advance(20_000);
        page.run_idle();
        assert!(page.injected_scripts().is_empty());
    }

    #[test]
    fn test_klaviyo_url_keyed_by_company() {
        let page = Page::new();
        page.append_to_body(visible("div").with_class("klaviyo-form-trigger"));

        let overrides = WidgetOverrides {
            klaviyo: Some(KlaviyoOverrides {
                enabled: Some(true),
                company_id: Some("K7".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        WidgetOptimizer::init(&page, &overrides);
        page.advance(INIT_DELAY_MS);
        page.advance(0);

        let scripts = page.injected_scripts();
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].ends_with("klaviyo.js?company_id=K7"));
    }

    #[test]
    fn test_custom_widget_idle_strategy() {
        let page = Page::new();
        page.append_to_body(visible("div").with_class("chat"));

        let overrides = WidgetOverrides {
            custom: Some(vec![CustomWidget {
                enabled: true,
                selectors: vec![".chat".into()],
                script_url: "https://example.com/chat.js".into(),
                load_strategy: "idle".into(),
                ..Default::default()
            }]),
            ..Default::default()
        };
        WidgetOptimizer::init(&page, &overrides);
        page.advance(INIT_DELAY_MS);
        assert!(page.injected_scripts().is_empty());

        page.run_idle();
        assert_eq!(page.injected_scripts(), vec!["https://example.com/chat.js"]);
    }

    #[test]
    fn test_custom_widget_interaction_strategy() {
        let page = Page::new();
        page.append_to_body(visible("div").with_class("popup"));

        let overrides = WidgetOverrides {
            custom: Some(vec![CustomWidget {
                enabled: true,
                selectors: vec![".popup".into()],
                script_url: "https://example.com/popup.js".into(),
                load_strategy: "interaction".into(),
                ..Default::default()
            }]),
            ..Default::default()
        };
        WidgetOptimizer::init(&page, &overrides);
        page.advance(INIT_DELAY_MS);

        page.dispatch(EventTarget::Window, EventType::Scroll);
        assert_eq!(page.injected_scripts(), vec!["https://example.com/popup.js"]);
    }

    #[test]
    fn test_custom_widget_unknown_strategy_is_inert() {
        let page = Page::new();
        page.append_to_body(visible("div").with_class("mystery"));

        let overrides = WidgetOverrides {
            custom: Some(vec![CustomWidget {
                enabled: true,
                selectors: vec![".mystery".into()],
                script_url: "https://example.com/mystery.js".into(),
                load_strategy: "eager".into(),
                ..Default::default()
            }]),
            ..Default::default()
        };
        WidgetOptimizer::init(&page, &overrides);
        page.advance(60_000);
        page.run_idle();
        page.dispatch(EventTarget::Window, EventType::Scroll);
        assert!(page.injected_scripts().is_empty());
    }

    #[test]
    fn test_custom_widget_attrs_reach_the_script() {
        let page = Page::new();
        page.append_to_body(visible("div").with_class("chat"));

        let mut attrs = std::collections::HashMap::new();
        attrs.insert("data-widget".to_string(), "chat".to_string());
        let overrides = WidgetOverrides {
            custom: Some(vec![CustomWidget {
                enabled: true,
                selectors: vec![".chat".into()],
                script_url: "https://example.com/chat.js".into(),
                attrs,
                load_strategy: "idle".into(),
            }]),
            ..Default::default()
        };
        WidgetOptimizer::init(&page, &overrides);
        page.advance(INIT_DELAY_MS);
        page.run_idle();

        let nodes = page.query_selector_all(r#"script[data-widget="chat"]"#).unwrap();
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_init_waits_for_dom_content_loaded() {
        let page = Page::new();
        page.set_ready_state(ReadyState::Loading);
        page.append_to_body(visible("div").with_class("reviews-io"));

        let overrides = WidgetOverrides {
            reviews_io: Some(ReviewsIoOverrides {
                enabled: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        WidgetOptimizer::init(&page, &overrides);
        page.advance(5000);
        assert!(page.injected_scripts().is_empty());

        page.finish_loading();
        page.advance(INIT_DELAY_MS);
        page.advance(0);
        assert_eq!(page.injected_scripts().len(), 3);
    }

    #[test]
    fn test_cleanup_removes_flagged_scripts() {
        let page = Page::new();
        page.append_to_head(
            Element::new("script")
                .with_attr("src", "https://example.com/stale.js")
                .with_attr("data-unused", "true"),
        );

        WidgetOptimizer::init(&page, &WidgetOverrides::default());
        page.finish_loading();
        assert_eq!(page.injected_scripts().len(), 1);

        page.advance(CLEANUP_DELAY_MS);
        assert!(page.injected_scripts().is_empty());
    }

    #[test]
    fn test_auto_init_reads_page_global() {
        let page = Page::new();
        page.append_to_body(visible("div").with_class("rc-widget"));
        page.set_global(
            WIDGET_CONFIG_GLOBAL,
            json!({ "recharge": { "enabled": true } }),
        );

        let optimizer = WidgetOptimizer::auto_init(&page).unwrap();
        assert!(optimizer.config().recharge.enabled);
        assert!(WidgetOptimizer::auto_init(&Page::new()).is_none());
    }

    #[test]
    fn test_auto_init_rejects_malformed_config() {
        let page = Page::new();
        page.set_global(WIDGET_CONFIG_GLOBAL, json!({ "recharge": "yes" }));
        assert!(WidgetOptimizer::auto_init(&page).is_none());
    }
}
