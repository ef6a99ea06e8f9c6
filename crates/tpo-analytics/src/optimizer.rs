//! Analytics front door
//!
//! Merges configuration, arms the interaction/fallback triggers, and
//! orchestrates the vendor loaders in two waves. One instance per page
//! load; every guard flag lives on the instance.

use crate::config::{AnalyticsConfig, AnalyticsOverrides};
use crate::vendors::*;
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tpo_defer::{inject, ScriptResource};
use tpo_page::{EventTarget, EventType, Page};

/// Well-known page global holding caller configuration.
pub const ANALYTICS_CONFIG_GLOBAL: &str = "ANALYTICS_CONFIG";

/// First wave (GTM + Facebook Pixel) delay after the critical load fires.
const CRITICAL_WAVE_DELAY_MS: u64 = 100;
/// Second wave (Bing + LinkedIn) delay; priority, not interdependency.
const SECONDARY_WAVE_DELAY_MS: u64 = 2000;

const INIT_EVENTS: [EventType; 5] = [
    EventType::Scroll,
    EventType::MouseMove,
    EventType::TouchStart,
    EventType::KeyDown,
    EventType::Click,
];

#[derive(Default)]
struct LoadState {
    analytics: bool,
    gtm: bool,
    facebook: bool,
    bing: bool,
    linkedin: bool,
}

struct Inner {
    page: Page,
    config: AnalyticsConfig,
    state: RefCell<LoadState>,
}

/// The deferred analytics loader
#[derive(Clone)]
pub struct OptimizedAnalytics {
    inner: Rc<Inner>,
}

impl OptimizedAnalytics {
    /// Merge configuration and arm the load triggers.
    pub fn init(page: &Page, overrides: &AnalyticsOverrides) -> Self {
        let this = Self {
            inner: Rc::new(Inner {
                page: page.clone(),
                config: AnalyticsConfig::merged(overrides),
                state: RefCell::new(LoadState::default()),
            }),
        };
        this.arm();
        this
    }

    /// Initialize from the `ANALYTICS_CONFIG` page global, if present.
    pub fn auto_init(page: &Page) -> Option<Self> {
        let value = page.global(ANALYTICS_CONFIG_GLOBAL)?.as_value()?.clone();
        match serde_json::from_value::<AnalyticsOverrides>(value) {
            Ok(overrides) => Some(Self::init(page, &overrides)),
            Err(e) => {
                tracing::warn!("malformed {ANALYTICS_CONFIG_GLOBAL}: {e}");
                None
            }
        }
    }

    /// Merged configuration (read-only after init).
    pub fn config(&self) -> &AnalyticsConfig {
        &self.inner.config
    }

    fn arm(&self) {
        let page = &self.inner.page;
        let timing = &self.inner.config.timing;

        let this = self.clone();
        let fallback = page.set_timeout(timing.no_interaction_fallback, move || this.load());
        let fallback = Rc::new(Cell::new(Some(fallback)));

        for event in INIT_EVENTS {
            let this = self.clone();
            let fallback = fallback.clone();
            let delay = timing.interaction_delay;
            page.add_listener(EventTarget::Window, event, true, move || {
                if let Some(id) = fallback.take() {
                    this.inner.page.clear_timeout(id);
                }
                let again = this.clone();
                this.inner.page.set_timeout(delay, move || again.load());
            });
        }

        // Last resort: some time after the window load event
        let this = self.clone();
        let load_fallback = timing.load_fallback;
        page.add_listener(EventTarget::Window, EventType::Load, true, move || {
            let again = this.clone();
            this.inner.page.set_timeout(load_fallback, move || {
                if !again.inner.state.borrow().analytics {
                    again.load();
                }
            });
        });
    }

    /// Load all critical analytics. Repeated calls are no-ops.
    pub fn load(&self) {
        {
            let mut state = self.inner.state.borrow_mut();
            if state.analytics {
                return;
            }
            state.analytics = true;
        }
        tracing::info!("loading critical analytics");

        let this = self.clone();
        self.inner.page.set_timeout(CRITICAL_WAVE_DELAY_MS, move || {
            this.load_gtm();
            this.load_facebook_pixel();
        });

        let this = self.clone();
        self.inner.page.set_timeout(SECONDARY_WAVE_DELAY_MS, move || {
            this.load_bing_ads();
            this.load_linkedin_insight();
        });
    }

    /// Load Google Tag Manager.
    pub fn load_gtm(&self) {
        let cfg = &self.inner.config.gtm;
        if !cfg.enabled || cfg.id.is_empty() || !self.claim(|s| &mut s.gtm) {
            return;
        }
        let page = &self.inner.page;
        DATA_LAYER.ensure(page);
        DATA_LAYER.push(page, json!({ "gtm.start": page.now_ms(), "event": "gtm.js" }));

        let resource = ScriptResource::new(&format!("{GTM_SCRIPT_URL}{}", cfg.id));
        self.arm_vendor(
            GTM_IDLE_BUDGET_MS,
            self.inner.config.timing.gtm_timeout,
            move |page| {
                if let Err(e) = inject(page, &resource) {
                    tracing::debug!("gtm injection skipped: {e}");
                }
            },
        );
    }

    /// Load Facebook Pixel.
    pub fn load_facebook_pixel(&self) {
        let cfg = &self.inner.config.facebook;
        if !cfg.enabled || cfg.pixel_id.is_empty() || !self.claim(|s| &mut s.facebook) {
            return;
        }
        let page = &self.inner.page;
        FBQ.ensure(page);
        page.set_global(FBQ_LOADED_GLOBAL, json!(true));

        let pixel_id = cfg.pixel_id.clone();
        self.arm_vendor(
            FB_IDLE_BUDGET_MS,
            self.inner.config.timing.fb_timeout,
            move |page| {
                if let Err(e) = inject(page, &ScriptResource::new(FB_SCRIPT_URL)) {
                    tracing::debug!("facebook pixel injection skipped: {e}");
                }
                FBQ.push(page, json!(["init", pixel_id]));
                FBQ.push(page, json!(["track", "PageView"]));
            },
        );
    }

    /// Load Bing UET.
    pub fn load_bing_ads(&self) {
        let cfg = &self.inner.config.bing;
        if !cfg.enabled || cfg.tag_id.is_empty() || !self.claim(|s| &mut s.bing) {
            return;
        }
        UETQ.ensure(&self.inner.page);

        self.arm_vendor(
            BING_IDLE_BUDGET_MS,
            self.inner.config.timing.bing_timeout,
            move |page| {
                if let Err(e) = inject(page, &ScriptResource::new(BING_SCRIPT_URL)) {
                    tracing::debug!("bing uet injection skipped: {e}");
                }
                UETQ.push(
                    page,
                    json!([
                        "event",
                        "",
                        { "event_category": "Page", "event_label": "View", "event_value": "0" }
                    ]),
                );
            },
        );
    }

    /// Load LinkedIn Insight.
    pub fn load_linkedin_insight(&self) {
        let cfg = &self.inner.config.linkedin;
        if !cfg.enabled || cfg.partner_id.is_empty() || !self.claim(|s| &mut s.linkedin) {
            return;
        }
        let page = &self.inner.page;
        page.set_global(LINKEDIN_PARTNER_ID_GLOBAL, json!(cfg.partner_id));
        LINKEDIN_PARTNER_IDS.ensure(page);
        LINKEDIN_PARTNER_IDS.push(page, json!(cfg.partner_id));

        self.arm_vendor(
            LINKEDIN_IDLE_BUDGET_MS,
            self.inner.config.timing.linked_in_timeout,
            move |page| {
                LINTRK.ensure(page);
                if let Err(e) = inject(page, &ScriptResource::new(LINKEDIN_SCRIPT_URL)) {
                    tracing::debug!("linkedin insight injection skipped: {e}");
                }
            },
        );
    }

    /// Fire a named analytics event; buffered until the vendor script
    /// arrives.
    pub fn track_event(&self, name: &str, payload: Value) {
        let page = &self.inner.page;
        DATA_LAYER.ensure(page);
        let mut record = serde_json::Map::new();
        record.insert("event".to_string(), json!(name));
        if let Value::Object(map) = payload {
            record.extend(map);
        }
        DATA_LAYER.push(page, Value::Object(record));
    }

    /// Attach user properties; buffered like events.
    pub fn identify_user(&self, properties: Value) {
        let page = &self.inner.page;
        DATA_LAYER.ensure(page);
        DATA_LAYER.push(
            page,
            json!({ "event": "set_user_properties", "user_properties": properties.clone() }),
        );
        LEARNQ.ensure(page);
        LEARNQ.push(page, json!(["identify", properties]));
    }

    /// Test-and-set a vendor guard; true when this call claimed it.
    fn claim(&self, flag: impl FnOnce(&mut LoadState) -> &mut bool) -> bool {
        let mut state = self.inner.state.borrow_mut();
        let flag = flag(&mut state);
        if *flag {
            return false;
        }
        *flag = true;
        true
    }

    fn arm_vendor(&self, idle_budget_ms: u64, timer_ms: u64, insert: impl FnOnce(&Page) + 'static) {
        let page = self.inner.page.clone();
        let callback = move || insert(&page);
        if self.inner.page.capabilities().request_idle_callback {
            self.inner.page.request_idle(idle_budget_ms, callback);
        } else {
            self.inner.page.set_timeout(timer_ms, callback);
        }
    }
}
