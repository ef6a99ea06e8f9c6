//! Widget configuration
//!
//! Built-in defaults for the known widget vendors plus a caller-facing
//! override layer. Overrides merge field by field into the defaults,
//! except `custom`, which replaces the whole list. Selector lists and
//! script URLs default to the vendors' published embed targets.

use std::collections::HashMap;

use serde::Deserialize;

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// Subscription widget: click-to-load, once per page.
#[derive(Debug, Clone)]
pub struct RechargeConfig {
    pub enabled: bool,
    pub selectors: Vec<String>,
    pub script_url: String,
}

impl Default for RechargeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            selectors: strings(&["[data-recharge]", ".rc-widget", ".rc-subscription"]),
            script_url: "https://static.rechargecdn.com/assets/static/js/widget.min.js".into(),
        }
    }
}

/// Reviews widget: several scripts, loaded near visibility.
#[derive(Debug, Clone)]
pub struct ReviewsIoConfig {
    pub enabled: bool,
    pub selectors: Vec<String>,
    pub scripts: Vec<String>,
}

impl Default for ReviewsIoConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            selectors: strings(&[
                "[data-reviews-io]",
                ".reviews-io",
                "#r-widget",
                ".ReviewsWidget",
            ]),
            scripts: strings(&[
                "https://widget.reviews.io/modern-widgets/rating-bar.js",
                "https://widget.reviews.io/polaris/build.js",
                "https://widget.reviews.io/rating-snippet/dist.js",
            ]),
        }
    }
}

/// Loyalty widget: hover-to-load, keyed by account.
#[derive(Debug, Clone)]
pub struct YotpoConfig {
    pub enabled: bool,
    pub app_key: String,
    pub selectors: Vec<String>,
    pub script_url: String,
}

impl Default for YotpoConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            app_key: String::new(),
            selectors: strings(&[
                "[data-yotpo-instance-id]",
                ".yotpo-widget-instance",
                ".yotpo-main-widget",
            ]),
            script_url: "https://cdn-widgetsrepository.yotpo.com/v1/loader/".into(),
        }
    }
}

/// Video widget: visibility-triggered.
#[derive(Debug, Clone)]
pub struct TolstoyConfig {
    pub enabled: bool,
    pub selectors: Vec<String>,
    pub script_url: String,
}

impl Default for TolstoyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            selectors: strings(&["[data-tolstoy]", ".tolstoy-widget"]),
            script_url: "https://widget.gotolstoy.com/we/widget.js".into(),
        }
    }
}

/// Forms widget: visibility-triggered, keyed by account.
#[derive(Debug, Clone)]
pub struct KlaviyoConfig {
    pub enabled: bool,
    pub company_id: String,
    pub selectors: Vec<String>,
    pub script_url: String,
}

impl Default for KlaviyoConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            company_id: String::new(),
            selectors: strings(&["[data-klaviyo-form-id]", ".klaviyo-form-trigger"]),
            script_url: "https://static.klaviyo.com/onsite/js/klaviyo.js".into(),
        }
    }
}

/// A caller-declared widget with its own trigger strategy.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CustomWidget {
    pub enabled: bool,
    pub selectors: Vec<String>,
    pub script_url: String,
    pub attrs: HashMap<String, String>,
    /// `"visibility"`, `"interaction"` or `"idle"`; empty means visibility.
    pub load_strategy: String,
}

/// Effective widget configuration after overrides are applied.
#[derive(Debug, Clone, Default)]
pub struct WidgetConfig {
    pub recharge: RechargeConfig,
    pub reviews_io: ReviewsIoConfig,
    pub yotpo: YotpoConfig,
    pub tolstoy: TolstoyConfig,
    pub klaviyo: KlaviyoConfig,
    pub custom: Vec<CustomWidget>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RechargeOverrides {
    pub enabled: Option<bool>,
    pub selectors: Option<Vec<String>>,
    pub script_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReviewsIoOverrides {
    pub enabled: Option<bool>,
    pub selectors: Option<Vec<String>>,
    pub scripts: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct YotpoOverrides {
    pub enabled: Option<bool>,
    pub app_key: Option<String>,
    pub selectors: Option<Vec<String>>,
    pub script_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TolstoyOverrides {
    pub enabled: Option<bool>,
    pub selectors: Option<Vec<String>>,
    pub script_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KlaviyoOverrides {
    pub enabled: Option<bool>,
    pub company_id: Option<String>,
    pub selectors: Option<Vec<String>>,
    pub script_url: Option<String>,
}

/// Caller-facing override layer, usually parsed from the page-level
/// configuration global.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WidgetOverrides {
    pub recharge: Option<RechargeOverrides>,
    #[serde(rename = "reviewsIO")]
    pub reviews_io: Option<ReviewsIoOverrides>,
    pub yotpo: Option<YotpoOverrides>,
    pub tolstoy: Option<TolstoyOverrides>,
    pub klaviyo: Option<KlaviyoOverrides>,
    pub custom: Option<Vec<CustomWidget>>,
}

fn merge<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

impl WidgetConfig {
    /// Defaults with `overrides` applied on top.
    pub fn merged(overrides: &WidgetOverrides) -> Self {
        let mut config = Self::default();
        config.apply(overrides);
        config
    }

    fn apply(&mut self, overrides: &WidgetOverrides) {
        if let Some(o) = &overrides.recharge {
            merge(&mut self.recharge.enabled, &o.enabled);
            merge(&mut self.recharge.selectors, &o.selectors);
            merge(&mut self.recharge.script_url, &o.script_url);
        }
        if let Some(o) = &overrides.reviews_io {
            merge(&mut self.reviews_io.enabled, &o.enabled);
            merge(&mut self.reviews_io.selectors, &o.selectors);
            merge(&mut self.reviews_io.scripts, &o.scripts);
        }
        if let Some(o) = &overrides.yotpo {
            merge(&mut self.yotpo.enabled, &o.enabled);
            merge(&mut self.yotpo.app_key, &o.app_key);
            merge(&mut self.yotpo.selectors, &o.selectors);
            merge(&mut self.yotpo.script_url, &o.script_url);
        }
        if let Some(o) = &overrides.tolstoy {
            merge(&mut self.tolstoy.enabled, &o.enabled);
            merge(&mut self.tolstoy.selectors, &o.selectors);
            merge(&mut self.tolstoy.script_url, &o.script_url);
        }
        if let Some(o) = &overrides.klaviyo {
            merge(&mut self.klaviyo.enabled, &o.enabled);
            merge(&mut self.klaviyo.company_id, &o.company_id);
            merge(&mut self.klaviyo.selectors, &o.selectors);
            merge(&mut self.klaviyo.script_url, &o.script_url);
        }
        // Custom widgets replace wholesale: partial merges of a
        // heterogeneous list are more surprising than helpful.
        if let Some(custom) = &overrides.custom {
            self.custom = custom.clone();
        }
    }
}
