//! tpo Widgets - Widget facades
//!
//! Lightweight facades for third-party widgets (subscription, reviews,
//! loyalty, video, forms): each one discovers its target elements by
//! selector, picks the trigger strategy that fits the widget's
//! interaction model, and hands the real scripts to the defer engine
//! when it fires. Caller-declared custom widgets ride the same pass
//! and pick their strategy dynamically.

mod config;
mod optimizer;

pub use config::{
    CustomWidget, KlaviyoConfig, KlaviyoOverrides, RechargeConfig, RechargeOverrides,
    ReviewsIoConfig, ReviewsIoOverrides, TolstoyConfig, TolstoyOverrides, WidgetConfig,
    WidgetOverrides, YotpoConfig, YotpoOverrides,
};
pub use optimizer::{WidgetOptimizer, WIDGET_CONFIG_GLOBAL};
