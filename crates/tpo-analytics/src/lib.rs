//! tpo Analytics - Deferred analytics loading
//!
//! Idempotent loaders for the four analytics vendors (Google Tag
//! Manager, Facebook Pixel, Bing UET, LinkedIn Insight), each guarding
//! against double injection, establishing the vendor's pre-load buffer
//! globals synchronously, and injecting the real script on idle. The
//! `OptimizedAnalytics` front door merges caller configuration over
//! defaults and fires the whole set after first interaction (or a
//! fallback timer).

mod config;
mod optimizer;
mod preload;
mod vendors;

pub use config::{
    AnalyticsConfig, AnalyticsOverrides, BingConfig, BingOverrides, FacebookConfig,
    FacebookOverrides, GtmConfig, GtmOverrides, LinkedInConfig, LinkedInOverrides, TimingConfig,
    TimingOverrides,
};
pub use optimizer::{OptimizedAnalytics, ANALYTICS_CONFIG_GLOBAL};
pub use preload::PreLoadBuffer;
