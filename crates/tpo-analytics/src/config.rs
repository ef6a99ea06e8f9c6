//! Analytics configuration
//!
//! Defaults plus caller overrides, merged field by field: caller
//! values win, missing fields keep defaults. Override types mirror the
//! JSON shape of the well-known `ANALYTICS_CONFIG` page global.

use serde::Deserialize;

/// Google Tag Manager
#[derive(Debug, Clone, Default)]
pub struct GtmConfig {
    pub enabled: bool,
    /// Container id, `GTM-XXXXXX` format.
    pub id: String,
}

/// Facebook Pixel
#[derive(Debug, Clone, Default)]
pub struct FacebookConfig {
    pub enabled: bool,
    pub pixel_id: String,
}

/// Bing UET
#[derive(Debug, Clone, Default)]
pub struct BingConfig {
    pub enabled: bool,
    pub tag_id: String,
}

/// LinkedIn Insight
#[derive(Debug, Clone, Default)]
pub struct LinkedInConfig {
    pub enabled: bool,
    pub partner_id: String,
}

/// Delay constants, all in milliseconds
#[derive(Debug, Clone)]
pub struct TimingConfig {
    /// Delay between first interaction and the critical load.
    pub interaction_delay: u64,
    /// Load anyway after this long without any interaction.
    pub no_interaction_fallback: u64,
    /// Load this long after the window load event as a last resort.
    pub load_fallback: u64,
    /// Per-vendor timer delays when the host has no idle facility.
    pub gtm_timeout: u64,
    pub fb_timeout: u64,
    pub bing_timeout: u64,
    pub linked_in_timeout: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            interaction_delay: 500,
            no_interaction_fallback: 4000,
            load_fallback: 8000,
            gtm_timeout: 1000,
            fb_timeout: 1500,
            bing_timeout: 3000,
            linked_in_timeout: 5000,
        }
    }
}

/// Full analytics configuration
#[derive(Debug, Clone, Default)]
pub struct AnalyticsConfig {
    pub gtm: GtmConfig,
    pub facebook: FacebookConfig,
    pub bing: BingConfig,
    pub linkedin: LinkedInConfig,
    pub timing: TimingConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GtmOverrides {
    pub enabled: Option<bool>,
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FacebookOverrides {
    pub enabled: Option<bool>,
    pub pixel_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BingOverrides {
    pub enabled: Option<bool>,
    pub tag_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinkedInOverrides {
    pub enabled: Option<bool>,
    pub partner_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimingOverrides {
    pub interaction_delay: Option<u64>,
    pub no_interaction_fallback: Option<u64>,
    pub load_fallback: Option<u64>,
    pub gtm_timeout: Option<u64>,
    pub fb_timeout: Option<u64>,
    pub bing_timeout: Option<u64>,
    pub linked_in_timeout: Option<u64>,
}

/// Caller overrides, usually deserialized from `ANALYTICS_CONFIG`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyticsOverrides {
    pub gtm: Option<GtmOverrides>,
    pub facebook: Option<FacebookOverrides>,
    pub bing: Option<BingOverrides>,
    pub linkedin: Option<LinkedInOverrides>,
    pub timing: Option<TimingOverrides>,
}

impl AnalyticsConfig {
    /// Defaults with overrides applied field by field.
    pub fn merged(overrides: &AnalyticsOverrides) -> Self {
        let mut config = Self::default();
        config.apply(overrides);
        config
    }

    /// Apply overrides in place. Absent fields keep their values.
    pub fn apply(&mut self, overrides: &AnalyticsOverrides) {
        if let Some(o) = &overrides.gtm {
            merge(&mut self.gtm.enabled, &o.enabled);
            merge(&mut self.gtm.id, &o.id);
        }
        if let Some(o) = &overrides.facebook {
            merge(&mut self.facebook.enabled, &o.enabled);
            merge(&mut self.facebook.pixel_id, &o.pixel_id);
        }
        if let Some(o) = &overrides.bing {
            merge(&mut self.bing.enabled, &o.enabled);
            merge(&mut self.bing.tag_id, &o.tag_id);
        }
        if let Some(o) = &overrides.linkedin {
            merge(&mut self.linkedin.enabled, &o.enabled);
            merge(&mut self.linkedin.partner_id, &o.partner_id);
        }
        if let Some(o) = &overrides.timing {
            merge(&mut self.timing.interaction_delay, &o.interaction_delay);
            merge(
                &mut self.timing.no_interaction_fallback,
                &o.no_interaction_fallback,
            );
            merge(&mut self.timing.load_fallback, &o.load_fallback);
            merge(&mut self.timing.gtm_timeout, &o.gtm_timeout);
            merge(&mut self.timing.fb_timeout, &o.fb_timeout);
            merge(&mut self.timing.bing_timeout, &o.bing_timeout);
            merge(&mut self.timing.linked_in_timeout, &o.linked_in_timeout);
        }
    }
}

fn merge<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *target = v.clone();
    }
}
