//! Vendor constants
//!
//! Script URLs, idle budgets and pre-load buffer names for the four
//! analytics vendors. URLs and global names are contracts with the
//! vendor scripts.

use crate::preload::PreLoadBuffer;

pub(crate) const GTM_SCRIPT_URL: &str = "https://www.googletagmanager.com/gtm.js?id=";
pub(crate) const FB_SCRIPT_URL: &str = "https://connect.facebook.net/en_US/fbevents.js";
pub(crate) const BING_SCRIPT_URL: &str = "https://bat.bing.com/bat.js";
pub(crate) const LINKEDIN_SCRIPT_URL: &str =
    "https://snap.licdn.com/li.lms-analytics/insight.min.js";

// Idle-callback wait budgets per vendor, reflecting relative priority
pub(crate) const GTM_IDLE_BUDGET_MS: u64 = 2000;
pub(crate) const FB_IDLE_BUDGET_MS: u64 = 3000;
pub(crate) const BING_IDLE_BUDGET_MS: u64 = 5000;
pub(crate) const LINKEDIN_IDLE_BUDGET_MS: u64 = 8000;

pub(crate) const DATA_LAYER: PreLoadBuffer = PreLoadBuffer::new("dataLayer");
pub(crate) const FBQ: PreLoadBuffer = PreLoadBuffer::new("fbq");
pub(crate) const UETQ: PreLoadBuffer = PreLoadBuffer::new("uetq");
pub(crate) const LINKEDIN_PARTNER_IDS: PreLoadBuffer =
    PreLoadBuffer::new("_linkedin_data_partner_ids");
pub(crate) const LINTRK: PreLoadBuffer = PreLoadBuffer::new("lintrk");
pub(crate) const LEARNQ: PreLoadBuffer = PreLoadBuffer::new("_learnq");

pub(crate) const LINKEDIN_PARTNER_ID_GLOBAL: &str = "_linkedin_partner_id";
pub(crate) const FBQ_LOADED_GLOBAL: &str = "fbq.loaded";
