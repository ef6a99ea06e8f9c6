//! tpo Optimizer - Deferred third-party script loading
//!
//! Umbrella crate tying the page host model, the defer engine, the
//! analytics loaders and the widget facades together. Most embedders
//! only need [`boot`]: seed the page's configuration globals, boot,
//! then drive the page's clock and events.

pub use tpo_analytics as analytics;
pub use tpo_defer as defer;
pub use tpo_dom as dom;
pub use tpo_page as page;
pub use tpo_widgets as widgets;

pub use tpo_analytics::{OptimizedAnalytics, ANALYTICS_CONFIG_GLOBAL};
pub use tpo_defer::{DeferLib, ScriptResource, TriggerConfig};
pub use tpo_page::{Capabilities, Page};
pub use tpo_widgets::{WidgetOptimizer, WIDGET_CONFIG_GLOBAL};

/// Whatever [`boot`] managed to start from the page globals.
pub struct Boot {
    pub analytics: Option<OptimizedAnalytics>,
    pub widgets: Option<WidgetOptimizer>,
}

/// Start every subsystem whose configuration global is present on the
/// page. Missing globals are not an error; malformed ones are logged
/// and skipped.
pub fn boot(page: &Page) -> Boot {
    let booted = Boot {
        analytics: OptimizedAnalytics::auto_init(page),
        widgets: WidgetOptimizer::auto_init(page),
    };
    tracing::debug!(
        analytics = booted.analytics.is_some(),
        widgets = booted.widgets.is_some(),
        "boot complete"
    );
    booted
}

/// Install the global tracing subscriber, filtered by `RUST_LOG`.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
