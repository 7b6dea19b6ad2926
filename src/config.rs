//! Render configuration.
//!
//! One `RenderConfig` is built by the embedding application (usually from
//! its environment) and shared across requests; the pipeline only reads
//! it.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning knobs for the rehydration pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Critical CSS byte budget. Styles past this point are deferred
    /// unless their rules classify as critical.
    pub critical_css_limit: usize,
    /// Run the critical subset through the CSS minifier before inlining.
    pub minify_critical: bool,
    /// Timeout for the server-side related-content fetch, in milliseconds.
    /// Expiry downgrades the panel to the skeleton/client-fallback path.
    pub related_timeout_ms: u64,
    /// Upper bound on skeleton cards rendered while related content loads.
    pub related_skeleton_max: usize,
    /// Sort value pre-selected for product listings when the request
    /// carries none and the component config carries none.
    pub product_sort_default: String,
    /// Same for blog listings.
    pub blog_sort_default: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            critical_css_limit: 4000,
            minify_critical: false,
            related_timeout_ms: 3000,
            related_skeleton_max: 6,
            product_sort_default: "name-asc".into(),
            blog_sort_default: "published_at-desc".into(),
        }
    }
}

impl RenderConfig {
    /// Related-content fetch timeout as a `Duration`.
    pub fn related_timeout(&self) -> Duration {
        Duration::from_millis(self.related_timeout_ms)
    }
}
