//! Shared User-Agent strings for document fetches and page rendering.
//!
//! Single source for project URL and UA format so fetcher and renderer traffic
//! stay consistent and easy to update.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/statute-harvester";

/// Default User-Agent for document downloads (identifies the tool).
#[must_use]
pub(crate) fn default_fetch_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("statute-harvester/{version} (legal-archive-tool; +{PROJECT_UA_URL})")
}

/// Default User-Agent for page rendering requests.
#[must_use]
pub(crate) fn default_render_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("statute-harvester/{version} (page-discovery; +{PROJECT_UA_URL})")
}
