//! Item discovery and document URL resolution.
//!
//! The page renderer is an external collaborator behind the [`PageRenderer`]
//! trait. The shipped [`HttpPageRenderer`] reads static HTML; a headless
//! browser can be plugged in by implementing the same trait.
//!
//! # Architecture
//!
//! - [`PageRenderer`] - Async trait: list candidate links, resolve a document URL
//! - [`HttpPageRenderer`] - reqwest + `lol_html` implementation
//! - [`discover_items`] - Candidate links to deduplicated [`Item`]s

mod error;
mod html;
mod http_renderer;
mod items;

pub use error::{DiscoveryError, RenderError};
pub use html::{extract_anchors, find_document_url};
pub use http_renderer::{
    HttpPageRenderer, PAGE_CONNECT_TIMEOUT_SECS, PAGE_TIMEOUT_SECS, RendererSettings,
};
pub use items::{DiscoveryOptions, discover_items};

use async_trait::async_trait;

/// A discovered document reference, before its document URL is known.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Item {
    /// Canonical absolute URL of the item page, without fragment. Unique per run.
    pub key: String,
    /// Link text, whitespace-collapsed. Drives the destination file name.
    pub title: String,
    /// Page expected to link to the document.
    pub source_page_url: String,
}

/// A raw link found on the start page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLink {
    /// Absolute href.
    pub href: String,
    /// Visible link text.
    pub text: String,
}

/// Page rendering collaborator.
///
/// # Object Safety
///
/// This trait uses `async_trait` so the harvester can hold an
/// `Arc<dyn PageRenderer>`.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Returns every link on the start page.
    async fn discover_candidate_links(
        &self,
        start_url: &str,
    ) -> Result<Vec<CandidateLink>, RenderError>;

    /// Finds the document URL on an item page.
    ///
    /// `Ok(None)` means the page loaded but links to no document.
    async fn resolve_document_url(&self, page_url: &str) -> Result<Option<String>, RenderError>;
}
