//! Static-HTML page renderer backed by reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use super::html::{extract_anchors, find_document_url};
use super::{CandidateLink, PageRenderer, RenderError};
use crate::user_agent;

/// Default page load timeout (60 seconds).
pub const PAGE_TIMEOUT_SECS: u64 = 60;

/// Default page connect timeout (15 seconds).
pub const PAGE_CONNECT_TIMEOUT_SECS: u64 = 15;

/// Network settings for [`HttpPageRenderer`].
#[derive(Debug, Clone)]
pub struct RendererSettings {
    pub page_timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            page_timeout: Duration::from_secs(PAGE_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(PAGE_CONNECT_TIMEOUT_SECS),
            user_agent: user_agent::default_render_user_agent(),
        }
    }
}

/// Fetches pages as static HTML and extracts links with an HTML tokenizer.
///
/// Links are absolutized against the final URL after redirects.
#[derive(Debug, Clone)]
pub struct HttpPageRenderer {
    client: Client,
}

impl HttpPageRenderer {
    /// Builds the renderer's HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Unavailable`] if the client cannot be built.
    pub fn new(settings: &RendererSettings) -> Result<Self, RenderError> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.page_timeout)
            .gzip(true)
            .cookie_store(true)
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(|e| RenderError::unavailable(format!("HTTP client construction failed: {e}")))?;
        Ok(Self { client })
    }

    /// Loads `url` and returns the final URL and body text.
    async fn load_page(&self, url: &str) -> Result<(Url, String), RenderError> {
        let parsed = Url::parse(url).map_err(|_| RenderError::invalid_url(url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RenderError::invalid_url(url));
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| RenderError::from_transport(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::http_status(url, status.as_u16()));
        }

        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| RenderError::from_transport(url, e))?;

        debug!(final_url = %final_url, bytes = body.len(), "page loaded");
        Ok((final_url, body))
    }
}

#[async_trait]
impl PageRenderer for HttpPageRenderer {
    #[instrument(skip(self))]
    async fn discover_candidate_links(
        &self,
        start_url: &str,
    ) -> Result<Vec<CandidateLink>, RenderError> {
        let (final_url, body) = self.load_page(start_url).await?;
        let links = extract_anchors(&body, &final_url);
        debug!(links = links.len(), "candidate links extracted");
        Ok(links)
    }

    #[instrument(skip(self))]
    async fn resolve_document_url(&self, page_url: &str) -> Result<Option<String>, RenderError> {
        let (final_url, body) = self.load_page(page_url).await?;
        Ok(find_document_url(&body, &final_url))
    }
}
