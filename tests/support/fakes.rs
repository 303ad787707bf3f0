//! In-memory collaborators with call counters.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use harvester_core::{CandidateLink, DownloadError, Fetcher, Item, PageRenderer, RenderError};

/// What the fake renderer answers for an item page.
#[derive(Debug, Clone)]
pub enum PageAnswer {
    Document(String),
    NoDocument,
    Status(u16),
}

/// Renderer backed by a fixed page table.
#[derive(Debug, Default)]
pub struct FakeRenderer {
    links: Vec<CandidateLink>,
    pages: HashMap<String, PageAnswer>,
    resolve_calls: AtomicUsize,
}

impl FakeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_link(mut self, href: &str, text: &str) -> Self {
        self.links.push(CandidateLink {
            href: href.to_string(),
            text: text.to_string(),
        });
        self
    }

    pub fn with_page(mut self, page_url: &str, answer: PageAnswer) -> Self {
        self.pages.insert(page_url.to_string(), answer);
        self
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageRenderer for FakeRenderer {
    async fn discover_candidate_links(
        &self,
        _start_url: &str,
    ) -> Result<Vec<CandidateLink>, RenderError> {
        Ok(self.links.clone())
    }

    async fn resolve_document_url(&self, page_url: &str) -> Result<Option<String>, RenderError> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        match self.pages.get(page_url) {
            Some(PageAnswer::Document(url)) => Ok(Some(url.clone())),
            Some(PageAnswer::NoDocument) | None => Ok(None),
            Some(PageAnswer::Status(status)) => Err(RenderError::HttpStatus {
                url: page_url.to_string(),
                status: *status,
            }),
        }
    }
}

/// What the fake fetcher does for a document URL.
#[derive(Debug, Clone)]
pub enum FetchAnswer {
    Body(Vec<u8>),
    Timeout,
    Status(u16),
}

/// Fetcher that writes canned bodies and counts requests.
#[derive(Debug, Default)]
pub struct FakeFetcher {
    answers: Mutex<HashMap<String, FetchAnswer>>,
    calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answer(self, url: &str, answer: FetchAnswer) -> Self {
        self.set_answer(url, answer);
        self
    }

    /// Replaces the answer for `url` between runs.
    pub fn set_answer(&self, url: &str, answer: FetchAnswer) {
        self.answers
            .lock()
            .unwrap()
            .insert(url.to_string(), answer);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn stream_to(&self, url: &str, destination: &Path) -> Result<u64, DownloadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let answer = self.answers.lock().unwrap().get(url).cloned();
        match answer {
            Some(FetchAnswer::Body(body)) => {
                tokio::fs::write(destination, &body)
                    .await
                    .map_err(|error| DownloadError::io(destination, error))?;
                Ok(body.len() as u64)
            }
            Some(FetchAnswer::Timeout) => Err(DownloadError::timeout(url)),
            Some(FetchAnswer::Status(status)) => Err(DownloadError::http_status(url, status)),
            None => Err(DownloadError::http_status(url, 404)),
        }
    }
}

/// An item whose page and document URLs derive from `slug`.
pub fn item(slug: &str, title: &str) -> Item {
    let page = format!("https://pakistancode.example/english/{slug}");
    Item {
        key: page.clone(),
        title: title.to_string(),
        source_page_url: page,
    }
}

/// Document URL used by [`item`] fixtures.
pub fn document_url(slug: &str) -> String {
    format!("https://pakistancode.example/pdffiles/{slug}.pdf")
}
