//! HTML helpers: anchor extraction with `lol_html` and document link selection.

use std::sync::{Arc, LazyLock, Mutex};

use html_escape::decode_html_entities;
use lol_html::html_content::Element;
use lol_html::{HtmlRewriter, OutputSink, Settings, doc_text, element};
use regex::Regex;
use tracing::warn;
use url::Url;

use super::CandidateLink;

/// Compiles a regex at static init; panics on invalid pattern.
pub(crate) fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// `<meta name="citation_pdf_url" content="...">`, as published by many legal and academic portals.
static CITATION_PDF_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(
        r#"(?is)<meta\s+[^>]*(?:name|property)\s*=\s*["']citation_pdf_url["'][^>]*content\s*=\s*["']([^"']+)["']"#,
    )
});

/// Embedded viewers (`<iframe src>`, `<embed src>`, `<object data>`) pointing at a PDF.
static EMBEDDED_PDF_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(
        r#"(?is)<(?:iframe|embed|object)\b[^>]*?\b(?:src|data)\s*=\s*["']([^"']+?\.pdf(?:[?#][^"']*)?)["']"#,
    )
});

static PDF_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"(?i)\bpdf\b"));

const COLLECTOR_POISONED: &str = "anchor collector mutex poisoned";

/// Anchors seen so far, and the one whose text is still being read.
#[derive(Debug, Default)]
struct AnchorCollector {
    links: Vec<CandidateLink>,
    open: Option<usize>,
}

struct NoopSink;

impl OutputSink for NoopSink {
    fn handle_chunk(&mut self, _chunk: &[u8]) {}
}

/// Extracts every `<a href>` in `html` with its visible text.
///
/// Markup is tokenized by `lol_html`, so commented-out anchors are ignored and
/// quoted attribute values may contain `>`. Hrefs are absolutized against
/// `base_url`; text has entities decoded and whitespace collapsed. Anchors
/// without an href are skipped.
#[must_use]
pub fn extract_anchors(html: &str, base_url: &Url) -> Vec<CandidateLink> {
    let collector = Arc::new(Mutex::new(AnchorCollector::default()));
    let element_state = Arc::clone(&collector);
    let text_state = Arc::clone(&collector);

    let anchor_handler = element!("a", move |el: &mut Element<'_, '_>| {
        let href = el.get_attribute("href");
        let mut state = element_state.lock().map_err(|_| COLLECTOR_POISONED)?;
        let Some(href) = href else {
            state.open = None;
            return Ok(());
        };
        state.links.push(CandidateLink {
            href,
            text: String::new(),
        });
        let index = state.links.len() - 1;
        state.open = Some(index);
        drop(state);

        if let Some(handlers) = el.end_tag_handlers() {
            let end_state = Arc::clone(&element_state);
            handlers.push(Box::new(move |_end| {
                let mut state = end_state.lock().map_err(|_| COLLECTOR_POISONED)?;
                if state.open == Some(index) {
                    state.open = None;
                }
                Ok(())
            }));
        }
        Ok(())
    });

    let text_handler = doc_text!(move |chunk| {
        let mut state = text_state.lock().map_err(|_| COLLECTOR_POISONED)?;
        let open = state.open;
        if let Some(link) = open.and_then(|index| state.links.get_mut(index)) {
            link.text.push_str(chunk.as_str());
        }
        Ok(())
    });

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![anchor_handler],
            document_content_handlers: vec![text_handler],
            ..Settings::default()
        },
        NoopSink,
    );
    let parsed = match rewriter.write(html.as_bytes()) {
        Ok(()) => rewriter.end(),
        Err(error) => Err(error),
    };
    if let Err(error) = parsed {
        warn!(error = %error, "HTML parsing stopped early; keeping anchors seen so far");
    }

    let raw = match collector.lock() {
        Ok(mut state) => std::mem::take(&mut state.links),
        Err(_) => Vec::new(),
    };
    raw.into_iter()
        .map(|link| {
            let href = decode_html_entities(link.href.trim()).into_owned();
            CandidateLink {
                href: absolutize_url(&href, base_url).unwrap_or(href),
                text: collapse_whitespace(&decode_html_entities(&link.text)),
            }
        })
        .collect()
}

/// Picks the document URL from an item page, if any.
///
/// Preference order: `citation_pdf_url` meta tag, embedded PDF viewer, anchor
/// whose path ends in `.pdf`, anchor whose text mentions PDF.
#[must_use]
pub fn find_document_url(html: &str, base_url: &Url) -> Option<String> {
    let meta = CITATION_PDF_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| decode_html_entities(m.as_str().trim()).into_owned());
    if let Some(url) = meta.and_then(|value| absolutize_url(&value, base_url)) {
        return Some(url);
    }

    let embedded = EMBEDDED_PDF_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| decode_html_entities(m.as_str().trim()).into_owned());
    if let Some(url) = embedded.and_then(|value| absolutize_url(&value, base_url)) {
        return Some(url);
    }

    let anchors = extract_anchors(html, base_url);
    anchors
        .iter()
        .find(|link| has_pdf_path(&link.href))
        .or_else(|| {
            anchors
                .iter()
                .find(|link| is_http_url(&link.href) && PDF_TEXT_RE.is_match(&link.text))
        })
        .map(|link| link.href.clone())
}

/// Resolves a possibly relative URL string against a base URL.
///
/// Returns `None` for values that do not resolve to an absolute URL.
#[must_use]
pub fn absolutize_url(value: &str, base_url: &Url) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if value.starts_with("//") {
        return Url::parse(&format!("{}:{value}", base_url.scheme()))
            .ok()
            .map(String::from);
    }
    base_url.join(value).ok().map(String::from)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn has_pdf_path(href: &str) -> bool {
    Url::parse(href).is_ok_and(|url| {
        matches!(url.scheme(), "http" | "https")
            && url
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .is_some_and(|last| last.to_ascii_lowercase().ends_with(".pdf"))
    })
}

fn is_http_url(href: &str) -> bool {
    Url::parse(href).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}
