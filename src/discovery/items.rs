//! Turns the start page's candidate links into a deduplicated item list.

use std::collections::HashSet;

use regex::Regex;
use tracing::{debug, info, instrument};
use url::Url;

use super::{CandidateLink, DiscoveryError, Item, PageRenderer};

/// Filters applied to candidate links.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    /// When set, only links whose canonical URL matches become items.
    pub link_pattern: Option<Regex>,
}

/// Discovers items from `start_url`.
///
/// Links with empty text, non-http(s) targets (`javascript:`, `mailto:`),
/// fragment-only hrefs, and links back to the start page are discarded.
/// Items are deduplicated by key; the first occurrence wins.
///
/// # Errors
///
/// - [`DiscoveryError::StartPage`] if the renderer fails on the start page
/// - [`DiscoveryError::NoItems`] if no link survives filtering
#[instrument(skip(renderer, options))]
pub async fn discover_items(
    renderer: &dyn PageRenderer,
    start_url: &str,
    options: &DiscoveryOptions,
) -> Result<Vec<Item>, DiscoveryError> {
    let links = renderer
        .discover_candidate_links(start_url)
        .await
        .map_err(|source| DiscoveryError::StartPage {
            url: start_url.to_string(),
            source,
        })?;

    let start = Url::parse(start_url).ok();
    let start_key = start.as_ref().map(|url| canonical_key(url.clone()));

    let mut seen = HashSet::new();
    let mut items = Vec::new();
    for link in &links {
        let Some(item) = item_from_link(link, start.as_ref()) else {
            continue;
        };
        if start_key.as_deref() == Some(item.key.as_str()) {
            continue;
        }
        if let Some(pattern) = &options.link_pattern
            && !pattern.is_match(&item.key)
        {
            debug!(key = %item.key, "link filtered out by pattern");
            continue;
        }
        if seen.insert(item.key.clone()) {
            items.push(item);
        }
    }

    if items.is_empty() {
        return Err(DiscoveryError::NoItems {
            url: start_url.to_string(),
            candidates: links.len(),
        });
    }

    info!(
        candidates = links.len(),
        items = items.len(),
        "discovery complete"
    );
    Ok(items)
}

fn item_from_link(link: &CandidateLink, base: Option<&Url>) -> Option<Item> {
    let title = link.text.split_whitespace().collect::<Vec<_>>().join(" ");
    if title.is_empty() {
        return None;
    }

    let href = link.href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let url = match Url::parse(href) {
        Ok(url) => url,
        Err(_) => base?.join(href).ok()?,
    };
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let key = canonical_key(url);
    Some(Item {
        source_page_url: key.clone(),
        key,
        title,
    })
}

/// Canonical item key: the absolute URL without its fragment.
pub(crate) fn canonical_key(mut url: Url) -> String {
    url.set_fragment(None);
    url.into()
}
