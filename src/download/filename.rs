//! Destination file naming for downloaded documents.
//!
//! Names are derived from the item title, never from the document URL, so a
//! stable title always maps to the same file across runs.

use sha2::{Digest, Sha256};

/// Fixed extension for every downloaded document.
pub const DOCUMENT_EXTENSION: &str = ".pdf";

/// Maximum stem length in characters, before the disambiguator and extension.
pub const MAX_STEM_CHARS: usize = 150;

/// Stem used when the title sanitizes to nothing.
const FALLBACK_STEM: &str = "document";

/// Number of hex characters of `sha256(key)` appended when disambiguating.
const DISAMBIGUATOR_HEX_CHARS: usize = 8;

/// Builds the file name for an item.
///
/// With `disambiguate` set, `-<first 8 hex of sha256(key)>` is appended to the
/// stem so distinct items with identical titles land in distinct files.
///
/// ```
/// use harvester_core::download::document_file_name;
///
/// assert_eq!(
///     document_file_name("Contract Act, 1872", "https://example.com/a", false),
///     "Contract Act, 1872.pdf"
/// );
/// ```
#[must_use]
pub fn document_file_name(title: &str, key: &str, disambiguate: bool) -> String {
    let stem = sanitize_title(title);
    if disambiguate {
        format!("{stem}-{}{DOCUMENT_EXTENSION}", key_disambiguator(key))
    } else {
        format!("{stem}{DOCUMENT_EXTENSION}")
    }
}

/// Sanitizes a title into a filesystem-safe stem (no extension).
pub(crate) fn sanitize_title(title: &str) -> String {
    let collapsed = title.split_whitespace().collect::<Vec<_>>().join(" ");

    let replaced: String = collapsed
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = trim_edges(&replaced);
    let capped: String = trimmed.chars().take(MAX_STEM_CHARS).collect();
    let stem = trim_edges(&capped);

    if stem.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        stem.to_string()
    }
}

fn trim_edges(value: &str) -> &str {
    value.trim_matches(|c: char| c == '.' || c == ' ')
}

fn key_disambiguator(key: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(key.as_bytes()));
    digest[..DISAMBIGUATOR_HEX_CHARS].to_string()
}
