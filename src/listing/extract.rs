//! In-page extraction script and decoding of its payload.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::keywords::KeywordFilter;
use crate::models::RawRecord;
use crate::{AppError, Result};

/// Script evaluated in the page for every listing page.
///
/// Arguments: list selector, keyword pattern, details-link caption.
/// Returns one `{ href, title }` object per keyword-matching entry, with
/// the title whitespace-flattened the same way as [`flatten_text`];
/// `href` is `null` when the entry has no details link.
pub const EXTRACT_SCRIPT: &str = r#"
const [selector, pattern, caption] = arguments;
const matcher = new RegExp(pattern, "i");
const flatten = (text) => (text || "").replace(/\s+/g, " ").trim();
return Array.from(document.querySelectorAll(selector))
  .map((element) => ({ element, title: flatten(element.textContent) }))
  .filter(({ title }) => matcher.test(title))
  .map(({ element, title }) => {
    const anchor = Array.from(element.querySelectorAll("a"))
      .find((a) => flatten(a.textContent) === caption);
    return {
      href: anchor ? anchor.getAttribute("href") : null,
      title,
    };
  });
"#;

/// One entry as returned by [`EXTRACT_SCRIPT`].
#[derive(Debug, Deserialize)]
struct ExtractedEntry {
    #[serde(default)]
    href: Option<String>,
    #[serde(default)]
    title: String,
}

/// Records read from a single listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageBatch {
    /// 1-based page number within the run.
    pub page: u32,
    /// Well-formed matching records, in page order.
    pub records: Vec<RawRecord>,
    /// Matching entries dropped because they had no details link.
    pub dropped: usize,
}

/// Decode the script payload for `page` into a batch.
///
/// Entries without a details link are dropped with a warning; the rest
/// of the page is kept. A kept title is never empty, since it matched a
/// non-blank keyword.
///
/// # Errors
///
/// Returns `AppError::Extraction` if the payload is not a list of entries.
pub fn decode_page(
    payload: Value,
    page: u32,
    filter: &KeywordFilter,
) -> Result<PageBatch> {
    let entries: Vec<ExtractedEntry> = serde_json::from_value(payload)
        .map_err(|err| AppError::Extraction(format!("page {page}: unexpected payload: {err}")))?;

    let mut records = Vec::with_capacity(entries.len());
    let mut dropped = 0;

    for entry in entries {
        let title = flatten_text(&entry.title);
        if !filter.matches(&title) {
            continue;
        }

        let href = entry.href.map(|h| h.trim().to_owned()).unwrap_or_default();
        if href.is_empty() {
            warn!(page, %title, "listing entry has no details link; dropped");
            dropped += 1;
            continue;
        }

        records.push(RawRecord::new(href, title));
    }

    Ok(PageBatch {
        page,
        records,
        dropped,
    })
}

/// Collapse runs of whitespace into single spaces.
#[must_use]
pub fn flatten_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
