//! Renders a set of postings into plain-text and HTML bodies.

use std::fmt::Write as _;

use crate::models::IdentifiedRecord;

/// Plain-text and markup renditions of the same posting list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedMessage {
    /// One `- {title}: {href}` line per posting.
    pub text: String,
    /// `<ul>` with one linked `<li>` per posting.
    pub html: String,
}

/// Render `records` in order.
///
/// With `escape_markup` set, titles and links are HTML-escaped in the
/// markup body. The text body is never escaped. Callers must not pass an
/// empty slice for sending.
#[must_use]
pub fn compose(records: &[IdentifiedRecord], escape_markup: bool) -> ComposedMessage {
    let mut text = String::new();
    let mut html = String::from("<ul>");

    for record in records {
        let _ = writeln!(text, "- {}: {}", record.title, record.href);

        if escape_markup {
            let _ = write!(
                html,
                "<li><a href=\"{}\">{}</a></li>",
                escape_html(&record.href),
                escape_html(&record.title)
            );
        } else {
            let _ = write!(
                html,
                "<li><a href=\"{}\">{}</a></li>",
                record.href, record.title
            );
        }
    }

    html.push_str("</ul>");
    ComposedMessage { text, html }
}

/// Escape the five HTML-significant characters.
#[must_use]
pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
