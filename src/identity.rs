//! Stable identifier extraction from posting detail links.

use url::Url;

/// Base used to resolve relative detail links before reading the query.
const RELATIVE_BASE: &str = "http://localhost/";

/// Return the `id` query parameter of `href`, or an empty string.
///
/// Relative links are resolved against a placeholder base so only the
/// query string matters. Unparseable input yields an empty identifier.
#[must_use]
pub fn identify(href: &str) -> String {
    let parsed = match Url::parse(href) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(RELATIVE_BASE)
            .and_then(|base| base.join(href))
            .ok(),
        Err(_) => None,
    };

    parsed
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "id")
                .map(|(_, value)| value.into_owned())
        })
        .unwrap_or_default()
}
