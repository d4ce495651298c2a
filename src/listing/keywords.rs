//! Keyword predicate deciding which listing entries are relevant.

use regex::{Regex, RegexBuilder};

use crate::{AppError, Result};

/// Case-insensitive "contains any of these terms" predicate.
///
/// The same pattern runs inside the page (so non-matching entries never
/// cross the automation boundary) and on the decoded records.
#[derive(Debug, Clone)]
pub struct KeywordFilter {
    pattern: String,
    matcher: Regex,
}

impl KeywordFilter {
    /// Build a filter from a list of terms. Blank terms are ignored.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if no usable term remains.
    pub fn new<I, S>(terms: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let escaped: Vec<String> = terms
            .into_iter()
            .map(|term| term.as_ref().trim().to_owned())
            .filter(|term| !term.is_empty())
            .map(|term| regex::escape(&term))
            .collect();

        if escaped.is_empty() {
            return Err(AppError::Config("keyword list is empty".into()));
        }

        let pattern = escaped.join("|");
        let matcher = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .map_err(|err| AppError::Config(format!("invalid keyword pattern: {err}")))?;

        Ok(Self { pattern, matcher })
    }

    /// Whether `text` contains at least one keyword.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }

    /// Alternation pattern, usable as a case-insensitive page-side `RegExp`.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}
