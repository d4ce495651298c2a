//! Keyword predicate.

use posting_watch::listing::KeywordFilter;
use posting_watch::AppError;

fn default_filter() -> KeywordFilter {
    KeywordFilter::new(["infanzia", "asilo", "nido", "educatrice", "educatore"]).expect("filter")
}

#[test]
fn matches_case_insensitively() {
    let filter = default_filter();
    assert!(filter.matches("Educatrice Asilo Nido"));
    assert!(filter.matches("SCUOLA DELL'INFANZIA"));
}

#[test]
fn rejects_unrelated_titles() {
    let filter = default_filter();
    assert!(!filter.matches("Concorso Amministrativo"));
    assert!(!filter.matches(""));
}

#[test]
fn matches_substrings() {
    assert!(default_filter().matches("asilonido"));
}

#[test]
fn terms_are_literal() {
    let filter = KeywordFilter::new(["c++", "a.b"]).expect("filter");
    assert!(filter.matches("Sviluppatore C++"));
    assert!(!filter.matches("axb"));
}

#[test]
fn pattern_is_an_alternation() {
    let filter = KeywordFilter::new(["asilo", " nido "]).expect("filter");
    assert_eq!(filter.pattern(), "asilo|nido");
}

#[test]
fn blank_terms_only_is_config_error() {
    let err = KeywordFilter::new(["", "  "]).expect_err("must fail");
    assert!(matches!(err, AppError::Config(_)));
}
