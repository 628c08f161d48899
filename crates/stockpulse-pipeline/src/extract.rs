//! Candidate ticker extraction from raw post text.

use std::sync::LazyLock;

use regex::Regex;

use stockpulse_core::MatchRules;

/// 2-5 uppercase letters, optional `$` prefix, ending on a word boundary.
static UPPER_SYMBOL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$?([A-Z]{2,5})\b").expect("valid symbol regex"));

/// `$ticker` spotted in a lowercased copy of the text.
static DOLLAR_LOWER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([a-z]{2,5})\b").expect("valid dollar-ticker regex"));

/// "ticker abc" / "stocks abc" phrasing, capturing the trailing word.
static PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:ticker|stock|share)s?\s+([a-z]{2,5})\b").expect("valid phrase regex")
});

/// Extract candidate ticker symbols from `text`.
///
/// The result is a multiset in scan order, NOT deduplicated: every match
/// occurrence is forwarded independently so mention counts reflect repeated
/// emphasis within one post. A `$`-prefixed symbol is seen by both the
/// uppercase scan and the lowercase `$` scan and therefore yields two
/// candidates per occurrence.
///
/// Candidates on the stoplist, or with a length outside `[2, 5]`, are dropped
/// silently.
#[must_use]
pub fn extract(text: &str, rules: &MatchRules) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut candidates: Vec<String> = Vec::new();

    for caps in UPPER_SYMBOL.captures_iter(text) {
        candidates.push(caps[1].to_string());
    }
    for caps in DOLLAR_LOWER.captures_iter(&lowered) {
        candidates.push(caps[1].to_uppercase());
    }
    for caps in PHRASE.captures_iter(&lowered) {
        candidates.push(caps[1].to_uppercase());
    }

    candidates.retain(|symbol| {
        (2..=5).contains(&symbol.len()) && !rules.stoplist.contains(symbol.as_str())
    });
    candidates
}
