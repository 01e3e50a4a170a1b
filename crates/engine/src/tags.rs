//! Word tokenizing and the routing tag vocabulary.
//!
//! Capabilities and requests are both described by tags from one fixed
//! vocabulary, so routing is a set comparison rather than substring checks.

use std::collections::BTreeSet;

/// Lower-cased alphanumeric words. Underscores and punctuation split words,
/// so `search_live_trains` yields `search`, `live`, `trains`.
pub fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Whether `phrase` (space separated) occurs as contiguous words.
pub fn has_phrase(words: &[String], phrase: &str) -> bool {
    let needle: Vec<&str> = phrase.split(' ').collect();
    if needle.is_empty() || needle.len() > words.len() {
        return false;
    }
    words
        .windows(needle.len())
        .any(|window| window.iter().zip(&needle).all(|(w, n)| w == n))
}

/// Tag name followed by the words or phrases that signal it.
const VOCABULARY: &[(&str, &[&str])] = &[
    ("train", &["train", "trains", "rail", "railway"]),
    ("hotel", &["hotel", "hotels", "accommodation"]),
    ("utility", &["utility"]),
    ("search", &["search"]),
    ("station", &["station", "stations"]),
    ("departures", &["departure", "departures"]),
    ("journey", &["journey", "journeys"]),
    ("routes", &["route", "routes"]),
    ("greeting", &["greet", "greeting", "greets", "hello"]),
    (
        "arithmetic",
        &["calculate", "calculation", "arithmetic", "math", "expression", "compute", "evaluate"],
    ),
    ("clock", &["clock", "current time", "what time", "time is it"]),
];

/// Facet tags and the domain tag each one implies.
const IMPLIED: &[(&str, &str)] = &[
    ("station", "train"),
    ("departures", "train"),
    ("journey", "train"),
    ("routes", "train"),
    ("greeting", "utility"),
    ("arithmetic", "utility"),
    ("clock", "utility"),
];

/// Facet tags that belong to the utility domain.
pub const UTILITY_TAGS: &[&str] = &["utility", "greeting", "arithmetic", "clock"];

/// All tags in the vocabulary whose signal words occur in `text`, plus the
/// domain tags those facets imply.
pub fn derive_tags(text: &str) -> BTreeSet<String> {
    tags_for_words(&words(text))
}

pub fn tags_for_words(words: &[String]) -> BTreeSet<String> {
    let mut tags: BTreeSet<String> = VOCABULARY
        .iter()
        .filter(|(_, signals)| signals.iter().any(|s| has_phrase(words, s)))
        .map(|(tag, _)| tag.to_string())
        .collect();

    for (facet, domain) in IMPLIED {
        if tags.contains(*facet) {
            tags.insert(domain.to_string());
        }
    }
    tags
}
