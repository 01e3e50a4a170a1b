//! Intent classification.
//!
//! The checks run in a fixed order: round trip, then multi-intent, then
//! single. A round-trip request usually also carries train and hotel
//! keywords, so checking it first is what keeps it from being read as a
//! plain multi-intent bundle.

use std::sync::Arc;

use wayfarer_core::{Domain, IntentClassification, KeywordGroup};

use crate::extractor::Extractor;
use crate::tags::{self, has_phrase};

const TRAIN_KEYWORDS: &[&str] = &[
    "train", "trains", "railway", "rail", "station", "stations", "departure", "departures",
    "arrival", "arrivals", "journey", "catch", "ticket", "tickets",
];

const HOTEL_KEYWORDS: &[&str] = &[
    "hotel", "hotels", "stay", "staying", "accommodation", "travelodge", "premier inn", "room",
    "rooms", "lodge", "resort", "checkin", "checkout",
];

const UTILITY_KEYWORDS: &[&str] = &[
    "calculate", "compute", "evaluate", "math", "add", "subtract", "multiply", "divide",
    "equation", "greet", "hello", "hi", "hey", "welcome", "my name is", "call me", "what time",
    "current time", "time is it",
];

const ROUND_TRIP_KEYWORDS: &[&str] = &["round trip", "return", "returning", "complete trip"];

pub fn keywords(domain: Domain) -> &'static [&'static str] {
    match domain {
        Domain::Train => TRAIN_KEYWORDS,
        Domain::Hotel => HOTEL_KEYWORDS,
        Domain::Utility => UTILITY_KEYWORDS,
    }
}

/// The keywords of `domain` present in already tokenized text.
pub fn matched_keywords(words: &[String], domain: Domain) -> Vec<String> {
    keywords(domain)
        .iter()
        .filter(|k| has_phrase(words, k))
        .map(|k| k.to_string())
        .collect()
}

pub fn mentions(words: &[String], domain: Domain) -> bool {
    keywords(domain).iter().any(|k| has_phrase(words, k))
}

/// "plan ... trip", with "trip" somewhere after the verb.
fn plans_a_trip(words: &[String]) -> bool {
    words
        .iter()
        .position(|w| w == "plan" || w == "planning")
        .is_some_and(|at| words[at + 1..].iter().any(|w| w == "trip"))
}

pub fn is_round_trip(words: &[String]) -> bool {
    ROUND_TRIP_KEYWORDS.iter().any(|k| has_phrase(words, k)) || plans_a_trip(words)
}

pub struct Classifier {
    extractor: Arc<Extractor>,
}

impl Classifier {
    pub fn new(extractor: Arc<Extractor>) -> Self {
        Self { extractor }
    }

    /// Keyword groups per domain, in `Domain::ALL` order.
    pub fn detect_groups(&self, text: &str) -> Vec<KeywordGroup> {
        let words = tags::words(text);
        Domain::ALL
            .into_iter()
            .filter_map(|domain| {
                let keywords = matched_keywords(&words, domain);
                (!keywords.is_empty()).then_some(KeywordGroup { domain, keywords })
            })
            .collect()
    }

    pub fn classify(&self, text: &str) -> IntentClassification {
        if is_round_trip(&tags::words(text)) {
            return IntentClassification::RoundTrip {
                slots: self.extractor.extract(text),
            };
        }

        let groups = self.detect_groups(text);
        let has = |domain| groups.iter().any(|g| g.domain == domain);
        if has(Domain::Train) && has(Domain::Hotel) {
            let groups = groups.into_iter().filter(|g| g.domain.is_travel()).collect();
            return IntentClassification::MultiIntent { groups };
        }

        IntentClassification::Single { groups }
    }
}
