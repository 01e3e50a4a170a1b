//! Example prompts for the front-end.

use serde::Serialize;
use wayfarer_core::Domain;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionGroup {
    pub category: &'static str,
    pub prompts: Vec<&'static str>,
}

/// Category, the domains it needs, and its prompts.
const CATALOGUE: &[(&str, &[Domain], &[&str])] = &[
    (
        "travel",
        &[Domain::Train, Domain::Hotel],
        &[
            "Plan a complete round trip from Leeds to East Croydon on 15/12/2025, returning 16/12/2025",
            "Find trains from London to Manchester today and hotels there for tonight",
            "Find hotels near King's Cross station for December 20-21",
        ],
    ),
    (
        "trains",
        &[Domain::Train],
        &[
            "Find trains from London to Manchester today",
            "Show departures from Birmingham",
            "Get station info for King's Cross",
            "Find stations in Edinburgh",
            "Popular UK train routes",
        ],
    ),
    (
        "hotels",
        &[Domain::Hotel],
        &[
            "Find hotels in London for December 20-22 for 2 guests",
            "Find hotels in Paris for December 20-22",
            "Find budget hotels in Berlin on 2025-12-01 for 3 nights",
        ],
    ),
    (
        "general",
        &[Domain::Utility],
        &["Hello, my name is Alice", "Calculate 15 * 7 + 3", "What time is it?", "Greet John"],
    ),
];

/// Groups whose domains are all served, in catalogue order.
pub fn suggestions(serves: impl Fn(Domain) -> bool) -> Vec<SuggestionGroup> {
    CATALOGUE
        .iter()
        .filter(|(_, needs, _)| needs.iter().all(|d| serves(*d)))
        .map(|(category, _, prompts)| SuggestionGroup {
            category: *category,
            prompts: prompts.to_vec(),
        })
        .collect()
}
