//! Capability routing by tag overlap.
//!
//! A request is turned into a tag set from the same vocabulary the registry
//! uses for capabilities. Candidates are ranked by overlap, then by data
//! source (live before demo), then by registry order.

use std::collections::BTreeSet;

use tracing::debug;
use wayfarer_core::{CapabilityDescriptor, Domain};

use crate::classifier;
use crate::registry::RegistrySnapshot;
use crate::tags::{self, UTILITY_TAGS};

#[derive(Debug, Default, Clone, Copy)]
pub struct Router;

impl Router {
    pub fn new() -> Self {
        Self
    }

    /// Tags describing a request.
    ///
    /// Once a travel domain is detected, utility tags are dropped, so a
    /// greeting in front of a train question does not pull in the greeter.
    pub fn request_tags(&self, text: &str) -> BTreeSet<String> {
        let words = tags::words(text);
        let mut tags = tags::tags_for_words(&words);

        for domain in Domain::ALL {
            if classifier::mentions(&words, domain) {
                tags.insert(domain.tag().to_string());
            }
        }
        if has_route_shape(&words) {
            tags.insert("search".to_string());
        }

        let travel = Domain::ALL
            .into_iter()
            .any(|d| d.is_travel() && tags.contains(d.tag()));
        if travel {
            tags.retain(|t| !UTILITY_TAGS.contains(&t.as_str()));
        }
        tags
    }

    /// Candidates for free text, best first.
    pub fn route(&self, text: &str, snapshot: &RegistrySnapshot) -> Vec<CapabilityDescriptor> {
        self.route_tags(&self.request_tags(text), snapshot)
    }

    /// Candidates for a tag set, best first. Descriptors sharing no tag are
    /// left out.
    pub fn route_tags(
        &self,
        request: &BTreeSet<String>,
        snapshot: &RegistrySnapshot,
    ) -> Vec<CapabilityDescriptor> {
        let mut scored: Vec<(usize, usize, &CapabilityDescriptor)> = snapshot
            .descriptors()
            .enumerate()
            .map(|(position, d)| (overlap(request, d), position, d))
            .filter(|(score, _, _)| *score > 0)
            .collect();

        scored.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then(a.2.source.cmp(&b.2.source))
                .then(a.1.cmp(&b.1))
        });

        if let Some((score, _, best)) = scored.first() {
            debug!(
                capability = %best.qualified_name(),
                score,
                candidates = scored.len(),
                "Routed request"
            );
        }
        scored.into_iter().map(|(_, _, d)| d.clone()).collect()
    }

    /// Candidates restricted to one domain.
    pub fn route_domain(
        &self,
        request: &BTreeSet<String>,
        domain: Domain,
        snapshot: &RegistrySnapshot,
    ) -> Vec<CapabilityDescriptor> {
        self.route_tags(request, snapshot)
            .into_iter()
            .filter(|d| d.has_tag(domain.tag()))
            .collect()
    }
}

fn overlap(request: &BTreeSet<String>, descriptor: &CapabilityDescriptor) -> usize {
    descriptor.keyword_tags.intersection(request).count()
}

/// "from ... to ..." or "between ... and ...".
fn has_route_shape(words: &[String]) -> bool {
    let followed = |first: &str, then: &str| {
        words
            .iter()
            .position(|w| w == first)
            .is_some_and(|at| words[at + 1..].iter().any(|w| w == then))
    };
    followed("from", "to") || followed("between", "and")
}
