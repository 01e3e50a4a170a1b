//! Workers and the capabilities they own, as seen by the engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Opaque handle identifying one long-lived backend worker.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorkerId(pub String);

impl WorkerId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A routing domain. Train and hotel are travel domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Train,
    Hotel,
    Utility,
}

impl Domain {
    /// All domains, in classifier iteration order.
    pub const ALL: [Domain; 3] = [Domain::Train, Domain::Hotel, Domain::Utility];

    /// The keyword tag naming this domain.
    pub fn tag(self) -> &'static str {
        match self {
            Domain::Train => "train",
            Domain::Hotel => "hotel",
            Domain::Utility => "utility",
        }
    }

    pub fn is_travel(self) -> bool {
        matches!(self, Domain::Train | Domain::Hotel)
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Where a capability's data comes from. Ordered so that `Live` sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Live,
    Unspecified,
    Demo,
}

impl DataSource {
    /// Detect the data source from the signals a capability carries.
    ///
    /// The capability name and owning worker are checked first; the
    /// description only breaks the silence when neither says anything.
    pub fn detect(name: &str, owner: &WorkerId, description: &str) -> Self {
        let strong = format!("{} {}", name, owner.as_str()).to_lowercase();
        if let Some(source) = Self::from_words(&strong) {
            return source;
        }
        Self::from_words(&description.to_lowercase()).unwrap_or(Self::Unspecified)
    }

    fn from_words(text: &str) -> Option<Self> {
        let words: Vec<&str> = text
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        if words.iter().any(|w| matches!(*w, "live" | "real")) {
            Some(Self::Live)
        } else if words.iter().any(|w| matches!(*w, "demo" | "sample")) {
            Some(Self::Demo)
        } else {
            None
        }
    }
}

/// An invocable capability discovered on a worker.
///
/// Created at discovery time and immutable afterwards; dropped from the
/// registry when its worker stops answering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    /// Capability name, unique within its worker
    pub name: String,

    /// The worker that owns this capability
    pub owner: WorkerId,

    /// Human-readable description
    pub description: String,

    /// Declared argument names, in declaration order
    pub argument_names: Vec<String>,

    /// The subset of `argument_names` the worker requires
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_arguments: Vec<String>,

    /// Routing tags derived from the name and description
    pub keyword_tags: BTreeSet<String>,

    /// Live or demo data
    pub source: DataSource,
}

impl CapabilityDescriptor {
    /// `<owner>.<name>`, unique across the whole registry.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.owner, self.name)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.keyword_tags.contains(tag)
    }

    /// The first domain whose tag this capability carries.
    pub fn domain(&self) -> Option<Domain> {
        Domain::ALL.into_iter().find(|d| self.has_tag(d.tag()))
    }

    pub fn is_required(&self, argument: &str) -> bool {
        self.required_arguments.iter().any(|a| a == argument)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str, owner: &str, tags: &[&str]) -> CapabilityDescriptor {
        CapabilityDescriptor {
            name: name.into(),
            owner: WorkerId::new(owner),
            description: String::new(),
            argument_names: vec![],
            required_arguments: vec![],
            keyword_tags: tags.iter().map(|t| t.to_string()).collect(),
            source: DataSource::Unspecified,
        }
    }

    #[test]
    fn qualified_name_joins_owner_and_name() {
        let d = descriptor("search_hotels", "multi_hotels", &["hotel"]);
        assert_eq!(d.qualified_name(), "multi_hotels.search_hotels");
    }

    #[test]
    fn domain_follows_tag_precedence() {
        assert_eq!(descriptor("a", "w", &["hotel", "train"]).domain(), Some(Domain::Train));
        assert_eq!(descriptor("a", "w", &["utility"]).domain(), Some(Domain::Utility));
        assert_eq!(descriptor("a", "w", &["search"]).domain(), None);
    }

    #[test]
    fn data_source_prefers_name_and_owner_signals() {
        let live = WorkerId::new("real_trainline");
        assert_eq!(DataSource::detect("search_live_trains", &live, ""), DataSource::Live);

        let demo = WorkerId::new("trainline_demo");
        assert_eq!(DataSource::detect("search_trains", &demo, ""), DataSource::Demo);

        let plain = WorkerId::new("trainline");
        assert_eq!(
            DataSource::detect("search_trains", &plain, "Sample timetable data"),
            DataSource::Demo
        );
        assert_eq!(DataSource::detect("search_trains", &plain, "Trains"), DataSource::Unspecified);
    }

    #[test]
    fn data_source_ignores_substrings() {
        // "delivery" contains "live" but is not the word "live"
        let w = WorkerId::new("delivery");
        assert_eq!(DataSource::detect("reality_check", &w, ""), DataSource::Unspecified);
    }

    #[test]
    fn live_sorts_before_demo() {
        let mut sources = vec![DataSource::Demo, DataSource::Live, DataSource::Unspecified];
        sources.sort();
        assert_eq!(sources, vec![DataSource::Live, DataSource::Unspecified, DataSource::Demo]);
    }
}
