//! Intent types: extracted slots and the classified shape of a request.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::conversation::IntentKind;
use crate::worker::Domain;

/// A named piece of structured information pulled out of free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    FromLocation,
    ToLocation,
    Date,
    ReturnDate,
    Time,
    Guests,
    HotelLocation,
    /// Greeting target
    Name,
    /// Arithmetic expression
    Expression,
}

impl Slot {
    pub const ALL: [Slot; 9] = [
        Slot::FromLocation,
        Slot::ToLocation,
        Slot::Date,
        Slot::ReturnDate,
        Slot::Time,
        Slot::Guests,
        Slot::HotelLocation,
        Slot::Name,
        Slot::Expression,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Slot::FromLocation => "from_location",
            Slot::ToLocation => "to_location",
            Slot::Date => "date",
            Slot::ReturnDate => "return_date",
            Slot::Time => "time",
            Slot::Guests => "guests",
            Slot::HotelLocation => "hotel_location",
            Slot::Name => "name",
            Slot::Expression => "expression",
        }
    }

    /// Capability argument names this slot can fill.
    pub fn argument_aliases(self) -> &'static [&'static str] {
        match self {
            Slot::FromLocation => &["from_location", "from_station", "from_code"],
            Slot::ToLocation => &["to_location", "to_station", "to_code"],
            Slot::Date => &["date", "checkin", "checkin_date"],
            Slot::ReturnDate => &["return_date", "checkout", "checkout_date"],
            Slot::Time => &["time"],
            Slot::Guests => &["guests"],
            Slot::HotelLocation => &["hotel_location", "location", "destination"],
            Slot::Name => &["name"],
            Slot::Expression => &["expression"],
        }
    }

    /// The slot that fills a given argument name, if any.
    pub fn for_argument(argument: &str) -> Option<Slot> {
        Self::ALL
            .into_iter()
            .find(|s| s.argument_aliases().contains(&argument))
    }

    /// Render a slot value as a JSON argument. Guest counts travel as
    /// numbers, everything else as strings.
    pub fn to_argument(self, value: &str) -> serde_json::Value {
        match self {
            Slot::Guests => value
                .parse::<u64>()
                .map(serde_json::Value::from)
                .unwrap_or_else(|_| serde_json::Value::from(value)),
            _ => serde_json::Value::from(value),
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotOrigin {
    /// Matched in the request text
    Extracted,
    /// Filled in because nothing matched
    Defaulted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotValue {
    pub value: String,
    pub origin: SlotOrigin,
}

/// Slots extracted from one request. An absent key means "not found",
/// which is different from a slot that matched an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedSlots {
    slots: BTreeMap<Slot, SlotValue>,
}

impl ParsedSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: Slot) -> Option<&SlotValue> {
        self.slots.get(&slot)
    }

    /// The raw value of a slot, extracted or defaulted.
    pub fn value(&self, slot: Slot) -> Option<&str> {
        self.slots.get(&slot).map(|v| v.value.as_str())
    }

    pub fn contains(&self, slot: Slot) -> bool {
        self.slots.contains_key(&slot)
    }

    pub fn is_extracted(&self, slot: Slot) -> bool {
        self.get(slot).is_some_and(|v| v.origin == SlotOrigin::Extracted)
    }

    /// Record an extracted value, replacing whatever was there.
    pub fn insert(&mut self, slot: Slot, value: impl Into<String>) {
        self.slots.insert(
            slot,
            SlotValue {
                value: value.into(),
                origin: SlotOrigin::Extracted,
            },
        );
    }

    /// Record a default, but never over an existing value.
    pub fn insert_default(&mut self, slot: Slot, value: impl Into<String>) {
        self.slots.entry(slot).or_insert_with(|| SlotValue {
            value: value.into(),
            origin: SlotOrigin::Defaulted,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = (Slot, &SlotValue)> {
        self.slots.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// The keywords of one domain found in a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordGroup {
    pub domain: Domain,
    pub keywords: Vec<String>,
}

/// The shape of a request. Produced once per turn and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntentClassification {
    /// One capability call; the groups may be empty when no domain
    /// keyword was found.
    Single { groups: Vec<KeywordGroup> },

    /// Independent train and hotel requests in one sentence, train first.
    MultiIntent { groups: Vec<KeywordGroup> },

    /// A composite outbound/return/accommodation plan.
    RoundTrip { slots: ParsedSlots },
}

impl IntentClassification {
    pub fn kind(&self) -> IntentKind {
        match self {
            Self::Single { groups } if groups.is_empty() => IntentKind::None,
            Self::Single { .. } => IntentKind::Single,
            Self::MultiIntent { .. } => IntentKind::MultiIntent,
            Self::RoundTrip { .. } => IntentKind::RoundTrip,
        }
    }

    /// Detected domains in keyword-set iteration order.
    pub fn domains(&self) -> Vec<Domain> {
        match self {
            Self::Single { groups } | Self::MultiIntent { groups } => {
                groups.iter().map(|g| g.domain).collect()
            }
            Self::RoundTrip { .. } => vec![Domain::Train, Domain::Hotel],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_never_overwrites_extracted() {
        let mut slots = ParsedSlots::new();
        slots.insert(Slot::Guests, "3");
        slots.insert_default(Slot::Guests, "1");
        assert_eq!(slots.value(Slot::Guests), Some("3"));
        assert!(slots.is_extracted(Slot::Guests));
    }

    #[test]
    fn defaulted_slot_is_distinguishable() {
        let mut slots = ParsedSlots::new();
        slots.insert_default(Slot::Guests, "1");
        assert!(slots.contains(Slot::Guests));
        assert!(!slots.is_extracted(Slot::Guests));
        assert_eq!(slots.get(Slot::Guests).unwrap().origin, SlotOrigin::Defaulted);
    }

    #[test]
    fn absent_differs_from_empty() {
        let mut slots = ParsedSlots::new();
        assert_eq!(slots.value(Slot::Time), None);
        slots.insert(Slot::Time, "");
        assert_eq!(slots.value(Slot::Time), Some(""));
    }

    #[test]
    fn argument_aliases_resolve_back_to_slots() {
        assert_eq!(Slot::for_argument("checkin"), Some(Slot::Date));
        assert_eq!(Slot::for_argument("checkout"), Some(Slot::ReturnDate));
        assert_eq!(Slot::for_argument("from_station"), Some(Slot::FromLocation));
        assert_eq!(Slot::for_argument("location"), Some(Slot::HotelLocation));
        assert_eq!(Slot::for_argument("country"), None);
    }

    #[test]
    fn guests_become_json_numbers() {
        assert_eq!(Slot::Guests.to_argument("2"), serde_json::json!(2));
        assert_eq!(Slot::Date.to_argument("2025-12-15"), serde_json::json!("2025-12-15"));
    }

    #[test]
    fn classification_kind() {
        let none = IntentClassification::Single { groups: vec![] };
        assert_eq!(none.kind(), IntentKind::None);
        let rt = IntentClassification::RoundTrip { slots: ParsedSlots::new() };
        assert_eq!(rt.kind(), IntentKind::RoundTrip);
        assert_eq!(rt.domains(), vec![Domain::Train, Domain::Hotel]);
    }
}
