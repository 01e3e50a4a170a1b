//! Turning a classified request into an ordered list of steps.
//!
//! Planning never fails. A domain with no routed capability becomes an
//! `Unavailable` step, and required arguments that nothing extracted are
//! defaulted where a sensible default exists.

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};
use serde_json::{Map, Value};
use tracing::debug;
use wayfarer_core::{
    CapabilityDescriptor, Domain, IntentClassification, KeywordGroup, OrchestrationStep,
    ParsedSlots, Slot,
};

use crate::registry::RegistrySnapshot;
use crate::router::Router;
use crate::tags::{self, has_phrase};

const EAST_COAST: &[&str] = &["leeds", "york", "newcastle", "doncaster", "wakefield"];
const WEST_COAST: &[&str] = &["manchester", "birmingham", "liverpool", "glasgow"];
const SOUTH_OF_LONDON: &[&str] = &["east croydon", "croydon", "brighton", "gatwick"];

/// Arguments that take a station or place name without naming a slot.
const STATION_ARGUMENTS: &[&str] = &["station_code", "station_name", "search_term"];

pub fn domain_label(domain: Option<Domain>) -> &'static str {
    match domain {
        Some(Domain::Train) => "TRAIN OPTIONS",
        Some(Domain::Hotel) => "HOTEL OPTIONS",
        Some(Domain::Utility) | None => "RESULT",
    }
}

/// A London terminus a journey has to change at.
#[derive(Debug, Clone, PartialEq)]
struct Interchange {
    hub: &'static str,
    /// The end of the journey south of London
    local_end: String,
    origin_is_local: bool,
}

impl Interchange {
    fn note(&self) -> String {
        let (from, to) = if self.origin_is_local {
            (self.local_end.as_str(), self.hub)
        } else {
            (self.hub, self.local_end.as_str())
        };
        let steps = match (self.hub, self.origin_is_local) {
            ("London Euston", false) => format!(
                "Take the Victoria line to London Victoria\n• Change to Southern for {to}"
            ),
            ("London Euston", true) => format!(
                "Take Southern to London Victoria\n• Change to the Victoria line for {to}"
            ),
            (_, false) => format!(
                "Take the Northern line to London Bridge\n• Change to Southern or Thameslink for {to}"
            ),
            (_, true) => format!(
                "Take Southern or Thameslink to London Bridge\n• Change to the Northern line for {to}"
            ),
        };
        let leg = format!("{from} → {to}\n• {steps}\n• Journey time: 45-60 minutes");
        if self.origin_is_local {
            // Listed after the outbound train but travelled first.
            format!("Before departure, get to the hub:\n{leg}")
        } else {
            leg
        }
    }
}

fn is_one_of(place: &str, names: &[&str]) -> bool {
    let words = tags::words(place);
    names.iter().any(|n| has_phrase(&words, n))
}

/// Look up the interchange for a pair of endpoints, in either direction.
fn interchange(origin: &str, destination: &str) -> Option<Interchange> {
    let (north, local_end, origin_is_local) = if is_one_of(destination, SOUTH_OF_LONDON) {
        (origin, destination, false)
    } else if is_one_of(origin, SOUTH_OF_LONDON) {
        (destination, origin, true)
    } else {
        return None;
    };

    let hub = if is_one_of(north, EAST_COAST) {
        "London Kings Cross"
    } else if is_one_of(north, WEST_COAST) {
        "London Euston"
    } else {
        return None;
    };
    Some(Interchange {
        hub,
        local_end: local_end.to_string(),
        origin_is_local,
    })
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn day_after(date: &str) -> Option<String> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()?
        .checked_add_days(Days::new(1))
        .map(iso)
}

/// Fill a capability's arguments from the slots.
///
/// Each declared argument takes the slot it is an alias of. The hotel
/// location falls back to the destination, and bare station arguments take
/// the origin, then the destination. Required arguments still missing get
/// a default when there is one: dates default to `today`, check-out and
/// return dates to the day after the start date, guests to 1.
pub fn fill_arguments(
    descriptor: &CapabilityDescriptor,
    slots: &ParsedSlots,
    today: NaiveDate,
) -> Map<String, Value> {
    let mut arguments = Map::new();
    for name in &descriptor.argument_names {
        let slot = Slot::for_argument(name);
        let value = match slot {
            Some(Slot::HotelLocation) => slots
                .value(Slot::HotelLocation)
                .or_else(|| slots.value(Slot::ToLocation)),
            Some(slot) => slots.value(slot),
            None if STATION_ARGUMENTS.contains(&name.as_str()) => slots
                .value(Slot::FromLocation)
                .or_else(|| slots.value(Slot::ToLocation)),
            None => None,
        };

        let value = match value {
            Some(value) => value.to_string(),
            None if descriptor.is_required(name) => {
                let start = slots.value(Slot::Date).map(str::to_string).unwrap_or_else(|| iso(today));
                let default = match slot {
                    Some(Slot::Date) => Some(start),
                    Some(Slot::ReturnDate) => day_after(&start),
                    Some(Slot::Guests) => Some("1".to_string()),
                    _ => None,
                };
                match default {
                    Some(default) => {
                        debug!(capability = %descriptor.qualified_name(), argument = %name, value = %default, "Defaulted required argument");
                        default
                    }
                    None => {
                        debug!(capability = %descriptor.qualified_name(), argument = %name, "Required argument missing");
                        continue;
                    }
                }
            }
            None => continue,
        };

        let rendered = match slot {
            Some(slot) => slot.to_argument(&value),
            None => Value::from(value),
        };
        arguments.insert(name.clone(), rendered);
    }
    arguments
}

pub struct Planner {
    router: Router,
}

impl Planner {
    pub fn new(router: Router) -> Self {
        Self { router }
    }

    /// Build the ordered plan for one request.
    pub fn build_plan(
        &self,
        text: &str,
        classification: &IntentClassification,
        slots: &ParsedSlots,
        snapshot: &RegistrySnapshot,
        today: NaiveDate,
    ) -> Vec<OrchestrationStep> {
        let plan = match classification {
            IntentClassification::RoundTrip { .. } => self.round_trip(slots, snapshot, today),
            IntentClassification::MultiIntent { groups } => {
                let request = self.router.request_tags(text);
                groups
                    .iter()
                    .map(|g| self.domain_step(&request, g.domain, slots, snapshot, today))
                    .collect()
            }
            IntentClassification::Single { groups } => {
                self.single(text, groups, slots, snapshot, today)
            }
        };
        debug!(intent = %classification.kind(), steps = plan.len(), "Built plan");
        plan
    }

    fn single(
        &self,
        text: &str,
        groups: &[KeywordGroup],
        slots: &ParsedSlots,
        snapshot: &RegistrySnapshot,
        today: NaiveDate,
    ) -> Vec<OrchestrationStep> {
        let primary = groups
            .iter()
            .map(|g| g.domain)
            .find(|d| d.is_travel())
            .or_else(|| groups.first().map(|g| g.domain));

        match primary {
            Some(domain) => {
                let request = self.router.request_tags(text);
                vec![self.domain_step(&request, domain, slots, snapshot, today)]
            }
            None => self
                .router
                .route(text, snapshot)
                .first()
                .map(|best| {
                    OrchestrationStep::invoke(
                        domain_label(best.domain()),
                        best.qualified_name(),
                        fill_arguments(best, slots, today),
                    )
                })
                .into_iter()
                .collect(),
        }
    }

    fn domain_step(
        &self,
        request: &BTreeSet<String>,
        domain: Domain,
        slots: &ParsedSlots,
        snapshot: &RegistrySnapshot,
        today: NaiveDate,
    ) -> OrchestrationStep {
        let label = domain_label(Some(domain));
        match self.router.route_domain(request, domain, snapshot).first() {
            Some(best) => OrchestrationStep::invoke(
                label,
                best.qualified_name(),
                fill_arguments(best, slots, today),
            ),
            None => OrchestrationStep::unavailable(label, domain),
        }
    }

    fn leg(
        &self,
        label: String,
        domain: Domain,
        slots: &ParsedSlots,
        snapshot: &RegistrySnapshot,
        today: NaiveDate,
    ) -> OrchestrationStep {
        let request: BTreeSet<String> = [domain.tag(), "search"].iter().map(|t| t.to_string()).collect();
        match self.router.route_domain(&request, domain, snapshot).first() {
            Some(best) => {
                OrchestrationStep::invoke(label, best.qualified_name(), fill_arguments(best, slots, today))
            }
            None => OrchestrationStep::unavailable(label, domain),
        }
    }

    /// Outbound, optional connection, return, accommodation.
    fn round_trip(
        &self,
        slots: &ParsedSlots,
        snapshot: &RegistrySnapshot,
        today: NaiveDate,
    ) -> Vec<OrchestrationStep> {
        let origin = slots.value(Slot::FromLocation);
        let destination = slots.value(Slot::ToLocation);
        let date = slots.value(Slot::Date).map(str::to_string).unwrap_or_else(|| iso(today));
        let return_date = slots
            .value(Slot::ReturnDate)
            .map(str::to_string)
            .or_else(|| day_after(&date))
            .unwrap_or_else(|| date.clone());

        let change = match (origin, destination) {
            (Some(origin), Some(destination)) => interchange(origin, destination),
            _ => None,
        };

        // With a change, the train legs run between the hub and the end
        // north of London.
        let (out_from, out_to, back_from, back_to) = match &change {
            Some(c) if c.origin_is_local => (Some(c.hub), destination, destination, Some(c.hub)),
            Some(c) => (origin, Some(c.hub), Some(c.hub), origin),
            None => (origin, destination, destination, origin),
        };

        let train_slots = |from: Option<&str>, to: Option<&str>, on: &str, with_time: bool| {
            let mut leg = ParsedSlots::new();
            if let Some(from) = from {
                leg.insert(Slot::FromLocation, from);
            }
            if let Some(to) = to {
                leg.insert(Slot::ToLocation, to);
            }
            leg.insert(Slot::Date, on);
            if let Some(time) = slots.value(Slot::Time).filter(|_| with_time) {
                leg.insert(Slot::Time, time);
            }
            leg
        };

        let mut plan = vec![self.leg(
            format!("OUTBOUND JOURNEY ({date})"),
            Domain::Train,
            &train_slots(out_from, out_to, &date, true),
            snapshot,
            today,
        )];

        if let Some(change) = &change {
            plan.push(OrchestrationStep::note("CONNECTION", change.note()));
        }

        plan.push(self.leg(
            format!("RETURN JOURNEY ({return_date})"),
            Domain::Train,
            &train_slots(back_from, back_to, &return_date, false),
            snapshot,
            today,
        ));

        let mut stay = ParsedSlots::new();
        if let Some(location) = slots
            .value(Slot::HotelLocation)
            .or(destination)
        {
            stay.insert(Slot::HotelLocation, location);
        }
        stay.insert(Slot::Date, date.as_str());
        stay.insert(Slot::ReturnDate, return_date.as_str());
        stay.insert(Slot::Guests, slots.value(Slot::Guests).unwrap_or("1"));
        plan.push(self.leg("ACCOMMODATION".to_string(), Domain::Hotel, &stay, snapshot, today));

        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classifier;
    use crate::extractor::Extractor;
    use crate::testing::builtin_snapshot;
    use serde_json::json;
    use std::sync::Arc;
    use wayfarer_core::{StepAction, WorkerId};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 1).unwrap()
    }

    fn plan_for(text: &str) -> Vec<OrchestrationStep> {
        plan_with(text, &builtin_snapshot())
    }

    fn plan_with(text: &str, snapshot: &RegistrySnapshot) -> Vec<OrchestrationStep> {
        let extractor = Arc::new(Extractor::with_reference_date(today()).unwrap());
        let classification = Classifier::new(extractor.clone()).classify(text);
        let slots = extractor.extract(text);
        Planner::new(Router::new()).build_plan(text, &classification, &slots, snapshot, today())
    }

    fn arguments(step: &OrchestrationStep) -> &Map<String, Value> {
        match &step.action {
            StepAction::Invoke { arguments, .. } => arguments,
            other => panic!("not an invocation: {other:?}"),
        }
    }

    fn labels(plan: &[OrchestrationStep]) -> Vec<&str> {
        plan.iter().map(|s| s.label.as_str()).collect()
    }

    #[test]
    fn single_train_request() {
        let plan = plan_for("Find trains from Leeds to Manchester today");
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].label, "TRAIN OPTIONS");
        assert_eq!(plan[0].capability(), Some("real_trainline.search_live_trains"));
        assert_eq!(
            Value::Object(arguments(&plan[0]).clone()),
            json!({"from_station": "Leeds", "to_station": "Manchester", "date": "2025-11-01"})
        );
    }

    #[test]
    fn round_trip_has_four_steps_in_order() {
        let plan = plan_for(
            "Plan a complete round trip from Leeds to East Croydon on 15/12/2025, returning 16/12/2025 for 1 person",
        );
        assert_eq!(
            labels(&plan),
            vec![
                "OUTBOUND JOURNEY (2025-12-15)",
                "CONNECTION",
                "RETURN JOURNEY (2025-12-16)",
                "ACCOMMODATION"
            ]
        );

        let outbound = arguments(&plan[0]);
        assert_eq!(outbound["from_station"], "Leeds");
        assert_eq!(outbound["to_station"], "London Kings Cross");
        assert_eq!(outbound["date"], "2025-12-15");

        let StepAction::Note { text } = &plan[1].action else {
            panic!("expected a connection note");
        };
        assert!(text.starts_with("London Kings Cross → East Croydon"));
        assert!(text.contains("Northern line to London Bridge"));

        let back = arguments(&plan[2]);
        assert_eq!(back["from_station"], "London Kings Cross");
        assert_eq!(back["to_station"], "Leeds");
        assert_eq!(back["date"], "2025-12-16");

        assert_eq!(plan[3].capability(), Some("multi_hotels.search_hotels"));
        assert_eq!(
            Value::Object(arguments(&plan[3]).clone()),
            json!({"location": "East Croydon", "checkin": "2025-12-15", "checkout": "2025-12-16", "guests": 1})
        );
    }

    #[test]
    fn round_trip_without_interchange_has_three_steps() {
        let plan = plan_for("Plan a round trip from Leeds to York on 2025-12-01 returning 2025-12-03");
        assert_eq!(
            labels(&plan),
            vec!["OUTBOUND JOURNEY (2025-12-01)", "RETURN JOURNEY (2025-12-03)", "ACCOMMODATION"]
        );
        assert_eq!(arguments(&plan[0])["to_station"], "York");
        assert_eq!(arguments(&plan[1])["from_station"], "York");
    }

    #[test]
    fn round_trip_defaults_dates() {
        let plan = plan_for("Plan a round trip from York to Leeds");
        assert_eq!(plan[0].label, "OUTBOUND JOURNEY (2025-11-01)");
        assert_eq!(plan[1].label, "RETURN JOURNEY (2025-11-02)");
    }

    #[test]
    fn multi_intent_train_then_hotel() {
        let plan = plan_for("Find trains from Leeds to York tomorrow and a hotel in York for 2 guests");
        assert_eq!(labels(&plan), vec!["TRAIN OPTIONS", "HOTEL OPTIONS"]);
        assert_eq!(plan[0].capability(), Some("real_trainline.search_live_trains"));
        let hotel = arguments(&plan[1]);
        assert_eq!(hotel["location"], "York");
        assert_eq!(hotel["checkin"], "2025-11-02");
        assert_eq!(hotel["checkout"], "2025-11-03");
        assert_eq!(hotel["guests"], 2);
    }

    #[test]
    fn missing_domain_becomes_unavailable() {
        let snapshot = builtin_snapshot();
        let without_hotels = snapshot
            .workers()
            .filter(|(id, _)| id.as_str() != "multi_hotels")
            .fold(RegistrySnapshot::new(), |s, (id, descriptors)| {
                let specs: Vec<_> = descriptors
                    .iter()
                    .map(|d| wayfarer_core::CapabilitySpec {
                        name: d.name.clone(),
                        description: d.description.clone(),
                        parameters: json!({"type": "object", "properties": {}}),
                    })
                    .collect();
                s.with_worker(WorkerId::clone(id), &specs)
            });
        let plan = plan_with("Find trains from Leeds to York and a hotel in York", &without_hotels);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[1].action, StepAction::Unavailable { domain: Domain::Hotel });
        assert_eq!(plan[1].label, "HOTEL OPTIONS");
    }

    #[test]
    fn station_arguments_take_the_origin() {
        let plan = plan_for("show departures from Leeds");
        assert_eq!(plan[0].capability(), Some("real_trainline.get_live_departures"));
        assert_eq!(
            Value::Object(arguments(&plan[0]).clone()),
            json!({"station_code": "Leeds"})
        );
    }

    #[test]
    fn utility_request() {
        let plan = plan_for("Calculate 15 * 7 + 3");
        assert_eq!(plan[0].label, "RESULT");
        assert_eq!(arguments(&plan[0])["expression"], "15 * 7 + 3");
    }

    #[test]
    fn nothing_to_do() {
        assert!(plan_for("tell me a joke").is_empty());
    }

    #[test]
    fn interchange_lookup() {
        let east = interchange("Leeds", "Brighton").unwrap();
        assert_eq!(east.hub, "London Kings Cross");
        let west = interchange("Manchester", "Gatwick Airport").unwrap();
        assert_eq!(west.hub, "London Euston");
        assert!(west.note().contains("Victoria line"));

        let reverse = interchange("East Croydon", "York").unwrap();
        assert!(reverse.origin_is_local);
        assert!(reverse
            .note()
            .starts_with("Before departure, get to the hub:\nEast Croydon → London Kings Cross"));
        assert!(east.note().starts_with("London Kings Cross → Brighton"));

        assert!(interchange("Leeds", "York").is_none());
        assert!(interchange("Bristol", "Brighton").is_none());
    }
}
