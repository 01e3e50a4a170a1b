//! Live trains worker.
//!
//! Answers with a sample timetable keyed by the UK station-code table, in
//! the shape a live departure feed would have. The data is deterministic
//! per route so repeated searches agree with each other.

use async_trait::async_trait;
use chrono::{Duration, NaiveTime};
use wayfarer_core::error::CapabilityError;
use wayfarer_core::{Capability, CapabilitySet};
use crate::stations::{matching_stations, station_code, station_name};
use crate::{optional_str, required_str, stable_hash};

pub fn capabilities(server_name: &str) -> CapabilitySet {
    CapabilitySet::new(server_name)
        .with(Box::new(SearchLiveTrains))
        .with(Box::new(LiveDepartures))
        .with(Box::new(FindStationCodes))
        .with(Box::new(JourneyDetails))
}

const DIVIDER_WIDTH: usize = 50;

/// Codes served by the East Coast main line.
const EAST_COAST: &[&str] = &["KGX", "LDS", "YRK", "NCL", "DON", "WKF", "EDB", "PBO"];
/// Codes served by the West Coast main line.
const WEST_COAST: &[&str] = &["EUS", "MAN", "BHM", "LIV", "GLC", "COV"];

fn operator_for(from: &str, to: &str) -> &'static str {
    let on = |line: &[&str]| line.contains(&from) && line.contains(&to);
    if on(EAST_COAST) {
        "LNER"
    } else if on(WEST_COAST) {
        "Avanti West Coast"
    } else if from == "ECR" || to == "ECR" || from == "BTN" || to == "BTN" {
        "Southern"
    } else {
        "CrossCountry"
    }
}

fn parse_time(text: &str) -> Result<NaiveTime, CapabilityError> {
    NaiveTime::parse_from_str(text, "%H:%M")
        .map_err(|_| CapabilityError::InvalidArguments(format!("Invalid time '{text}', expected HH:MM")))
}

#[derive(Debug, Clone, PartialEq)]
struct Service {
    departs: NaiveTime,
    duration_mins: i64,
    changes: u8,
    price_pence: u32,
    platform: u8,
}

impl Service {
    fn arrives(&self) -> NaiveTime {
        self.departs + Duration::minutes(self.duration_mins)
    }
}

/// Three sample services for a route, departing at or after `after`.
fn timetable(from: &str, to: &str, after: NaiveTime) -> Vec<Service> {
    let hash = stable_hash(&format!("{from}-{to}"));
    let base_duration = 60 + (hash % 210) as i64;
    let base_price = 2500 + (hash % 4000);
    let offsets = [15i64, 60, 90];

    offsets
        .iter()
        .enumerate()
        .map(|(i, offset)| {
            let changes = if i == 2 { 1 } else { 0 };
            Service {
                departs: after + Duration::minutes(*offset),
                duration_mins: base_duration + (i as i64) * 10 + changes as i64 * 15,
                changes,
                price_pence: base_price + (i as u32) * 650 - changes as u32 * 1300,
                platform: 1 + ((hash >> (i * 3)) % 9) as u8,
            }
        })
        .collect()
}

fn format_price(pence: u32) -> String {
    format!("£{}.{:02}", pence / 100, pence % 100)
}

fn format_duration(mins: i64) -> String {
    format!("{}h {:02}m", mins / 60, mins % 60)
}

fn display(code: &str, fallback: &str) -> String {
    station_name(code).map(str::to_string).unwrap_or_else(|| fallback.to_string())
}

pub struct SearchLiveTrains;

#[async_trait]
impl Capability for SearchLiveTrains {
    fn name(&self) -> &str {
        "search_live_trains"
    }

    fn description(&self) -> &str {
        "Search live train times and prices between two UK places."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "from_station": { "type": "string", "description": "Departure station name or code, e.g. 'Leeds' or 'LDS'" },
                "to_station": { "type": "string", "description": "Arrival station name or code" },
                "date": { "type": "string", "description": "Travel date (YYYY-MM-DD)" },
                "time": { "type": "string", "description": "Earliest departure (HH:MM)" }
            },
            "required": ["from_station", "to_station", "date"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, CapabilityError> {
        let from = required_str(&arguments, "from_station")?;
        let to = required_str(&arguments, "to_station")?;
        let date = required_str(&arguments, "date")?;
        let after = match optional_str(&arguments, "time") {
            Some(t) => parse_time(t)?,
            None => NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
        };

        let (from_code, to_code) = (station_code(from), station_code(to));
        let operator = operator_for(&from_code, &to_code);

        let mut out = format!(
            "Live train times: {from} ({from_code}) → {to} ({to_code})\nDate: {date}\n{}\n\n",
            "=".repeat(DIVIDER_WIDTH)
        );
        for service in timetable(&from_code, &to_code, after) {
            let route = if service.changes == 0 {
                "Direct".to_string()
            } else {
                format!("{} change", service.changes)
            };
            out.push_str(&format!(
                "{} → {} ({}) | {} | {}\n   Operator: {} | Platform: {} | On time\n\n",
                service.departs.format("%H:%M"),
                service.arrives().format("%H:%M"),
                format_duration(service.duration_mins),
                route,
                format_price(service.price_pence),
                if service.changes == 0 { operator } else { "CrossCountry" },
                service.platform,
            ));
        }
        out.push_str("For booking visit https://www.trainline.com");
        Ok(out)
    }
}

pub struct LiveDepartures;

const BOARD: &[(&str, &str, &str)] = &[
    ("14:15", "London Paddington", "On time"),
    ("14:45", "Birmingham New Street", "Delayed 5 min"),
    ("15:00", "Edinburgh Waverley", "On time"),
    ("15:30", "Manchester Piccadilly", "On time"),
    ("16:00", "Cardiff Central", "Cancelled"),
    ("16:20", "London King's Cross", "On time"),
];

#[async_trait]
impl Capability for LiveDepartures {
    fn name(&self) -> &str {
        "get_live_departures"
    }

    fn description(&self) -> &str {
        "Live train departures board for a 3-letter code, optionally filtered by destination."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "station_code": { "type": "string", "description": "3-letter code such as 'KGX', or a station name" },
                "destination": { "type": "string", "description": "Only show services to this destination" }
            },
            "required": ["station_code"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, CapabilityError> {
        let requested = required_str(&arguments, "station_code")?;
        let code = station_code(requested);
        let here = display(&code, requested);
        let destination = optional_str(&arguments, "destination").map(str::to_lowercase);

        let rows: Vec<_> = BOARD
            .iter()
            .filter(|(_, dest, _)| !dest.eq_ignore_ascii_case(&here))
            .filter(|(_, dest, _)| {
                destination
                    .as_deref()
                    .is_none_or(|d| dest.to_lowercase().contains(d))
            })
            .collect();

        let mut out = format!(
            "Live departures from {here} ({code})\n{}\n\n",
            "=".repeat(DIVIDER_WIDTH)
        );
        if rows.is_empty() {
            out.push_str("No departures match that destination right now.");
            return Ok(out);
        }
        let hash = stable_hash(&code);
        for (i, (time, dest, status)) in rows.into_iter().enumerate() {
            let platform = 1 + (((hash as usize) >> i) % 8);
            out.push_str(&format!("{time} → {dest} | Platform {platform} | {status}\n"));
        }
        Ok(out.trim_end().to_string())
    }
}

pub struct FindStationCodes;

#[async_trait]
impl Capability for FindStationCodes {
    fn name(&self) -> &str {
        "find_station_codes"
    }

    fn description(&self) -> &str {
        "Find 3-letter UK train station codes for a station name or city."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "search_term": { "type": "string", "description": "Station name or city" }
            },
            "required": ["search_term"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, CapabilityError> {
        let term = required_str(&arguments, "search_term")?;
        let found = matching_stations(term);
        if found.is_empty() {
            return Ok(format!(
                "No stations found matching '{term}'. Try a major city like London, Manchester or Birmingham."
            ));
        }
        let mut out = format!("Stations matching '{term}':\n\n");
        for (name, code) in found {
            out.push_str(&format!("• {name} ({code})\n"));
        }
        out.push_str("\nUse the 3-letter codes for more accurate searches.");
        Ok(out)
    }
}

pub struct JourneyDetails;

#[async_trait]
impl Capability for JourneyDetails {
    fn name(&self) -> &str {
        "get_journey_details"
    }

    fn description(&self) -> &str {
        "Detailed train journey information including changes, duration and fares."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "from_code": { "type": "string", "description": "Departure station code" },
                "to_code": { "type": "string", "description": "Arrival station code" },
                "date": { "type": "string", "description": "Travel date (YYYY-MM-DD)" },
                "time": { "type": "string", "description": "Departure time (HH:MM)" }
            },
            "required": ["from_code", "to_code", "date", "time"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, CapabilityError> {
        let from = station_code(required_str(&arguments, "from_code")?);
        let to = station_code(required_str(&arguments, "to_code")?);
        let date = required_str(&arguments, "date")?;
        let departs = parse_time(required_str(&arguments, "time")?)?;

        let direct = timetable(&from, &to, departs - Duration::minutes(15))
            .into_iter()
            .next()
            .map(|s| s.duration_mins)
            .unwrap_or(240);
        let arrive = departs + Duration::minutes(direct);
        let arrive_changed = departs + Duration::minutes(direct + 60);
        let advance = 1500 + stable_hash(&format!("{from}{to}")) % 3000;

        Ok(format!(
            "Journey details: {from} → {to}\nDate: {date} | Departure: {}\n{}\n\n\
             DIRECT SERVICE\n\
             Departure: {} from {from}\nArrival: {} at {to}\nDuration: {}\nOperator: {}\n\n\
             FARES\n\
             • Advance Single: {}\n• Off-Peak Single: {}\n• Anytime Single: {}\n\n\
             ALTERNATIVE WITH CHANGE\n\
             Change: Birmingham New Street (15 min connection)\nArrival: {} at {to}\nDuration: {}\nPrice: {}",
            departs.format("%H:%M"),
            "=".repeat(DIVIDER_WIDTH),
            departs.format("%H:%M"),
            arrive.format("%H:%M"),
            format_duration(direct),
            operator_for(&from, &to),
            format_price(advance),
            format_price(advance * 5 / 2),
            format_price(advance * 4),
            arrive_changed.format("%H:%M"),
            format_duration(direct + 60),
            format_price(advance * 4 / 5),
        ))
    }
}
