//! Demo trains worker: fixed sample timetable and station information.

use async_trait::async_trait;
use wayfarer_core::error::CapabilityError;
use wayfarer_core::{Capability, CapabilitySet};
use crate::{optional_str, required_str};

pub fn capabilities(server_name: &str) -> CapabilitySet {
    CapabilitySet::new(server_name)
        .with(Box::new(SearchTrains))
        .with(Box::new(StationInfo))
        .with(Box::new(FindStations))
        .with(Box::new(PopularRoutes))
}

const BOOKING_HINT: &str = "This is demo data. For real-time prices visit https://www.trainline.com";

pub struct SearchTrains;

#[async_trait]
impl Capability for SearchTrains {
    fn name(&self) -> &str {
        "search_trains"
    }

    fn description(&self) -> &str {
        "Search demo train tickets from one place to another on a given date."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "from_station": { "type": "string", "description": "Departure station, e.g. 'Leeds'" },
                "to_station": { "type": "string", "description": "Arrival station, e.g. 'Manchester'" },
                "date": { "type": "string", "description": "Travel date (YYYY-MM-DD)" },
                "time": { "type": "string", "description": "Preferred departure time (HH:MM)" }
            },
            "required": ["from_station", "to_station", "date"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, CapabilityError> {
        let from = required_str(&arguments, "from_station")?;
        let to = required_str(&arguments, "to_station")?;
        let date = required_str(&arguments, "date")?;

        let mut out = format!("Train search: {from} → {to}\nDate: {date}\n");
        if let Some(time) = optional_str(&arguments, "time") {
            out.push_str(&format!("Preferred time: {time}\n"));
        }
        out.push_str(&format!(
            "\nPopular services from {from}:\n\
             • {from} to London (frequent services)\n\
             • {from} to Manchester (direct routes available)\n\
             • {from} to Edinburgh (scenic route)\n\n\
             Search link: https://www.trainline.com/search/{}/{}/{date}\n{BOOKING_HINT}",
            url_segment(from),
            url_segment(to),
        ));
        Ok(out)
    }
}

pub struct StationInfo;

#[async_trait]
impl Capability for StationInfo {
    fn name(&self) -> &str {
        "get_station_info"
    }

    fn description(&self) -> &str {
        "Station facilities and opening hours for a named train station (demo data)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "station_name": { "type": "string", "description": "Name of the station" }
            },
            "required": ["station_name"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, CapabilityError> {
        let station = required_str(&arguments, "station_name")?;
        Ok(format!(
            "Station information: {station}\n\
             Type: Major railway station\n\
             Parking: Available (charges apply)\n\
             Accessibility: Step-free access to all platforms\n\
             Facilities: Shops, cafés, waiting rooms, free WiFi\n\
             Ticket office: 06:00 - 22:00\n\
             Arrive 15-30 minutes before domestic departures.\n{BOOKING_HINT}"
        ))
    }
}

pub struct FindStations;

#[async_trait]
impl Capability for FindStations {
    fn name(&self) -> &str {
        "find_stations"
    }

    fn description(&self) -> &str {
        "Find train stations matching a city or station name (demo data)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "search_term": { "type": "string", "description": "City or station name" }
            },
            "required": ["search_term"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, CapabilityError> {
        let term = required_str(&arguments, "search_term")?;
        let suffixes = ["Central", "North", "South", "East", "West"];
        let mut out = format!("Stations matching \"{term}\":\n");
        for suffix in suffixes {
            out.push_str(&format!("• {term} {suffix}\n"));
        }
        out.push_str(BOOKING_HINT);
        Ok(out)
    }
}

pub struct PopularRoutes;

const ROUTES: &[(&str, &[&str])] = &[
    (
        "UK",
        &[
            "London ↔ Edinburgh (East Coast Main Line)",
            "London ↔ Manchester (West Coast Main Line)",
            "London ↔ Birmingham (frequent services)",
            "London ↔ Liverpool (direct routes)",
            "Manchester ↔ Liverpool (short journey)",
        ],
    ),
    (
        "FR",
        &[
            "Paris ↔ Lyon (TGV)",
            "Paris ↔ Marseille (TGV)",
            "Paris ↔ Bordeaux (TGV)",
        ],
    ),
    (
        "DE",
        &[
            "Berlin ↔ Munich (ICE)",
            "Hamburg ↔ Frankfurt (ICE)",
            "Cologne ↔ Berlin (ICE)",
        ],
    ),
    (
        "INT",
        &[
            "London ↔ Paris (Eurostar)",
            "London ↔ Brussels (Eurostar)",
            "Paris ↔ Amsterdam (Thalys)",
        ],
    ),
];

#[async_trait]
impl Capability for PopularRoutes {
    fn name(&self) -> &str {
        "get_popular_routes"
    }

    fn description(&self) -> &str {
        "Popular train routes and destinations, optionally for one country (demo data)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "country": { "type": "string", "description": "Country code, e.g. 'UK', 'FR', 'DE'" }
            },
            "required": []
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, CapabilityError> {
        let country = optional_str(&arguments, "country").map(str::to_uppercase);
        let selected: Vec<_> = ROUTES
            .iter()
            .filter(|(code, _)| country.as_deref().is_none_or(|c| c == *code))
            .collect();
        if selected.is_empty() {
            return Ok(format!(
                "No popular routes listed for '{}'. Try UK, FR or DE.",
                country.unwrap_or_default()
            ));
        }

        let mut out = String::from("Popular train routes\n");
        for (code, routes) in selected {
            out.push_str(&format!("\n{code}:\n"));
            for route in *routes {
                out.push_str(&format!("• {route}\n"));
            }
        }
        out.push_str("\nBook in advance and travel off-peak for the best prices.");
        Ok(out)
    }
}

fn url_segment(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join("%20")
}
