//! Hotels worker: major UK chains with per-location variation.

use async_trait::async_trait;
use chrono::NaiveDate;
use wayfarer_core::error::CapabilityError;
use wayfarer_core::{Capability, CapabilitySet};
use crate::{required_str, stable_hash};

pub fn capabilities(server_name: &str) -> CapabilitySet {
    CapabilitySet::new(server_name).with(Box::new(SearchHotels))
}

struct Chain {
    name: &'static str,
    base_price: i64,
    /// Rating out of 10, in tenths
    base_rating: i64,
    amenities: &'static [&'static str],
    phone: &'static str,
    website: &'static str,
}

const CHAINS: &[Chain] = &[
    Chain {
        name: "Premier Inn",
        base_price: 89,
        base_rating: 87,
        amenities: &["Free WiFi", "Restaurant", "Parking"],
        phone: "0871 527 9222",
        website: "www.premierinn.com",
    },
    Chain {
        name: "Travelodge",
        base_price: 65,
        base_rating: 82,
        amenities: &["Free WiFi", "24h Reception"],
        phone: "0871 984 6484",
        website: "www.travelodge.co.uk",
    },
    Chain {
        name: "Holiday Inn Express",
        base_price: 95,
        base_rating: 85,
        amenities: &["Free WiFi", "Gym", "Breakfast included"],
        phone: "0871 423 4896",
        website: "www.ihg.com",
    },
    Chain {
        name: "Ibis",
        base_price: 78,
        base_rating: 83,
        amenities: &["Free WiFi", "Restaurant", "Bar"],
        phone: "0207 660 0680",
        website: "www.ibis.com",
    },
];

#[derive(Debug, Clone, PartialEq)]
pub struct HotelOffer {
    pub name: String,
    pub price_per_night: i64,
    pub rating_tenths: i64,
    pub amenities: &'static [&'static str],
    pub phone: &'static str,
    pub website: &'static str,
}

/// The chain offers for a location, best rated first. The same location
/// always yields the same prices and ratings.
pub fn offers_for(location: &str) -> Vec<HotelOffer> {
    let hash = stable_hash(location) as i64;
    let price_shift = hash % 30 - 15;
    let rating_shift = hash % 10 - 5;

    let mut offers: Vec<HotelOffer> = CHAINS
        .iter()
        .map(|chain| HotelOffer {
            name: format!("{} {location}", chain.name),
            price_per_night: chain.base_price + price_shift,
            rating_tenths: (chain.base_rating + rating_shift).clamp(10, 100),
            amenities: chain.amenities,
            phone: chain.phone,
            website: chain.website,
        })
        .collect();
    offers.sort_by(|a, b| b.rating_tenths.cmp(&a.rating_tenths));
    offers
}

fn parse_date(text: &str, field: &str) -> Result<NaiveDate, CapabilityError> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| {
        CapabilityError::InvalidArguments(format!("Invalid {field} date '{text}', expected YYYY-MM-DD"))
    })
}

fn plural(n: i64, word: &str) -> String {
    if n == 1 { format!("{n} {word}") } else { format!("{n} {word}s") }
}

pub struct SearchHotels;

#[async_trait]
impl Capability for SearchHotels {
    fn name(&self) -> &str {
        "search_hotels"
    }

    fn description(&self) -> &str {
        "Search hotels from major UK chains for a location and check-in/check-out dates."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "location": { "type": "string", "description": "City or area, e.g. 'East Croydon'" },
                "checkin": { "type": "string", "description": "Check-in date (YYYY-MM-DD)" },
                "checkout": { "type": "string", "description": "Check-out date (YYYY-MM-DD)" },
                "guests": { "type": "integer", "description": "Number of guests", "default": 1 }
            },
            "required": ["location", "checkin", "checkout"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, CapabilityError> {
        let location = required_str(&arguments, "location")?;
        let checkin = parse_date(required_str(&arguments, "checkin")?, "check-in")?;
        let checkout = parse_date(required_str(&arguments, "checkout")?, "check-out")?;
        let guests = match &arguments["guests"] {
            serde_json::Value::Number(n) => n.as_i64().unwrap_or(1),
            serde_json::Value::String(s) => s.trim().parse().unwrap_or(1),
            _ => 1,
        }
        .max(1);

        let nights = (checkout - checkin).num_days();
        if nights <= 0 {
            return Err(CapabilityError::InvalidArguments(
                "Check-out date must be after check-in date".into(),
            ));
        }

        let mut out = format!(
            "Hotels in {location}\n{checkin} → {checkout} ({}) | {}\n{}\n\n",
            plural(nights, "night"),
            plural(guests, "guest"),
            "=".repeat(60),
        );
        for offer in offers_for(location) {
            out.push_str(&format!(
                "{}\nRating: {}.{}/10\n£{}/night | Total: £{}\nPhone: {} | {}\n{}\n\n",
                offer.name,
                offer.rating_tenths / 10,
                offer.rating_tenths % 10,
                offer.price_per_night,
                offer.price_per_night * nights,
                offer.phone,
                offer.website,
                offer.amenities.join(" | "),
            ));
        }
        out.push_str("Book directly with the hotel or through Hotels.com, Expedia or Trivago.");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(checkin: &str, checkout: &str) -> serde_json::Value {
        serde_json::json!({
            "location": "East Croydon",
            "checkin": checkin,
            "checkout": checkout,
            "guests": 2
        })
    }

    #[tokio::test]
    async fn search_lists_all_chains_with_totals() {
        let out = SearchHotels
            .execute(args("2025-12-15", "2025-12-17"))
            .await
            .unwrap();
        assert!(out.contains("Hotels in East Croydon"));
        assert!(out.contains("(2 nights) | 2 guests"));
        for chain in ["Premier Inn", "Travelodge", "Holiday Inn Express", "Ibis"] {
            assert!(out.contains(&format!("{chain} East Croydon")), "missing {chain}");
        }
        let offer = &offers_for("East Croydon")[0];
        assert!(out.contains(&format!("Total: £{}", offer.price_per_night * 2)));
    }

    #[tokio::test]
    async fn checkout_must_follow_checkin() {
        let err = SearchHotels
            .execute(args("2025-12-17", "2025-12-17"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Check-out date must be after check-in date"));
    }

    #[tokio::test]
    async fn malformed_dates_rejected() {
        let err = SearchHotels
            .execute(args("15/12/2025", "2025-12-17"))
            .await
            .unwrap_err();
        assert!(matches!(err, CapabilityError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn guests_default_to_one() {
        let out = SearchHotels
            .execute(serde_json::json!({
                "location": "Paris", "checkin": "2025-12-20", "checkout": "2025-12-21"
            }))
            .await
            .unwrap();
        assert!(out.contains("(1 night) | 1 guest\n"));
    }

    #[test]
    fn offers_are_deterministic_and_sorted() {
        let a = offers_for("Leeds");
        let b = offers_for("leeds");
        assert_eq!(
            a.iter().map(|o| o.price_per_night).collect::<Vec<_>>(),
            b.iter().map(|o| o.price_per_night).collect::<Vec<_>>()
        );
        assert!(a.windows(2).all(|w| w[0].rating_tenths >= w[1].rating_tenths));
    }
}
