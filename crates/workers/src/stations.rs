//! UK station-code table shared by the live trains worker.

/// Lower-cased station or city name → 3-letter code.
const CODES: &[(&str, &str)] = &[
    ("london", "KGX"),
    ("london kings cross", "KGX"),
    ("london king's cross", "KGX"),
    ("kings cross", "KGX"),
    ("king's cross", "KGX"),
    ("london paddington", "PAD"),
    ("paddington", "PAD"),
    ("london victoria", "VIC"),
    ("victoria", "VIC"),
    ("london waterloo", "WAT"),
    ("waterloo", "WAT"),
    ("london euston", "EUS"),
    ("euston", "EUS"),
    ("london liverpool street", "LST"),
    ("liverpool street", "LST"),
    ("london bridge", "LBG"),
    ("east croydon", "ECR"),
    ("croydon", "ECR"),
    ("gatwick", "GTW"),
    ("gatwick airport", "GTW"),
    ("manchester", "MAN"),
    ("manchester piccadilly", "MAN"),
    ("birmingham", "BHM"),
    ("birmingham new street", "BHM"),
    ("edinburgh", "EDB"),
    ("edinburgh waverley", "EDB"),
    ("glasgow", "GLC"),
    ("glasgow central", "GLC"),
    ("liverpool", "LIV"),
    ("liverpool lime street", "LIV"),
    ("leeds", "LDS"),
    ("bristol", "BRI"),
    ("bristol temple meads", "BRI"),
    ("cardiff", "CDF"),
    ("cardiff central", "CDF"),
    ("newcastle", "NCL"),
    ("newcastle central", "NCL"),
    ("sheffield", "SHF"),
    ("nottingham", "NOT"),
    ("oxford", "OXF"),
    ("cambridge", "CBG"),
    ("brighton", "BTN"),
    ("portsmouth", "PMS"),
    ("southampton", "SOU"),
    ("york", "YRK"),
    ("bath", "BTH"),
    ("exeter", "EXD"),
    ("plymouth", "PLY"),
    ("reading", "RDG"),
    ("coventry", "COV"),
    ("derby", "DBY"),
    ("leicester", "LEI"),
    ("peterborough", "PBO"),
    ("doncaster", "DON"),
    ("wakefield", "WKF"),
];

/// Display names for station search, with their codes.
const STATIONS: &[(&str, &str)] = &[
    ("London King's Cross", "KGX"),
    ("London Paddington", "PAD"),
    ("London Victoria", "VIC"),
    ("London Waterloo", "WAT"),
    ("London Euston", "EUS"),
    ("London Liverpool Street", "LST"),
    ("London Bridge", "LBG"),
    ("East Croydon", "ECR"),
    ("Gatwick Airport", "GTW"),
    ("Manchester Piccadilly", "MAN"),
    ("Birmingham New Street", "BHM"),
    ("Edinburgh Waverley", "EDB"),
    ("Glasgow Central", "GLC"),
    ("Liverpool Lime Street", "LIV"),
    ("Leeds", "LDS"),
    ("York", "YRK"),
    ("Bristol Temple Meads", "BRI"),
    ("Cardiff Central", "CDF"),
    ("Newcastle Central", "NCL"),
    ("Sheffield", "SHF"),
    ("Nottingham", "NOT"),
    ("Oxford", "OXF"),
    ("Cambridge", "CBG"),
    ("Brighton", "BTN"),
    ("Portsmouth & Southsea", "PMS"),
    ("Southampton Central", "SOU"),
];

/// The code for a station name. Unknown names fall back to their first
/// three letters, upper-cased; something that already looks like a code
/// is returned as is.
pub fn station_code(name: &str) -> String {
    let key = name.trim().to_lowercase();
    if let Some((_, code)) = CODES.iter().find(|(n, _)| *n == key) {
        return (*code).to_string();
    }
    key.chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(3)
        .collect::<String>()
        .to_uppercase()
}

/// The display name for a code, if it is one of ours.
pub fn station_name(code: &str) -> Option<&'static str> {
    let code = code.trim().to_uppercase();
    STATIONS.iter().find(|(_, c)| *c == code).map(|(n, _)| *n)
}

/// Stations whose display name contains the term, case-insensitively.
pub fn matching_stations(term: &str) -> Vec<(&'static str, &'static str)> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return Vec::new();
    }
    STATIONS
        .iter()
        .filter(|(name, _)| name.to_lowercase().contains(&term))
        .copied()
        .collect()
}
