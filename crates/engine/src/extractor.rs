//! Slot extraction by ordered pattern rules.
//!
//! Each slot has a fixed list of rules, most specific phrasing first. The
//! first rule that matches and yields a valid value wins; later rules are
//! never consulted for that slot. Reordering a list changes behaviour, so
//! the order is exposed through [`Extractor::rule_order`] and tested.
//!
//! Date passes claim the span they matched. A looser date rule later in the
//! run skips claimed spans, which keeps "returning 16/12/2025" from also
//! being read as the outbound date.

use std::ops::Range;

use chrono::{Datelike, Days, Local, Months, NaiveDate};
use regex_lite::{Captures, Regex};
use tracing::debug;
use wayfarer_core::{Domain, Error, ParsedSlots, Slot};

use crate::classifier;
use crate::tags;

const MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
];

/// Pattern fragments substituted into rule patterns.
const MONTH: &str = r"(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)";
const DATE: &str = r"(?:\d{4}-\d{1,2}-\d{1,2}|\d{1,2}/\d{1,2}/\d{4}|\b{month}\b\.?\s+\d{1,2}(?:st|nd|rd|th)?\b(?:,?\s+\d{4}\b)?|\d{1,2}(?:st|nd|rd|th)?\s+(?:of\s+)?{month}\b(?:,?\s+\d{4}\b)?)";
const LOC: &str = r"(?P<loc>[A-Za-z][A-Za-z'&\- ]*?)";
const PLACE: &str = r"[A-Za-z][A-Za-z'&\- ]*?";
const TERM: &str = r"(?:\s+(?:on|at|for|after|before|by|and|with|in|to|from|via|departing|leaving|returning|return|today|tonight|tomorrow|next|this|please)\b|\s+{month}\b\.?\s+\d|\s+\d|\s*[,.;:!?]|\s*$)";
const COUNT: &str = r"(?P<n>\d+|one|two|three|four|five|six|seven|eight|nine|ten)";

/// Words a location candidate may not start with.
const NOT_PLACES: &[&str] = &[
    "stay", "staying", "book", "find", "get", "go", "travel", "know", "see", "check", "catch",
    "have", "be", "search", "leave", "arrive", "return", "plan", "make", "take", "today",
    "tomorrow", "tonight", "next", "this", "the", "a", "an", "me", "my", "you", "your", "it",
    "there", "here",
];

/// Words that follow "I'm" or "hello" without being a name.
const NOT_NAMES: &[&str] = &[
    "looking", "going", "travelling", "traveling", "trying", "planning", "interested", "staying",
    "leaving", "heading", "visiting", "in", "at", "from", "on", "a", "an", "the", "not", "so",
    "just", "here", "back", "free", "available", "there", "can", "could", "please", "i", "we",
    "you", "again", "everyone", "all",
];

struct Env {
    today: NaiveDate,
    hotel_context: bool,
}

type Interpret<T> = fn(&Captures<'_>, &Env) -> Option<T>;

struct Rule<T> {
    name: &'static str,
    regex: Regex,
    interpret: Interpret<T>,
}

impl<T> Rule<T> {
    fn new(name: &'static str, pattern: &str, interpret: Interpret<T>) -> Result<Self, Error> {
        // `{term}` first: it carries its own `{month}`
        let expanded = pattern
            .replace("{term}", TERM)
            .replace("{date}", DATE)
            .replace("{month}", MONTH)
            .replace("{loc}", LOC)
            .replace("{place}", PLACE)
            .replace("{count}", COUNT);
        let regex = Regex::new(&format!("(?i){expanded}")).map_err(|e| Error::Extraction {
            rule: name.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            name,
            regex,
            interpret,
        })
    }
}

struct Hit<T> {
    value: T,
    span: Range<usize>,
    rule: &'static str,
}

/// The first rule, in order, with a match outside `claimed` that
/// interprets to a value.
fn first_match<T>(
    rules: &[Rule<T>],
    text: &str,
    env: &Env,
    claimed: &[Range<usize>],
) -> Option<Hit<T>> {
    for rule in rules {
        for caps in rule.regex.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            let span = whole.start()..whole.end();
            if claimed.iter().any(|c| c.start < span.end && span.start < c.end) {
                continue;
            }
            if let Some(value) = (rule.interpret)(&caps, env) {
                return Some(Hit {
                    value,
                    span,
                    rule: rule.name,
                });
            }
        }
    }
    None
}

/// A matched date, with the end of a range when the phrase gave one.
#[derive(Debug, Clone, Copy, PartialEq)]
struct DateHit {
    start: NaiveDate,
    end: Option<NaiveDate>,
}

/// Rule-ordered slot extractor. Never fails on input; construction fails
/// only if a rule pattern does not compile.
pub struct Extractor {
    reference_date: Option<NaiveDate>,
    return_dates: Vec<Rule<DateHit>>,
    dates: Vec<Rule<DateHit>>,
    times: Vec<Rule<String>>,
    from_locations: Vec<Rule<String>>,
    to_locations: Vec<Rule<String>>,
    hotel_locations: Vec<Rule<String>>,
    guests: Vec<Rule<u32>>,
    names: Vec<Rule<String>>,
    expressions: Vec<Rule<String>>,
    arithmetic_run: Regex,
    nights: Rule<u32>,
}

impl Extractor {
    /// An extractor whose "today" is the local date at extraction time.
    pub fn new() -> Result<Self, Error> {
        Self::build(None)
    }

    /// An extractor with a fixed "today", for reproducible results.
    pub fn with_reference_date(today: NaiveDate) -> Result<Self, Error> {
        Self::build(Some(today))
    }

    fn build(reference_date: Option<NaiveDate>) -> Result<Self, Error> {
        let return_dates = vec![
            Rule::new(
                "returning_date",
                r"\b(?:returning|return|coming\s+back|back)\s+(?:on\s+)?(?:the\s+)?(?P<d>{date})",
                single_date,
            )?,
            Rule::new(
                "checkout_date",
                r"\b(?:check-?\s?out|until|till)\s+(?:on\s+)?(?:the\s+)?(?P<d>{date})",
                single_date,
            )?,
        ];

        let dates = vec![
            Rule::new(
                "date_range",
                r"(?P<a>{date})\s*(?:to|until|till|-|–)\s*(?P<b>{date})",
                date_range,
            )?,
            Rule::new(
                "month_day_range",
                r"\b(?P<m>{month})\b\.?\s+(?P<a>\d{1,2})(?:st|nd|rd|th)?\s*(?:-|–|to)\s*(?P<b>\d{1,2})(?:st|nd|rd|th)?\b",
                month_day_range,
            )?,
            Rule::new("on_date", r"\bon\s+(?:the\s+)?(?P<d>{date})", single_date)?,
            Rule::new("iso_date", r"\b(?P<d>\d{4}-\d{1,2}-\d{1,2})\b", single_date)?,
            Rule::new("dmy_date", r"\b(?P<d>\d{1,2}/\d{1,2}/\d{4})\b", single_date)?,
            Rule::new(
                "month_day",
                r"\b(?P<d>{month}\b\.?\s+\d{1,2}(?:st|nd|rd|th)?\b(?:,?\s+\d{4}\b)?)",
                single_date,
            )?,
            Rule::new(
                "day_month",
                r"\b(?P<d>\d{1,2}(?:st|nd|rd|th)?\s+(?:of\s+)?{month}\b(?:,?\s+\d{4}\b)?)",
                single_date,
            )?,
            Rule::new(
                "relative_date",
                r"\b(?P<w>today|tonight|tomorrow|next\s+week)\b",
                relative_date,
            )?,
        ];

        let times = vec![
            Rule::new(
                "clock_ampm",
                r"\b(?P<h>\d{1,2}):(?P<m>\d{2})\s*(?P<p>am|pm)\b",
                twelve_hour,
            )?,
            Rule::new("hour_ampm", r"\b(?P<h>\d{1,2})\s*(?P<p>am|pm)\b", twelve_hour)?,
            Rule::new("clock_24h", r"\b(?P<h>\d{1,2}):(?P<m>\d{2})\b", twenty_four_hour)?,
        ];

        let from_locations = vec![
            Rule::new("from_at_time", r"\bfrom\s+{loc}\s+at\s+\d", location)?,
            Rule::new("from_to", r"\bfrom\s+{loc}\s+to\b", location)?,
            Rule::new("from_for", r"\bfrom\s+{loc}\s+for\b", location)?,
            Rule::new("between_and", r"\bbetween\s+{loc}\s+and\b", location)?,
            Rule::new("from_terminated", r"\bfrom\s+{loc}{term}", location)?,
            Rule::new(
                "stations_in",
                r"\bstations?\s+(?:in|near|for|at|around)\s+{loc}{term}",
                location,
            )?,
        ];

        let to_locations = vec![
            Rule::new("from_to", r"\bfrom\s+{place}\s+to\s+{loc}{term}", location)?,
            Rule::new("from_for", r"\bfrom\s+{place}\s+for\s+{loc}{term}", location)?,
            Rule::new("between_and", r"\bbetween\s+{place}\s+and\s+{loc}{term}", location)?,
            Rule::new("trains_to", r"\btrains?\s+(?:to|for)\s+{loc}{term}", location)?,
            Rule::new("to", r"\bto\s+{loc}{term}", location)?,
        ];

        let hotel_locations = vec![
            Rule::new(
                "stay_at_brand_in",
                r"\bstay(?:ing)?\s+at\s+(?:the\s+|a\s+)?{place}\s+in\s+{loc}{term}",
                location,
            )?,
            Rule::new(
                "brand_in",
                r"\b(?:travelodge|premier\s+inn|holiday\s+inn(?:\s+express)?|ibis)\s+in\s+{loc}{term}",
                location,
            )?,
            Rule::new(
                "hotel_in",
                r"\b(?:hotels?|accommodation|rooms?|stay(?:ing)?|lodging)\s+(?:in|at|near|around)\s+{loc}{term}",
                location,
            )?,
            Rule::new("in_with_hotel_keyword", r"\bin\s+{loc}{term}", location_in_hotel_context)?,
        ];

        let guests = vec![
            Rule::new(
                "for_n_guests",
                r"\bfor\s+{count}\s+(?:guests?|people|persons?|adults?|travell?ers?)\b",
                count,
            )?,
            Rule::new(
                "n_guests",
                r"\b{count}\s+(?:guests?|people|persons?|adults?|travell?ers?)\b",
                count,
            )?,
        ];

        let names = vec![
            Rule::new("my_name_is", r"\bmy\s+name\s+is\s+(?P<n>[A-Za-z][A-Za-z'\-]*)", name)?,
            Rule::new("call_me", r"\bcall\s+me\s+(?P<n>[A-Za-z][A-Za-z'\-]*)", name)?,
            Rule::new("i_am", r"\bi(?:'m|\s+am)\s+(?P<n>[A-Za-z][A-Za-z'\-]*)", name)?,
            Rule::new("greet", r"\bgreet\s+(?P<n>[A-Za-z][A-Za-z'\-]*)", name)?,
            Rule::new(
                "hello",
                r"\b(?:hello|hi|hey)\s+(?:there\s+)?(?P<n>[A-Za-z][A-Za-z'\-]*)",
                name,
            )?,
        ];

        let expressions = vec![Rule::new(
            "calculate",
            r"\b(?:calculate|compute|evaluate|what\s+is|what's)\s+(?P<e>[-+*/().\d\s]*\d[-+*/().\d\s]*)",
            expression,
        )?];

        let arithmetic_run = Regex::new(r"[-+*/().\d\s]+").map_err(|e| Error::Extraction {
            rule: "arithmetic_run".into(),
            reason: e.to_string(),
        })?;

        let nights = Rule::new("n_nights", r"\b{count}\s+nights?\b", count)?;

        Ok(Self {
            reference_date,
            return_dates,
            dates,
            times,
            from_locations,
            to_locations,
            hotel_locations,
            guests,
            names,
            expressions,
            arithmetic_run,
            nights,
        })
    }

    /// The date "today" resolves to.
    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Local::now().date_naive())
    }

    /// Rule names for a slot, in the order they are tried.
    pub fn rule_order(&self, slot: Slot) -> Vec<&'static str> {
        fn names<T>(rules: &[Rule<T>]) -> Vec<&'static str> {
            rules.iter().map(|r| r.name).collect()
        }
        match slot {
            Slot::ReturnDate => names(&self.return_dates),
            Slot::Date => names(&self.dates),
            Slot::Time => names(&self.times),
            Slot::FromLocation => names(&self.from_locations),
            Slot::ToLocation => names(&self.to_locations),
            Slot::HotelLocation => names(&self.hotel_locations),
            Slot::Guests => names(&self.guests),
            Slot::Name => names(&self.names),
            Slot::Expression => {
                let mut order = names(&self.expressions);
                order.push("arithmetic_run");
                order
            }
        }
    }

    /// Extract every slot the text supports. Slots that nothing matched are
    /// absent, except `guests`, which defaults to 1.
    pub fn extract(&self, text: &str) -> ParsedSlots {
        let words = tags::words(text);
        let env = Env {
            today: self.reference_date(),
            hotel_context: classifier::mentions(&words, Domain::Hotel),
        };
        let mut slots = ParsedSlots::new();
        let mut claimed: Vec<Range<usize>> = Vec::new();

        if let Some(hit) = first_match(&self.return_dates, text, &env, &claimed) {
            debug!(slot = "return_date", rule = hit.rule, "Slot matched");
            slots.insert(Slot::ReturnDate, iso(hit.value.start));
            claimed.push(hit.span);
        }

        if let Some(hit) = first_match(&self.dates, text, &env, &claimed) {
            debug!(slot = "date", rule = hit.rule, "Slot matched");
            slots.insert(Slot::Date, iso(hit.value.start));
            if let Some(end) = hit.value.end {
                if !slots.contains(Slot::ReturnDate) {
                    slots.insert(Slot::ReturnDate, iso(end));
                }
            }
            claimed.push(hit.span);
        }

        if let Some(hit) = first_match(&self.times, text, &env, &claimed) {
            debug!(slot = "time", rule = hit.rule, "Slot matched");
            slots.insert(Slot::Time, hit.value);
            claimed.push(hit.span);
        }

        let passes: [(Slot, &[Rule<String>]); 4] = [
            (Slot::FromLocation, self.from_locations.as_slice()),
            (Slot::ToLocation, self.to_locations.as_slice()),
            (Slot::HotelLocation, self.hotel_locations.as_slice()),
            (Slot::Name, self.names.as_slice()),
        ];
        for (slot, rules) in passes {
            if let Some(hit) = first_match(rules, text, &env, &[]) {
                debug!(slot = %slot, rule = hit.rule, "Slot matched");
                slots.insert(slot, hit.value);
            }
        }

        match first_match(&self.guests, text, &env, &[]) {
            Some(hit) => slots.insert(Slot::Guests, hit.value.to_string()),
            None => slots.insert_default(Slot::Guests, "1"),
        }

        let expression = first_match(&self.expressions, text, &env, &[])
            .map(|hit| hit.value)
            .or_else(|| self.longest_arithmetic_run(text, &claimed));
        if let Some(expression) = expression {
            slots.insert(Slot::Expression, expression);
        }

        self.derive_return_from_nights(text, &env, &mut slots);
        slots
    }

    fn longest_arithmetic_run(&self, text: &str, claimed: &[Range<usize>]) -> Option<String> {
        self.arithmetic_run
            .find_iter(text)
            .filter(|m| !claimed.iter().any(|c| c.start < m.end() && m.start() < c.end))
            .map(|m| m.as_str().trim())
            .filter(|run| looks_arithmetic(run))
            .max_by_key(|run| run.len())
            .map(str::to_string)
    }

    /// "for 3 nights" with a start date and no end date.
    fn derive_return_from_nights(&self, text: &str, env: &Env, slots: &mut ParsedSlots) {
        if slots.contains(Slot::ReturnDate) {
            return;
        }
        let Some(start) = slots.value(Slot::Date).and_then(parse_iso) else {
            return;
        };
        let Some(hit) = first_match(std::slice::from_ref(&self.nights), text, env, &[]) else {
            return;
        };
        if let Some(end) = start.checked_add_days(Days::new(u64::from(hit.value))) {
            slots.insert(Slot::ReturnDate, iso(end));
        }
    }
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_iso(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

fn month_number(word: &str) -> Option<u32> {
    let word = word.to_ascii_lowercase();
    if word.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| m.starts_with(word.as_str()))
        .map(|i| i as u32 + 1)
}

/// Month and day this year, or next year if that day has passed.
fn upcoming(today: NaiveDate, month: u32, day: u32) -> Option<NaiveDate> {
    let this_year = NaiveDate::from_ymd_opt(today.year(), month, day)?;
    if this_year < today {
        NaiveDate::from_ymd_opt(today.year() + 1, month, day)
    } else {
        Some(this_year)
    }
}

/// Parse one date phrase matched by the `{date}` fragment.
fn parse_date_phrase(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let text = text.trim();
    let numeric = |sep: char| -> Option<Vec<u32>> {
        let parts: Vec<u32> = text.split(sep).map(|p| p.parse().ok()).collect::<Option<_>>()?;
        (parts.len() == 3).then_some(parts)
    };
    if let Some(p) = numeric('-') {
        return NaiveDate::from_ymd_opt(p[0] as i32, p[1], p[2]);
    }
    if let Some(p) = numeric('/') {
        return NaiveDate::from_ymd_opt(p[2] as i32, p[1], p[0]);
    }

    let (mut month, mut day, mut year) = (None, None, None);
    for word in text.split(|c: char| !c.is_ascii_alphanumeric()).filter(|w| !w.is_empty()) {
        if let Some(m) = month_number(word) {
            month = Some(m);
            continue;
        }
        let digits = word.trim_end_matches(|c: char| c.is_ascii_alphabetic());
        if let Ok(n) = digits.parse::<u32>() {
            if digits.len() == 4 {
                year = Some(n as i32);
            } else {
                day = Some(n);
            }
        }
    }
    let (month, day) = (month?, day?);
    match year {
        Some(year) => NaiveDate::from_ymd_opt(year, month, day),
        None => upcoming(today, month, day),
    }
}

/// The end of a day range; a smaller end day rolls into the next month.
fn range_end(start: NaiveDate, end_day: u32) -> Option<NaiveDate> {
    if end_day >= start.day() {
        start.with_day(end_day)
    } else {
        start
            .with_day(1)?
            .checked_add_months(Months::new(1))?
            .with_day(end_day)
    }
}

fn single_date(caps: &Captures<'_>, env: &Env) -> Option<DateHit> {
    let start = parse_date_phrase(caps.name("d")?.as_str(), env.today)?;
    Some(DateHit { start, end: None })
}

fn date_range(caps: &Captures<'_>, env: &Env) -> Option<DateHit> {
    let start = parse_date_phrase(caps.name("a")?.as_str(), env.today)?;
    let mut end = parse_date_phrase(caps.name("b")?.as_str(), env.today)?;
    // "December 30 to January 2" with no year: the end belongs after the start
    if end < start && end.year() == start.year() {
        end = end.with_year(start.year() + 1)?;
    }
    (end > start).then_some(DateHit {
        start,
        end: Some(end),
    })
}

fn month_day_range(caps: &Captures<'_>, env: &Env) -> Option<DateHit> {
    let month = month_number(caps.name("m")?.as_str())?;
    let first: u32 = caps.name("a")?.as_str().parse().ok()?;
    let last: u32 = caps.name("b")?.as_str().parse().ok()?;
    let start = upcoming(env.today, month, first)?;
    let end = range_end(start, last)?;
    (end > start).then_some(DateHit {
        start,
        end: Some(end),
    })
}

fn relative_date(caps: &Captures<'_>, env: &Env) -> Option<DateHit> {
    let word = caps.name("w")?.as_str().to_ascii_lowercase();
    let offset = match word.split_whitespace().collect::<Vec<_>>().as_slice() {
        ["today"] | ["tonight"] => 0,
        ["tomorrow"] => 1,
        ["next", "week"] => 7,
        _ => return None,
    };
    let start = env.today.checked_add_days(Days::new(offset))?;
    Some(DateHit { start, end: None })
}

fn twelve_hour(caps: &Captures<'_>, _env: &Env) -> Option<String> {
    let hour: u32 = caps.name("h")?.as_str().parse().ok()?;
    let minute: u32 = match caps.name("m") {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    if !(1..=12).contains(&hour) || minute > 59 {
        return None;
    }
    let pm = caps.name("p")?.as_str().eq_ignore_ascii_case("pm");
    let hour = match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    };
    Some(format!("{hour:02}:{minute:02}"))
}

fn twenty_four_hour(caps: &Captures<'_>, _env: &Env) -> Option<String> {
    let hour: u32 = caps.name("h")?.as_str().parse().ok()?;
    let minute: u32 = caps.name("m")?.as_str().parse().ok()?;
    (hour <= 23 && minute <= 59).then(|| format!("{hour:02}:{minute:02}"))
}

fn location(caps: &Captures<'_>, _env: &Env) -> Option<String> {
    clean_location(caps.name("loc")?.as_str())
}

fn location_in_hotel_context(caps: &Captures<'_>, env: &Env) -> Option<String> {
    if !env.hotel_context {
        return None;
    }
    location(caps, env)
}

fn count(caps: &Captures<'_>, _env: &Env) -> Option<u32> {
    let raw = caps.name("n")?.as_str().to_ascii_lowercase();
    let n = match raw.as_str() {
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        digits => digits.parse().ok()?,
    };
    (n > 0).then_some(n)
}

fn name(caps: &Captures<'_>, _env: &Env) -> Option<String> {
    let raw = caps.name("n")?.as_str().trim_end_matches(['\'', '-']);
    let lower = raw.to_ascii_lowercase();
    if raw.is_empty() || NOT_NAMES.contains(&lower.as_str()) {
        return None;
    }
    Some(title_case(raw))
}

fn expression(caps: &Captures<'_>, _env: &Env) -> Option<String> {
    let text = caps.name("e")?.as_str().trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// A run with a digit and an operator between two operands.
fn looks_arithmetic(run: &str) -> bool {
    let has_digit = run.chars().any(|c| c.is_ascii_digit());
    let inner = run.trim_matches(|c: char| matches!(c, '+' | '-' | '*' | '/'));
    let has_operator = inner.chars().any(|c| matches!(c, '+' | '-' | '*' | '/'));
    has_digit && has_operator
}

/// Collapse whitespace, trim trailing punctuation, title-case, and reject
/// candidates that are really verbs, dates or pronouns.
fn clean_location(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed
        .trim_end_matches(|c: char| matches!(c, '.' | ',' | ';' | ':' | '!' | '?' | '-' | '\''))
        .trim();
    let first = trimmed.split(' ').next()?.to_ascii_lowercase();
    if trimmed.is_empty() || NOT_PLACES.contains(&first.as_str()) || month_number(&first).is_some()
    {
        return None;
    }
    Some(title_case(trimmed))
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
