use crate::error::ExtractionFailure;
use crate::extractors::traits::FieldExtractor;
use crate::models::ExtractedFields;
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

/// Cities recognised by the heuristic extractor
pub const KNOWN_CITIES: &[&str] = &[
    "Bangalore",
    "Bengaluru",
    "Mumbai",
    "Navi Mumbai",
    "Thane",
    "Delhi",
    "New Delhi",
    "Gurgaon",
    "Gurugram",
    "Noida",
    "Ghaziabad",
    "Faridabad",
    "Pune",
    "Hyderabad",
    "Chennai",
    "Kolkata",
    "Ahmedabad",
    "Jaipur",
    "Chandigarh",
    "Lucknow",
    "Indore",
    "Kochi",
];

const RENTAL_PHRASES: &[&str] = &[
    "rent",
    "for rent",
    "room for rent",
    "flat for rent",
    "apartment for rent",
    "house for rent",
    "flatmate",
    "lease",
];

static RE_RESTRICTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:(?:girls?|females?|ladies|women|famil(?:y|ies))\s+only|only\s+(?:for\s+)?(?:girls?|females?|ladies|women|famil(?:y|ies)))\b",
    )
    .unwrap()
});
static RE_RENT_CURRENCY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:₹|\brs\.?|\binr)\s*(\d{1,3}(?:,\d{2,3})+|\d{4,7})").unwrap()
});
static RE_RENT_SHORTHAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,3}(?:\.\d{1,2})?)\s*k\b").unwrap());
static RE_RENT_BARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,3}(?:,\d{2,3})+|\d{4,7})\b").unwrap());
static RE_BHK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d)\s*(bhk|rk|bk)\b").unwrap());
static RE_RENTAL_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b\d?\s*(?:bhk|rk|pg)\b").unwrap());
static RE_STUDIO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bstudio\b").unwrap());
static RE_LOCATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:at|in|near)\s+([^,.;:!?()\n]+)").unwrap());
static RE_CITY: LazyLock<Regex> = LazyLock::new(|| {
    let mut names: Vec<&str> = KNOWN_CITIES.to_vec();
    // longer names first so "New Delhi" wins over "Delhi" at the same offset
    names.sort_by_key(|name| std::cmp::Reverse(name.len()));
    let alternation = names
        .iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b({alternation})\b")).unwrap()
});

/// Deterministic regex extractor, always available
#[derive(Debug, Default, Clone)]
pub struct RegexExtractor;

impl RegexExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Run every heuristic. Fields that do not match stay null.
    pub fn extract_fields(&self, text: &str) -> ExtractedFields {
        ExtractedFields {
            location: parse_location(text),
            city: parse_city(text),
            rent: parse_rent(text),
            bhk: parse_bhk(text),
            additional_details: None,
            latitude: None,
            longitude: None,
        }
    }
}

#[async_trait]
impl FieldExtractor for RegexExtractor {
    async fn extract(&self, text: &str) -> Result<ExtractedFields, ExtractionFailure> {
        let fields = self.extract_fields(text);
        if fields.is_empty() {
            Err(ExtractionFailure::NothingRecognised)
        } else {
            Ok(fields)
        }
    }

    fn name(&self) -> &'static str {
        "regex"
    }
}

/// Monthly rent from a currency amount, a bare number, or a "25k" shorthand.
/// The amount appearing first in the text wins.
pub fn parse_rent(text: &str) -> Option<u64> {
    [
        first_amount(&RE_RENT_CURRENCY, text, parse_amount),
        first_amount(&RE_RENT_BARE, text, parse_amount),
        first_amount(&RE_RENT_SHORTHAND, text, parse_thousands),
    ]
    .into_iter()
    .flatten()
    .min_by_key(|(start, _)| *start)
    .map(|(_, rent)| rent)
}

fn first_amount(
    pattern: &Regex,
    text: &str,
    parse: fn(&str) -> Option<u64>,
) -> Option<(usize, u64)> {
    pattern.captures_iter(text).find_map(|caps| {
        let start = caps.get(0)?.start();
        parse(&caps[1]).map(|rent| (start, rent))
    })
}

fn parse_amount(raw: &str) -> Option<u64> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if !(4..=7).contains(&digits.len()) {
        return None;
    }
    digits.parse().ok().filter(|rent| *rent > 0)
}

fn parse_thousands(raw: &str) -> Option<u64> {
    let thousands: f64 = raw.parse().ok()?;
    let rent = (thousands * 1000.0).round() as u64;
    (rent > 0).then_some(rent)
}

/// Room-count code such as "2BHK", "1RK" or "STUDIO"
pub fn parse_bhk(text: &str) -> Option<String> {
    if let Some(caps) = RE_BHK.captures(text) {
        return Some(format!("{}{}", &caps[1], &caps[2]).to_uppercase());
    }
    RE_STUDIO.is_match(text).then(|| "STUDIO".to_string())
}

/// Text after "at", "in" or "near" up to the next punctuation or line break
pub fn parse_location(text: &str) -> Option<String> {
    RE_LOCATION
        .captures_iter(text)
        .map(|caps| caps[1].trim().to_string())
        .find(|location| !location.is_empty())
}

/// Earliest known city named in the text, in canonical casing
pub fn parse_city(text: &str) -> Option<String> {
    let found = RE_CITY.find(text)?;
    KNOWN_CITIES
        .iter()
        .find(|city| city.eq_ignore_ascii_case(found.as_str()))
        .map(|city| city.to_string())
}

/// Keyword check for whether a post is about renting property
pub fn looks_like_rental(text: &str) -> bool {
    let lower = text.to_lowercase();
    RENTAL_PHRASES.iter().any(|phrase| lower.contains(phrase)) || RE_RENTAL_WORD.is_match(text)
}

/// Keyword check for listings open only to female or family tenants
pub fn looks_restricted(text: &str) -> bool {
    RE_RESTRICTED.is_match(text)
}
