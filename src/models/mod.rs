use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of characters kept from the raw post text
const ORIGINAL_MESSAGE_LIMIT: usize = 200;

/// Collection path that produced a listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Telegram,
    Whatsapp,
    Facebook,
    Browser,
    Text,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Telegram => "telegram",
            Source::Whatsapp => "whatsapp",
            Source::Facebook => "facebook",
            Source::Browser => "browser",
            Source::Text => "text",
        }
    }
}

/// One span of raw text believed to hold a single listing
#[derive(Debug, Clone)]
pub struct CandidatePost {
    pub text: String,
    pub source: Source,
    pub page_url: Option<String>,
    pub captured_at: DateTime<Utc>,
}

/// Fields pulled out of a post by an extractor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub location: Option<String>,
    pub city: Option<String>,
    pub rent: Option<u64>,
    pub bhk: Option<String>,
    pub additional_details: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl ExtractedFields {
    /// All-null field set carrying the failure cause as its details
    pub fn failed(cause: impl Into<String>) -> Self {
        Self {
            additional_details: Some(cause.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.location.is_none()
            && self.city.is_none()
            && self.rent.is_none()
            && self.bhk.is_none()
            && self.additional_details.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
    }

    /// Whether anything identifying a listing was found. Details and
    /// coordinates alone do not count.
    pub fn has_listing_fields(&self) -> bool {
        self.location.is_some() || self.city.is_some() || self.rent.is_some() || self.bhk.is_some()
    }

    /// Coordinates, only when both halves are present
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates { latitude, longitude }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Driving route from the reference point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub distance_km: f64,
    pub duration: String,
}

/// Persisted listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub id: String,
    pub date: DateTime<Utc>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub rent: Option<u64>,
    pub bhk: Option<String>,
    pub additional_details: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub distance_from_office_km: Option<f64>,
    pub driving_duration: Option<String>,
    pub source: Source,
    pub page_url: String,
    pub original_message: String,
}

impl ListingRecord {
    /// Build a record from fully resolved parts. The id is left empty for the
    /// store to assign.
    pub fn build(
        post: &CandidatePost,
        fields: ExtractedFields,
        coordinates: Option<Coordinates>,
        route: Option<Route>,
    ) -> Self {
        let (distance_from_office_km, driving_duration) = match route {
            Some(route) => (Some(route.distance_km), Some(route.duration)),
            None => (None, None),
        };

        Self {
            id: String::new(),
            date: post.captured_at,
            location: fields.location,
            city: fields.city,
            rent: fields.rent.filter(|rent| *rent > 0),
            bhk: fields.bhk,
            additional_details: fields.additional_details,
            latitude: coordinates.map(|c| c.latitude),
            longitude: coordinates.map(|c| c.longitude),
            distance_from_office_km,
            driving_duration,
            source: post.source,
            page_url: post.page_url.clone().unwrap_or_default(),
            original_message: truncate_message(&post.text),
        }
    }
}

/// Collapse whitespace and cut the text down for audit purposes
pub fn truncate_message(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > ORIGINAL_MESSAGE_LIMIT {
        let mut cut: String = collapsed.chars().take(ORIGINAL_MESSAGE_LIMIT).collect();
        cut.push_str("...");
        cut
    } else {
        collapsed
    }
}
