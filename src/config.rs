use crate::error::SettingsError;
use crate::models::Coordinates;
use std::env;
use std::time::Duration;

pub const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4.1";
pub const DEFAULT_MAPS_API_URL: &str = "https://maps.googleapis.com/maps/api";
const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Run-wide extraction settings, loaded once and read-only afterwards
#[derive(Debug, Clone)]
pub struct Settings {
    pub openai_api_key: Option<String>,
    pub openai_api_url: String,
    pub openai_model: String,
    pub maps_api_key: Option<String>,
    pub maps_api_url: String,
    pub reference_point: Option<Coordinates>,
    pub compute_distance: bool,
    pub rentals_only: bool,
    pub skip_restricted: bool,
    pub request_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_api_url: DEFAULT_OPENAI_API_URL.to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            maps_api_key: None,
            maps_api_url: DEFAULT_MAPS_API_URL.to_string(),
            reference_point: None,
            compute_distance: true,
            rentals_only: false,
            skip_restricted: false,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Settings {
    /// Load settings from the process environment (and `.env` if present)
    pub fn from_env() -> Result<Self, SettingsError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).and_then(present);
        let defaults = Self::default();

        let latitude = parse_coordinate(&get, "OFFICE_LATITUDE", 90.0)?;
        let longitude = parse_coordinate(&get, "OFFICE_LONGITUDE", 180.0)?;
        let reference_point = match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates { latitude, longitude }),
            (None, None) => None,
            _ => return Err(SettingsError::PartialReferencePoint),
        };

        let request_timeout = match get("REQUEST_TIMEOUT_SECS") {
            Some(value) => {
                let secs: u64 = value.trim().parse().map_err(|_| SettingsError::InvalidNumber {
                    key: "REQUEST_TIMEOUT_SECS",
                    value: value.clone(),
                })?;
                if secs == 0 {
                    return Err(SettingsError::OutOfRange {
                        key: "REQUEST_TIMEOUT_SECS",
                        value: 0.0,
                    });
                }
                Duration::from_secs(secs)
            }
            None => defaults.request_timeout,
        };

        Ok(Self {
            openai_api_key: get("OPENAI_API_KEY"),
            openai_api_url: get("OPENAI_API_URL").unwrap_or(defaults.openai_api_url),
            openai_model: get("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            maps_api_key: get("GOOGLE_MAPS_API_KEY"),
            maps_api_url: get("MAPS_API_URL").unwrap_or(defaults.maps_api_url),
            reference_point,
            compute_distance: parse_bool(&get, "COMPUTE_DISTANCE")?
                .unwrap_or(defaults.compute_distance),
            rentals_only: parse_bool(&get, "RENTALS_ONLY")?.unwrap_or(defaults.rentals_only),
            skip_restricted: parse_bool(&get, "SKIP_RESTRICTED")?
                .unwrap_or(defaults.skip_restricted),
            request_timeout,
        })
    }

    /// Whether driving distance can actually be computed
    pub fn distance_enabled(&self) -> bool {
        self.compute_distance && self.maps_api_key.is_some() && self.reference_point.is_some()
    }
}

/// Treat blanks and template placeholders as unset
fn present(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || (trimmed.starts_with("your_") && trimmed.ends_with("_here")) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_coordinate<G>(get: &G, key: &'static str, limit: f64) -> Result<Option<f64>, SettingsError>
where
    G: Fn(&str) -> Option<String>,
{
    let Some(value) = get(key) else {
        return Ok(None);
    };
    let parsed: f64 = value
        .parse()
        .map_err(|_| SettingsError::InvalidNumber { key, value: value.clone() })?;
    if !parsed.is_finite() || parsed.abs() > limit {
        return Err(SettingsError::OutOfRange { key, value: parsed });
    }
    Ok(Some(parsed))
}

fn parse_bool<G>(get: &G, key: &'static str) -> Result<Option<bool>, SettingsError>
where
    G: Fn(&str) -> Option<String>,
{
    let Some(value) = get(key) else {
        return Ok(None);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(SettingsError::InvalidBool { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings, SettingsError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_empty_environment_disables_everything() {
        let s = settings(&[]).unwrap();
        assert!(s.openai_api_key.is_none());
        assert!(s.maps_api_key.is_none());
        assert!(s.reference_point.is_none());
        assert!(!s.distance_enabled());
        assert_eq!(s.openai_model, DEFAULT_OPENAI_MODEL);
        assert_eq!(s.request_timeout, Duration::from_secs(20));
    }

    #[test]
    fn test_placeholders_count_as_absent() {
        let s = settings(&[
            ("OPENAI_API_KEY", "your_openai_api_key_here"),
            ("GOOGLE_MAPS_API_KEY", "  "),
        ])
        .unwrap();
        assert!(s.openai_api_key.is_none());
        assert!(s.maps_api_key.is_none());
    }

    #[test]
    fn test_full_configuration() {
        let s = settings(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MODEL", "gpt-4o"),
            ("GOOGLE_MAPS_API_KEY", "maps-key"),
            ("OFFICE_LATITUDE", "12.9716"),
            ("OFFICE_LONGITUDE", "77.5946"),
            ("COMPUTE_DISTANCE", "yes"),
            ("REQUEST_TIMEOUT_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(s.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(s.openai_model, "gpt-4o");
        assert_eq!(
            s.reference_point,
            Some(Coordinates { latitude: 12.9716, longitude: 77.5946 })
        );
        assert!(s.distance_enabled());
        assert_eq!(s.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_distance_toggle_off() {
        let s = settings(&[
            ("GOOGLE_MAPS_API_KEY", "maps-key"),
            ("OFFICE_LATITUDE", "12.9716"),
            ("OFFICE_LONGITUDE", "77.5946"),
            ("COMPUTE_DISTANCE", "false"),
        ])
        .unwrap();
        assert!(!s.distance_enabled());
    }

    #[test]
    fn test_unparsable_values_are_fatal() {
        assert!(matches!(
            settings(&[("OFFICE_LATITUDE", "north"), ("OFFICE_LONGITUDE", "77.0")]),
            Err(SettingsError::InvalidNumber { key: "OFFICE_LATITUDE", .. })
        ));
        assert!(matches!(
            settings(&[("COMPUTE_DISTANCE", "maybe")]),
            Err(SettingsError::InvalidBool { .. })
        ));
        assert!(matches!(
            settings(&[("OFFICE_LATITUDE", "95"), ("OFFICE_LONGITUDE", "77.0")]),
            Err(SettingsError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        assert!(matches!(
            settings(&[("REQUEST_TIMEOUT_SECS", "0")]),
            Err(SettingsError::OutOfRange { key: "REQUEST_TIMEOUT_SECS", .. })
        ));
        assert!(matches!(
            settings(&[("REQUEST_TIMEOUT_SECS", "soon")]),
            Err(SettingsError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_screening_switches() {
        let s = settings(&[("RENTALS_ONLY", "on"), ("SKIP_RESTRICTED", "1")]).unwrap();
        assert!(s.rentals_only);
        assert!(s.skip_restricted);
        assert!(!settings(&[]).unwrap().skip_restricted);
    }

    #[test]
    fn test_partial_reference_point_is_fatal() {
        let result = settings(&[("OFFICE_LATITUDE", "28.7041")]);
        assert!(matches!(result, Err(SettingsError::PartialReferencePoint)));
    }
}
