pub mod google;
pub mod traits;

pub use google::GoogleMaps;
pub use traits::GeoService;

use crate::config::Settings;
use crate::models::{Coordinates, ExtractedFields, Route};
use tracing::{debug, warn};

/// Resolved coordinates and route for one post
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enrichment {
    pub coordinates: Option<Coordinates>,
    pub route: Option<Route>,
}

/// Best-effort geocoding and distance lookup. Never fails.
pub struct GeoEnricher {
    service: Option<Box<dyn GeoService>>,
    reference_point: Option<Coordinates>,
    compute_distance: bool,
}

impl GeoEnricher {
    pub fn new(
        service: Option<Box<dyn GeoService>>,
        reference_point: Option<Coordinates>,
        compute_distance: bool,
    ) -> Self {
        Self {
            service,
            reference_point,
            compute_distance,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let service = settings.maps_api_key.as_ref().and_then(|key| {
            match GoogleMaps::new(
                key.clone(),
                settings.maps_api_url.clone(),
                settings.request_timeout,
            ) {
                Ok(maps) => Some(Box::new(maps) as Box<dyn GeoService>),
                Err(e) => {
                    warn!("Mapping disabled: {}", e);
                    None
                }
            }
        });

        Self::new(service, settings.reference_point, settings.compute_distance)
    }

    pub async fn enrich(&self, fields: &ExtractedFields) -> Enrichment {
        let coordinates = match fields.coordinates() {
            Some(coords) => Some(coords),
            None => self.geocode(fields).await,
        };

        let route = match coordinates {
            Some(destination) => self.route_to(destination).await,
            None => None,
        };

        Enrichment { coordinates, route }
    }

    async fn geocode(&self, fields: &ExtractedFields) -> Option<Coordinates> {
        let service = self.service.as_ref()?;
        let address = geocode_address(fields.location.as_deref(), fields.city.as_deref())?;

        match service.geocode(&address).await {
            Ok(coords) => {
                debug!("Geocoded '{}' to {},{}", address, coords.latitude, coords.longitude);
                Some(coords)
            }
            Err(e) => {
                warn!("Geocoding failed for '{}': {}", address, e);
                None
            }
        }
    }

    async fn route_to(&self, destination: Coordinates) -> Option<Route> {
        if !self.compute_distance {
            return None;
        }
        let service = self.service.as_ref()?;
        let origin = self.reference_point?;

        match service.route(origin, destination).await {
            Ok(route) => Some(route),
            Err(e) => {
                warn!("Distance calculation failed: {}", e);
                None
            }
        }
    }
}

/// Comma-join location and city, skipping nulls and a city the location
/// already names
pub fn geocode_address(location: Option<&str>, city: Option<&str>) -> Option<String> {
    let location = location.map(str::trim).filter(|s| !s.is_empty());
    let city = city.map(str::trim).filter(|s| !s.is_empty());

    match (location, city) {
        (Some(location), Some(city)) if location.to_lowercase().contains(&city.to_lowercase()) => {
            Some(location.to_string())
        }
        (Some(location), Some(city)) => Some(format!("{}, {}", location, city)),
        (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
        (None, None) => None,
    }
}
