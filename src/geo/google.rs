use crate::error::EnrichmentFailure;
use crate::geo::traits::GeoService;
use crate::models::{Coordinates, Route};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
    status: String,
}

#[derive(Debug, Deserialize)]
struct ValueText {
    value: f64,
    text: String,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    distance: Option<ValueText>,
    duration: Option<ValueText>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    #[serde(default)]
    rows: Vec<MatrixRow>,
    status: String,
}

/// Google Maps Geocoding and Distance Matrix client
#[derive(Debug)]
pub struct GoogleMaps {
    api_key: String,
    base_url: String,
    client: Client,
}

impl GoogleMaps {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self, EnrichmentFailure> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl GeoService for GoogleMaps {
    async fn geocode(&self, address: &str) -> Result<Coordinates, EnrichmentFailure> {
        debug!("Geocoding '{}'", address);

        let response = self
            .client
            .get(self.endpoint("geocode/json"))
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EnrichmentFailure::Status {
                service: "geocoding",
                status: response.status().as_u16(),
            });
        }

        let body: GeocodeResponse = response.json().await?;
        coordinates_from(body, address)
    }

    async fn route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<Route, EnrichmentFailure> {
        let origins = format!("{},{}", origin.latitude, origin.longitude);
        let destinations = format!("{},{}", destination.latitude, destination.longitude);
        debug!("Routing {} -> {}", origins, destinations);

        let response = self
            .client
            .get(self.endpoint("distancematrix/json"))
            .query(&[
                ("origins", origins.as_str()),
                ("destinations", destinations.as_str()),
                ("mode", "driving"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EnrichmentFailure::Status {
                service: "distance matrix",
                status: response.status().as_u16(),
            });
        }

        let body: MatrixResponse = response.json().await?;
        route_from(body)
    }
}

fn coordinates_from(body: GeocodeResponse, address: &str) -> Result<Coordinates, EnrichmentFailure> {
    match body.results.into_iter().next() {
        Some(result) if body.status == "OK" => Ok(Coordinates {
            latitude: result.geometry.location.lat,
            longitude: result.geometry.location.lng,
        }),
        _ => Err(EnrichmentFailure::NoResults {
            address: address.to_string(),
        }),
    }
}

fn route_from(body: MatrixResponse) -> Result<Route, EnrichmentFailure> {
    if body.status != "OK" {
        return Err(EnrichmentFailure::RouteUnavailable(body.status));
    }

    let element = body
        .rows
        .into_iter()
        .next()
        .and_then(|row| row.elements.into_iter().next())
        .ok_or_else(|| EnrichmentFailure::RouteUnavailable("empty matrix".to_string()))?;

    if element.status != "OK" {
        return Err(EnrichmentFailure::RouteUnavailable(element.status));
    }

    match (element.distance, element.duration) {
        (Some(distance), Some(duration)) => Ok(Route {
            distance_km: meters_to_km(distance.value),
            duration: duration.text,
        }),
        _ => Err(EnrichmentFailure::RouteUnavailable(
            "missing distance or duration".to_string(),
        )),
    }
}

/// Kilometres rounded to two decimal places
pub fn meters_to_km(meters: f64) -> f64 {
    (meters / 1000.0 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meters_to_km() {
        assert_eq!(meters_to_km(12346.0), 12.35);
        assert_eq!(meters_to_km(500.0), 0.5);
        assert_eq!(meters_to_km(0.0), 0.0);
    }

    #[test]
    fn test_geocode_first_result() {
        let body: GeocodeResponse = serde_json::from_str(
            r#"{"status":"OK","results":[
                {"geometry":{"location":{"lat":12.9352,"lng":77.6245}}},
                {"geometry":{"location":{"lat":1.0,"lng":2.0}}}
            ]}"#,
        )
        .unwrap();
        let coords = coordinates_from(body, "Koramangala").unwrap();
        assert_eq!(coords, Coordinates { latitude: 12.9352, longitude: 77.6245 });
    }

    #[test]
    fn test_geocode_zero_results() {
        let body: GeocodeResponse =
            serde_json::from_str(r#"{"status":"ZERO_RESULTS","results":[]}"#).unwrap();
        assert!(matches!(
            coordinates_from(body, "Nowhere"),
            Err(EnrichmentFailure::NoResults { .. })
        ));
    }

    #[test]
    fn test_route_from_matrix() {
        let body: MatrixResponse = serde_json::from_str(
            r#"{"status":"OK","rows":[{"elements":[{"status":"OK",
                "distance":{"value":8421,"text":"8.4 km"},
                "duration":{"value":1500,"text":"25 mins"}}]}]}"#,
        )
        .unwrap();
        let route = route_from(body).unwrap();
        assert_eq!(route.distance_km, 8.42);
        assert_eq!(route.duration, "25 mins");
    }

    #[test]
    fn test_route_element_not_found() {
        let body: MatrixResponse = serde_json::from_str(
            r#"{"status":"OK","rows":[{"elements":[{"status":"ZERO_RESULTS"}]}]}"#,
        )
        .unwrap();
        assert!(matches!(
            route_from(body),
            Err(EnrichmentFailure::RouteUnavailable(status)) if status == "ZERO_RESULTS"
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let maps = GoogleMaps::new(
            "key".to_string(),
            "http://127.0.0.1:9/maps/api/".to_string(),
            Duration::from_secs(2),
        )
        .unwrap();
        assert_eq!(maps.endpoint("geocode/json"), "http://127.0.0.1:9/maps/api/geocode/json");
        assert!(matches!(
            maps.geocode("Koramangala").await,
            Err(EnrichmentFailure::Transport(_))
        ));
    }
}
