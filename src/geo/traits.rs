use crate::error::EnrichmentFailure;
use crate::models::{Coordinates, Route};
use async_trait::async_trait;

/// Geocoding and routing backend
#[async_trait]
pub trait GeoService: Send + Sync {
    /// Best-match coordinates for a free-text address
    async fn geocode(&self, address: &str) -> Result<Coordinates, EnrichmentFailure>;

    /// Driving route between two points
    async fn route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<Route, EnrichmentFailure>;
}
