//! OSRM HTTP client.

use anyhow::{Context, Result};
use reqwest::Client;
use sahayak_core::{GeoPoint, GeometryError, GeometryProvider, RoutePath};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::cache::RouteCache;
use crate::response::parse_route_response;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OsrmConfig {
    /// Base URL of the routing service (e.g. "https://router.project-osrm.org")
    pub base_url: String,
    /// Routing profile segment of the URL
    pub profile: String,
    pub request_timeout_s: u64,
    /// How long a resolved path is reused; 0 disables caching
    pub cache_ttl_s: u64,
    pub cache_max_entries: usize,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://router.project-osrm.org".to_string(),
            profile: "driving".to_string(),
            request_timeout_s: 10,
            cache_ttl_s: 600,
            cache_max_entries: 256,
        }
    }
}

/// Road geometry provider backed by an OSRM `route` service.
pub struct OsrmClient {
    client: Client,
    base_url: String,
    profile: String,
    cache: RouteCache,
}

impl OsrmClient {
    pub fn new(config: &OsrmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_s.max(1)))
            .build()
            .context("Failed to create routing HTTP client")?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            profile: config.profile.clone(),
            cache: RouteCache::new(
                Duration::from_secs(config.cache_ttl_s),
                config.cache_max_entries,
            ),
        })
    }

    pub fn cache(&self) -> &RouteCache {
        &self.cache
    }

    /// Full route URL; OSRM expects `lon,lat` pairs.
    pub fn route_url(&self, start: &GeoPoint, end: &GeoPoint) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}?overview=full&geometries=geojson",
            self.base_url, self.profile, start.lon, start.lat, end.lon, end.lat
        )
    }

    async fn fetch_path(&self, start: &GeoPoint, end: &GeoPoint) -> Result<RoutePath, GeometryError> {
        let url = self.route_url(start, end);
        tracing::info!("Resolving route: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| GeometryError::Transport(err.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| GeometryError::Transport(err.to_string()))?;

        parse_route_response(status, &body)
    }
}

impl GeometryProvider for OsrmClient {
    async fn resolve_path(&self, start: GeoPoint, end: GeoPoint) -> Result<RoutePath, GeometryError> {
        if let Some(path) = self.cache.get(&start, &end) {
            tracing::debug!("Route cache hit");
            return Ok(path);
        }

        match self.fetch_path(&start, &end).await {
            Ok(path) => {
                self.cache.insert(&start, &end, path.clone());
                Ok(path)
            }
            Err(err) => {
                tracing::warn!("Route resolution failed: {}", err);
                Err(err)
            }
        }
    }
}
