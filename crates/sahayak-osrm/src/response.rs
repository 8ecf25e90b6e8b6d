//! OSRM `route` service response mapping.

use sahayak_core::{GeoPoint, GeometryError, RoutePath};
use serde::Deserialize;

/// Top-level body of `/route/v1/{profile}/...` with `geometries=geojson`.
#[derive(Debug, Deserialize)]
pub struct OsrmRouteResponse {
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
pub struct OsrmRoute {
    pub geometry: OsrmGeometry,
    #[serde(default)]
    pub distance: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct OsrmGeometry {
    /// GeoJSON order: `[lon, lat]`.
    pub coordinates: Vec<[f64; 2]>,
}

/// Codes meaning the road network has no path between the points.
const NO_ROUTE_CODES: [&str; 2] = ["NoRoute", "NoSegment"];

/// Map an HTTP status and body from the routing service to a path.
pub fn parse_route_response(status: u16, body: &str) -> Result<RoutePath, GeometryError> {
    let payload: OsrmRouteResponse = match serde_json::from_str(body) {
        Ok(payload) => payload,
        Err(err) => {
            return Err(GeometryError::Transport(if (200..300).contains(&status) {
                format!("malformed routing response: {}", err)
            } else {
                format!("routing service HTTP {}", status)
            }));
        }
    };

    if NO_ROUTE_CODES.contains(&payload.code.as_str()) {
        return Err(GeometryError::RouteUnavailable(
            payload.message.unwrap_or(payload.code),
        ));
    }
    if payload.code != "Ok" {
        let detail = payload.message.unwrap_or_default();
        return Err(GeometryError::Transport(format!(
            "routing service HTTP {} {}: {}",
            status, payload.code, detail
        )));
    }

    let route = payload
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| GeometryError::RouteUnavailable("no routes returned".to_string()))?;

    let mut points = Vec::with_capacity(route.geometry.coordinates.len());
    for [lon, lat] in route.geometry.coordinates {
        let point = GeoPoint::try_new(lat, lon)
            .map_err(|err| GeometryError::Transport(format!("invalid route geometry: {}", err)))?;
        points.push(point);
    }

    if points.is_empty() {
        return Err(GeometryError::RouteUnavailable(
            "route has no geometry".to_string(),
        ));
    }

    tracing::debug!(
        vertices = points.len(),
        distance_m = ?route.distance,
        "Parsed OSRM route"
    );
    Ok(RoutePath::new(points))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_route_is_converted_to_lat_lon() {
        let body = r#"{
            "code": "Ok",
            "routes": [{
                "distance": 812.4,
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[77.5946, 12.9716], [77.5950, 12.9720], [77.6000, 12.9800]]
                }
            }],
            "waypoints": []
        }"#;
        let path = parse_route_response(200, body).unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path.first(), Some(&GeoPoint::new(12.9716, 77.5946)));
        assert_eq!(path.last(), Some(&GeoPoint::new(12.9800, 77.6000)));
    }

    #[test]
    fn no_route_is_user_correctable() {
        let body = r#"{"code": "NoRoute", "message": "Impossible route between points"}"#;
        assert_eq!(
            parse_route_response(400, body),
            Err(GeometryError::RouteUnavailable(
                "Impossible route between points".to_string()
            ))
        );

        let empty = r#"{"code": "Ok", "routes": []}"#;
        assert!(matches!(
            parse_route_response(200, empty),
            Err(GeometryError::RouteUnavailable(_))
        ));
    }

    #[test]
    fn service_failures_are_transport_errors() {
        assert!(matches!(
            parse_route_response(502, "<html>Bad Gateway</html>"),
            Err(GeometryError::Transport(_))
        ));
        assert!(matches!(
            parse_route_response(200, "not json"),
            Err(GeometryError::Transport(_))
        ));
        assert!(matches!(
            parse_route_response(429, r#"{"code": "TooBig", "message": "Too many coordinates"}"#),
            Err(GeometryError::Transport(_))
        ));
    }

    #[test]
    fn out_of_range_geometry_is_rejected() {
        let body = r#"{"code": "Ok", "routes": [{"geometry": {"coordinates": [[200.0, 12.0]]}}]}"#;
        assert!(matches!(
            parse_route_response(200, body),
            Err(GeometryError::Transport(_))
        ));
    }
}
