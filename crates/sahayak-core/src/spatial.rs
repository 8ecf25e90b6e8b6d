//! Spatial math for route lengths, interpolation and distance checks.

use crate::models::GeoPoint;

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Calculate distance between two points in meters using Haversine formula.
///
/// # Arguments
/// * `lat1`, `lon1` - First point coordinates in decimal degrees
/// * `lat2`, `lon2` - Second point coordinates in decimal degrees
///
/// # Returns
/// Distance in meters
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Great-circle distance between two points in meters.
pub fn distance_m(a: &GeoPoint, b: &GeoPoint) -> f64 {
    haversine_distance(a.lat, a.lon, b.lat, b.lon)
}

/// Sum of segment distances along an ordered polyline.
pub fn path_length_m(points: &[GeoPoint]) -> f64 {
    points
        .windows(2)
        .map(|pair| distance_m(&pair[0], &pair[1]))
        .sum()
}

/// Locate the point `offset_m` meters along the polyline.
///
/// Interpolates linearly between the two bracketing vertices. Distances before
/// the start clamp to the first vertex, distances past the end to the last one.
/// Returns `None` for an empty polyline.
pub fn point_along(points: &[GeoPoint], offset_m: f64) -> Option<GeoPoint> {
    let first = *points.first()?;
    if offset_m.is_nan() || offset_m <= 0.0 {
        return Some(first);
    }

    let mut travelled = 0.0;
    for pair in points.windows(2) {
        let (from, to) = (&pair[0], &pair[1]);
        let seg_len = distance_m(from, to);
        if seg_len <= 0.0 {
            continue;
        }
        if travelled + seg_len > offset_m {
            let ratio = ((offset_m - travelled) / seg_len).clamp(0.0, 1.0);
            return Some(GeoPoint {
                lat: from.lat + (to.lat - from.lat) * ratio,
                lon: from.lon + (to.lon - from.lon) * ratio,
            });
        }
        travelled += seg_len;
    }

    points.last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deg_for_meters(meters: f64) -> f64 {
        (meters / EARTH_RADIUS_M).to_degrees()
    }

    #[test]
    fn test_haversine_known_distance() {
        // ~111km between these points (1 degree latitude)
        let dist = haversine_distance(0.0, 0.0, 1.0, 0.0);
        assert!((dist - 111_194.0).abs() < 100.0);
    }

    #[test]
    fn test_haversine_same_point() {
        let dist = haversine_distance(12.9716, 77.5946, 12.9716, 77.5946);
        assert!(dist < 0.001);
    }

    #[test]
    fn path_length_sums_segments() {
        let step = deg_for_meters(1_000.0);
        let points = vec![
            GeoPoint::new(12.90, 77.59),
            GeoPoint::new(12.90 + step, 77.59),
            GeoPoint::new(12.90 + 3.0 * step, 77.59),
        ];
        assert!((path_length_m(&points) - 3_000.0).abs() < 1e-6);
        assert_eq!(path_length_m(&points[..1]), 0.0);
        assert_eq!(path_length_m(&[]), 0.0);
    }

    #[test]
    fn point_along_interpolates_within_segment() {
        let step = deg_for_meters(1_000.0);
        let points = vec![
            GeoPoint::new(12.90, 77.59),
            GeoPoint::new(12.90 + step, 77.59),
            GeoPoint::new(12.90 + 2.0 * step, 77.59),
        ];

        let mid = point_along(&points, 1_500.0).unwrap();
        assert!((mid.lat - (12.90 + 1.5 * step)).abs() < 1e-9);
        assert_eq!(mid.lon, 77.59);

        assert_eq!(point_along(&points, 0.0), Some(points[0]));
        assert_eq!(point_along(&points, 10_000.0), Some(points[2]));
        assert_eq!(point_along(&[], 5.0), None);
    }

    #[test]
    fn point_along_skips_repeated_vertices() {
        let step = deg_for_meters(100.0);
        let points = vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(step, 0.0),
        ];
        let p = point_along(&points, 50.0).unwrap();
        assert!((p.lat - step / 2.0).abs() < 1e-12);
    }
}
