//! Location input for command-line verification.

use anyhow::{Context, Result};
use sahayak_core::{GeoPoint, LocationError, LocationSource};

/// Parse `"lat,lon"` into a validated point.
pub fn parse_point(input: &str) -> Result<GeoPoint> {
    let (lat, lon) = input
        .split_once(',')
        .with_context(|| format!("Expected \"lat,lon\", got {:?}", input))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .with_context(|| format!("Invalid latitude in {:?}", input))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .with_context(|| format!("Invalid longitude in {:?}", input))?;
    Ok(GeoPoint::try_new(lat, lon)?)
}

/// Location source that reports a fix supplied up front (e.g. from a GPS log).
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation {
    fix: Option<GeoPoint>,
}

impl FixedLocation {
    pub fn new(fix: Option<GeoPoint>) -> Self {
        Self { fix }
    }
}

impl LocationSource for FixedLocation {
    async fn current_location(&self) -> Result<GeoPoint, LocationError> {
        self.fix
            .ok_or_else(|| LocationError::Unavailable("no position fix supplied".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lat_lon_pairs() {
        assert_eq!(
            parse_point("12.9716, 77.5946").unwrap(),
            GeoPoint::new(12.9716, 77.5946)
        );
        assert!(parse_point("12.9716").is_err());
        assert!(parse_point("abc,77.5").is_err());
        assert!(parse_point("95.0,77.5").is_err());
    }

    #[tokio::test]
    async fn missing_fix_is_unavailable() {
        let source = FixedLocation::new(None);
        assert!(matches!(
            source.current_location().await,
            Err(LocationError::Unavailable(_))
        ));
    }
}
