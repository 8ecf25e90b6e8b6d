//! Sahayak OSRM - road geometry provider
//!
//! Resolves the road polyline between two points through an OSRM-compatible
//! routing service and caches results per endpoint pair.

pub mod cache;
pub mod client;
pub mod response;

pub use cache::RouteCache;
pub use client::{OsrmClient, OsrmConfig};
pub use response::{parse_route_response, OsrmRouteResponse};
