//! Geographic utilities: great-circle distance and radius bounding boxes.
//!
//! The radius search runs in two stages: a coarse bounding-box prefilter that
//! the storage layer can answer from an index, then an exact haversine check
//! on the reduced candidate set. Both halves live here so they can be tested
//! against each other.

use crate::{Bounds, GeoPoint};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Approximate length of one degree of latitude in meters.
const METERS_PER_DEGREE_LAT: f64 = 111_000.0;

/// Lower clamp for cos(latitude) when converting meters to longitude degrees.
/// Keeps the bbox finite near the poles.
const MIN_COS_LAT: f64 = 0.1;

/// Great-circle distance between two points in meters (haversine formula).
///
/// # Example
/// ```
/// use orgdir::{geo_utils::haversine_distance, GeoPoint};
///
/// let london = GeoPoint::new(51.5074, -0.1278);
/// let paris = GeoPoint::new(48.8566, 2.3522);
/// let d = haversine_distance(&london, &paris);
/// assert!((d / 1000.0 - 343.0).abs() < 2.0); // ~343 km
/// ```
pub fn haversine_distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (dlon / 2.0).sin().powi(2);

    EARTH_RADIUS_M * 2.0 * h.sqrt().asin()
}

/// Bounding box that encloses a circle of `radius_m` meters around `center`.
///
/// Flat-Earth approximation: latitude degrees have constant length, longitude
/// degree length shrinks with cos(latitude). The cosine is clamped so the box
/// stays bounded near the poles. The box over-covers, never under-covers, at
/// the radii the directory accepts; callers must still apply the exact
/// distance check.
pub fn bbox_around(center: &GeoPoint, radius_m: f64) -> Bounds {
    let lat_delta = radius_m / METERS_PER_DEGREE_LAT;
    let lon_delta =
        radius_m / (METERS_PER_DEGREE_LAT * center.latitude.to_radians().cos().max(MIN_COS_LAT));

    Bounds {
        min_lat: center.latitude - lat_delta,
        min_lon: center.longitude - lon_delta,
        max_lat: center.latitude + lat_delta,
        max_lon: center.longitude + lon_delta,
    }
}
