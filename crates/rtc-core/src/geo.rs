//! Geographic coordinate type and the little spatial math the core needs.
//!
//! Two coordinate spaces appear in this system: WGS-84 lat/lon (POI catalog,
//! event locations, telemetry `lat_lon` fields) and the engine's planar
//! metre grid (vehicle positions, edge shapes).  `GeoPoint` covers the
//! former; planar work is done on raw `(f64, f64)` pairs obtained from the
//! engine's own projection, so no projection math lives here.

use serde::{Deserialize, Serialize};

/// A WGS-84 geographic coordinate.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Haversine great-circle distance in kilometres.
    pub fn distance_km(self, other: GeoPoint) -> f64 {
        const R_KM: f64 = 6_371.0; // mean Earth radius

        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();

        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat * 0.5).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);

        2.0 * R_KM * a.sqrt().asin()
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Minimum distance from point `p` to the segment `a`–`b`, all in the
/// engine's planar metre coordinates.
///
/// Used by the closure manager to measure how far a POI sits from each
/// segment of a closed edge's shape polyline.
pub fn dist_point_to_segment(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (px, py) = p;
    let (ax, ay) = a;
    let (bx, by) = b;

    let dx = bx - ax;
    let dy = by - ay;
    let len2 = dx * dx + dy * dy;

    // Degenerate segment: distance to the single point.
    if len2 == 0.0 {
        return ((px - ax).powi(2) + (py - ay).powi(2)).sqrt();
    }

    // Project p onto the segment, clamping to the endpoints.
    let t = (((px - ax) * dx + (py - ay) * dy) / len2).clamp(0.0, 1.0);
    let cx = ax + t * dx;
    let cy = ay + t * dy;

    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}
