//! Utility functions for coordinate conversions and zoom arithmetic

use geo::Point;

/// Web Mercator bounds in meters (EPSG:3857)
pub const EARTH_MERCATOR_MAX: f64 = 20037508.34;
pub const EARTH_MERCATOR_MIN: f64 = -20037508.34;
pub const EARTH_SIZE_METERS: f64 = EARTH_MERCATOR_MAX - EARTH_MERCATOR_MIN;

/// Maximum latitude that can be represented in Web Mercator
pub const MAX_LATITUDE: f64 = 85.05112878;

/// Side of a map tile in screen points at every zoom level
pub const TILE_SIZE_POINTS: f64 = 256.0;

/// Deepest zoom level the map tile pyramid supports
pub const MAX_ZOOM_LEVEL: u32 = 30;

/// Precomputed constant: EARTH_MERCATOR_MAX / 180.0
const LON_TO_X_FACTOR: f64 = EARTH_MERCATOR_MAX / 180.0;

/// Precomputed constant: EARTH_MERCATOR_MAX / PI
const Y_FACTOR: f64 = EARTH_MERCATOR_MAX / std::f64::consts::PI;

/// Precomputed constant: 180.0 / EARTH_MERCATOR_MAX
const X_TO_LON_FACTOR: f64 = 180.0 / EARTH_MERCATOR_MAX;

/// Precomputed constant: PI / EARTH_MERCATOR_MAX
const Y_TO_LAT_FACTOR: f64 = std::f64::consts::PI / EARTH_MERCATOR_MAX;

/// Convert WGS84 (lat, lon) to Web Mercator (x, y) in meters
///
/// Latitude is clamped to the Web Mercator range first.
#[inline(always)]
pub fn wgs84_to_mercator(lat: f64, lon: f64) -> Point<f64> {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);

    let x = lon * LON_TO_X_FACTOR;
    let lat_rad = lat.to_radians();
    let y = (lat_rad.tan() + (1.0 / lat_rad.cos())).ln() * Y_FACTOR;

    Point::new(x, y)
}

/// Convert Web Mercator (x, y) in meters to WGS84 (lat, lon) in degrees
#[inline(always)]
pub fn mercator_to_wgs84(x: f64, y: f64) -> (f64, f64) {
    let lon = x * X_TO_LON_FACTOR;
    let lat =
        (std::f64::consts::PI / 2.0 - 2.0 * ((-y * Y_TO_LAT_FACTOR).exp()).atan()).to_degrees();
    (lat, lon)
}

/// Size of one screen point in Web Mercator meters at the given zoom level
#[inline]
pub fn meters_per_point(zoom: f64) -> f64 {
    let zoom = zoom.clamp(0.0, MAX_ZOOM_LEVEL as f64);
    EARTH_SIZE_METERS / (TILE_SIZE_POINTS * zoom.exp2())
}

/// Estimate the zoom level that fits a span of `span_degrees` on screen
///
/// Returns `None` for a zero or non-finite span; callers pick their own close-up zoom.
pub fn zoom_for_span(span_degrees: f64) -> Option<f64> {
    if span_degrees <= 0.0 || !span_degrees.is_finite() {
        return None;
    }
    let estimate = (4.0 * 360.0 / span_degrees).log2();
    Some((estimate - 0.5).clamp(1.0, MAX_ZOOM_LEVEL as f64))
}

/// Format a count with comma thousands separators (`12345` becomes `"12,345"`)
pub fn format_count(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}
