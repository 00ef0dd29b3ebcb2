//! Utility functions for coordinate conversions and distances

use geo::Point;

/// Web Mercator bounds in meters (EPSG:3857)
pub const EARTH_MERCATOR_MAX: f64 = 20037508.34;
pub const EARTH_MERCATOR_MIN: f64 = -20037508.34;

/// Maximum latitude that can be represented in Web Mercator
pub const MAX_LATITUDE: f64 = 85.05112878;

/// Side of one map tile in pixels
pub const TILE_SIZE: f64 = 256.0;

/// Mean Earth radius in kilometres
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Precomputed constant: EARTH_MERCATOR_MAX / 180.0
const LON_TO_X_FACTOR: f64 = EARTH_MERCATOR_MAX / 180.0;

/// Precomputed constant: EARTH_MERCATOR_MAX / PI
const Y_FACTOR: f64 = EARTH_MERCATOR_MAX / std::f64::consts::PI;

/// Convert WGS84 (lat, lon) to Web Mercator (x, y) in meters
///
/// Latitude is clamped to the Web Mercator range.
#[inline(always)]
pub fn wgs84_to_mercator(lat: f64, lon: f64) -> Point<f64> {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);

    let x = lon * LON_TO_X_FACTOR;
    let lat_rad = lat.to_radians();
    let y = (lat_rad.tan() + (1.0 / lat_rad.cos())).ln() * Y_FACTOR;

    Point::new(x, y)
}

/// Project WGS84 (lat, lon) to global pixel coordinates at a zoom level
///
/// The origin is the north-west corner of the world; y grows southwards,
/// matching the layout of slippy map tiles.
#[inline(always)]
pub fn wgs84_to_world_pixel(lat: f64, lon: f64, zoom: u8) -> (f64, f64) {
    let world_size = TILE_SIZE * f64::from(1u32 << zoom.min(24));
    let mercator = wgs84_to_mercator(lat, lon);

    let x = (mercator.x() - EARTH_MERCATOR_MIN) / (EARTH_MERCATOR_MAX - EARTH_MERCATOR_MIN);
    let y = (EARTH_MERCATOR_MAX - mercator.y()) / (EARTH_MERCATOR_MAX - EARTH_MERCATOR_MIN);

    (x * world_size, y * world_size)
}

/// Great-circle distance in kilometres between two (lat, lon) positions
#[inline]
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let lat1 = from.0.to_radians();
    let lat2 = to.0.to_radians();
    let delta_lat = (to.0 - from.0).to_radians();
    let delta_lon = (to.1 - from.1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}
