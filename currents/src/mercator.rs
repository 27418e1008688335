//! EPSG:3857 (spherical web mercator).
//!
//! Plenty good enough for triangulating a few miles of coastal water,
//! which is all we project for.
//!

use std::f64::consts::{FRAC_PI_4, PI};

/// WGS84 semi-major axis, the sphere radius in this projection
pub const EARTH_RADIUS: f64 = 6_378_137.;

/// Degrees to metres.
///
pub fn forward(lon: f64, lat: f64) -> (f64, f64) {
    let x = EARTH_RADIUS * lon.to_radians();
    let y = EARTH_RADIUS * (FRAC_PI_4 + lat.to_radians() / 2.).tan().ln();
    (x, y)
}

/// Metres back to degrees.
///
pub fn inverse(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (2. * (y / EARTH_RADIUS).exp().atan() - PI / 2.).to_degrees();
    (lon, lat)
}
