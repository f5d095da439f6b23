//! Maidenhead grid locator geometry.
//!
//! Converts 4, 6 or 8 character locators to the latitude/longitude of the
//! centre of the square, and computes great-circle distance between two
//! locators.

use thiserror::Error;

/// Mean Earth radius used for distance calculations.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("Invalid grid locator: {0:?}")]
    InvalidLocator(String),
}

/// Computes the distance between two grid locators.
///
/// The aggregator only depends on this trait so tests can substitute fixed
/// distances.
pub trait GridDistance {
    fn distance_km(&self, from: &str, to: &str) -> Result<f64, GridError>;
}

/// Great-circle distance between locator centres on a spherical Earth.
#[derive(Debug, Clone, Copy, Default)]
pub struct Haversine;

impl GridDistance for Haversine {
    fn distance_km(&self, from: &str, to: &str) -> Result<f64, GridError> {
        let (lat1, lon1) = locator_to_latlon(from)?;
        let (lat2, lon2) = locator_to_latlon(to)?;
        Ok(haversine_km(lat1, lon1, lat2, lon2))
    }
}

/// Check a locator without converting it.
pub fn is_valid_locator(locator: &str) -> bool {
    locator_to_latlon(locator).is_ok()
}

/// Convert a locator to the (latitude, longitude) of its centre.
///
/// Pairs alternate letter (field, A-R), digit (square, 0-9),
/// letter (subsquare, A-X), digit (extended square, 0-9).
pub fn locator_to_latlon(locator: &str) -> Result<(f64, f64), GridError> {
    let invalid = || GridError::InvalidLocator(locator.to_string());

    let loc = locator.trim().to_ascii_uppercase();
    let bytes = loc.as_bytes();
    if !matches!(bytes.len(), 4 | 6 | 8) {
        return Err(invalid());
    }

    // Size of each successive precision step, in degrees (lon, lat)
    let steps: [(u8, u8, f64, f64); 4] = [
        (b'A', b'R', 20.0, 10.0),
        (b'0', b'9', 2.0, 1.0),
        (b'A', b'X', 2.0 / 24.0, 1.0 / 24.0),
        (b'0', b'9', 2.0 / 240.0, 1.0 / 240.0),
    ];

    let mut lon = -180.0;
    let mut lat = -90.0;
    let mut last = (0.0, 0.0);

    for (pair, &(lo, hi, lon_size, lat_size)) in bytes.chunks(2).zip(steps.iter()) {
        let (x, y) = (pair[0], pair[1]);
        if !(lo..=hi).contains(&x) || !(lo..=hi).contains(&y) {
            return Err(invalid());
        }
        lon += f64::from(x - lo) * lon_size;
        lat += f64::from(y - lo) * lat_size;
        last = (lon_size, lat_size);
    }

    Ok((lat + last.1 / 2.0, lon + last.0 / 2.0))
}

/// Great-circle distance in kilometres between two points in degrees.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let lat1 = lat1.to_radians();
    let lat2 = lat2.to_radians();
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_KM * c
}
