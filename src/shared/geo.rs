//! WGS-84 coordinates and the spherical-earth Haversine distance used for
//! footpath generation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean earth radius in meters, per the spherical-earth approximation
/// the transfer-generation distance check is defined against.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BadCoordinate {
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(String),
    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(String),
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Result<Self, BadCoordinate> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(BadCoordinate::Latitude(lat.to_string()));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(BadCoordinate::Longitude(lon.to_string()));
        }
        Ok(Self { lat, lon })
    }

    /// Great-circle distance to another coordinate, in meters.
    pub fn haversine_distance(&self, other: &Self) -> f64 {
        let phi1 = self.lat.to_radians();
        let phi2 = other.lat.to_radians();
        let delta_phi = (other.lat - self.lat).to_radians();
        let delta_lambda = (other.lon - self.lon).to_radians();

        let a = (delta_phi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_METERS * c
    }
}
