//! Coordinates and great-circle math

use geo::geometry::Point;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackingError};

/// Mean earth radius used for every distance, in km
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// WGS84 position in decimal degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Build a coordinate, checking the latitude/longitude ranges
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let coord = Self {
            latitude,
            longitude,
        };
        coord.validate()?;

        Ok(coord)
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(TrackingError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }
}

impl From<Coordinate> for Point {
    fn from(c: Coordinate) -> Self {
        Point::new(c.longitude, c.latitude)
    }
}

impl From<Point> for Coordinate {
    fn from(p: Point) -> Self {
        Self {
            latitude: p.y(),
            longitude: p.x(),
        }
    }
}

/// Great-circle distance between two coordinates, in km
pub fn haversine_distance_km(a: &Coordinate, b: &Coordinate) -> Result<f64> {
    a.validate()?;
    b.validate()?;

    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    // rounding can push antipodal pairs just above 1
    let h = h.min(1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    Ok(EARTH_RADIUS_KM * c)
}

/// Geofence check: is `b` within `radius_meters` of `a`
pub fn within_radius(a: &Coordinate, b: &Coordinate, radius_meters: f64) -> Result<bool> {
    Ok(km_to_meters(haversine_distance_km(a, b)?) <= radius_meters)
}

pub fn mps_to_kmh(mps: f64) -> f64 {
    mps * 3.6
}

pub fn kmh_to_mps(kmh: f64) -> f64 {
    kmh / 3.6
}

pub fn km_to_meters(km: f64) -> f64 {
    km * 1000.0
}
