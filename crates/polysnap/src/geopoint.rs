use geo::{Distance, Haversine};
use serde::{Deserialize, Serialize};

use crate::error::SnapError;

/// A geographic coordinate in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lng: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub const fn new(lng: f64, lat: f64) -> Self {
        GeoPoint { lng, lat }
    }

    pub fn try_new(lng: f64, lat: f64) -> Result<Self, SnapError> {
        if lng.is_finite() && lat.is_finite() {
            Ok(GeoPoint { lng, lat })
        } else {
            Err(SnapError::NonFiniteCoordinate(lng, lat))
        }
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Great-circle distance in meters.
    pub fn haversine_distance(&self, other: &GeoPoint) -> f64 {
        let haversine = Haversine;
        haversine.distance(geo::Point::from(*self), geo::Point::from(*other))
    }

    /// Bit-exact key, used to deduplicate shared vertices.
    pub(crate) fn key(&self) -> (u64, u64) {
        (self.lng.to_bits(), self.lat.to_bits())
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(point: GeoPoint) -> Self {
        geo::Point::new(point.lng, point.lat)
    }
}

impl From<GeoPoint> for geo::Coord<f64> {
    fn from(point: GeoPoint) -> Self {
        geo::Coord {
            x: point.lng,
            y: point.lat,
        }
    }
}

impl From<geo::Coord<f64>> for GeoPoint {
    fn from(coord: geo::Coord<f64>) -> Self {
        GeoPoint::new(coord.x, coord.y)
    }
}

impl From<geo::Point<f64>> for GeoPoint {
    fn from(point: geo::Point<f64>) -> Self {
        GeoPoint::new(point.x(), point.y())
    }
}
