use crate::{
    constants::{DEFAULT_PRECISION_METERS, METERS_PER_DEGREE, MIN_MERIDIAN_SCALE},
    error::SnapError,
    geopoint::GeoPoint,
};

/// Snaps coordinates to a grid whose spacing is a fixed ground distance.
///
/// The latitude step is constant. The longitude step widens with latitude to
/// compensate for converging meridians, so one step east is roughly the same
/// ground distance as one step north everywhere except within a few hundredths
/// of a degree from the poles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateRounder {
    precision_meters: f64,
    lat_step: f64,
}

impl CoordinateRounder {
    pub fn new(precision_meters: f64) -> Result<Self, SnapError> {
        if !precision_meters.is_finite() || precision_meters <= 0.0 {
            return Err(SnapError::InvalidPrecision(precision_meters));
        }

        Ok(CoordinateRounder {
            precision_meters,
            lat_step: precision_meters / METERS_PER_DEGREE,
        })
    }

    pub fn centimeter() -> Self {
        CoordinateRounder {
            precision_meters: DEFAULT_PRECISION_METERS,
            lat_step: DEFAULT_PRECISION_METERS / METERS_PER_DEGREE,
        }
    }

    pub fn precision_meters(&self) -> f64 {
        self.precision_meters
    }

    pub fn lat_step(&self) -> f64 {
        self.lat_step
    }

    pub fn lng_step(&self, lat: f64) -> f64 {
        let meridian_scale = lat.to_radians().cos().abs().max(MIN_MERIDIAN_SCALE);
        self.lat_step / meridian_scale
    }

    pub fn round(&self, point: GeoPoint) -> GeoPoint {
        // The longitude step depends on the rounded latitude, which keeps the
        // operation idempotent.
        let lat = snap_to_grid(point.lat, self.lat_step);
        let lng = snap_to_grid(point.lng, self.lng_step(lat));

        GeoPoint::new(lng, lat)
    }
}

impl Default for CoordinateRounder {
    fn default() -> Self {
        CoordinateRounder::centimeter()
    }
}

pub fn round_to_centimeter(point: GeoPoint) -> GeoPoint {
    CoordinateRounder::centimeter().round(point)
}

fn snap_to_grid(value: f64, step: f64) -> f64 {
    (value / step).round() * step
}
