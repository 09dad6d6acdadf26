pub(crate) const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Length of one degree of latitude (and of longitude at the equator).
pub(crate) const METERS_PER_DEGREE: f64 = EARTH_RADIUS_METERS * std::f64::consts::PI / 180.0;

/// Below this the longitude grid stops widening, close to the poles.
pub(crate) const MIN_MERIDIAN_SCALE: f64 = 1e-3;

pub const DEFAULT_SNAP_PX: f64 = 10.0;
pub const DEFAULT_PRECISION_METERS: f64 = 0.01;

pub const HORIZONTAL_GUIDE_ID: &str = "HORIZONTAL_LINE_GUIDE";
pub const VERTICAL_GUIDE_ID: &str = "VERTICAL_LINE_GUIDE";

/// Property set on guide features so hosts can style them.
pub const SNAP_GUIDE_PROPERTY: &str = "isSnapGuide";
