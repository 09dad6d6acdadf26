use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapError {
    #[error("Snap tolerance must be a finite, non-negative number of pixels, got {0}")]
    InvalidTolerance(f64),
    #[error("Rounding precision must be a finite, positive number of meters, got {0}")]
    InvalidPrecision(f64),
    #[error("Coordinate ({0}, {1}) is not finite")]
    NonFiniteCoordinate(f64, f64),
    #[error("Feature {0} has no geometry")]
    MissingGeometry(String),
    #[error("Invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),
}
